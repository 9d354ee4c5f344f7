//! Application build: npm dependencies, then the production bundle

use std::path::Path;

use crate::runner::{CommandRunner, StepResult};

pub fn install_dependencies(project: &Path, runner: &CommandRunner<'_>) -> StepResult {
    runner.run_in(project, "npm install", "Install npm dependencies")
}

pub fn build(project: &Path, runner: &CommandRunner<'_>) -> StepResult {
    runner.run_in(project, "npm run build", "Build project")
}
