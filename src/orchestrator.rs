//! The fixed 12-step provisioning run
//!
//! Steps run strictly in order. Only the preflight checks can stop the
//! run; every later failure is reported and the next step runs anyway.

use std::path::PathBuf;

use crate::artifacts;
use crate::config::ProvisionConfig;
use crate::firewall;
use crate::packages;
use crate::pipeline;
use crate::preflight::{self, OsFamily, PreflightError};
use crate::project;
use crate::runner::CommandRunner;
use crate::service;

pub const TOTAL_STEPS: usize = 12;

/// What the operator asked for
#[derive(Debug, Clone)]
pub struct Request {
    pub install_dir: PathBuf,
    pub domain: String,
    /// Tree the manifest is copied from
    pub source_dir: PathBuf,
    pub dry_run: bool,
}

/// Facts about the machine the run depends on
#[derive(Debug, Clone)]
pub struct Host {
    pub euid: u32,
    pub kernel: String,
    pub os_release: PathBuf,
}

impl Host {
    pub fn current() -> Self {
        Self {
            euid: preflight::current_euid(),
            kernel: std::env::consts::OS.to_string(),
            os_release: PathBuf::from(preflight::OS_RELEASE),
        }
    }
}

/// Immutable state threaded through every step
#[derive(Debug, Clone)]
pub struct RunContext<'a> {
    pub config: &'a ProvisionConfig,
    pub install_dir: PathBuf,
    pub domain: String,
    pub source_dir: PathBuf,
    pub os_family: OsFamily,
    pub dry_run: bool,
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Resolved install directory
    pub project_dir: PathBuf,
    pub domain: String,
    pub os_family: OsFamily,
    /// Reported command and file failures; probes don't count
    pub failed_commands: usize,
}

pub fn run(
    config: &ProvisionConfig,
    request: &Request,
    host: &Host,
    runner: &CommandRunner<'_>,
) -> Result<RunSummary, PreflightError> {
    let reporter = runner.reporter();
    let step = |n: usize, message: &str| reporter.step(n, TOTAL_STEPS, message);

    match preflight::verify_privilege(host.euid) {
        Ok(()) => {}
        Err(e) if request.dry_run => reporter.warn(&format!("{e} (ignored for dry run)")),
        Err(e) => return Err(e),
    }

    step(1, "Detecting operating system...");
    preflight::verify_kernel(&host.kernel)?;
    let os_family = preflight::detect_os_family(&host.os_release, reporter);

    let ctx = RunContext {
        config,
        install_dir: request.install_dir.clone(),
        domain: request.domain.clone(),
        source_dir: request.source_dir.clone(),
        os_family,
        dry_run: request.dry_run,
    };
    log::info!("provisioning {} for {}", ctx.install_dir.display(), ctx.domain);

    step(2, "Updating system...");
    packages::update_system(&ctx, runner);

    step(3, "Installing base packages...");
    packages::install_base(&ctx, runner);

    step(4, "Installing Node.js...");
    packages::install_runtime(&ctx, runner);

    step(5, "Installing PM2...");
    packages::install_process_manager(runner);

    step(6, "Installing Nginx...");
    packages::install_proxy(&ctx, runner);

    step(7, "Copying project files...");
    let project_dir =
        match project::materialize(&ctx.source_dir, &ctx.install_dir, ctx.dry_run, runner) {
            Ok(dir) => dir,
            Err(e) => {
                runner.report_failure("Copy project files", &e);
                ctx.install_dir.clone()
            }
        };

    step(8, "Installing npm dependencies...");
    pipeline::install_dependencies(&project_dir, runner);

    step(9, "Building project...");
    pipeline::build(&project_dir, runner);

    step(10, "Creating environment file...");
    if ctx.dry_run {
        reporter.info(&format!(
            "Would write {}",
            project_dir.join(artifacts::ENV_FILE).display()
        ));
    } else {
        match artifacts::write_env(&project_dir, config.app.port) {
            Ok(path) => reporter.success(&format!("Created {}", path.display())),
            Err(e) => runner.report_failure("Create .env file", &e),
        }
    }

    step(11, "Configuring Nginx...");
    service::configure_proxy(&ctx, runner);

    step(12, "Starting application...");
    service::register_app(&ctx, &project_dir, runner);

    reporter.info("Configuring firewall...");
    firewall::configure(&ctx, runner);

    Ok(RunSummary {
        project_dir,
        domain: ctx.domain,
        os_family,
        failed_commands: runner.failures(),
    })
}

#[cfg(test)]
impl<'a> RunContext<'a> {
    pub fn for_tests(config: &'a ProvisionConfig, os_family: OsFamily) -> Self {
        Self {
            config,
            install_dir: PathBuf::from(&config.app.install_dir),
            domain: config.app.domain.clone(),
            source_dir: PathBuf::from("."),
            os_family,
            dry_run: false,
        }
    }
}
