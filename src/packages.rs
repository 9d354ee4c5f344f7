//! OS package provisioning
//!
//! Each component is probed with a version query first and only installed
//! when the probe fails, so a second run installs nothing.

use crate::orchestrator::RunContext;
use crate::preflight::OsFamily;
use crate::runner::CommandRunner;

/// Something to install, guarded by a probe
struct Component {
    name: &'static str,
    /// Succeeds (and prints a version) when already installed
    probe: String,
    /// Install commands with descriptions, run in order
    install: Vec<(String, String)>,
}

/// Make sure `component` is installed; returns whether it is afterwards
fn ensure(runner: &CommandRunner<'_>, component: &Component) -> bool {
    let reporter = runner.reporter();

    let found = runner.probe(&component.probe, &format!("Check {}", component.name));
    if found.succeeded {
        reporter.success(&format!(
            "{} already installed: {}",
            component.name,
            first_line(&found.output)
        ));
        return true;
    }

    reporter.info(&format!("Installing {}...", component.name));
    for (script, description) in &component.install {
        runner.run(script, description);
    }

    let confirmed = runner.run(&component.probe, &format!("Verify {}", component.name));
    if confirmed.succeeded {
        reporter.success(&format!(
            "{} installed: {}",
            component.name,
            first_line(&confirmed.output)
        ));
    }
    confirmed.succeeded
}

fn first_line(output: &str) -> &str {
    output.lines().next().unwrap_or("").trim()
}

fn install_command(family: OsFamily, packages: &str) -> String {
    match family {
        OsFamily::Debian => format!("apt install -y {packages}"),
        OsFamily::Rhel => format!("yum install -y {packages}"),
    }
}

/// Refresh package indexes and upgrade installed packages
pub fn update_system(ctx: &RunContext<'_>, runner: &CommandRunner<'_>) -> bool {
    let script = match ctx.os_family {
        OsFamily::Debian => "apt update && apt upgrade -y",
        OsFamily::Rhel => "yum update -y",
    };
    runner.run(script, "Update system packages").succeeded
}

/// curl, git and a C/C++ toolchain for native npm modules
pub fn install_base(ctx: &RunContext<'_>, runner: &CommandRunner<'_>) -> bool {
    let (probe, packages) = match ctx.os_family {
        OsFamily::Debian => (
            "dpkg -s curl git build-essential >/dev/null && git --version",
            "curl git build-essential",
        ),
        OsFamily::Rhel => (
            "rpm -q curl git gcc-c++ make >/dev/null && git --version",
            "curl git gcc-c++ make",
        ),
    };

    ensure(
        runner,
        &Component {
            name: "base packages",
            probe: probe.to_string(),
            install: vec![(
                install_command(ctx.os_family, packages),
                "Install base packages".to_string(),
            )],
        },
    )
}

/// Node.js from the NodeSource repository for the host's dialect
pub fn install_runtime(ctx: &RunContext<'_>, runner: &CommandRunner<'_>) -> bool {
    let major = ctx.config.runtime.node_major;
    let repo = match ctx.os_family {
        OsFamily::Debian => format!("curl -fsSL https://deb.nodesource.com/setup_{major}.x | bash -"),
        OsFamily::Rhel => format!("curl -fsSL https://rpm.nodesource.com/setup_{major}.x | bash -"),
    };

    ensure(
        runner,
        &Component {
            name: "Node.js",
            probe: "node -v".to_string(),
            install: vec![
                (repo, format!("Add Node.js {major}.x repository")),
                (
                    install_command(ctx.os_family, "nodejs"),
                    "Install Node.js".to_string(),
                ),
            ],
        },
    )
}

pub fn install_process_manager(runner: &CommandRunner<'_>) -> bool {
    ensure(
        runner,
        &Component {
            name: "PM2",
            probe: "pm2 -v".to_string(),
            install: vec![("npm install -g pm2".to_string(), "Install PM2".to_string())],
        },
    )
}

/// nginx, enabled and started as a system service when freshly installed
pub fn install_proxy(ctx: &RunContext<'_>, runner: &CommandRunner<'_>) -> bool {
    // nginx prints its version on stderr
    ensure(
        runner,
        &Component {
            name: "Nginx",
            probe: "nginx -v 2>&1".to_string(),
            install: vec![
                (
                    install_command(ctx.os_family, "nginx"),
                    "Install Nginx".to_string(),
                ),
                ("systemctl enable nginx".to_string(), "Enable Nginx".to_string()),
                ("systemctl start nginx".to_string(), "Start Nginx".to_string()),
            ],
        },
    )
}
