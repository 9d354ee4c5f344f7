//! Service activation: nginx site install/reload and pm2 registration

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::artifacts;
use crate::orchestrator::RunContext;
use crate::preflight::OsFamily;
use crate::runner::{CommandRunner, shell_quote};

/// Where the site config and its enabled-sites link live
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SitePaths {
    pub available: PathBuf,
    pub enabled: PathBuf,
}

impl SitePaths {
    pub fn for_context(ctx: &RunContext<'_>) -> Self {
        let name = &ctx.config.app.name;
        Self {
            available: ctx.config.sites_available().join(name),
            enabled: ctx.config.sites_enabled().join(name),
        }
    }
}

/// Write the site config and point the enabled-sites link at it
///
/// An existing link (or file) at the enabled path is always replaced.
pub fn install_site(paths: &SitePaths, site: &str) -> Result<()> {
    for dir in [paths.available.parent(), paths.enabled.parent()]
        .into_iter()
        .flatten()
    {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
    }

    artifacts::write(&paths.available, site)?;

    if paths.enabled.exists() || paths.enabled.is_symlink() {
        fs::remove_file(&paths.enabled).with_context(|| {
            format!("Failed to remove existing link: {}", paths.enabled.display())
        })?;
    }

    std::os::unix::fs::symlink(&paths.available, &paths.enabled).with_context(|| {
        format!(
            "Failed to create symlink: {} -> {}",
            paths.enabled.display(),
            paths.available.display()
        )
    })?;

    Ok(())
}

/// Generate, install, validate and restart; returns whether nginx restarted
pub fn configure_proxy(ctx: &RunContext<'_>, runner: &CommandRunner<'_>) -> bool {
    let reporter = runner.reporter();
    let paths = SitePaths::for_context(ctx);
    let site = artifacts::render_site(&ctx.domain, ctx.config.app.port);

    if ctx.dry_run {
        reporter.info(&format!("Would write {}", paths.available.display()));
        reporter.info(&format!(
            "Would link {} -> {}",
            paths.enabled.display(),
            paths.available.display()
        ));
    } else {
        match install_site(&paths, &site) {
            Ok(()) => reporter.success(&format!(
                "Installed site {} -> {}",
                paths.enabled.display(),
                paths.available.display()
            )),
            Err(e) => runner.report_failure("Install Nginx site", &e),
        }
    }

    if ctx.os_family == OsFamily::Rhel {
        reporter.warn(&format!(
            "Make sure nginx.conf includes {}/*",
            ctx.config.sites_enabled().display()
        ));
    }

    // A failed syntax check still lets the restart surface its own error
    runner.run("nginx -t", "Validate Nginx configuration");
    let restarted = runner
        .run("systemctl restart nginx", "Restart Nginx")
        .succeeded;

    if restarted {
        reporter.success("Nginx configured");
    }
    restarted
}

/// Write the ecosystem file and (re)register the app with pm2
pub fn register_app(ctx: &RunContext<'_>, project: &Path, runner: &CommandRunner<'_>) -> bool {
    let reporter = runner.reporter();
    let app = &ctx.config.app;
    let ecosystem = project.join(artifacts::ECOSYSTEM_FILE);

    if ctx.dry_run {
        reporter.info(&format!("Would write {}", ecosystem.display()));
    } else {
        match artifacts::write_ecosystem(project, app) {
            Ok(path) => reporter.success(&format!("Wrote {}", path.display())),
            Err(e) => runner.report_failure("Write ecosystem file", &e),
        }
    }

    let name = shell_quote(&app.name);
    runner.probe(&format!("pm2 delete {name}"), "Remove previous PM2 app");
    let started = runner
        .run(
            &format!("pm2 start {}", shell_quote(&ecosystem.to_string_lossy())),
            "Start app with PM2",
        )
        .succeeded;
    runner.run("pm2 save", "Save PM2 process list");

    let pm = &ctx.config.process_manager;
    runner.probe(
        &format!(
            "pm2 startup systemd -u {} --hp {}",
            shell_quote(&pm.startup_user),
            shell_quote(&pm.home().to_string_lossy())
        ),
        "Configure PM2 startup",
    );

    if started {
        reporter.success("PM2 configured");
    }
    started
}
