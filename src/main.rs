mod artifacts;
mod cli;
mod config;
mod firewall;
mod orchestrator;
mod packages;
mod pipeline;
mod preflight;
mod project;
mod runner;
mod service;
mod ui;

use anyhow::{Context, Result};
use clap::Parser;
use cli::Cli;
use config::ProvisionConfig;
use orchestrator::{Host, Request};
use shellrun::{Executor, Recorder, ShellExecutor};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(if cli.quiet {
            log::LevelFilter::Error
        } else {
            log_level
        })
        .format_timestamp(None)
        .init();

    let config = ProvisionConfig::load(cli.config.as_deref())?;
    let request = resolve_request(&cli, &config)?;

    ui::banner();
    ui::kv("Install path", &request.install_dir.display().to_string());
    ui::kv("Domain", &request.domain);
    println!();

    let recorder = Recorder::new();
    let shell = ShellExecutor::new();
    let executor: &dyn Executor = if request.dry_run { &recorder } else { &shell };

    let console = ui::Console::new(cli.quiet);
    let runner = runner::CommandRunner::new(executor, &console);

    let summary = match orchestrator::run(&config, &request, &Host::current(), &runner) {
        Ok(summary) => summary,
        Err(e) => {
            drop(console);
            ui::error(&e.to_string());
            eprintln!("{}", e.guidance());
            std::process::exit(1);
        }
    };
    drop(console);
    log::info!(
        "finished on {} with {} failed command(s)",
        summary.os_family,
        summary.failed_commands
    );

    if request.dry_run {
        ui::section("Commands that would run");
        for invocation in recorder.invocations() {
            ui::dim(&invocation.to_string());
        }
    }

    ui::completion(&ui::Completion {
        install_dir: &summary.project_dir,
        domain: &summary.domain,
        app_name: &config.app.name,
        failed_commands: summary.failed_commands,
        dry_run: request.dry_run,
    });

    Ok(())
}

/// Positional arguments win over the config file, which wins over defaults
fn resolve_request(cli: &Cli, config: &ProvisionConfig) -> Result<Request> {
    let install_dir = match &cli.install_dir {
        Some(dir) => dir.clone(),
        None => config::expand(&config.app.install_dir),
    };
    let install_dir = std::path::absolute(&install_dir)
        .with_context(|| format!("Invalid install directory: {}", install_dir.display()))?;

    let source_dir = match &cli.source {
        Some(dir) => dir.clone(),
        None => std::env::current_dir().context("Could not determine current directory")?,
    };

    Ok(Request {
        install_dir,
        domain: cli
            .domain
            .clone()
            .unwrap_or_else(|| config.app.domain.clone()),
        source_dir,
        dry_run: cli.dry_run,
    })
}
