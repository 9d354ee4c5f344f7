use clap::Parser;
use std::path::PathBuf;

use crate::config::check_domain;

#[derive(Parser)]
#[command(name = "hostprep")]
#[command(version)]
#[command(
    about = "Provision this Linux host to serve the temp-email app behind nginx and pm2",
    long_about = None
)]
pub struct Cli {
    /// Directory to install the application into [default: /var/www/temp-email]
    pub install_dir: Option<PathBuf>,

    /// Domain nginx serves the application on [default: localhost]
    #[arg(value_parser = parse_domain)]
    pub domain: Option<String>,

    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file (TOML)
    #[arg(short, long, env = "HOSTPREP_CONFIG")]
    pub config: Option<PathBuf>,

    /// Source tree to copy the application from [default: current directory]
    #[arg(short, long, env = "HOSTPREP_SOURCE")]
    pub source: Option<PathBuf>,

    /// Record commands instead of running them; write nothing
    #[arg(short = 'n', long)]
    pub dry_run: bool,
}

fn parse_domain(s: &str) -> Result<String, String> {
    check_domain(s)?;
    Ok(s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positional_arguments() {
        let cli = Cli::try_parse_from(["hostprep", "/tmp/app", "test.local"]).unwrap();
        assert_eq!(cli.install_dir, Some(PathBuf::from("/tmp/app")));
        assert_eq!(cli.domain.as_deref(), Some("test.local"));
        assert!(!cli.dry_run);
    }

    #[test]
    fn test_no_arguments() {
        let cli = Cli::try_parse_from(["hostprep"]).unwrap();
        assert!(cli.install_dir.is_none());
        assert!(cli.domain.is_none());
    }

    #[test]
    fn test_rejects_unsafe_domain() {
        assert!(Cli::try_parse_from(["hostprep", "/tmp/app", "a.com; include /x"]).is_err());
        assert!(parse_domain("").is_err());
        assert!(parse_domain("x'y.com").is_err());
        assert!(parse_domain("\"a\".com").is_err());
        assert!(parse_domain("mail.example.com").is_ok());
    }

    #[test]
    fn test_flags() {
        let cli = Cli::try_parse_from(["hostprep", "-n", "-vv", "--source", "/src"]).unwrap();
        assert!(cli.dry_run);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.source, Some(PathBuf::from("/src")));
    }
}
