use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::cell::RefCell;
use std::path::Path;
use std::time::Duration;

/// Print an info message
pub fn info(msg: &str) {
    println!("{} {}", "ℹ".blue(), msg);
}

/// Print a success message
pub fn success(msg: &str) {
    println!("{} {}", "✓".green(), msg.green());
}

/// Print a warning message
pub fn warn(msg: &str) {
    println!("{} {}", "⚠".yellow(), msg.yellow());
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg.red());
}

/// Print a dim/muted message
pub fn dim(msg: &str) {
    println!("  {}", msg.dimmed());
}

/// Print a section header
pub fn section(title: &str) {
    println!();
    println!("{}", title.cyan().bold());
}

/// Print a key-value pair
pub fn kv(key: &str, value: &str) {
    println!("  {}: {}", key.bold(), value);
}

/// Print a step indicator
pub fn step(num: usize, total: usize, msg: &str) {
    println!("{} {}", format!("[{}/{}]", num, total).blue().bold(), msg);
}

// ============================================================================
// Reporter
// ============================================================================

/// Operator-facing sink for step and status lines
///
/// Every command the runner executes ends in at most one status line.
pub trait Reporter {
    fn step(&self, index: usize, total: usize, message: &str);
    fn success(&self, message: &str);
    fn warn(&self, message: &str);
    fn error(&self, message: &str);
    fn info(&self, message: &str);

    /// A command is about to run; the next status line ends it
    fn busy(&self, _description: &str) {}
}

/// Colored terminal reporter with a transient spinner while commands run
#[derive(Default)]
pub struct Console {
    quiet: bool,
    spinner: RefCell<Option<ProgressBar>>,
}

impl Console {
    pub fn new(quiet: bool) -> Self {
        Self {
            quiet,
            spinner: RefCell::new(None),
        }
    }

    fn settle(&self) {
        if let Some(pb) = self.spinner.borrow_mut().take() {
            pb.finish_and_clear();
        }
    }
}

impl Reporter for Console {
    fn step(&self, index: usize, total: usize, message: &str) {
        self.settle();
        step(index, total, message);
    }

    fn success(&self, message: &str) {
        self.settle();
        success(message);
    }

    fn warn(&self, message: &str) {
        self.settle();
        warn(message);
    }

    fn error(&self, message: &str) {
        self.settle();
        error(message);
    }

    fn info(&self, message: &str) {
        self.settle();
        if !self.quiet {
            info(message);
        }
    }

    fn busy(&self, description: &str) {
        self.settle();
        if self.quiet {
            return;
        }
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
            pb.set_style(style);
        }
        pb.set_message(description.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));
        *self.spinner.borrow_mut() = Some(pb);
    }
}

impl Drop for Console {
    fn drop(&mut self) {
        self.settle();
    }
}

// ============================================================================
// Banners
// ============================================================================

/// Print the startup banner
pub fn banner() {
    println!(
        "{}",
        r#"
╔══════════════════════════════════════════════════════════════╗
║                  Temporary Email Installer                   ║
╚══════════════════════════════════════════════════════════════╝
"#
        .blue()
        .bold()
    );
}

/// What the operator needs to know once the run is over
#[derive(Debug, Clone)]
pub struct Completion<'a> {
    pub install_dir: &'a Path,
    pub domain: &'a str,
    pub app_name: &'a str,
    pub failed_commands: usize,
    pub dry_run: bool,
}

/// Print the completion screen
pub fn completion(done: &Completion<'_>) {
    println!(
        "{}",
        r#"
╔══════════════════════════════════════════════════════════════╗
║                    Installation Complete!                    ║
╚══════════════════════════════════════════════════════════════╝
"#
        .green()
        .bold()
    );

    kv("Install path", &done.install_dir.display().to_string());
    kv("Access URL", &format!("http://{}", done.domain));

    if done.failed_commands > 0 {
        println!();
        warn(&format!(
            "{} command(s) failed during the run; review the ✗ lines above",
            done.failed_commands
        ));
    }

    if done.dry_run {
        println!();
        warn("Dry run: nothing was executed or written");
    }

    section("Useful commands");
    println!("  pm2 status                  {}", "# app status".dimmed());
    println!(
        "  pm2 logs {:<18}  {}",
        done.app_name,
        "# view logs".dimmed()
    );
    println!(
        "  pm2 restart {:<15}  {}",
        done.app_name,
        "# restart the app".dimmed()
    );

    section("For SSL (HTTPS)");
    println!("  sudo apt install certbot python3-certbot-nginx");
    println!("  sudo certbot --nginx -d {}", done.domain);

    println!();
    println!(
        "{}",
        "Note: to receive real mail you must configure DNS and MX records.".yellow()
    );
}

// ============================================================================
// Test support
// ============================================================================

#[cfg(test)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Step,
    Success,
    Warn,
    Error,
    Info,
}

/// In-memory reporter for assertions on operator output
#[cfg(test)]
#[derive(Default)]
pub struct Transcript {
    lines: RefCell<Vec<(Level, String)>>,
}

#[cfg(test)]
impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<(Level, String)> {
        self.lines.borrow().clone()
    }

    pub fn count(&self, level: Level) -> usize {
        self.lines.borrow().iter().filter(|(l, _)| *l == level).count()
    }

    pub fn contains(&self, level: Level, needle: &str) -> bool {
        self.lines
            .borrow()
            .iter()
            .any(|(l, msg)| *l == level && msg.contains(needle))
    }

    fn push(&self, level: Level, message: &str) {
        self.lines.borrow_mut().push((level, message.to_string()));
    }
}

#[cfg(test)]
impl Reporter for Transcript {
    fn step(&self, index: usize, total: usize, message: &str) {
        self.push(Level::Step, &format!("[{index}/{total}] {message}"));
    }

    fn success(&self, message: &str) {
        self.push(Level::Success, message);
    }

    fn warn(&self, message: &str) {
        self.push(Level::Warn, message);
    }

    fn error(&self, message: &str) {
        self.push(Level::Error, message);
    }

    fn info(&self, message: &str) {
        self.push(Level::Info, message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transcript_counts_by_level() {
        let t = Transcript::new();
        t.step(1, 12, "Detecting operating system");
        t.success("OS: Ubuntu/Debian");
        t.error("Install nginx: E: dpkg was interrupted");

        assert_eq!(t.count(Level::Error), 1);
        assert_eq!(t.count(Level::Success), 1);
        assert!(t.contains(Level::Step, "[1/12]"));
        assert!(!t.contains(Level::Warn, "OS"));
    }

    #[test]
    fn test_quiet_console_suppresses_spinner() {
        let console = Console::new(true);
        console.busy("apt update");
        assert!(console.spinner.borrow().is_none());
    }
}
