//! Colored output and progress reporting for the installer
//!
//! Uses owo-colors for terminal colors and indicatif for spinners and
//! download bars. Errors and warnings go to stderr, everything else to stdout.

use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use std::time::Duration;

/// Print an action header (blue, bold)
/// Example: "==> installing gcc 5.3.0"
pub fn action(message: &str) {
    println!("{} {}", "==>".blue().bold(), message.bold());
}

/// Print an action with a unit counter
/// Example: "(1/5) gcc"
pub fn action_numbered(current: usize, total: usize, message: &str) {
    println!(
        "{} {}",
        format!("({}/{})", current, total).cyan(),
        message.bold()
    );
}

/// Print a sub-action (cyan arrow)
/// Example: "  -> configure"
pub fn sub_action(step: &str) {
    println!("  {} {}", "->".cyan(), step);
}

/// Print a detail line (dimmed)
pub fn detail(message: &str) {
    println!("     {}", message.dimmed());
}

/// Echo a command before it runs
/// Example: "     $ make install"
pub fn command(cmd: &str) {
    println!("     {} {}", "$".dimmed(), cmd);
}

/// Print a success message (green)
pub fn success(message: &str) {
    println!("{} {}", "==>".green().bold(), message.green());
}

/// Print an info message (cyan)
pub fn info(message: &str) {
    println!("{} {}", "::".cyan(), message);
}

/// Print a note (used for dry runs and overwrite notices)
pub fn note(message: &str) {
    println!("{} {}", "note:".magenta().bold(), message);
}

/// Print a warning message (yellow)
pub fn warning(message: &str) {
    eprintln!("{} {}", "warning:".yellow().bold(), message.yellow());
}

/// Print an error message (red)
pub fn error(message: &str) {
    eprintln!("{} {}", "error:".red().bold(), message.red());
}

/// Print a block of captured command output under an error, dimmed
pub fn error_output(output: &str) {
    for line in output.lines() {
        eprintln!("  {} {}", "|".red(), line.dimmed());
    }
}

/// Print a skip message (dimmed)
/// Example: "==> ninja 1.7.1 already installed"
pub fn skip(message: &str) {
    println!("{} {}", "==>".dimmed(), message.dimmed());
}

/// Print one unit in `--list` output
pub fn list_item(name: &str, detail: &str, default_install: bool) {
    if default_install {
        println!("  {} {}", name.green(), detail.dimmed());
    } else {
        println!("  {} {}", name, detail.dimmed());
    }
}

/// Create a download progress bar
pub fn download_progress(total_size: u64) -> ProgressBar {
    let pb = ProgressBar::new(total_size);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("     {spinner:.cyan} [{bar:30.cyan/dim}] {bytes}/{total_bytes} ({eta})")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("━╸━"),
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Create a simple spinner for clones and extraction
pub fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("     {spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

/// RAII guard for progress bars - clears the bar on any exit path
pub struct ProgressGuard(pub ProgressBar);

impl ProgressGuard {
    pub fn bar(&self) -> &ProgressBar {
        &self.0
    }
}

impl Drop for ProgressGuard {
    fn drop(&mut self) {
        self.0.finish_and_clear();
    }
}
