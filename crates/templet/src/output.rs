//! Status lines printed by the commands
//!
//! Success and info go to stdout; warnings and errors go to stderr so `list --json` stays
//! parseable.

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Print a success message
pub fn success(msg: &str) {
    println!("{} {}", style("✓").green().bold(), msg);
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{} {}", style("✗").red().bold(), msg);
}

/// Print a warning message
pub fn warning(msg: &str) {
    eprintln!("{} {}", style("⚠").yellow().bold(), msg);
}

/// Print an info message
pub fn info(msg: &str) {
    println!("{} {}", style("ℹ").blue().bold(), msg);
}

/// Print a header
pub fn header(msg: &str) {
    println!("\n{}", style(msg).bold().underlined());
}

/// Print a key-value pair
pub fn kv(key: &str, value: &str) {
    println!("  {}: {}", style(key).dim(), value);
}

/// Create a spinner
pub fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.blue} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Print a timed completion line such as `Downloaded in 1.23s`
pub fn done_in(action: &str, elapsed: Duration) {
    success(&timed(action, elapsed));
}

/// Print the commands to run next, one per line
pub fn next_steps(steps: &[String]) {
    if steps.is_empty() {
        return;
    }
    println!("\n{}", style("Next steps:").bold());
    for step in steps {
        println!("  {}", style(step).cyan());
    }
}

/// Print the leading lines of a release changelog
pub fn changelog(preview: &str) {
    println!("\n{}", style("Changelog:").bold());
    for line in preview.lines() {
        println!("  {}", line);
    }
    println!();
}

fn timed(action: &str, elapsed: Duration) -> String {
    format!("{} in {:.2}s", action, elapsed.as_secs_f64())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timed_uses_two_decimals() {
        assert_eq!(
            timed("Downloaded", Duration::from_millis(1234)),
            "Downloaded in 1.23s"
        );
        assert_eq!(
            timed("Installed dependencies", Duration::ZERO),
            "Installed dependencies in 0.00s"
        );
    }
}
