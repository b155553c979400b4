//! CLI output formatting utilities.

use crate::media::FormatDescriptor;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// Output helper for CLI formatting.
pub struct Output;

impl Output {
    /// Print an info message.
    pub fn info(msg: &str) {
        println!("{} {}", style(">>").cyan().bold(), msg);
    }

    /// Print a success message.
    pub fn success(msg: &str) {
        println!("{} {}", style(">>").green().bold(), msg);
    }

    /// Print a warning message.
    pub fn warning(msg: &str) {
        eprintln!("{} {}", style(">>").yellow().bold(), msg);
    }

    /// Print an error message.
    pub fn error(msg: &str) {
        eprintln!("{} {}", style(">>").red().bold(), msg);
    }

    /// Print a header.
    pub fn header(msg: &str) {
        println!("\n{}", style(msg).bold().underlined());
    }

    /// Print a key-value pair.
    pub fn kv(key: &str, value: &str) {
        println!("  {}: {}", style(key).dim(), value);
    }

    /// Print one section of a format listing.
    pub fn format_section(title: &str, formats: &[FormatDescriptor], blocked: bool) {
        let status = if blocked { " (Not downloadable)" } else { "" };
        println!(
            "\n{} {}{} ({} formats):",
            style("*").cyan(),
            style(title).bold(),
            style(status).red(),
            formats.len()
        );
        for f in formats {
            let line = format_row(f);
            if blocked {
                println!("{}", style(line).dim());
            } else {
                println!("{}", line);
            }
        }
    }

    /// Create a percentage progress bar.
    pub fn progress_bar(len: u64, msg: &str) -> ProgressBar {
        let pb = ProgressBar::new(len);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}% {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        pb.set_message(msg.to_string());
        pb
    }

    /// Create a spinner.
    pub fn spinner(msg: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb
    }
}

/// `[id] resolution - ext - size`
pub fn format_row(f: &FormatDescriptor) -> String {
    format!("[{}] {} - {} - {}", f.id, f.resolution, f.ext, f.size_label)
}

/// Format duration in seconds to a human-readable string.
pub fn format_duration(seconds: f64) -> String {
    let total_seconds = seconds.max(0.0) as u32;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let secs = total_seconds % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, secs)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, secs)
    } else {
        format!("{}s", secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(59.9), "59s");
        assert_eq!(format_duration(212.0), "3m 32s");
        assert_eq!(format_duration(3725.0), "1h 2m 5s");
    }

    #[test]
    fn test_format_row() {
        let f = FormatDescriptor {
            id: "137".into(),
            ext: "mp4".into(),
            resolution: "1920x1080".into(),
            width: 1920,
            height: 1080,
            filesize: 1024,
            size_label: "1.00 KB".into(),
            note: "1080p".into(),
        };
        assert_eq!(format_row(&f), "[137] 1920x1080 - mp4 - 1.00 KB");
    }
}
