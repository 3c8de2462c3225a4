//! Utility functions for the CLI.

use indicatif::{ProgressBar, ProgressStyle};
use tgzkit_archive::TarEntry;
use tgzkit_core::Progress;

/// Create a progress bar with standard styling.
pub fn create_progress_bar(len: u64, enable: bool) -> ProgressBar {
    if !enable {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new(len);
    let style = ProgressStyle::default_bar()
        .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} {msg}")
        .map(|style| style.progress_chars("█▓▒░ "))
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    pb.set_style(style);
    pb
}

/// Drives an indicatif bar from archive progress reports.
pub struct BarProgress {
    bar: ProgressBar,
}

impl BarProgress {
    /// Wrap a bar; `enable = false` yields a hidden one.
    pub fn new(enable: bool) -> Self {
        Self {
            bar: create_progress_bar(0, enable),
        }
    }

    /// Label the current stage.
    pub fn stage(&self, message: &'static str) {
        self.bar.set_message(message);
    }

    /// Remove the bar from the terminal.
    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl Progress for BarProgress {
    fn set_total(&mut self, total: u64) {
        self.bar.set_length(total);
        self.bar.set_position(0);
    }

    fn set_completed(&mut self, completed: u64) {
        self.bar.set_position(completed);
    }

    fn set_completed_to_total(&mut self) {
        let total = self.bar.length().unwrap_or(0);
        self.bar.set_position(total);
    }
}

/// Format a byte count for humans.
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}

/// Print entries in a formatted table.
pub fn print_entries(entries: &[TarEntry], verbose: bool) {
    if verbose {
        println!("{:>10} {:>10} {:>4}  Name", "Offset", "Size", "Type");
        println!("{}", "-".repeat(50));

        let mut total_size = 0u64;
        for entry in entries {
            let kind = if entry.header.kind.is_dir() {
                "d".to_string()
            } else if entry.header.kind.is_file() {
                "-".to_string()
            } else {
                char::from(entry.header.kind.typeflag()).to_string()
            };
            println!(
                "{:>10} {:>10} {:>4}  {}",
                entry.offset, entry.header.size, kind, entry.header.name
            );
            total_size += entry.header.size;
        }

        println!("{}", "-".repeat(50));
        println!(
            "{:>10} {:>10}       {} entries",
            "",
            format_size(total_size),
            entries.len()
        );
    } else {
        for entry in entries {
            println!("{}", entry.header.name);
        }
    }
}
