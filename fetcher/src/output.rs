//! User-facing progress output.
//!
//! Status lines go to an injected writer (standard error in the binary, a
//! `Vec<u8>` in tests). Download progress uses an `indicatif` bar that draws
//! to standard error and is hidden entirely in quiet mode.

use crate::artefact::location::UpdateTime;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::Write;
use std::time::Duration;

/// Tick interval for the download spinner.
const TICK_INTERVAL: Duration = Duration::from_millis(80);

/// Progress bar template once the content length is known.
const BYTES_TEMPLATE: &str = "  {spinner:.cyan} [{bar:30.cyan/dim}] {bytes}/{total_bytes} ({eta})";

/// Spinner template while the content length is unknown.
const SPINNER_TEMPLATE: &str = "  {spinner:.cyan} {bytes} {msg}";

/// Write one line to `stderr`, ignoring write failures.
pub fn write_stderr_line(stderr: &mut dyn Write, message: impl std::fmt::Display) {
    if writeln!(stderr, "{message}").is_err() {
        // Best-effort reporting; ignore write failures.
    }
}

/// Status reporter honouring the quiet flag.
pub struct Reporter<'a> {
    stderr: &'a mut dyn Write,
    quiet: bool,
}

impl<'a> Reporter<'a> {
    /// Create a reporter writing to `stderr`.
    pub fn new(stderr: &'a mut dyn Write, quiet: bool) -> Self {
        Self { stderr, quiet }
    }

    /// Emit a status line unless quiet.
    pub fn line(&mut self, message: impl std::fmt::Display) {
        if !self.quiet {
            write_stderr_line(self.stderr, message);
        }
    }
}

/// Describe when an artifact was last updated, for status output.
#[must_use]
pub fn describe_update_time(update_time: &UpdateTime) -> String {
    match update_time {
        UpdateTime::Known(time) => time.format("%Y-%m-%d").to_string(),
        UpdateTime::Unknown => "at an unknown date".to_owned(),
    }
}

/// Create a download progress bar.
///
/// When `total_bytes` is known the bar tracks completion, otherwise a
/// spinner counts transferred bytes. Quiet runs get a hidden bar so callers
/// can update it unconditionally.
#[must_use]
pub fn download_progress(total_bytes: Option<u64>, quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }
    let bar = match total_bytes {
        Some(total) => {
            let bar = ProgressBar::new(total);
            if let Ok(style) = ProgressStyle::default_bar().template(BYTES_TEMPLATE) {
                bar.set_style(style.progress_chars("━╸━"));
            }
            bar
        }
        None => {
            let bar = ProgressBar::new_spinner();
            if let Ok(style) = ProgressStyle::default_spinner().template(SPINNER_TEMPLATE) {
                bar.set_style(style);
            }
            bar
        }
    };
    bar.enable_steady_tick(TICK_INTERVAL);
    bar
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn reporter_writes_lines_when_not_quiet() {
        let mut buffer = Vec::new();
        let mut reporter = Reporter::new(&mut buffer, false);
        reporter.line("Downloading checksum");
        assert_eq!(String::from_utf8_lossy(&buffer), "Downloading checksum\n");
    }

    #[test]
    fn reporter_is_silent_when_quiet() {
        let mut buffer = Vec::new();
        let mut reporter = Reporter::new(&mut buffer, true);
        reporter.line("Downloading checksum");
        assert!(buffer.is_empty());
    }

    #[test]
    fn known_update_time_renders_as_date() {
        let time = Utc
            .with_ymd_and_hms(2023, 6, 1, 12, 30, 0)
            .single()
            .expect("valid timestamp");
        assert_eq!(describe_update_time(&UpdateTime::Known(time)), "2023-06-01");
    }

    #[test]
    fn unknown_update_time_is_described() {
        assert_eq!(
            describe_update_time(&UpdateTime::Unknown),
            "at an unknown date"
        );
    }

    #[test]
    fn quiet_progress_is_hidden() {
        let bar = download_progress(Some(1024), true);
        assert!(bar.is_hidden());
    }
}
