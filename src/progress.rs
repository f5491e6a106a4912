//! Progress reporting for playlist syncs.
//!
//! Interactive runs draw indicatif bars. Log-only runs hide them and emit
//! periodic `[PHASE] n/total (pct%)` lines instead, which read well under
//! `tail -f`.

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::time::Duration;

const BAR_TEMPLATE: &str = "{msg} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec}, ETA: {eta})";
const SPINNER_TEMPLATE: &str = "{msg} {spinner} [{elapsed_precise}]";

/// How progress is surfaced. Chosen once from the CLI and passed down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProgressMode {
    #[default]
    Interactive,
    LogOnly,
}

impl ProgressMode {
    pub fn from_log_only(log_only: bool) -> Self {
        if log_only {
            ProgressMode::LogOnly
        } else {
            ProgressMode::Interactive
        }
    }

    pub fn is_log_only(self) -> bool {
        self == ProgressMode::LogOnly
    }

    /// Progress bar over `len` items; hidden in log-only mode.
    pub fn bar(self, len: u64, msg: &str) -> ProgressBar {
        let pb = ProgressBar::new(len);
        match self {
            ProgressMode::LogOnly => pb.set_draw_target(ProgressDrawTarget::hidden()),
            ProgressMode::Interactive => pb.set_style(
                ProgressStyle::default_bar()
                    .template(BAR_TEMPLATE)
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("=> "),
            ),
        }
        pb.set_message(msg.to_string());
        pb
    }

    /// Spinner for work of unknown length, such as loading a library dump.
    pub fn spinner(self, msg: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        match self {
            ProgressMode::LogOnly => pb.set_draw_target(ProgressDrawTarget::hidden()),
            ProgressMode::Interactive => {
                pb.set_style(
                    ProgressStyle::default_spinner()
                        .template(SPINNER_TEMPLATE)
                        .unwrap_or_else(|_| ProgressStyle::default_spinner()),
                );
                pb.enable_steady_tick(Duration::from_millis(100));
            }
        }
        pb.set_message(msg.to_string());
        pb
    }

    /// Log-only counterpart of a bar tick, every `interval` items and at the end.
    pub fn tick(self, phase: &str, current: u64, total: u64, interval: u64) {
        if let Some(line) = self.progress_line(phase, current, total, interval) {
            log::info!("{}", line);
        }
    }

    fn progress_line(self, phase: &str, current: u64, total: u64, interval: u64) -> Option<String> {
        if !self.is_log_only() || total == 0 {
            return None;
        }
        if current % interval.max(1) != 0 && current != total {
            return None;
        }
        let pct = 100.0 * current as f64 / total as f64;
        Some(format!("[{}] {}/{} ({:.1}%)", phase, current, total, pct))
    }
}

/// Format duration in human-readable format
pub fn format_duration(d: Duration) -> String {
    let secs = d.as_secs_f64();
    if secs < 60.0 {
        format!("{:.1}s", secs)
    } else {
        format!("{:.1}m", secs / 60.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(2500)), "2.5s");
        assert_eq!(format_duration(Duration::from_secs(90)), "1.5m");
    }

    #[test]
    fn test_progress_lines_only_in_log_only_mode() {
        let interactive = ProgressMode::from_log_only(false);
        assert_eq!(interactive.progress_line("MATCH", 10, 20, 10), None);

        let log_only = ProgressMode::from_log_only(true);
        assert_eq!(
            log_only.progress_line("MATCH", 10, 20, 10).as_deref(),
            Some("[MATCH] 10/20 (50.0%)")
        );
        assert_eq!(log_only.progress_line("MATCH", 11, 20, 10), None);
        assert_eq!(
            log_only.progress_line("MATCH", 20, 20, 25).as_deref(),
            Some("[MATCH] 20/20 (100.0%)")
        );
        assert_eq!(log_only.progress_line("MATCH", 0, 0, 10), None);
    }

    #[test]
    fn test_log_only_bar_is_hidden() {
        let pb = ProgressMode::LogOnly.bar(3, "Matching");
        assert!(pb.is_hidden());
        pb.finish_and_clear();
    }
}
