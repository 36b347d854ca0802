//! Progress bars for long submissions and resolutions
//!
//! Bars draw on stderr and stay invisible when it is not a terminal.

use indicatif::{ProgressBar, ProgressStyle};

const TEMPLATE: &str = "{msg:>10} [{bar:40}] {pos}/{len} ({elapsed})";

/// Bar over `len` steps, hidden unless `show`
pub fn bar(len: usize, message: &'static str, show: bool) -> ProgressBar {
    if !show {
        return ProgressBar::hidden();
    }
    let style = ProgressStyle::with_template(TEMPLATE)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> ");
    ProgressBar::new(len as u64)
        .with_style(style)
        .with_message(message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_bar_is_hidden() {
        let bar = bar(5, "Submitting", false);
        bar.inc(1);
        assert!(bar.is_hidden());
    }

    #[test]
    fn test_enabled_bar_tracks_length() {
        let bar = bar(5, "Resolving", true);
        bar.inc(2);
        assert_eq!(bar.length(), Some(5));
        assert_eq!(bar.position(), 2);
        bar.finish_and_clear();
    }
}
