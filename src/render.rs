//! Status line layout.
//!
//! [`render_line`] is a pure function of a [`LineState`]: it never reads the clock or the
//! terminal, which keeps every layout decision testable with fixed inputs. The produced
//! line has the shape
//!
//! ```text
//! \r{description}{pct}%|{bar}| {n}/{total} [{elapsed}<{eta}, {rate}{unit}/s]
//! ```
//!
//! where the percentage and bar only appear when the total is known, and is truncated to
//! `columns + 1` characters (the extra character being the leading carriage return).

use std::time::Duration;

use crate::format::{format_clock, format_si};

/// Widest line ever laid out; matches the largest width a terminal can report.
pub const MAX_COLUMNS: usize = u16::MAX as usize;

/// Characters spent on bar decoration: `"100%"`, `"|"` and `"| "`.
const DECORATION_WIDTH: usize = 7;

/// Partial-cell glyphs in eighths; index zero draws nothing.
const PARTIAL_BLOCKS: [&str; 8] = ["", "▏", "▎", "▍", "▌", "▋", "▊", "▉"];

const FULL_BLOCK: char = '█';

/// Placeholder for values that cannot be computed yet.
const UNKNOWN: &str = "?";

/// Everything the renderer needs to lay out one status line.
#[derive(Clone, Copy, Debug)]
pub struct LineState<'a> {
    /// Cumulative progress count.
    pub n: u64,
    /// Known upper bound for `n`; `None` or `Some(0)` means indeterminate.
    pub total: Option<u64>,
    /// Time since the meter started.
    pub elapsed: Duration,
    /// Description prefix, already including its `": "` separator when non-empty.
    pub description: &'a str,
    /// Unit label (e.g. `"it"`, `"B"`).
    pub unit: &'a str,
    /// Whether counts and rates are SI-scaled.
    pub unit_scale: bool,
    /// Terminal width in columns.
    pub columns: usize,
}

impl LineState<'_> {
    fn known_total(&self) -> Option<u64> {
        self.total.filter(|&total| total > 0)
    }

    /// Completion fraction in `[0, 1]`, or `None` when the total is unknown.
    #[allow(clippy::cast_precision_loss)]
    fn fraction(&self) -> Option<f64> {
        self.known_total()
            .map(|total| (self.n as f64 / total as f64).clamp(0.0, 1.0))
    }

    #[allow(clippy::cast_precision_loss)]
    fn count_text(&self, value: u64) -> String {
        if self.unit_scale {
            format_si(value as f64)
        } else {
            value.to_string()
        }
    }

    fn progress_text(&self) -> String {
        let n = self.count_text(self.n);
        match self.known_total() {
            Some(total) => format!("{n}/{}", self.count_text(total)),
            None => format!("{n}{}", self.unit),
        }
    }

    fn time_text(&self) -> String {
        let elapsed = self.elapsed.as_secs_f64();
        let mut text = format_clock(elapsed);

        if let Some(fraction) = self.fraction() {
            text.push('<');
            if self.n > 0 && fraction > 0.0 {
                text.push_str(&format_clock(elapsed / fraction - elapsed));
            } else {
                text.push_str(UNKNOWN);
            }
        }

        text
    }

    #[allow(clippy::cast_precision_loss)]
    fn rate_text(&self) -> String {
        let elapsed = self.elapsed.as_secs_f64();
        if self.n == 0 || elapsed <= 0.0 {
            return UNKNOWN.to_owned();
        }

        let rate = self.n as f64 / elapsed;
        if self.unit_scale {
            format_si(rate)
        } else {
            format!("{rate:5.2}")
        }
    }

    fn suffix(&self) -> String {
        format!(
            "{} [{}, {}{}/s]",
            self.progress_text(),
            self.time_text(),
            self.rate_text(),
            self.unit
        )
    }
}

/// Draws a bar of exactly `width` cells filled to `fraction`.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
fn bar(width: usize, fraction: f64) -> String {
    let filled = width as f64 * fraction.clamp(0.0, 1.0);
    let full = (filled as usize).min(width);
    let partial = if full < width {
        PARTIAL_BLOCKS[(filled * 8.0) as usize % 8]
    } else {
        ""
    };

    let mut out = String::with_capacity(width.saturating_mul(FULL_BLOCK.len_utf8()));
    out.extend(std::iter::repeat_n(FULL_BLOCK, full));
    out.push_str(partial);

    let drawn = full + usize::from(!partial.is_empty());
    out.extend(std::iter::repeat_n(' ', width - drawn));
    out
}

/// Renders one status line, including the leading carriage return.
///
/// The result is never longer than `state.columns + 1` characters. Widths above
/// [`MAX_COLUMNS`] are laid out as [`MAX_COLUMNS`].
#[must_use]
pub fn render_line(state: &LineState<'_>) -> String {
    let columns = state.columns.min(MAX_COLUMNS);
    let suffix = state.suffix();
    let mut line = String::from("\r");
    line.push_str(state.description);

    if let Some(fraction) = state.fraction() {
        let width = columns
            .saturating_sub(state.description.chars().count())
            .saturating_sub(DECORATION_WIDTH)
            .saturating_sub(suffix.chars().count())
            .max(1);

        // Floored so 100% appears only once the total is reached.
        line.push_str(&format!(
            "{:3.0}%|{}| ",
            (100.0 * fraction).floor(),
            bar(width, fraction)
        ));
    }

    line.push_str(&suffix);

    match line.char_indices().nth(columns.saturating_add(1)) {
        Some((cut, _)) => {
            line.truncate(cut);
            line
        }
        None => line,
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use proptest::prelude::*;

    use super::{LineState, MAX_COLUMNS, bar, render_line};

    fn state(n: u64, total: Option<u64>, elapsed_secs: u64, columns: usize) -> LineState<'static> {
        LineState {
            n,
            total,
            elapsed: Duration::from_secs(elapsed_secs),
            description: "",
            unit: "it",
            unit_scale: false,
            columns,
        }
    }

    fn percent(line: &str) -> u32 {
        line.trim_start_matches('\r')
            .split('%')
            .next()
            .unwrap()
            .trim()
            .parse()
            .unwrap()
    }

    /// Initial State
    /// Zero progress with a known total shows placeholders for ETA and rate.
    #[test]
    fn test_zero_progress_line() {
        let line = render_line(&state(0, Some(10), 0, 40));

        assert!(line.starts_with("\r  0%|"));
        assert!(line.ends_with("| 0/10 [0<?, ?it/s]"));
        assert_eq!(line.chars().count(), 41);
    }

    /// Bar Fill
    /// Half progress fills half the bar with full blocks.
    #[test]
    fn test_half_filled_bar() {
        let line = render_line(&state(5, Some(10), 10, 60));

        assert!(line.starts_with("\r 50%|"));
        assert!(line.contains("5/10 [10<10,  0.50it/s]"));
        assert_eq!(line.chars().count(), 61);

        let bar_cells: String = line.split('|').nth(1).unwrap().to_owned();
        let full = bar_cells.chars().filter(|&c| c == '█').count();
        assert_eq!(full, bar_cells.chars().count() / 2);
    }

    /// Partial Glyphs
    /// The fractional remainder of a cell is drawn with an eighth-block glyph.
    #[test]
    fn test_partial_block() {
        assert_eq!(bar(4, 0.5), "██  ");
        assert_eq!(bar(1, 0.5), "▌");
        assert_eq!(bar(2, 0.0625), "▏ ");
        assert_eq!(bar(3, 1.0), "███");
        assert_eq!(bar(3, 0.0), "   ");
    }

    /// Indeterminate Total
    /// Without a total there is no bar and the unit follows the count.
    #[test]
    fn test_unknown_total() {
        let line = render_line(&state(42, None, 2, 80));
        assert_eq!(line, "\r42it [2, 21.00it/s]");

        let zero_total = render_line(&state(42, Some(0), 2, 80));
        assert_eq!(zero_total, line);
    }

    /// SI Scaling
    /// Counts and rates switch to metric prefixes when scaling is enabled.
    #[test]
    fn test_unit_scale() {
        let line = render_line(&LineState {
            n: 1500,
            total: None,
            elapsed: Duration::from_secs(1),
            description: "download: ",
            unit: "B",
            unit_scale: true,
            columns: 80,
        });

        assert_eq!(line, "\rdownload: 1.50kB [1, 1.50kB/s]");
    }

    /// Narrow Terminals
    /// Lines are truncated instead of wrapping.
    #[test]
    fn test_truncation() {
        let line = render_line(&LineState {
            description: "a rather long description: ",
            ..state(3, Some(7), 1, 10)
        });

        assert_eq!(line.chars().count(), 11);
        assert!(line.starts_with("\ra rather "));
    }

    /// Completion
    /// The percentage reads exactly 100 when the count reaches the total.
    #[test]
    fn test_complete() {
        let line = render_line(&state(7, Some(7), 3, 50));
        assert_eq!(percent(&line), 100);
        assert!(line.contains("|███"));
        assert!(line.ends_with("███| 7/7 [3<0,  2.33it/s]"));
    }

    /// Near Completion
    /// The percentage only reaches 100 when the count equals the total.
    #[test]
    fn test_percent_floors_below_total() {
        assert_eq!(percent(&render_line(&state(996, Some(1000), 3, 80))), 99);
        assert_eq!(percent(&render_line(&state(999, Some(1000), 3, 80))), 99);
        assert_eq!(percent(&render_line(&state(1000, Some(1000), 3, 80))), 100);
    }

    /// Oversized Width
    /// Absurd widths are capped instead of overflowing or allocating without bound.
    #[test]
    fn test_huge_columns_capped() {
        let line = render_line(&state(1, Some(2), 1, usize::MAX));

        assert_eq!(line.chars().count(), MAX_COLUMNS + 1);
        assert!(line.starts_with("\r 50%|"));
        assert!(line.ends_with("| 1/2 [1<1,  1.00it/s]"));
    }

    /// Overshoot
    /// Counts past the total are clamped to 100%.
    #[test]
    fn test_overshoot_clamped() {
        let line = render_line(&state(12, Some(7), 3, 50));
        assert_eq!(percent(&line), 100);
    }

    proptest! {
        /// Width Bound
        /// No line is ever wider than the terminal plus the carriage return.
        #[test]
        fn prop_line_fits(n in 0u64..1_000_000, total in 0u64..1_000_000, cols in 0usize..300, secs in 0u64..100_000, scale in any::<bool>()) {
            let line = render_line(&LineState {
                n,
                total: Some(total),
                elapsed: Duration::from_secs(secs),
                description: "batch: ",
                unit: "it",
                unit_scale: scale,
                columns: cols,
            });
            prop_assert!(line.chars().count() <= cols + 1);
        }

        /// Monotone Percentage
        /// The percentage never decreases as progress grows toward the total.
        #[test]
        fn prop_percent_monotone(total in 1u64..10_000, a in 0u64..10_000, b in 0u64..10_000) {
            let (lo, hi) = (a.min(b).min(total), a.max(b).min(total));
            let lo_pct = percent(&render_line(&state(lo, Some(total), 5, 120)));
            let hi_pct = percent(&render_line(&state(hi, Some(total), 5, 120)));
            prop_assert!(lo_pct <= hi_pct);
            prop_assert!(hi_pct <= 100);
            if hi == total {
                prop_assert_eq!(hi_pct, 100);
            }
        }
    }
}
