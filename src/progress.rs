//! The stateful progress meter.
//!
//! [`ProgressMeter`] owns the counters, the start instant and the throttle stride, and
//! decides on every [`update`](ProgressMeter::update) whether a new status line is worth
//! drawing.
//!
//! # Throttling
//!
//! Writing to a terminal is expensive compared to a tight work loop, so the meter only
//! renders on every `skip`-th update. Each render measures the observed update rate
//! (`updates / elapsed`); when it exceeds the target rate, the stride is raised to
//! `floor(observed / target)`. The realized render rate therefore converges on the target
//! no matter how fast the caller spins. The stride never shrinks within a run.
//!
//! Closing updates always render, regardless of the stride.

use std::{
    fmt,
    io::{Stderr, Write},
    time::Duration,
};

use compact_str::{CompactString, format_compact};
use tracing::{debug, trace};
use web_time::Instant;

use crate::{
    builder::ProgressOptions,
    error::Result,
    io::{terminal_columns, write_to},
    render::{LineState, render_line},
};

/// A single-line progress meter writing to `W` (stderr by default).
///
/// The meter is driven explicitly: call [`update`](Self::update) after each unit of work
/// and [`close`](Self::close) when done. Dropping an unclosed meter closes it.
///
/// Every update takes `&mut self`; share a meter across threads only behind a lock.
pub struct ProgressMeter<W: Write = Stderr> {
    sink: W,
    start: Instant,

    /// Cumulative progress.
    n: u64,
    /// Number of `update` calls, used only for throttling.
    updates: u64,
    total: Option<u64>,

    /// Render every `skip`-th update. Always at least one.
    skip: u64,
    rate: f64,

    description: CompactString,
    unit: CompactString,
    unit_scale: bool,
    disabled: bool,
    columns: Option<usize>,

    /// One unit of work handed out by a wrapping iterator but not yet counted.
    pending: bool,
    closed: bool,
}

impl<W: Write> fmt::Debug for ProgressMeter<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgressMeter")
            .field("n", &self.n)
            .field("total", &self.total)
            .field("updates", &self.updates)
            .field("skip", &self.skip)
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

impl ProgressMeter<Stderr> {
    /// Creates a meter on stderr with default options and draws its initial state.
    ///
    /// Use [`ProgressBuilder`](crate::ProgressBuilder) for anything beyond a description
    /// and a total.
    #[must_use]
    pub fn new(description: &str, total: impl Into<Option<u64>>) -> Self {
        let options = ProgressOptions {
            description: description.into(),
            total: total.into(),
            ..ProgressOptions::default()
        };
        Self::launch(options, std::io::stderr(), Instant::now())
    }

    /// Clears the current stderr line and prints `message` on it.
    ///
    /// Use this instead of printing directly while a bar is active, so the message does
    /// not get mixed into the bar. The next render redraws the bar below it.
    ///
    /// # Errors
    ///
    /// Returns [`ProgressError::Io`](crate::ProgressError::Io) if stderr cannot be written.
    pub fn write(message: &str) -> Result<()> {
        write_to(&mut std::io::stderr().lock(), message)?;
        Ok(())
    }
}

impl<W: Write> ProgressMeter<W> {
    /// Builds the meter from validated options and draws the zero-progress state.
    pub(crate) fn launch(options: ProgressOptions, sink: W, start: Instant) -> Self {
        let ProgressOptions {
            description,
            disabled,
            unit,
            unit_scale,
            total,
            rate,
            columns,
        } = options;

        let mut meter = Self {
            sink,
            start,
            n: 0,
            updates: 0,
            total,
            skip: 1,
            rate,
            description: CompactString::default(),
            unit,
            unit_scale,
            disabled,
            columns,
            pending: false,
            closed: false,
        };
        meter.set_description(&description);

        if !meter.disabled {
            meter.draw(meter.elapsed(), false);
        }
        meter
    }

    // ========================================================================
    // Updates
    // ========================================================================

    /// Advances progress by `n` and redraws unless throttled.
    pub fn update(&mut self, n: u64) {
        self.advance(n, false);
    }

    /// Advances progress by one.
    pub fn inc(&mut self) {
        self.advance(1, false);
    }

    /// Issues the closing update: forces a final render and ends the line.
    ///
    /// Closing is idempotent; only the first call counts as an update. Work deferred by a
    /// wrapping iterator is counted before the line is closed.
    pub fn close(&mut self) {
        if !self.closed {
            self.settle();
            self.advance(0, true);
        }
    }

    /// Marks one unit as in flight; it is counted by the next [`settle`](Self::settle).
    pub(crate) const fn defer_inc(&mut self) {
        self.pending = true;
    }

    /// Counts the deferred unit, if any.
    pub(crate) fn settle(&mut self) {
        if std::mem::take(&mut self.pending) {
            self.inc();
        }
    }

    fn advance(&mut self, n: u64, close: bool) {
        self.n = self.n.saturating_add(n);
        self.updates += 1;

        // Updates after closing keep counting but never draw.
        if self.closed {
            return;
        }
        if close {
            self.closed = true;
        }

        if self.disabled || (!close && self.updates % self.skip != 0) {
            return;
        }

        let elapsed = self.elapsed();
        if !close {
            self.adjust_skip(elapsed);
        }
        self.draw(elapsed, close);
    }

    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    fn adjust_skip(&mut self, elapsed: Duration) {
        let secs = elapsed.as_secs_f64();
        if secs <= 0.0 {
            return;
        }

        let observed = self.updates as f64 / secs;
        if observed <= self.rate {
            return;
        }

        let stride = ((observed / self.rate) as u64).max(1);
        if stride > self.skip {
            debug!(
                from = self.skip,
                to = stride,
                observed_rate = observed,
                target_rate = self.rate,
                "raising progress render stride"
            );
            self.skip = stride;
        }
    }

    fn draw(&mut self, elapsed: Duration, close: bool) {
        let mut line = self.line(elapsed);
        if close {
            line.push('\n');
            trace!(n = self.n, updates = self.updates, "closing progress line");
        }

        let written = self
            .sink
            .write_all(line.as_bytes())
            .and_then(|()| self.sink.flush());

        if let Err(err) = written {
            debug!(%err, "failed to draw progress line");
        }
    }

    fn line(&self, elapsed: Duration) -> String {
        render_line(&LineState {
            n: self.n,
            total: self.total,
            elapsed,
            description: &self.description,
            unit: &self.unit,
            unit_scale: self.unit_scale,
            columns: self.columns.unwrap_or_else(terminal_columns),
        })
    }

    /// Renders the current state without writing it or touching the throttle.
    #[must_use]
    pub fn render(&self) -> String {
        self.line(self.elapsed())
    }

    // ========================================================================
    // Presentation
    // ========================================================================

    /// Replaces the description prefix used by subsequent renders.
    ///
    /// A non-empty description is followed by `": "`; an empty one clears the prefix.
    pub fn set_description(&mut self, description: &str) {
        self.description = if description.is_empty() {
            CompactString::default()
        } else {
            format_compact!("{description}: ")
        };
    }

    /// Clears the current line of this meter's sink and prints `message` on it.
    ///
    /// # Errors
    ///
    /// Returns [`ProgressError::Io`](crate::ProgressError::Io) if the sink fails.
    pub fn println(&mut self, message: &str) -> Result<()> {
        write_to(&mut self.sink, message)?;
        Ok(())
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Cumulative progress count.
    #[must_use]
    pub const fn n(&self) -> u64 {
        self.n
    }

    /// The known total, if any.
    #[must_use]
    pub const fn total(&self) -> Option<u64> {
        self.total
    }

    /// Number of update calls so far, including the closing one.
    #[must_use]
    pub const fn updates(&self) -> u64 {
        self.updates
    }

    /// Current throttle stride.
    #[must_use]
    pub const fn skip(&self) -> u64 {
        self.skip
    }

    /// Target renders per second.
    #[must_use]
    pub const fn rate(&self) -> f64 {
        self.rate
    }

    /// The rendered description prefix (including its `": "` separator).
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Whether output is suppressed.
    #[must_use]
    pub const fn is_disabled(&self) -> bool {
        self.disabled
    }

    /// Whether the closing update has been issued.
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        self.closed
    }

    /// Time since the meter started.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        Instant::now().saturating_duration_since(self.start)
    }
}

impl<W: Write> Drop for ProgressMeter<W> {
    fn drop(&mut self) {
        self.close();
    }
}
