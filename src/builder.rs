//! Fluent construction of [`ProgressMeter`] and [`ProgressIter`] instances.
//!
//! [`ProgressOptions`] is the plain configuration record; with the `serde` feature it can
//! be deserialized straight out of a host program's config file (every field has a
//! default). [`ProgressBuilder`] wraps it together with the two things that cannot live in
//! a config file: the output sink and the start instant.
//!
//! Validation happens once, in the terminal methods ([`build`](ProgressBuilder::build),
//! [`wrap`](ProgressBuilder::wrap), [`range`](ProgressBuilder::range)), before anything is
//! drawn.

use std::{
    io::{Stderr, Write},
    ops::Range,
};

use compact_str::CompactString;
use web_time::Instant;

use crate::{
    error::{ProgressError, Result},
    iter::ProgressIter,
    progress::ProgressMeter,
    render::MAX_COLUMNS,
};

/// Renders per second when no rate is configured.
pub const DEFAULT_RATE: f64 = 100.0;

/// Construction-time configuration of a meter.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ProgressOptions {
    /// Description prefix (without the `": "` separator).
    pub description: CompactString,
    /// Suppress all output while still counting.
    pub disabled: bool,
    /// Unit label, `"it"` by default.
    pub unit: CompactString,
    /// Format counts and rates with SI prefixes.
    pub unit_scale: bool,
    /// Known total. When unset and a source is wrapped, the source's exact length is used.
    pub total: Option<u64>,
    /// Maximum renders per second. Must be positive and finite.
    pub rate: f64,
    /// Fixed terminal width, between 1 and [`MAX_COLUMNS`]. When unset, the width is
    /// queried on every render.
    pub columns: Option<usize>,
}

impl Default for ProgressOptions {
    fn default() -> Self {
        Self {
            description: CompactString::default(),
            disabled: false,
            unit: CompactString::const_new("it"),
            unit_scale: false,
            total: None,
            rate: DEFAULT_RATE,
            columns: None,
        }
    }
}

impl ProgressOptions {
    /// Checks the options for configuration errors.
    ///
    /// # Errors
    ///
    /// Returns [`ProgressError::InvalidRate`] if `rate` is not a positive finite number,
    /// or [`ProgressError::InvalidColumns`] if a fixed width is zero or above
    /// [`MAX_COLUMNS`].
    pub fn validate(&self) -> Result<()> {
        if !(self.rate.is_finite() && self.rate > 0.0) {
            return Err(ProgressError::InvalidRate { rate: self.rate });
        }

        match self.columns {
            Some(columns) if columns == 0 || columns > MAX_COLUMNS => {
                Err(ProgressError::InvalidColumns {
                    columns,
                    max: MAX_COLUMNS,
                })
            }
            _ => Ok(()),
        }
    }
}

/// A builder for meters and wrapped iterators.
///
/// ```no_run
/// use progress_meter::ProgressBuilder;
///
/// let batches = vec!["a", "b", "c"];
/// for batch in ProgressBuilder::new().description("embedding").wrap(batches)? {
///     // ...
/// #   let _ = batch;
/// }
/// # Ok::<(), progress_meter::ProgressError>(())
/// ```
pub struct ProgressBuilder<W: Write = Stderr> {
    options: ProgressOptions,
    sink: W,
    start: Option<Instant>,
}

impl Default for ProgressBuilder<Stderr> {
    fn default() -> Self {
        Self::from_options(ProgressOptions::default())
    }
}

impl ProgressBuilder<Stderr> {
    /// Starts building a meter that writes to stderr.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts building from an existing options record.
    #[must_use]
    pub fn from_options(options: ProgressOptions) -> Self {
        Self {
            options,
            sink: std::io::stderr(),
            start: None,
        }
    }
}

impl<W: Write> ProgressBuilder<W> {
    /// Sets the description prefix.
    #[must_use]
    pub fn description(mut self, description: impl Into<CompactString>) -> Self {
        self.options.description = description.into();
        self
    }

    /// Suppresses (or re-allows) all output.
    #[must_use]
    pub const fn disabled(mut self, disabled: bool) -> Self {
        self.options.disabled = disabled;
        self
    }

    /// Sets the unit label.
    #[must_use]
    pub fn unit(mut self, unit: impl Into<CompactString>) -> Self {
        self.options.unit = unit.into();
        self
    }

    /// Enables SI-prefixed counts and rates.
    #[must_use]
    pub const fn unit_scale(mut self, unit_scale: bool) -> Self {
        self.options.unit_scale = unit_scale;
        self
    }

    /// Sets the total explicitly, overriding any length inferred from a source.
    #[must_use]
    pub fn total(mut self, total: impl Into<Option<u64>>) -> Self {
        self.options.total = total.into();
        self
    }

    /// Sets the maximum number of renders per second.
    #[must_use]
    pub const fn rate(mut self, rate: f64) -> Self {
        self.options.rate = rate;
        self
    }

    /// Pins the terminal width instead of querying it on every render.
    #[must_use]
    pub const fn columns(mut self, columns: usize) -> Self {
        self.options.columns = Some(columns);
        self
    }

    /// Redirects output to `sink`.
    #[must_use]
    pub fn with_sink<S: Write>(self, sink: S) -> ProgressBuilder<S> {
        ProgressBuilder {
            options: self.options,
            sink,
            start: self.start,
        }
    }

    /// Sets the start instant explicitly (e.g. to resume timing of a paused task).
    #[must_use]
    pub const fn with_start_time(mut self, start: Instant) -> Self {
        self.start = Some(start);
        self
    }

    /// Returns the options collected so far.
    #[must_use]
    pub const fn options(&self) -> &ProgressOptions {
        &self.options
    }

    /// Validates the configuration and starts the meter, drawing its initial state.
    ///
    /// # Errors
    ///
    /// Returns [`ProgressError::InvalidRate`] if the target rate is not positive, or
    /// [`ProgressError::InvalidColumns`] if a fixed width is out of range.
    pub fn build(self) -> Result<ProgressMeter<W>> {
        self.options.validate()?;
        Ok(self.launch())
    }

    /// Wraps `source` in a meter that advances once per element.
    ///
    /// If no total was set, the source's exact length (from
    /// [`size_hint`](Iterator::size_hint)) is used when available.
    ///
    /// # Errors
    ///
    /// Returns [`ProgressError::InvalidRate`] if the target rate is not positive, or
    /// [`ProgressError::InvalidColumns`] if a fixed width is out of range.
    pub fn wrap<I: IntoIterator>(mut self, source: I) -> Result<ProgressIter<I::IntoIter, W>> {
        let iter = source.into_iter();
        if self.options.total.is_none() {
            self.options.total = exact_len(&iter);
        }
        Ok(ProgressIter::new(iter, self.build()?))
    }

    /// Wraps the integer range `0..n`, with the total preset to `n`.
    ///
    /// # Errors
    ///
    /// Returns [`ProgressError::InvalidRate`] if the target rate is not positive, or
    /// [`ProgressError::InvalidColumns`] if a fixed width is out of range.
    pub fn range(self, n: u64) -> Result<ProgressIter<Range<u64>, W>> {
        self.total(n).wrap(0..n)
    }

    /// Starts the meter without validation. Only for options known to be valid.
    pub(crate) fn launch(self) -> ProgressMeter<W> {
        let start = self.start.unwrap_or_else(Instant::now);
        ProgressMeter::launch(self.options, self.sink, start)
    }
}

/// The exact length of `iter`, if its size hint pins one down.
pub(crate) fn exact_len<I: Iterator>(iter: &I) -> Option<u64> {
    match iter.size_hint() {
        (lower, Some(upper)) if lower == upper => u64::try_from(upper).ok(),
        _ => None,
    }
}
