//! Iterator adapters for automatic progress tracking.
//!
//! [`ProgressIter`] decorates any iterator with a [`ProgressMeter`]. Progress for an
//! element is recorded when the *next* element is requested, i.e. after the caller has
//! finished working on it, so the bar reflects completed work rather than work started.
//! Exhausting the source issues the closing update exactly once.
//!
//! # Example
//!
//! ```no_run
//! use progress_meter::{ProgressIteratorExt as _, progress_range};
//!
//! for batch in vec![1, 2, 3].into_iter().progress() {
//!     // ...
//! #   let _ = batch;
//! }
//!
//! for step in progress_range(300) {
//!     // ...
//! #   let _ = step;
//! }
//! ```

use std::{
    fmt,
    io::{Stderr, Write},
    ops::Range,
};

use compact_str::CompactString;

use crate::{builder::ProgressBuilder, error::Result, progress::ProgressMeter};

/// An iterator adapter that advances a [`ProgressMeter`] once per element.
///
/// Single pass: once the source is exhausted the meter is closed, and further calls only
/// forward to the source. Dropping the adapter early (e.g. on `break`) still counts the
/// element that was being worked on before the meter closes.
pub struct ProgressIter<I, W: Write = Stderr> {
    iter: I,
    meter: ProgressMeter<W>,
}

impl<I, W: Write> fmt::Debug for ProgressIter<I, W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgressIter")
            .field("meter", &self.meter)
            .finish_non_exhaustive()
    }
}

impl<I, W: Write> ProgressIter<I, W> {
    /// Creates a new `ProgressIter` around an already started meter.
    ///
    /// Usually constructed via [`ProgressIteratorExt`] or [`ProgressBuilder::wrap`].
    pub const fn new(iter: I, meter: ProgressMeter<W>) -> Self {
        Self { iter, meter }
    }

    /// The meter driven by this iterator.
    #[must_use]
    pub const fn meter(&self) -> &ProgressMeter<W> {
        &self.meter
    }

    /// Mutable access to the meter, e.g. to change its description mid-run.
    pub const fn meter_mut(&mut self) -> &mut ProgressMeter<W> {
        &mut self.meter
    }

    /// Stops iterating and hands back the meter.
    ///
    /// An element that was yielded but not yet counted is counted first.
    #[must_use]
    pub fn into_meter(mut self) -> ProgressMeter<W> {
        self.meter.settle();
        self.meter
    }
}

impl<I: Iterator, W: Write> Iterator for ProgressIter<I, W> {
    type Item = I::Item;

    fn next(&mut self) -> Option<Self::Item> {
        self.meter.settle();

        let item = self.iter.next();
        if item.is_some() {
            self.meter.defer_inc();
        } else {
            self.meter.close();
        }

        item
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.iter.size_hint()
    }
}

/// Extension trait to attach a stderr progress meter to any iterator.
pub trait ProgressIteratorExt: Iterator + Sized {
    /// Wraps the iterator in a meter with default options.
    ///
    /// The total is taken from the iterator's exact length when it has one.
    fn progress(self) -> ProgressIter<Self>;

    /// Wraps the iterator in a meter with the given description.
    fn progress_with_description(
        self,
        description: impl Into<CompactString>,
    ) -> ProgressIter<Self>;

    /// Wraps the iterator using a configured builder.
    ///
    /// # Errors
    ///
    /// Returns the builder's validation error (see [`ProgressBuilder::build`]).
    fn progress_with<W: Write>(self, builder: ProgressBuilder<W>) -> Result<ProgressIter<Self, W>>;
}

impl<I: Iterator> ProgressIteratorExt for I {
    fn progress(self) -> ProgressIter<Self> {
        self.progress_with_description(CompactString::default())
    }

    fn progress_with_description(
        self,
        description: impl Into<CompactString>,
    ) -> ProgressIter<Self> {
        // Default options always validate.
        let meter = ProgressBuilder::new()
            .description(description)
            .total(crate::builder::exact_len(&self))
            .launch();
        ProgressIter::new(self, meter)
    }

    fn progress_with<W: Write>(self, builder: ProgressBuilder<W>) -> Result<ProgressIter<Self, W>> {
        builder.wrap(self)
    }
}

/// Iterates `0..n` with a stderr progress meter whose total is `n`.
#[must_use]
pub fn progress_range(n: u64) -> ProgressIter<Range<u64>> {
    let meter = ProgressBuilder::new().total(n).launch();
    ProgressIter::new(0..n, meter)
}

#[cfg(test)]
mod tests {
    use super::ProgressIteratorExt as _;
    use crate::{ProgressBuilder, io::SharedBuffer};

    fn builder(buf: &SharedBuffer) -> ProgressBuilder<SharedBuffer> {
        ProgressBuilder::new().with_sink(buf.clone()).columns(60)
    }

    /// Range Helper
    /// A range of five yields 0..5 in order with five increments plus one close.
    #[test]
    fn test_range_updates() {
        let buf = SharedBuffer::new();
        let mut iter = builder(&buf).range(5).unwrap();

        let items: Vec<u64> = iter.by_ref().collect();

        assert_eq!(items, vec![0, 1, 2, 3, 4]);
        assert_eq!(iter.meter().updates(), 6);
        assert_eq!(iter.meter().n(), 5);
        assert_eq!(iter.meter().total(), Some(5));
        assert!(iter.meter().is_closed());

        let out = buf.contents();
        assert_eq!(out.matches('\n').count(), 1);
        let last = out.trim_end().rsplit('\r').next().unwrap();
        assert!(last.starts_with("100%|"));
        assert!(last.contains("| 5/5 [0<0, "));
    }

    /// Iterator Integration
    /// Totals are inferred from exact-size sources and counts lag one element.
    #[test]
    fn test_counts_after_work() {
        let buf = SharedBuffer::new();
        let mut iter = [10, 20, 30].iter().progress_with(builder(&buf)).unwrap();

        assert_eq!(iter.meter().total(), Some(3));

        assert_eq!(iter.next(), Some(&10));
        assert_eq!(iter.meter().n(), 0, "element still being worked on");

        assert_eq!(iter.next(), Some(&20));
        assert_eq!(iter.meter().n(), 1);

        let meter = iter.into_meter();
        assert_eq!(meter.n(), 2);
        assert!(!meter.is_closed());
    }

    /// Indeterminate Sources
    /// Sources without an exact length render without a bar.
    #[test]
    fn test_unknown_length_source() {
        let buf = SharedBuffer::new();
        let evens = (0..10).filter(|x| x % 2 == 0);
        let iter = evens.progress_with(builder(&buf)).unwrap();

        assert_eq!(iter.meter().total(), None);
        assert_eq!(iter.count(), 5);
        let out = buf.contents();
        assert!(out.trim_end().rsplit('\r').next().unwrap().starts_with("5it [0, "));
    }

    /// Single Close
    /// Polling past exhaustion does not issue further updates.
    #[test]
    fn test_exhausted_iterator_closes_once() {
        let buf = SharedBuffer::new();
        let mut iter = builder(&buf).wrap(Vec::<u8>::new()).unwrap();

        assert_eq!(iter.next(), None);
        assert_eq!(iter.next(), None);

        assert_eq!(iter.meter().updates(), 1);
        assert_eq!(buf.contents().matches('\n').count(), 1);
    }

    /// Early Exit
    /// Breaking out of a loop still counts the element in hand when the meter closes.
    #[test]
    fn test_break_counts_current_element() {
        let buf = SharedBuffer::new();
        for step in builder(&buf).range(10).unwrap() {
            if step == 2 {
                break;
            }
        }

        let out = buf.contents();
        assert_eq!(out.matches('\n').count(), 1);
        assert!(out.trim_end().rsplit('\r').next().unwrap().contains("| 3/10 ["));
    }

    /// Debug Output
    /// The adapter's debug form exposes the meter's counters.
    #[test]
    fn test_debug_shows_meter() {
        let buf = SharedBuffer::new();
        let iter = builder(&buf).disabled(true).range(4).unwrap();

        let debug = format!("{iter:?}");
        assert!(debug.starts_with("ProgressIter { meter: ProgressMeter { n: 0, total: Some(4)"));
    }

    /// Disabled Wrapper
    /// A disabled wrapper yields every element and writes nothing.
    #[test]
    fn test_disabled_wrapper() {
        let buf = SharedBuffer::new();
        let total: u64 = builder(&buf).disabled(true).range(1_000).unwrap().sum();

        assert_eq!(total, 499_500);
        assert!(buf.is_empty());
    }
}
