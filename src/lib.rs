//! # `progress_meter`
//!
//! A single-line terminal progress meter for iterators and manually driven counters.
//!
//! The meter renders a status line such as
//!
//! ```text
//! embedding:  42%|██████████████▎                   | 42/100 [0:12<0:16, 3.50it/s]
//! ```
//!
//! and keeps it current in place on stderr (or any injected [`std::io::Write`] sink). It is
//! designed to be:
//!
//! * **Cheap in tight loops**: renders are throttled by an adaptive stride so the write
//!   rate stays near a target number of renders per second however fast updates arrive.
//! * **Layout-safe**: lines are fitted to the terminal width and never wrap.
//! * **Non-fatal**: zero elapsed time, zero progress, unknown totals and redirected
//!   output all degrade to placeholder text; render-path I/O errors are logged and dropped.
//!
//! ## Modules
//!
//! * [`builder`]: [`ProgressOptions`] and the fluent [`ProgressBuilder`].
//! * [`error`]: [`ProgressError`] and the crate [`Result`] alias.
//! * [`format`]: clock and SI-prefix formatters.
//! * [`io`]: capture buffer, terminal width query and line-clearing writes.
//! * [`iter`]: the [`ProgressIter`] adapter and [`ProgressIteratorExt`].
//! * [`progress`]: the [`ProgressMeter`] state machine and its throttle.
//! * [`render`]: the pure status-line renderer.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod builder;
pub mod error;
pub mod format;
pub mod io;
pub mod iter;
pub mod progress;
pub mod render;

pub use builder::{ProgressBuilder, ProgressOptions};
pub use error::{ProgressError, Result};
pub use iter::{ProgressIter, ProgressIteratorExt, progress_range};
pub use progress::ProgressMeter;
