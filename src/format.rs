//! Human-readable formatting of durations and magnitudes.
//!
//! Both formatters are pure and total: any `f64` input (including `NaN`, infinities and
//! negative values) produces a string rather than a panic, since they feed directly into
//! a status line that must never abort the work it decorates.

/// Metric prefixes indexed by base-1000 order of magnitude.
const SI_PREFIXES: [&str; 9] = ["", "k", "M", "G", "T", "P", "E", "Z", "Y"];

/// Number of characters kept from the scaled mantissa (e.g. `"1.50"`, `"12.3"`, `"999"`).
const SI_WIDTH: usize = 4;

/// Formats a number of seconds as a compact clock string.
///
/// Leading zero fields are dropped, the first remaining field is unpadded and every field
/// after it is zero-padded to two digits:
///
/// * `5.0` -> `"5"`
/// * `61.0` -> `"1:01"`
/// * `3661.0` -> `"1:01:01"`
///
/// Fractional seconds are truncated. Non-finite or negative input renders as `"0"`.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn format_clock(secs: f64) -> String {
    let secs = if secs.is_finite() && secs > 0.0 {
        secs as u64
    } else {
        0
    };

    let (hours, minutes, seconds) = (secs / 3600, secs % 3600 / 60, secs % 60);

    if hours > 0 {
        format!("{hours}:{minutes:02}:{seconds:02}")
    } else if minutes > 0 {
        format!("{minutes}:{seconds:02}")
    } else {
        seconds.to_string()
    }
}

/// Formats a non-negative magnitude with a metric (SI) prefix.
///
/// The value is divided by `1000^order`, where `order` is its base-1000 magnitude, and
/// printed with as many decimals as fit in four characters before the prefix is
/// appended: `1500.0` -> `"1.50k"`, `25_000.0` -> `"25.0k"`, `3.2e6` -> `"3.20M"`.
///
/// Zero renders as the literal `"0.00"`. Values below one keep an empty prefix, values at
/// or beyond `1000^8` saturate at the `Y` prefix, and non-finite or negative input is
/// treated as zero.
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_possible_wrap
)]
pub fn format_si(value: f64) -> String {
    if !value.is_finite() || value <= 0.0 {
        return "0.00".to_owned();
    }

    let magnitude = value.log10() / 3.0;
    let order = magnitude.clamp(0.0, (SI_PREFIXES.len() - 1) as f64).floor() as usize;

    // Larger mantissas leave room for fewer decimals.
    let decimals = (3.0 - 3.0 * (magnitude % 1.0)).clamp(0.0, 3.0) as usize;
    let scaled = value / 1000f64.powi(order as i32);

    let rendered = format!("{scaled:.decimals$}");
    let mut mantissa: String = rendered.chars().take(SI_WIDTH).collect();
    while mantissa.ends_with('.') {
        mantissa.pop();
    }

    mantissa.push_str(SI_PREFIXES[order]);
    mantissa
}
