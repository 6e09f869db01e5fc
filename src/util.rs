//! Shared normalization and date-comparison helpers.
//!
//! WHOIS and TLS sources are noisy: values come back with stray whitespace,
//! mixed casing, and timestamps that drift by hours between reads. All
//! comparisons in the differencers go through these helpers so a cosmetic
//! difference never produces an audit record.

use chrono::{DateTime, Utc};

/// Normalizes a string for comparison: trim plus lowercase.
pub fn norm(s: &str) -> String {
    s.trim().to_lowercase()
}

/// Normalizes an optional string, mapping blank values to `None`.
pub fn norm_opt(s: Option<&str>) -> Option<String> {
    match s {
        Some(v) => {
            let v = norm(v);
            if v.is_empty() {
                None
            } else {
                Some(v)
            }
        }
        None => None,
    }
}

/// Whether a fresh string value differs from the stored one.
///
/// A missing or blank fresh value is never a change; the upstream simply
/// had no data for the field.
pub fn field_changed(stored: Option<&str>, fresh: Option<&str>) -> bool {
    match norm_opt(fresh) {
        None => false,
        Some(f) => norm_opt(stored).as_deref() != Some(f.as_str()),
    }
}

/// Absolute distance between two timestamps at day granularity.
pub fn days_apart(a: DateTime<Utc>, b: DateTime<Utc>) -> i64 {
    (a.date_naive() - b.date_naive()).num_days().abs()
}

/// Whether a fresh date should be treated as changed against the stored one.
///
/// An absent stored date always counts as changed; otherwise the dates must
/// differ by strictly more than `threshold_days` (day granularity, so
/// timezone noise inside one day never registers).
pub fn date_changed(
    stored: Option<DateTime<Utc>>,
    fresh: DateTime<Utc>,
    threshold_days: i64,
) -> bool {
    match stored {
        None => true,
        Some(old) => days_apart(old, fresh) > threshold_days,
    }
}

/// Formats a timestamp as its calendar date, the form used for audit values.
pub fn fmt_day(d: DateTime<Utc>) -> String {
    d.date_naive().to_string()
}

/// Whether two optional floats differ, compared numerically.
pub fn float_changed(stored: Option<f64>, fresh: Option<f64>) -> bool {
    match (stored, fresh) {
        (_, None) => false,
        (None, Some(_)) => true,
        (Some(a), Some(b)) => (a - b).abs() > 1e-6,
    }
}

/// Whether two optional integers differ. Absent fresh value is no change.
pub fn int_changed(stored: Option<i64>, fresh: Option<i64>) -> bool {
    match (stored, fresh) {
        (_, None) => false,
        (None, Some(_)) => true,
        (Some(a), Some(b)) => a != b,
    }
}
