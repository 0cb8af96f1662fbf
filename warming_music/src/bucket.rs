// Threshold bucketing: value -> discrete index.
//
// A value takes the index of the first threshold it does not exceed
// (`v <= threshold`), offset by the table's `min_index`. Ties go to the lower
// index.
//
// A value above every threshold has no bucket. This always happens to the
// series maximum when `min_index` is 0 (see normalize.rs), and floating-point
// rounding can cause it elsewhere. `OverflowPolicy` decides what happens:
// `Drop` emits nothing for that position, so the output is shorter than the
// input and no longer position-aligned with it; `Clamp` emits `max_index`.

use crate::normalize::ThresholdTable;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// What to do with a value that exceeds every threshold.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverflowPolicy {
    /// Skip the value entirely.
    #[default]
    Drop,
    /// Map the value to `max_index`.
    Clamp,
}

impl fmt::Display for OverflowPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OverflowPolicy::Drop => write!(f, "drop"),
            OverflowPolicy::Clamp => write!(f, "clamp"),
        }
    }
}

impl FromStr for OverflowPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "drop" => Ok(OverflowPolicy::Drop),
            "clamp" => Ok(OverflowPolicy::Clamp),
            other => Err(format!("unknown overflow policy '{other}' (expected drop or clamp)")),
        }
    }
}

/// Output of bucketing one series.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Assignment {
    /// One index per emitted value, in input order.
    pub indices: Vec<i32>,
    /// Input positions that exceeded every threshold.
    pub overflowed: Vec<usize>,
}

/// Index for a single value, or `None` if it exceeds every threshold.
pub fn bucket(value: f64, thresholds: &[f64], min_index: i32) -> Option<i32> {
    thresholds
        .iter()
        .position(|&t| value <= t)
        .map(|pos| pos as i32 + min_index)
}

/// Bucket every value of a series against `table`.
pub fn assign(values: &[f64], table: &ThresholdTable, policy: OverflowPolicy) -> Assignment {
    let mut out = Assignment::default();
    for (pos, &value) in values.iter().enumerate() {
        match bucket(value, table.thresholds(), table.min_index()) {
            Some(index) => out.indices.push(index),
            None => {
                out.overflowed.push(pos);
                if policy == OverflowPolicy::Clamp {
                    out.indices.push(table.max_index());
                }
            }
        }
    }
    out
}
