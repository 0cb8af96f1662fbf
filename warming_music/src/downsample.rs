// Block averaging.
//
// Shortens a series by replacing each complete run of `step` consecutive
// readings with its arithmetic mean. Windows start at position 0 and do not
// overlap. A trailing run shorter than `step` is dropped, so a 100-month
// history averaged by 12 yields 8 yearly values and the last 4 months are
// never heard.

use crate::error::{Result, SonifyError};

/// Average `values` over consecutive windows of `step` readings.
///
/// `step == 1` returns the input unchanged; `step > values.len()` returns an
/// empty vector.
pub fn average(values: &[f64], step: usize) -> Result<Vec<f64>> {
    if step == 0 {
        return Err(SonifyError::invalid("averaging step must be at least 1"));
    }
    Ok(values
        .chunks_exact(step)
        .map(|window| window.iter().sum::<f64>() / step as f64)
        .collect())
}
