//! Incremental mean arithmetic for the running aggregate
//!
//! Both functions are pure: they take the current `(count, mean)` pair and
//! one mark value, and return the next pair. The count stays an integer and
//! the mean a float; nothing rounds. An absent stored mean counts as 0.0,
//! matching how a missing numeric field reads from the document layer.

/// Aggregate after adding one mark of `value`.
pub fn apply_add(count: u64, mean: Option<f64>, value: f64) -> (u64, f64) {
    let total = count as f64 * mean.unwrap_or(0.0) + value;
    let next_count = count + 1;
    (next_count, total / next_count as f64)
}

/// Aggregate after removing one mark of `value`.
///
/// Callers must locate the mark before calling; removing from an empty
/// aggregate is a contract fault.
pub fn apply_remove(count: u64, mean: Option<f64>, value: f64) -> (u64, Option<f64>) {
    assert!(count >= 1, "cannot remove a mark from an empty aggregate");
    let next_count = count - 1;
    if next_count == 0 {
        return (0, None);
    }
    let total = count as f64 * mean.unwrap_or(0.0) - value;
    (next_count, Some(total / next_count as f64))
}
