//! Worker fan-out sizing.

/// Number of workers for `parallelism` cores at `load_factor`.
///
/// `ceil(parallelism × load_factor)`, never less than one. A non-finite or
/// negative load factor counts as zero, so it still yields one worker.
///
/// ```
/// use unitvisor::worker_count;
///
/// assert_eq!(worker_count(4, 0.5), 2);
/// assert_eq!(worker_count(3, 0.5), 2);
/// assert_eq!(worker_count(8, 1.0), 8);
/// assert_eq!(worker_count(2, 0.0), 1);
/// ```
pub fn worker_count(parallelism: usize, load_factor: f64) -> usize {
    let factor = if load_factor.is_finite() {
        load_factor.max(0.0)
    } else {
        0.0
    };
    let raw = (parallelism as f64 * factor).ceil();
    (raw as usize).max(1)
}
