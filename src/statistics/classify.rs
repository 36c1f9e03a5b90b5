use num_traits::Float;

/// Returns `true` iff every observation is exactly `0` or exactly `1`.
///
/// An empty sample carries no evidence of a binomial model and returns `false`.
pub fn is_binomial<T: Float>(sample: &[T]) -> bool {
    if sample.is_empty() {
        return false;
    }
    sample.iter().all(|&x| x == T::zero() || x == T::one())
}

/// Number of ones and the total number of trials in a 0/1 sample.
pub fn count_successes<T: Float>(sample: &[T]) -> (u64, u64) {
    let successes = sample.iter().filter(|&&x| x == T::one()).count() as u64;
    (successes, sample.len() as u64)
}
