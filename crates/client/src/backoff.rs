use std::time::Duration;

use rand::Rng;

/// Delay before retrying the attempt numbered `attempt` (zero-based).
///
/// Grows as `base * 2^attempt` plus a uniform random jitter in
/// `[0, jitter_max]` so simultaneous callers do not hammer a recovering
/// service in lockstep. Pure apart from the jitter draw; the exponential
/// part saturates instead of overflowing.
pub fn retry_delay(attempt: u32, base: Duration, jitter_max: Duration) -> Duration {
    let exponential = base.saturating_mul(2u32.saturating_pow(attempt));
    let jitter = jitter_max.mul_f64(rand::rng().random_range(0.0..=1.0));
    exponential.saturating_add(jitter)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: Duration = Duration::from_millis(200);
    const JITTER: Duration = Duration::from_millis(100);

    #[test]
    fn test_delay_doubles_per_attempt_without_jitter() {
        assert_eq!(retry_delay(0, BASE, Duration::ZERO), BASE);
        assert_eq!(retry_delay(1, BASE, Duration::ZERO), BASE * 2);
        assert_eq!(retry_delay(2, BASE, Duration::ZERO), BASE * 4);
        assert_eq!(retry_delay(3, BASE, Duration::ZERO), BASE * 8);
    }

    #[test]
    fn test_delay_stays_within_jitter_bounds() {
        for attempt in 0..6 {
            let floor = BASE * 2u32.pow(attempt);
            let ceiling = floor + JITTER;
            for _ in 0..100 {
                let delay = retry_delay(attempt, BASE, JITTER);
                assert!(delay >= floor, "attempt {attempt}: {delay:?} < {floor:?}");
                assert!(delay <= ceiling, "attempt {attempt}: {delay:?} > {ceiling:?}");
            }
        }
    }

    #[test]
    fn test_huge_attempt_saturates_instead_of_panicking() {
        let delay = retry_delay(64, BASE, JITTER);
        assert!(delay >= Duration::from_secs(3600));
    }
}
