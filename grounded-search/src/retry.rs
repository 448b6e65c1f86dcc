//! Exponential backoff between retry attempts.

use std::time::Duration;

/// Doubling delay sequence: `initial`, `2 * initial`, `4 * initial`, ...
///
/// Each retry loop owns one `Backoff` and calls [`Backoff::next_delay`]
/// before sleeping. Saturates instead of overflowing.
#[derive(Debug, Clone)]
pub struct Backoff {
    next: Duration,
}

impl Backoff {
    /// Start a sequence at `initial`.
    pub fn new(initial: Duration) -> Self {
        Self { next: initial }
    }

    /// Start a sequence at `initial_ms` milliseconds.
    pub fn from_millis(initial_ms: u64) -> Self {
        Self::new(Duration::from_millis(initial_ms))
    }

    /// Return the delay to sleep now and double the one after it.
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.next;
        self.next = self.next.saturating_mul(2);
        delay
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doubles_each_step() {
        let mut backoff = Backoff::from_millis(200);
        assert_eq!(backoff.next_delay(), Duration::from_millis(200));
        assert_eq!(backoff.next_delay(), Duration::from_millis(400));
        assert_eq!(backoff.next_delay(), Duration::from_millis(800));
    }

    #[test]
    fn zero_stays_zero() {
        let mut backoff = Backoff::from_millis(0);
        assert_eq!(backoff.next_delay(), Duration::ZERO);
        assert_eq!(backoff.next_delay(), Duration::ZERO);
    }

    #[test]
    fn saturates_instead_of_overflowing() {
        let mut backoff = Backoff::new(Duration::MAX);
        assert_eq!(backoff.next_delay(), Duration::MAX);
        assert_eq!(backoff.next_delay(), Duration::MAX);
    }
}
