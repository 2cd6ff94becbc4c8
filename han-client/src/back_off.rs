//! Back-off strategy used by the [`crate::ConnectionManager`] between
//! reconnect attempts.

/// A reconnect back-off strategy. Call [`failure`](BackOffStrategy::failure)
/// after a failed connect attempt and [`reset`](BackOffStrategy::reset)
/// after a successful one.
pub trait BackOffStrategy: Send {
    fn failure(&mut self);
    fn reset(&mut self);
    fn current_delay_sec(&self) -> u64;
}

/// Doubles the delay on every failure, starting at one second, capped
/// at `max_delay_sec`.
#[derive(Debug, Clone)]
pub struct ExponentialBackOff {
    delay_sec: u64,
    max_delay_sec: u64,
}

impl ExponentialBackOff {
    pub const DEFAULT_MAX_DELAY_SEC: u64 = 60;

    pub fn new() -> Self {
        Self {
            delay_sec: 0,
            max_delay_sec: Self::DEFAULT_MAX_DELAY_SEC,
        }
    }

    pub fn with_max_delay(max_delay_sec: u64) -> Self {
        Self {
            delay_sec: 0,
            max_delay_sec,
        }
    }
}

impl Default for ExponentialBackOff {
    fn default() -> Self {
        Self::new()
    }
}

impl BackOffStrategy for ExponentialBackOff {
    fn failure(&mut self) {
        self.delay_sec = if self.delay_sec == 0 { 1 } else { self.delay_sec * 2 };
    }

    fn reset(&mut self) {
        self.delay_sec = 0;
    }

    fn current_delay_sec(&self) -> u64 {
        self.delay_sec.min(self.max_delay_sec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doubles_on_each_failure_and_caps_at_max() {
        let mut back_off = ExponentialBackOff::with_max_delay(10);
        assert_eq!(back_off.current_delay_sec(), 0);
        back_off.failure();
        assert_eq!(back_off.current_delay_sec(), 1);
        back_off.failure();
        assert_eq!(back_off.current_delay_sec(), 2);
        back_off.failure();
        assert_eq!(back_off.current_delay_sec(), 4);
        back_off.failure();
        assert_eq!(back_off.current_delay_sec(), 8);
        back_off.failure();
        assert_eq!(back_off.current_delay_sec(), 10);
    }

    #[test]
    fn reset_returns_to_zero() {
        let mut back_off = ExponentialBackOff::new();
        back_off.failure();
        back_off.failure();
        back_off.reset();
        assert_eq!(back_off.current_delay_sec(), 0);
    }
}
