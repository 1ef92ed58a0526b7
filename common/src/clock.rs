use std::ops::Add;
use std::{
    sync::RwLock,
    time::{Duration, SystemTime, UNIX_EPOCH},
};

pub trait Clock: Send + Sync {
    fn now(&self) -> SystemTime;

    /// Milliseconds since the Unix epoch, clamped to zero for pre-epoch clocks.
    fn now_millis(&self) -> i64 {
        self.now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0)
    }
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}

#[derive(Debug)]
pub struct MockClock {
    now: RwLock<SystemTime>,
}

impl Clock for MockClock {
    fn now(&self) -> SystemTime {
        *self.now.read().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for MockClock {
    fn default() -> Self {
        Self::new()
    }
}

impl MockClock {
    pub fn with_time(time: SystemTime) -> Self {
        Self {
            now: RwLock::new(time),
        }
    }

    pub fn new() -> Self {
        Self::with_time(SystemTime::now())
    }

    pub fn advance(&self, duration: Duration) {
        let mut now = self.now.write().unwrap_or_else(|e| e.into_inner());
        *now = now.add(duration);
    }

    pub fn set_time(&self, time: SystemTime) {
        *self.now.write().unwrap_or_else(|e| e.into_inner()) = time;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_advance_mock_clock() {
        // given
        let clock = MockClock::with_time(UNIX_EPOCH + Duration::from_millis(1_000));

        // when
        clock.advance(Duration::from_millis(500));

        // then
        assert_eq!(clock.now_millis(), 1_500);
    }

    #[test]
    fn should_clamp_pre_epoch_time_to_zero() {
        // given
        let clock = MockClock::with_time(UNIX_EPOCH - Duration::from_secs(10));

        // when/then
        assert_eq!(clock.now_millis(), 0);
    }
}
