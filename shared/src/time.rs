use thiserror::Error;

/// Error type for wall-clock reads
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum TimeError {
    /// System time is before UNIX epoch
    #[error("system time is before UNIX epoch")]
    SystemTimeBeforeEpoch,
}

cfg_if! {
    if #[cfg(target_arch = "wasm32")] {
        compile_error!("wasm targets have no ambient clock; drive repositories with externally supplied time");
    } else {
        use std::time::SystemTime;

        /// Current wall-clock time in seconds. Library code never calls
        /// this; repositories and schedulers take `now` from the caller so
        /// tests stay deterministic. Binaries use it to feed their tick
        /// loops.
        pub fn try_now_seconds() -> Result<f64, TimeError> {
            SystemTime::now()
                .duration_since(SystemTime::UNIX_EPOCH)
                .map(|d| d.as_secs_f64())
                .map_err(|_| TimeError::SystemTimeBeforeEpoch)
        }
    }
}

/// Fires at a fixed interval against caller-supplied time.
#[derive(Debug, Clone, Copy)]
pub struct Timer {
    interval: f64,
    next: f64,
}

impl Timer {
    /// A timer that first rings `interval` seconds after `now`.
    pub fn new(interval: f64, now: f64) -> Self {
        Self {
            interval,
            next: now + interval,
        }
    }

    pub fn ringing(&self, now: f64) -> bool {
        now >= self.next
    }

    pub fn reset(&mut self, now: f64) {
        self.next = now + self.interval;
    }

    pub fn interval(&self) -> f64 {
        self.interval
    }
}
