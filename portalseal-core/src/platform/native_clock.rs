use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime};

use crate::error::SealError;
use crate::traits::clock::Clock;

/// Native Clock implementation using std::time::SystemTime.
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeClock;

impl NativeClock {
    pub fn new() -> Self {
        Self
    }
}

impl Clock for NativeClock {
    fn now_secs(&self) -> Result<u64, SealError> {
        SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .map_err(|e| SealError::Platform(format!("SystemTime error: {e}")))
    }

    fn now_millis(&self) -> Result<u64, SealError> {
        SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .map_err(|e| SealError::Platform(format!("SystemTime error: {e}")))
    }
}

/// Clock that only moves when told to. Used to simulate handshake expiry.
#[derive(Debug, Default)]
pub struct ManualClock {
    millis: AtomicU64,
}

impl ManualClock {
    pub fn new(start_millis: u64) -> Self {
        Self {
            millis: AtomicU64::new(start_millis),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.millis.fetch_add(by.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn set_millis(&self, millis: u64) {
        self.millis.store(millis, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_secs(&self) -> Result<u64, SealError> {
        Ok(self.millis.load(Ordering::SeqCst) / 1000)
    }

    fn now_millis(&self) -> Result<u64, SealError> {
        Ok(self.millis.load(Ordering::SeqCst))
    }
}
