/// `true` once `duration_ms` has passed since `base_ms`.
pub fn watchdog_expired(base_ms: u64, duration_ms: u32, now_ms: u64) -> bool {
    now_ms.saturating_sub(base_ms) >= u64::from(duration_ms)
}

/// Deadline for one connection attempt.
#[derive(Clone, Copy, Debug, Default)]
pub struct ConnectionWatchdog {
    armed_at_ms: Option<u64>,
    duration_ms: u32,
}

impl ConnectionWatchdog {
    pub fn arm(&mut self, now_ms: u64, duration_ms: u32) {
        self.armed_at_ms = Some(now_ms);
        self.duration_ms = duration_ms;
    }

    pub fn disarm(&mut self) {
        self.armed_at_ms = None;
    }

    pub fn is_armed(&self) -> bool {
        self.armed_at_ms.is_some()
    }

    pub fn expired(&self, now_ms: u64) -> bool {
        self.armed_at_ms
            .is_some_and(|base| watchdog_expired(base, self.duration_ms, now_ms))
    }
}
