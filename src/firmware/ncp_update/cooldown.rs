/// Gate that keeps state logic from re-running until a delay has passed.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct Cooldown {
    armed_at_ms: u64,
    duration_ms: u32,
    active: bool,
}

impl Cooldown {
    pub(crate) fn arm(&mut self, now_ms: u64, duration_ms: u32) {
        self.armed_at_ms = now_ms;
        self.duration_ms = duration_ms;
        self.active = duration_ms > 0;
    }

    /// Clears the gate once elapsed. Returns whether it is still closed.
    pub(crate) fn update(&mut self, now_ms: u64) -> bool {
        if self.active && now_ms.saturating_sub(self.armed_at_ms) >= u64::from(self.duration_ms) {
            self.active = false;
        }
        self.active
    }

    pub(crate) fn in_cooldown(&self) -> bool {
        self.active
    }

    pub(crate) fn clear(&mut self) {
        self.active = false;
    }
}
