use log::info;

use super::watchdog::watchdog_expired;

/// Outcome of one [`ListeningMode::update`] call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ListeningTransition {
    Started,
    Stopped,
}

/// Setup/listening mode requests for one interface.
///
/// Requests are latched and applied on the next `update`, so callers can
/// request from any context and the owner applies them in its own tick.
#[derive(Clone, Copy, Debug, Default)]
pub struct ListeningMode {
    active: bool,
    enter_requested: bool,
    exit_requested: bool,
    started_at_ms: u64,
    timeout_ms: u32,
}

impl ListeningMode {
    /// `timeout_ms == 0` keeps listening until an explicit exit.
    pub fn new(timeout_ms: u32) -> Self {
        Self {
            timeout_ms,
            ..Self::default()
        }
    }

    pub fn request_enter(&mut self) {
        self.enter_requested = true;
        self.exit_requested = false;
    }

    pub fn request_exit(&mut self) {
        self.exit_requested = self.active || self.enter_requested;
        self.enter_requested = false;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Active, or about to be.
    pub fn is_engaged(&self) -> bool {
        self.active || self.enter_requested
    }

    pub fn update(&mut self, now_ms: u64) -> Option<ListeningTransition> {
        if self.enter_requested {
            self.enter_requested = false;
            if !self.active {
                self.active = true;
                self.started_at_ms = now_ms;
                return Some(ListeningTransition::Started);
            }
        }
        if !self.active {
            self.exit_requested = false;
            return None;
        }
        let timed_out =
            self.timeout_ms > 0 && watchdog_expired(self.started_at_ms, self.timeout_ms, now_ms);
        if self.exit_requested || timed_out {
            if timed_out {
                info!("net: listening timeout");
            }
            self.active = false;
            self.exit_requested = false;
            return Some(ListeningTransition::Stopped);
        }
        None
    }
}
