//! Capability traits for the collaborators the supervisory layer drives.
//!
//! The update engine and the network layer only see these seams; the
//! ESP32 wiring in `platform` and the host mocks in tests implement them.

mod cache;

pub use cache::FlashSystemCache;
pub(crate) use cache::checksum8;

use super::types::{
    CloudFeature, DisconnectReason, NcpIdentifier, NetworkInterface, PowerState,
    PublishVisibility, SystemError,
};

/// Final result of one AT command round trip.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AtResult {
    Ok,
    Error,
    Timeout,
}

impl AtResult {
    pub const fn is_ok(self) -> bool {
        matches!(self, Self::Ok)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Error => "error",
            Self::Timeout => "timeout",
        }
    }
}

pub trait AtTransport {
    /// Sends `cmd` and blocks until a final result line or `timeout_ms`.
    /// Every intermediate response line is handed to `on_line`.
    fn command(&mut self, cmd: &str, timeout_ms: u32, on_line: &mut dyn FnMut(&str)) -> AtResult;

    /// Drains pending unsolicited lines without issuing a command.
    fn poll_urcs(&mut self) {}
}

/// Keys of the shared persistent cache. Each key owns one fixed slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CacheKey {
    NcpFwUpdateData,
    BootMode,
}

impl CacheKey {
    pub const fn as_u8(self) -> u8 {
        match self {
            Self::NcpFwUpdateData => 1,
            Self::BootMode => 2,
        }
    }

    pub const fn slot(self) -> usize {
        match self {
            Self::NcpFwUpdateData => 0,
            Self::BootMode => 1,
        }
    }
}

pub trait SystemCache {
    /// Copies the stored value into `buf` and returns its length.
    fn cache_get(&mut self, key: CacheKey, buf: &mut [u8]) -> Result<usize, SystemError>;
    fn cache_set(&mut self, key: CacheKey, data: &[u8]) -> Result<(), SystemError>;
    fn cache_delete(&mut self, key: CacheKey) -> Result<(), SystemError>;
}

pub trait MonotonicClock {
    fn now_ms(&self) -> u64;
}

pub trait SystemControl: MonotonicClock {
    fn delay_ms(&mut self, ms: u32);
    fn ncp_identifier(&self) -> NcpIdentifier;
    /// User-level switch for modem firmware updates.
    fn updates_enabled(&self) -> bool;
    fn is_safe_mode(&self) -> bool;
    /// On hardware these never return; mocks record the request.
    fn reset_into_safe_mode(&mut self);
    fn reset_into_normal_mode(&mut self);
}

pub trait NetworkControl {
    fn network_on(&mut self, iface: NetworkInterface) -> Result<(), SystemError>;
    fn network_off(&mut self, iface: NetworkInterface) -> Result<(), SystemError>;
    fn network_connect(&mut self, iface: NetworkInterface) -> Result<(), SystemError>;
    fn network_disconnect(
        &mut self,
        iface: NetworkInterface,
        reason: DisconnectReason,
    ) -> Result<(), SystemError>;
    fn network_ready(&self, iface: NetworkInterface) -> bool;
    fn network_power_state(&self, iface: NetworkInterface) -> PowerState;
    /// While enabled the interface brings up the modem without starting
    /// the data link, leaving the AT channel to the update flow.
    fn set_ncp_update_mode(&mut self, iface: NetworkInterface, enabled: bool);
}

/// Cloud session operations injected into the update engine.
pub trait CloudCallbacks {
    fn is_cloud_connected(&self) -> bool;
    fn request_connect(&mut self);
    fn request_disconnect(&mut self);
    fn publish(&mut self, event: &str, data: &str, visibility: PublishVisibility) -> bool;
    fn feature_enabled(&self, feature: CloudFeature) -> bool;
}

/// Everything the NCP update engine needs from the device.
pub trait Platform: AtTransport + NetworkControl + SystemControl + SystemCache {}

impl<T> Platform for T where T: AtTransport + NetworkControl + SystemControl + SystemCache {}

#[cfg(test)]
mod tests;
