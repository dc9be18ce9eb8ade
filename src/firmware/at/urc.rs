use core::sync::atomic::{AtomicI32, AtomicU8, Ordering};

use embassy_sync::{blocking_mutex::raw::CriticalSectionRawMutex, signal::Signal};
use log::{debug, info};

use super::parse::{
    parse_http_complete, parse_install_progress, parse_pdp_deactivation, HttpsResponse,
    URC_FW_INSTALL, URC_HTTP_COMPLETE, URC_PDP_EVENT,
};

const PDP_NONE: i32 = -1;
const PROGRESS_NONE: u8 = u8::MAX;

/// Hand-off between the AT receive path and the update poll loop.
///
/// Written from whatever context drains the UART, read once per tick.
pub struct UrcMailbox {
    https: Signal<CriticalSectionRawMutex, HttpsResponse>,
    pdp_deactivated: AtomicI32,
    install_progress: AtomicU8,
}

impl UrcMailbox {
    pub const fn new() -> Self {
        Self {
            https: Signal::new(),
            pdp_deactivated: AtomicI32::new(PDP_NONE),
            install_progress: AtomicU8::new(PROGRESS_NONE),
        }
    }

    /// Returns `true` when the line was one of the routed URCs.
    pub fn on_urc(&self, line: &str) -> bool {
        if line.starts_with(URC_HTTP_COMPLETE) {
            if let Some(response) = parse_http_complete(line) {
                debug!(
                    "at: http complete command={} result={} status={}",
                    response.command, response.result, response.status_code
                );
                self.https.signal(response);
            }
            return true;
        }
        if line.starts_with(URC_PDP_EVENT) {
            if let Some(cid) = parse_pdp_deactivation(line) {
                info!("at: pdp deactivated cid={}", cid);
                self.pdp_deactivated.store(i32::from(cid), Ordering::Release);
            }
            return true;
        }
        if line.starts_with(URC_FW_INSTALL) {
            if let Some(progress) = parse_install_progress(line) {
                self.install_progress.store(progress, Ordering::Release);
            }
            return true;
        }
        false
    }

    pub fn take_https_response(&self) -> Option<HttpsResponse> {
        self.https.try_take()
    }

    pub fn clear_https_response(&self) {
        self.https.reset();
    }

    pub fn take_pdp_deactivation(&self) -> Option<u8> {
        let cid = self.pdp_deactivated.swap(PDP_NONE, Ordering::AcqRel);
        u8::try_from(cid).ok()
    }

    pub fn install_progress(&self) -> Option<u8> {
        match self.install_progress.load(Ordering::Acquire) {
            PROGRESS_NONE => None,
            progress => Some(progress),
        }
    }

    pub fn clear_install_progress(&self) {
        self.install_progress.store(PROGRESS_NONE, Ordering::Release);
    }
}

impl Default for UrcMailbox {
    fn default() -> Self {
        Self::new()
    }
}
