use core::sync::atomic::{AtomicI32, AtomicU32, AtomicU8, Ordering};

use super::types::{NcpFwUpdateStatus, NetworkDiagState, NetworkInterface};

static NCP_UPDATE_RUNS: AtomicU32 = AtomicU32::new(0);
static NCP_DOWNLOAD_ATTEMPTS: AtomicU32 = AtomicU32::new(0);
static NCP_DOWNLOAD_FAILURES: AtomicU32 = AtomicU32::new(0);
static NCP_INSTALL_POLLS: AtomicU32 = AtomicU32::new(0);
static NCP_RESETS_REQUESTED: AtomicU32 = AtomicU32::new(0);
static NCP_UPDATE_STATUS_DIAG: AtomicI32 = AtomicI32::new(NcpFwUpdateStatus::None.as_i32());
static NET_CONNECT_ATTEMPTS: AtomicU32 = AtomicU32::new(0);
static NET_WATCHDOG_RESETS: AtomicU32 = AtomicU32::new(0);
static NET_DIAG_STATE: [AtomicU8; NetworkInterface::COUNT] = [
    AtomicU8::new(0),
    AtomicU8::new(0),
    AtomicU8::new(0),
    AtomicU8::new(0),
];

#[derive(Clone, Copy, Debug)]
pub struct Snapshot {
    pub ncp_update_runs: u32,
    pub ncp_download_attempts: u32,
    pub ncp_download_failures: u32,
    pub ncp_install_polls: u32,
    pub ncp_resets_requested: u32,
    pub ncp_update_status_diag: i32,
    pub net_connect_attempts: u32,
    pub net_watchdog_resets: u32,
}

pub fn snapshot() -> Snapshot {
    Snapshot {
        ncp_update_runs: NCP_UPDATE_RUNS.load(Ordering::Relaxed),
        ncp_download_attempts: NCP_DOWNLOAD_ATTEMPTS.load(Ordering::Relaxed),
        ncp_download_failures: NCP_DOWNLOAD_FAILURES.load(Ordering::Relaxed),
        ncp_install_polls: NCP_INSTALL_POLLS.load(Ordering::Relaxed),
        ncp_resets_requested: NCP_RESETS_REQUESTED.load(Ordering::Relaxed),
        ncp_update_status_diag: NCP_UPDATE_STATUS_DIAG.load(Ordering::Relaxed),
        net_connect_attempts: NET_CONNECT_ATTEMPTS.load(Ordering::Relaxed),
        net_watchdog_resets: NET_WATCHDOG_RESETS.load(Ordering::Relaxed),
    }
}

pub(crate) fn record_ncp_update_run() {
    NCP_UPDATE_RUNS.fetch_add(1, Ordering::Relaxed);
}

pub(crate) fn record_ncp_download_attempt() {
    NCP_DOWNLOAD_ATTEMPTS.fetch_add(1, Ordering::Relaxed);
}

pub(crate) fn record_ncp_download_failure() {
    NCP_DOWNLOAD_FAILURES.fetch_add(1, Ordering::Relaxed);
}

pub(crate) fn record_ncp_install_poll() {
    NCP_INSTALL_POLLS.fetch_add(1, Ordering::Relaxed);
}

pub(crate) fn record_ncp_reset_requested() {
    NCP_RESETS_REQUESTED.fetch_add(1, Ordering::Relaxed);
}

pub(crate) fn set_ncp_update_status_diag(status: NcpFwUpdateStatus) {
    NCP_UPDATE_STATUS_DIAG.store(status.as_i32(), Ordering::Relaxed);
}

/// Last terminal update status, `-1` until a run has finished.
pub fn ncp_fw_update_status_diagnostic() -> i32 {
    NCP_UPDATE_STATUS_DIAG.load(Ordering::Relaxed)
}

pub(crate) fn record_net_connect_attempt() {
    NET_CONNECT_ATTEMPTS.fetch_add(1, Ordering::Relaxed);
}

pub(crate) fn record_net_watchdog_reset() {
    NET_WATCHDOG_RESETS.fetch_add(1, Ordering::Relaxed);
}

pub(crate) fn set_network_diag_state(iface: NetworkInterface, state: NetworkDiagState) {
    NET_DIAG_STATE[iface.index()].store(state.as_u8(), Ordering::Relaxed);
}

pub fn network_diag_state(iface: NetworkInterface) -> NetworkDiagState {
    NetworkDiagState::from_u8(NET_DIAG_STATE[iface.index()].load(Ordering::Relaxed))
        .unwrap_or(NetworkDiagState::Disconnected)
}
