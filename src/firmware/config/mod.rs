//! Compile-time tuning for the NCP update flow and the network layer.

use super::types::NetworkInterface;

const SECOND_MS: u32 = 1_000;
const MINUTE_MS: u32 = 60 * SECOND_MS;

pub const NCP_FW_MODEM_POWER_ON_TIMEOUT_MS: u32 = MINUTE_MS;
pub const NCP_FW_MODEM_POWER_OFF_TIMEOUT_MS: u32 = MINUTE_MS;
pub const NCP_FW_MODEM_CLOUD_CONNECT_TIMEOUT_MS: u32 = 5 * MINUTE_MS;
pub const NCP_FW_MODEM_CLOUD_DISCONNECT_TIMEOUT_MS: u32 = 2 * MINUTE_MS;
pub const NCP_FW_MODEM_CELLULAR_CONNECT_TIMEOUT_MS: u32 = 10 * MINUTE_MS;
/// Gap between registration and PDP checks while the link comes up.
pub const NCP_FW_MODEM_CELLULAR_CONNECT_POLL_MS: u32 = 5 * SECOND_MS;
pub const NCP_FW_MODEM_CELLULAR_DISCONNECT_TIMEOUT_MS: u32 = 2 * MINUTE_MS;
pub const NCP_FW_MODEM_DOWNLOAD_TIMEOUT_MS: u32 = 5 * MINUTE_MS;
pub const NCP_FW_MODEM_INSTALL_ATOK_INTERVAL_MS: u32 = 10 * SECOND_MS;
pub const NCP_FW_MODEM_INSTALL_START_TIMEOUT_MS: u32 = 5 * MINUTE_MS;
pub const NCP_FW_MODEM_INSTALL_START_POLL_MS: u32 = SECOND_MS;
pub const NCP_FW_MODEM_INSTALL_FINISH_TIMEOUT_MS: u32 = 30 * MINUTE_MS;

pub const NCP_FW_QUALIFY_RETRY_MAX: u8 = 2;
pub const NCP_FW_QUALIFY_RETRY_COOLDOWN_MS: u32 = 10 * SECOND_MS;
pub const NCP_FW_PUBLISH_START_RETRY_MAX: u8 = 1;
pub const NCP_FW_HTTPS_SETUP_RETRY_MAX: u8 = 2;
pub const NCP_FW_HTTPS_SETUP_RETRY_COOLDOWN_MS: u32 = 10 * SECOND_MS;
pub const NCP_FW_DOWNLOAD_ATTEMPTS_MAX: u8 = 3;
pub const NCP_FW_CLOUD_CONNECT_EXIT_RETRY_MAX: u8 = 1;
pub const NCP_FW_PUBLISH_START_COOLDOWN_MS: u32 = 20 * SECOND_MS;
pub const NCP_FW_CLOUD_DISCONNECT_COOLDOWN_MS: u32 = 10 * SECOND_MS;

/// Short AT round trips such as version, file and status queries.
pub const AT_DEFAULT_TIMEOUT_MS: u32 = 10 * SECOND_MS;
pub const AT_PROBE_TIMEOUT_MS: u32 = SECOND_MS;
pub const AT_HTTP_SETUP_TIMEOUT_MS: u32 = 30 * SECOND_MS;
pub const AT_COMMAND_MAX: usize = 320;
pub const AT_LINE_MAX: usize = 256;

pub const NCP_FW_UPDATE_EVENT: &str = "spark/device/ncp/update";
pub const NCP_FW_UPDATE_DATA_STARTED: &str = "started";
pub const NCP_FW_UPDATE_DATA_SUCCESS: &str = "success";
pub const NCP_FW_UPDATE_DATA_FAILED: &str = "failed";

pub const NCP_FW_UPDATE_PDP_PROFILE: u8 = 0;
pub const NCP_FW_UPDATE_PDP_CID: u8 = 1;
pub const NCP_FW_UPDATE_HTTP_PROFILE: u8 = 0;
pub const NCP_FW_UPDATE_FOAT_TAG: &str = "FOAT";
pub const NCP_FW_INSTALL_BAUD: u32 = 115_200;
pub const NCP_FW_INSTALL_PROGRESS_COMPLETE: u8 = 100;
/// Additive marker for engineering builds in the packed version key.
pub const NCP_FW_ENG_VERSION_OFFSET: u32 = 100_000_000;

pub const NCP_FW_UPDATE_DATA_MAGIC: u32 = 0x4E43_5055;
pub const NCP_FW_UPDATE_DATA_VERSION: u8 = 1;

pub const SYSTEM_CACHE_MAGIC: u32 = 0x5343_4845;
pub const SYSTEM_CACHE_SLOT_LEN: usize = 1024;
pub const SYSTEM_CACHE_SLOT_COUNT: usize = 4;
pub const SYSTEM_CACHE_HEADER_LEN: usize = 8;

pub const NETWORK_INTERFACES_MAX: usize = 8;
pub const NCP_FW_UPDATE_INTERFACE: NetworkInterface = NetworkInterface::Cellular;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NcpFwUpdatePolicy {
    pub power_on_timeout_ms: u32,
    pub power_off_timeout_ms: u32,
    pub cloud_connect_timeout_ms: u32,
    pub cloud_disconnect_timeout_ms: u32,
    pub cellular_connect_timeout_ms: u32,
    pub cellular_connect_poll_ms: u32,
    pub cellular_disconnect_timeout_ms: u32,
    pub download_timeout_ms: u32,
    pub install_atok_interval_ms: u32,
    pub install_start_timeout_ms: u32,
    pub install_start_poll_ms: u32,
    pub install_finish_timeout_ms: u32,
    pub qualify_retry_max: u8,
    pub qualify_retry_cooldown_ms: u32,
    pub publish_start_retry_max: u8,
    pub https_setup_retry_max: u8,
    pub https_setup_retry_cooldown_ms: u32,
    pub download_attempts_max: u8,
    pub cloud_connect_exit_retry_max: u8,
    pub publish_start_cooldown_ms: u32,
    pub cloud_disconnect_cooldown_ms: u32,
}

impl NcpFwUpdatePolicy {
    pub const fn new() -> Self {
        Self {
            power_on_timeout_ms: NCP_FW_MODEM_POWER_ON_TIMEOUT_MS,
            power_off_timeout_ms: NCP_FW_MODEM_POWER_OFF_TIMEOUT_MS,
            cloud_connect_timeout_ms: NCP_FW_MODEM_CLOUD_CONNECT_TIMEOUT_MS,
            cloud_disconnect_timeout_ms: NCP_FW_MODEM_CLOUD_DISCONNECT_TIMEOUT_MS,
            cellular_connect_timeout_ms: NCP_FW_MODEM_CELLULAR_CONNECT_TIMEOUT_MS,
            cellular_connect_poll_ms: NCP_FW_MODEM_CELLULAR_CONNECT_POLL_MS,
            cellular_disconnect_timeout_ms: NCP_FW_MODEM_CELLULAR_DISCONNECT_TIMEOUT_MS,
            download_timeout_ms: NCP_FW_MODEM_DOWNLOAD_TIMEOUT_MS,
            install_atok_interval_ms: NCP_FW_MODEM_INSTALL_ATOK_INTERVAL_MS,
            install_start_timeout_ms: NCP_FW_MODEM_INSTALL_START_TIMEOUT_MS,
            install_start_poll_ms: NCP_FW_MODEM_INSTALL_START_POLL_MS,
            install_finish_timeout_ms: NCP_FW_MODEM_INSTALL_FINISH_TIMEOUT_MS,
            qualify_retry_max: NCP_FW_QUALIFY_RETRY_MAX,
            qualify_retry_cooldown_ms: NCP_FW_QUALIFY_RETRY_COOLDOWN_MS,
            publish_start_retry_max: NCP_FW_PUBLISH_START_RETRY_MAX,
            https_setup_retry_max: NCP_FW_HTTPS_SETUP_RETRY_MAX,
            https_setup_retry_cooldown_ms: NCP_FW_HTTPS_SETUP_RETRY_COOLDOWN_MS,
            download_attempts_max: NCP_FW_DOWNLOAD_ATTEMPTS_MAX,
            cloud_connect_exit_retry_max: NCP_FW_CLOUD_CONNECT_EXIT_RETRY_MAX,
            publish_start_cooldown_ms: NCP_FW_PUBLISH_START_COOLDOWN_MS,
            cloud_disconnect_cooldown_ms: NCP_FW_CLOUD_DISCONNECT_COOLDOWN_MS,
        }
    }
}

impl Default for NcpFwUpdatePolicy {
    fn default() -> Self {
        Self::new()
    }
}

/// HTTPS endpoint the modem downloads firmware images from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UpdateServer {
    pub host: &'static str,
    pub port: u16,
    pub security_profile: u8,
}

impl UpdateServer {
    pub const DEFAULT: Self = Self {
        host: "fw-ncp.particle.io",
        port: 443,
        security_profile: 2,
    };
}

impl Default for UpdateServer {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KnownUpgrade {
    pub start_version: u32,
    pub end_version: u32,
    pub filename: &'static str,
    pub md5sum: &'static str,
}

/// Upgrade paths offered when no caller config is supplied. Entries are
/// matched on `start_version` against the version read from the modem.
pub const KNOWN_UPGRADE_PATHS: &[KnownUpgrade] = &[
    KnownUpgrade {
        start_version: 2_060_001,
        end_version: 3_150_001,
        filename: "SARA-R510S-01B-00-ES-0314A0001_SARA-R510S-01B-01-IP-0315A0001.upd",
        md5sum: "09c1a98d03c761bcbea50355f9b2a50f",
    },
];

pub fn find_known_upgrade(start_version: u32) -> Option<&'static KnownUpgrade> {
    KNOWN_UPGRADE_PATHS
        .iter()
        .find(|entry| entry.start_version == start_version)
}

/// Tuning for one managed network interface.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InterfacePolicy {
    pub connect_watchdog_ms: u32,
    pub power_on_timeout_ms: u32,
    pub listen_on_missing_credentials: bool,
    pub listen_timeout_ms: u32,
}

impl InterfacePolicy {
    pub const fn new() -> Self {
        Self {
            connect_watchdog_ms: 5 * MINUTE_MS,
            power_on_timeout_ms: MINUTE_MS,
            listen_on_missing_credentials: true,
            listen_timeout_ms: 5 * MINUTE_MS,
        }
    }
}

impl Default for InterfacePolicy {
    fn default() -> Self {
        Self::new()
    }
}
