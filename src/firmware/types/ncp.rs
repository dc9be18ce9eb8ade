use heapless::String;

use super::SystemError;

pub const NCP_FW_FILENAME_MAX: usize = 255;
pub const NCP_FW_MD5_LEN: usize = 32;

/// Resumption point of the modem firmware update flow. Persisted as `u8`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NcpFwUpdateState {
    Idle,
    QualifyFlags,
    QualifyModemOn,
    QualifyRetry,
    SetupCloudConnect,
    SetupCloudConnecting,
    SetupCloudConnected,
    DownloadCloudDisconnect,
    DownloadCellDisconnecting,
    DownloadCellConnecting,
    DownloadHttpsSetup,
    DownloadReady,
    InstallCellDisconnecting,
    InstallStarting,
    InstallWaiting,
    FinishedPowerOff,
    FinishedPoweringOff,
    FinishedCloudConnecting,
    FinishedCloudConnected,
    FinishedIdle,
}

impl NcpFwUpdateState {
    pub const fn as_u8(self) -> u8 {
        match self {
            Self::Idle => 0,
            Self::QualifyFlags => 1,
            Self::QualifyModemOn => 2,
            Self::QualifyRetry => 3,
            Self::SetupCloudConnect => 4,
            Self::SetupCloudConnecting => 5,
            Self::SetupCloudConnected => 6,
            Self::DownloadCloudDisconnect => 7,
            Self::DownloadCellDisconnecting => 8,
            Self::DownloadCellConnecting => 9,
            Self::DownloadHttpsSetup => 10,
            Self::DownloadReady => 11,
            Self::InstallCellDisconnecting => 12,
            Self::InstallStarting => 13,
            Self::InstallWaiting => 14,
            Self::FinishedPowerOff => 15,
            Self::FinishedPoweringOff => 16,
            Self::FinishedCloudConnecting => 17,
            Self::FinishedCloudConnected => 18,
            Self::FinishedIdle => 19,
        }
    }

    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Idle),
            1 => Some(Self::QualifyFlags),
            2 => Some(Self::QualifyModemOn),
            3 => Some(Self::QualifyRetry),
            4 => Some(Self::SetupCloudConnect),
            5 => Some(Self::SetupCloudConnecting),
            6 => Some(Self::SetupCloudConnected),
            7 => Some(Self::DownloadCloudDisconnect),
            8 => Some(Self::DownloadCellDisconnecting),
            9 => Some(Self::DownloadCellConnecting),
            10 => Some(Self::DownloadHttpsSetup),
            11 => Some(Self::DownloadReady),
            12 => Some(Self::InstallCellDisconnecting),
            13 => Some(Self::InstallStarting),
            14 => Some(Self::InstallWaiting),
            15 => Some(Self::FinishedPowerOff),
            16 => Some(Self::FinishedPoweringOff),
            17 => Some(Self::FinishedCloudConnecting),
            18 => Some(Self::FinishedCloudConnected),
            19 => Some(Self::FinishedIdle),
            _ => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::QualifyFlags => "qualify_flags",
            Self::QualifyModemOn => "qualify_modem_on",
            Self::QualifyRetry => "qualify_retry",
            Self::SetupCloudConnect => "setup_cloud_connect",
            Self::SetupCloudConnecting => "setup_cloud_connecting",
            Self::SetupCloudConnected => "setup_cloud_connected",
            Self::DownloadCloudDisconnect => "download_cloud_disconnect",
            Self::DownloadCellDisconnecting => "download_cell_disconnecting",
            Self::DownloadCellConnecting => "download_cell_connecting",
            Self::DownloadHttpsSetup => "download_https_setup",
            Self::DownloadReady => "download_ready",
            Self::InstallCellDisconnecting => "install_cell_disconnecting",
            Self::InstallStarting => "install_starting",
            Self::InstallWaiting => "install_waiting",
            Self::FinishedPowerOff => "finished_power_off",
            Self::FinishedPoweringOff => "finished_powering_off",
            Self::FinishedCloudConnecting => "finished_cloud_connecting",
            Self::FinishedCloudConnected => "finished_cloud_connected",
            Self::FinishedIdle => "finished_idle",
        }
    }
}

/// Outward-facing result of an update run. Persisted, published and
/// reported through diagnostics as `i32`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NcpFwUpdateStatus {
    Idle,
    Downloading,
    Updating,
    Success,
    /// Diagnostics only: no run has finished since the record was created.
    None,
    FailedQualifyFlags,
    FailedCloudConnectOnEntryTimeout,
    FailedPublishStart,
    FailedSetupCellularDisconnectTimeout,
    FailedCellularConnectTimeout,
    FailedHttpsSetup,
    FailedDownloadRetryMax,
    FailedInstallCellularDisconnectTimeout,
    FailedStartInstallTimeout,
    FailedInstallAtError,
    FailedSameVersion,
    FailedInstallTimeout,
    FailedPowerOffTimeout,
    FailedCloudConnectOnExitTimeout,
    FailedPublishResult,
}

impl NcpFwUpdateStatus {
    pub const fn as_i32(self) -> i32 {
        match self {
            Self::Idle => 0,
            Self::Downloading => 1,
            Self::Updating => 2,
            Self::Success => 3,
            Self::None => -1,
            Self::FailedQualifyFlags => -2,
            Self::FailedCloudConnectOnEntryTimeout => -3,
            Self::FailedPublishStart => -4,
            Self::FailedSetupCellularDisconnectTimeout => -5,
            Self::FailedCellularConnectTimeout => -6,
            Self::FailedHttpsSetup => -7,
            Self::FailedDownloadRetryMax => -8,
            Self::FailedInstallCellularDisconnectTimeout => -9,
            Self::FailedStartInstallTimeout => -10,
            Self::FailedInstallAtError => -11,
            Self::FailedSameVersion => -12,
            Self::FailedInstallTimeout => -13,
            Self::FailedPowerOffTimeout => -14,
            Self::FailedCloudConnectOnExitTimeout => -15,
            Self::FailedPublishResult => -16,
        }
    }

    pub const fn from_i32(value: i32) -> Option<Self> {
        match value {
            0 => Some(Self::Idle),
            1 => Some(Self::Downloading),
            2 => Some(Self::Updating),
            3 => Some(Self::Success),
            -1 => Some(Self::None),
            -2 => Some(Self::FailedQualifyFlags),
            -3 => Some(Self::FailedCloudConnectOnEntryTimeout),
            -4 => Some(Self::FailedPublishStart),
            -5 => Some(Self::FailedSetupCellularDisconnectTimeout),
            -6 => Some(Self::FailedCellularConnectTimeout),
            -7 => Some(Self::FailedHttpsSetup),
            -8 => Some(Self::FailedDownloadRetryMax),
            -9 => Some(Self::FailedInstallCellularDisconnectTimeout),
            -10 => Some(Self::FailedStartInstallTimeout),
            -11 => Some(Self::FailedInstallAtError),
            -12 => Some(Self::FailedSameVersion),
            -13 => Some(Self::FailedInstallTimeout),
            -14 => Some(Self::FailedPowerOffTimeout),
            -15 => Some(Self::FailedCloudConnectOnExitTimeout),
            -16 => Some(Self::FailedPublishResult),
            _ => None,
        }
    }

    pub const fn is_failure(self) -> bool {
        self.as_i32() <= -2
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Downloading => "downloading",
            Self::Updating => "updating",
            Self::Success => "success",
            Self::None => "none",
            Self::FailedQualifyFlags => "failed_qualify_flags",
            Self::FailedCloudConnectOnEntryTimeout => "failed_cloud_connect_on_entry_timeout",
            Self::FailedPublishStart => "failed_publish_start",
            Self::FailedSetupCellularDisconnectTimeout => {
                "failed_setup_cellular_disconnect_timeout"
            }
            Self::FailedCellularConnectTimeout => "failed_cellular_connect_timeout",
            Self::FailedHttpsSetup => "failed_https_setup",
            Self::FailedDownloadRetryMax => "failed_download_retry_max",
            Self::FailedInstallCellularDisconnectTimeout => {
                "failed_install_cellular_disconnect_timeout"
            }
            Self::FailedStartInstallTimeout => "failed_start_install_timeout",
            Self::FailedInstallAtError => "failed_install_at_error",
            Self::FailedSameVersion => "failed_same_version",
            Self::FailedInstallTimeout => "failed_install_timeout",
            Self::FailedPowerOffTimeout => "failed_power_off_timeout",
            Self::FailedCloudConnectOnExitTimeout => "failed_cloud_connect_on_exit_timeout",
            Self::FailedPublishResult => "failed_publish_result",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpdateAvailable {
    Unknown,
    NotAvailable,
    Available,
}

impl UpdateAvailable {
    pub const fn as_u8(self) -> u8 {
        match self {
            Self::Unknown => 0,
            Self::NotAvailable => 1,
            Self::Available => 2,
        }
    }

    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Unknown),
            1 => Some(Self::NotAvailable),
            2 => Some(Self::Available),
            _ => None,
        }
    }
}

/// One upgrade path: modem firmware `start_version` can be moved to
/// `end_version` by downloading `filename`, whose digest is `md5sum`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NcpFwUpdateConfig {
    pub start_version: u32,
    pub end_version: u32,
    pub filename: String<NCP_FW_FILENAME_MAX>,
    pub md5sum: String<NCP_FW_MD5_LEN>,
}

impl NcpFwUpdateConfig {
    pub fn new(
        start_version: u32,
        end_version: u32,
        filename: &str,
        md5sum: &str,
    ) -> Result<Self, SystemError> {
        let mut config = Self {
            start_version,
            end_version,
            ..Self::default()
        };
        config
            .filename
            .push_str(filename)
            .map_err(|_| SystemError::InvalidArgument)?;
        config
            .md5sum
            .push_str(md5sum)
            .map_err(|_| SystemError::InvalidArgument)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), SystemError> {
        if self.filename.is_empty() || self.filename.contains('"') {
            return Err(SystemError::InvalidArgument);
        }
        if self.md5sum.len() != NCP_FW_MD5_LEN
            || !self.md5sum.bytes().all(|byte| byte.is_ascii_hexdigit())
        {
            return Err(SystemError::InvalidArgument);
        }
        if self.end_version == 0 || self.start_version == self.end_version {
            return Err(SystemError::InvalidArgument);
        }
        Ok(())
    }

    pub fn md5_matches(&self, md5sum: &str) -> bool {
        self.md5sum.eq_ignore_ascii_case(md5sum)
    }
}

/// Modem families the platform may carry as its network co-processor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NcpIdentifier {
    Unknown,
    SaraG350,
    SaraU201,
    SaraR410,
    SaraR510,
    Esp32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CloudFeature {
    NcpFwUpdates,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PublishVisibility {
    Public,
    Private,
}
