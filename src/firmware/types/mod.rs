mod error;
mod ncp;
mod network;

pub use error::SystemError;
pub use ncp::{
    CloudFeature, NcpFwUpdateConfig, NcpFwUpdateState, NcpFwUpdateStatus, NcpIdentifier,
    PublishVisibility, UpdateAvailable, NCP_FW_FILENAME_MAX, NCP_FW_MD5_LEN,
};
pub use network::{
    DisconnectReason, NetworkDiagState, NetworkInterface, NetworkNotification, PowerState,
};
