//! Over-the-air firmware update of the cellular modem.

mod cooldown;
mod data;
mod engine;
mod modem;
mod version;

pub use data::{NcpFwUpdateData, NCP_FW_UPDATE_DATA_LEN};
pub use engine::NcpFwUpdate;
pub use version::parse_firmware_version;
#[cfg(feature = "esp32")]
pub(crate) use modem::{activate_pdp, is_registered, pdp_active};
