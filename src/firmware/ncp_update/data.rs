use heapless::String;

use super::super::{
    config::{NCP_FW_UPDATE_DATA_MAGIC, NCP_FW_UPDATE_DATA_VERSION},
    system::checksum8,
    types::{
        NcpFwUpdateConfig, NcpFwUpdateState, NcpFwUpdateStatus, UpdateAvailable,
        NCP_FW_FILENAME_MAX, NCP_FW_MD5_LEN,
    },
};

const FILENAME_LEN_AT: usize = 34;
const FILENAME_AT: usize = FILENAME_LEN_AT + 1;
const MD5_LEN_AT: usize = FILENAME_AT + NCP_FW_FILENAME_MAX;
const MD5_AT: usize = MD5_LEN_AT + 1;
const CHECKSUM_AT: usize = MD5_AT + NCP_FW_MD5_LEN;

/// Serialized length of [`NcpFwUpdateData`], also stored in its `size` field.
pub const NCP_FW_UPDATE_DATA_LEN: usize = CHECKSUM_AT + 1;

/// Checkpoint of an update run, persisted under `CacheKey::NcpFwUpdateData`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NcpFwUpdateData {
    pub state: NcpFwUpdateState,
    pub status: NcpFwUpdateStatus,
    /// Version read from the modem while qualifying.
    pub firmware_version: u32,
    /// Version captured right before the install command.
    pub starting_firmware_version: u32,
    pub update_version: u32,
    pub update_available: UpdateAvailable,
    pub is_user_config: bool,
    pub user_config: NcpFwUpdateConfig,
}

impl Default for NcpFwUpdateData {
    fn default() -> Self {
        Self {
            state: NcpFwUpdateState::Idle,
            status: NcpFwUpdateStatus::Idle,
            firmware_version: 0,
            starting_firmware_version: 0,
            update_version: 0,
            update_available: UpdateAvailable::Unknown,
            is_user_config: false,
            user_config: NcpFwUpdateConfig::default(),
        }
    }
}

impl NcpFwUpdateData {
    /// Layout, little-endian:
    /// `[magic u32][size u16][version u8][state u8][status i32][fw u32]`
    /// `[starting fw u32][update fw u32][available u8][user cfg u8]`
    /// `[cfg start u32][cfg end u32][name len u8][name 255][md5 len u8][md5 32][checksum8]`
    pub fn to_record(&self) -> [u8; NCP_FW_UPDATE_DATA_LEN] {
        let mut record = [0u8; NCP_FW_UPDATE_DATA_LEN];
        record[0..4].copy_from_slice(&NCP_FW_UPDATE_DATA_MAGIC.to_le_bytes());
        record[4..6].copy_from_slice(&(NCP_FW_UPDATE_DATA_LEN as u16).to_le_bytes());
        record[6] = NCP_FW_UPDATE_DATA_VERSION;
        record[7] = self.state.as_u8();
        record[8..12].copy_from_slice(&self.status.as_i32().to_le_bytes());
        record[12..16].copy_from_slice(&self.firmware_version.to_le_bytes());
        record[16..20].copy_from_slice(&self.starting_firmware_version.to_le_bytes());
        record[20..24].copy_from_slice(&self.update_version.to_le_bytes());
        record[24] = self.update_available.as_u8();
        record[25] = u8::from(self.is_user_config);
        record[26..30].copy_from_slice(&self.user_config.start_version.to_le_bytes());
        record[30..34].copy_from_slice(&self.user_config.end_version.to_le_bytes());

        let filename = self.user_config.filename.as_bytes();
        record[FILENAME_LEN_AT] = filename.len() as u8;
        record[FILENAME_AT..FILENAME_AT + filename.len()].copy_from_slice(filename);
        let md5 = self.user_config.md5sum.as_bytes();
        record[MD5_LEN_AT] = md5.len() as u8;
        record[MD5_AT..MD5_AT + md5.len()].copy_from_slice(md5);

        record[CHECKSUM_AT] = checksum8(&record[..CHECKSUM_AT]);
        record
    }

    /// Rejects anything whose length, `size`, magic, format version or
    /// checksum does not match the current layout.
    pub fn from_record(record: &[u8]) -> Option<Self> {
        if record.len() != NCP_FW_UPDATE_DATA_LEN {
            return None;
        }
        if read_u32(record, 0) != NCP_FW_UPDATE_DATA_MAGIC
            || u16::from_le_bytes([record[4], record[5]]) as usize != NCP_FW_UPDATE_DATA_LEN
            || record[6] != NCP_FW_UPDATE_DATA_VERSION
            || record[CHECKSUM_AT] != checksum8(&record[..CHECKSUM_AT])
        {
            return None;
        }

        let mut user_config = NcpFwUpdateConfig {
            start_version: read_u32(record, 26),
            end_version: read_u32(record, 30),
            filename: String::new(),
            md5sum: String::new(),
        };
        let filename_len = usize::from(record[FILENAME_LEN_AT]);
        let md5_len = usize::from(record[MD5_LEN_AT]);
        if filename_len > NCP_FW_FILENAME_MAX || md5_len > NCP_FW_MD5_LEN {
            return None;
        }
        let filename =
            core::str::from_utf8(&record[FILENAME_AT..FILENAME_AT + filename_len]).ok()?;
        user_config.filename.push_str(filename).ok()?;
        let md5 = core::str::from_utf8(&record[MD5_AT..MD5_AT + md5_len]).ok()?;
        user_config.md5sum.push_str(md5).ok()?;

        Some(Self {
            state: NcpFwUpdateState::from_u8(record[7])?,
            status: NcpFwUpdateStatus::from_i32(read_u32(record, 8) as i32)?,
            firmware_version: read_u32(record, 12),
            starting_firmware_version: read_u32(record, 16),
            update_version: read_u32(record, 20),
            update_available: UpdateAvailable::from_u8(record[24])?,
            is_user_config: record[25] != 0,
            user_config,
        })
    }
}

fn read_u32(record: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([record[at], record[at + 1], record[at + 2], record[at + 3]])
}
