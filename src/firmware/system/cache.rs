use embedded_storage::Storage;

use super::super::{
    config::{
        SYSTEM_CACHE_HEADER_LEN, SYSTEM_CACHE_MAGIC, SYSTEM_CACHE_SLOT_COUNT,
        SYSTEM_CACHE_SLOT_LEN,
    },
    types::SystemError,
};
use super::{CacheKey, SystemCache};

const PAYLOAD_MAX: usize = SYSTEM_CACHE_SLOT_LEN - SYSTEM_CACHE_HEADER_LEN - 1;

/// Key-value cache with one fixed slot per key.
///
/// Slot layout: `[magic u32][key u8][reserved u8][len u16][payload][checksum8]`,
/// little-endian. An erased slot reads as `NotFound`.
pub struct FlashSystemCache<S> {
    storage: S,
    offset: u32,
}

impl<S> FlashSystemCache<S>
where
    S: Storage,
{
    pub fn new(storage: S, offset: u32) -> Result<Self, SystemError> {
        let needed = offset as usize + SYSTEM_CACHE_SLOT_COUNT * SYSTEM_CACHE_SLOT_LEN;
        if needed > storage.capacity() {
            return Err(SystemError::LimitExceeded);
        }
        Ok(Self { storage, offset })
    }

    /// Places the cache in the last `SYSTEM_CACHE_SLOT_COUNT` slots of the device.
    pub fn at_end(storage: S) -> Result<Self, SystemError> {
        let span = SYSTEM_CACHE_SLOT_COUNT * SYSTEM_CACHE_SLOT_LEN;
        let offset = storage
            .capacity()
            .checked_sub(span)
            .ok_or(SystemError::LimitExceeded)?;
        Self::new(storage, offset as u32)
    }

    pub fn into_inner(self) -> S {
        self.storage
    }

    fn slot_offset(&self, key: CacheKey) -> u32 {
        self.offset + (key.slot() * SYSTEM_CACHE_SLOT_LEN) as u32
    }

    fn load_slot(&mut self, key: CacheKey) -> Result<[u8; SYSTEM_CACHE_SLOT_LEN], SystemError> {
        let mut slot = [0u8; SYSTEM_CACHE_SLOT_LEN];
        let offset = self.slot_offset(key);
        self.storage
            .read(offset, &mut slot)
            .map_err(|_| SystemError::Io)?;
        if slot[..SYSTEM_CACHE_HEADER_LEN].iter().all(|&byte| byte == 0xFF) {
            return Err(SystemError::NotFound);
        }
        if u32::from_le_bytes([slot[0], slot[1], slot[2], slot[3]]) != SYSTEM_CACHE_MAGIC
            || slot[4] != key.as_u8()
        {
            return Err(SystemError::NotFound);
        }
        let len = u16::from_le_bytes([slot[6], slot[7]]) as usize;
        if len > PAYLOAD_MAX {
            return Err(SystemError::BadData);
        }
        let end = SYSTEM_CACHE_HEADER_LEN + len;
        if slot[end] != checksum8(&slot[..end]) {
            return Err(SystemError::BadData);
        }
        Ok(slot)
    }
}

impl<S> SystemCache for FlashSystemCache<S>
where
    S: Storage,
{
    fn cache_get(&mut self, key: CacheKey, buf: &mut [u8]) -> Result<usize, SystemError> {
        let slot = self.load_slot(key)?;
        let len = u16::from_le_bytes([slot[6], slot[7]]) as usize;
        let target = buf.get_mut(..len).ok_or(SystemError::LimitExceeded)?;
        target.copy_from_slice(&slot[SYSTEM_CACHE_HEADER_LEN..SYSTEM_CACHE_HEADER_LEN + len]);
        Ok(len)
    }

    fn cache_set(&mut self, key: CacheKey, data: &[u8]) -> Result<(), SystemError> {
        if data.len() > PAYLOAD_MAX {
            return Err(SystemError::LimitExceeded);
        }
        let end = SYSTEM_CACHE_HEADER_LEN + data.len();
        let mut record = [0xFFu8; SYSTEM_CACHE_SLOT_LEN];
        record[0..4].copy_from_slice(&SYSTEM_CACHE_MAGIC.to_le_bytes());
        record[4] = key.as_u8();
        record[5] = 0;
        record[6..8].copy_from_slice(&(data.len() as u16).to_le_bytes());
        record[SYSTEM_CACHE_HEADER_LEN..end].copy_from_slice(data);
        record[end] = checksum8(&record[..end]);
        let offset = self.slot_offset(key);
        self.storage
            .write(offset, &record[..=end])
            .map_err(|_| SystemError::Io)
    }

    fn cache_delete(&mut self, key: CacheKey) -> Result<(), SystemError> {
        let offset = self.slot_offset(key);
        self.storage
            .write(offset, &[0xFF; SYSTEM_CACHE_HEADER_LEN])
            .map_err(|_| SystemError::Io)
    }
}

pub(crate) fn checksum8(bytes: &[u8]) -> u8 {
    let mut acc = 0x5Au8;
    for &byte in bytes {
        acc ^= byte.rotate_left(1);
    }
    acc
}
