use super::*;
use crate::firmware::{
    config::{SYSTEM_CACHE_HEADER_LEN, SYSTEM_CACHE_SLOT_COUNT, SYSTEM_CACHE_SLOT_LEN},
    testing::RamFlash,
};

const FLASH_LEN: usize = 4 * SYSTEM_CACHE_SLOT_COUNT * SYSTEM_CACHE_SLOT_LEN;

fn cache() -> (RamFlash, FlashSystemCache<RamFlash>) {
    let flash = RamFlash::new(FLASH_LEN);
    let cache = FlashSystemCache::at_end(flash.clone()).expect("cache fits");
    (flash, cache)
}

#[test]
fn erased_slot_reads_as_not_found() {
    let (_, mut cache) = cache();
    let mut buf = [0u8; 16];
    assert_eq!(
        cache.cache_get(CacheKey::NcpFwUpdateData, &mut buf),
        Err(SystemError::NotFound)
    );
}

#[test]
fn set_then_get_returns_same_bytes_per_key() {
    let (_, mut cache) = cache();
    cache
        .cache_set(CacheKey::NcpFwUpdateData, b"update-record")
        .expect("set");
    cache.cache_set(CacheKey::BootMode, &[1]).expect("set");

    let mut buf = [0u8; 32];
    let len = cache
        .cache_get(CacheKey::NcpFwUpdateData, &mut buf)
        .expect("get");
    assert_eq!(&buf[..len], b"update-record");
    let len = cache.cache_get(CacheKey::BootMode, &mut buf).expect("get");
    assert_eq!(&buf[..len], &[1]);
}

#[test]
fn values_survive_a_new_driver_on_the_same_flash() {
    let (flash, mut cache) = cache();
    cache.cache_set(CacheKey::BootMode, &[7, 8, 9]).expect("set");
    drop(cache);

    let mut rebooted = FlashSystemCache::at_end(flash).expect("cache fits");
    let mut buf = [0u8; 8];
    let len = rebooted.cache_get(CacheKey::BootMode, &mut buf).expect("get");
    assert_eq!(&buf[..len], &[7, 8, 9]);
}

#[test]
fn corrupted_payload_fails_checksum() {
    let (flash, mut cache) = cache();
    cache.cache_set(CacheKey::BootMode, &[1, 2, 3]).expect("set");
    let slot = FLASH_LEN - SYSTEM_CACHE_SLOT_COUNT * SYSTEM_CACHE_SLOT_LEN
        + CacheKey::BootMode.slot() * SYSTEM_CACHE_SLOT_LEN;
    flash.poke(slot + SYSTEM_CACHE_HEADER_LEN, &[0x55]);

    let mut buf = [0u8; 8];
    assert_eq!(
        cache.cache_get(CacheKey::BootMode, &mut buf),
        Err(SystemError::BadData)
    );
}

#[test]
fn delete_and_capacity_limits() {
    let (_, mut cache) = cache();
    cache.cache_set(CacheKey::BootMode, &[1, 2, 3]).expect("set");

    let mut small = [0u8; 2];
    assert_eq!(
        cache.cache_get(CacheKey::BootMode, &mut small),
        Err(SystemError::LimitExceeded)
    );

    cache.cache_delete(CacheKey::BootMode).expect("delete");
    let mut buf = [0u8; 8];
    assert_eq!(
        cache.cache_get(CacheKey::BootMode, &mut buf),
        Err(SystemError::NotFound)
    );

    let oversized = [0u8; SYSTEM_CACHE_SLOT_LEN];
    assert_eq!(
        cache.cache_set(CacheKey::BootMode, &oversized),
        Err(SystemError::LimitExceeded)
    );
}

#[test]
fn cache_rejects_storage_too_small() {
    let flash = RamFlash::new(SYSTEM_CACHE_SLOT_LEN);
    assert!(FlashSystemCache::at_end(flash).is_err());
}

#[test]
fn checksum_matches_record_convention() {
    assert_eq!(checksum8(&[]), 0x5A);
    assert_eq!(checksum8(&[0x01]), 0x5A ^ 0x02);
}
