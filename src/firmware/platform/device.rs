use esp_hal::delay::Delay;
use esp_storage::FlashStorage;
use log::{info, warn};

use super::super::{
    at::{AtClient, UrcMailbox},
    config::{InterfacePolicy, NCP_FW_UPDATE_PDP_CID, NCP_FW_UPDATE_PDP_PROFILE},
    ncp_update,
    net::ManagedNetworkInterface,
    system::{
        AtResult, AtTransport, CacheKey, FlashSystemCache, MonotonicClock, NetworkControl,
        SystemCache, SystemControl,
    },
    types::{DisconnectReason, NcpIdentifier, NetworkInterface, PowerState, SystemError},
};
use super::{
    cloud::LinkSink,
    sara::{SaraPins, SaraR510},
    uart::UartPort,
};

const BOOT_MODE_NORMAL: u8 = 0;
const BOOT_MODE_SAFE: u8 = 1;
const REGISTRATION_POLL_MS: u64 = 5_000;

#[derive(Clone, Copy, Debug, Default)]
pub struct EspClock;

impl MonotonicClock for EspClock {
    fn now_ms(&self) -> u64 {
        embassy_time::Instant::now().as_millis()
    }
}

type Cellular<'d> = ManagedNetworkInterface<SaraR510<'d>, LinkSink>;

/// The board as one [`Platform`](super::super::system::Platform): AT channel
/// on a UART, the SARA-R510 as the cellular interface, the system cache in
/// the last flash sector, and boot mode carried across resets in that cache.
pub struct EspDevice<'d> {
    at: AtClient<'d, UartPort<'d>, EspClock>,
    cellular: Cellular<'d>,
    cache: FlashSystemCache<FlashStorage<'d>>,
    delay: Delay,
    safe_mode: bool,
    updates_enabled: bool,
    last_registration_poll: Option<u64>,
}

impl<'d> EspDevice<'d> {
    pub fn new(
        uart: UartPort<'d>,
        urc: &'d UrcMailbox,
        pins: SaraPins<'d>,
        flash: esp_hal::peripherals::FLASH<'d>,
        updates_enabled: bool,
    ) -> Result<Self, SystemError> {
        let flash = FlashStorage::new(flash).multicore_auto_park();
        let mut cache = FlashSystemCache::at_end(flash)?;
        let safe_mode = read_boot_mode(&mut cache) == BOOT_MODE_SAFE;
        let policy = InterfacePolicy::default();
        info!(
            "device: boot safe_mode={} updates_enabled={}",
            safe_mode, updates_enabled
        );
        Ok(Self {
            at: AtClient::new(uart, EspClock, urc),
            cellular: ManagedNetworkInterface::new(SaraR510::new(pins, &policy), LinkSink, policy),
            cache,
            delay: Delay::new(),
            safe_mode,
            updates_enabled,
            last_registration_poll: None,
        })
    }

    pub fn cellular(&self) -> &Cellular<'d> {
        &self.cellular
    }

    pub fn cellular_mut(&mut self) -> &mut Cellular<'d> {
        &mut self.cellular
    }

    /// One supervision tick for the cellular link: refreshes registration
    /// over AT while an attach is wanted, then runs the interface lifecycle.
    pub fn supervise(&mut self) {
        let now = self.now_ms();
        let due = self
            .last_registration_poll
            .is_none_or(|last| now.saturating_sub(last) >= REGISTRATION_POLL_MS);
        if self.cellular.driver().wants_registration() && due {
            self.last_registration_poll = Some(now);
            let attached = self.refresh_attach();
            self.cellular.driver_mut().set_registered(attached);
        }
        self.cellular.process();
    }

    fn refresh_attach(&mut self) -> bool {
        if !ncp_update::is_registered(&mut self.at) {
            return false;
        }
        if ncp_update::pdp_active(&mut self.at, NCP_FW_UPDATE_PDP_PROFILE) {
            return true;
        }
        let result =
            ncp_update::activate_pdp(&mut self.at, NCP_FW_UPDATE_PDP_PROFILE, NCP_FW_UPDATE_PDP_CID);
        if !result.is_ok() {
            warn!("device: pdp activation failed result={}", result.as_str());
        }
        result.is_ok()
    }

    fn reset_with_mode(&mut self, mode: u8) {
        if let Err(err) = self.cache.cache_set(CacheKey::BootMode, &[mode]) {
            warn!("device: boot mode not stored err={}", err.as_str());
        }
        info!("device: software reset boot_mode={}", mode);
        esp_hal::system::software_reset();
    }
}

fn read_boot_mode(cache: &mut FlashSystemCache<FlashStorage<'_>>) -> u8 {
    let mut buf = [0u8; 1];
    match cache.cache_get(CacheKey::BootMode, &mut buf) {
        Ok(1) => buf[0],
        _ => BOOT_MODE_NORMAL,
    }
}

impl AtTransport for EspDevice<'_> {
    fn command(&mut self, cmd: &str, timeout_ms: u32, on_line: &mut dyn FnMut(&str)) -> AtResult {
        self.at.command(cmd, timeout_ms, on_line)
    }

    fn poll_urcs(&mut self) {
        self.at.poll_urcs();
    }
}

impl MonotonicClock for EspDevice<'_> {
    fn now_ms(&self) -> u64 {
        self.at.clock().now_ms()
    }
}

impl SystemControl for EspDevice<'_> {
    fn delay_ms(&mut self, ms: u32) {
        self.delay.delay_millis(ms);
    }

    fn ncp_identifier(&self) -> NcpIdentifier {
        NcpIdentifier::SaraR510
    }

    fn updates_enabled(&self) -> bool {
        self.updates_enabled
    }

    fn is_safe_mode(&self) -> bool {
        self.safe_mode
    }

    fn reset_into_safe_mode(&mut self) {
        self.reset_with_mode(BOOT_MODE_SAFE);
    }

    fn reset_into_normal_mode(&mut self) {
        self.reset_with_mode(BOOT_MODE_NORMAL);
    }
}

impl SystemCache for EspDevice<'_> {
    fn cache_get(&mut self, key: CacheKey, buf: &mut [u8]) -> Result<usize, SystemError> {
        self.cache.cache_get(key, buf)
    }

    fn cache_set(&mut self, key: CacheKey, data: &[u8]) -> Result<(), SystemError> {
        self.cache.cache_set(key, data)
    }

    fn cache_delete(&mut self, key: CacheKey) -> Result<(), SystemError> {
        self.cache.cache_delete(key)
    }
}

impl NetworkControl for EspDevice<'_> {
    fn network_on(&mut self, iface: NetworkInterface) -> Result<(), SystemError> {
        self.cellular.network_on(iface)
    }

    fn network_off(&mut self, iface: NetworkInterface) -> Result<(), SystemError> {
        self.cellular.network_off(iface)
    }

    fn network_connect(&mut self, iface: NetworkInterface) -> Result<(), SystemError> {
        self.cellular.network_connect(iface)
    }

    fn network_disconnect(
        &mut self,
        iface: NetworkInterface,
        reason: DisconnectReason,
    ) -> Result<(), SystemError> {
        self.cellular.network_disconnect(iface, reason)
    }

    fn network_ready(&self, iface: NetworkInterface) -> bool {
        self.cellular.network_ready(iface)
    }

    fn network_power_state(&self, iface: NetworkInterface) -> PowerState {
        self.cellular.network_power_state(iface)
    }

    fn set_ncp_update_mode(&mut self, iface: NetworkInterface, enabled: bool) {
        self.cellular.set_ncp_update_mode(iface, enabled);
    }
}
