use esp_hal::{
    delay::Delay,
    gpio::{Input, Output},
};
use log::{debug, info, warn};

use super::super::{
    config::InterfacePolicy,
    net::InterfaceDriver,
    system::MonotonicClock,
    types::{NetworkInterface, SystemError},
};
use super::device::EspClock;

const POWER_ON_PULSE_MS: u32 = 1_000;
const POWER_OFF_PULSE_MS: u32 = 2_500;
const V_INT_POLL_MS: u32 = 100;

/// Power key and supply monitor of the modem module.
pub struct SaraPins<'d> {
    /// Drives PWR_ON through an open-collector stage; low presses the key.
    pub pwr_on: Output<'d>,
    /// High while the module's internal supply is up.
    pub v_int: Input<'d>,
}

/// SARA-R510 as a cellular [`InterfaceDriver`].
///
/// Power sequencing goes through the GPIO pins. Network attach is observed
/// over the AT channel by the owning device, which feeds the result back
/// through [`set_registered`](Self::set_registered).
pub struct SaraR510<'d> {
    pins: SaraPins<'d>,
    clock: EspClock,
    delay: Delay,
    power_timeout_ms: u32,
    attach_requested: bool,
    registered: bool,
    suppressed: bool,
}

impl<'d> SaraR510<'d> {
    pub fn new(pins: SaraPins<'d>, policy: &InterfacePolicy) -> Self {
        Self {
            pins,
            clock: EspClock,
            delay: Delay::new(),
            power_timeout_ms: policy.power_on_timeout_ms,
            attach_requested: false,
            registered: false,
            suppressed: false,
        }
    }

    pub fn is_powered(&self) -> bool {
        self.pins.v_int.is_high()
    }

    /// True while an attach was requested and the data link is not held.
    pub fn wants_registration(&self) -> bool {
        self.attach_requested && !self.suppressed
    }

    pub fn set_registered(&mut self, registered: bool) {
        if self.registered != registered {
            debug!("sara: registered={}", registered);
        }
        self.registered = registered;
    }

    fn press_key(&mut self, hold_ms: u32) {
        self.pins.pwr_on.set_low();
        self.delay.delay_millis(hold_ms);
        self.pins.pwr_on.set_high();
    }

    fn wait_supply(&mut self, powered: bool) -> Result<(), SystemError> {
        let deadline = self
            .clock
            .now_ms()
            .saturating_add(u64::from(self.power_timeout_ms));
        while self.is_powered() != powered {
            if self.clock.now_ms() >= deadline {
                return Err(SystemError::Timeout);
            }
            self.delay.delay_millis(V_INT_POLL_MS);
        }
        Ok(())
    }
}

impl MonotonicClock for SaraR510<'_> {
    fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }
}

impl InterfaceDriver for SaraR510<'_> {
    fn technology(&self) -> NetworkInterface {
        NetworkInterface::Cellular
    }

    fn power_on(&mut self) -> Result<(), SystemError> {
        if self.is_powered() {
            return Ok(());
        }
        info!("sara: power on");
        self.press_key(POWER_ON_PULSE_MS);
        self.wait_supply(true).inspect_err(|_| {
            warn!("sara: V_INT stayed low after power on");
        })
    }

    fn power_off(&mut self) -> Result<(), SystemError> {
        self.attach_requested = false;
        self.registered = false;
        if !self.is_powered() {
            return Ok(());
        }
        info!("sara: power off");
        self.press_key(POWER_OFF_PULSE_MS);
        self.wait_supply(false).inspect_err(|_| {
            warn!("sara: V_INT stayed high after power off");
        })
    }

    fn begin_connect(&mut self) -> Result<(), SystemError> {
        if !self.is_powered() {
            return Err(SystemError::InvalidState);
        }
        self.attach_requested = true;
        Ok(())
    }

    fn disconnect(&mut self) -> Result<(), SystemError> {
        self.attach_requested = false;
        self.registered = false;
        Ok(())
    }

    fn is_ready(&self) -> bool {
        self.wants_registration() && self.registered
    }

    // SIM based; the operator supplies the APN.
    fn has_credentials(&self) -> bool {
        true
    }

    fn set_data_suppressed(&mut self, suppressed: bool) {
        self.suppressed = suppressed;
        if suppressed {
            self.registered = false;
        }
    }
}
