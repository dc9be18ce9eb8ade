use log::{debug, info, warn};

use super::super::{
    config::InterfacePolicy,
    system::{MonotonicClock, NetworkControl},
    telemetry,
    types::{
        DisconnectReason, NetworkDiagState, NetworkInterface, NetworkNotification, PowerState,
        SystemError,
    },
};
use super::{
    listening::{ListeningMode, ListeningTransition},
    watchdog::ConnectionWatchdog,
};

/// One connection technology as seen by [`ManagedNetworkInterface`].
pub trait InterfaceDriver: MonotonicClock {
    fn technology(&self) -> NetworkInterface;
    /// Returns once the radio accepts commands.
    fn power_on(&mut self) -> Result<(), SystemError>;
    fn power_off(&mut self) -> Result<(), SystemError>;
    /// Starts attaching; completion is observed through `is_ready`.
    fn begin_connect(&mut self) -> Result<(), SystemError>;
    fn disconnect(&mut self) -> Result<(), SystemError>;
    fn is_ready(&self) -> bool;
    fn has_credentials(&self) -> bool;
    /// Keeps the radio powered but the data link down while the modem is
    /// owned by the firmware updater.
    fn set_data_suppressed(&mut self, suppressed: bool);
}

pub trait NotificationSink {
    fn notify(&mut self, iface: NetworkInterface, notification: NetworkNotification);

    /// Lets the cloud session close cleanly before the link drops.
    fn request_cloud_disconnect(&mut self) {}
}

/// On/off/connect/listen lifecycle of one interface, with a connection
/// watchdog that restarts attempts stuck short of ready.
pub struct ManagedNetworkInterface<D, N> {
    driver: D,
    sink: N,
    policy: InterfacePolicy,
    watchdog: ConnectionWatchdog,
    listening: ListeningMode,
    diag: NetworkDiagState,
    powered: bool,
    initialized: bool,
    connecting: bool,
    connected: bool,
    update_mode: bool,
}

impl<D, N> ManagedNetworkInterface<D, N>
where
    D: InterfaceDriver,
    N: NotificationSink,
{
    pub fn new(driver: D, sink: N, policy: InterfacePolicy) -> Self {
        let interface = Self {
            driver,
            sink,
            policy,
            watchdog: ConnectionWatchdog::default(),
            listening: ListeningMode::new(policy.listen_timeout_ms),
            diag: NetworkDiagState::Disconnected,
            powered: false,
            initialized: false,
            connecting: false,
            connected: false,
            update_mode: false,
        };
        telemetry::set_network_diag_state(interface.technology(), interface.diag);
        interface
    }

    pub fn technology(&self) -> NetworkInterface {
        self.driver.technology()
    }

    pub fn on(&mut self) -> Result<(), SystemError> {
        if self.powered {
            return Ok(());
        }
        self.driver.power_on()?;
        self.powered = true;
        self.initialized = true;
        info!("net: {} powered on", self.technology().as_str());
        self.notify(NetworkNotification::PoweredOn);
        Ok(())
    }

    pub fn off(&mut self) -> Result<(), SystemError> {
        if !self.powered {
            return Ok(());
        }
        if let Err(err) = self.disconnect(DisconnectReason::PowerOff) {
            warn!(
                "net: {} disconnect before power off failed err={}",
                self.technology().as_str(),
                err.as_str()
            );
        }
        self.driver.power_off()?;
        self.powered = false;
        self.initialized = false;
        info!("net: {} powered off", self.technology().as_str());
        self.notify(NetworkNotification::PoweredOff);
        Ok(())
    }

    pub fn connect(&mut self) -> Result<(), SystemError> {
        if self.driver.is_ready() {
            self.mark_connected();
            return Ok(());
        }
        if (self.connecting && self.initialized) || self.listening.is_engaged() {
            return Ok(());
        }
        let now = self.driver.now_ms();
        self.watchdog.arm(now, self.policy.connect_watchdog_ms);
        telemetry::record_net_connect_attempt();

        let powered = self.on();
        if !self.driver.has_credentials() {
            warn!("net: {} has no credentials", self.technology().as_str());
            self.watchdog.disarm();
            if self.policy.listen_on_missing_credentials {
                self.listening.request_enter();
            }
            return Err(SystemError::NotFound);
        }
        if let Err(err) = powered {
            warn!(
                "net: {} power on failed err={}",
                self.technology().as_str(),
                err.as_str()
            );
            self.watchdog.disarm();
            return Err(err);
        }
        if self.update_mode {
            debug!("net: {} data link held for ncp update", self.technology().as_str());
            self.watchdog.disarm();
            return Ok(());
        }

        self.connecting = true;
        self.set_diag(NetworkDiagState::Connecting);
        self.notify(NetworkNotification::Connecting);
        if let Err(err) = self.driver.begin_connect() {
            warn!(
                "net: {} connect failed err={}",
                self.technology().as_str(),
                err.as_str()
            );
            self.connecting = false;
            self.watchdog.disarm();
            self.set_diag(NetworkDiagState::Disconnected);
            return Err(err);
        }
        Ok(())
    }

    pub fn disconnect(&mut self, reason: DisconnectReason) -> Result<(), SystemError> {
        if !self.connecting && !self.connected {
            return Ok(());
        }
        info!(
            "net: {} disconnect reason={}",
            self.technology().as_str(),
            reason.as_str()
        );
        if self.connected && reason != DisconnectReason::Reset {
            self.sink.request_cloud_disconnect();
        }
        self.set_diag(NetworkDiagState::Disconnecting);
        let result = self.driver.disconnect();
        self.connecting = false;
        self.connected = false;
        self.watchdog.disarm();
        self.set_diag(NetworkDiagState::Disconnected);
        self.notify(NetworkNotification::Disconnected);
        result
    }

    pub fn listen(&mut self) {
        self.listening.request_enter();
    }

    pub fn listen_stop(&mut self) {
        self.listening.request_exit();
    }

    pub fn is_listening(&self) -> bool {
        self.listening.is_active()
    }

    pub fn is_connecting(&self) -> bool {
        self.connecting
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn diag_state(&self) -> NetworkDiagState {
        self.diag
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    pub fn sink(&self) -> &N {
        &self.sink
    }

    /// One supervision tick: listening requests, attach completion, link
    /// loss and the connection watchdog.
    pub fn process(&mut self) {
        let now = self.driver.now_ms();
        match self.listening.update(now) {
            Some(ListeningTransition::Started) => {
                let _ = self.disconnect(DisconnectReason::Listening);
                self.notify(NetworkNotification::ListeningStarted);
            }
            Some(ListeningTransition::Stopped) => {
                self.notify(NetworkNotification::ListeningStopped);
            }
            None => {}
        }

        if self.connecting {
            if self.driver.is_ready() {
                self.mark_connected();
            } else if self.watchdog.expired(now) {
                warn!(
                    "net: {} connect watchdog expired, resetting connection",
                    self.technology().as_str()
                );
                telemetry::record_net_watchdog_reset();
                let _ = self.disconnect(DisconnectReason::Reset);
                let _ = self.connect();
            }
        } else if self.connected && !self.driver.is_ready() {
            warn!("net: {} link lost", self.technology().as_str());
            self.connected = false;
            self.set_diag(NetworkDiagState::Disconnected);
            self.notify(NetworkNotification::Disconnected);
            let _ = self.connect();
        }
    }

    fn mark_connected(&mut self) {
        self.connecting = false;
        self.watchdog.disarm();
        if self.connected {
            return;
        }
        self.connected = true;
        info!("net: {} connected", self.technology().as_str());
        self.set_diag(NetworkDiagState::Connected);
        self.notify(NetworkNotification::Connected);
    }

    fn notify(&mut self, notification: NetworkNotification) {
        let iface = self.technology();
        self.sink.notify(iface, notification);
    }

    fn set_diag(&mut self, state: NetworkDiagState) {
        self.diag = state;
        telemetry::set_network_diag_state(self.technology(), state);
    }

    fn owns(&self, iface: NetworkInterface) -> Result<(), SystemError> {
        if iface == self.technology() {
            Ok(())
        } else {
            Err(SystemError::NotSupported)
        }
    }
}

impl<D, N> NetworkControl for ManagedNetworkInterface<D, N>
where
    D: InterfaceDriver,
    N: NotificationSink,
{
    fn network_on(&mut self, iface: NetworkInterface) -> Result<(), SystemError> {
        self.owns(iface)?;
        self.on()
    }

    fn network_off(&mut self, iface: NetworkInterface) -> Result<(), SystemError> {
        self.owns(iface)?;
        self.off()
    }

    fn network_connect(&mut self, iface: NetworkInterface) -> Result<(), SystemError> {
        self.owns(iface)?;
        self.connect()
    }

    fn network_disconnect(
        &mut self,
        iface: NetworkInterface,
        reason: DisconnectReason,
    ) -> Result<(), SystemError> {
        self.owns(iface)?;
        self.disconnect(reason)
    }

    fn network_ready(&self, iface: NetworkInterface) -> bool {
        iface == self.technology() && self.connected
    }

    fn network_power_state(&self, iface: NetworkInterface) -> PowerState {
        if iface != self.technology() {
            PowerState::Unknown
        } else if self.powered {
            PowerState::On
        } else {
            PowerState::Off
        }
    }

    fn set_ncp_update_mode(&mut self, iface: NetworkInterface, enabled: bool) {
        if iface != self.technology() || self.update_mode == enabled {
            return;
        }
        info!(
            "net: {} ncp update mode {}",
            self.technology().as_str(),
            if enabled { "on" } else { "off" }
        );
        self.update_mode = enabled;
        self.driver.set_data_suppressed(enabled);
    }
}
