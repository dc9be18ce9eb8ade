use std::vec::Vec;

use super::*;
use crate::firmware::{
    config::InterfacePolicy,
    system::{MonotonicClock, NetworkControl},
    types::{
        DisconnectReason, NetworkDiagState, NetworkInterface, NetworkNotification, PowerState,
        SystemError,
    },
};

const WLAN: u8 = 2;
const PPP: u8 = 3;
const LO: u8 = 1;

#[derive(Default)]
struct FakeStack {
    requests: Vec<(u8, bool)>,
}

impl InterfaceControl for FakeStack {
    fn request_up(&mut self, index: u8) -> Result<(), SystemError> {
        self.requests.push((index, true));
        Ok(())
    }

    fn request_down(&mut self, index: u8) -> Result<(), SystemError> {
        self.requests.push((index, false));
        Ok(())
    }
}

fn enabled_manager() -> NetworkManager<FakeStack> {
    let mut manager = NetworkManager::new(FakeStack::default());
    manager.enable_networking().expect("enable");
    manager.handle_interface_event(InterfaceEvent::Added {
        index: LO,
        loopback: true,
    });
    manager.handle_interface_event(InterfaceEvent::Added {
        index: WLAN,
        loopback: false,
    });
    manager
}

#[test]
fn enable_and_disable_are_guarded_by_state() {
    let mut manager = NetworkManager::new(FakeStack::default());
    assert_eq!(manager.state(), NetworkManagerState::Disabled);
    assert_eq!(manager.disable_networking(), Err(SystemError::InvalidState));
    assert_eq!(manager.activate_connections(), Err(SystemError::InvalidState));

    assert_eq!(manager.enable_networking(), Ok(()));
    assert_eq!(manager.state(), NetworkManagerState::IfaceDown);
    assert_eq!(manager.enable_networking(), Err(SystemError::InvalidState));

    assert_eq!(manager.disable_networking(), Ok(()));
    assert_eq!(manager.state(), NetworkManagerState::Disabled);
}

#[test]
fn activation_walks_up_to_ip_configured() {
    let mut manager = enabled_manager();
    assert_eq!(manager.interface_count(), 2);

    manager.activate_connections().expect("activate");
    assert_eq!(manager.control().requests, [(WLAN, true)]);
    assert_eq!(manager.state(), NetworkManagerState::IfaceRequestUp);

    manager.handle_interface_event(InterfaceEvent::State {
        index: WLAN,
        up: true,
    });
    assert_eq!(manager.state(), NetworkManagerState::IfaceUp);
    manager.handle_interface_event(InterfaceEvent::Link {
        index: WLAN,
        up: true,
    });
    assert_eq!(manager.state(), NetworkManagerState::IfaceLinkUp);
    manager.handle_interface_event(InterfaceEvent::Address {
        index: WLAN,
        configured: true,
    });
    assert!(manager.is_configured());
    assert_eq!(manager.activate_connections(), Err(SystemError::InvalidState));
}

#[test]
fn link_up_is_ignored_until_interface_is_up() {
    let mut manager = enabled_manager();
    manager.activate_connections().expect("activate");

    manager.handle_interface_event(InterfaceEvent::Link {
        index: WLAN,
        up: true,
    });
    assert_eq!(manager.state(), NetworkManagerState::IfaceRequestUp);

    manager.handle_interface_event(InterfaceEvent::State {
        index: WLAN,
        up: true,
    });
    assert_eq!(manager.state(), NetworkManagerState::IfaceUp);
}

#[test]
fn loopback_coming_up_does_not_count() {
    let mut manager = enabled_manager();
    manager.activate_connections().expect("activate");
    manager.handle_interface_event(InterfaceEvent::State { index: LO, up: true });
    assert_eq!(manager.state(), NetworkManagerState::IfaceRequestUp);
}

#[test]
fn activation_with_interface_already_up_skips_request_state() {
    let mut manager = enabled_manager();
    manager.handle_interface_event(InterfaceEvent::State {
        index: WLAN,
        up: true,
    });
    manager.activate_connections().expect("activate");
    assert_eq!(manager.state(), NetworkManagerState::IfaceUp);
}

#[test]
fn interface_added_while_requesting_is_brought_up() {
    let mut manager = enabled_manager();
    manager.activate_connections().expect("activate");
    manager.handle_interface_event(InterfaceEvent::Added {
        index: PPP,
        loopback: false,
    });
    assert_eq!(manager.control().requests, [(WLAN, true), (PPP, true)]);
}

#[test]
fn deactivation_waits_for_every_pending_interface() {
    let mut manager = enabled_manager();
    manager.handle_interface_event(InterfaceEvent::Added {
        index: PPP,
        loopback: false,
    });
    manager.activate_connections().expect("activate");
    for index in [WLAN, PPP] {
        manager.handle_interface_event(InterfaceEvent::State { index, up: true });
    }
    assert_eq!(manager.state(), NetworkManagerState::IfaceUp);

    manager.deactivate_connections().expect("deactivate");
    assert_eq!(manager.state(), NetworkManagerState::IfaceRequestDown);
    assert!(manager.control().requests.ends_with(&[(WLAN, false), (PPP, false)]));

    manager.handle_interface_event(InterfaceEvent::State {
        index: WLAN,
        up: false,
    });
    assert_eq!(manager.state(), NetworkManagerState::IfaceRequestDown);
    manager.handle_interface_event(InterfaceEvent::State {
        index: PPP,
        up: false,
    });
    assert_eq!(manager.state(), NetworkManagerState::IfaceDown);
}

#[test]
fn deactivation_with_nothing_up_completes_immediately() {
    let mut manager = enabled_manager();
    manager.activate_connections().expect("activate");
    manager.deactivate_connections().expect("deactivate");
    assert_eq!(manager.state(), NetworkManagerState::IfaceDown);
}

#[test]
fn losing_address_and_interface_steps_back() {
    let mut manager = enabled_manager();
    manager.activate_connections().expect("activate");
    manager.handle_interface_event(InterfaceEvent::State {
        index: WLAN,
        up: true,
    });
    manager.handle_interface_event(InterfaceEvent::Link {
        index: WLAN,
        up: true,
    });
    manager.handle_interface_event(InterfaceEvent::Address {
        index: WLAN,
        configured: true,
    });

    manager.handle_interface_event(InterfaceEvent::Address {
        index: WLAN,
        configured: false,
    });
    assert_eq!(manager.state(), NetworkManagerState::IfaceLinkUp);

    manager.handle_interface_event(InterfaceEvent::Removed { index: WLAN });
    assert_eq!(manager.state(), NetworkManagerState::IfaceRequestUp);
    assert_eq!(manager.interface_count(), 1);
}

struct FakeDriver {
    now_ms: u64,
    power_fails: bool,
    disconnect_fails: bool,
    ready: bool,
    credentials: bool,
    suppressed: bool,
    power_ons: u32,
    power_offs: u32,
    connects: u32,
    disconnects: u32,
}

impl Default for FakeDriver {
    fn default() -> Self {
        Self {
            now_ms: 0,
            power_fails: false,
            disconnect_fails: false,
            ready: false,
            credentials: true,
            suppressed: false,
            power_ons: 0,
            power_offs: 0,
            connects: 0,
            disconnects: 0,
        }
    }
}

impl MonotonicClock for FakeDriver {
    fn now_ms(&self) -> u64 {
        self.now_ms
    }
}

impl InterfaceDriver for FakeDriver {
    fn technology(&self) -> NetworkInterface {
        NetworkInterface::Wifi
    }

    fn power_on(&mut self) -> Result<(), SystemError> {
        if self.power_fails {
            return Err(SystemError::Timeout);
        }
        self.power_ons += 1;
        Ok(())
    }

    fn power_off(&mut self) -> Result<(), SystemError> {
        self.power_offs += 1;
        self.ready = false;
        Ok(())
    }

    fn begin_connect(&mut self) -> Result<(), SystemError> {
        self.connects += 1;
        Ok(())
    }

    fn disconnect(&mut self) -> Result<(), SystemError> {
        self.disconnects += 1;
        if self.disconnect_fails {
            return Err(SystemError::Io);
        }
        self.ready = false;
        Ok(())
    }

    fn is_ready(&self) -> bool {
        self.ready
    }

    fn has_credentials(&self) -> bool {
        self.credentials
    }

    fn set_data_suppressed(&mut self, suppressed: bool) {
        self.suppressed = suppressed;
    }
}

#[derive(Default)]
struct RecordingSink {
    notifications: Vec<NetworkNotification>,
    cloud_disconnects: u32,
}

impl NotificationSink for RecordingSink {
    fn notify(&mut self, _iface: NetworkInterface, notification: NetworkNotification) {
        self.notifications.push(notification);
    }

    fn request_cloud_disconnect(&mut self) {
        self.cloud_disconnects += 1;
    }
}

type Wifi = ManagedNetworkInterface<FakeDriver, RecordingSink>;

fn wifi(driver: FakeDriver) -> Wifi {
    ManagedNetworkInterface::new(driver, RecordingSink::default(), InterfacePolicy::default())
}

fn count(interface: &Wifi, notification: NetworkNotification) -> usize {
    interface
        .sink()
        .notifications
        .iter()
        .filter(|seen| **seen == notification)
        .count()
}

#[test]
fn on_and_off_notify_once_per_transition() {
    let mut interface = wifi(FakeDriver {
        power_fails: true,
        ..FakeDriver::default()
    });
    assert_eq!(interface.on(), Err(SystemError::Timeout));
    assert_eq!(interface.on(), Err(SystemError::Timeout));
    assert!(interface.sink().notifications.is_empty());

    interface.driver_mut().power_fails = false;
    interface.on().expect("on");
    interface.on().expect("already on");
    assert_eq!(count(&interface, NetworkNotification::PoweredOn), 1);
    assert_eq!(interface.driver().power_ons, 1);

    interface.off().expect("off");
    interface.off().expect("already off");
    assert_eq!(count(&interface, NetworkNotification::PoweredOff), 1);
}

#[test]
fn failed_disconnect_does_not_stop_power_off() {
    let mut interface = wifi(FakeDriver {
        disconnect_fails: true,
        ..FakeDriver::default()
    });
    interface.connect().expect("connect");
    interface.driver_mut().ready = true;
    interface.process();
    assert!(interface.is_connected());

    interface.off().expect("off");
    assert_eq!(interface.driver().disconnects, 1);
    assert_eq!(interface.driver().power_offs, 1);
    assert!(!interface.is_connected());
    assert_eq!(count(&interface, NetworkNotification::PoweredOff), 1);
}

#[test]
fn connect_reports_connecting_then_connected() {
    let mut interface = wifi(FakeDriver::default());
    interface.connect().expect("connect");
    interface.connect().expect("already connecting");
    assert_eq!(interface.driver().connects, 1);
    assert_eq!(interface.diag_state(), NetworkDiagState::Connecting);

    interface.driver_mut().ready = true;
    interface.process();
    assert!(interface.is_connected());
    assert_eq!(interface.diag_state(), NetworkDiagState::Connected);

    interface.connect().expect("already ready");
    assert_eq!(interface.driver().connects, 1);
    assert_eq!(count(&interface, NetworkNotification::Connected), 1);
}

#[test]
fn watchdog_resets_a_stuck_attempt() {
    let mut interface = wifi(FakeDriver::default());
    interface.connect().expect("connect");

    interface.driver_mut().now_ms = u64::from(InterfacePolicy::default().connect_watchdog_ms) - 1;
    interface.process();
    assert_eq!(interface.driver().disconnects, 0);

    interface.driver_mut().now_ms += 1;
    interface.process();
    assert_eq!(interface.driver().disconnects, 1);
    assert_eq!(interface.driver().connects, 2);
    assert!(interface.is_connecting());
    assert_eq!(interface.sink().cloud_disconnects, 0);
}

#[test]
fn missing_credentials_enter_listening() {
    let mut interface = wifi(FakeDriver {
        credentials: false,
        ..FakeDriver::default()
    });
    assert_eq!(interface.connect(), Err(SystemError::NotFound));
    assert_eq!(interface.driver().connects, 0);

    interface.process();
    assert!(interface.is_listening());
    assert_eq!(count(&interface, NetworkNotification::ListeningStarted), 1);

    interface.driver_mut().credentials = true;
    interface.connect().expect("ignored while listening");
    assert_eq!(interface.driver().connects, 0);

    interface.listen_stop();
    interface.process();
    assert!(!interface.is_listening());
    assert_eq!(count(&interface, NetworkNotification::ListeningStopped), 1);
}

#[test]
fn power_failure_still_checks_credentials() {
    let mut interface = wifi(FakeDriver {
        power_fails: true,
        credentials: false,
        ..FakeDriver::default()
    });
    assert_eq!(interface.connect(), Err(SystemError::NotFound));
    interface.process();
    assert!(interface.is_listening());

    let mut interface = wifi(FakeDriver {
        power_fails: true,
        ..FakeDriver::default()
    });
    assert_eq!(interface.connect(), Err(SystemError::Timeout));
    assert!(!interface.is_connecting());
    assert_eq!(interface.diag_state(), NetworkDiagState::Disconnected);
}

#[test]
fn listening_times_out() {
    let mut interface = wifi(FakeDriver::default());
    interface.listen();
    interface.process();
    assert!(interface.is_listening());

    interface.driver_mut().now_ms = u64::from(InterfacePolicy::default().listen_timeout_ms);
    interface.process();
    assert!(!interface.is_listening());
}

#[test]
fn disconnect_asks_cloud_to_close_first() {
    let mut interface = wifi(FakeDriver::default());
    interface.connect().expect("connect");
    interface.driver_mut().ready = true;
    interface.process();

    interface
        .disconnect(DisconnectReason::User)
        .expect("disconnect");
    assert_eq!(interface.sink().cloud_disconnects, 1);
    assert_eq!(interface.diag_state(), NetworkDiagState::Disconnected);
    assert_eq!(count(&interface, NetworkNotification::Disconnected), 1);

    interface
        .disconnect(DisconnectReason::User)
        .expect("already disconnected");
    assert_eq!(count(&interface, NetworkNotification::Disconnected), 1);
}

#[test]
fn update_mode_holds_the_data_link() {
    let mut interface = wifi(FakeDriver::default());
    interface.set_ncp_update_mode(NetworkInterface::Wifi, true);
    assert!(interface.driver().suppressed);

    interface
        .network_connect(NetworkInterface::Wifi)
        .expect("connect");
    assert_eq!(
        interface.network_power_state(NetworkInterface::Wifi),
        PowerState::On
    );
    assert_eq!(interface.driver().connects, 0);
    assert!(!interface.network_ready(NetworkInterface::Wifi));

    interface.set_ncp_update_mode(NetworkInterface::Wifi, false);
    interface
        .network_connect(NetworkInterface::Wifi)
        .expect("connect");
    assert_eq!(interface.driver().connects, 1);
}

#[test]
fn network_control_rejects_foreign_interfaces() {
    let mut interface = wifi(FakeDriver::default());
    assert_eq!(
        interface.network_on(NetworkInterface::Cellular),
        Err(SystemError::NotSupported)
    );
    assert_eq!(
        interface.network_power_state(NetworkInterface::Cellular),
        PowerState::Unknown
    );
    assert_eq!(
        interface.network_power_state(NetworkInterface::Wifi),
        PowerState::Off
    );
}

#[test]
fn watchdog_compares_base_plus_duration() {
    assert!(!watchdog_expired(1_000, 500, 1_499));
    assert!(watchdog_expired(1_000, 500, 1_500));
    assert!(!watchdog_expired(2_000, 500, 1_000));

    let mut watchdog = ConnectionWatchdog::default();
    assert!(!watchdog.expired(u64::MAX));
    watchdog.arm(10, 5);
    assert!(watchdog.expired(15));
    watchdog.disarm();
    assert!(!watchdog.is_armed());
}
