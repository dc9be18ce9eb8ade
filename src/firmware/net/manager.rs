use log::warn;
use statig::blocking::IntoStateMachineExt as _;

use super::super::types::SystemError;
use super::machine::{DispatchContext, InterfaceRecord, ManagerCommand, NetworkManagerMachine};

/// Aggregate networking state, from administratively disabled to having
/// at least one configured address.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NetworkManagerState {
    Disabled,
    IfaceDown,
    IfaceRequestUp,
    IfaceUp,
    IfaceLinkUp,
    IpConfigured,
    IfaceRequestDown,
}

impl NetworkManagerState {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Disabled => "disabled",
            Self::IfaceDown => "iface_down",
            Self::IfaceRequestUp => "iface_request_up",
            Self::IfaceUp => "iface_up",
            Self::IfaceLinkUp => "iface_link_up",
            Self::IpConfigured => "ip_configured",
            Self::IfaceRequestDown => "iface_request_down",
        }
    }
}

/// Low-level notification from the IP stack about one interface.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InterfaceEvent {
    Added { index: u8, loopback: bool },
    Removed { index: u8 },
    State { index: u8, up: bool },
    Link { index: u8, up: bool },
    Address { index: u8, configured: bool },
    LinkLayerAddress { index: u8 },
}

/// Administrative control over interfaces of the IP stack.
pub trait InterfaceControl {
    fn request_up(&mut self, index: u8) -> Result<(), SystemError>;
    fn request_down(&mut self, index: u8) -> Result<(), SystemError>;
}

pub struct NetworkManager<I> {
    machine: statig::blocking::StateMachine<NetworkManagerMachine>,
    control: I,
}

impl<I: InterfaceControl> NetworkManager<I> {
    pub fn new(control: I) -> Self {
        Self {
            machine: NetworkManagerMachine::new().state_machine(),
            control,
        }
    }

    pub fn enable_networking(&mut self) -> Result<(), SystemError> {
        self.dispatch(ManagerCommand::Enable)
    }

    pub fn disable_networking(&mut self) -> Result<(), SystemError> {
        self.dispatch(ManagerCommand::Disable)
    }

    /// Requests every non-loopback interface up.
    pub fn activate_connections(&mut self) -> Result<(), SystemError> {
        self.dispatch(ManagerCommand::Activate)
    }

    /// Requests every non-loopback interface down and waits for the ones
    /// still up to report it.
    pub fn deactivate_connections(&mut self) -> Result<(), SystemError> {
        self.dispatch(ManagerCommand::Deactivate)
    }

    pub fn handle_interface_event(&mut self, event: InterfaceEvent) {
        let _ = self.dispatch(ManagerCommand::Interface(event));
    }

    pub fn state(&self) -> NetworkManagerState {
        self.machine.inner().state
    }

    pub fn is_configured(&self) -> bool {
        self.state() == NetworkManagerState::IpConfigured
    }

    pub fn interface_count(&self) -> usize {
        self.machine.inner().interfaces.len()
    }

    pub fn interfaces(&self) -> &[InterfaceRecord] {
        &self.machine.inner().interfaces
    }

    pub fn control(&self) -> &I {
        &self.control
    }

    fn dispatch(&mut self, command: ManagerCommand) -> Result<(), SystemError> {
        let mut context = DispatchContext::default();
        self.machine.handle_with_context(&command, &mut context);
        for request in &context.requests {
            let result = if request.up {
                self.control.request_up(request.index)
            } else {
                self.control.request_down(request.index)
            };
            if let Err(err) = result {
                warn!(
                    "net: admin request failed index={} up={} err={}",
                    request.index,
                    request.up,
                    err.as_str()
                );
            }
        }
        context.result
    }
}
