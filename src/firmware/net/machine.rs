use heapless::Vec;
use log::{debug, info, warn};
use statig::prelude::*;

use super::super::{config::NETWORK_INTERFACES_MAX, types::SystemError};
use super::manager::{InterfaceEvent, NetworkManagerState};

/// Aggregate view of one OS-level interface.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InterfaceRecord {
    pub index: u8,
    pub loopback: bool,
    pub admin_up: bool,
    pub link_up: bool,
    pub has_addr: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum ManagerCommand {
    Enable,
    Disable,
    Activate,
    Deactivate,
    Interface(InterfaceEvent),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) struct InterfaceRequest {
    pub(super) index: u8,
    pub(super) up: bool,
}

pub(super) struct DispatchContext {
    pub(super) requests: Vec<InterfaceRequest, NETWORK_INTERFACES_MAX>,
    pub(super) result: Result<(), SystemError>,
}

impl Default for DispatchContext {
    fn default() -> Self {
        Self {
            requests: Vec::new(),
            result: Ok(()),
        }
    }
}

impl DispatchContext {
    fn request(&mut self, index: u8, up: bool) {
        if self.requests.push(InterfaceRequest { index, up }).is_err() {
            warn!("net: request queue full index={}", index);
        }
    }
}

pub(super) struct NetworkManagerMachine {
    pub(super) state: NetworkManagerState,
    pub(super) interfaces: Vec<InterfaceRecord, NETWORK_INTERFACES_MAX>,
}

impl NetworkManagerMachine {
    pub(super) fn new() -> Self {
        Self {
            state: NetworkManagerState::Disabled,
            interfaces: Vec::new(),
        }
    }

    fn enter(&mut self, next: NetworkManagerState) -> Outcome<State> {
        info!("net: {} -> {}", self.state.as_str(), next.as_str());
        self.state = next;
        Transition(match next {
            NetworkManagerState::Disabled => State::disabled(),
            NetworkManagerState::IfaceDown => State::iface_down(),
            NetworkManagerState::IfaceRequestUp => State::iface_request_up(),
            NetworkManagerState::IfaceUp => State::iface_up(),
            NetworkManagerState::IfaceLinkUp => State::iface_link_up(),
            NetworkManagerState::IpConfigured => State::ip_configured(),
            NetworkManagerState::IfaceRequestDown => State::iface_request_down(),
        })
    }

    fn track(&mut self, event: &ManagerCommand) {
        let ManagerCommand::Interface(event) = *event else {
            return;
        };
        match event {
            InterfaceEvent::Added { index, loopback } => {
                if self.record(index).is_some() {
                    return;
                }
                let record = InterfaceRecord {
                    index,
                    loopback,
                    ..InterfaceRecord::default()
                };
                if self.interfaces.push(record).is_err() {
                    warn!("net: interface table full, ignoring index={}", index);
                }
            }
            InterfaceEvent::Removed { index } => {
                self.interfaces.retain(|record| record.index != index);
            }
            InterfaceEvent::State { index, up } => {
                if let Some(record) = self.record(index) {
                    record.admin_up = up;
                    if !up {
                        record.link_up = false;
                        record.has_addr = false;
                    }
                }
            }
            InterfaceEvent::Link { index, up } => {
                if let Some(record) = self.record(index) {
                    record.link_up = up;
                    if !up {
                        record.has_addr = false;
                    }
                }
            }
            InterfaceEvent::Address { index, configured } => {
                if let Some(record) = self.record(index) {
                    record.has_addr = configured;
                }
            }
            InterfaceEvent::LinkLayerAddress { index } => {
                debug!("net: lladdr changed index={}", index);
            }
        }
    }

    fn record(&mut self, index: u8) -> Option<&mut InterfaceRecord> {
        self.interfaces
            .iter_mut()
            .find(|record| record.index == index)
    }

    fn managed(&self) -> impl Iterator<Item = &InterfaceRecord> {
        self.interfaces.iter().filter(|record| !record.loopback)
    }

    fn any_up(&self) -> bool {
        self.managed().any(|record| record.admin_up)
    }

    fn any_link(&self) -> bool {
        self.managed().any(|record| record.link_up)
    }

    fn any_addr(&self) -> bool {
        self.managed().any(|record| record.has_addr)
    }

    fn request_all(&self, context: &mut DispatchContext, up: bool) -> usize {
        let mut pending = 0;
        for record in self.managed() {
            if up || record.admin_up {
                context.request(record.index, up);
                pending += 1;
            }
        }
        pending
    }

    /// Re-derives the aggregate state after an interface went away or down.
    fn settle(&mut self) -> Outcome<State> {
        let next = if self.any_addr() {
            NetworkManagerState::IpConfigured
        } else if self.any_link() {
            NetworkManagerState::IfaceLinkUp
        } else if self.any_up() {
            NetworkManagerState::IfaceUp
        } else {
            NetworkManagerState::IfaceRequestUp
        };
        if next == self.state {
            Handled
        } else {
            self.enter(next)
        }
    }
}

#[state_machine(initial = "State::disabled()")]
impl NetworkManagerMachine {
    #[state]
    fn disabled(&mut self, context: &mut DispatchContext, event: &ManagerCommand) -> Outcome<State> {
        self.track(event);
        match event {
            ManagerCommand::Enable => self.enter(NetworkManagerState::IfaceDown),
            ManagerCommand::Interface(_) => Handled,
            _ => {
                context.result = Err(SystemError::InvalidState);
                Handled
            }
        }
    }

    #[state]
    fn iface_down(
        &mut self,
        context: &mut DispatchContext,
        event: &ManagerCommand,
    ) -> Outcome<State> {
        self.track(event);
        match event {
            ManagerCommand::Disable => self.enter(NetworkManagerState::Disabled),
            ManagerCommand::Activate => {
                self.request_all(context, true);
                if self.any_up() {
                    self.enter(NetworkManagerState::IfaceUp)
                } else {
                    self.enter(NetworkManagerState::IfaceRequestUp)
                }
            }
            ManagerCommand::Deactivate | ManagerCommand::Interface(_) => Handled,
            ManagerCommand::Enable => {
                context.result = Err(SystemError::InvalidState);
                Handled
            }
        }
    }

    #[superstate]
    fn active(&mut self, context: &mut DispatchContext, event: &ManagerCommand) -> Outcome<State> {
        match event {
            ManagerCommand::Deactivate => {
                let pending = self.request_all(context, false);
                if pending == 0 {
                    self.enter(NetworkManagerState::IfaceDown)
                } else {
                    debug!("net: waiting for {} interfaces to go down", pending);
                    self.enter(NetworkManagerState::IfaceRequestDown)
                }
            }
            ManagerCommand::Interface(_) => Handled,
            _ => {
                context.result = Err(SystemError::InvalidState);
                Handled
            }
        }
    }

    #[state(superstate = "active")]
    fn iface_request_up(
        &mut self,
        context: &mut DispatchContext,
        event: &ManagerCommand,
    ) -> Outcome<State> {
        self.track(event);
        match event {
            ManagerCommand::Interface(InterfaceEvent::Added {
                index,
                loopback: false,
            }) => {
                context.request(*index, true);
                Handled
            }
            ManagerCommand::Interface(InterfaceEvent::State { up: true, .. }) if self.any_up() => {
                self.enter(NetworkManagerState::IfaceUp)
            }
            _ => Super,
        }
    }

    #[state(superstate = "active")]
    fn iface_up(&mut self, event: &ManagerCommand) -> Outcome<State> {
        self.track(event);
        match event {
            ManagerCommand::Interface(InterfaceEvent::Link { up: true, .. }) if self.any_link() => {
                self.enter(NetworkManagerState::IfaceLinkUp)
            }
            ManagerCommand::Interface(
                InterfaceEvent::State { up: false, .. } | InterfaceEvent::Removed { .. },
            ) => self.settle(),
            _ => Super,
        }
    }

    #[state(superstate = "active")]
    fn iface_link_up(&mut self, event: &ManagerCommand) -> Outcome<State> {
        self.track(event);
        match event {
            ManagerCommand::Interface(InterfaceEvent::Address {
                configured: true, ..
            }) if self.any_addr() => self.enter(NetworkManagerState::IpConfigured),
            ManagerCommand::Interface(
                InterfaceEvent::Link { up: false, .. }
                | InterfaceEvent::State { up: false, .. }
                | InterfaceEvent::Removed { .. },
            ) => self.settle(),
            _ => Super,
        }
    }

    #[state(superstate = "active")]
    fn ip_configured(&mut self, event: &ManagerCommand) -> Outcome<State> {
        self.track(event);
        match event {
            ManagerCommand::Interface(
                InterfaceEvent::Address {
                    configured: false, ..
                }
                | InterfaceEvent::Link { up: false, .. }
                | InterfaceEvent::State { up: false, .. }
                | InterfaceEvent::Removed { .. },
            ) => self.settle(),
            _ => Super,
        }
    }

    #[state(superstate = "active")]
    fn iface_request_down(
        &mut self,
        context: &mut DispatchContext,
        event: &ManagerCommand,
    ) -> Outcome<State> {
        self.track(event);
        match event {
            ManagerCommand::Interface(
                InterfaceEvent::State { up: false, .. } | InterfaceEvent::Removed { .. },
            ) if !self.any_up() => self.enter(NetworkManagerState::IfaceDown),
            ManagerCommand::Deactivate => Handled,
            ManagerCommand::Interface(_) => Handled,
            _ => {
                context.result = Err(SystemError::InvalidState);
                Handled
            }
        }
    }
}
