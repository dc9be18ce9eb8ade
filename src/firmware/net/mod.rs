//! Network supervision: the aggregate interface state machine and the
//! per-technology connection lifecycle.

mod interface;
mod listening;
mod machine;
mod manager;
mod watchdog;

pub use interface::{InterfaceDriver, ManagedNetworkInterface, NotificationSink};
pub use listening::{ListeningMode, ListeningTransition};
pub use machine::InterfaceRecord;
pub use manager::{InterfaceControl, InterfaceEvent, NetworkManager, NetworkManagerState};
pub use watchdog::{watchdog_expired, ConnectionWatchdog};

#[cfg(test)]
mod tests;
