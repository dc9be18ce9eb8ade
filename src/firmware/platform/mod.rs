//! ESP32 wiring of the capability traits: UART AT channel, SARA-R510 power
//! control, flash-backed cache and reset handling.

mod cloud;
mod device;
mod sara;
mod uart;

pub use cloud::{LinkCloud, LinkSink};
pub use device::{EspClock, EspDevice};
pub use sara::{SaraPins, SaraR510};
pub use uart::{UartPort, UartPortError};
