pub(crate) const SUPERVISOR_TICK_MS: u64 = 250;
pub(crate) const MODEM_UART_BAUD: u32 = 115_200;
pub(crate) const TELEMETRY_INTERVAL_SECONDS: u64 = 60;
/// User-level switch for modem firmware updates on this board.
pub(crate) const NCP_UPDATES_ENABLED: bool = true;
