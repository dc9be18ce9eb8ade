use esp_hal::{uart::Uart, Blocking};

/// Byte-stream view of a blocking UART for the AT client.
pub struct UartPort<'d> {
    uart: Uart<'d, Blocking>,
}

impl<'d> UartPort<'d> {
    pub fn new(uart: Uart<'d, Blocking>) -> Self {
        Self { uart }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UartPortError {
    Rx,
    Tx,
}

impl embedded_io::Error for UartPortError {
    fn kind(&self) -> embedded_io::ErrorKind {
        embedded_io::ErrorKind::Other
    }
}

impl embedded_io::ErrorType for UartPort<'_> {
    type Error = UartPortError;
}

impl embedded_io::Read for UartPort<'_> {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        if buf.is_empty() {
            return Ok(0);
        }
        self.uart.read(buf).map_err(|_| UartPortError::Rx)
    }
}

impl embedded_io::ReadReady for UartPort<'_> {
    fn read_ready(&mut self) -> Result<bool, Self::Error> {
        Ok(self.uart.read_ready())
    }
}

impl embedded_io::Write for UartPort<'_> {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        self.uart.write(buf).map_err(|_| UartPortError::Tx)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        self.uart.flush().map_err(|_| UartPortError::Tx)
    }
}
