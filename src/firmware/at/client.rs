use embedded_io::{Read, ReadReady, Write};
use heapless::Vec;
use log::{debug, warn};

use super::super::{
    config::{AT_COMMAND_MAX, AT_LINE_MAX},
    system::{AtResult, AtTransport, MonotonicClock},
};
use super::{parse::final_result, urc::UrcMailbox};

const READ_CHUNK: usize = 64;

/// Line-oriented AT client over a byte stream.
///
/// Commands are strictly sequential. Unsolicited lines seen while a command
/// is in flight, or while draining with `poll_urcs`, go to the mailbox.
pub struct AtClient<'a, IO, C> {
    io: IO,
    clock: C,
    urc: &'a UrcMailbox,
    line: Vec<u8, AT_LINE_MAX>,
    overflow: bool,
}

impl<'a, IO, C> AtClient<'a, IO, C>
where
    IO: Read + Write + ReadReady,
    C: MonotonicClock,
{
    pub fn new(io: IO, clock: C, urc: &'a UrcMailbox) -> Self {
        Self {
            io,
            clock,
            urc,
            line: Vec::new(),
            overflow: false,
        }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn io_mut(&mut self) -> &mut IO {
        &mut self.io
    }

    fn write_command(&mut self, cmd: &str) -> bool {
        self.io.write_all(cmd.as_bytes()).is_ok()
            && self.io.write_all(b"\r\n").is_ok()
            && self.io.flush().is_ok()
    }

    /// Reads whatever is buffered and feeds complete lines to `sink`.
    /// Stops early when `sink` returns a final result.
    fn pump(&mut self, sink: &mut dyn FnMut(&str) -> Option<AtResult>) -> Option<AtResult> {
        loop {
            match self.io.read_ready() {
                Ok(true) => {}
                Ok(false) => return None,
                Err(_) => return Some(AtResult::Error),
            }
            let mut chunk = [0u8; READ_CHUNK];
            let count = match self.io.read(&mut chunk) {
                Ok(0) => return None,
                Ok(count) => count,
                Err(_) => return Some(AtResult::Error),
            };
            for &byte in &chunk[..count] {
                if let Some(result) = self.push_byte(byte, sink) {
                    return Some(result);
                }
            }
        }
    }

    fn push_byte(
        &mut self,
        byte: u8,
        sink: &mut dyn FnMut(&str) -> Option<AtResult>,
    ) -> Option<AtResult> {
        match byte {
            b'\r' => None,
            b'\n' => {
                let line = core::mem::take(&mut self.line);
                if core::mem::take(&mut self.overflow) {
                    warn!("at: dropped line over {} bytes", AT_LINE_MAX);
                    return None;
                }
                let text = core::str::from_utf8(&line).ok()?.trim();
                if text.is_empty() {
                    return None;
                }
                if self.urc.on_urc(text) {
                    return None;
                }
                sink(text)
            }
            _ => {
                if self.line.push(byte).is_err() {
                    self.overflow = true;
                }
                None
            }
        }
    }
}

impl<'a, IO, C> AtTransport for AtClient<'a, IO, C>
where
    IO: Read + Write + ReadReady,
    C: MonotonicClock,
{
    fn command(&mut self, cmd: &str, timeout_ms: u32, on_line: &mut dyn FnMut(&str)) -> AtResult {
        if cmd.len() > AT_COMMAND_MAX {
            warn!("at: command over {} bytes rejected", AT_COMMAND_MAX);
            return AtResult::Error;
        }
        self.poll_urcs();
        if !self.write_command(cmd) {
            warn!("at: write failed cmd={}", cmd);
            return AtResult::Error;
        }

        let deadline = self.clock.now_ms().saturating_add(u64::from(timeout_ms));
        let mut sink = |line: &str| {
            if line == cmd {
                return None;
            }
            if let Some(result) = final_result(line) {
                return Some(result);
            }
            on_line(line);
            None
        };
        loop {
            if let Some(result) = self.pump(&mut sink) {
                if !result.is_ok() {
                    debug!("at: {} -> {}", cmd, result.as_str());
                }
                return result;
            }
            if self.clock.now_ms() >= deadline {
                debug!("at: {} -> timeout after {}ms", cmd, timeout_ms);
                return AtResult::Timeout;
            }
            core::hint::spin_loop();
        }
    }

    fn poll_urcs(&mut self) {
        let mut sink = |line: &str| {
            debug!("at: unexpected line {}", line);
            None
        };
        let _ = self.pump(&mut sink);
    }
}
