//! Transmit path
//!
//! A packet is assembled in the FIFO between [`Radio::begin_packet`] and
//! [`Radio::end_packet`]:
//!
//! ```text
//! Standby --begin_packet--> Standby (filling FIFO) --end_packet--> Tx --TX done--> Standby
//! ```

use std::time::Duration;

use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiBus;
use log::{debug, warn};

use super::{HeaderMode, Radio, Subscription};
use crate::registers::{
    addr, Dio0Mapping, DioMapping1, IrqFlags, IrqStatus, RadioMode, MAX_PACKET_LENGTH,
};
use crate::Error;

/// How [`Radio::end_packet`] waits for the packet to leave the antenna
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxCompletion {
    /// Return immediately. A bound TX-done callback runs on the dispatch
    /// worker once the chip reports completion.
    Async,
    /// Poll for TX done. `None` waits as long as the chip takes.
    Blocking(Option<Duration>),
}

impl<SPI, CS> Radio<SPI, CS>
where
    SPI: SpiBus<u8>,
    CS: OutputPin,
{
    /// Starts assembling a packet.
    ///
    /// # Errors
    /// * `Error::Transmitting` - the previous packet is still on air
    pub fn begin_packet(&mut self, implicit_header: bool) -> Result<(), Error> {
        if self.is_transmitting()? {
            return Err(Error::Transmitting);
        }

        self.idle()?;
        self.set_header_mode(if implicit_header {
            HeaderMode::Implicit
        } else {
            HeaderMode::Explicit
        })?;

        self.device.write(addr::FIFO_ADDR_PTR, 0)?;
        self.device.write(addr::PAYLOAD_LENGTH, 0)
    }

    /// Appends bytes to the packet being assembled.
    ///
    /// Returns how many bytes were accepted; anything that would take the
    /// packet past 255 bytes is dropped.
    pub fn write(&mut self, bytes: &[u8]) -> Result<usize, Error> {
        let current = usize::from(self.device.read(addr::PAYLOAD_LENGTH)?);
        let accepted = bytes.len().min(MAX_PACKET_LENGTH.saturating_sub(current));

        for byte in &bytes[..accepted] {
            self.device.write(addr::FIFO, *byte)?;
        }

        self.device
            .write(addr::PAYLOAD_LENGTH, (current + accepted) as u8)?;
        if accepted < bytes.len() {
            debug!("packet full, dropped {} bytes", bytes.len() - accepted);
        }
        Ok(accepted)
    }

    /// Sends the assembled packet.
    ///
    /// # Errors
    /// * `Error::Timeout` - a blocking wait exceeded its bound. The chip is put
    ///   back in standby, abandoning the packet.
    pub fn end_packet(&mut self, completion: TxCompletion) -> Result<(), Error> {
        if completion == TxCompletion::Async
            && matches!(self.subscription, Subscription::OnTxDone(_))
        {
            self.device
                .modify_register(|dio: &mut DioMapping1| dio.dio0 = Dio0Mapping::TxDone)?;
        }

        self.set_mode(RadioMode::Tx)?;

        let TxCompletion::Blocking(timeout) = completion else {
            return Ok(());
        };

        let started = self.clock.elapsed_ms();
        loop {
            let status: IrqStatus = self.device.read_register()?;
            if status.flags.contains(IrqFlags::TX_DONE) {
                self.device
                    .write_register(IrqStatus::clear(IrqFlags::TX_DONE))?;
                self.state.mode = RadioMode::Standby;
                debug!("tx done after {} ms", self.clock.elapsed_ms().saturating_sub(started));
                return Ok(());
            }

            if let Some(timeout) = timeout {
                if self.clock.elapsed_ms().saturating_sub(started) >= timeout.as_millis() as u64 {
                    warn!("no TX done within {:?}, aborting transmission", timeout);
                    self.idle()?;
                    return Err(Error::Timeout);
                }
            }
            std::hint::spin_loop();
        }
    }

    /// Whether a packet is on air.
    ///
    /// A leftover TX-done flag from an earlier packet is cleared on the way.
    pub fn is_transmitting(&mut self) -> Result<bool, Error> {
        if self.read_mode()?.mode == RadioMode::Tx {
            return Ok(true);
        }

        let status: IrqStatus = self.device.read_register()?;
        if status.flags.contains(IrqFlags::TX_DONE) {
            self.device
                .write_register(IrqStatus::clear(IrqFlags::TX_DONE))?;
        }
        if self.state.mode == RadioMode::Tx {
            self.state.mode = RadioMode::Standby;
        }
        Ok(false)
    }
}
