//! Receive path
//!
//! Packets can be consumed in two ways, which should not be mixed:
//!
//! - polled: call [`Radio::parse_packet`] until it reports a length. The
//!   chip is put in single receive and returns to standby after each packet.
//! - interrupt driven: [`Radio::receive`] enters continuous receive and the
//!   bound receive callback is invoked from the dispatch worker for every
//!   packet.
//!
//! Either way the payload is then drained with [`Radio::read`].

use core::mem;

use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiBus;
use log::debug;

use super::{HeaderMode, Radio, Subscription};
use crate::registers::{addr, Dio0Mapping, DioMapping1, IrqFlags, IrqStatus, OpMode, RadioMode};
use crate::Error;

impl<SPI, CS> Radio<SPI, CS>
where
    SPI: SpiBus<u8>,
    CS: OutputPin,
{
    /// Checks once for a received packet.
    ///
    /// `size > 0` selects implicit header mode with that fixed payload length.
    /// Returns the packet length, or 0 when nothing has arrived yet; in that
    /// case single receive is (re)armed so a later call can succeed.
    pub fn parse_packet(&mut self, size: u8) -> Result<usize, Error> {
        let status: IrqStatus = self.device.read_register()?;

        self.select_header(size)?;
        self.device.write_register(status)?;

        if status.flags.packet_received() {
            let length = self.open_received_packet()?;
            self.idle()?;
            debug!("polled packet of {} bytes", length);
            return Ok(length);
        }

        if self.read_mode()? != OpMode::lora(RadioMode::RxSingle) {
            self.device.write(addr::FIFO_ADDR_PTR, 0)?;
            self.set_mode(RadioMode::RxSingle)?;
        }
        Ok(0)
    }

    /// Enters continuous receive with DIO0 signalling RX done.
    ///
    /// `size > 0` selects implicit header mode with that fixed payload length.
    pub fn receive(&mut self, size: u8) -> Result<(), Error> {
        self.device
            .modify_register(|dio: &mut DioMapping1| dio.dio0 = Dio0Mapping::RxDone)?;
        self.select_header(size)?;
        self.set_mode(RadioMode::RxContinuous)
    }

    /// Bytes of the current packet not yet read
    pub fn available(&mut self) -> Result<usize, Error> {
        let received = usize::from(self.device.read(addr::RX_NB_BYTES)?);
        Ok(received.saturating_sub(self.state.rx_cursor))
    }

    /// Next byte of the current packet, `None` once it is drained
    pub fn read(&mut self) -> Result<Option<u8>, Error> {
        if self.available()? == 0 {
            return Ok(None);
        }

        self.state.rx_cursor += 1;
        self.device.read(addr::FIFO).map(Some)
    }

    /// Next byte of the current packet without consuming it
    pub fn peek(&mut self) -> Result<Option<u8>, Error> {
        if self.available()? == 0 {
            return Ok(None);
        }

        let position = self.device.read(addr::FIFO_ADDR_PTR)?;
        let byte = self.device.read(addr::FIFO)?;
        self.device.write(addr::FIFO_ADDR_PTR, position)?;
        Ok(Some(byte))
    }

    /// Services a DIO0 rising edge: clears the IRQ flags and hands the event
    /// to the bound callback.
    ///
    /// Called from the dispatch worker.
    pub(crate) fn handle_dio0_rise(&mut self) -> Result<(), Error> {
        let status: IrqStatus = self.device.read_register()?;
        self.device.write_register(status)?;

        if status.flags.contains(IrqFlags::PAYLOAD_CRC_ERROR) {
            debug!("dropping packet with CRC error");
            return Ok(());
        }

        if status.flags.contains(IrqFlags::RX_DONE) {
            let length = self.open_received_packet()?;
            debug!("received packet of {} bytes", length);

            match mem::replace(&mut self.subscription, Subscription::None) {
                Subscription::OnReceive(mut handler) => {
                    handler(self, length);
                    self.restore_subscription(Subscription::OnReceive(handler));
                }
                other => self.subscription = other,
            }

            self.device.write(addr::FIFO_ADDR_PTR, 0)?;
        } else if status.flags.contains(IrqFlags::TX_DONE) {
            self.state.mode = RadioMode::Standby;
            debug!("tx done");

            match mem::replace(&mut self.subscription, Subscription::None) {
                Subscription::OnTxDone(mut handler) => {
                    handler(self);
                    self.restore_subscription(Subscription::OnTxDone(handler));
                }
                other => self.subscription = other,
            }
        }
        Ok(())
    }

    /// Puts a callback back into the slot unless it was replaced meanwhile
    fn restore_subscription(&mut self, handler: Subscription<SPI, CS>) {
        if self.subscription.is_none() {
            self.subscription = handler;
        }
    }

    /// Rewinds the cursor and points the FIFO at the packet just received.
    /// Returns its length.
    fn open_received_packet(&mut self) -> Result<usize, Error> {
        self.state.rx_cursor = 0;

        let length = match self.state.header_mode {
            HeaderMode::Implicit => self.device.read(addr::PAYLOAD_LENGTH)?,
            HeaderMode::Explicit => self.device.read(addr::RX_NB_BYTES)?,
        };

        let current = self.device.read(addr::FIFO_RX_CURRENT_ADDR)?;
        self.device.write(addr::FIFO_ADDR_PTR, current)?;
        Ok(usize::from(length))
    }

    fn select_header(&mut self, size: u8) -> Result<(), Error> {
        if size > 0 {
            self.set_header_mode(HeaderMode::Implicit)?;
            self.device.write(addr::PAYLOAD_LENGTH, size)
        } else {
            self.set_header_mode(HeaderMode::Explicit)
        }
    }
}
