//! SX1276 register bus
//!
//! This module frames register accesses for the SX1276 serial interface.
//! Every access is a single two-byte exchange with chip-select held low:
//!
//! ```text
//! write: [addr | 0x80, value]
//! read:  [addr & 0x7F, 0x00]   -> second byte clocked back is the value
//! ```
//!
//! The chip has no transfer-level error signalling, so a read that returns
//! garbage is indistinguishable from a good one. Callers that care validate
//! semantically (see the version check in `begin`).
//!
//! # Example
//! ```no_run
//! # fn demo<SPI: embedded_hal::spi::SpiBus, CS: embedded_hal::digital::OutputPin>(spi: SPI, cs: CS) -> Result<(), sx1276::Error> {
//! use sx1276::{Device, registers::{addr, ModemConfig2}};
//!
//! let mut device = Device::new(spi, cs);
//!
//! let version = device.read(addr::VERSION)?;
//! let mut config: ModemConfig2 = device.read_register()?;
//! config.rx_payload_crc_on = true;
//! device.write_register(config)?;
//! # Ok(()) }
//! ```

use core::convert::Infallible;

use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiBus;
use log::trace;
use regiface::{ByteArray, ReadableRegister, WritableRegister};

use crate::Error;

/// Register access to the radio over an SPI bus with a dedicated chip-select.
pub struct Device<SPI, CS> {
    spi: SPI,
    cs: CS,
}

impl<SPI, CS> Device<SPI, CS> {
    /// Creates a new Device wrapping the bus and its chip-select line.
    ///
    /// The chip-select is expected to idle high; [`Device::deselect`] can be
    /// used to force it there before the first access.
    pub fn new(spi: SPI, cs: CS) -> Self {
        Self { spi, cs }
    }

    /// Releases the underlying bus and chip-select.
    pub fn release(self) -> (SPI, CS) {
        (self.spi, self.cs)
    }
}

/// Holds chip-select low for its lifetime.
///
/// Dropping the guard releases the line even when the exchange bailed out
/// early; [`Selected::release`] does the same but reports pin failures.
struct Selected<'a, CS: OutputPin> {
    cs: Option<&'a mut CS>,
}

impl<'a, CS: OutputPin> Selected<'a, CS> {
    fn assert(cs: &'a mut CS) -> Result<Self, Error> {
        cs.set_low().map_err(Error::pin)?;
        Ok(Self { cs: Some(cs) })
    }

    fn release(mut self) -> Result<(), Error> {
        match self.cs.take() {
            Some(cs) => cs.set_high().map_err(Error::pin),
            None => Ok(()),
        }
    }
}

impl<CS: OutputPin> Drop for Selected<'_, CS> {
    fn drop(&mut self) {
        if let Some(cs) = self.cs.take() {
            let _ = cs.set_high();
        }
    }
}

impl<SPI, CS> Device<SPI, CS>
where
    SPI: SpiBus<u8>,
    CS: OutputPin,
{
    /// Drives chip-select to its idle (high) level.
    pub fn deselect(&mut self) -> Result<(), Error> {
        self.cs.set_high().map_err(Error::pin)
    }

    /// Reads one byte register.
    pub fn read(&mut self, address: u8) -> Result<u8, Error> {
        let value = self.exchange(address & 0x7F, 0x00)?;
        trace!("read  {:#04x} -> {:#04x}", address, value);
        Ok(value)
    }

    /// Writes one byte register.
    pub fn write(&mut self, address: u8, value: u8) -> Result<(), Error> {
        trace!("write {:#04x} <- {:#04x}", address, value);
        self.exchange(address | 0x80, value).map(drop)
    }

    /// Reads a typed register.
    ///
    /// # Errors
    /// * `Error::Spi` / `Error::Pin` - bus exchange failed
    /// * `Error::InvalidRegister` - the raw value has no typed representation
    pub fn read_register<R>(&mut self) -> Result<R, Error>
    where
        R: ReadableRegister<IdType = u8>,
    {
        let mut raw_value = R::Array::new();
        for (offset, byte) in raw_value.as_mut().iter_mut().enumerate() {
            *byte = self.read(R::id() + offset as u8)?;
        }

        let first = raw_value.as_ref().first().copied().unwrap_or_default();
        R::from_bytes(raw_value).map_err(|_| Error::InvalidRegister {
            address: R::id(),
            value: first,
        })
    }

    /// Writes a typed register.
    pub fn write_register<R>(&mut self, register: R) -> Result<(), Error>
    where
        R: WritableRegister<IdType = u8, Error = Infallible>,
    {
        let raw_value = match register.to_bytes() {
            Ok(raw_value) => raw_value,
            Err(never) => match never {},
        };

        for (offset, byte) in raw_value.as_ref().iter().enumerate() {
            self.write(R::id() + offset as u8, *byte)?;
        }
        Ok(())
    }

    /// Reads a typed register, lets `f` change it and writes it back.
    pub fn modify_register<R, F>(&mut self, f: F) -> Result<R, Error>
    where
        R: ReadableRegister<IdType = u8> + WritableRegister<IdType = u8, Error = Infallible> + Copy,
        F: FnOnce(&mut R),
    {
        let mut register: R = self.read_register()?;
        f(&mut register);
        self.write_register(register)?;
        Ok(register)
    }

    fn exchange(&mut self, header: u8, value: u8) -> Result<u8, Error> {
        let mut frame = [header, value];

        let selected = Selected::assert(&mut self.cs)?;
        let transfer = self
            .spi
            .transfer_in_place(&mut frame)
            .and_then(|()| self.spi.flush())
            .map_err(Error::spi);
        let released = selected.release();
        transfer?;
        released?;

        Ok(frame[1])
    }
}
