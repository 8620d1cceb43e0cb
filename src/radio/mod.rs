//! LoRa radio core
//!
//! [`Radio`] owns the register bus together with the driver's view of the
//! chip ([`ChipState`]) and the single DIO0 subscription slot. All register
//! level behavior lives here, split by concern:
//!
//! - [`modulation`]: frequency, spreading factor, bandwidth, coding rate,
//!   preamble, sync word, CRC, IQ inversion, output power and airtime
//! - [`transmit`]: packet assembly in the FIFO and TX completion
//! - [`receive`]: polled and interrupt-driven reception, FIFO stream access
//! - [`status`]: signal quality and channel diagnostics
//!
//! `Radio` itself is single-threaded. [`LoRa`](crate::LoRa) shares it between
//! the application and the dispatch worker behind a mutex.

use core::fmt;
use core::mem;

use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiBus;
use log::debug;

use crate::device::Device;
use crate::hal::Clock;
use crate::registers::{addr, Bandwidth, OpMode, RadioMode, CHIP_VERSION};
use crate::Error;

pub mod modulation;
pub mod receive;
pub mod status;
pub mod transmit;

pub use modulation::{frf_from_hz, hz_from_frf, ldo_required, time_on_air_ms};
pub use transmit::TxCompletion;

/// How the payload length of a packet is conveyed
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HeaderMode {
    /// Length, coding rate and CRC presence are sent in a header
    #[default]
    Explicit,
    /// Length is fixed by configuration on both ends
    Implicit,
}

/// The driver's record of the chip configuration.
///
/// Every field mirrors the last value written to the corresponding
/// register(s), so derived values (airtime, RSSI offsets) can be computed
/// without bus traffic.
#[derive(Debug, Clone, PartialEq)]
pub struct ChipState {
    /// Last mode written to RegOpMode, or observed after a completion event
    pub mode: RadioMode,
    pub header_mode: HeaderMode,
    /// Carrier frequency in Hz
    pub frequency: u32,
    pub bandwidth: Bandwidth,
    /// 6..=12
    pub spreading_factor: u8,
    /// Coding rate as programmed: denominator - 4, 1..=4
    pub coding_rate: u8,
    /// Preamble length in symbols
    pub preamble_length: u16,
    pub crc_enabled: bool,
    /// Bytes of the current received packet already consumed
    pub rx_cursor: usize,
}

impl ChipState {
    /// Coding rate denominator (4/x), 5..=8
    pub fn coding_rate_denominator(&self) -> u8 {
        self.coding_rate + 4
    }
}

impl Default for ChipState {
    fn default() -> Self {
        Self {
            mode: RadioMode::Sleep,
            header_mode: HeaderMode::Explicit,
            frequency: 0,
            bandwidth: Bandwidth::Bw125kHz,
            spreading_factor: 7,
            coding_rate: 1,
            preamble_length: 8,
            crc_enabled: false,
            rx_cursor: 0,
        }
    }
}

/// Receive callback: invoked on the dispatch worker with the packet length.
/// The radio is lent to the callback so it can drain the FIFO.
pub type ReceiveHandler<SPI, CS> = Box<dyn FnMut(&mut Radio<SPI, CS>, usize) + Send + 'static>;

/// TX-done callback: invoked on the dispatch worker once the FIFO has been sent.
pub type TxDoneHandler<SPI, CS> = Box<dyn FnMut(&mut Radio<SPI, CS>) + Send + 'static>;

/// What the single DIO0 line is currently bound to.
///
/// Receive and TX-done share one physical line, so binding one replaces the
/// other rather than leaving it silently attached to the same edge.
pub enum Subscription<SPI, CS> {
    None,
    OnReceive(ReceiveHandler<SPI, CS>),
    OnTxDone(TxDoneHandler<SPI, CS>),
}

impl<SPI, CS> Subscription<SPI, CS> {
    /// Whether no callback is bound
    pub fn is_none(&self) -> bool {
        matches!(self, Subscription::None)
    }
}

impl<SPI, CS> fmt::Debug for Subscription<SPI, CS> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Subscription::None => f.write_str("None"),
            Subscription::OnReceive(_) => f.write_str("OnReceive(..)"),
            Subscription::OnTxDone(_) => f.write_str("OnTxDone(..)"),
        }
    }
}

/// Register-level driver for one SX1276.
pub struct Radio<SPI, CS> {
    pub(crate) device: Device<SPI, CS>,
    pub(crate) state: ChipState,
    pub(crate) subscription: Subscription<SPI, CS>,
    pub(crate) clock: Box<dyn Clock>,
}

impl<SPI, CS> Radio<SPI, CS> {
    /// Wraps the bus. The chip is not touched until [`Radio::initialize`].
    pub fn new(spi: SPI, cs: CS, clock: impl Clock + 'static) -> Self {
        Self {
            device: Device::new(spi, cs),
            state: ChipState::default(),
            subscription: Subscription::None,
            clock: Box::new(clock),
        }
    }

    /// The driver's record of the chip configuration
    pub fn state(&self) -> &ChipState {
        &self.state
    }

    /// Current DIO0 binding
    pub fn subscription(&self) -> &Subscription<SPI, CS> {
        &self.subscription
    }

    pub(crate) fn replace_subscription(
        &mut self,
        subscription: Subscription<SPI, CS>,
    ) -> Subscription<SPI, CS> {
        mem::replace(&mut self.subscription, subscription)
    }

    /// Releases the bus and chip-select.
    pub fn release(self) -> (SPI, CS) {
        self.device.release()
    }
}

impl<SPI, CS> Radio<SPI, CS>
where
    SPI: SpiBus<u8>,
    CS: OutputPin,
{
    /// Raw register access, for registers the driver does not model
    pub fn device(&mut self) -> &mut Device<SPI, CS> {
        &mut self.device
    }

    /// Reads RegVersion
    pub fn version(&mut self) -> Result<u8, Error> {
        self.device.read(addr::VERSION)
    }

    /// Checks the chip identity and applies the power-on configuration.
    ///
    /// On a version mismatch nothing but RegVersion is accessed. On success
    /// the radio is left in standby.
    pub fn initialize(&mut self, config: &crate::LoRaConfig) -> Result<(), Error> {
        self.device.deselect()?;

        let version = self.version()?;
        if version != CHIP_VERSION {
            log::warn!("SX1276 not detected: version register reads {:#04x}", version);
            return Err(Error::VersionMismatch(version));
        }

        self.state = ChipState::default();
        self.sleep()?;
        self.set_frequency(config.frequency)?;

        self.device.write(addr::FIFO_TX_BASE_ADDR, 0)?;
        self.device.write(addr::FIFO_RX_BASE_ADDR, 0)?;

        self.device
            .modify_register(|lna: &mut crate::registers::Lna| lna.boost_hf = 0b11)?;
        self.device
            .write_register(crate::registers::ModemConfig3::agc_auto())?;

        self.set_tx_power(config.tx_power, config.pa_output)?;
        self.configure(config)?;

        self.idle()?;
        log::info!(
            "SX1276 ready on {} Hz (SF{}, {} Hz, CR 4/{})",
            self.state.frequency,
            self.state.spreading_factor,
            self.state.bandwidth.as_hz(),
            self.state.coding_rate_denominator()
        );
        Ok(())
    }

    /// Puts the chip in standby
    pub fn idle(&mut self) -> Result<(), Error> {
        self.set_mode(RadioMode::Standby)
    }

    /// Puts the chip in sleep
    pub fn sleep(&mut self) -> Result<(), Error> {
        self.set_mode(RadioMode::Sleep)
    }

    pub(crate) fn set_mode(&mut self, mode: RadioMode) -> Result<(), Error> {
        self.device.write_register(OpMode::lora(mode))?;
        if self.state.mode != mode {
            debug!("mode {:?} -> {:?}", self.state.mode, mode);
        }
        self.state.mode = mode;
        Ok(())
    }

    pub(crate) fn read_mode(&mut self) -> Result<OpMode, Error> {
        self.device.read_register()
    }

    pub(crate) fn set_header_mode(&mut self, header_mode: HeaderMode) -> Result<(), Error> {
        self.device
            .modify_register(|cfg: &mut crate::registers::ModemConfig1| {
                cfg.implicit_header = header_mode == HeaderMode::Implicit;
            })?;
        self.state.header_mode = header_mode;
        Ok(())
    }
}
