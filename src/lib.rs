//! SX1276 LoRa Radio Driver
//!
//! This crate drives the Semtech SX1276/77/78/79 long range transceivers in
//! LoRa mode. The chip performs modulation itself; the driver configures it
//! over SPI, moves payloads through its 256 byte FIFO and reacts to the
//! completion events it signals on DIO0.
//!
//! # Features
//! - Frequency range: 137-1020 MHz
//! - LoRa modulation: SF6-12, BW 7.8-500 kHz, CR 4/5-4/8
//! - Output power: up to +14 dBm on RFO, +20 dBm on PA_BOOST
//! - Packets up to 255 bytes, explicit or implicit header, optional CRC
//! - Polled or interrupt driven reception, blocking or asynchronous transmission
//!
//! # Architecture
//! The driver is organized into several modules:
//!
//! - [`device`]: Register bus over an `embedded-hal` SPI bus and chip-select
//!
//! - [`registers`]: Register definitions for direct hardware access
//!   - Typed wrappers for multi-field registers (operating mode, modem
//!     configuration, IRQ flags, DIO mapping, PA, OCP, LNA, IQ inversion)
//!   - [`registers::addr`]: addresses of plain byte registers
//!
//! - [`radio`]: Single-threaded driver core
//!   - [`radio::modulation`]: Frequency, modulation and output power
//!   - [`radio::transmit`]: Packet assembly and TX completion
//!   - [`radio::receive`]: Polled and interrupt driven reception
//!   - [`radio::status`]: RSSI, SNR, frequency error, channel sensing
//!
//! - [`dispatch`]: Worker thread servicing DIO0 outside interrupt context
//!
//! - [`lora`]: Application facade sharing the radio with the worker
//!
//! - [`hal`]: Interrupt line and clock capabilities `embedded-hal` lacks
//!
//! # Usage
//! Most applications use [`LoRa`]:
//!
//! 1. Create a [`LoRa`] from the SPI bus, chip-select, reset and DIO0 lines
//! 2. Call [`LoRa::begin`] (or [`LoRa::begin_with`] and a [`LoRaConfig`])
//! 3. Adjust modulation if needed; both ends must agree
//! 4. Transmit with `begin_packet` / `write` / `end_packet`
//! 5. Receive with `parse_packet`, or `on_receive` followed by `receive`
//!
//! [`Radio`] can be used on its own where no DIO0 line or thread is available.
//!
//! # Important Notes
//! - SF6 requires implicit header mode
//! - Low data rate optimization is managed automatically
//! - `time_on_air` ignores low data rate optimization, see
//!   [`radio::time_on_air_ms`]
//!
//! # Example
//! ```no_run
//! use embedded_hal::digital::OutputPin;
//! use embedded_hal::spi::SpiBus;
//! use sx1276::{Error, Radio, StdClock};
//!
//! fn poll<SPI: SpiBus, CS: OutputPin>(spi: SPI, cs: CS) -> Result<Vec<u8>, Error> {
//!     let mut radio = Radio::new(spi, cs, StdClock::new());
//!     radio.initialize(&sx1276::LoRaConfig::with_frequency(868_100_000))?;
//!
//!     while radio.parse_packet(0)? == 0 {}
//!
//!     let mut payload = Vec::new();
//!     while let Some(byte) = radio.read()? {
//!         payload.push(byte);
//!     }
//!     Ok(payload)
//! }
//! ```

pub mod config;
pub mod device;
pub mod dispatch;
pub mod error;
pub mod hal;
pub mod lora;
pub mod radio;
pub mod registers;

pub use config::LoRaConfig;
pub use device::Device;
pub use error::Error;
pub use hal::{Clock, EdgeHandler, InterruptLine, StdClock, StdDelay};
pub use lora::LoRa;
pub use radio::{ChipState, HeaderMode, Radio, Subscription, TxCompletion};
pub use registers::{Bandwidth, PaOutput, RadioMode};
