//! Application facade
//!
//! [`LoRa`] bundles the radio with its reset and DIO0 lines and runs the
//! dispatch worker that services DIO0. The radio lives behind a mutex shared
//! with the worker; every method here locks it for the duration of the call.
//!
//! # Example
//! ```no_run
//! # fn demo<SPI, CS, RST, DIO>(spi: SPI, cs: CS, reset: RST, dio0: DIO) -> Result<(), sx1276::Error>
//! # where
//! #     SPI: embedded_hal::spi::SpiBus + Send + 'static,
//! #     CS: embedded_hal::digital::OutputPin + Send + 'static,
//! #     RST: embedded_hal::digital::OutputPin,
//! #     DIO: sx1276::InterruptLine,
//! # {
//! use sx1276::{LoRa, StdDelay, TxCompletion};
//!
//! let mut lora = LoRa::new(spi, cs, reset, dio0);
//! lora.begin(868_100_000, &mut StdDelay)?;
//!
//! lora.begin_packet(false)?;
//! lora.write(b"hello")?;
//! lora.end_packet(TxCompletion::Blocking(None))?;
//!
//! lora.on_receive(|radio, length| {
//!     let mut payload = Vec::with_capacity(length);
//!     while let Ok(Some(byte)) = radio.read() {
//!         payload.push(byte);
//!     }
//!     println!("{:?}", payload);
//! })?;
//! lora.receive(0)?;
//! # Ok(()) }
//! ```
//!
//! # Important Notes
//! - Callbacks run on the dispatch worker with the radio already locked. They
//!   get the radio as an argument and must not call back into [`LoRa`].
//! - Receive and TX-done share DIO0: binding one unbinds the other.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiBus;
use log::{debug, info};

use crate::dispatch::{Dispatcher, SharedRadio};
use crate::hal::{Clock, InterruptLine, StdClock};
use crate::radio::{Radio, Subscription, TxCompletion};
use crate::registers::{Bandwidth, PaOutput};
use crate::{Error, LoRaConfig};

/// SX1276 driver with interrupt-driven completion
pub struct LoRa<SPI, CS, RESET, DIO0> {
    radio: SharedRadio<SPI, CS>,
    reset: RESET,
    dio0: DIO0,
    dispatcher: Option<Dispatcher>,
}

impl<SPI, CS, RESET, DIO0> LoRa<SPI, CS, RESET, DIO0>
where
    SPI: SpiBus<u8> + Send + 'static,
    CS: OutputPin + Send + 'static,
    RESET: OutputPin,
    DIO0: InterruptLine,
{
    /// Creates a driver timed by the system clock. Nothing is sent to the
    /// chip before [`LoRa::begin`].
    pub fn new(spi: SPI, cs: CS, reset: RESET, dio0: DIO0) -> Self {
        Self::with_clock(spi, cs, reset, dio0, StdClock::new())
    }

    /// Creates a driver with a custom millisecond clock
    pub fn with_clock(spi: SPI, cs: CS, reset: RESET, dio0: DIO0, clock: impl Clock + 'static) -> Self {
        Self {
            radio: Arc::new(Mutex::new(Radio::new(spi, cs, clock))),
            reset,
            dio0,
            dispatcher: None,
        }
    }

    /// Resets and configures the chip with default settings on `frequency` Hz.
    pub fn begin(&mut self, frequency: u32, delay: &mut impl DelayNs) -> Result<(), Error> {
        self.begin_with(&LoRaConfig::with_frequency(frequency), delay)
    }

    /// Resets the chip, checks its identity, applies `config` and starts the
    /// dispatch worker. The radio is left in standby.
    ///
    /// # Errors
    /// * `Error::VersionMismatch` - no SX1276 answered; nothing was configured
    pub fn begin_with(&mut self, config: &LoRaConfig, delay: &mut impl DelayNs) -> Result<(), Error> {
        self.reset.set_low().map_err(Error::pin)?;
        delay.delay_ms(10);
        self.reset.set_high().map_err(Error::pin)?;
        delay.delay_ms(10);

        self.radio().initialize(config)?;

        if self.dispatcher.is_none() {
            self.dispatcher = Some(Dispatcher::start(Arc::clone(&self.radio))?);
        }
        Ok(())
    }

    /// Unbinds DIO0, stops the dispatch worker and puts the chip to sleep.
    pub fn end(&mut self) -> Result<(), Error> {
        self.dio0.on_rising_edge(None).map_err(Error::pin)?;
        if let Some(mut dispatcher) = self.dispatcher.take() {
            dispatcher.stop();
        }

        let mut radio = self.radio();
        radio.replace_subscription(Subscription::None);
        radio.sleep()?;
        info!("radio stopped");
        Ok(())
    }

    /// Ends operation and hands back the bus and pins.
    pub fn release(mut self) -> Result<(SPI, CS, RESET, DIO0), Error> {
        self.end()?;

        let Self {
            radio, reset, dio0, ..
        } = self;
        let radio = Arc::try_unwrap(radio).map_err(|_| Error::WorkerAlive)?;
        let (spi, cs) = radio
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
            .release();
        Ok((spi, cs, reset, dio0))
    }

    /// Locks the radio for direct access.
    ///
    /// Holding the guard delays DIO0 handling until it is dropped.
    pub fn radio(&self) -> MutexGuard<'_, Radio<SPI, CS>> {
        self.radio.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Invokes `handler` with the packet length for every packet received in
    /// continuous receive. Replaces any TX-done callback.
    ///
    /// # Errors
    /// * `Error::NotStarted` - [`LoRa::begin`] has not succeeded yet
    pub fn on_receive<F>(&mut self, handler: F) -> Result<(), Error>
    where
        F: FnMut(&mut Radio<SPI, CS>, usize) + Send + 'static,
    {
        self.bind(Subscription::OnReceive(Box::new(handler)))
    }

    /// Invokes `handler` each time an asynchronously sent packet has left.
    /// Replaces any receive callback.
    ///
    /// # Errors
    /// * `Error::NotStarted` - [`LoRa::begin`] has not succeeded yet
    pub fn on_tx_done<F>(&mut self, handler: F) -> Result<(), Error>
    where
        F: FnMut(&mut Radio<SPI, CS>) + Send + 'static,
    {
        self.bind(Subscription::OnTxDone(Box::new(handler)))
    }

    /// Drops the bound callback and disables the DIO0 trigger.
    pub fn clear_callback(&mut self) -> Result<(), Error> {
        self.dio0.on_rising_edge(None).map_err(Error::pin)?;
        self.radio().replace_subscription(Subscription::None);
        debug!("DIO0 unbound");
        Ok(())
    }

    fn bind(&mut self, subscription: Subscription<SPI, CS>) -> Result<(), Error> {
        let handler = self
            .dispatcher
            .as_ref()
            .ok_or(Error::NotStarted)?
            .edge_handler();

        debug!("DIO0 bound to {:?}", subscription);
        self.radio().replace_subscription(subscription);
        self.dio0.on_rising_edge(Some(handler)).map_err(Error::pin)
    }

    /// See [`Radio::begin_packet`]
    pub fn begin_packet(&mut self, implicit_header: bool) -> Result<(), Error> {
        self.radio().begin_packet(implicit_header)
    }

    /// See [`Radio::write`]
    pub fn write(&mut self, bytes: &[u8]) -> Result<usize, Error> {
        self.radio().write(bytes)
    }

    /// See [`Radio::end_packet`]
    pub fn end_packet(&mut self, completion: TxCompletion) -> Result<(), Error> {
        self.radio().end_packet(completion)
    }

    /// See [`Radio::is_transmitting`]
    pub fn is_transmitting(&mut self) -> Result<bool, Error> {
        self.radio().is_transmitting()
    }

    /// See [`Radio::parse_packet`]
    pub fn parse_packet(&mut self, size: u8) -> Result<usize, Error> {
        self.radio().parse_packet(size)
    }

    /// See [`Radio::receive`]
    pub fn receive(&mut self, size: u8) -> Result<(), Error> {
        self.radio().receive(size)
    }

    /// See [`Radio::available`]
    pub fn available(&mut self) -> Result<usize, Error> {
        self.radio().available()
    }

    /// See [`Radio::read`]
    pub fn read(&mut self) -> Result<Option<u8>, Error> {
        self.radio().read()
    }

    /// See [`Radio::peek`]
    pub fn peek(&mut self) -> Result<Option<u8>, Error> {
        self.radio().peek()
    }

    /// See [`Radio::idle`]
    pub fn idle(&mut self) -> Result<(), Error> {
        self.radio().idle()
    }

    /// See [`Radio::sleep`]
    pub fn sleep(&mut self) -> Result<(), Error> {
        self.radio().sleep()
    }

    /// See [`Radio::set_frequency`]
    pub fn set_frequency(&mut self, hz: u32) -> Result<u32, Error> {
        self.radio().set_frequency(hz)
    }

    /// See [`Radio::set_spreading_factor`]
    pub fn set_spreading_factor(&mut self, sf: u8) -> Result<(), Error> {
        self.radio().set_spreading_factor(sf)
    }

    /// See [`Radio::set_signal_bandwidth`]
    pub fn set_signal_bandwidth(&mut self, hz: u32) -> Result<Bandwidth, Error> {
        self.radio().set_signal_bandwidth(hz)
    }

    /// See [`Radio::set_coding_rate`]
    pub fn set_coding_rate(&mut self, denominator: u8) -> Result<(), Error> {
        self.radio().set_coding_rate(denominator)
    }

    /// See [`Radio::set_preamble_length`]
    pub fn set_preamble_length(&mut self, symbols: u16) -> Result<(), Error> {
        self.radio().set_preamble_length(symbols)
    }

    /// See [`Radio::set_sync_word`]
    pub fn set_sync_word(&mut self, sync_word: u8) -> Result<(), Error> {
        self.radio().set_sync_word(sync_word)
    }

    /// See [`Radio::enable_crc`]
    pub fn enable_crc(&mut self, enable: bool) -> Result<(), Error> {
        self.radio().enable_crc(enable)
    }

    /// See [`Radio::enable_invert_iq`]
    pub fn enable_invert_iq(&mut self, enable: bool) -> Result<(), Error> {
        self.radio().enable_invert_iq(enable)
    }

    /// See [`Radio::set_tx_power`]
    pub fn set_tx_power(&mut self, level: u8, output: PaOutput) -> Result<(), Error> {
        self.radio().set_tx_power(level, output)
    }

    /// See [`Radio::set_ocp`]
    pub fn set_ocp(&mut self, milliamps: u8) -> Result<(), Error> {
        self.radio().set_ocp(milliamps)
    }

    /// See [`Radio::packet_rssi`]
    pub fn packet_rssi(&mut self) -> Result<i16, Error> {
        self.radio().packet_rssi()
    }

    /// See [`Radio::packet_snr`]
    pub fn packet_snr(&mut self) -> Result<f32, Error> {
        self.radio().packet_snr()
    }

    /// See [`Radio::packet_frequency_error`]
    pub fn packet_frequency_error(&mut self) -> Result<i64, Error> {
        self.radio().packet_frequency_error()
    }

    /// See [`Radio::rssi`]
    pub fn rssi(&mut self) -> Result<i16, Error> {
        self.radio().rssi()
    }

    /// See [`Radio::channel_active`]
    pub fn channel_active(&mut self, threshold_dbm: i16, max_sense_ms: u32) -> Result<bool, Error> {
        self.radio().channel_active(threshold_dbm, max_sense_ms)
    }

    /// See [`Radio::random`]
    pub fn random(&mut self) -> Result<u8, Error> {
        self.radio().random()
    }

    /// Predicted airtime in ms of a packet under the current configuration
    pub fn time_on_air(&self, payload_len: usize) -> u32 {
        self.radio().time_on_air(payload_len)
    }
}
