//! Simulated SX1276 for driving the driver without hardware.
//!
//! The chip is a 128 byte register file plus a 256 byte FIFO addressed through
//! RegFifoAddrPtr. It behaves like the real part where the driver depends on
//! it: IRQ flags clear on write-one, entering TX completes immediately
//! (sets TX done and drops back to standby), FIFO accesses advance the pointer.

#![allow(dead_code)]

use std::convert::Infallible;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::{Duration, Instant};

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{self, ErrorType as PinErrorType, OutputPin};
use embedded_hal::spi::{self, ErrorType as SpiErrorType, SpiBus};
use sx1276::{Clock, EdgeHandler, InterruptLine, LoRa, Radio};

pub const REG_FIFO: usize = 0x00;
pub const REG_OP_MODE: usize = 0x01;
pub const REG_FRF_MSB: usize = 0x06;
pub const REG_PA_CONFIG: usize = 0x09;
pub const REG_OCP: usize = 0x0B;
pub const REG_FIFO_ADDR_PTR: usize = 0x0D;
pub const REG_FIFO_TX_BASE: usize = 0x0E;
pub const REG_FIFO_RX_CURRENT: usize = 0x10;
pub const REG_IRQ_FLAGS: usize = 0x12;
pub const REG_RX_NB_BYTES: usize = 0x13;
pub const REG_PKT_SNR: usize = 0x19;
pub const REG_PKT_RSSI: usize = 0x1A;
pub const REG_RSSI: usize = 0x1B;
pub const REG_MODEM_CONFIG_1: usize = 0x1D;
pub const REG_MODEM_CONFIG_2: usize = 0x1E;
pub const REG_PAYLOAD_LENGTH: usize = 0x22;
pub const REG_MODEM_CONFIG_3: usize = 0x26;
pub const REG_FREQ_ERROR_MSB: usize = 0x28;
pub const REG_RSSI_WIDEBAND: usize = 0x2C;
pub const REG_DETECTION_OPTIMIZE: usize = 0x31;
pub const REG_INVERT_IQ: usize = 0x33;
pub const REG_DETECTION_THRESHOLD: usize = 0x37;
pub const REG_SYNC_WORD: usize = 0x39;
pub const REG_INVERT_IQ_2: usize = 0x3B;
pub const REG_DIO_MAPPING_1: usize = 0x40;
pub const REG_VERSION: usize = 0x42;
pub const REG_PA_DAC: usize = 0x4D;

pub const IRQ_RX_DONE: u8 = 0x40;
pub const IRQ_CRC_ERROR: u8 = 0x20;
pub const IRQ_VALID_HEADER: u8 = 0x10;
pub const IRQ_TX_DONE: u8 = 0x08;

/// Where injected packets land in the FIFO
pub const RX_PACKET_ADDR: u8 = 0x80;

/// One two-byte exchange as seen on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    pub header: u8,
    pub value: u8,
    /// Chip-select was low during the exchange
    pub selected: bool,
}

impl Frame {
    pub fn is_write(&self) -> bool {
        self.header & 0x80 != 0
    }

    pub fn address(&self) -> usize {
        usize::from(self.header & 0x7F)
    }
}

pub struct Chip {
    pub regs: [u8; 128],
    pub fifo: [u8; 256],
    pub frames: Vec<Frame>,
    /// Payloads that entered TX, in order
    pub transmitted: Vec<Vec<u8>>,
    pub tx_never_completes: bool,
    pub selected: bool,
    /// Every SPI transfer fails with [`BusFault`]
    pub bus_fault: bool,
    /// Driving chip-select high fails with [`PinFault`]
    pub cs_stuck: bool,
}

impl Chip {
    pub fn new(version: u8) -> Self {
        let mut regs = [0u8; 128];
        regs[REG_OP_MODE] = 0x01;
        regs[REG_PA_CONFIG] = 0x4F;
        regs[REG_OCP] = 0x2B;
        regs[0x0C] = 0x20;
        regs[REG_MODEM_CONFIG_1] = 0x72;
        regs[REG_MODEM_CONFIG_2] = 0x70;
        regs[REG_INVERT_IQ] = 0x27;
        regs[REG_INVERT_IQ_2] = 0x1D;
        regs[REG_SYNC_WORD] = 0x12;
        regs[REG_PA_DAC] = 0x84;
        regs[REG_VERSION] = version;

        Self {
            regs,
            fifo: [0; 256],
            frames: Vec::new(),
            transmitted: Vec::new(),
            tx_never_completes: false,
            selected: false,
            bus_fault: false,
            cs_stuck: false,
        }
    }

    pub fn reg(&self, address: usize) -> u8 {
        self.regs[address]
    }

    pub fn mode_bits(&self) -> u8 {
        self.regs[REG_OP_MODE] & 0x07
    }

    /// Places a received packet in the FIFO and raises `flags`.
    pub fn inject_packet(&mut self, payload: &[u8], flags: u8) {
        let base = usize::from(RX_PACKET_ADDR);
        self.fifo[base..base + payload.len()].copy_from_slice(payload);
        self.regs[REG_FIFO_RX_CURRENT] = RX_PACKET_ADDR;
        self.regs[REG_RX_NB_BYTES] = payload.len() as u8;
        self.regs[REG_IRQ_FLAGS] |= flags;
    }

    fn exchange(&mut self, header: u8, value: u8) -> u8 {
        self.frames.push(Frame {
            header,
            value,
            selected: self.selected,
        });

        let address = usize::from(header & 0x7F);
        if header & 0x80 == 0 {
            return self.read(address);
        }
        self.write(address, value);
        0
    }

    fn read(&mut self, address: usize) -> u8 {
        if address == REG_FIFO {
            let ptr = self.regs[REG_FIFO_ADDR_PTR];
            self.regs[REG_FIFO_ADDR_PTR] = ptr.wrapping_add(1);
            return self.fifo[usize::from(ptr)];
        }
        self.regs[address]
    }

    fn write(&mut self, address: usize, value: u8) {
        match address {
            REG_FIFO => {
                let ptr = self.regs[REG_FIFO_ADDR_PTR];
                self.fifo[usize::from(ptr)] = value;
                self.regs[REG_FIFO_ADDR_PTR] = ptr.wrapping_add(1);
            }
            REG_IRQ_FLAGS => self.regs[REG_IRQ_FLAGS] &= !value,
            REG_OP_MODE => {
                self.regs[REG_OP_MODE] = value;
                if value & 0x07 == 0x03 && !self.tx_never_completes {
                    let base = usize::from(self.regs[REG_FIFO_TX_BASE]);
                    let len = usize::from(self.regs[REG_PAYLOAD_LENGTH]);
                    self.transmitted.push(self.fifo[base..base + len].to_vec());
                    self.regs[REG_IRQ_FLAGS] |= IRQ_TX_DONE;
                    self.regs[REG_OP_MODE] = (value & !0x07) | 0x01;
                }
            }
            _ => self.regs[address] = value,
        }
    }
}

pub type SharedChip = Arc<Mutex<Chip>>;

pub fn lock(chip: &SharedChip) -> MutexGuard<'_, Chip> {
    chip.lock().unwrap()
}

/// Transfer failure reported by [`SimSpi`] while `bus_fault` is set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusFault;

impl spi::Error for BusFault {
    fn kind(&self) -> spi::ErrorKind {
        spi::ErrorKind::ModeFault
    }
}

/// Pin failure reported by [`ChipSelect`] while `cs_stuck` is set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinFault;

impl digital::Error for PinFault {
    fn kind(&self) -> digital::ErrorKind {
        digital::ErrorKind::Other
    }
}

pub struct SimSpi(pub SharedChip);

impl SpiErrorType for SimSpi {
    type Error = BusFault;
}

impl SpiBus<u8> for SimSpi {
    fn read(&mut self, words: &mut [u8]) -> Result<(), Self::Error> {
        words.fill(0);
        Ok(())
    }

    fn write(&mut self, _words: &[u8]) -> Result<(), Self::Error> {
        Ok(())
    }

    fn transfer(&mut self, read: &mut [u8], write: &[u8]) -> Result<(), Self::Error> {
        let mut frame = [write[0], write[1]];
        self.transfer_in_place(&mut frame)?;
        read.copy_from_slice(&frame[..read.len()]);
        Ok(())
    }

    fn transfer_in_place(&mut self, words: &mut [u8]) -> Result<(), Self::Error> {
        assert_eq!(words.len(), 2, "register access must be a two-byte frame");
        let mut chip = lock(&self.0);
        if chip.bus_fault {
            return Err(BusFault);
        }
        let value = chip.exchange(words[0], words[1]);
        words[0] = 0;
        words[1] = value;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Chip-select wired to the simulated chip
pub struct ChipSelect(pub SharedChip);

impl PinErrorType for ChipSelect {
    type Error = PinFault;
}

impl OutputPin for ChipSelect {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        lock(&self.0).selected = true;
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        let mut chip = lock(&self.0);
        if chip.cs_stuck {
            return Err(PinFault);
        }
        chip.selected = false;
        Ok(())
    }
}

/// Output pin remembering every level driven on it
#[derive(Clone, Default)]
pub struct RecordingPin(pub Arc<Mutex<Vec<bool>>>);

impl RecordingPin {
    pub fn levels(&self) -> Vec<bool> {
        self.0.lock().unwrap().clone()
    }
}

impl PinErrorType for RecordingPin {
    type Error = Infallible;
}

impl OutputPin for RecordingPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.0.lock().unwrap().push(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.0.lock().unwrap().push(true);
        Ok(())
    }
}

/// DIO0 line; the test fires edges through a [`Dio0Trigger`]
pub struct SimDio0(Arc<Mutex<Option<EdgeHandler>>>);

#[derive(Clone)]
pub struct Dio0Trigger(Arc<Mutex<Option<EdgeHandler>>>);

impl Dio0Trigger {
    /// Raises DIO0 on the calling thread. Returns false when no handler is armed.
    pub fn fire(&self) -> bool {
        match self.0.lock().unwrap().as_mut() {
            Some(handler) => {
                handler();
                true
            }
            None => false,
        }
    }

    pub fn is_armed(&self) -> bool {
        self.0.lock().unwrap().is_some()
    }
}

impl PinErrorType for SimDio0 {
    type Error = Infallible;
}

impl InterruptLine for SimDio0 {
    fn on_rising_edge(&mut self, handler: Option<EdgeHandler>) -> Result<(), Self::Error> {
        *self.0.lock().unwrap() = handler;
        Ok(())
    }
}

pub fn dio0() -> (SimDio0, Dio0Trigger) {
    let slot = Arc::new(Mutex::new(None));
    (SimDio0(Arc::clone(&slot)), Dio0Trigger(slot))
}

/// Clock advancing one millisecond every time it is read
#[derive(Clone, Default)]
pub struct SimClock(pub Arc<AtomicU64>);

impl SimClock {
    pub fn now(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }
}

impl Clock for SimClock {
    fn elapsed_ms(&self) -> u64 {
        self.0.fetch_add(1, Ordering::SeqCst)
    }
}

/// Delay that only accounts for the time requested
#[derive(Default)]
pub struct RecordingDelay {
    pub total_ns: u64,
}

impl DelayNs for RecordingDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.total_ns += u64::from(ns);
    }
}

pub type SimLoRa = LoRa<SimSpi, ChipSelect, RecordingPin, SimDio0>;

pub struct Rig {
    pub chip: SharedChip,
    pub reset: RecordingPin,
    pub dio0: Dio0Trigger,
    pub clock: SimClock,
}

impl Rig {
    pub fn chip(&self) -> MutexGuard<'_, Chip> {
        lock(&self.chip)
    }
}

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Driver wired to a fresh simulated chip reporting `version`
pub fn rig(version: u8) -> (SimLoRa, Rig) {
    init_logging();

    let chip = Arc::new(Mutex::new(Chip::new(version)));
    let reset = RecordingPin::default();
    let (line, trigger) = dio0();
    let clock = SimClock::default();

    let lora = LoRa::with_clock(
        SimSpi(Arc::clone(&chip)),
        ChipSelect(Arc::clone(&chip)),
        reset.clone(),
        line,
        clock.clone(),
    );

    (
        lora,
        Rig {
            chip,
            reset,
            dio0: trigger,
            clock,
        },
    )
}

/// Register-level radio on a fresh chip, without reset or dispatch worker
pub fn bare_radio() -> (Radio<SimSpi, ChipSelect>, SharedChip) {
    let chip = Arc::new(Mutex::new(Chip::new(0x12)));
    let radio = Radio::new(
        SimSpi(Arc::clone(&chip)),
        ChipSelect(Arc::clone(&chip)),
        SimClock::default(),
    );
    (radio, chip)
}

/// Driver on a detected chip, started on 915 MHz with the frame log cleared
pub fn started() -> (SimLoRa, Rig) {
    let (mut lora, rig) = rig(0x12);
    lora.begin(915_000_000, &mut RecordingDelay::default())
        .expect("begin");
    rig.chip().frames.clear();
    (lora, rig)
}

/// Polls `condition` for up to a second
pub fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(1);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(1));
    }
    condition()
}
