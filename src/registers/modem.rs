//! LoRa modem configuration registers
//!
//! This module contains the registers that define the modulation:
//! - Signal bandwidth, coding rate and header mode (RegModemConfig1)
//! - Spreading factor and payload CRC (RegModemConfig2)
//! - Low data rate optimization and AGC (RegModemConfig3)
//! - IQ inversion (RegInvertIQ)
//!
//! Transmitter and receiver must agree on bandwidth, spreading factor,
//! coding rate (implicit header only), header mode and IQ inversion.

use core::convert::Infallible;

use regiface::{register, FromByteArray, ReadableRegister, ToByteArray, WritableRegister};

/// LoRa signal bandwidth, the ten settings of RegModemConfig1 bits 7:4
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum Bandwidth {
    Bw7_8kHz = 0b0000,
    Bw10_4kHz = 0b0001,
    Bw15_6kHz = 0b0010,
    Bw20_8kHz = 0b0011,
    Bw31_25kHz = 0b0100,
    Bw41_7kHz = 0b0101,
    Bw62_5kHz = 0b0110,
    #[default]
    Bw125kHz = 0b0111,
    Bw250kHz = 0b1000,
    Bw500kHz = 0b1001,
}

/// Error for register bits 7:4 outside the bandwidth table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidBandwidth(pub u8);

impl Bandwidth {
    /// All settings in ascending order
    pub const ALL: [Bandwidth; 10] = [
        Bandwidth::Bw7_8kHz,
        Bandwidth::Bw10_4kHz,
        Bandwidth::Bw15_6kHz,
        Bandwidth::Bw20_8kHz,
        Bandwidth::Bw31_25kHz,
        Bandwidth::Bw41_7kHz,
        Bandwidth::Bw62_5kHz,
        Bandwidth::Bw125kHz,
        Bandwidth::Bw250kHz,
        Bandwidth::Bw500kHz,
    ];

    /// Nominal bandwidth in Hz
    pub fn as_hz(self) -> u32 {
        match self {
            Bandwidth::Bw7_8kHz => 7_800,
            Bandwidth::Bw10_4kHz => 10_400,
            Bandwidth::Bw15_6kHz => 15_600,
            Bandwidth::Bw20_8kHz => 20_800,
            Bandwidth::Bw31_25kHz => 31_250,
            Bandwidth::Bw41_7kHz => 41_700,
            Bandwidth::Bw62_5kHz => 62_500,
            Bandwidth::Bw125kHz => 125_000,
            Bandwidth::Bw250kHz => 250_000,
            Bandwidth::Bw500kHz => 500_000,
        }
    }

    /// Smallest setting that is at least `hz` wide. Requests above 500 kHz
    /// select 500 kHz.
    pub fn from_hz(hz: u32) -> Self {
        Self::ALL
            .into_iter()
            .find(|bw| hz <= bw.as_hz())
            .unwrap_or(Bandwidth::Bw500kHz)
    }

    /// Register encoding (bits 7:4 of RegModemConfig1, unshifted)
    pub fn bits(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for Bandwidth {
    type Error = InvalidBandwidth;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::ALL
            .get(value as usize)
            .copied()
            .ok_or(InvalidBandwidth(value))
    }
}

/// Modem configuration register 1 (address: 0x1D)
///
/// Reset value is 0x72: 125 kHz, 4/5, explicit header.
///
/// # Important Notes
/// - Bits 7:4 are kept raw so a read-modify-write never rejects or rewrites
///   a bandwidth code outside the table; [`ModemConfig1::bandwidth`] decodes them
#[register(0x1Du8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, ReadableRegister, WritableRegister)]
pub struct ModemConfig1 {
    bandwidth: u8,
    /// Coding rate 4/(4 + n) (bits 3:1), 1..=4
    pub coding_rate: u8,
    /// Implicit header mode (bit 0)
    pub implicit_header: bool,
}

impl ModemConfig1 {
    /// Signal bandwidth (bits 7:4)
    pub fn bandwidth(&self) -> Result<Bandwidth, InvalidBandwidth> {
        Bandwidth::try_from(self.bandwidth)
    }

    /// Replaces bits 7:4 with `bandwidth`
    pub fn set_bandwidth(&mut self, bandwidth: Bandwidth) {
        self.bandwidth = bandwidth.bits();
    }
}

impl Default for ModemConfig1 {
    fn default() -> Self {
        Self {
            bandwidth: Bandwidth::Bw125kHz.bits(),
            coding_rate: 1,
            implicit_header: false,
        }
    }
}

/// Modem configuration register 2 (address: 0x1E)
///
/// Reset value is 0x70: SF7, CRC off.
///
/// # Important Notes
/// - SF6 is only usable in implicit header mode
/// - The detection optimize and threshold registers must follow SF6 in and out
#[register(0x1Eu8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, ReadableRegister, WritableRegister)]
pub struct ModemConfig2 {
    /// Spreading factor, 6..=12 (bits 7:4)
    pub spreading_factor: u8,
    /// Continuous TX of FIFO contents (bit 3)
    pub tx_continuous: bool,
    /// CRC generation and check on payload (bit 2)
    pub rx_payload_crc_on: bool,
    /// RX timeout MSB (bits 1:0)
    pub symb_timeout_msb: u8,
}

impl Default for ModemConfig2 {
    fn default() -> Self {
        Self {
            spreading_factor: 7,
            tx_continuous: false,
            rx_payload_crc_on: false,
            symb_timeout_msb: 0,
        }
    }
}

/// Modem configuration register 3 (address: 0x26)
///
/// # Important Notes
/// - Low data rate optimization is mandated when the symbol length exceeds 16 ms
/// - Bits other than 3:2 are reserved and preserved on write
#[register(0x26u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ReadableRegister, WritableRegister)]
pub struct ModemConfig3 {
    /// Low data rate optimization (bit 3)
    pub low_data_rate_optimize: bool,
    /// LNA gain set by the internal AGC loop (bit 2)
    pub agc_auto_on: bool,
    reserved: u8,
}

impl ModemConfig3 {
    /// AGC on, low data rate optimization off, reserved bits cleared (0x04)
    pub fn agc_auto() -> Self {
        Self {
            low_data_rate_optimize: false,
            agc_auto_on: true,
            reserved: 0,
        }
    }
}

/// IQ inversion register (address: 0x33)
///
/// Reset value is 0x27: neither path inverted. Bit 0 is active low
/// (set = TX not inverted).
#[register(0x33u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, ReadableRegister, WritableRegister)]
pub struct InvertIq {
    /// Invert the LoRa I and Q signals in RX (bit 6)
    pub rx_inverted: bool,
    /// Invert the LoRa I and Q signals in TX (bit 0, inverted sense)
    pub tx_inverted: bool,
    reserved: u8,
}

impl Default for InvertIq {
    fn default() -> Self {
        Self {
            rx_inverted: false,
            tx_inverted: false,
            reserved: 0x26,
        }
    }
}

/// RegInvertIQ2 value with IQ inversion enabled
pub const INVERT_IQ_2_ON: u8 = 0x19;
/// RegInvertIQ2 value with IQ inversion disabled
pub const INVERT_IQ_2_OFF: u8 = 0x1D;

impl FromByteArray for ModemConfig1 {
    type Error = Infallible;
    type Array = [u8; 1];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self {
            bandwidth: bytes[0] >> 4,
            coding_rate: (bytes[0] >> 1) & 0x07,
            implicit_header: bytes[0] & 0x01 != 0,
        })
    }
}

impl ToByteArray for ModemConfig1 {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok([(self.bandwidth & 0x0F) << 4
            | (self.coding_rate & 0x07) << 1
            | self.implicit_header as u8])
    }
}

impl FromByteArray for ModemConfig2 {
    type Error = Infallible;
    type Array = [u8; 1];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self {
            spreading_factor: bytes[0] >> 4,
            tx_continuous: bytes[0] & 0x08 != 0,
            rx_payload_crc_on: bytes[0] & 0x04 != 0,
            symb_timeout_msb: bytes[0] & 0x03,
        })
    }
}

impl ToByteArray for ModemConfig2 {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok([(self.spreading_factor & 0x0F) << 4
            | (self.tx_continuous as u8) << 3
            | (self.rx_payload_crc_on as u8) << 2
            | (self.symb_timeout_msb & 0x03)])
    }
}

impl FromByteArray for ModemConfig3 {
    type Error = Infallible;
    type Array = [u8; 1];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self {
            low_data_rate_optimize: bytes[0] & 0x08 != 0,
            agc_auto_on: bytes[0] & 0x04 != 0,
            reserved: bytes[0] & 0xF3,
        })
    }
}

impl ToByteArray for ModemConfig3 {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok([(self.reserved & 0xF3)
            | (self.low_data_rate_optimize as u8) << 3
            | (self.agc_auto_on as u8) << 2])
    }
}

impl FromByteArray for InvertIq {
    type Error = Infallible;
    type Array = [u8; 1];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self {
            rx_inverted: bytes[0] & 0x40 != 0,
            tx_inverted: bytes[0] & 0x01 == 0,
            reserved: bytes[0] & 0xBE,
        })
    }
}

impl ToByteArray for InvertIq {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok([(self.reserved & 0xBE) | (self.rx_inverted as u8) << 6 | !self.tx_inverted as u8])
    }
}
