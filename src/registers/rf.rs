//! RF-related registers
//!
//! This module contains registers related to the transmitter output stage:
//! - Power amplifier selection and output level
//! - +20 dBm high-power DAC
//! - Over-current protection

use core::convert::Infallible;

use regiface::{register, FromByteArray, ReadableRegister, ToByteArray, WritableRegister};

/// Transmitter output pin
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PaOutput {
    /// RFO pin, up to +14 dBm
    Rfo,
    /// PA_BOOST pin, up to +20 dBm
    #[default]
    PaBoost,
}

/// PA configuration register (address: 0x09)
///
/// # Output Power
/// - RFO: Pout = Pmax - (15 - output_power), Pmax = 10.8 + 0.6 * max_power
/// - PA_BOOST: Pout = 17 - (15 - output_power)
#[register(0x09u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, ReadableRegister, WritableRegister)]
pub struct PaConfig {
    /// Output pin selection (bit 7)
    pub output: PaOutput,
    /// Maximum power selection for RFO (bits 6:4)
    pub max_power: u8,
    /// Output power step (bits 3:0)
    pub output_power: u8,
}

impl PaConfig {
    /// RFO output with the maximum power ceiling
    pub fn rfo(output_power: u8) -> Self {
        Self {
            output: PaOutput::Rfo,
            max_power: 0x07,
            output_power,
        }
    }

    /// PA_BOOST output
    pub fn pa_boost(output_power: u8) -> Self {
        Self {
            output: PaOutput::PaBoost,
            max_power: 0x00,
            output_power,
        }
    }
}

/// High power DAC register (address: 0x4D)
///
/// # Important Notes
/// - `HighPower` is required for +20 dBm on PA_BOOST
/// - Duty cycle must be limited to 1% with `HighPower`
/// - OCP must be raised accordingly
#[register(0x4Du8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ReadableRegister, WritableRegister)]
pub enum PaDac {
    /// Default PA (0x84), +17 dBm maximum on PA_BOOST
    #[default]
    Default,
    /// +20 dBm on PA_BOOST (0x87)
    HighPower,
}

/// Error type for PA DAC values other than the two documented ones
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidPaDac(pub u8);

impl PaDac {
    /// Decodes a raw RegPaDac value
    pub fn from_byte(value: u8) -> Result<Self, InvalidPaDac> {
        match value {
            0x84 => Ok(Self::Default),
            0x87 => Ok(Self::HighPower),
            invalid => Err(InvalidPaDac(invalid)),
        }
    }

    /// Raw RegPaDac value
    pub fn to_byte(self) -> u8 {
        match self {
            Self::Default => 0x84,
            Self::HighPower => 0x87,
        }
    }
}

/// Over-current protection register (address: 0x0B)
///
/// # Current Limit
/// - trim <= 15: Imax = 45 + 5 * trim mA
/// - trim <= 27: Imax = -30 + 10 * trim mA
/// - trim > 27: Imax = 240 mA
#[register(0x0Bu8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, ReadableRegister, WritableRegister)]
pub struct Ocp {
    /// OCP enabled (bit 5)
    pub enabled: bool,
    /// Current limit trim (bits 4:0)
    pub trim: u8,
}

impl Ocp {
    /// Trim setting for a current limit in mA
    pub fn for_milliamps(ma: u8) -> Self {
        let ma = u16::from(ma);
        let trim = if ma <= 120 {
            ma.saturating_sub(45) / 5
        } else if ma <= 240 {
            (ma + 30) / 10
        } else {
            27
        };

        Self {
            enabled: true,
            trim: (trim as u8) & 0x1F,
        }
    }
}

impl Default for Ocp {
    fn default() -> Self {
        Self {
            enabled: true,
            trim: 0x0B,
        }
    }
}

impl FromByteArray for PaConfig {
    type Error = Infallible;
    type Array = [u8; 1];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self {
            output: if bytes[0] & 0x80 != 0 {
                PaOutput::PaBoost
            } else {
                PaOutput::Rfo
            },
            max_power: (bytes[0] >> 4) & 0x07,
            output_power: bytes[0] & 0x0F,
        })
    }
}

impl ToByteArray for PaConfig {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        let select = match self.output {
            PaOutput::Rfo => 0x00,
            PaOutput::PaBoost => 0x80,
        };
        Ok([select | (self.max_power & 0x07) << 4 | (self.output_power & 0x0F)])
    }
}

impl FromByteArray for PaDac {
    type Error = InvalidPaDac;
    type Array = [u8; 1];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Self::from_byte(bytes[0])
    }
}

impl ToByteArray for PaDac {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok([self.to_byte()])
    }
}

impl FromByteArray for Ocp {
    type Error = Infallible;
    type Array = [u8; 1];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self {
            enabled: bytes[0] & 0x20 != 0,
            trim: bytes[0] & 0x1F,
        })
    }
}

impl ToByteArray for Ocp {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok([(self.enabled as u8) << 5 | (self.trim & 0x1F)])
    }
}
