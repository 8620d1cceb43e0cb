//! Operating mode and front-end registers
//!
//! This module contains the registers that select the chip's state machine
//! state and the low-noise amplifier configuration.

use core::convert::Infallible;

use regiface::{register, FromByteArray, ReadableRegister, ToByteArray, WritableRegister};

/// Transceiver states selectable through RegOpMode bits 2:0
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RadioMode {
    /// Lowest power state, FIFO not accessible
    #[default]
    Sleep = 0x00,
    /// Crystal oscillator running, configuration state
    Standby = 0x01,
    /// Frequency synthesis for TX
    FsTx = 0x02,
    /// Transmitting the FIFO contents
    Tx = 0x03,
    /// Frequency synthesis for RX
    FsRx = 0x04,
    /// Receiving until told otherwise
    RxContinuous = 0x05,
    /// Receiving a single packet, then back to standby
    RxSingle = 0x06,
    /// Channel activity detection
    Cad = 0x07,
}

impl RadioMode {
    /// Decodes the three mode bits; upper bits are ignored
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0x07 {
            0x00 => Self::Sleep,
            0x01 => Self::Standby,
            0x02 => Self::FsTx,
            0x03 => Self::Tx,
            0x04 => Self::FsRx,
            0x05 => Self::RxContinuous,
            0x06 => Self::RxSingle,
            _ => Self::Cad,
        }
    }
}

/// Operating mode register (address: 0x01)
///
/// # Important Notes
/// - `long_range_mode` can only be changed while in sleep
/// - Writing clears AccessSharedReg, so the LoRa register bank stays mapped
/// - LowFrequencyModeOn is cleared, selecting the high-frequency register bank
#[register(0x01u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, ReadableRegister, WritableRegister)]
pub struct OpMode {
    /// LoRa modem selected (bit 7). FSK/OOK when false
    pub long_range_mode: bool,
    /// Transceiver state (bits 2:0)
    pub mode: RadioMode,
}

impl OpMode {
    /// LoRa modem in the given state
    pub fn lora(mode: RadioMode) -> Self {
        Self {
            long_range_mode: true,
            mode,
        }
    }
}

/// LNA settings register (address: 0x0C)
///
/// Reset value is 0x20: maximum gain, no boost.
#[register(0x0Cu8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, ReadableRegister, WritableRegister)]
pub struct Lna {
    /// LNA gain setting (bits 7:5). 0b001 = G1 (highest gain)
    pub gain: u8,
    /// Low frequency band boost (bits 4:3)
    pub boost_lf: u8,
    /// High frequency band boost (bits 1:0). 0b11 = boost on, 150% LNA current
    pub boost_hf: u8,
}

impl Default for Lna {
    fn default() -> Self {
        Self {
            gain: 0b001,
            boost_lf: 0b00,
            boost_hf: 0b00,
        }
    }
}

impl FromByteArray for OpMode {
    type Error = Infallible;
    type Array = [u8; 1];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self {
            long_range_mode: bytes[0] & 0x80 != 0,
            mode: RadioMode::from_bits(bytes[0]),
        })
    }
}

impl ToByteArray for OpMode {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok([(self.long_range_mode as u8) << 7 | self.mode as u8])
    }
}

impl FromByteArray for Lna {
    type Error = Infallible;
    type Array = [u8; 1];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self {
            gain: bytes[0] >> 5,
            boost_lf: (bytes[0] >> 3) & 0x03,
            boost_hf: bytes[0] & 0x03,
        })
    }
}

impl ToByteArray for Lna {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok([(self.gain & 0x07) << 5 | (self.boost_lf & 0x03) << 3 | (self.boost_hf & 0x03)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn op_mode_encodes_lora_bit_and_mode() {
        assert_eq!(OpMode::lora(RadioMode::Standby).to_bytes().unwrap(), [0x81]);
        assert_eq!(OpMode::lora(RadioMode::RxSingle).to_bytes().unwrap(), [0x86]);
        assert_eq!(OpMode::lora(RadioMode::Sleep).to_bytes().unwrap(), [0x80]);

        let decoded = OpMode::from_bytes([0x8B]).unwrap();
        assert!(decoded.long_range_mode);
        assert_eq!(decoded.mode, RadioMode::Tx);
    }

    #[test]
    fn lna_boost_preserves_gain() {
        let mut lna = Lna::from_bytes([0x20]).unwrap();
        assert_eq!(lna, Lna::default());
        lna.boost_hf = 0b11;
        assert_eq!(lna.to_bytes().unwrap(), [0x23]);
    }
}
