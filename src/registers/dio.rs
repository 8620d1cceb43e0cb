//! Digital I/O mapping registers
//!
//! The SX1276 routes internal events to its DIO pins through RegDioMapping1
//! and RegDioMapping2. The driver only uses DIO0, whose meaning in LoRa mode
//! is selected by bits 7:6 of RegDioMapping1.

use core::convert::Infallible;

use regiface::{register, FromByteArray, ReadableRegister, ToByteArray, WritableRegister};

/// Event signalled on DIO0 in LoRa mode
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dio0Mapping {
    #[default]
    RxDone = 0b00,
    TxDone = 0b01,
    CadDone = 0b10,
    None = 0b11,
}

impl Dio0Mapping {
    fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0b00 => Self::RxDone,
            0b01 => Self::TxDone,
            0b10 => Self::CadDone,
            _ => Self::None,
        }
    }
}

/// DIO mapping register 1 (address: 0x40)
///
/// Mappings of DIO1..DIO3 (bits 5:0) are preserved on write.
#[register(0x40u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ReadableRegister, WritableRegister)]
pub struct DioMapping1 {
    /// DIO0 function (bits 7:6)
    pub dio0: Dio0Mapping,
    others: u8,
}

impl FromByteArray for DioMapping1 {
    type Error = Infallible;
    type Array = [u8; 1];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self {
            dio0: Dio0Mapping::from_bits(bytes[0] >> 6),
            others: bytes[0] & 0x3F,
        })
    }
}

impl ToByteArray for DioMapping1 {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok([(self.dio0 as u8) << 6 | (self.others & 0x3F)])
    }
}
