//! Packet handling related registers
//!
//! The LoRa modem reports packet events through RegIrqFlags. Each flag stays
//! set until it is cleared by writing a 1 to its position, so the usual
//! sequence is: read the register, write the observed value back, act on it.

use core::convert::Infallible;

use bitflags::bitflags;
use regiface::{register, FromByteArray, ReadableRegister, ToByteArray, WritableRegister};

bitflags! {
    /// LoRa interrupt flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct IrqFlags: u8 {
        /// RX single mode timed out
        const RX_TIMEOUT = 1 << 7;
        /// A packet has been received
        const RX_DONE = 1 << 6;
        /// The received payload failed its CRC check
        const PAYLOAD_CRC_ERROR = 1 << 5;
        /// A valid header has been received in explicit header mode
        const VALID_HEADER = 1 << 4;
        /// The FIFO payload has been transmitted
        const TX_DONE = 1 << 3;
        /// Channel activity detection finished
        const CAD_DONE = 1 << 2;
        /// FHSS channel change request
        const FHSS_CHANGE_CHANNEL = 1 << 1;
        /// Channel activity detected during CAD
        const CAD_DETECTED = 1;
    }
}

impl IrqFlags {
    /// A packet arrived intact
    pub fn packet_received(self) -> bool {
        self.contains(Self::RX_DONE) && !self.contains(Self::PAYLOAD_CRC_ERROR)
    }
}

/// IRQ flags register (address: 0x12)
///
/// Writing a flag clears it; flags written as 0 are left untouched.
#[register(0x12u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ReadableRegister, WritableRegister)]
pub struct IrqStatus {
    pub flags: IrqFlags,
}

impl IrqStatus {
    /// Register value that clears exactly `flags`
    pub fn clear(flags: IrqFlags) -> Self {
        Self { flags }
    }
}

impl FromByteArray for IrqStatus {
    type Error = Infallible;
    type Array = [u8; 1];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self {
            flags: IrqFlags::from_bits_retain(bytes[0]),
        })
    }
}

impl ToByteArray for IrqStatus {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok([self.flags.bits()])
    }
}
