//! Register definitions for the SX1276 in LoRa mode
//! Generated from the SX1276/77/78/79 datasheet, rev. 7
//!
//! Registers whose bits carry more than one setting have typed wrappers
//! implementing the `regiface` register traits; a read-modify-write through a
//! typed wrapper preserves every bit the wrapper does not name. Registers that
//! hold a single plain byte are accessed by address through [`addr`].

mod dio;
mod modem;
mod packet;
mod rf;
mod system;

pub use dio::*;
pub use modem::*;
pub use packet::*;
pub use rf::*;
pub use system::*;

/// Value of RegVersion on SX1276/77/78/79 silicon
pub const CHIP_VERSION: u8 = 0x12;

/// Size of the FIFO length field: packets never exceed 255 bytes
pub const MAX_PACKET_LENGTH: usize = 255;

/// Addresses of plain byte registers (LoRa register bank)
pub mod addr {
    pub const FIFO: u8 = 0x00;
    pub const OP_MODE: u8 = 0x01;
    pub const FRF_MSB: u8 = 0x06;
    pub const FRF_MID: u8 = 0x07;
    pub const FRF_LSB: u8 = 0x08;
    pub const PA_CONFIG: u8 = 0x09;
    pub const OCP: u8 = 0x0b;
    pub const LNA: u8 = 0x0c;
    pub const FIFO_ADDR_PTR: u8 = 0x0d;
    pub const FIFO_TX_BASE_ADDR: u8 = 0x0e;
    pub const FIFO_RX_BASE_ADDR: u8 = 0x0f;
    pub const FIFO_RX_CURRENT_ADDR: u8 = 0x10;
    pub const IRQ_FLAGS: u8 = 0x12;
    pub const RX_NB_BYTES: u8 = 0x13;
    pub const PKT_SNR_VALUE: u8 = 0x19;
    pub const PKT_RSSI_VALUE: u8 = 0x1a;
    pub const RSSI_VALUE: u8 = 0x1b;
    pub const MODEM_CONFIG_1: u8 = 0x1d;
    pub const MODEM_CONFIG_2: u8 = 0x1e;
    pub const PREAMBLE_MSB: u8 = 0x20;
    pub const PREAMBLE_LSB: u8 = 0x21;
    pub const PAYLOAD_LENGTH: u8 = 0x22;
    pub const MODEM_CONFIG_3: u8 = 0x26;
    pub const FREQ_ERROR_MSB: u8 = 0x28;
    pub const FREQ_ERROR_MID: u8 = 0x29;
    pub const FREQ_ERROR_LSB: u8 = 0x2a;
    pub const RSSI_WIDEBAND: u8 = 0x2c;
    pub const DETECTION_OPTIMIZE: u8 = 0x31;
    pub const INVERT_IQ: u8 = 0x33;
    pub const DETECTION_THRESHOLD: u8 = 0x37;
    pub const SYNC_WORD: u8 = 0x39;
    pub const INVERT_IQ_2: u8 = 0x3b;
    pub const DIO_MAPPING_1: u8 = 0x40;
    pub const VERSION: u8 = 0x42;
    pub const PA_DAC: u8 = 0x4d;
}
