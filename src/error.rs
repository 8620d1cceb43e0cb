//! Driver error type
//!
//! Every fallible operation in the crate returns [`Error`]. Conditions that the
//! radio reports as "nothing to do" (an empty FIFO, no packet ready yet) are not
//! errors and are signalled through `Option`/zero return values instead.

use embedded_hal::{digital, spi};
use thiserror::Error;

/// Errors returned by the SX1276 driver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Error {
    /// The SPI bus reported a failure during a register exchange
    #[error("SPI transfer failed: {0:?}")]
    Spi(spi::ErrorKind),

    /// A reset, chip-select or interrupt line could not be driven
    #[error("GPIO operation failed: {0:?}")]
    Pin(digital::ErrorKind),

    /// The version register did not identify an SX1276 family chip
    #[error("unexpected chip version {0:#04x}, expected 0x12")]
    VersionMismatch(u8),

    /// A packet is still being transmitted
    #[error("radio is busy transmitting")]
    Transmitting,

    /// TX-done was not observed within the requested bound
    #[error("timed out waiting for TX done")]
    Timeout,

    /// A register held a value that has no typed representation
    #[error("register {address:#04x} holds undecodable value {value:#04x}")]
    InvalidRegister {
        /// Register address
        address: u8,
        /// Raw value read back from the chip
        value: u8,
    },

    /// Interrupt dispatch requires a successful `begin` first
    #[error("radio has not been started")]
    NotStarted,

    /// The dispatch worker still holds a reference to the radio
    #[error("dispatch worker is still running")]
    WorkerAlive,

    /// The dispatch worker thread could not be created
    #[error("failed to start dispatch worker")]
    WorkerSpawn,
}

impl Error {
    pub(crate) fn spi<E: spi::Error>(err: E) -> Self {
        Self::Spi(err.kind())
    }

    pub(crate) fn pin<E: digital::Error>(err: E) -> Self {
        Self::Pin(err.kind())
    }
}
