//! Startup configuration
//!
//! [`LoRaConfig`] collects the modulation and output settings applied by
//! [`LoRa::begin_with`](crate::LoRa::begin_with). Every value is passed through
//! the same setter the application would call later, so out-of-range values
//! are clamped rather than rejected.
//!
//! With the `serde` feature the configuration can be loaded from JSON/TOML:
//! ```json
//! {
//!   "frequency": 868100000,
//!   "tx_power": 14,
//!   "pa_output": "PaBoost",
//!   "spreading_factor": 9,
//!   "bandwidth": 125000,
//!   "coding_rate": 5,
//!   "preamble_length": 8,
//!   "sync_word": 52,
//!   "crc": true,
//!   "invert_iq": false
//! }
//! ```

use crate::registers::PaOutput;

/// Radio settings applied at startup
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, PartialEq)]
pub struct LoRaConfig {
    /// Carrier frequency in Hz
    pub frequency: u32,
    /// Output power in dBm
    pub tx_power: u8,
    /// Output pin the power setting applies to
    pub pa_output: PaOutput,
    /// Spreading factor, clamped to 6..=12
    pub spreading_factor: u8,
    /// Requested bandwidth in Hz, rounded up to the next supported setting
    pub bandwidth: u32,
    /// Coding rate denominator (4/x), clamped to 5..=8
    pub coding_rate: u8,
    /// Preamble length in symbols
    pub preamble_length: u16,
    /// Sync word. 0x12 = private networks, 0x34 = LoRaWAN public
    pub sync_word: u8,
    /// Payload CRC
    pub crc: bool,
    /// IQ inversion
    pub invert_iq: bool,
}

impl LoRaConfig {
    /// Default settings on the given carrier frequency
    pub fn with_frequency(frequency: u32) -> Self {
        Self {
            frequency,
            ..Self::default()
        }
    }
}

impl Default for LoRaConfig {
    fn default() -> Self {
        Self {
            frequency: 915_000_000,
            tx_power: 17,
            pa_output: PaOutput::PaBoost,
            spreading_factor: 7,
            bandwidth: 125_000,
            coding_rate: 5,
            preamble_length: 8,
            sync_word: 0x12,
            crc: false,
            invert_iq: false,
        }
    }
}
