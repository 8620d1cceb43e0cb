//! Signal quality and channel diagnostics

use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiBus;

use super::Radio;
use crate::registers::addr;
use crate::Error;

/// RSSI offset on the high-frequency port (Band 1)
const RSSI_OFFSET_HF: i16 = 157;
/// RSSI offset on the low-frequency port (Bands 2 and 3)
const RSSI_OFFSET_LF: i16 = 164;

impl<SPI, CS> Radio<SPI, CS>
where
    SPI: SpiBus<u8>,
    CS: OutputPin,
{
    /// RSSI of the last packet in dBm
    pub fn packet_rssi(&mut self) -> Result<i16, Error> {
        let raw = i16::from(self.device.read(addr::PKT_RSSI_VALUE)?);
        let offset = if self.state.frequency < 868_000_000 {
            RSSI_OFFSET_LF
        } else {
            RSSI_OFFSET_HF
        };
        Ok(raw - offset)
    }

    /// Current RSSI of the channel in dBm
    pub fn rssi(&mut self) -> Result<i16, Error> {
        let raw = i16::from(self.device.read(addr::RSSI_VALUE)?);
        let offset = if self.state.frequency > 525_000_000 {
            RSSI_OFFSET_HF
        } else {
            RSSI_OFFSET_LF
        };
        Ok(raw - offset)
    }

    /// SNR of the last packet in dB
    pub fn packet_snr(&mut self) -> Result<f32, Error> {
        let raw = self.device.read(addr::PKT_SNR_VALUE)? as i8;
        Ok(f32::from(raw) * 0.25)
    }

    /// Frequency offset of the last packet in Hz, from the modem's estimator
    pub fn packet_frequency_error(&mut self) -> Result<i64, Error> {
        let msb = self.device.read(addr::FREQ_ERROR_MSB)?;
        let mid = self.device.read(addr::FREQ_ERROR_MID)?;
        let lsb = self.device.read(addr::FREQ_ERROR_LSB)?;

        // 20-bit two's complement, sign in bit 3 of the MSB
        let mut fei = i32::from(msb & 0x07) << 16 | i32::from(mid) << 8 | i32::from(lsb);
        if msb & 0x08 != 0 {
            fei -= 1 << 19;
        }

        let bandwidth = f64::from(self.signal_bandwidth()?);
        let error = f64::from(fei) * f64::from(1u32 << 24) / 32e6 * (bandwidth / 500_000.0);
        Ok(error as i64)
    }

    /// Samples the channel RSSI for up to `max_sense_ms`.
    ///
    /// Returns true as soon as a sample exceeds `threshold_dbm`.
    pub fn channel_active(&mut self, threshold_dbm: i16, max_sense_ms: u32) -> Result<bool, Error> {
        let started = self.clock.elapsed_ms();
        while self.clock.elapsed_ms().saturating_sub(started) < u64::from(max_sense_ms) {
            if self.rssi()? > threshold_dbm {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// A random byte sampled from the wideband RSSI
    pub fn random(&mut self) -> Result<u8, Error> {
        self.device.read(addr::RSSI_WIDEBAND)
    }
}
