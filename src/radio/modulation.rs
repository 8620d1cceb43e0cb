//! Modulation and output configuration
//!
//! Setters clamp out-of-range requests into the supported range instead of
//! failing. Each setter updates [`ChipState`] alongside the register so
//! airtime and RSSI offsets stay computable without touching the bus.
//!
//! Spreading factor and bandwidth together decide whether low data rate
//! optimization is required; changing either recomputes the LDO bit from the
//! values read back from the chip.

use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiBus;
use log::debug;

use super::{ChipState, Radio};
use crate::registers::{
    addr, Bandwidth, InvertIq, ModemConfig1, ModemConfig2, ModemConfig3, Ocp, PaConfig, PaDac,
    PaOutput, INVERT_IQ_2_OFF, INVERT_IQ_2_ON,
};
use crate::{Error, LoRaConfig};

/// Crystal oscillator frequency
const FXOSC: u64 = 32_000_000;

/// Symbol duration above which low data rate optimization is mandated
const LDO_SYMBOL_MS: u32 = 16;

/// Frequency word for a carrier in Hz: `frf = hz * 2^19 / FXOSC`
pub fn frf_from_hz(hz: u32) -> u32 {
    ((u64::from(hz) << 19) / FXOSC) as u32
}

/// Carrier frequency in Hz programmed by a frequency word
pub fn hz_from_frf(frf: u32) -> u32 {
    ((u64::from(frf) * FXOSC) >> 19) as u32
}

/// Whether a symbol at this spreading factor and bandwidth lasts longer than 16 ms.
///
/// Symbol rate and duration are truncated to whole numbers before comparing.
pub fn ldo_required(spreading_factor: u8, bandwidth: Bandwidth) -> bool {
    let symbol_rate = (bandwidth.as_hz() >> spreading_factor.min(12)).max(1);
    1000 / symbol_rate > LDO_SYMBOL_MS
}

/// Predicted time on air in milliseconds for a payload of `payload_len` bytes.
///
/// Assumes an explicit header and leaves the low data rate term of the
/// payload symbol count at zero, whatever the LDO bit currently says. At
/// SF11/SF12 on narrow bandwidths the chip's real airtime is therefore longer.
pub fn time_on_air_ms(state: &ChipState, payload_len: usize) -> u32 {
    let sf = i64::from(state.spreading_factor);
    let symbol_rate = state.bandwidth.as_hz() as f32 / (1u32 << state.spreading_factor) as f32;
    let symbol_period = 1.0 / symbol_rate;

    let preamble = (f32::from(state.preamble_length) + 4.25) * symbol_period;

    let bits = 8 * payload_len as i64 - 4 * sf + 28 + 16 * i64::from(state.crc_enabled);
    let payload_symbols =
        (bits as f32 / (4 * sf) as f32).ceil().max(0.0) * f32::from(state.coding_rate_denominator());
    let payload = payload_symbols * symbol_period;

    ((preamble + payload) * 1000.0).floor() as u32
}

impl<SPI, CS> Radio<SPI, CS>
where
    SPI: SpiBus<u8>,
    CS: OutputPin,
{
    /// Applies the modulation part of a startup configuration
    pub fn configure(&mut self, config: &LoRaConfig) -> Result<(), Error> {
        self.set_spreading_factor(config.spreading_factor)?;
        self.set_signal_bandwidth(config.bandwidth)?;
        self.set_coding_rate(config.coding_rate)?;
        self.set_preamble_length(config.preamble_length)?;
        self.set_sync_word(config.sync_word)?;
        self.enable_crc(config.crc)?;
        self.enable_invert_iq(config.invert_iq)
    }

    /// Programs the carrier frequency and returns the frequency actually
    /// synthesized after quantization.
    pub fn set_frequency(&mut self, hz: u32) -> Result<u32, Error> {
        let frf = frf_from_hz(hz);
        let [_, msb, mid, lsb] = frf.to_be_bytes();

        self.device.write(addr::FRF_MSB, msb)?;
        self.device.write(addr::FRF_MID, mid)?;
        self.device.write(addr::FRF_LSB, lsb)?;

        self.state.frequency = hz;
        debug!("frequency {} Hz (frf {:#08x})", hz, frf);
        Ok(hz_from_frf(frf))
    }

    /// Carrier frequency read back from the frequency registers
    pub fn frequency(&mut self) -> Result<u32, Error> {
        let msb = self.device.read(addr::FRF_MSB)?;
        let mid = self.device.read(addr::FRF_MID)?;
        let lsb = self.device.read(addr::FRF_LSB)?;
        Ok(hz_from_frf(u32::from_be_bytes([0, msb, mid, lsb])))
    }

    /// Sets the spreading factor, clamped to 6..=12.
    ///
    /// SF6 needs its own detection settings, which are swapped in and out here.
    pub fn set_spreading_factor(&mut self, sf: u8) -> Result<(), Error> {
        let sf = sf.clamp(6, 12);

        let (optimize, threshold) = if sf == 6 { (0xC5, 0x0C) } else { (0xC3, 0x0A) };
        self.device.write(addr::DETECTION_OPTIMIZE, optimize)?;
        self.device.write(addr::DETECTION_THRESHOLD, threshold)?;

        self.device
            .modify_register(|cfg: &mut ModemConfig2| cfg.spreading_factor = sf)?;
        self.state.spreading_factor = sf;
        debug!("spreading factor {}", sf);

        self.set_ldo_flag()
    }

    /// Spreading factor read back from RegModemConfig2
    pub fn spreading_factor(&mut self) -> Result<u8, Error> {
        let cfg: ModemConfig2 = self.device.read_register()?;
        Ok(cfg.spreading_factor)
    }

    /// Selects the narrowest bandwidth at least `hz` wide (500 kHz above the table).
    pub fn set_signal_bandwidth(&mut self, hz: u32) -> Result<Bandwidth, Error> {
        let bandwidth = Bandwidth::from_hz(hz);

        self.device
            .modify_register(|cfg: &mut ModemConfig1| cfg.set_bandwidth(bandwidth))?;
        self.state.bandwidth = bandwidth;
        debug!("bandwidth {} Hz (requested {})", bandwidth.as_hz(), hz);

        self.set_ldo_flag()?;
        Ok(bandwidth)
    }

    /// Signal bandwidth in Hz read back from RegModemConfig1
    ///
    /// # Errors
    /// * `Error::InvalidRegister` - bits 7:4 hold a code outside the bandwidth table
    pub fn signal_bandwidth(&mut self) -> Result<u32, Error> {
        let raw = self.device.read(addr::MODEM_CONFIG_1)?;
        Bandwidth::try_from(raw >> 4)
            .map(Bandwidth::as_hz)
            .map_err(|_| Error::InvalidRegister {
                address: addr::MODEM_CONFIG_1,
                value: raw,
            })
    }

    /// Recomputes the low data rate optimization bit from the spreading
    /// factor and bandwidth currently programmed in the chip.
    ///
    /// An unknown bandwidth code turns the optimization off.
    pub fn set_ldo_flag(&mut self) -> Result<(), Error> {
        let sf = self.spreading_factor()?;
        let cfg: ModemConfig1 = self.device.read_register()?;
        let ldo = cfg.bandwidth().is_ok_and(|bw| ldo_required(sf, bw));

        self.device
            .modify_register(|cfg: &mut ModemConfig3| cfg.low_data_rate_optimize = ldo)?;
        debug!("low data rate optimize {}", if ldo { "on" } else { "off" });
        Ok(())
    }

    /// Sets the coding rate 4/`denominator`, clamped to 4/5..=4/8.
    pub fn set_coding_rate(&mut self, denominator: u8) -> Result<(), Error> {
        let cr = denominator.clamp(5, 8) - 4;

        self.device
            .modify_register(|cfg: &mut ModemConfig1| cfg.coding_rate = cr)?;
        self.state.coding_rate = cr;
        Ok(())
    }

    /// Coding rate denominator read back from RegModemConfig1
    pub fn coding_rate(&mut self) -> Result<u8, Error> {
        let cfg: ModemConfig1 = self.device.read_register()?;
        Ok(cfg.coding_rate + 4)
    }

    /// Sets the preamble length in symbols, excluding the fixed 4.25 symbol tail
    pub fn set_preamble_length(&mut self, symbols: u16) -> Result<(), Error> {
        let [msb, lsb] = symbols.to_be_bytes();
        self.device.write(addr::PREAMBLE_MSB, msb)?;
        self.device.write(addr::PREAMBLE_LSB, lsb)?;
        self.state.preamble_length = symbols;
        Ok(())
    }

    /// Preamble length read back from the preamble registers
    pub fn preamble_length(&mut self) -> Result<u16, Error> {
        let msb = self.device.read(addr::PREAMBLE_MSB)?;
        let lsb = self.device.read(addr::PREAMBLE_LSB)?;
        Ok(u16::from_be_bytes([msb, lsb]))
    }

    /// Sets the sync word; 0x34 is reserved for LoRaWAN public networks
    pub fn set_sync_word(&mut self, sync_word: u8) -> Result<(), Error> {
        self.device.write(addr::SYNC_WORD, sync_word)
    }

    /// Enables or disables payload CRC generation and checking
    pub fn enable_crc(&mut self, enable: bool) -> Result<(), Error> {
        self.device
            .modify_register(|cfg: &mut ModemConfig2| cfg.rx_payload_crc_on = enable)?;
        self.state.crc_enabled = enable;
        Ok(())
    }

    /// Inverts I and Q on both paths, as used for gateway downlinks
    pub fn enable_invert_iq(&mut self, enable: bool) -> Result<(), Error> {
        self.device.modify_register(|iq: &mut InvertIq| {
            iq.rx_inverted = enable;
            iq.tx_inverted = enable;
        })?;
        self.device.write(
            addr::INVERT_IQ_2,
            if enable { INVERT_IQ_2_ON } else { INVERT_IQ_2_OFF },
        )
    }

    /// Sets the output power in dBm on the given pin.
    ///
    /// # Ranges
    /// - RFO: up to 14 dBm
    /// - PA_BOOST: 2 to 17 dBm, 18 to 20 dBm with the high power DAC
    ///
    /// Requests outside the range are clamped. The over-current limit follows
    /// the PA_BOOST setting (100 mA, 140 mA on high power).
    pub fn set_tx_power(&mut self, level: u8, output: PaOutput) -> Result<(), Error> {
        match output {
            PaOutput::Rfo => {
                let level = level.min(14);
                self.device.write_register(PaConfig::rfo(level))?;
                debug!("tx power {} dBm on RFO", level);
            }
            PaOutput::PaBoost => {
                let level = if level > 17 {
                    self.device.write_register(PaDac::HighPower)?;
                    self.set_ocp(140)?;
                    level.min(20) - 3
                } else {
                    self.device.write_register(PaDac::Default)?;
                    self.set_ocp(100)?;
                    level.max(2)
                };
                self.device.write_register(PaConfig::pa_boost(level - 2))?;
                debug!("tx power step {} on PA_BOOST", level - 2);
            }
        }
        Ok(())
    }

    /// Enables over-current protection with a limit in mA
    pub fn set_ocp(&mut self, milliamps: u8) -> Result<(), Error> {
        self.device.write_register(Ocp::for_milliamps(milliamps))
    }

    /// Predicted airtime of a packet under the current configuration
    pub fn time_on_air(&self, payload_len: usize) -> u32 {
        time_on_air_ms(&self.state, payload_len)
    }
}
