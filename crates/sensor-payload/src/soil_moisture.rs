//! LSE01 soil moisture, temperature and conductivity probe.
//!
//! Fixed 10-byte uplink of big-endian words:
//!
//! | bytes | channel                         |
//! |-------|---------------------------------|
//! | 0..2  | battery (lower 14 bits, mV)     |
//! | 2..4  | DS18B20 temperature (0.1 °C)    |
//! | 4..6  | soil moisture (0.01 %)          |
//! | 6..8  | soil temperature (0.01 °C)      |
//! | 8..10 | soil conductivity (0.01 uS/cm)  |

use crate::frame::{ensure_len, read_i16_be, read_u16_be};
use crate::measurement::{MeasurementSet, OutputMode};
use crate::{PayloadDecoder, Result};

pub const FRAME_SIZE: usize = 10;

const BATTERY_MASK: u16 = 0x3FFF;
const SOIL_TEMP_SIGN_FLAG: u16 = 0x8000;

pub const KEY_BATTERY: &str = "battery voltage (V)";
pub const KEY_SOIL_MOISTURE: &str = "soil moisture (%)";
pub const KEY_SOIL_TEMP_C: &str = "soil temperature (C)";
pub const KEY_SOIL_TEMP_F: &str = "soil temperature (F)";
pub const KEY_SOIL_CONDUCTIVITY: &str = "soil conductivity (uS/cm)";
pub const KEY_DS18B20_TEMP_C: &str = "DS18B20 temperature (C)";

#[derive(Debug, Clone, PartialEq)]
pub struct SoilMoistureReading {
    pub battery_v: f64,
    pub ds18b20_temp_c: f64,
    pub soil_moisture_pct: f64,
    pub soil_temp_c: f64,
    pub soil_temp_f: f64,
    pub soil_conductivity_us_cm: f64,
}

impl SoilMoistureReading {
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        ensure_len(bytes, FRAME_SIZE)?;

        let soil_temp_c = soil_temperature_c(read_u16_be(bytes, 6));

        Ok(Self {
            battery_v: f64::from(read_u16_be(bytes, 0) & BATTERY_MASK) / 1000.0,
            ds18b20_temp_c: f64::from(read_i16_be(bytes, 2)) / 10.0,
            soil_moisture_pct: f64::from(read_u16_be(bytes, 4)) / 100.0,
            soil_temp_c,
            soil_temp_f: (9.0 / 5.0) * soil_temp_c + 32.0,
            soil_conductivity_us_cm: f64::from(read_u16_be(bytes, 8)) / 100.0,
        })
    }

    pub fn measurements(&self, mode: OutputMode) -> MeasurementSet {
        let set = MeasurementSet::new()
            .float(KEY_BATTERY, self.battery_v)
            .float(KEY_SOIL_MOISTURE, self.soil_moisture_pct)
            .float(KEY_SOIL_TEMP_C, self.soil_temp_c)
            .float(KEY_SOIL_TEMP_F, self.soil_temp_f)
            .float(KEY_SOIL_CONDUCTIVITY, self.soil_conductivity_us_cm);

        match mode {
            OutputMode::Standard => set,
            OutputMode::Extended => set.float(KEY_DS18B20_TEMP_C, self.ds18b20_temp_c),
        }
    }
}

/// Soil temperature in °C from its raw word.
///
/// Bit 15 is a sign flag and negative readings are offset from 0xFFFF, so 0xFFFF
/// reads as 0.00 °C rather than the two's complement -0.01 °C. Devices in the field
/// report this encoding.
pub fn soil_temperature_c(raw: u16) -> f64 {
    if raw & SOIL_TEMP_SIGN_FLAG == 0 {
        f64::from(raw) / 100.0
    } else {
        f64::from(i32::from(raw) - 0xFFFF) / 100.0
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SoilMoistureDecoder {
    mode: OutputMode,
}

impl SoilMoistureDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mode(mode: OutputMode) -> Self {
        Self { mode }
    }
}

impl PayloadDecoder for SoilMoistureDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<MeasurementSet> {
        Ok(SoilMoistureReading::parse(bytes)?.measurements(self.mode))
    }
}
