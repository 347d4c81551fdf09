//! PS-LB water level / pressure probe.
//!
//! The probe reports over three LoRaWAN ports, each with its own frame layout:
//! port 2 carries the instantaneous 4-20 mA loop reading, port 7 a burst of
//! datalog records and port 5 the device descriptor.

use crate::frame::{ensure_len, read_u16_be};
use crate::measurement::{MeasurementSet, MeasurementValue, OutputMode};
use crate::{PayloadDecoder, PayloadError, Result};

pub const PORT_INSTANTANEOUS: u8 = 2;
pub const PORT_DEVICE_INFO: u8 = 5;
pub const PORT_DATALOG: u8 = 7;

pub const INSTANTANEOUS_FRAME_SIZE: usize = 9;
pub const DEVICE_INFO_FRAME_SIZE: usize = 8;
pub const DATALOG_HEADER_SIZE: usize = 2;
pub const DATALOG_RECORD_SIZE: usize = 11;

// Loop current calibration points (mA)
const LOOP_ZERO_MA: f64 = 4.0;
const LOOP_SPAN_MA: f64 = 16.0;
const DEPTH_THRESHOLD_MA: f64 = 4.1;
const RANGE_9_SPLIT_MA: f64 = 12.0;

const PS_LB_MODEL_ID: u8 = 0x16;
const SUB_BAND_UNSET: u8 = 0xFF;
const NULL_LABEL: &str = "NULL";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeMode {
    Depth,
    Pressure,
    Other(u8),
}

impl From<u8> for ProbeMode {
    fn from(value: u8) -> Self {
        match value {
            0x00 => ProbeMode::Depth,
            0x01 => ProbeMode::Pressure,
            other => ProbeMode::Other(other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinLevel {
    High,
    Low,
}

impl PinLevel {
    fn from_bit(byte: u8, mask: u8) -> Self {
        if byte & mask != 0 {
            PinLevel::High
        } else {
            PinLevel::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PinLevel::High => "High",
            PinLevel::Low => "Low",
        }
    }
}

/// Digital input states packed into the low nibble of byte 8
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DigitalInputs {
    pub in1: PinLevel,
    pub in2: PinLevel,
    pub ext_trigger_level: PinLevel,
    pub ext_triggered: bool,
}

impl From<u8> for DigitalInputs {
    fn from(byte: u8) -> Self {
        Self {
            in1: PinLevel::from_bit(byte, 0x08),
            in2: PinLevel::from_bit(byte, 0x04),
            ext_trigger_level: PinLevel::from_bit(byte, 0x02),
            ext_triggered: byte & 0x01 != 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WaterDepth {
    /// Loop current at or below the 4.1 mA dead band
    Dry,
    Centimetres(f64),
}

impl WaterDepth {
    pub fn cm(&self) -> f64 {
        match self {
            WaterDepth::Dry => 0.0,
            WaterDepth::Centimetres(cm) => *cm,
        }
    }

    fn to_value(self) -> MeasurementValue {
        match self {
            WaterDepth::Dry => MeasurementValue::Integer(0),
            WaterDepth::Centimetres(cm) => MeasurementValue::Float(cm),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Pressure {
    MegaPascal(f64),
    KiloPascal(f64),
}

/// Water depth for a depth probe of the given length.
///
/// The 4-20 mA loop spans the full probe length; readings at or below 4.1 mA are
/// treated as no water.
pub fn water_depth(idc_input_ma: f64, probe_length_m: f64) -> WaterDepth {
    if idc_input_ma <= DEPTH_THRESHOLD_MA {
        WaterDepth::Dry
    } else {
        WaterDepth::Centimetres(
            (idc_input_ma - LOOP_ZERO_MA) * (probe_length_m * 100.0 / LOOP_SPAN_MA),
        )
    }
}

/// Pressure for a pressure probe whose measuring range is selected by `range`.
///
/// Ranges 1-9 truncate the loop current offset to whole milliamps before scaling,
/// ranges 10-12 do not. Both match the values the existing logs were produced with.
/// Returns `None` for ranges outside 1-12.
pub fn water_pressure(idc_input_ma: f64, range: u8) -> Option<Pressure> {
    use Pressure::{KiloPascal, MegaPascal};

    if idc_input_ma <= LOOP_ZERO_MA {
        return Some(MegaPascal(0.0));
    }

    let offset = idc_input_ma - LOOP_ZERO_MA;
    let whole = offset.trunc();
    let pressure = match range {
        1 => MegaPascal(whole * 0.0375),
        2 => MegaPascal(whole * 0.0625),
        3 => MegaPascal(whole * 0.1),
        4 => MegaPascal(whole * 0.15625),
        5 => MegaPascal(whole * 0.625),
        6 => MegaPascal(whole * 2.5),
        7 => MegaPascal(whole * 3.75),
        8 => MegaPascal(whole - 0.00625),
        9 if idc_input_ma <= RANGE_9_SPLIT_MA => MegaPascal(whole - 0.0125),
        9 => MegaPascal((idc_input_ma - RANGE_9_SPLIT_MA).trunc() * 0.0125),
        10 => KiloPascal(offset * 0.3125),
        11 => KiloPascal(offset * 3.125),
        12 => KiloPascal(offset * 6.25),
        _ => return None,
    };
    Some(pressure)
}

/// Port 2 reading
#[derive(Debug, Clone, PartialEq)]
pub struct InstantaneousReading {
    pub battery_v: f64,
    pub probe_mode_raw: u8,
    pub probe_range: u8,
    pub idc_input_ma: f64,
    pub vdc_input_v: f64,
    pub inputs: DigitalInputs,
    pub depth: Option<WaterDepth>,
    pub pressure: Option<Pressure>,
}

impl InstantaneousReading {
    pub fn parse(bytes: &[u8], probe_length_m: f64) -> Result<Self> {
        ensure_len(bytes, INSTANTANEOUS_FRAME_SIZE)?;

        let probe_mode_raw = bytes[2];
        let probe_range = bytes[3];
        let idc_input_ma = f64::from(read_u16_be(bytes, 4)) / 1000.0;

        let (depth, pressure) = match ProbeMode::from(probe_mode_raw) {
            ProbeMode::Depth => (Some(water_depth(idc_input_ma, probe_length_m)), None),
            ProbeMode::Pressure => (None, water_pressure(idc_input_ma, probe_range)),
            ProbeMode::Other(_) => (None, None),
        };

        Ok(Self {
            battery_v: f64::from(read_u16_be(bytes, 0)) / 1000.0,
            probe_mode_raw,
            probe_range,
            idc_input_ma,
            vdc_input_v: f64::from(read_u16_be(bytes, 6)) / 1000.0,
            inputs: DigitalInputs::from(bytes[8]),
            depth,
            pressure,
        })
    }

    pub fn probe_mode(&self) -> ProbeMode {
        ProbeMode::from(self.probe_mode_raw)
    }

    pub fn measurements(&self, mode: OutputMode) -> MeasurementSet {
        let depth = self
            .depth
            .map_or(MeasurementValue::Unavailable, WaterDepth::to_value);

        let set = MeasurementSet::new()
            .float("Bat_V", self.battery_v)
            .integer("probe_mod_bytes2", i64::from(self.probe_mode_raw))
            .integer("probe_mod_bytes3", i64::from(self.probe_range))
            .float("IDC_input_mA", self.idc_input_ma)
            .value("Water_deep_cm", depth);

        if !mode.is_extended() {
            return set;
        }

        let (mpa, kpa) = match self.pressure {
            Some(Pressure::MegaPascal(v)) => (MeasurementValue::Float(v), MeasurementValue::Unavailable),
            Some(Pressure::KiloPascal(v)) => (MeasurementValue::Unavailable, MeasurementValue::Float(v)),
            None => (MeasurementValue::Unavailable, MeasurementValue::Unavailable),
        };

        set.float("VDC_input_V", self.vdc_input_v)
            .label("IN1_pin_level", self.inputs.in1.as_str())
            .label("IN2_pin_level", self.inputs.in2.as_str())
            .label("Exti_pin_level", self.inputs.ext_trigger_level.as_str())
            .label(
                "Exti_status",
                if self.inputs.ext_triggered { "TRUE" } else { "FALSE" },
            )
            .value("Water_pressure_MPa", mpa)
            .value("Water_pressure_kPa", kpa)
    }
}

/// Port 7 reading
#[derive(Debug, Clone, PartialEq)]
pub struct DatalogReading {
    pub values: Vec<f64>,
}

impl DatalogReading {
    /// Records start after the 2-byte header and repeat every 11 bytes. A record is
    /// read as long as its first two bytes are present.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        ensure_len(bytes, DATALOG_HEADER_SIZE)?;

        let values = bytes[DATALOG_HEADER_SIZE..]
            .chunks(DATALOG_RECORD_SIZE)
            .filter(|record| record.len() >= 2)
            .map(datalog_value)
            .collect();

        Ok(Self { values })
    }

    /// Renders `[v0],[v1],...,` as stored in the device logs
    pub fn render(&self) -> String {
        // Debug keeps the trailing ".0" on whole numbers
        self.values.iter().map(|value| format!("[{value:?}],")).collect()
    }

    pub fn measurements(&self) -> MeasurementSet {
        MeasurementSet::new().text("DATALOG", self.render())
    }
}

// The record's first byte lands in bits 8-15 and the second in bits 16-23; the
// third byte is never read. Logged datalogs carry this scale.
fn datalog_value(record: &[u8]) -> f64 {
    let raw = (u32::from(record[0]) << 8) | (u32::from(record[1]) << 16);
    f64::from(raw) / 1000.0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrequencyBand {
    Eu868,
    Us915,
    In865,
    Au915,
    Kz865,
    Ru864,
    As923,
    As923_1,
    As923_2,
    As923_3,
    Cn470,
    Eu433,
    Kr920,
    Ma869,
}

impl FrequencyBand {
    pub fn from_byte(value: u8) -> Option<Self> {
        let band = match value {
            0x01 => FrequencyBand::Eu868,
            0x02 => FrequencyBand::Us915,
            0x03 => FrequencyBand::In865,
            0x04 => FrequencyBand::Au915,
            0x05 => FrequencyBand::Kz865,
            0x06 => FrequencyBand::Ru864,
            0x07 => FrequencyBand::As923,
            0x08 => FrequencyBand::As923_1,
            0x09 => FrequencyBand::As923_2,
            0x0A => FrequencyBand::As923_3,
            0x0B => FrequencyBand::Cn470,
            0x0C => FrequencyBand::Eu433,
            0x0D => FrequencyBand::Kr920,
            0x0E => FrequencyBand::Ma869,
            _ => return None,
        };
        Some(band)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FrequencyBand::Eu868 => "EU868",
            FrequencyBand::Us915 => "US915",
            FrequencyBand::In865 => "IN865",
            FrequencyBand::Au915 => "AU915",
            FrequencyBand::Kz865 => "KZ865",
            FrequencyBand::Ru864 => "RU864",
            FrequencyBand::As923 => "AS923",
            FrequencyBand::As923_1 => "AS923_1",
            FrequencyBand::As923_2 => "AS923_2",
            FrequencyBand::As923_3 => "AS923_3",
            FrequencyBand::Cn470 => "CN470",
            FrequencyBand::Eu433 => "EU433",
            FrequencyBand::Kr920 => "KR920",
            FrequencyBand::Ma869 => "MA869",
        }
    }
}

/// Port 5 reading
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceInfo {
    pub sensor_model: Option<&'static str>,
    pub firmware_version: String,
    pub frequency_band: FrequencyBand,
    pub sub_band: Option<u8>,
    pub battery_v: f64,
    pub sensor_submodel: u8,
}

impl DeviceInfo {
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        ensure_len(bytes, DEVICE_INFO_FRAME_SIZE)?;

        let frequency_band =
            FrequencyBand::from_byte(bytes[3]).ok_or(PayloadError::UnmappedEnum {
                field: "frequency band",
                value: bytes[3],
            })?;

        Ok(Self {
            sensor_model: (bytes[0] == PS_LB_MODEL_ID).then_some("PS-LB"),
            firmware_version: format!(
                "{}.{}.{}",
                bytes[1] & 0x0F,
                (bytes[2] >> 4) & 0x0F,
                bytes[2] & 0x0F
            ),
            frequency_band,
            sub_band: (bytes[4] != SUB_BAND_UNSET).then_some(bytes[4]),
            battery_v: f64::from(read_u16_be(bytes, 5)) / 1000.0,
            sensor_submodel: (bytes[7] >> 6) & 0x3F,
        })
    }

    pub fn measurements(&self, mode: OutputMode) -> MeasurementSet {
        let sub_band = match self.sub_band {
            Some(band) => MeasurementValue::Integer(i64::from(band)),
            None => MeasurementValue::Label(NULL_LABEL),
        };

        let set = MeasurementSet::new()
            .float("BatV", self.battery_v)
            .label("SENSOR_MODEL", self.sensor_model.unwrap_or(NULL_LABEL))
            .text("FIRMWARE_VERSION", self.firmware_version.clone())
            .label("FREQUENCY_BAND", self.frequency_band.as_str())
            .value("SUB_BAND", sub_band);

        match mode {
            OutputMode::Standard => set,
            OutputMode::Extended => {
                set.integer("SENSOR_SUBMODEL", i64::from(self.sensor_submodel))
            }
        }
    }
}

/// One decoded PS-LB uplink, shaped by the port it arrived on
#[derive(Debug, Clone, PartialEq)]
pub enum WaterLevelReading {
    Instantaneous(InstantaneousReading),
    Datalog(DatalogReading),
    DeviceInfo(DeviceInfo),
}

impl WaterLevelReading {
    pub fn parse(bytes: &[u8], port: u8, probe_length_m: f64) -> Result<Self> {
        match port {
            PORT_INSTANTANEOUS => Ok(WaterLevelReading::Instantaneous(
                InstantaneousReading::parse(bytes, probe_length_m)?,
            )),
            PORT_DATALOG => Ok(WaterLevelReading::Datalog(DatalogReading::parse(bytes)?)),
            PORT_DEVICE_INFO => Ok(WaterLevelReading::DeviceInfo(DeviceInfo::parse(bytes)?)),
            other => Err(PayloadError::UnsupportedPort(other)),
        }
    }

    pub fn measurements(&self, mode: OutputMode) -> MeasurementSet {
        match self {
            WaterLevelReading::Instantaneous(reading) => reading.measurements(mode),
            WaterLevelReading::Datalog(reading) => reading.measurements(),
            WaterLevelReading::DeviceInfo(info) => info.measurements(mode),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct WaterLevelDecoder {
    port: u8,
    probe_length_m: f64,
    mode: OutputMode,
}

impl WaterLevelDecoder {
    pub fn new(port: u8, probe_length_m: f64) -> Self {
        Self {
            port,
            probe_length_m,
            mode: OutputMode::Standard,
        }
    }

    pub fn with_mode(mut self, mode: OutputMode) -> Self {
        self.mode = mode;
        self
    }
}

impl PayloadDecoder for WaterLevelDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<MeasurementSet> {
        Ok(WaterLevelReading::parse(bytes, self.port, self.probe_length_m)?.measurements(self.mode))
    }
}
