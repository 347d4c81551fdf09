use crate::measurement::{MeasurementSet, OutputMode};
use crate::soil_moisture::SoilMoistureDecoder;
use crate::water_level::WaterLevelDecoder;
use crate::{PayloadDecoder, PayloadError, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

/// Decoder family a device belongs to, with its calibration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "decoder", rename_all = "snake_case")]
pub enum DecoderKind {
    SoilMoisture,
    WaterLevel {
        /// Measured probe length in metres
        probe_length_m: f64,
    },
}

impl DecoderKind {
    pub fn name(&self) -> &'static str {
        match self {
            DecoderKind::SoilMoisture => "soil_moisture",
            DecoderKind::WaterLevel { .. } => "water_level",
        }
    }
}

/// How uplinks from one device are decoded
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeviceProfile {
    #[serde(flatten)]
    pub kind: DecoderKind,

    /// Port assumed when the uplink does not carry one
    #[serde(default)]
    pub default_port: Option<u8>,

    /// Accepts `"output": "standard" | "extended"` or `"extended": true | false`
    #[serde(default, alias = "extended", deserialize_with = "deserialize_output")]
    pub output: OutputMode,
}

fn deserialize_output<'de, D>(deserializer: D) -> std::result::Result<OutputMode, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OutputSetting {
        Mode(OutputMode),
        Extended(bool),
    }

    Ok(match OutputSetting::deserialize(deserializer)? {
        OutputSetting::Mode(mode) => mode,
        OutputSetting::Extended(true) => OutputMode::Extended,
        OutputSetting::Extended(false) => OutputMode::Standard,
    })
}

impl DeviceProfile {
    pub fn soil_moisture() -> Self {
        Self {
            kind: DecoderKind::SoilMoisture,
            default_port: None,
            output: OutputMode::Standard,
        }
    }

    pub fn water_level(probe_length_m: f64) -> Self {
        Self {
            kind: DecoderKind::WaterLevel { probe_length_m },
            default_port: None,
            output: OutputMode::Standard,
        }
    }

    pub fn with_default_port(mut self, port: u8) -> Self {
        self.default_port = Some(port);
        self
    }

    pub fn with_output(mut self, output: OutputMode) -> Self {
        self.output = output;
        self
    }

    /// Build the decoder for an uplink received on `port`
    pub fn decoder(&self, port: Option<u8>) -> Result<Box<dyn PayloadDecoder>> {
        match self.kind {
            DecoderKind::SoilMoisture => Ok(Box::new(SoilMoistureDecoder::with_mode(self.output))),
            DecoderKind::WaterLevel { probe_length_m } => {
                let port = port
                    .or(self.default_port)
                    .ok_or(PayloadError::MissingPort(self.kind.name()))?;
                Ok(Box::new(
                    WaterLevelDecoder::new(port, probe_length_m).with_mode(self.output),
                ))
            }
        }
    }
}

/// Device identifier → profile lookup
///
/// Identifiers (LoRaWAN DevEUIs) are compared case-insensitively.
#[derive(Debug, Clone, Default)]
pub struct DeviceRegistry {
    profiles: HashMap<String, DeviceProfile>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_device(mut self, device_id: &str, profile: DeviceProfile) -> Self {
        self.insert(device_id, profile);
        self
    }

    pub fn insert(&mut self, device_id: &str, profile: DeviceProfile) -> Option<DeviceProfile> {
        self.profiles.insert(normalize_device_id(device_id), profile)
    }

    pub fn get(&self, device_id: &str) -> Option<&DeviceProfile> {
        self.profiles.get(&normalize_device_id(device_id))
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    /// Decode a base64 uplink from `device_id`
    pub fn decode(
        &self,
        device_id: &str,
        frame_base64: &str,
        port: Option<u8>,
    ) -> Result<MeasurementSet> {
        let profile = self
            .get(device_id)
            .ok_or_else(|| PayloadError::UnknownDevice(device_id.to_string()))?;
        crate::decode(frame_base64, profile, port)
    }
}

impl<S: AsRef<str>> FromIterator<(S, DeviceProfile)> for DeviceRegistry {
    fn from_iter<I: IntoIterator<Item = (S, DeviceProfile)>>(iter: I) -> Self {
        let mut registry = Self::new();
        for (device_id, profile) in iter {
            registry.insert(device_id.as_ref(), profile);
        }
        registry
    }
}

pub fn normalize_device_id(device_id: &str) -> String {
    device_id.trim().to_ascii_lowercase()
}
