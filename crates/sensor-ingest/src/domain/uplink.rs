use crate::domain::{IngestError, IngestResult};
use chrono::{DateTime, FixedOffset};
use sensor_payload::MeasurementSet;
use serde::{Deserialize, Serialize};
use serde_json::ser::Formatter;
use std::io;

/// Uplink event as delivered by AWS IoT Core for LoRaWAN
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UplinkEvent {
    /// Base64 encoded frame
    #[serde(rename = "PayloadData")]
    pub payload_data: String,

    #[serde(rename = "WirelessMetadata")]
    pub wireless_metadata: WirelessMetadata,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WirelessMetadata {
    #[serde(rename = "LoRaWAN")]
    pub lorawan: LoRaWanMetadata,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoRaWanMetadata {
    /// Network timestamp, stored in the log exactly as received
    #[serde(rename = "Timestamp")]
    pub timestamp: String,

    #[serde(rename = "DevEui")]
    pub dev_eui: String,

    #[serde(rename = "FPort", default, skip_serializing_if = "Option::is_none")]
    pub f_port: Option<u8>,
}

impl UplinkEvent {
    pub fn new(
        dev_eui: impl Into<String>,
        timestamp: impl Into<String>,
        payload_data: impl Into<String>,
        f_port: Option<u8>,
    ) -> Self {
        Self {
            payload_data: payload_data.into(),
            wireless_metadata: WirelessMetadata {
                lorawan: LoRaWanMetadata {
                    timestamp: timestamp.into(),
                    dev_eui: dev_eui.into(),
                    f_port,
                },
            },
        }
    }

    /// Parse one event from its JSON form
    pub fn from_json(json: &str) -> IngestResult<Self> {
        serde_json::from_str(json).map_err(|e| IngestError::InvalidEvent(e.to_string()))
    }

    pub fn dev_eui(&self) -> &str {
        &self.wireless_metadata.lorawan.dev_eui
    }

    pub fn timestamp(&self) -> &str {
        &self.wireless_metadata.lorawan.timestamp
    }

    /// Timestamp as an RFC 3339 instant, `None` when the network sent another format
    pub fn received_at(&self) -> Option<DateTime<FixedOffset>> {
        DateTime::parse_from_rfc3339(self.timestamp()).ok()
    }

    pub fn f_port(&self) -> Option<u8> {
        self.wireless_metadata.lorawan.f_port
    }
}

/// One line of a device log
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogRecord {
    #[serde(rename = "Timestamp")]
    pub timestamp: String,

    #[serde(rename = "Encoded Payload")]
    pub encoded_payload: String,

    #[serde(rename = "Payload Data")]
    pub payload_data: MeasurementSet,
}

impl LogRecord {
    /// JSON line in the layout of the existing device logs: `", "` between
    /// entries and `": "` after keys
    pub fn to_log_line(&self) -> IngestResult<String> {
        let mut out = Vec::new();
        let mut serializer = serde_json::Serializer::with_formatter(&mut out, LogLineFormatter);
        self.serialize(&mut serializer)?;
        String::from_utf8(out).map_err(|e| IngestError::Sink(e.into()))
    }
}

struct LogLineFormatter;

impl Formatter for LogLineFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b": ")
    }
}
