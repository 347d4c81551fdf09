pub mod frame;
pub mod measurement;
pub mod registry;
pub mod soil_moisture;
pub mod water_level;
mod error;

pub use error::{ErrorKind, PayloadError, Result};
pub use measurement::{MeasurementSet, MeasurementValue, OutputMode};
pub use registry::{DecoderKind, DeviceProfile, DeviceRegistry};
pub use soil_moisture::SoilMoistureDecoder;
pub use water_level::WaterLevelDecoder;

/// Trait for decoding binary payload formats into measurements
pub trait PayloadDecoder {
    /// Decode a raw frame
    fn decode(&self, bytes: &[u8]) -> Result<MeasurementSet>;
}

/// Decode a base64 uplink for a device with the given profile
///
/// `port` is the LoRaWAN FPort of the uplink; when `None` the profile's default
/// port applies.
pub fn decode(frame_base64: &str, profile: &DeviceProfile, port: Option<u8>) -> Result<MeasurementSet> {
    let bytes = frame::decode_base64(frame_base64)?;
    profile.decoder(port)?.decode(&bytes)
}
