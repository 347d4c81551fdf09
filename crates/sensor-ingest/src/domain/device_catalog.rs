use crate::domain::{IngestError, IngestResult};
use sensor_payload::registry::normalize_device_id;
use sensor_payload::{DeviceProfile, DeviceRegistry};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

/// Registry entry for one device: how to decode it and where its log lives
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DeviceBinding {
    pub dev_eui: String,

    /// Name of the log artifact decoded uplinks are appended to
    pub log_key: String,

    #[serde(flatten)]
    pub profile: DeviceProfile,
}

/// Devices known to the ingestion service
#[derive(Debug, Clone, Default)]
pub struct DeviceCatalog {
    registry: DeviceRegistry,
    log_keys: HashMap<String, String>,
}

impl DeviceCatalog {
    pub fn new(bindings: Vec<DeviceBinding>) -> IngestResult<Self> {
        let mut catalog = Self::default();

        for binding in bindings {
            validate_log_key(&binding.log_key)?;

            let dev_eui = normalize_device_id(&binding.dev_eui);
            if catalog.registry.insert(&dev_eui, binding.profile).is_some() {
                return Err(IngestError::InvalidCatalog(format!(
                    "duplicate device: {}",
                    dev_eui
                )));
            }
            catalog.log_keys.insert(dev_eui, binding.log_key);
        }

        Ok(catalog)
    }

    pub fn from_json(json: &str) -> IngestResult<Self> {
        let bindings: Vec<DeviceBinding> =
            serde_json::from_str(json).map_err(|e| IngestError::InvalidCatalog(e.to_string()))?;
        Self::new(bindings)
    }

    /// Load the catalog from a JSON file
    pub async fn load(path: impl AsRef<Path>) -> IngestResult<Self> {
        let path = path.as_ref();
        let json = tokio::fs::read_to_string(path).await.map_err(|e| {
            IngestError::InvalidCatalog(format!("reading {}: {}", path.display(), e))
        })?;
        let catalog = Self::from_json(&json)?;
        debug!(path = %path.display(), devices = catalog.len(), "loaded device catalog");
        Ok(catalog)
    }

    pub fn registry(&self) -> &DeviceRegistry {
        &self.registry
    }

    pub fn log_key(&self, dev_eui: &str) -> Option<&str> {
        self.log_keys
            .get(&normalize_device_id(dev_eui))
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }
}

// Log keys name files inside the log directory
fn validate_log_key(log_key: &str) -> IngestResult<()> {
    let is_plain_name = !log_key.is_empty()
        && log_key != "."
        && log_key != ".."
        && !log_key.contains(['/', '\\']);

    if !is_plain_name {
        return Err(IngestError::InvalidCatalog(format!(
            "log key must be a plain file name: {:?}",
            log_key
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sensor_payload::{DecoderKind, OutputMode};

    const CATALOG_JSON: &str = r#"[
        {"dev_eui": "A123456B789123C4", "log_key": "smdata.txt", "decoder": "soil_moisture"},
        {
            "dev_eui": "a567891b234567c8",
            "log_key": "water_level_data.txt",
            "decoder": "water_level",
            "probe_length_m": 4.2,
            "default_port": 2,
            "output": "extended"
        }
    ]"#;

    #[test]
    fn test_from_json() {
        let catalog = DeviceCatalog::from_json(CATALOG_JSON).unwrap();

        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.log_key("a123456b789123c4"), Some("smdata.txt"));
        assert_eq!(catalog.log_key("A567891B234567C8"), Some("water_level_data.txt"));

        let water = catalog.registry().get("a567891b234567c8").unwrap();
        assert_eq!(water.kind, DecoderKind::WaterLevel { probe_length_m: 4.2 });
        assert_eq!(water.default_port, Some(2));
        assert_eq!(water.output, OutputMode::Extended);
    }

    #[test]
    fn test_extended_flag_selects_extended_output() {
        let catalog = DeviceCatalog::from_json(
            r#"[{
                "dev_eui": "a567891b234567c8",
                "log_key": "w.txt",
                "decoder": "water_level",
                "probe_length_m": 4.2,
                "extended": true
            }]"#,
        )
        .unwrap();

        let water = catalog.registry().get("a567891b234567c8").unwrap();
        assert_eq!(water.output, OutputMode::Extended);

        let set = catalog
            .registry()
            .decode("a567891b234567c8", "DhAAABBoAAAK", Some(2))
            .unwrap();
        assert!(set.get("VDC_input_V").is_some());
    }

    #[test]
    fn test_duplicate_device() {
        let result = DeviceCatalog::from_json(
            r#"[
                {"dev_eui": "a123456b789123c4", "log_key": "a.txt", "decoder": "soil_moisture"},
                {"dev_eui": "A123456B789123C4", "log_key": "b.txt", "decoder": "soil_moisture"}
            ]"#,
        );
        assert!(matches!(result, Err(IngestError::InvalidCatalog(_))));
    }

    #[test]
    fn test_rejects_path_log_key() {
        for key in ["../escape.txt", "nested/log.txt", "", ".."] {
            let binding = DeviceBinding {
                dev_eui: "a123456b789123c4".to_string(),
                log_key: key.to_string(),
                profile: DeviceProfile::soil_moisture(),
            };
            assert!(
                matches!(DeviceCatalog::new(vec![binding]), Err(IngestError::InvalidCatalog(_))),
                "accepted {key:?}"
            );
        }
    }

    #[test]
    fn test_water_level_requires_probe_length() {
        let result = DeviceCatalog::from_json(
            r#"[{"dev_eui": "a567891b234567c8", "log_key": "w.txt", "decoder": "water_level"}]"#,
        );
        assert!(matches!(result, Err(IngestError::InvalidCatalog(_))));
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let result = DeviceCatalog::load("/nonexistent/devices.json").await;
        assert_eq!(result.unwrap_err().kind(), "INVALID_CATALOG");
    }
}
