use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

/// Marker written for channels a frame does not provide.
///
/// Existing device logs store the literal string, so it is kept instead of a JSON null.
pub const UNAVAILABLE: &str = "null";

/// A single decoded channel value
#[derive(Debug, Clone, PartialEq)]
pub enum MeasurementValue {
    Float(f64),
    Integer(i64),
    Text(String),
    Label(&'static str),
    Unavailable,
}

impl MeasurementValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            MeasurementValue::Float(v) => Some(*v),
            MeasurementValue::Integer(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            MeasurementValue::Text(s) => Some(s),
            MeasurementValue::Label(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, MeasurementValue::Unavailable)
    }
}

impl Serialize for MeasurementValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            MeasurementValue::Float(v) => serializer.serialize_f64(*v),
            MeasurementValue::Integer(v) => serializer.serialize_i64(*v),
            MeasurementValue::Text(s) => serializer.serialize_str(s),
            MeasurementValue::Label(s) => serializer.serialize_str(s),
            MeasurementValue::Unavailable => serializer.serialize_str(UNAVAILABLE),
        }
    }
}

/// Ordered, fixed-key set of measurements produced by one decode
///
/// Serializes as a JSON object with keys in decode order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MeasurementSet {
    entries: Vec<(&'static str, MeasurementValue)>,
}

impl MeasurementSet {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, key: &'static str, value: MeasurementValue) {
        self.entries.push((key, value));
    }

    pub(crate) fn float(mut self, key: &'static str, value: f64) -> Self {
        self.push(key, MeasurementValue::Float(value));
        self
    }

    pub(crate) fn integer(mut self, key: &'static str, value: i64) -> Self {
        self.push(key, MeasurementValue::Integer(value));
        self
    }

    pub(crate) fn label(mut self, key: &'static str, value: &'static str) -> Self {
        self.push(key, MeasurementValue::Label(value));
        self
    }

    pub(crate) fn text(mut self, key: &'static str, value: String) -> Self {
        self.push(key, MeasurementValue::Text(value));
        self
    }

    pub(crate) fn value(mut self, key: &'static str, value: MeasurementValue) -> Self {
        self.push(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&MeasurementValue> {
        self.entries
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v)
    }

    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|(k, _)| *k)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &MeasurementValue)> {
        self.entries.iter().map(|(k, v)| (*k, v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for MeasurementSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// Which channels a decoder emits
///
/// `Standard` matches the historical log format; `Extended` also surfaces channels
/// that are decoded but were never persisted (pin states, pressure, loop voltage).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputMode {
    #[default]
    Standard,
    Extended,
}

impl OutputMode {
    pub fn is_extended(&self) -> bool {
        matches!(self, OutputMode::Extended)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_in_insertion_order() {
        let set = MeasurementSet::new()
            .float("zeta", 1.5)
            .integer("alpha", 2)
            .label("mid", "PS-LB")
            .value("gone", MeasurementValue::Unavailable);

        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(json, r#"{"zeta":1.5,"alpha":2,"mid":"PS-LB","gone":"null"}"#);
    }

    #[test]
    fn test_get_and_keys() {
        let set = MeasurementSet::new()
            .float("a", 0.1)
            .text("b", "1.2.3".to_string());

        assert_eq!(set.len(), 2);
        assert_eq!(set.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(set.get("a").and_then(|v| v.as_f64()), Some(0.1));
        assert_eq!(set.get("b").and_then(|v| v.as_str()), Some("1.2.3"));
        assert!(set.get("c").is_none());
    }

    #[test]
    fn test_output_mode_deserialize() {
        let mode: OutputMode = serde_json::from_str(r#""extended""#).unwrap();
        assert!(mode.is_extended());
        assert_eq!(OutputMode::default(), OutputMode::Standard);
    }
}
