//! Uplink events through catalog, decoder and file sink.

use sensor_ingest::domain::{DeviceCatalog, IngestError, UplinkEvent, UplinkService};
use sensor_ingest::file_record_sink::FileRecordSink;
use std::sync::Arc;

const DEVICES_JSON: &str = r#"[
    {"dev_eui": "a123456b789123c4", "log_key": "smdata.txt", "decoder": "soil_moisture"},
    {
        "dev_eui": "a567891b234567c8",
        "log_key": "water_level_data.txt",
        "decoder": "water_level",
        "probe_length_m": 4.2,
        "default_port": 2
    }
]"#;

fn event_json(dev_eui: &str, payload: &str, f_port: Option<u8>) -> String {
    event_json_at("2024-05-19T09:25:22Z", dev_eui, payload, f_port)
}

fn event_json_at(timestamp: &str, dev_eui: &str, payload: &str, f_port: Option<u8>) -> String {
    let port = f_port.map(|p| format!(r#","FPort":{p}"#)).unwrap_or_default();
    format!(
        r#"{{"PayloadData":"{payload}","WirelessMetadata":{{"LoRaWAN":{{"Timestamp":"{timestamp}","DevEui":"{dev_eui}"{port}}}}}}}"#
    )
}

async fn setup() -> (tempfile::TempDir, UplinkService) {
    let dir = tempfile::tempdir().unwrap();
    let devices_file = dir.path().join("devices.json");
    tokio::fs::write(&devices_file, DEVICES_JSON).await.unwrap();

    let catalog = DeviceCatalog::load(&devices_file).await.unwrap();
    let sink = FileRecordSink::new(dir.path().join("logs"));
    let service = UplinkService::new(Arc::new(catalog), Arc::new(sink));
    (dir, service)
}

#[tokio::test]
async fn test_soil_moisture_uplink_is_logged() {
    let (dir, service) = setup().await;

    let event = UplinkEvent::from_json(&event_json("a123456b789123c4", "AGQACgAyABQAAQ==", Some(1))).unwrap();
    service.process_uplink(event).await.unwrap();

    let log = std::fs::read_to_string(dir.path().join("logs/smdata.txt")).unwrap();
    assert_eq!(
        log,
        "\n{\"Timestamp\": \"2024-05-19T09:25:22Z\", \"Encoded Payload\": \"AGQACgAyABQAAQ==\", \"Payload Data\": {\"battery voltage (V)\": 0.1, \"soil moisture (%)\": 0.5, \"soil temperature (C)\": 0.2, \"soil temperature (F)\": 32.36, \"soil conductivity (uS/cm)\": 0.01}}"
    );
}

#[tokio::test]
async fn test_water_level_uplinks_share_one_log() {
    let (dir, service) = setup().await;

    for (payload, port) in [
        ("DhAAABBoAAAK", None),
        ("FhI0Af8OEMA=", Some(5)),
        ("AAABAgAAAAAAAAAAAAAAAAAAAAAAAAAA", Some(7)),
    ] {
        let event = UplinkEvent::from_json(&event_json("A567891B234567C8", payload, port)).unwrap();
        service.process_uplink(event).await.unwrap();
    }

    let log = std::fs::read_to_string(dir.path().join("logs/water_level_data.txt")).unwrap();
    let lines: Vec<&str> = log.lines().filter(|l| !l.is_empty()).collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].contains(r#""Water_deep_cm": 5.250000000000004"#));
    assert!(lines[1].contains(r#""FIRMWARE_VERSION": "2.3.4""#));
    assert!(lines[2].contains(r#""DATALOG": "[131.328],[0.0],""#));
}

#[tokio::test]
async fn test_timestamps_are_logged_as_received() {
    let (dir, service) = setup().await;

    let timestamps = [
        "2024-05-19T11:25:22+02:00",
        "2024-05-19T09:25:22.5Z",
        "2024-05-19 09:25:22",
    ];
    for timestamp in timestamps {
        let json = event_json_at(timestamp, "a123456b789123c4", "AGQACgAyABQAAQ==", None);
        let event = UplinkEvent::from_json(&json).unwrap();
        service.process_uplink(event).await.unwrap();
    }

    let log = std::fs::read_to_string(dir.path().join("logs/smdata.txt")).unwrap();
    let lines: Vec<&str> = log.lines().filter(|l| !l.is_empty()).collect();
    assert_eq!(lines.len(), timestamps.len());
    for (line, timestamp) in lines.iter().zip(timestamps) {
        assert!(line.starts_with(&format!(r#"{{"Timestamp": "{timestamp}", "#)));
    }
}

#[tokio::test]
async fn test_rejected_uplinks_leave_logs_untouched() {
    let (dir, service) = setup().await;

    let unknown = UplinkEvent::from_json(&event_json("ffffffffffffffff", "AGQACgAyABQAAQ==", None)).unwrap();
    let err = service.process_uplink(unknown).await.unwrap_err();
    assert_eq!(err.kind(), "UNKNOWN_DEVICE");

    let bad_port = UplinkEvent::from_json(&event_json("a567891b234567c8", "DhAAABBoAAAK", Some(9))).unwrap();
    let err = service.process_uplink(bad_port).await.unwrap_err();
    assert!(matches!(err, IngestError::Payload(_)));
    assert_eq!(err.kind(), "UNSUPPORTED_PORT");

    assert!(!dir.path().join("logs").exists());
}
