use crate::domain::{DeviceCatalog, IngestResult, LogRecord, RecordSink, UplinkEvent};
use sensor_payload::PayloadError;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Domain service that turns an uplink event into a stored log record
///
/// Flow:
/// 1. Resolve the device binding from its DevEUI
/// 2. Decode the base64 payload with the device's profile
/// 3. Build the LogRecord from timestamp, encoded payload and measurements
/// 4. Append it to the device log via the sink trait
pub struct UplinkService {
    catalog: Arc<DeviceCatalog>,
    sink: Arc<dyn RecordSink>,
}

impl UplinkService {
    pub fn new(catalog: Arc<DeviceCatalog>, sink: Arc<dyn RecordSink>) -> Self {
        Self { catalog, sink }
    }

    /// Process one uplink and return the record that was stored
    #[instrument(
        skip(self, event),
        fields(
            dev_eui = %event.dev_eui(),
            f_port = ?event.f_port(),
            received_at = ?event.received_at()
        )
    )]
    pub async fn process_uplink(&self, event: UplinkEvent) -> IngestResult<LogRecord> {
        debug!(
            payload_size = event.payload_data.len(),
            "processing uplink"
        );

        let dev_eui = event.dev_eui();
        let Some(log_key) = self.catalog.log_key(dev_eui) else {
            warn!("rejecting uplink from unregistered device");
            return Err(PayloadError::UnknownDevice(dev_eui.to_string()).into());
        };

        let payload_data = self
            .catalog
            .registry()
            .decode(dev_eui, &event.payload_data, event.f_port())
            .inspect_err(|e| {
                warn!(kind = %e.kind(), error = %e, "failed to decode uplink payload");
            })?;

        let record = LogRecord {
            timestamp: event.timestamp().to_string(),
            encoded_payload: event.payload_data.clone(),
            payload_data,
        };

        self.sink.append(log_key, &record).await?;

        info!(
            log_key,
            field_count = record.payload_data.len(),
            "stored decoded uplink"
        );

        Ok(record)
    }
}
