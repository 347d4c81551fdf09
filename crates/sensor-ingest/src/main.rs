use sensor_ingest::config::ServiceConfig;
use sensor_ingest::domain::{DeviceCatalog, IngestResult, UplinkEvent, UplinkService};
use sensor_ingest::file_record_sink::FileRecordSink;
use sensor_ingest::telemetry::{init_telemetry, TelemetryConfig};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, error, info, warn};

#[tokio::main]
async fn main() {
    let config = match ServiceConfig::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = init_telemetry(&TelemetryConfig {
        log_level: config.log_level.clone(),
    }) {
        eprintln!("Failed to initialize telemetry: {}", e);
        std::process::exit(1);
    }

    info!(
        devices_file = %config.devices_file,
        log_dir = %config.log_dir,
        "Starting sensor-ingest"
    );
    debug!("Configuration: {:?}", config);

    let catalog = match DeviceCatalog::load(&config.devices_file).await {
        Ok(catalog) => catalog,
        Err(e) => {
            error!("Failed to load device catalog: {}", e);
            std::process::exit(1);
        }
    };
    info!(devices = catalog.len(), "Device catalog loaded");

    let service = UplinkService::new(
        Arc::new(catalog),
        Arc::new(FileRecordSink::new(&config.log_dir)),
    );

    if let Err(e) = run(&service).await {
        error!("Uplink processing stopped: {}", e);
        std::process::exit(1);
    }
}

/// Process one JSON uplink event per stdin line until EOF
async fn run(service: &UplinkService) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    let mut processed = 0usize;
    let mut skipped = 0usize;

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match process_line(service, line).await {
            Ok(json) => {
                stdout.write_all(json.as_bytes()).await?;
                stdout.write_all(b"\n").await?;
                processed += 1;
            }
            Err(e) => {
                warn!(kind = e.kind(), error = %e, "skipping uplink");
                skipped += 1;
            }
        }
    }

    stdout.flush().await?;
    info!(processed, skipped, "Input exhausted");
    Ok(())
}

async fn process_line(service: &UplinkService, line: &str) -> IngestResult<String> {
    let event = UplinkEvent::from_json(line)?;
    let record = service.process_uplink(event).await?;
    record.to_log_line()
}
