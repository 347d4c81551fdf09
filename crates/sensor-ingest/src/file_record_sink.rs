use crate::domain::{IngestResult, LogRecord, RecordSink};
use anyhow::Context;
use async_trait::async_trait;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// Record sink that keeps one text log per key inside a directory
///
/// Each append reads the existing log, adds a newline plus the JSON record and
/// writes the whole log back. Appends to the same key are serialized so
/// concurrent uplinks from one device cannot drop each other's records.
pub struct FileRecordSink {
    dir: PathBuf,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl FileRecordSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn path_for(&self, log_key: &str) -> PathBuf {
        self.dir.join(log_key)
    }

    async fn key_lock(&self, log_key: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks
            .entry(log_key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

async fn read_existing(path: &Path) -> anyhow::Result<String> {
    match tokio::fs::read_to_string(path).await {
        Ok(contents) => Ok(contents),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(String::new()),
        Err(e) => Err(e).with_context(|| format!("reading {}", path.display())),
    }
}

#[async_trait]
impl RecordSink for FileRecordSink {
    async fn append(&self, log_key: &str, record: &LogRecord) -> IngestResult<()> {
        let line = record.to_log_line()?;
        let path = self.path_for(log_key);

        let lock = self.key_lock(log_key).await;
        let _guard = lock.lock().await;

        let existing = read_existing(&path).await?;

        tokio::fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("creating {}", self.dir.display()))?;
        tokio::fs::write(&path, format!("{existing}\n{line}"))
            .await
            .with_context(|| format!("writing {}", path.display()))?;

        debug!(path = %path.display(), bytes = existing.len() + line.len() + 1, "appended record");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sensor_payload::DeviceProfile;

    fn record(second: u32) -> LogRecord {
        LogRecord {
            timestamp: format!("2024-05-19T09:25:{second:02}Z"),
            encoded_payload: "AGQACgAyABQAAQ==".to_string(),
            payload_data: sensor_payload::decode(
                "AGQACgAyABQAAQ==",
                &DeviceProfile::soil_moisture(),
                None,
            )
            .unwrap(),
        }
    }

    #[tokio::test]
    async fn test_append_creates_log() {
        let dir = tempfile::tempdir().unwrap();
        let sink = FileRecordSink::new(dir.path().join("logs"));

        sink.append("smdata.txt", &record(0)).await.unwrap();

        let contents = std::fs::read_to_string(sink.path_for("smdata.txt")).unwrap();
        assert_eq!(
            contents,
            format!("\n{}", record(0).to_log_line().unwrap())
        );
    }

    #[tokio::test]
    async fn test_append_keeps_existing_contents() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("smdata.txt"), "header").unwrap();
        let sink = FileRecordSink::new(dir.path());

        sink.append("smdata.txt", &record(1)).await.unwrap();
        sink.append("smdata.txt", &record(2)).await.unwrap();

        let contents = std::fs::read_to_string(dir.path().join("smdata.txt")).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "header");
        assert!(lines[1].contains("2024-05-19T09:25:01Z"));
        assert!(lines[2].contains("2024-05-19T09:25:02Z"));
    }

    #[tokio::test]
    async fn test_logs_are_separate_per_key() {
        let dir = tempfile::tempdir().unwrap();
        let sink = FileRecordSink::new(dir.path());

        sink.append("a.txt", &record(1)).await.unwrap();
        sink.append("b.txt", &record(2)).await.unwrap();

        let a = std::fs::read_to_string(dir.path().join("a.txt")).unwrap();
        let b = std::fs::read_to_string(dir.path().join("b.txt")).unwrap();
        assert_eq!(a.lines().filter(|l| !l.is_empty()).count(), 1);
        assert_eq!(b.lines().filter(|l| !l.is_empty()).count(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_appends_are_not_lost() {
        let dir = tempfile::tempdir().unwrap();
        let sink = Arc::new(FileRecordSink::new(dir.path()));

        let mut handles = Vec::new();
        for second in 0..32 {
            let sink = sink.clone();
            handles.push(tokio::spawn(async move {
                sink.append("water_level_data.txt", &record(second)).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let contents = std::fs::read_to_string(dir.path().join("water_level_data.txt")).unwrap();
        let records = contents.lines().filter(|l| !l.is_empty()).count();
        assert_eq!(records, 32);
    }
}
