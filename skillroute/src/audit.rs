//! Audit trail of dispatched turns.
//!
//! The router records one [`DispatchEvent`] per turn. Sinks decide where
//! events go; a failing sink is logged and never affects the turn. Recording
//! runs on the dispatch path, so sinks must not block the executor.

use async_trait::async_trait;
use serde::Serialize;
use std::fmt;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use thiserror::Error;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::sync::Mutex;

/// How a turn ended.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DispatchOutcome {
    /// An owner produced a result
    Claimed,
    /// No owner produced a result
    Unclaimed,
    /// The token fired before an owner produced a result
    Cancelled,
}

/// One routed turn.
#[derive(Debug, Clone, Serialize)]
pub struct DispatchEvent {
    /// RFC 3339 timestamp
    pub timestamp: String,
    pub command: Option<String>,
    pub prompt: String,
    pub outcome: DispatchOutcome,
    pub handler_chain: Vec<String>,
    pub result_id: Option<String>,
    pub follow_ups: usize,
}

impl DispatchEvent {
    pub fn new(command: Option<String>, prompt: impl Into<String>, outcome: DispatchOutcome) -> Self {
        Self {
            timestamp: chrono::Utc::now().to_rfc3339(),
            command,
            prompt: prompt.into(),
            outcome,
            handler_chain: Vec::new(),
            result_id: None,
            follow_ups: 0,
        }
    }
}

/// Error type for audit operations
#[derive(Debug, Error)]
pub enum AuditError {
    #[error("Failed to write audit log: {0}")]
    WriteError(#[from] std::io::Error),

    #[error("Failed to serialize audit event: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// Destination for dispatch events.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record(&self, event: DispatchEvent) -> Result<(), AuditError>;

    async fn flush(&self) -> Result<(), AuditError>;
}

/// JSON Lines file sink (one event per line).
pub struct FileAuditSink {
    path: PathBuf,
    writer: Mutex<BufWriter<File>>,
}

impl FileAuditSink {
    /// Open (append) or create the log file, creating parent directories.
    ///
    /// Opening is synchronous; call this while setting up, not per turn.
    pub fn new(path: impl AsRef<Path>) -> Result<Self, AuditError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            writer: Mutex::new(BufWriter::new(File::from_std(file))),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl AuditSink for FileAuditSink {
    async fn record(&self, event: DispatchEvent) -> Result<(), AuditError> {
        let mut line = serde_json::to_vec(&event)?;
        line.push(b'\n');
        let mut writer = self.writer.lock().await;
        writer.write_all(&line).await?;
        Ok(())
    }

    async fn flush(&self) -> Result<(), AuditError> {
        self.writer.lock().await.flush().await?;
        Ok(())
    }
}

impl fmt::Debug for FileAuditSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileAuditSink")
            .field("path", &self.path)
            .finish()
    }
}

/// In-memory sink keeping the latest `max_events` events.
#[derive(Debug)]
pub struct MemoryAuditSink {
    events: RwLock<Vec<DispatchEvent>>,
    max_events: usize,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::with_capacity(1000)
    }

    pub fn with_capacity(max_events: usize) -> Self {
        Self {
            events: RwLock::new(Vec::new()),
            max_events,
        }
    }

    pub fn events(&self) -> Vec<DispatchEvent> {
        self.events.read().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.events.read().unwrap().len()
    }

    pub fn find_by_outcome(&self, outcome: DispatchOutcome) -> Vec<DispatchEvent> {
        self.events
            .read()
            .unwrap()
            .iter()
            .filter(|e| e.outcome == outcome)
            .cloned()
            .collect()
    }
}

impl Default for MemoryAuditSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuditSink for MemoryAuditSink {
    async fn record(&self, event: DispatchEvent) -> Result<(), AuditError> {
        let mut events = self.events.write().unwrap();
        if events.len() >= self.max_events {
            events.remove(0);
        }
        events.push(event);
        Ok(())
    }

    async fn flush(&self) -> Result<(), AuditError> {
        Ok(())
    }
}

/// Sink that drops every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullAuditSink;

#[async_trait]
impl AuditSink for NullAuditSink {
    async fn record(&self, _event: DispatchEvent) -> Result<(), AuditError> {
        Ok(())
    }

    async fn flush(&self) -> Result<(), AuditError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claimed(chain: &[&str]) -> DispatchEvent {
        let mut event = DispatchEvent::new(None, "deploy my app", DispatchOutcome::Claimed);
        event.handler_chain = chain.iter().map(|s| s.to_string()).collect();
        event.result_id = Some("r-1".into());
        event
    }

    #[tokio::test]
    async fn test_memory_sink_caps_events() {
        let sink = MemoryAuditSink::with_capacity(2);
        sink.record(claimed(&["a"])).await.unwrap();
        sink.record(DispatchEvent::new(None, "?", DispatchOutcome::Unclaimed))
            .await
            .unwrap();
        sink.record(claimed(&["b"])).await.unwrap();

        assert_eq!(sink.count(), 2);
        assert_eq!(sink.find_by_outcome(DispatchOutcome::Claimed).len(), 1);
        assert_eq!(sink.events()[1].handler_chain, vec!["b".to_string()]);
    }

    #[tokio::test]
    async fn test_file_sink_writes_jsonl() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("dispatch.jsonl");

        let sink = FileAuditSink::new(&path).unwrap();
        sink.record(claimed(&["azure", "deploy"])).await.unwrap();
        sink.record(DispatchEvent::new(Some("x".into()), "", DispatchOutcome::Cancelled))
            .await
            .unwrap();
        sink.flush().await.unwrap();

        let content = tokio::fs::read_to_string(&path).await.unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["outcome"], "claimed");
        assert_eq!(first["handler_chain"], serde_json::json!(["azure", "deploy"]));
        let second: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second["outcome"], "cancelled");
    }
}
