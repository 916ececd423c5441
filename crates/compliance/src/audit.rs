//! Audit trail - event emitter and append-only sinks
//!
//! The emitter only formats events. Persisting them is the job of an
//! [`AuditSink`] chosen by the caller.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::Mutex;

use crate::error::{ComplianceError, ComplianceResult};
use crate::event::{ComplianceEvent, EventType, Outcome};

/// Stateless event formatter: assigns an id and a timestamp, does no I/O
#[derive(Debug, Clone, Copy, Default)]
pub struct AuditEmitter;

impl AuditEmitter {
    pub fn new() -> Self {
        Self
    }

    /// Format an event stamped with the current time
    pub fn emit(
        &self,
        event_type: EventType,
        identity_id: impl Into<String>,
        outcome: Outcome,
        detail: serde_json::Value,
    ) -> ComplianceEvent {
        self.emit_at(event_type, identity_id, outcome, detail, Utc::now())
    }

    /// Format an event stamped with `occurred_at`
    pub fn emit_at(
        &self,
        event_type: EventType,
        identity_id: impl Into<String>,
        outcome: Outcome,
        detail: serde_json::Value,
        occurred_at: DateTime<Utc>,
    ) -> ComplianceEvent {
        ComplianceEvent {
            id: uuid::Uuid::new_v4().to_string(),
            event_type,
            identity_id: identity_id.into(),
            outcome,
            detail,
            occurred_at,
        }
    }
}

/// Append-only destination for compliance events
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Sink name for logging
    fn name(&self) -> &str;

    /// Append one event
    async fn append(&self, event: &ComplianceEvent) -> ComplianceResult<()>;

    /// Append events in order
    async fn append_all(&self, events: &[ComplianceEvent]) -> ComplianceResult<()> {
        for event in events {
            self.append(event).await?;
        }
        Ok(())
    }

    /// Every event appended so far, in append order
    async fn read_all(&self) -> ComplianceResult<Vec<ComplianceEvent>>;
}

/// Append-only JSONL audit ledger
///
/// Each line is one JSON-serialized [`ComplianceEvent`]. The file is only
/// ever appended to.
pub struct AuditLedger {
    path: PathBuf,
    file: Mutex<File>,
}

impl AuditLedger {
    /// Open (or create) a ledger at the given path
    pub fn open(path: impl AsRef<Path>) -> ComplianceResult<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        Ok(Self {
            path,
            file: Mutex::new(File::from_std(file)),
        })
    }

    /// Read events starting at a line offset (for checkpointing)
    pub async fn read_from(&self, start_line: usize) -> ComplianceResult<Vec<ComplianceEvent>> {
        let mut lines = BufReader::new(File::open(&self.path).await?).lines();
        let mut events = Vec::new();
        let mut index = 0;

        while let Some(line) = lines.next_line().await? {
            index += 1;
            if index <= start_line || line.trim().is_empty() {
                continue;
            }
            events.push(serde_json::from_str(&line)?);
        }

        Ok(events)
    }

    /// Current line count
    pub async fn line_count(&self) -> ComplianceResult<usize> {
        let mut lines = BufReader::new(File::open(&self.path).await?).lines();
        let mut count = 0;
        while lines.next_line().await?.is_some() {
            count += 1;
        }
        Ok(count)
    }

    /// Path to the ledger file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl AuditSink for AuditLedger {
    fn name(&self) -> &str {
        "jsonl"
    }

    async fn append(&self, event: &ComplianceEvent) -> ComplianceResult<()> {
        let mut line = serde_json::to_string(event)?;
        line.push('\n');

        let mut file = self.file.lock().await;
        let written = match file.write_all(line.as_bytes()).await {
            Ok(()) => file.flush().await,
            Err(e) => Err(e),
        };
        written.map_err(|e| {
            tracing::error!(path = %self.path.display(), error = %e, "Audit append failed");
            ComplianceError::AuditWrite(e.to_string())
        })
    }

    async fn read_all(&self) -> ComplianceResult<Vec<ComplianceEvent>> {
        // Hold the writer so a half-written line is never read
        let _writer = self.file.lock().await;
        self.read_from(0).await
    }
}

/// In-memory audit sink (tests, dry runs)
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    events: Mutex<Vec<ComplianceEvent>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of events held
    pub async fn len(&self) -> usize {
        self.events.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.events.lock().await.is_empty()
    }
}

#[async_trait]
impl AuditSink for MemoryAuditSink {
    fn name(&self) -> &str {
        "memory"
    }

    async fn append(&self, event: &ComplianceEvent) -> ComplianceResult<()> {
        self.events.lock().await.push(event.clone());
        Ok(())
    }

    async fn read_all(&self) -> ComplianceResult<Vec<ComplianceEvent>> {
        Ok(self.events.lock().await.clone())
    }
}
