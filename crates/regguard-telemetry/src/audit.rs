//! Hash-chained audit trail of compliance rounds
//!
//! Every event stores the SHA-256 hash of its own content together with the
//! hash of the event before it, so editing, dropping or reordering any event
//! breaks verification from that point on. Trails persist as JSON lines.

use regguard_core::{ComplianceReport, Result, Severity};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::OpenOptions;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};

/// Audit trail with hash-chained events for tamper detection
#[derive(Debug, Default)]
pub struct AuditTrail {
    events: Vec<AuditEvent>,
    chain_hash: Option<String>,
}

impl AuditTrail {
    /// Create an empty audit trail
    pub fn new() -> Self {
        Self::default()
    }

    /// Link an event to the end of the chain without storing it
    pub fn chain_event(&mut self, mut event: AuditEvent) -> AuditEvent {
        event.previous_hash = self.chain_hash.clone();
        let hash = compute_hash(&event);
        event.hash = Some(hash.clone());
        self.chain_hash = Some(hash);
        event
    }

    /// Append an event and return the stored, chained copy
    pub fn add_event(&mut self, event: AuditEvent) -> &AuditEvent {
        let event = self.chain_event(event);
        self.events.push(event);
        &self.events[self.events.len() - 1]
    }

    /// Verify the integrity of the whole trail
    pub fn verify(&self) -> bool {
        self.first_broken_link().is_none()
    }

    /// Index of the first event whose hash or back-link does not check out
    pub fn first_broken_link(&self) -> Option<usize> {
        let mut prev_hash: Option<&String> = None;

        for (index, event) in self.events.iter().enumerate() {
            if event.previous_hash.as_ref() != prev_hash {
                return Some(index);
            }
            if event.hash.as_deref() != Some(compute_hash(event).as_str()) {
                return Some(index);
            }
            prev_hash = event.hash.as_ref();
        }

        None
    }

    /// All events, oldest first
    pub fn events(&self) -> &[AuditEvent] {
        &self.events
    }

    /// Number of events
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the trail has no events
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Load a trail from a JSON-lines file, keeping events exactly as stored.
    ///
    /// A missing file is an empty trail. Call [`verify`](Self::verify) to
    /// check the loaded chain.
    pub fn load_jsonl(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!("No audit log at {}, starting a new trail", path.display());
            return Ok(Self::new());
        }

        let reader = BufReader::new(std::fs::File::open(path)?);
        let mut events = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            events.push(serde_json::from_str::<AuditEvent>(&line)?);
        }

        let chain_hash = events.last().and_then(|e| e.hash.clone());
        Ok(Self { events, chain_hash })
    }

    /// Append the events from `start` onwards to a JSON-lines file
    pub fn append_jsonl(&self, path: impl AsRef<Path>, start: usize) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path.as_ref())?;

        for event in self.events.iter().skip(start) {
            writeln!(file, "{}", serde_json::to_string(event)?)?;
        }
        file.flush()?;
        Ok(())
    }
}

/// A single audit event in the trail
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Unique event ID
    pub id: String,

    /// Event category
    pub event_type: String,

    /// Where the audited content came from (file name, request id)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    /// Event data (JSON serialized)
    pub data: Option<String>,

    /// Milliseconds since the Unix epoch
    pub timestamp_ms: u64,

    /// Severity level
    pub severity: AuditSeverity,

    /// Hash of this event
    pub hash: Option<String>,

    /// Hash of the previous event
    pub previous_hash: Option<String>,
}

impl AuditEvent {
    /// Create a new audit event
    pub fn new(event_type: impl Into<String>) -> Self {
        let timestamp_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default();

        Self {
            id: format!("evt_{}", uuid::Uuid::new_v4()),
            event_type: event_type.into(),
            source: None,
            data: None,
            timestamp_ms,
            severity: AuditSeverity::Info,
            hash: None,
            previous_hash: None,
        }
    }

    /// Summarize a compliance round
    pub fn from_report(report: &ComplianceReport) -> Self {
        let data = serde_json::json!({
            "overallCompliant": report.overall_compliant,
            "modules": report.module_results.names(),
            "failingModules": report.failing_modules(),
            "totalViolations": report.summary.total_violations,
            "violationsBySeverity": report.summary.violations_by_severity,
        });

        let highest = report
            .module_results
            .iter()
            .filter_map(|(_, result)| result.max_severity())
            .max();

        Self::new("compliance_round")
            .with_data(data)
            .with_severity(AuditSeverity::from_violation(highest))
    }

    /// Set the content source
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Set event data
    pub fn with_data(mut self, data: impl Serialize) -> Self {
        match serde_json::to_string(&data) {
            Ok(json) => self.data = Some(json),
            Err(e) => warn!("Dropping unserializable audit data: {}", e),
        }
        self
    }

    /// Set severity
    pub fn with_severity(mut self, severity: AuditSeverity) -> Self {
        self.severity = severity;
        self
    }
}

/// How loudly an audit event should be surfaced
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditSeverity {
    Info,
    Warning,
    High,
    Critical,
}

impl AuditSeverity {
    /// Map the highest violation of a round onto an audit level
    pub fn from_violation(severity: Option<Severity>) -> Self {
        match severity {
            None => Self::Info,
            Some(Severity::Low | Severity::Medium) => Self::Warning,
            Some(Severity::High) => Self::High,
            Some(Severity::Critical) => Self::Critical,
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

/// Hash of everything in the event except its own hash
fn compute_hash(event: &AuditEvent) -> String {
    let mut hasher = Sha256::new();

    hasher.update(event.id.as_bytes());
    hasher.update(event.event_type.as_bytes());
    if let Some(ref source) = event.source {
        hasher.update(source.as_bytes());
    }
    if let Some(ref data) = event.data {
        hasher.update(data.as_bytes());
    }
    hasher.update(event.timestamp_ms.to_be_bytes());
    hasher.update(event.severity.as_str().as_bytes());
    if let Some(ref prev) = event.previous_hash {
        hasher.update(prev.as_bytes());
    }

    format!("{:x}", hasher.finalize())
}
