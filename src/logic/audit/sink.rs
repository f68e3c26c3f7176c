//! Audit Sinks
//!
//! `AuditSink` is the append-only consumer of audit events. The pipeline
//! treats emission as best-effort: a sink failure is logged and dropped,
//! never allowed to block or alter a decision.
//!
//! `JsonlAuditSink` writes one JSON object per line with size-based rotation
//! and a flush per event. Constructed at startup and injected - no global
//! recorder state.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{Datelike, Timelike, Utc};
use parking_lot::Mutex;

use super::event::AuditEvent;

// ============================================================================
// CONSTANTS
// ============================================================================

/// Maximum file size before rotation (50 MB)
const MAX_FILE_SIZE: u64 = 50 * 1024 * 1024;

/// Log file extension
const LOG_EXT: &str = ".jsonl";

// ============================================================================
// TRAIT
// ============================================================================

/// Append-only audit event consumer.
pub trait AuditSink: Send + Sync {
    fn emit(&self, event: &AuditEvent) -> std::io::Result<()>;
}

// ============================================================================
// JSONL SINK
// ============================================================================

struct SinkFile {
    writer: BufWriter<File>,
    current_file: PathBuf,
    current_size: u64,
}

/// Rotating append-only JSONL sink.
pub struct JsonlAuditSink {
    state: Mutex<SinkFile>,
    base_dir: PathBuf,
    events_emitted: AtomicU64,
}

impl JsonlAuditSink {
    /// Create a sink writing under the given directory.
    pub fn new(base_dir: PathBuf) -> std::io::Result<Self> {
        std::fs::create_dir_all(&base_dir)?;
        let (current_file, file) = Self::open_new_file(&base_dir)?;

        Ok(Self {
            state: Mutex::new(SinkFile {
                writer: BufWriter::new(file),
                current_file,
                current_size: 0,
            }),
            base_dir,
            events_emitted: AtomicU64::new(0),
        })
    }

    /// Default log directory under the local data dir.
    pub fn default_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("face-locker")
            .join("audit_logs")
    }

    /// Open a new log file with timestamp
    fn open_new_file(base_dir: &Path) -> std::io::Result<(PathBuf, File)> {
        let now = Utc::now();
        let filename = format!(
            "audit_{}_{:02}_{:02}_{:02}{:02}{:02}{}",
            now.year(),
            now.month(),
            now.day(),
            now.hour(),
            now.minute(),
            now.second(),
            LOG_EXT
        );
        let file_path = base_dir.join(&filename);

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&file_path)?;

        log::info!("Opened audit log: {:?}", file_path);
        Ok((file_path, file))
    }

    pub fn current_file(&self) -> PathBuf {
        self.state.lock().current_file.clone()
    }

    pub fn events_emitted(&self) -> u64 {
        self.events_emitted.load(Ordering::SeqCst)
    }
}

impl AuditSink for JsonlAuditSink {
    fn emit(&self, event: &AuditEvent) -> std::io::Result<()> {
        let line = event.to_jsonl();
        let bytes = line.as_bytes();

        let mut state = self.state.lock();

        if state.current_size + bytes.len() as u64 > MAX_FILE_SIZE {
            state.writer.flush()?;
            let (new_path, new_file) = Self::open_new_file(&self.base_dir)?;
            log::info!("Rotated audit log to {:?}", new_path);
            state.writer = BufWriter::new(new_file);
            state.current_file = new_path;
            state.current_size = 0;
        }

        state.writer.write_all(bytes)?;
        state.writer.write_all(b"\n")?;
        state.current_size += bytes.len() as u64 + 1;

        // Flush for durability
        state.writer.flush()?;

        self.events_emitted.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Read all events back from one log file.
pub fn read_events(file_path: &Path) -> std::io::Result<Vec<AuditEvent>> {
    let file = File::open(file_path)?;
    let reader = BufReader::new(file);
    let mut events = Vec::new();

    for line in reader.lines() {
        let line = line?;
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<AuditEvent>(&line) {
            Ok(event) => events.push(event),
            Err(e) => log::warn!("skipping malformed audit line: {}", e),
        }
    }

    Ok(events)
}

// ============================================================================
// MEMORY SINK
// ============================================================================

/// In-memory sink for tests and demos.
#[derive(Default)]
pub struct MemoryAuditSink {
    events: Mutex<Vec<AuditEvent>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}

impl AuditSink for MemoryAuditSink {
    fn emit(&self, event: &AuditEvent) -> std::io::Result<()> {
        self.events.lock().push(event.clone());
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================
