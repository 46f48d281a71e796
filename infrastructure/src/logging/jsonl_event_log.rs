//! JSONL file writer for moderation events.
//!
//! Each [`ModerationEvent`] is serialized as a single JSON line carrying its
//! `type` tag plus a `timestamp`, appended through a buffered writer.

use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::warn;
use votemute_application::EventSink;
use votemute_domain::ModerationEvent;

/// Event log that appends one JSON object per line.
///
/// Flushes after every line and on `Drop`.
pub struct JsonlEventLog {
    writer: Mutex<BufWriter<File>>,
    path: PathBuf,
}

impl JsonlEventLog {
    /// Open (or create) the log at `path`, appending to existing content.
    ///
    /// Parent directories are created as needed.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            writer: Mutex::new(BufWriter::new(file)),
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl EventSink for JsonlEventLog {
    fn emit(&self, event: ModerationEvent) {
        let timestamp = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true);

        let mut record = match serde_json::to_value(&event) {
            Ok(serde_json::Value::Object(map)) => map,
            Ok(_) | Err(_) => {
                warn!(event = event.event_type(), "Could not serialize moderation event");
                return;
            }
        };
        record.insert(
            "timestamp".to_string(),
            serde_json::Value::String(timestamp),
        );

        let Ok(line) = serde_json::to_string(&record) else {
            return;
        };

        let mut writer = self.writer.lock();
        if let Err(e) = writeln!(writer, "{}", line).and_then(|_| writer.flush()) {
            warn!(path = %self.path.display(), error = %e, "Could not write event log");
        }
    }
}

impl Drop for JsonlEventLog {
    fn drop(&mut self) {
        let _ = self.writer.lock().flush();
    }
}
