//! JSONL file writer for turn records.
//!
//! One file per session at `<results_dir>/<scenario_slug>/<session_id>.jsonl`.
//! Every line is a JSON object with a `type` field (`session_start`, `turn`
//! or `session_end`) and a `timestamp`, appended via a buffered writer.

use committee_application::{SessionStart, TurnRecord, TurnRecorder};
use committee_domain::SessionReport;
use serde::Serialize;
use serde_json::Value;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, warn};

#[derive(Default)]
struct RecorderState {
    writer: Option<BufWriter<File>>,
    path: Option<PathBuf>,
}

/// JSONL turn recorder that writes one JSON object per line.
///
/// Thread-safe via `Mutex`. The file is opened by `start_session` and
/// closed by `end_session`; records arriving outside a session are dropped.
pub struct JsonlTurnRecorder {
    results_dir: PathBuf,
    state: Mutex<RecorderState>,
}

impl JsonlTurnRecorder {
    pub fn new(results_dir: impl Into<PathBuf>) -> Self {
        Self {
            results_dir: results_dir.into(),
            state: Mutex::new(RecorderState::default()),
        }
    }

    pub fn results_dir(&self) -> &Path {
        &self.results_dir
    }

    /// Path of the current (or most recent) session file
    pub fn path(&self) -> Option<PathBuf> {
        self.state.lock().ok().and_then(|s| s.path.clone())
    }

    fn open(&self, start: &SessionStart) -> Option<(BufWriter<File>, PathBuf)> {
        let dir = self.results_dir.join(&start.scenario_slug);
        if let Err(e) = std::fs::create_dir_all(&dir) {
            warn!("Could not create results directory {}: {}", dir.display(), e);
            return None;
        }

        let path = dir.join(format!("{}.jsonl", start.session_id));
        match File::create(&path) {
            Ok(file) => Some((BufWriter::new(file), path)),
            Err(e) => {
                warn!("Could not create turn log file {}: {}", path.display(), e);
                None
            }
        }
    }

    fn write_line(&self, event_type: &str, payload: &impl Serialize) {
        let record = match serde_json::to_value(payload) {
            Ok(Value::Object(mut map)) => {
                map.insert("type".to_string(), Value::String(event_type.to_string()));
                map.insert("timestamp".to_string(), Value::String(timestamp()));
                Value::Object(map)
            }
            Ok(other) => serde_json::json!({
                "type": event_type,
                "timestamp": timestamp(),
                "data": other,
            }),
            Err(e) => {
                warn!("Could not serialize {} record: {}", event_type, e);
                return;
            }
        };

        let Ok(line) = serde_json::to_string(&record) else {
            return;
        };

        if let Ok(mut state) = self.state.lock() {
            match state.writer.as_mut() {
                Some(writer) => {
                    let _ = writeln!(writer, "{}", line);
                    // JSONL is append-only; flush per line so a crash keeps earlier turns
                    let _ = writer.flush();
                }
                None => debug!("Dropping {} record: no open session file", event_type),
            }
        }
    }
}

fn timestamp() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

impl TurnRecorder for JsonlTurnRecorder {
    fn start_session(&self, start: &SessionStart) {
        let opened = self.open(start);
        if let Ok(mut state) = self.state.lock() {
            if let Some(mut previous) = state.writer.take() {
                let _ = previous.flush();
            }
            match opened {
                Some((writer, path)) => {
                    debug!("Recording turns to {}", path.display());
                    state.writer = Some(writer);
                    state.path = Some(path);
                }
                None => state.path = None,
            }
        }
        self.write_line("session_start", start);
    }

    fn log_turn(&self, record: &TurnRecord) {
        self.write_line("turn", record);
    }

    fn end_session(&self, report: &SessionReport) {
        self.write_line("session_end", report);
        if let Ok(mut state) = self.state.lock()
            && let Some(mut writer) = state.writer.take()
        {
            let _ = writer.flush();
        }
    }
}

impl Drop for JsonlTurnRecorder {
    fn drop(&mut self) {
        if let Ok(mut state) = self.state.lock()
            && let Some(writer) = state.writer.as_mut()
        {
            let _ = writer.flush();
        }
    }
}
