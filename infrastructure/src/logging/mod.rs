//! Logging infrastructure: structured turn recording.
//!
//! Provides [`JsonlTurnRecorder`], a JSONL file writer that implements
//! the [`TurnRecorder`](committee_application::TurnRecorder) port.

mod jsonl_recorder;

pub use jsonl_recorder::JsonlTurnRecorder;
