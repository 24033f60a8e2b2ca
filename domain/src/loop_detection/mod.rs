//! Loop detection over the bounded action history

pub mod detector;

pub use detector::{AllowReason, LoopDetector, LoopPolicy, LoopVerdict};
