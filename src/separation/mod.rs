//! Source separation backends and the cache-aware orchestrator

#[cfg(any(feature = "stems", test))]
pub mod chunking;
pub mod demucs;
#[cfg(feature = "stems")]
pub mod onnx;
pub mod orchestrator;

pub use demucs::DemucsCommand;
#[cfg(feature = "stems")]
pub use onnx::OnnxSeparator;
pub use orchestrator::{normalize_layout, SeparationOrchestrator, SeparationOutcome};
