//! Request-level orchestration of separation, mixing and analysis

mod orchestrator;

pub use orchestrator::{AnalysisReport, AnalysisRequest, MixReport, Pipeline};
