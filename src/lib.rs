//! Batched LLM sentiment and theme analysis for social-media comments.
//!
//! Comments are cut into order-preserving batches, classified concurrently
//! against an OpenAI-compatible endpoint, and merged back into one
//! [`models::AnalysisResult`]: per-comment sentiment, deduplicated thematic
//! groups (feedback, issues, questions) and aggregate insights. Batches fail
//! independently; one surviving batch is enough for a result, and the
//! identity of lost batches is reported alongside it.

pub mod api_types;
pub mod batch;
pub mod budget;
pub mod classify;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod merge;
pub mod models;
pub mod pipeline;
pub mod prompts;
pub mod render;

pub use classify::{ClassifyBackend, HttpClassifier};
pub use error::{AnalyzeError, ClassifyError};
pub use models::{AnalysisResult, Comment};
pub use pipeline::{analyze, PipelineOptions, Progress};
