use tracing::{debug, info};

use crate::batch::{batch_fixed, Batch};
use crate::classify::ClassifyBackend;
use crate::config::VibesConfig;
use crate::dispatch::dispatch_all;
use crate::error::AnalyzeError;
use crate::merge::merge_batches;
use crate::models::{AnalysisResult, Comment};

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub batch_size: usize,
    /// At or below this many comments the whole input goes out as one direct
    /// classify call, with no batching or partial-failure semantics.
    pub single_call_threshold: usize,
    pub max_in_flight: usize,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            batch_size: 40,
            single_call_threshold: 50,
            max_in_flight: 12,
        }
    }
}

impl From<&VibesConfig> for PipelineOptions {
    fn from(cfg: &VibesConfig) -> Self {
        Self {
            batch_size: cfg.batch_size,
            single_call_threshold: cfg.single_call_threshold,
            max_in_flight: cfg.max_in_flight,
        }
    }
}

/// Coarse progress checkpoint. `current` never decreases over one run.
#[derive(Debug, Clone, Copy)]
pub struct Progress {
    pub current: u32,
    pub total: u32,
    pub stage: &'static str,
}

/// Best-effort observer; losing a notification never affects the result.
pub type ProgressSink = dyn Fn(Progress) + Send + Sync;

/// The one entry point consumers call.
pub async fn analyze<C: ClassifyBackend>(
    classifier: &C,
    comments: &[Comment],
    context: Option<&str>,
    options: &PipelineOptions,
    progress: Option<&ProgressSink>,
) -> Result<AnalysisResult, AnalyzeError> {
    let start = std::time::Instant::now();
    let emit = |current: u32, stage: &'static str| {
        if let Some(sink) = progress {
            sink(Progress {
                current,
                total: 100,
                stage,
            });
        }
    };

    emit(0, "preparing");
    if comments.is_empty() {
        return Err(AnalyzeError::EmptyInput);
    }

    info!(
        "Analysis started - comments={}, context={}",
        comments.len(),
        context.is_some()
    );

    let result = if comments.len() <= options.single_call_threshold {
        debug!(
            "Single-call path - {} comments at or below threshold {}",
            comments.len(),
            options.single_call_threshold
        );
        let single = Batch {
            index: 0,
            offset: 0,
            comments: comments.to_vec(),
        };
        emit(10, "dispatched");
        let fragment = classifier.classify(&single, context).await?;
        emit(85, "merging");
        merge_batches(&[fragment], comments.len())
    } else {
        let batches = batch_fixed(comments, options.batch_size);
        emit(10, "dispatched");
        let outcome = dispatch_all(classifier, &batches, context, options.max_in_flight).await?;
        emit(85, "merging");
        let mut merged = merge_batches(&outcome.fragments, comments.len());
        merged.failed_batches = outcome.failed;
        merged
    };

    emit(100, "complete");
    info!(
        "Analysis completed - duration={:.2}s, classified={}/{}, satisfaction={}%",
        start.elapsed().as_secs_f32(),
        result.classifications.len(),
        comments.len(),
        result.insights.satisfaction_score
    );
    Ok(result)
}
