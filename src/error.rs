use thiserror::Error;

/// Failure of a single batch classification call. A batch either fully
/// classifies or fully fails; there is no partial-batch success.
#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("classification request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("classification service returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("classification response contained no content")]
    EmptyResponse,

    #[error("classification response was not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum AnalyzeError {
    #[error("no comments to analyze")]
    EmptyInput,

    #[error("all batch analyses failed")]
    AllBatchesFailed,

    #[error(transparent)]
    Classify(#[from] ClassifyError),
}
