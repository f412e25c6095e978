use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A single input comment. Comments carry no identity of their own; their
/// 1-based position in the input sequence is what group `source_indices`
/// refer to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub content: String,
    #[serde(default)]
    pub likes: u32,
    #[serde(default)]
    pub author: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
    Compliment,
}

impl Sentiment {
    pub fn is_positive_leaning(self) -> bool {
        matches!(self, Sentiment::Positive | Sentiment::Compliment)
    }
}

/// Per-comment verdict. `source_index` is the explicit 1-based position in
/// the original sequence; merged output is ordered by it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentClassification {
    pub source_index: usize,
    pub content: String,
    pub likes: u32,
    pub author: Option<String>,
    pub sentiment: Sentiment,
}

/// Declaration order is the sort order (Low < Moderate < High).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Priority {
    Low,
    Moderate,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum QuestionCategory {
    Pricing,
    Features,
    Support,
    Technical,
    General,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackGroup {
    pub group_id: String,
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub mention_count: u32,
    pub representative_quote: String,
    pub source_indices: BTreeSet<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueGroup {
    pub group_id: String,
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub mention_count: u32,
    pub representative_quote: String,
    pub source_indices: BTreeSet<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionGroup {
    pub group_id: String,
    pub title: String,
    pub description: String,
    pub category: QuestionCategory,
    pub mention_count: u32,
    pub representative_quote: String,
    pub source_indices: BTreeSet<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OverallSentiment {
    Positive,
    Negative,
    Mixed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregateInsights {
    pub overall_sentiment: OverallSentiment,
    pub satisfaction_score: u8,
    pub key_insights: Vec<String>,
    pub top_concerns: Vec<String>,
}

/// Identity of a batch whose classification failed: which batch it was and
/// which 1-based input positions went unanalyzed. Callers wanting to recover
/// those comments can re-submit exactly these positions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailedBatch {
    pub batch_index: usize,
    pub source_indices: Vec<usize>,
}

/// Root output of one pipeline run. Constructed once, immutable thereafter;
/// ownership passes entirely to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub classifications: Vec<CommentClassification>,
    pub feedback: Vec<FeedbackGroup>,
    pub issues: Vec<IssueGroup>,
    pub questions: Vec<QuestionGroup>,
    pub insights: AggregateInsights,
    pub failed_batches: Vec<FailedBatch>,
}

/// Normalized result of classifying one batch, produced by the adapter.
/// Group `source_indices` are already remapped to global 1-based positions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchAnalysis {
    pub classifications: Vec<CommentClassification>,
    pub feedback: Vec<FeedbackGroup>,
    pub issues: Vec<IssueGroup>,
    pub questions: Vec<QuestionGroup>,
    pub key_insights: Vec<String>,
    pub top_concerns: Vec<String>,
}
