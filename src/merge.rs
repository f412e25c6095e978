use itertools::Itertools;
use std::collections::HashMap;
use tracing::{debug, warn};
use unicode_normalization::UnicodeNormalization;
use xxhash_rust::xxh3::xxh3_64;

use crate::models::{
    AggregateInsights, AnalysisResult, BatchAnalysis, CommentClassification, FeedbackGroup,
    IssueGroup, OverallSentiment, QuestionGroup, Sentiment,
};

pub const MAX_FEEDBACK_GROUPS: usize = 20;
pub const MAX_ISSUE_GROUPS: usize = 15;
pub const MAX_QUESTION_GROUPS: usize = 15;
const MAX_RANKED_INSIGHTS: usize = 10;

/// Case/whitespace-normalized dedup key: two groups with the same key
/// collapse into one. Match quality is surface-level on purpose.
pub fn group_key(title: &str) -> String {
    let folded = title.nfc().collect::<String>().to_lowercase();
    let collapsed = folded.split_whitespace().join(" ");
    collapsed.trim_end_matches(['?', '.', '!']).trim_end().to_string()
}

/// Stable id derived from the dedup key, so the same theme keeps the same id
/// across runs.
pub fn group_id(key: &str) -> String {
    format!("{:016x}", xxh3_64(key.as_bytes()))
}

trait ThemedGroup: Clone {
    fn title(&self) -> &str;
    /// Fold `other` into self: counts sum, index sets union; first-seen
    /// title/description/quote win.
    fn absorb(&mut self, other: &Self);
}

impl ThemedGroup for FeedbackGroup {
    fn title(&self) -> &str {
        &self.title
    }
    fn absorb(&mut self, other: &Self) {
        self.mention_count += other.mention_count;
        self.source_indices.extend(other.source_indices.iter().copied());
        self.priority = self.priority.max(other.priority);
    }
}

impl ThemedGroup for IssueGroup {
    fn title(&self) -> &str {
        &self.title
    }
    fn absorb(&mut self, other: &Self) {
        self.mention_count += other.mention_count;
        self.source_indices.extend(other.source_indices.iter().copied());
        self.priority = self.priority.max(other.priority);
    }
}

impl ThemedGroup for QuestionGroup {
    fn title(&self) -> &str {
        &self.title
    }
    fn absorb(&mut self, other: &Self) {
        self.mention_count += other.mention_count;
        self.source_indices.extend(other.source_indices.iter().copied());
    }
}

fn merge_family<G: ThemedGroup>(incoming: impl IntoIterator<Item = G>) -> Vec<G> {
    let mut order: Vec<String> = Vec::new();
    let mut by_key: HashMap<String, G> = HashMap::new();

    for group in incoming {
        let key = group_key(group.title());
        if let Some(existing) = by_key.get_mut(&key) {
            existing.absorb(&group);
        } else {
            order.push(key.clone());
            by_key.insert(key, group);
        }
    }

    order.into_iter().filter_map(|k| by_key.remove(&k)).collect()
}

/// Merge per-batch fragments (already ordered by batch index) into the final
/// result. Classification concatenation relies on batches having been cut
/// from the input in order; no re-sort happens here beyond that invariant.
pub fn merge_batches(fragments: &[BatchAnalysis], original_item_count: usize) -> AnalysisResult {
    let classifications: Vec<CommentClassification> = fragments
        .iter()
        .flat_map(|f| f.classifications.iter().cloned())
        .collect();

    if classifications.len() != original_item_count {
        warn!(
            "Merge - classified {} of {} comments; the rest were lost to failed batches",
            classifications.len(),
            original_item_count
        );
    } else {
        debug!("Merge - all {} comments classified", original_item_count);
    }

    let mut feedback = merge_family(fragments.iter().flat_map(|f| f.feedback.iter().cloned()));
    feedback.sort_by(|a, b| {
        b.priority
            .cmp(&a.priority)
            .then(b.mention_count.cmp(&a.mention_count))
    });
    feedback.truncate(MAX_FEEDBACK_GROUPS);

    let mut issues = merge_family(fragments.iter().flat_map(|f| f.issues.iter().cloned()));
    issues.sort_by(|a, b| {
        b.priority
            .cmp(&a.priority)
            .then(b.mention_count.cmp(&a.mention_count))
    });
    issues.truncate(MAX_ISSUE_GROUPS);

    let mut questions = merge_family(fragments.iter().flat_map(|f| f.questions.iter().cloned()));
    questions.sort_by(|a, b| b.mention_count.cmp(&a.mention_count));
    questions.truncate(MAX_QUESTION_GROUPS);

    debug!(
        "Merge - groups: feedback={}, issues={}, questions={}",
        feedback.len(),
        issues.len(),
        questions.len()
    );

    let insights = aggregate_insights(&classifications, fragments);

    AnalysisResult {
        classifications,
        feedback,
        issues,
        questions,
        insights,
        failed_batches: Vec::new(),
    }
}

pub fn aggregate_insights(
    classifications: &[CommentClassification],
    fragments: &[BatchAnalysis],
) -> AggregateInsights {
    AggregateInsights {
        overall_sentiment: overall_sentiment(classifications),
        satisfaction_score: satisfaction_score(classifications),
        key_insights: rank_by_frequency(
            fragments.iter().flat_map(|f| f.key_insights.iter()),
            MAX_RANKED_INSIGHTS,
        ),
        top_concerns: rank_by_frequency(
            fragments.iter().flat_map(|f| f.top_concerns.iter()),
            MAX_RANKED_INSIGHTS,
        ),
    }
}

/// Positive needs a strict majority on top of outnumbering negatives;
/// negative flags as soon as it crosses 30%. The asymmetry is product policy.
fn overall_sentiment(classifications: &[CommentClassification]) -> OverallSentiment {
    let total = classifications.len();
    let positive = classifications
        .iter()
        .filter(|c| c.sentiment.is_positive_leaning())
        .count();
    let negative = classifications
        .iter()
        .filter(|c| c.sentiment == Sentiment::Negative)
        .count();

    if positive > negative && 2 * positive > total {
        OverallSentiment::Positive
    } else if negative > positive && 10 * negative > 3 * total {
        OverallSentiment::Negative
    } else {
        OverallSentiment::Mixed
    }
}

fn satisfaction_score(classifications: &[CommentClassification]) -> u8 {
    if classifications.is_empty() {
        return 0;
    }
    let positive = classifications
        .iter()
        .filter(|c| c.sentiment.is_positive_leaning())
        .count();
    ((100.0 * positive as f64) / classifications.len() as f64).round() as u8
}

/// Exact-string frequency ranking, ties broken by first-seen order.
fn rank_by_frequency<'a>(pool: impl Iterator<Item = &'a String>, cap: usize) -> Vec<String> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut order: Vec<&str> = Vec::new();

    for s in pool {
        let n = counts.entry(s.as_str()).or_insert(0);
        if *n == 0 {
            order.push(s.as_str());
        }
        *n += 1;
    }

    order
        .iter()
        .enumerate()
        .sorted_by(|(ia, a), (ib, b)| counts[*b].cmp(&counts[*a]).then(ia.cmp(ib)))
        .map(|(_, s)| s.to_string())
        .take(cap)
        .collect()
}
