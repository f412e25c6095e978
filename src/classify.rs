use reqwest::Client;
use serde_json::json;
use std::collections::{BTreeSet, HashMap};
use std::future::Future;
use tracing::{debug, info, warn};

use crate::api_types::{ApiClassification, ChatMessage, ChatRequest, ChatResponse};
use crate::batch::Batch;
use crate::budget::approx_tokens;
use crate::config::VibesConfig;
use crate::error::ClassifyError;
use crate::merge::{group_id, group_key};
use crate::models::{
    BatchAnalysis, CommentClassification, FeedbackGroup, IssueGroup, Priority, QuestionCategory,
    QuestionGroup, Sentiment,
};
use crate::prompts;

/// One operation: classify a batch, or fail as a unit. The pipeline and the
/// dispatcher only know this seam, so tests drive them with stub backends.
pub trait ClassifyBackend: Send + Sync {
    fn classify(
        &self,
        batch: &Batch,
        context: Option<&str>,
    ) -> impl Future<Output = Result<BatchAnalysis, ClassifyError>> + Send;
}

/// Production backend: OpenAI-compatible chat-completions endpoint in JSON
/// mode, strict-JSON reply parsed into wire types then normalized.
pub struct HttpClassifier {
    client: Client,
    cfg: VibesConfig,
}

impl HttpClassifier {
    pub fn new(cfg: VibesConfig) -> Self {
        Self {
            client: Client::new(),
            cfg,
        }
    }
}

impl ClassifyBackend for HttpClassifier {
    async fn classify(
        &self,
        batch: &Batch,
        context: Option<&str>,
    ) -> Result<BatchAnalysis, ClassifyError> {
        let start = std::time::Instant::now();

        let items: Vec<serde_json::Value> = batch
            .comments
            .iter()
            .enumerate()
            .map(|(i, c)| {
                json!({
                    "position": i + 1,
                    "text": c.content,
                    "weight": c.likes,
                })
            })
            .collect();
        let comments_json = serde_json::Value::Array(items).to_string();
        let user = prompts::user_classification(&comments_json, context);

        debug!(
            "Classification call starting - batch={}, comments={}, prompt_tokens~{}",
            batch.index,
            batch.comments.len(),
            approx_tokens(&user)
        );

        let request = ChatRequest {
            model: self.cfg.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: prompts::system_classifier(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: user,
                },
            ],
            temperature: self.cfg.temperature,
            max_tokens: self.cfg.max_tokens,
            response_format: json!({ "type": "json_object" }),
        };

        let url = format!(
            "{}/chat/completions",
            self.cfg.api_base.trim_end_matches('/')
        );
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.cfg.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(ClassifyError::Status { status, body });
        }

        let body = response.text().await?;
        if body.trim().is_empty() {
            return Err(ClassifyError::EmptyResponse);
        }
        let chat: ChatResponse = serde_json::from_str(&body)?;
        let content = chat
            .choices
            .first()
            .map(|c| c.message.content.clone())
            .unwrap_or_default();
        if content.trim().is_empty() {
            return Err(ClassifyError::EmptyResponse);
        }

        let api: ApiClassification = serde_json::from_str(strip_code_fence(&content))?;
        let analysis = normalize_batch(batch, api);

        info!(
            "Classification call completed - batch={}, duration={:.2}s, response_length={} chars",
            batch.index,
            start.elapsed().as_secs_f32(),
            content.len()
        );
        Ok(analysis)
    }
}

/// Models often wrap the JSON document in a markdown fence; strip it before
/// parsing.
fn strip_code_fence(s: &str) -> &str {
    let t = s.trim();
    let t = t
        .strip_prefix("```json")
        .or_else(|| t.strip_prefix("```"))
        .unwrap_or(t);
    let t = t.strip_suffix("```").unwrap_or(t);
    t.trim()
}

/// Map the wire document into a normalized per-batch fragment: per-position
/// sentiments (NEUTRAL where the service gave no verdict), the compliment
/// promotion, and batch-local positions remapped to global 1-based indices.
pub fn normalize_batch(batch: &Batch, api: ApiClassification) -> BatchAnalysis {
    let mut verdicts: HashMap<usize, Sentiment> = HashMap::new();
    for s in &api.sentiments {
        if let Some(sentiment) = parse_sentiment(&s.sentiment) {
            verdicts.insert(s.position as usize, sentiment);
        }
    }

    let mut defaulted = 0usize;
    let classifications: Vec<CommentClassification> = batch
        .comments
        .iter()
        .enumerate()
        .map(|(i, c)| {
            let mut sentiment = match verdicts.get(&(i + 1)) {
                Some(s) => *s,
                None => {
                    defaulted += 1;
                    Sentiment::Neutral
                }
            };
            if sentiment == Sentiment::Positive && is_compliment(&c.content) {
                sentiment = Sentiment::Compliment;
            }
            CommentClassification {
                source_index: batch.offset + i + 1,
                content: c.content.clone(),
                likes: c.likes,
                author: c.author.clone(),
                sentiment,
            }
        })
        .collect();

    if defaulted > 0 {
        warn!(
            "Batch {} - {} comments had no sentiment verdict, defaulted to NEUTRAL",
            batch.index, defaulted
        );
    }

    let feedback = api
        .feedback
        .iter()
        .map(|t| FeedbackGroup {
            group_id: group_id(&group_key(&t.title)),
            title: t.title.clone(),
            description: t.description.clone(),
            priority: parse_priority(&t.priority),
            mention_count: effective_count(t.mentionCount, t.commentIds.len()),
            representative_quote: t.representativeQuote.clone(),
            source_indices: remap_positions(&t.commentIds, batch),
        })
        .collect();

    let issues = api
        .issues
        .iter()
        .map(|t| IssueGroup {
            group_id: group_id(&group_key(&t.title)),
            title: t.title.clone(),
            description: t.description.clone(),
            priority: parse_priority(&t.priority),
            mention_count: effective_count(t.mentionCount, t.commentIds.len()),
            representative_quote: t.representativeQuote.clone(),
            source_indices: remap_positions(&t.commentIds, batch),
        })
        .collect();

    let questions = api
        .questions
        .iter()
        .map(|q| QuestionGroup {
            group_id: group_id(&group_key(&q.title)),
            title: q.title.clone(),
            description: q.description.clone(),
            category: parse_category(&q.category),
            mention_count: effective_count(q.mentionCount, q.commentIds.len()),
            representative_quote: q.representativeQuote.clone(),
            source_indices: remap_positions(&q.commentIds, batch),
        })
        .collect();

    BatchAnalysis {
        classifications,
        feedback,
        issues,
        questions,
        key_insights: api.keyInsights,
        top_concerns: api.topConcerns,
    }
}

/// Batch-local 1-based ids → global 1-based source indices. Ids outside the
/// batch range are hallucinated and dropped.
fn remap_positions(ids: &[u32], batch: &Batch) -> BTreeSet<usize> {
    ids.iter()
        .filter_map(|&id| {
            let id = id as usize;
            if id >= 1 && id <= batch.comments.len() {
                Some(batch.offset + id)
            } else {
                debug!("Batch {} - dropping out-of-range comment id {}", batch.index, id);
                None
            }
        })
        .collect()
}

/// A group always represents at least one mention.
fn effective_count(reported: u32, id_count: usize) -> u32 {
    if reported > 0 {
        reported
    } else {
        (id_count as u32).max(1)
    }
}

fn parse_sentiment(s: &str) -> Option<Sentiment> {
    match s.trim().to_ascii_uppercase().as_str() {
        "POSITIVE" => Some(Sentiment::Positive),
        "NEGATIVE" => Some(Sentiment::Negative),
        "NEUTRAL" => Some(Sentiment::Neutral),
        "COMPLIMENT" => Some(Sentiment::Compliment),
        _ => None,
    }
}

fn parse_priority(s: &str) -> Priority {
    match s.trim().to_ascii_uppercase().as_str() {
        "HIGH" => Priority::High,
        "LOW" => Priority::Low,
        _ => Priority::Moderate,
    }
}

fn parse_category(s: &str) -> QuestionCategory {
    match s.trim().to_ascii_uppercase().as_str() {
        "PRICING" => QuestionCategory::Pricing,
        "FEATURES" => QuestionCategory::Features,
        "SUPPORT" => QuestionCategory::Support,
        "TECHNICAL" => QuestionCategory::Technical,
        _ => QuestionCategory::General,
    }
}

const COMPLIMENT_MAX_CHARS: usize = 80;

const PRAISE_TOKENS: &[&str] = &[
    "thank", "thanks", "love", "great", "awesome", "amazing", "perfect", "excellent",
    "well done", "nice work", "kudos", "appreciate",
];

/// Short praise gets promoted from POSITIVE to COMPLIMENT. Deterministic,
/// independent of the external service.
fn is_compliment(content: &str) -> bool {
    if content.chars().count() >= COMPLIMENT_MAX_CHARS {
        return false;
    }
    let lower = content.to_lowercase();
    PRAISE_TOKENS.iter().any(|t| lower.contains(t))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Comment;

    fn batch(contents: &[&str], index: usize, offset: usize) -> Batch {
        Batch {
            index,
            offset,
            comments: contents
                .iter()
                .map(|c| Comment {
                    content: c.to_string(),
                    likes: 1,
                    author: None,
                })
                .collect(),
        }
    }

    fn api_from(json: &str) -> ApiClassification {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn parses_wire_document() {
        let api = api_from(
            r#"{
                "sentiments": [{"position": 1, "sentiment": "positive"}],
                "issues": [{"title": "Crash on login", "priority": "HIGH", "mentionCount": 2, "representativeQuote": "it crashes", "commentIds": [1, 2]}],
                "keyInsights": ["stability matters"]
            }"#,
        );
        assert_eq!(api.sentiments.len(), 1);
        assert_eq!(api.issues[0].mentionCount, 2);
        assert!(api.feedback.is_empty());
    }

    #[test]
    fn missing_verdicts_default_to_neutral() {
        let b = batch(&["first", "second", "third"], 0, 0);
        let api = api_from(r#"{"sentiments": [{"position": 2, "sentiment": "NEGATIVE"}]}"#);
        let out = normalize_batch(&b, api);
        assert_eq!(out.classifications[0].sentiment, Sentiment::Neutral);
        assert_eq!(out.classifications[1].sentiment, Sentiment::Negative);
        assert_eq!(out.classifications[2].sentiment, Sentiment::Neutral);
    }

    #[test]
    fn classification_carries_global_source_index() {
        let b = batch(&["a", "b"], 2, 80);
        let api = api_from(r#"{}"#);
        let out = normalize_batch(&b, api);
        assert_eq!(out.classifications[0].source_index, 81);
        assert_eq!(out.classifications[1].source_index, 82);
    }

    #[test]
    fn short_praise_becomes_compliment() {
        let b = batch(&["Thanks, love this app!", "x".repeat(120).as_str()], 0, 0);
        let api = api_from(
            r#"{"sentiments": [
                {"position": 1, "sentiment": "POSITIVE"},
                {"position": 2, "sentiment": "POSITIVE"}
            ]}"#,
        );
        let out = normalize_batch(&b, api);
        assert_eq!(out.classifications[0].sentiment, Sentiment::Compliment);
        // long comments never promote
        assert_eq!(out.classifications[1].sentiment, Sentiment::Positive);
    }

    #[test]
    fn negative_praise_words_are_not_promoted() {
        let b = batch(&["great, it broke again"], 0, 0);
        let api = api_from(r#"{"sentiments": [{"position": 1, "sentiment": "NEGATIVE"}]}"#);
        let out = normalize_batch(&b, api);
        assert_eq!(out.classifications[0].sentiment, Sentiment::Negative);
    }

    #[test]
    fn group_positions_remap_to_global_indices() {
        let b = batch(&["a", "b", "c"], 1, 40);
        let api = api_from(
            r#"{"issues": [{"title": "Slow sync", "commentIds": [1, 3, 99]}]}"#,
        );
        let out = normalize_batch(&b, api);
        let indices: Vec<usize> = out.issues[0].source_indices.iter().copied().collect();
        assert_eq!(indices, vec![41, 43]);
    }

    #[test]
    fn zero_mention_count_is_repaired() {
        let b = batch(&["a", "b"], 0, 0);
        let api = api_from(r#"{"feedback": [{"title": "Dark mode", "commentIds": [1, 2]}]}"#);
        let out = normalize_batch(&b, api);
        assert_eq!(out.feedback[0].mention_count, 2);

        let api = api_from(r#"{"feedback": [{"title": "Dark mode"}]}"#);
        let out = normalize_batch(&b, api);
        assert_eq!(out.feedback[0].mention_count, 1);
    }

    #[test]
    fn unknown_priority_and_category_fall_back() {
        assert_eq!(parse_priority("urgent"), Priority::Moderate);
        assert_eq!(parse_priority("low"), Priority::Low);
        assert_eq!(parse_category("billing"), QuestionCategory::General);
        assert_eq!(parse_category("pricing"), QuestionCategory::Pricing);
    }

    #[test]
    fn code_fences_are_stripped() {
        assert_eq!(strip_code_fence("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("```\n{}\n```"), "{}");
        assert_eq!(strip_code_fence(" {} "), "{}");
    }
}
