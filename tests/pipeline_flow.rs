//! End-to-end pipeline behavior against a stub classification service.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use comment_vibes::api_types::ApiClassification;
use comment_vibes::batch::Batch;
use comment_vibes::classify::{normalize_batch, ClassifyBackend};
use comment_vibes::error::{AnalyzeError, ClassifyError};
use comment_vibes::models::{BatchAnalysis, Comment, OverallSentiment};
use comment_vibes::pipeline::{analyze, PipelineOptions, Progress};

/// Stub service: every comment POSITIVE, plus one identically-titled issue
/// per batch so merging across batches is observable.
struct StubService {
    calls: AtomicUsize,
    fail_batches: HashSet<usize>,
}

impl StubService {
    fn new(fail: &[usize]) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail_batches: fail.iter().copied().collect(),
        }
    }
}

impl ClassifyBackend for StubService {
    async fn classify(
        &self,
        batch: &Batch,
        _context: Option<&str>,
    ) -> Result<BatchAnalysis, ClassifyError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_batches.contains(&batch.index) {
            return Err(ClassifyError::EmptyResponse);
        }
        let sentiments: Vec<serde_json::Value> = (1..=batch.comments.len())
            .map(|p| serde_json::json!({ "position": p, "sentiment": "POSITIVE" }))
            .collect();
        let doc = serde_json::json!({
            "sentiments": sentiments,
            "issues": [{
                "title": "Sync is slow",
                "priority": "HIGH",
                "mentionCount": 1,
                "representativeQuote": "sync takes forever",
                "commentIds": [1]
            }],
            "topConcerns": ["slow sync"]
        });
        let api: ApiClassification = serde_json::from_value(doc).unwrap();
        Ok(normalize_batch(batch, api))
    }
}

fn comments(n: usize) -> Vec<Comment> {
    (0..n)
        .map(|i| Comment {
            content: format!("comment text {i}"),
            likes: i as u32,
            author: None,
        })
        .collect()
}

fn multi_batch_options() -> PipelineOptions {
    PipelineOptions {
        batch_size: 40,
        single_call_threshold: 50,
        max_in_flight: 4,
    }
}

#[tokio::test]
async fn small_jobs_issue_exactly_one_call() {
    let stub = StubService::new(&[]);
    let input = comments(10);

    let result = analyze(&stub, &input, None, &PipelineOptions::default(), None)
        .await
        .unwrap();

    assert_eq!(stub.calls.load(Ordering::SeqCst), 1);
    assert_eq!(result.classifications.len(), 10);
    for (i, c) in result.classifications.iter().enumerate() {
        assert_eq!(c.source_index, i + 1);
        assert_eq!(c.content, input[i].content);
    }
    assert!(result.failed_batches.is_empty());
}

#[tokio::test]
async fn large_jobs_fan_out_and_merge_in_order() {
    let stub = StubService::new(&[]);
    let input = comments(120);

    let result = analyze(&stub, &input, None, &multi_batch_options(), None)
        .await
        .unwrap();

    assert_eq!(stub.calls.load(Ordering::SeqCst), 3);
    assert_eq!(result.classifications.len(), 120);
    for (i, c) in result.classifications.iter().enumerate() {
        assert_eq!(c.source_index, i + 1);
        assert_eq!(c.content, input[i].content);
    }

    // identically-titled per-batch issues merged into one, counts summed,
    // batch-local positions remapped to global indices
    assert_eq!(result.issues.len(), 1);
    assert_eq!(result.issues[0].mention_count, 3);
    assert_eq!(
        result.issues[0].source_indices.iter().copied().collect::<Vec<_>>(),
        vec![1, 41, 81]
    );

    assert_eq!(result.insights.overall_sentiment, OverallSentiment::Positive);
    assert_eq!(result.insights.satisfaction_score, 100);
    assert_eq!(result.insights.top_concerns, vec!["slow sync"]);
}

#[tokio::test]
async fn partial_failure_still_succeeds() {
    let stub = StubService::new(&[1]);
    let input = comments(120);

    let result = analyze(&stub, &input, None, &multi_batch_options(), None)
        .await
        .unwrap();

    assert_eq!(result.classifications.len(), 80);
    // survivors keep their original identity: batch 0 then batch 2
    assert_eq!(result.classifications[0].source_index, 1);
    assert_eq!(result.classifications[40].source_index, 81);
    assert_eq!(result.classifications[40].content, input[80].content);

    assert_eq!(result.failed_batches.len(), 1);
    assert_eq!(result.failed_batches[0].batch_index, 1);
    assert_eq!(
        result.failed_batches[0].source_indices,
        (41..=80).collect::<Vec<_>>()
    );
}

#[tokio::test]
async fn total_failure_is_an_error() {
    let stub = StubService::new(&[0, 1, 2]);
    let input = comments(120);

    let err = analyze(&stub, &input, None, &multi_batch_options(), None)
        .await
        .unwrap_err();
    assert!(matches!(err, AnalyzeError::AllBatchesFailed));
}

#[tokio::test]
async fn empty_input_fails_fast() {
    let stub = StubService::new(&[]);

    let err = analyze(&stub, &[], None, &PipelineOptions::default(), None)
        .await
        .unwrap_err();
    assert!(matches!(err, AnalyzeError::EmptyInput));
    assert_eq!(stub.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn progress_checkpoints_are_monotonic() {
    let stub = StubService::new(&[]);
    let input = comments(60);
    let seen: Arc<Mutex<Vec<Progress>>> = Arc::new(Mutex::new(Vec::new()));
    let sink_seen = Arc::clone(&seen);
    let sink = move |p: Progress| sink_seen.lock().unwrap().push(p);

    analyze(&stub, &input, None, &multi_batch_options(), Some(&sink))
        .await
        .unwrap();

    let seen = seen.lock().unwrap().clone();
    assert_eq!(seen.first().map(|p| (p.current, p.stage)), Some((0, "preparing")));
    assert_eq!(seen.last().map(|p| (p.current, p.stage)), Some((100, "complete")));
    assert!(seen.windows(2).all(|w| w[0].current <= w[1].current));
    assert!(seen.iter().any(|p| p.stage == "dispatched"));
    assert!(seen.iter().any(|p| p.stage == "merging"));
}
