use futures::stream::{self, StreamExt};
use tracing::{error, info, warn};

use crate::batch::Batch;
use crate::classify::ClassifyBackend;
use crate::error::AnalyzeError;
use crate::models::{BatchAnalysis, FailedBatch};

#[derive(Debug)]
pub struct DispatchOutcome {
    /// Successful fragments, ordered by batch index regardless of
    /// completion order.
    pub fragments: Vec<BatchAnalysis>,
    pub failed: Vec<FailedBatch>,
}

/// Fan out classification over all batches, at most `max_in_flight` at a
/// time, and fan the results back in. A batch failure never blocks or
/// cancels the others; it is recorded and the rest continue. Fails only
/// when every batch failed.
pub async fn dispatch_all<C: ClassifyBackend>(
    classifier: &C,
    batches: &[Batch],
    context: Option<&str>,
    max_in_flight: usize,
) -> Result<DispatchOutcome, AnalyzeError> {
    let total = batches.len();
    let start = std::time::Instant::now();
    info!(
        "Dispatch starting - batches={}, max_in_flight={}",
        total, max_in_flight
    );

    // One pre-allocated slot per batch index, written at most once.
    let mut slots: Vec<Option<BatchAnalysis>> = Vec::with_capacity(total);
    slots.resize_with(total, || None);
    let mut failed: Vec<FailedBatch> = Vec::new();
    let mut completed = 0usize;

    let mut results = stream::iter(batches.iter().map(|b| {
        // shared context rides on the first batch only
        let ctx = if b.index == 0 { context } else { None };
        async move { (b, classifier.classify(b, ctx).await) }
    }))
    .buffer_unordered(max_in_flight.max(1));

    while let Some((batch, result)) = results.next().await {
        completed += 1;
        match result {
            Ok(fragment) => {
                slots[batch.index] = Some(fragment);
            }
            Err(e) => {
                warn!("Batch {} analysis failed - {}", batch.index, e);
                failed.push(FailedBatch {
                    batch_index: batch.index,
                    source_indices: batch.source_indices(),
                });
            }
        }
        let pct = (completed as f32 / total as f32 * 100.0) as u32;
        info!("Dispatch progress: {}/{} ({}%)", completed, total, pct);
    }

    failed.sort_by_key(|f| f.batch_index);
    let fragments: Vec<BatchAnalysis> = slots.into_iter().flatten().collect();

    if fragments.is_empty() && total > 0 {
        error!("All {} batch analyses failed", total);
        return Err(AnalyzeError::AllBatchesFailed);
    }

    info!(
        "Dispatch completed - duration={:.2}s, succeeded={}, failed={}",
        start.elapsed().as_secs_f32(),
        fragments.len(),
        failed.len()
    );
    Ok(DispatchOutcome { fragments, failed })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::batch_fixed;
    use crate::error::ClassifyError;
    use crate::models::Comment;
    use std::collections::HashSet;
    use std::sync::Mutex;
    use std::time::Duration;

    struct Stub {
        fail: HashSet<usize>,
        contexts: Mutex<Vec<(usize, Option<String>)>>,
    }

    impl Stub {
        fn new(fail: &[usize]) -> Self {
            Self {
                fail: fail.iter().copied().collect(),
                contexts: Mutex::new(Vec::new()),
            }
        }
    }

    impl ClassifyBackend for Stub {
        async fn classify(
            &self,
            batch: &Batch,
            context: Option<&str>,
        ) -> Result<BatchAnalysis, ClassifyError> {
            self.contexts
                .lock()
                .unwrap()
                .push((batch.index, context.map(String::from)));
            // later batches finish first, so fan-in sees scrambled order
            let delay = 30u64.saturating_sub(batch.index as u64 * 10);
            tokio::time::sleep(Duration::from_millis(delay)).await;
            if self.fail.contains(&batch.index) {
                return Err(ClassifyError::EmptyResponse);
            }
            let empty: crate::api_types::ApiClassification =
                serde_json::from_str("{}").unwrap();
            Ok(crate::classify::normalize_batch(batch, empty))
        }
    }

    fn comments(n: usize) -> Vec<Comment> {
        (0..n)
            .map(|i| Comment {
                content: format!("comment {i}"),
                likes: 0,
                author: None,
            })
            .collect()
    }

    #[tokio::test]
    async fn fragments_come_back_in_batch_order() {
        let input = comments(9);
        let batches = batch_fixed(&input, 3);
        let stub = Stub::new(&[]);

        let outcome = dispatch_all(&stub, &batches, None, 8).await.unwrap();
        assert_eq!(outcome.fragments.len(), 3);
        let first_indices: Vec<usize> = outcome
            .fragments
            .iter()
            .map(|f| f.classifications[0].source_index)
            .collect();
        assert_eq!(first_indices, vec![1, 4, 7]);
        assert!(outcome.failed.is_empty());
    }

    #[tokio::test]
    async fn one_failure_does_not_abort_the_rest() {
        let input = comments(9);
        let batches = batch_fixed(&input, 3);
        let stub = Stub::new(&[1]);

        let outcome = dispatch_all(&stub, &batches, None, 8).await.unwrap();
        assert_eq!(outcome.fragments.len(), 2);
        assert_eq!(outcome.failed.len(), 1);
        assert_eq!(outcome.failed[0].batch_index, 1);
        assert_eq!(outcome.failed[0].source_indices, vec![4, 5, 6]);
    }

    #[tokio::test]
    async fn all_failures_surface_one_terminal_error() {
        let input = comments(6);
        let batches = batch_fixed(&input, 3);
        let stub = Stub::new(&[0, 1]);

        let err = dispatch_all(&stub, &batches, None, 8).await.unwrap_err();
        assert!(matches!(err, AnalyzeError::AllBatchesFailed));
    }

    #[tokio::test]
    async fn context_rides_only_on_the_first_batch() {
        let input = comments(9);
        let batches = batch_fixed(&input, 3);
        let stub = Stub::new(&[]);

        dispatch_all(&stub, &batches, Some("launch week"), 2)
            .await
            .unwrap();

        let mut contexts = stub.contexts.lock().unwrap().clone();
        contexts.sort_by_key(|(i, _)| *i);
        assert_eq!(contexts[0], (0, Some("launch week".to_string())));
        assert_eq!(contexts[1], (1, None));
        assert_eq!(contexts[2], (2, None));
    }
}
