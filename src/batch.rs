use tracing::debug;

use crate::budget::comment_cost;
use crate::models::Comment;

/// An order-preserving slice of the input sequence. `offset` is the 0-based
/// global position of the first comment; concatenating all batches in index
/// order reproduces the input exactly.
#[derive(Debug, Clone)]
pub struct Batch {
    pub index: usize,
    pub offset: usize,
    pub comments: Vec<Comment>,
}

impl Batch {
    /// Global 1-based positions covered by this batch.
    pub fn source_indices(&self) -> Vec<usize> {
        (self.offset + 1..=self.offset + self.comments.len()).collect()
    }
}

/// Split into fixed-size groups. Every group except possibly the last has
/// exactly `size` items; empty input yields zero batches.
pub fn batch_fixed(comments: &[Comment], size: usize) -> Vec<Batch> {
    assert!(size >= 1, "batch size must be >= 1");

    let batches: Vec<Batch> = comments
        .chunks(size)
        .enumerate()
        .map(|(index, chunk)| Batch {
            index,
            offset: index * size,
            comments: chunk.to_vec(),
        })
        .collect();

    debug!(
        "Batching - comments={}, batch_size={}, batches={}",
        comments.len(),
        size,
        batches.len()
    );
    batches
}

/// Split by cumulative approximate token cost: flush the current batch when
/// adding the next comment would cross `ceiling_tokens`. A single comment
/// that alone exceeds the ceiling still becomes its own batch.
pub fn batch_by_cost(comments: &[Comment], ceiling_tokens: usize) -> Vec<Batch> {
    assert!(ceiling_tokens >= 1, "cost ceiling must be >= 1");

    let mut batches: Vec<Batch> = Vec::new();
    let mut current: Vec<Comment> = Vec::new();
    let mut current_offset = 0usize;
    let mut current_cost = 0usize;

    for (pos, comment) in comments.iter().enumerate() {
        let cost = comment_cost(comment);
        if !current.is_empty() && current_cost + cost > ceiling_tokens {
            batches.push(Batch {
                index: batches.len(),
                offset: current_offset,
                comments: std::mem::take(&mut current),
            });
            current_offset = pos;
            current_cost = 0;
        }
        current.push(comment.clone());
        current_cost += cost;
    }

    if !current.is_empty() {
        batches.push(Batch {
            index: batches.len(),
            offset: current_offset,
            comments: current,
        });
    }

    debug!(
        "Cost batching - comments={}, ceiling={}, batches={}",
        comments.len(),
        ceiling_tokens,
        batches.len()
    );
    batches
}
