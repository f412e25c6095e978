use crate::models::Comment;

/// Heuristic ~4 chars/token.
pub fn approx_tokens(s: &str) -> usize {
    (s.chars().count() + 3) / 4
}

/// Per-item JSON scaffolding (position, weight, quoting) on top of the text.
const ITEM_OVERHEAD_TOKENS: usize = 8;

pub fn comment_cost(c: &Comment) -> usize {
    approx_tokens(&c.content) + ITEM_OVERHEAD_TOKENS
}
