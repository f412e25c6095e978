pub fn system_classifier() -> String {
    r#"You classify social-media comments for a product team.
Return ONLY a valid JSON object with this shape:
{
  "sentiments": [{"position": 1, "sentiment": "POSITIVE|NEGATIVE|NEUTRAL"}],
  "feedback": [{"title": "", "description": "", "priority": "HIGH|MODERATE|LOW", "mentionCount": 1, "representativeQuote": "", "commentIds": [1]}],
  "issues": [{"title": "", "description": "", "priority": "HIGH|MODERATE|LOW", "mentionCount": 1, "representativeQuote": "", "commentIds": [1]}],
  "questions": [{"title": "", "description": "", "category": "PRICING|FEATURES|SUPPORT|TECHNICAL|GENERAL", "mentionCount": 1, "representativeQuote": "", "commentIds": [1]}],
  "keyInsights": ["short recurring takeaway"],
  "topConcerns": ["short recurring concern"]
}
Every comment position must appear in "sentiments" exactly once.
"commentIds" and "position" refer to the numbered positions in the input."#
        .to_string()
}

pub fn user_classification(comments_json: &str, context: Option<&str>) -> String {
    let context_block = match context {
        Some(ctx) if !ctx.trim().is_empty() => format!(
            "CONTEXT (shared background for all comments):\n<{}>\n\n",
            ctx.trim()
        ),
        _ => String::new(),
    };

    format!(
        r#"{context}Classify the following comments. Each entry has a 1-based position, the comment text, and a weight (like count).

COMMENTS JSON:
<{json}>

CONSTRAINTS:
- Group feedback requests, problem reports, and questions into themes; merge near-duplicates.
- Weight counts mentions, not likes.
- Quote representative comments verbatim.
- Respond with the JSON object only, no prose."#,
        context = context_block,
        json = comments_json
    )
}
