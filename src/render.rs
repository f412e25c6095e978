use crate::models::{AnalysisResult, OverallSentiment, Priority, QuestionCategory};

fn priority_label(p: Priority) -> &'static str {
    match p {
        Priority::High => "high",
        Priority::Moderate => "moderate",
        Priority::Low => "low",
    }
}

fn category_label(c: QuestionCategory) -> &'static str {
    match c {
        QuestionCategory::Pricing => "pricing",
        QuestionCategory::Features => "features",
        QuestionCategory::Support => "support",
        QuestionCategory::Technical => "technical",
        QuestionCategory::General => "general",
    }
}

pub fn render_report(r: &AnalysisResult) -> String {
    let mut md = String::new();
    md.push_str("# Comment Vibe Report\n\n");

    md.push_str("## Overall\n");
    let mood = match r.insights.overall_sentiment {
        OverallSentiment::Positive => "Positive",
        OverallSentiment::Negative => "Negative",
        OverallSentiment::Mixed => "Mixed",
    };
    md.push_str(&format!("- Sentiment: {}\n", mood));
    md.push_str(&format!(
        "- Satisfaction: {}%\n",
        r.insights.satisfaction_score
    ));
    md.push_str(&format!(
        "- Comments analyzed: {}\n",
        r.classifications.len()
    ));
    if !r.failed_batches.is_empty() {
        let lost: usize = r.failed_batches.iter().map(|f| f.source_indices.len()).sum();
        md.push_str(&format!(
            "- Not analyzed: {} comments across {} failed batches\n",
            lost,
            r.failed_batches.len()
        ));
    }
    md.push('\n');

    if !r.feedback.is_empty() {
        md.push_str("## Top Feedback\n");
        for g in r.feedback.iter().take(10) {
            md.push_str(&format!(
                "- **{}** ({}, {} mentions): \"{}\"\n",
                g.title,
                priority_label(g.priority),
                g.mention_count,
                g.representative_quote
            ));
        }
        md.push('\n');
    }

    if !r.issues.is_empty() {
        md.push_str("## Top Issues\n");
        for g in r.issues.iter().take(10) {
            md.push_str(&format!(
                "- **{}** ({}, {} mentions): \"{}\"\n",
                g.title,
                priority_label(g.priority),
                g.mention_count,
                g.representative_quote
            ));
        }
        md.push('\n');
    }

    if !r.questions.is_empty() {
        md.push_str("## Top Questions\n");
        for g in r.questions.iter().take(10) {
            md.push_str(&format!(
                "- **{}** ({}, {} mentions)\n",
                g.title,
                category_label(g.category),
                g.mention_count
            ));
        }
        md.push('\n');
    }

    if !r.insights.key_insights.is_empty() {
        md.push_str("## Key Insights\n");
        for s in &r.insights.key_insights {
            md.push_str(&format!("- {}\n", s));
        }
        md.push('\n');
    }

    if !r.insights.top_concerns.is_empty() {
        md.push_str("## Top Concerns\n");
        for s in &r.insights.top_concerns {
            md.push_str(&format!("- {}\n", s));
        }
    }

    md
}
