//! Wire-format mirror of the classification service payloads. Field names
//! match the JSON exactly; the adapter maps these into domain models.
#![allow(non_snake_case)]

use serde::{Deserialize, Serialize};

/* Chat-completions envelope */

#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub response_format: serde_json::Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatChoice {
    pub message: ChatChoiceMessage,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatChoiceMessage {
    pub content: String,
}

/* Strict-JSON classification document carried in the assistant message */

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiClassification {
    #[serde(default)]
    pub sentiments: Vec<ApiSentiment>,
    #[serde(default)]
    pub feedback: Vec<ApiTheme>,
    #[serde(default)]
    pub issues: Vec<ApiTheme>,
    #[serde(default)]
    pub questions: Vec<ApiQuestion>,
    #[serde(default)]
    pub keyInsights: Vec<String>,
    #[serde(default)]
    pub topConcerns: Vec<String>,
}

/// One per-position verdict; `position` is 1-based within the batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiSentiment {
    pub position: u32,
    pub sentiment: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiTheme {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub priority: String,
    #[serde(default)]
    pub mentionCount: u32,
    #[serde(default)]
    pub representativeQuote: String,
    #[serde(default)]
    pub commentIds: Vec<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiQuestion {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub mentionCount: u32,
    #[serde(default)]
    pub representativeQuote: String,
    #[serde(default)]
    pub commentIds: Vec<u32>,
}
