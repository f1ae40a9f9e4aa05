//! Trait definitions for the external collaborators.
//!
//! `LlmProvider` is implemented by `interview-providers`; `QuestionRepository`
//! and `AuditLog` are implemented by the backends in `interview-store`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::Question;

// ---------------------------------------------------------------------------
// LLM Provider trait
// ---------------------------------------------------------------------------

/// Trait for hosted language-model backends.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Human-readable provider name (e.g. "together").
    fn name(&self) -> &str;

    /// Request a single chat completion.
    async fn generate(&self, request: &GenerateRequest) -> anyhow::Result<GenerateResponse>;
}

/// Request for a single completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    /// Model identifier (e.g. "meta-llama/Llama-3.3-70B-Instruct-Turbo-Free").
    pub model: String,
    /// The user prompt.
    pub prompt: String,
    /// Optional system prompt.
    #[serde(default)]
    pub system_prompt: Option<String>,
    /// Maximum tokens to generate.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f64,
}

/// Response from a completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateResponse {
    /// The raw response content.
    pub content: String,
    /// Model that actually generated the response.
    pub model: String,
    /// Token usage.
    pub token_usage: TokenUsage,
    /// Latency in milliseconds.
    pub latency_ms: u64,
}

/// Token accounting reported by the provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

// ---------------------------------------------------------------------------
// Question repository
// ---------------------------------------------------------------------------

/// Read-only access to the question bank.
#[async_trait]
pub trait QuestionRepository: Send + Sync {
    /// All questions tagged with `job_role`. Empty when the role is unknown.
    async fn questions_for_role(&self, job_role: &str) -> anyhow::Result<Vec<Question>>;

    /// Distinct job roles present in the bank.
    async fn known_roles(&self) -> anyhow::Result<Vec<String>>;
}

// ---------------------------------------------------------------------------
// Audit log
// ---------------------------------------------------------------------------

/// Append-only record of interview exchanges, kept outside the session store.
#[async_trait]
pub trait AuditLog: Send + Sync {
    /// Append to `conversations/{user}/{role}`.
    async fn log_conversation(&self, record: &ConversationRecord) -> anyhow::Result<()>;

    /// Append to `scores/{user}/{role}`.
    async fn log_score(&self, record: &ScoreRecord) -> anyhow::Result<()>;

    /// Merge into `final_scores/{user}`. Fields not in the record are kept.
    async fn log_final_score(&self, record: &FinalScoreRecord) -> anyhow::Result<()>;
}

/// One question/answer exchange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationRecord {
    #[serde(skip)]
    pub user: String,
    #[serde(skip)]
    pub role: String,
    pub question: String,
    pub answer: String,
    pub is_follow_up: bool,
    pub timestamp: DateTime<Utc>,
}

/// The score given to one answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreRecord {
    #[serde(skip)]
    pub user: String,
    #[serde(skip)]
    pub role: String,
    pub question: String,
    pub answer: String,
    pub score: u8,
    pub is_follow_up: bool,
    pub timestamp: DateTime<Utc>,
}

/// Aggregate result written when an interview ends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalScoreRecord {
    #[serde(skip)]
    pub user: String,
    pub role: String,
    pub total_score: u32,
    /// Unrounded percentage.
    pub percentage_score: f64,
    pub posture_score: f64,
    pub eye_score: f64,
    pub timestamp: DateTime<Utc>,
}
