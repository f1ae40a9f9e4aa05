//! Answer scoring against a hosted language model.
//!
//! The model is asked for a single number; the first standalone `0`-`10`
//! token in its reply is the score. Scoring never fails: every error path
//! collapses to a zero score, but the [`ScoreOutcome`] records why.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;
use crate::traits::{GenerateRequest, LlmProvider};

/// System prompt sent with every scoring request.
pub const SCORING_SYSTEM_PROMPT: &str = "You provide direct answers without additional explanation unless specifically requested. When asked to score, provide only the numerical score.";

/// Default model used for scoring.
pub const DEFAULT_SCORING_MODEL: &str = "meta-llama/Llama-3.3-70B-Instruct-Turbo-Free";

/// Build the evaluation prompt for one question/answer pair.
pub fn build_scoring_prompt(question: &str, answer: &str) -> String {
    format!(
        "
You are an interview evaluator. Score the following answer on a scale from 0 to 10.
0 means completely irrelevant or incorrect, 10 means perfect answer.

Question: {question}
Answer: {answer}

Provide ONLY a single number from 0-10 as your response, with no additional text, explanation, or commentary.
"
    )
}

fn score_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\b(10|[0-9])\b").expect("score pattern is valid"))
}

/// Extract the first standalone `10` or single digit from a model reply.
pub fn extract_score(response: &str) -> Option<u8> {
    score_pattern()
        .captures(response)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Why a score has the value it has.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScoreOutcome {
    /// The model returned a usable score.
    Scored { score: u8 },
    /// The answer was empty; the model was not called.
    EmptyAnswer,
    /// The model replied, but with no recognizable score.
    Unparseable { response: String },
    /// The model call failed.
    Failed { error: String },
}

impl ScoreOutcome {
    /// The integer score in `0..=10`. Non-scored outcomes count as 0.
    pub fn score(&self) -> u8 {
        match self {
            ScoreOutcome::Scored { score } => *score,
            _ => 0,
        }
    }

    /// `true` when the score was defaulted because scoring did not succeed.
    pub fn is_defaulted(&self) -> bool {
        matches!(
            self,
            ScoreOutcome::Unparseable { .. } | ScoreOutcome::Failed { .. }
        )
    }
}

/// Anything that can score a candidate answer.
#[async_trait]
pub trait AnswerScorer: Send + Sync {
    async fn score(&self, question: &str, answer: &str) -> ScoreOutcome;
}

/// Generation settings for scoring requests.
#[derive(Debug, Clone)]
pub struct ScoringConfig {
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u32,
    /// Retries on transient provider errors. Zero means a single attempt.
    pub max_retries: u32,
    pub retry_delay: Duration,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_SCORING_MODEL.to_string(),
            temperature: 0.5,
            max_tokens: 100,
            max_retries: 0,
            retry_delay: Duration::from_secs(1),
        }
    }
}

/// [`AnswerScorer`] backed by an [`LlmProvider`].
pub struct ScoringClient {
    provider: Arc<dyn LlmProvider>,
    config: ScoringConfig,
}

impl ScoringClient {
    pub fn new(provider: Arc<dyn LlmProvider>, config: ScoringConfig) -> Self {
        Self { provider, config }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    async fn complete(&self, request: &GenerateRequest) -> anyhow::Result<String> {
        let mut retry_delay = self.config.retry_delay;
        let mut attempt = 0;
        loop {
            match self.provider.generate(request).await {
                Ok(response) => return Ok(response.content),
                Err(e) => {
                    let provider_err = e.downcast_ref::<ProviderError>();
                    let permanent = provider_err.is_some_and(ProviderError::is_permanent);
                    if permanent || attempt >= self.config.max_retries {
                        return Err(e);
                    }
                    if let Some(ms) = provider_err.and_then(ProviderError::retry_after_ms) {
                        retry_delay = Duration::from_millis(ms);
                    }
                    attempt += 1;
                    tracing::debug!(
                        provider = self.provider.name(),
                        attempt,
                        "retrying scoring request after error: {e:#}"
                    );
                    tokio::time::sleep(retry_delay).await;
                    retry_delay = (retry_delay * 2).min(Duration::from_secs(60));
                }
            }
        }
    }
}

#[async_trait]
impl AnswerScorer for ScoringClient {
    async fn score(&self, question: &str, answer: &str) -> ScoreOutcome {
        if answer.is_empty() {
            return ScoreOutcome::EmptyAnswer;
        }

        let request = GenerateRequest {
            model: self.config.model.clone(),
            prompt: build_scoring_prompt(question, answer),
            system_prompt: Some(SCORING_SYSTEM_PROMPT.to_string()),
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        match self.complete(&request).await {
            Ok(content) => match extract_score(&content) {
                Some(score) => ScoreOutcome::Scored { score },
                None => {
                    tracing::warn!(
                        provider = self.provider.name(),
                        "no score found in model reply: {content:?}"
                    );
                    ScoreOutcome::Unparseable { response: content }
                }
            },
            Err(e) => {
                tracing::warn!(
                    provider = self.provider.name(),
                    "scoring failed, defaulting to 0: {e:#}"
                );
                ScoreOutcome::Failed {
                    error: format!("{e:#}"),
                }
            }
        }
    }
}
