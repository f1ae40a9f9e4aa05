//! Error types.
//!
//! `ProviderError` lives here so the scoring client can downcast provider
//! failures and decide on retries without string matching.

use thiserror::Error;

/// Errors that can occur when interacting with an LLM provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The API returned a 429 rate limit response.
    #[error("rate limited, retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    /// Authentication failed (invalid API key).
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The requested model was not found.
    #[error("model not found: {0}")]
    ModelNotFound(String),

    /// The API returned an error response.
    #[error("API error (HTTP {status}): {message}")]
    ApiError { status: u16, message: String },

    /// The request timed out.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// A network error occurred.
    #[error("network error: {0}")]
    NetworkError(String),
}

impl ProviderError {
    /// Returns `true` if this error is permanent and should not be retried.
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            ProviderError::AuthenticationFailed(_) | ProviderError::ModelNotFound(_)
        )
    }

    /// Returns the retry-after delay in milliseconds, if applicable.
    pub fn retry_after_ms(&self) -> Option<u64> {
        match self {
            ProviderError::RateLimited { retry_after_ms } => Some(*retry_after_ms),
            _ => None,
        }
    }
}

/// Session store failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("session already exists: {0}")]
    SessionExists(String),

    #[error("session not found: {0}")]
    NotFound(String),
}

/// Errors returned by the interview controller.
#[derive(Debug, Error)]
pub enum InterviewError {
    /// A required request field was missing or empty.
    #[error("{0}")]
    Validation(String),

    /// No live session with this id.
    #[error("session not found: {0}")]
    SessionNotFound(String),

    /// The question bank has nothing for this role.
    #[error("no questions found for job role: {role}")]
    NoQuestionsForRole {
        role: String,
        available_roles: Vec<String>,
    },

    /// The question repository failed.
    #[error("question repository error: {0:#}")]
    Repository(anyhow::Error),

    /// A freshly generated session id collided with a live one.
    #[error("session store error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for InterviewError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => InterviewError::SessionNotFound(id),
            other => InterviewError::Store(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permanent_provider_errors() {
        assert!(ProviderError::AuthenticationFailed("bad key".into()).is_permanent());
        assert!(ProviderError::ModelNotFound("x".into()).is_permanent());
        assert!(!ProviderError::Timeout(120).is_permanent());
        assert_eq!(
            ProviderError::RateLimited {
                retry_after_ms: 5000
            }
            .retry_after_ms(),
            Some(5000)
        );
    }

    #[test]
    fn store_not_found_maps_to_session_not_found() {
        let err: InterviewError = StoreError::NotFound("s1".into()).into();
        assert!(matches!(err, InterviewError::SessionNotFound(id) if id == "s1"));

        let err: InterviewError = StoreError::SessionExists("s2".into()).into();
        assert!(matches!(err, InterviewError::Store(_)));
    }
}
