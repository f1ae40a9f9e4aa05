//! interview-store — question bank and audit log backends.
//!
//! `MemoryStore` serves questions from question-bank TOML files and keeps audit
//! records in process. `FirestoreStore` talks to Cloud Firestore over REST.

pub mod firestore;
pub mod memory;

use std::sync::Arc;

use anyhow::Result;

use interview_core::config::StoreConfig;
use interview_core::traits::{AuditLog, QuestionRepository};

pub use firestore::FirestoreStore;
pub use memory::MemoryStore;

/// The question repository and audit log a controller runs against.
#[derive(Clone)]
pub struct Backends {
    pub questions: Arc<dyn QuestionRepository>,
    pub audit: Arc<dyn AuditLog>,
}

impl Backends {
    /// Use one backend for both roles.
    pub fn shared<S>(store: Arc<S>) -> Self
    where
        S: QuestionRepository + AuditLog + 'static,
    {
        Self {
            questions: store.clone(),
            audit: store,
        }
    }
}

/// Build the configured backends.
pub fn create_store(config: &StoreConfig) -> Result<Backends> {
    match config {
        StoreConfig::Memory { question_bank } => {
            let store = match question_bank {
                Some(path) => MemoryStore::from_path(path)?,
                None => {
                    tracing::warn!("no question_bank configured; every role will be unknown");
                    MemoryStore::default()
                }
            };
            Ok(Backends::shared(Arc::new(store)))
        }
        StoreConfig::Firestore {
            project_id,
            access_token,
            base_url,
            database,
        } => {
            if access_token.is_none() {
                tracing::warn!("firestore access_token not set; requests will be unauthenticated");
            }
            let store = FirestoreStore::new(
                project_id,
                database,
                access_token.clone(),
                base_url.as_deref(),
            )?;
            tracing::info!(project = %project_id, "using firestore store");
            Ok(Backends::shared(Arc::new(store)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_store_without_bank_has_no_roles() {
        let backends = create_store(&StoreConfig::default()).unwrap();
        assert!(backends.questions.known_roles().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn memory_store_from_bank_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("bank.toml");
        std::fs::write(
            &file,
            "[[questions]]\nid = \"qa-1\"\njob_role = \"QA\"\nquestion = \"Q?\"\n",
        )
        .unwrap();

        let backends = create_store(&StoreConfig::Memory {
            question_bank: Some(file),
        })
        .unwrap();
        assert_eq!(backends.questions.known_roles().await.unwrap(), ["QA"]);
    }

    #[test]
    fn missing_bank_file_is_an_error() {
        let result = create_store(&StoreConfig::Memory {
            question_bank: Some("/nonexistent/bank.toml".into()),
        });
        assert!(result.is_err());
    }

    #[test]
    fn firestore_rejects_bad_base_url() {
        let result = create_store(&StoreConfig::Firestore {
            project_id: "demo".into(),
            access_token: None,
            base_url: Some("not a url".into()),
            database: "(default)".into(),
        });
        assert!(result.is_err());
    }
}
