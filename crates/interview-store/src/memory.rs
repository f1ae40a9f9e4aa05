//! In-memory question bank and audit log.
//!
//! Questions are seeded from question-bank TOML files. Audit records are kept
//! in the same three collections the Firestore backend writes, so a local
//! deployment and tests can inspect what would have been persisted.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::RwLock;

use interview_core::model::Question;
use interview_core::question_bank::{load_question_banks, BankEntry, QuestionBank};
use interview_core::traits::{
    AuditLog, ConversationRecord, FinalScoreRecord, QuestionRepository, ScoreRecord,
};

type UserRole = (String, String);

/// In-memory implementation of `QuestionRepository` and `AuditLog`.
pub struct MemoryStore {
    questions: Vec<BankEntry>,
    conversations: RwLock<HashMap<UserRole, Vec<ConversationRecord>>>,
    scores: RwLock<HashMap<UserRole, Vec<ScoreRecord>>>,
    final_scores: RwLock<HashMap<String, Map<String, Value>>>,
}

impl MemoryStore {
    /// Create a store holding the given questions.
    #[must_use]
    pub fn new(questions: Vec<BankEntry>) -> Self {
        Self {
            questions,
            conversations: RwLock::new(HashMap::new()),
            scores: RwLock::new(HashMap::new()),
            final_scores: RwLock::new(HashMap::new()),
        }
    }

    /// Create a store from parsed question banks.
    pub fn from_banks(banks: Vec<QuestionBank>) -> Self {
        Self::new(banks.into_iter().flat_map(|b| b.entries).collect())
    }

    /// Load a question-bank file or directory.
    pub fn from_path(path: &Path) -> Result<Self> {
        let banks = load_question_banks(path)
            .with_context(|| format!("failed to load question bank: {}", path.display()))?;
        let store = Self::from_banks(banks);
        tracing::info!(
            path = %path.display(),
            questions = store.question_count(),
            "question bank loaded"
        );
        Ok(store)
    }

    /// Number of questions across all roles.
    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    /// Conversation records logged for `user` under `role`.
    pub async fn conversations(&self, user: &str, role: &str) -> Vec<ConversationRecord> {
        self.conversations
            .read()
            .await
            .get(&(user.to_string(), role.to_string()))
            .cloned()
            .unwrap_or_default()
    }

    /// Score records logged for `user` under `role`.
    pub async fn scores(&self, user: &str, role: &str) -> Vec<ScoreRecord> {
        self.scores
            .read()
            .await
            .get(&(user.to_string(), role.to_string()))
            .cloned()
            .unwrap_or_default()
    }

    /// The merged final-score document for `user`.
    pub async fn final_score(&self, user: &str) -> Option<Map<String, Value>> {
        self.final_scores.read().await.get(user).cloned()
    }

    /// Merge `fields` into the final-score document for `user`.
    ///
    /// Named fields are overwritten; every other field is kept.
    pub async fn merge_final_score(&self, user: &str, fields: Map<String, Value>) {
        let mut docs = self.final_scores.write().await;
        let doc = docs.entry(user.to_string()).or_default();
        for (key, value) in fields {
            doc.insert(key, value);
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

#[async_trait]
impl QuestionRepository for MemoryStore {
    async fn questions_for_role(&self, job_role: &str) -> Result<Vec<Question>> {
        Ok(self
            .questions
            .iter()
            .filter(|e| e.job_role == job_role)
            .map(|e| e.question.clone())
            .collect())
    }

    async fn known_roles(&self) -> Result<Vec<String>> {
        let mut roles: Vec<String> = Vec::new();
        for entry in &self.questions {
            if !roles.contains(&entry.job_role) {
                roles.push(entry.job_role.clone());
            }
        }
        Ok(roles)
    }
}

#[async_trait]
impl AuditLog for MemoryStore {
    async fn log_conversation(&self, record: &ConversationRecord) -> Result<()> {
        self.conversations
            .write()
            .await
            .entry((record.user.clone(), record.role.clone()))
            .or_default()
            .push(record.clone());
        Ok(())
    }

    async fn log_score(&self, record: &ScoreRecord) -> Result<()> {
        self.scores
            .write()
            .await
            .entry((record.user.clone(), record.role.clone()))
            .or_default()
            .push(record.clone());
        Ok(())
    }

    async fn log_final_score(&self, record: &FinalScoreRecord) -> Result<()> {
        let fields = match serde_json::to_value(record)? {
            Value::Object(map) => map,
            other => anyhow::bail!("final score did not serialize to an object: {other}"),
        };
        self.merge_final_score(&record.user, fields).await;
        Ok(())
    }
}
