//! TOML question-bank parser.
//!
//! Loads question banks from TOML files and directories, and validates them.
//! Used to seed the in-memory store and by `interview validate`.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::controller::DEFAULT_MAX_QUESTIONS;
use crate::model::Question;

/// A question together with the job role it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct BankEntry {
    pub job_role: String,
    pub question: Question,
}

/// A parsed question-bank file.
#[derive(Debug, Clone)]
pub struct QuestionBank {
    pub name: String,
    pub description: String,
    pub entries: Vec<BankEntry>,
}

impl QuestionBank {
    /// Question counts per role, sorted by role name.
    pub fn role_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for entry in &self.entries {
            *counts.entry(entry.job_role.clone()).or_insert(0) += 1;
        }
        counts
    }
}

/// Intermediate TOML structure for parsing question-bank files.
#[derive(Debug, Deserialize)]
struct TomlBankFile {
    #[serde(default)]
    bank: Option<TomlBankHeader>,
    #[serde(default)]
    questions: Vec<TomlQuestion>,
}

#[derive(Debug, Deserialize)]
struct TomlBankHeader {
    name: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct TomlQuestion {
    id: String,
    job_role: String,
    question: String,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    difficulty: Option<String>,
    #[serde(default)]
    expected_answer: Option<String>,
    #[serde(default)]
    skill_tags: Vec<String>,
}

/// Parse a single TOML file into a `QuestionBank`.
pub fn parse_question_bank(path: &Path) -> Result<QuestionBank> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read question bank: {}", path.display()))?;

    parse_question_bank_str(&content, path)
}

/// Parse a TOML string into a `QuestionBank`.
pub fn parse_question_bank_str(content: &str, source_path: &Path) -> Result<QuestionBank> {
    let parsed: TomlBankFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    let (name, description) = match parsed.bank {
        Some(header) => (header.name, header.description),
        None => (
            source_path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default(),
            String::new(),
        ),
    };

    let entries = parsed
        .questions
        .into_iter()
        .map(|q| BankEntry {
            job_role: q.job_role,
            question: Question {
                id: q.id,
                question: q.question.trim().to_string(),
                category: q.category,
                difficulty: q.difficulty,
                expected_answer: q.expected_answer.map(|a| a.trim().to_string()),
                skill_tags: q.skill_tags,
            },
        })
        .collect();

    Ok(QuestionBank {
        name,
        description,
        entries,
    })
}

/// Recursively load all `.toml` question-bank files from a directory.
pub fn load_question_directory(dir: &Path) -> Result<Vec<QuestionBank>> {
    let mut banks = Vec::new();

    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    let mut paths = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<Vec<_>>>()?;
    paths.sort();

    for path in paths {
        if path.is_dir() {
            banks.extend(load_question_directory(&path)?);
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            match parse_question_bank(&path) {
                Ok(bank) => banks.push(bank),
                Err(e) => {
                    tracing::warn!("skipping {}: {:#}", path.display(), e);
                }
            }
        }
    }

    Ok(banks)
}

/// Load a single bank file or every bank under a directory.
pub fn load_question_banks(path: &Path) -> Result<Vec<QuestionBank>> {
    if path.is_dir() {
        load_question_directory(path)
    } else {
        Ok(vec![parse_question_bank(path)?])
    }
}

/// A warning from question-bank validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The question ID (if applicable).
    pub question_id: Option<String>,
    /// Warning message.
    pub message: String,
}

/// Validate a question bank for common issues.
pub fn validate_question_bank(bank: &QuestionBank) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    let mut seen_ids = HashSet::new();
    for entry in &bank.entries {
        let id = &entry.question.id;
        if !seen_ids.insert(id) {
            warnings.push(ValidationWarning {
                question_id: Some(id.clone()),
                message: format!("duplicate question ID: {id}"),
            });
        }
    }

    for entry in &bank.entries {
        let q = &entry.question;
        if entry.job_role.trim().is_empty() {
            warnings.push(ValidationWarning {
                question_id: Some(q.id.clone()),
                message: "job_role is empty".into(),
            });
        }
        if q.question.is_empty() {
            warnings.push(ValidationWarning {
                question_id: Some(q.id.clone()),
                message: "question text is empty".into(),
            });
        }
        if q.expected_answer.as_deref().map_or(true, str::is_empty) {
            warnings.push(ValidationWarning {
                question_id: Some(q.id.clone()),
                message: "no expected_answer provided".into(),
            });
        }
    }

    for (role, count) in bank.role_counts() {
        if count < DEFAULT_MAX_QUESTIONS {
            warnings.push(ValidationWarning {
                question_id: None,
                message: format!(
                    "role '{role}' has {count} question(s); interviews will be shorter than {DEFAULT_MAX_QUESTIONS}"
                ),
            });
        }
    }

    warnings
}
