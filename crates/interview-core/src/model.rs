//! Core data model types for interview sessions.
//!
//! Questions come from the question repository, sessions live in the
//! session store, and answers are appended to a session as they are scored.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single interview question from the question bank.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    /// Document identifier in the question bank.
    pub id: String,
    /// The question text shown to the candidate.
    pub question: String,
    /// Category (e.g. "Technical", "Behavioral").
    #[serde(default)]
    pub category: Option<String>,
    /// Difficulty label (e.g. "Easy", "Medium", "Hard").
    #[serde(default)]
    pub difficulty: Option<String>,
    /// Reference answer. Never sent to the candidate.
    #[serde(default)]
    pub expected_answer: Option<String>,
    /// Skill tags attached to the question.
    #[serde(default)]
    pub skill_tags: Vec<String>,
}

impl Question {
    /// The candidate-facing view of this question.
    pub fn view(&self) -> QuestionView {
        QuestionView {
            question_id: self.id.clone(),
            question: self.question.clone(),
            category: self.category.clone(),
            difficulty: self.difficulty.clone(),
        }
    }
}

/// A question as served to a candidate, without the expected answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionView {
    pub question_id: String,
    pub question: String,
    pub category: Option<String>,
    pub difficulty: Option<String>,
}

/// Lifecycle state of an interview session.
///
/// Transitions are monotonic: `Started -> InProgress -> Completed`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    #[default]
    Started,
    InProgress,
    Completed,
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionStatus::Started => write!(f, "started"),
            SessionStatus::InProgress => write!(f, "in_progress"),
            SessionStatus::Completed => write!(f, "completed"),
        }
    }
}

impl FromStr for SessionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "started" => Ok(SessionStatus::Started),
            "in_progress" => Ok(SessionStatus::InProgress),
            "completed" => Ok(SessionStatus::Completed),
            other => Err(format!("unknown session status: {other}")),
        }
    }
}

/// A scored answer. Appended to a session and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
    pub question_id: String,
    pub question: String,
    pub answer: String,
    /// Integer score in `0..=10`.
    pub score: u8,
    pub expected_answer: Option<String>,
    pub category: Option<String>,
    pub difficulty: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// One candidate's interview attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub id: String,
    pub email: String,
    pub job_role: String,
    /// Questions sampled for this session, in serving order.
    pub questions: Vec<Question>,
    /// Index of the question currently being answered.
    pub current_question_index: usize,
    pub answers: Vec<Answer>,
    pub posture_score: f64,
    pub eye_score: f64,
    pub status: SessionStatus,
    pub created_at: DateTime<Utc>,
}

impl Session {
    /// Create a new session in the `Started` state.
    pub fn new(email: &str, job_role: &str, questions: Vec<Question>) -> Self {
        let created_at = Utc::now();
        Self {
            id: generate_session_id(created_at),
            email: email.to_string(),
            job_role: job_role.to_string(),
            questions,
            current_question_index: 0,
            answers: Vec::new(),
            posture_score: 0.0,
            eye_score: 0.0,
            status: SessionStatus::Started,
            created_at,
        }
    }

    /// The question at `current_question_index`, if any.
    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.current_question_index)
    }

    /// Aggregate score over the answers recorded so far.
    pub fn totals(&self) -> ScoreTotals {
        ScoreTotals::from_answers(&self.answers)
    }
}

/// `session_<yyyymmddHHMMSS>_<uuid>`: sortable by creation time, unique per call.
fn generate_session_id(at: DateTime<Utc>) -> String {
    format!(
        "session_{}_{}",
        at.format("%Y%m%d%H%M%S"),
        Uuid::new_v4().simple()
    )
}

/// Total and percentage score over a list of answers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreTotals {
    /// Sum of all answer scores.
    pub total_score: u32,
    /// `total / (10 * answers) * 100`, unrounded. Zero when there are no answers.
    pub percentage_score: f64,
}

impl ScoreTotals {
    pub fn from_answers(answers: &[Answer]) -> Self {
        let total_score: u32 = answers.iter().map(|a| u32::from(a.score)).sum();
        let max_possible = answers.len() as f64 * 10.0;
        let percentage_score = if max_possible > 0.0 {
            f64::from(total_score) / max_possible * 100.0
        } else {
            0.0
        };
        Self {
            total_score,
            percentage_score,
        }
    }

    /// Percentage rounded to two decimals, as reported to clients.
    pub fn rounded_percentage(&self) -> f64 {
        round2(self.percentage_score)
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn answer(score: u8) -> Answer {
        Answer {
            question_id: "q".into(),
            question: "Q?".into(),
            answer: "A".into(),
            score,
            expected_answer: None,
            category: None,
            difficulty: None,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn status_display_and_parse() {
        assert_eq!(SessionStatus::InProgress.to_string(), "in_progress");
        assert_eq!(
            "completed".parse::<SessionStatus>().unwrap(),
            SessionStatus::Completed
        );
        assert!("done".parse::<SessionStatus>().is_err());
        assert_eq!(
            serde_json::to_value(SessionStatus::InProgress).unwrap(),
            "in_progress"
        );
    }

    #[test]
    fn totals_without_answers_are_zero() {
        let totals = ScoreTotals::from_answers(&[]);
        assert_eq!(totals.total_score, 0);
        assert_eq!(totals.percentage_score, 0.0);
        assert_eq!(totals.rounded_percentage(), 0.0);
    }

    #[test]
    fn totals_round_to_two_decimals() {
        let totals = ScoreTotals::from_answers(&[answer(7), answer(8), answer(5)]);
        assert_eq!(totals.total_score, 20);
        assert!((totals.percentage_score - 66.666_666).abs() < 1e-3);
        assert_eq!(totals.rounded_percentage(), 66.67);
    }

    #[test]
    fn view_hides_expected_answer() {
        let q = Question {
            id: "q1".into(),
            question: "What is ownership?".into(),
            category: Some("Technical".into()),
            difficulty: None,
            expected_answer: Some("secret".into()),
            skill_tags: vec!["rust".into()],
        };
        let json = serde_json::to_value(q.view()).unwrap();
        assert_eq!(json["questionId"], "q1");
        assert!(json.get("expectedAnswer").is_none());
        assert!(json["difficulty"].is_null());
    }

    #[test]
    fn new_session_starts_at_first_question() {
        let session = Session::new("a@b.com", "Backend Engineer", vec![]);
        assert!(session.id.starts_with("session_"));
        assert_eq!(session.status, SessionStatus::Started);
        assert_eq!(session.current_question_index, 0);
        assert!(session.current_question().is_none());

        let other = Session::new("a@b.com", "Backend Engineer", vec![]);
        assert_ne!(session.id, other.id);
    }
}
