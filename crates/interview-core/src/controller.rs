//! Interview session state machine.
//!
//! Orchestrates session creation, question sequencing, answer scoring,
//! completion, and reporting on top of the session store, the question
//! repository, the scorer, and the audit log.

use std::sync::Arc;

use chrono::Utc;
use rand::seq::SliceRandom;
use serde::Serialize;

use crate::error::InterviewError;
use crate::model::{Answer, Question, QuestionView, Session, SessionStatus};
use crate::scoring::AnswerScorer;
use crate::store::SessionStore;
use crate::traits::{
    AuditLog, ConversationRecord, FinalScoreRecord, QuestionRepository, ScoreRecord,
};

/// Default number of questions sampled per interview.
pub const DEFAULT_MAX_QUESTIONS: usize = 10;

/// Result of starting an interview.
#[derive(Debug, Clone)]
pub struct StartedInterview {
    pub session_id: String,
    pub question: QuestionView,
    pub question_count: usize,
}

/// Result of asking for the next question.
#[derive(Debug, Clone, PartialEq)]
pub enum NextQuestion {
    /// The session advanced to another question.
    Question {
        session_id: String,
        question: QuestionView,
        status: SessionStatus,
    },
    /// There are no more questions. The session status is left unchanged.
    Completed,
}

/// Result of submitting an answer.
#[derive(Debug, Clone)]
pub struct SubmittedAnswer {
    pub session_id: String,
    pub score: u8,
}

/// Aggregate scores returned when an interview ends.
#[derive(Debug, Clone)]
pub struct FinalScore {
    pub session_id: String,
    pub total_score: u32,
    /// Rounded to two decimals.
    pub percentage_score: f64,
    pub posture_score: f64,
    pub eye_score: f64,
}

/// Full question/answer history of a session.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InterviewReport {
    pub session_id: String,
    pub email: String,
    pub job_role: String,
    pub questions: Vec<String>,
    pub answers: Vec<Answer>,
    pub total_score: u32,
    pub percentage_score: f64,
    pub posture_score: f64,
    pub eye_score: f64,
    pub status: SessionStatus,
}

/// The interview controller.
pub struct InterviewController {
    questions: Arc<dyn QuestionRepository>,
    scorer: Arc<dyn AnswerScorer>,
    audit: Arc<dyn AuditLog>,
    sessions: Arc<dyn SessionStore>,
    max_questions: usize,
}

impl InterviewController {
    pub fn new(
        questions: Arc<dyn QuestionRepository>,
        scorer: Arc<dyn AnswerScorer>,
        audit: Arc<dyn AuditLog>,
        sessions: Arc<dyn SessionStore>,
    ) -> Self {
        Self {
            questions,
            scorer,
            audit,
            sessions,
            max_questions: DEFAULT_MAX_QUESTIONS,
        }
    }

    /// Override how many questions are sampled per interview.
    pub fn with_max_questions(mut self, max_questions: usize) -> Self {
        self.max_questions = max_questions.max(1);
        self
    }

    pub fn sessions(&self) -> &Arc<dyn SessionStore> {
        &self.sessions
    }

    /// Create a session for `email` and `job_role` and return its first question.
    pub async fn start_interview(
        &self,
        email: &str,
        job_role: &str,
    ) -> Result<StartedInterview, InterviewError> {
        if email.is_empty() || job_role.is_empty() {
            return Err(InterviewError::Validation(
                "Missing email or jobRole".to_string(),
            ));
        }

        let pool = self
            .questions
            .questions_for_role(job_role)
            .await
            .map_err(InterviewError::Repository)?;

        if pool.is_empty() {
            let available_roles = self
                .questions
                .known_roles()
                .await
                .map_err(InterviewError::Repository)?;
            tracing::info!(job_role, "no questions for role");
            return Err(InterviewError::NoQuestionsForRole {
                role: job_role.to_string(),
                available_roles,
            });
        }

        let sampled = sample_questions(&pool, self.max_questions);
        let session = Session::new(email, job_role, sampled);
        let started = StartedInterview {
            session_id: session.id.clone(),
            question: session.questions[0].view(),
            question_count: session.questions.len(),
        };
        self.sessions.create(session)?;

        tracing::info!(
            session_id = %started.session_id,
            job_role,
            pool_size = pool.len(),
            question_count = started.question_count,
            "interview started"
        );
        Ok(started)
    }

    /// Advance to the next question.
    ///
    /// Past the last question this returns [`NextQuestion::Completed`] without
    /// touching the session; only [`Self::end_interview`] marks it completed.
    pub fn next_question(&self, session_id: &str) -> Result<NextQuestion, InterviewError> {
        let mut advanced = false;
        let session = self.sessions.mutate(session_id, &mut |s| {
            advanced = false;
            let next = s.current_question_index + 1;
            if next >= s.questions.len() {
                return;
            }
            s.current_question_index = next;
            if s.status != SessionStatus::Completed {
                s.status = SessionStatus::InProgress;
            }
            advanced = true;
        })?;

        if !advanced {
            tracing::debug!(session_id, "no more questions");
            return Ok(NextQuestion::Completed);
        }

        let question = session.questions[session.current_question_index].view();
        tracing::debug!(
            session_id,
            index = session.current_question_index,
            "served next question"
        );
        Ok(NextQuestion::Question {
            session_id: session.id,
            question,
            status: session.status,
        })
    }

    /// Score an answer to the current question and record it.
    ///
    /// The session is not locked while the model is scoring; the answer is
    /// attached to the question that was current when the request arrived.
    pub async fn submit_answer(
        &self,
        session_id: &str,
        answer: &str,
    ) -> Result<SubmittedAnswer, InterviewError> {
        let session = self
            .sessions
            .get(session_id)
            .ok_or_else(|| InterviewError::SessionNotFound(session_id.to_string()))?;
        let question = session
            .current_question()
            .cloned()
            .ok_or_else(|| InterviewError::SessionNotFound(session_id.to_string()))?;

        let outcome = self.scorer.score(&question.question, answer).await;
        let score = outcome.score();
        if outcome.is_defaulted() {
            tracing::warn!(session_id, question_id = %question.id, ?outcome, "answer scored 0 by default");
        }

        let now = Utc::now();
        let record = Answer {
            question_id: question.id.clone(),
            question: question.question.clone(),
            answer: answer.to_string(),
            score,
            expected_answer: question.expected_answer.clone(),
            category: question.category.clone(),
            difficulty: question.difficulty.clone(),
            timestamp: now,
        };
        let mut pending = Some(record);
        self.sessions.mutate(session_id, &mut |s| {
            if let Some(record) = pending.take() {
                s.answers.push(record);
            }
        })?;

        let conversation = ConversationRecord {
            user: session.email.clone(),
            role: session.job_role.clone(),
            question: question.question.clone(),
            answer: answer.to_string(),
            is_follow_up: false,
            timestamp: now,
        };
        if let Err(e) = self.audit.log_conversation(&conversation).await {
            tracing::warn!(session_id, "failed to log conversation: {e:#}");
        }

        let score_record = ScoreRecord {
            user: session.email,
            role: session.job_role,
            question: question.question,
            answer: answer.to_string(),
            score,
            is_follow_up: false,
            timestamp: now,
        };
        if let Err(e) = self.audit.log_score(&score_record).await {
            tracing::warn!(session_id, "failed to log score: {e:#}");
        }

        tracing::info!(session_id, question_id = %question.id, score, "answer scored");
        Ok(SubmittedAnswer {
            session_id: session_id.to_string(),
            score,
        })
    }

    /// Compute final scores, write the final audit record, and mark the
    /// session completed.
    pub async fn end_interview(&self, session_id: &str) -> Result<FinalScore, InterviewError> {
        let session = self.sessions.mutate(session_id, &mut |s| {
            s.status = SessionStatus::Completed;
        })?;
        let totals = session.totals();

        let record = FinalScoreRecord {
            user: session.email.clone(),
            role: session.job_role.clone(),
            total_score: totals.total_score,
            percentage_score: totals.percentage_score,
            posture_score: session.posture_score,
            eye_score: session.eye_score,
            timestamp: Utc::now(),
        };
        if let Err(e) = self.audit.log_final_score(&record).await {
            tracing::warn!(session_id, "failed to log final score: {e:#}");
        }

        tracing::info!(
            session_id,
            total_score = totals.total_score,
            answers = session.answers.len(),
            "interview completed"
        );
        Ok(FinalScore {
            session_id: session.id,
            total_score: totals.total_score,
            percentage_score: totals.rounded_percentage(),
            posture_score: session.posture_score,
            eye_score: session.eye_score,
        })
    }

    /// Read-only report of a session.
    pub fn report(&self, session_id: &str) -> Result<InterviewReport, InterviewError> {
        let session = self
            .sessions
            .get(session_id)
            .ok_or_else(|| InterviewError::SessionNotFound(session_id.to_string()))?;
        let totals = session.totals();
        Ok(InterviewReport {
            session_id: session.id,
            email: session.email,
            job_role: session.job_role,
            questions: session.questions.into_iter().map(|q| q.question).collect(),
            answers: session.answers,
            total_score: totals.total_score,
            percentage_score: totals.rounded_percentage(),
            posture_score: session.posture_score,
            eye_score: session.eye_score,
            status: session.status,
        })
    }

    /// Overwrite the posture score. No range validation.
    pub fn update_posture_score(
        &self,
        session_id: &str,
        score: f64,
    ) -> Result<f64, InterviewError> {
        let session = self
            .sessions
            .mutate(session_id, &mut |s| s.posture_score = score)?;
        Ok(session.posture_score)
    }

    /// Overwrite the eye-contact score. No range validation.
    pub fn update_eye_score(&self, session_id: &str, score: f64) -> Result<f64, InterviewError> {
        let session = self
            .sessions
            .mutate(session_id, &mut |s| s.eye_score = score)?;
        Ok(session.eye_score)
    }

    /// Job roles with at least one question.
    pub async fn known_roles(&self) -> Result<Vec<String>, InterviewError> {
        self.questions
            .known_roles()
            .await
            .map_err(InterviewError::Repository)
    }
}

/// Draw `min(max, pool.len())` questions without replacement.
fn sample_questions(pool: &[Question], max: usize) -> Vec<Question> {
    let mut rng = rand::thread_rng();
    pool.choose_multiple(&mut rng, max.min(pool.len()))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::scoring::{ScoringClient, ScoringConfig};
    use crate::store::MemorySessionStore;
    use crate::traits::{GenerateRequest, GenerateResponse, LlmProvider, TokenUsage};

    struct FixedRepo {
        questions: Vec<(String, Question)>,
        fail: bool,
    }

    impl FixedRepo {
        fn with_role(role: &str, count: usize) -> Self {
            let questions = (0..count)
                .map(|i| {
                    (
                        role.to_string(),
                        Question {
                            id: format!("q{i}"),
                            question: format!("Question {i}?"),
                            category: Some("Technical".into()),
                            difficulty: Some("Medium".into()),
                            expected_answer: Some(format!("Expected {i}")),
                            skill_tags: vec![],
                        },
                    )
                })
                .collect();
            Self {
                questions,
                fail: false,
            }
        }
    }

    #[async_trait]
    impl QuestionRepository for FixedRepo {
        async fn questions_for_role(&self, job_role: &str) -> anyhow::Result<Vec<Question>> {
            anyhow::ensure!(!self.fail, "store unavailable");
            Ok(self
                .questions
                .iter()
                .filter(|(r, _)| r == job_role)
                .map(|(_, q)| q.clone())
                .collect())
        }

        async fn known_roles(&self) -> anyhow::Result<Vec<String>> {
            let mut roles: Vec<String> = Vec::new();
            for (r, _) in &self.questions {
                if !roles.contains(r) {
                    roles.push(r.clone());
                }
            }
            Ok(roles)
        }
    }

    #[derive(Default)]
    struct RecordingAudit {
        conversations: Mutex<Vec<ConversationRecord>>,
        scores: Mutex<Vec<ScoreRecord>>,
        finals: Mutex<Vec<FinalScoreRecord>>,
        fail: bool,
    }

    #[async_trait]
    impl AuditLog for RecordingAudit {
        async fn log_conversation(&self, record: &ConversationRecord) -> anyhow::Result<()> {
            anyhow::ensure!(!self.fail, "audit store down");
            self.conversations.lock().unwrap().push(record.clone());
            Ok(())
        }

        async fn log_score(&self, record: &ScoreRecord) -> anyhow::Result<()> {
            anyhow::ensure!(!self.fail, "audit store down");
            self.scores.lock().unwrap().push(record.clone());
            Ok(())
        }

        async fn log_final_score(&self, record: &FinalScoreRecord) -> anyhow::Result<()> {
            anyhow::ensure!(!self.fail, "audit store down");
            self.finals.lock().unwrap().push(record.clone());
            Ok(())
        }
    }

    /// Replies with a fixed string and counts calls.
    struct CountingProvider {
        reply: String,
        calls: AtomicU32,
    }

    #[async_trait]
    impl LlmProvider for CountingProvider {
        fn name(&self) -> &str {
            "counting"
        }

        async fn generate(&self, request: &GenerateRequest) -> anyhow::Result<GenerateResponse> {
            self.calls.fetch_add(1, Ordering::Relaxed);
            Ok(GenerateResponse {
                content: self.reply.clone(),
                model: request.model.clone(),
                token_usage: TokenUsage::default(),
                latency_ms: 0,
            })
        }
    }

    struct Harness {
        controller: InterviewController,
        provider: Arc<CountingProvider>,
        audit: Arc<RecordingAudit>,
    }

    fn harness(repo: FixedRepo, reply: &str, audit: RecordingAudit) -> Harness {
        let provider = Arc::new(CountingProvider {
            reply: reply.to_string(),
            calls: AtomicU32::new(0),
        });
        let audit = Arc::new(audit);
        let scorer = ScoringClient::new(provider.clone(), ScoringConfig::default());
        let controller = InterviewController::new(
            Arc::new(repo),
            Arc::new(scorer),
            audit.clone(),
            Arc::new(MemorySessionStore::new()),
        );
        Harness {
            controller,
            provider,
            audit,
        }
    }

    fn backend(count: usize, reply: &str) -> Harness {
        harness(
            FixedRepo::with_role("Backend Engineer", count),
            reply,
            RecordingAudit::default(),
        )
    }

    #[tokio::test]
    async fn start_samples_at_most_ten() {
        let h = backend(12, "7");
        let started = h
            .controller
            .start_interview("a@b.com", "Backend Engineer")
            .await
            .unwrap();
        assert_eq!(started.question_count, 10);

        let session = h.controller.sessions().get(&started.session_id).unwrap();
        assert_eq!(session.status, SessionStatus::Started);
        assert_eq!(session.questions.len(), 10);
        let ids: HashSet<_> = session.questions.iter().map(|q| q.id.clone()).collect();
        assert_eq!(ids.len(), 10, "sampled without replacement");
        assert_eq!(started.question, session.questions[0].view());
    }

    #[tokio::test]
    async fn start_with_small_pool_uses_whole_pool() {
        let h = backend(3, "7");
        let started = h
            .controller
            .start_interview("a@b.com", "Backend Engineer")
            .await
            .unwrap();
        assert_eq!(started.question_count, 3);
    }

    #[tokio::test]
    async fn start_respects_configured_cap() {
        let mut h = backend(12, "7");
        h.controller = h.controller.with_max_questions(5);
        let started = h
            .controller
            .start_interview("a@b.com", "Backend Engineer")
            .await
            .unwrap();
        assert_eq!(started.question_count, 5);
    }

    #[tokio::test]
    async fn start_validates_fields() {
        let h = backend(3, "7");
        let err = h
            .controller
            .start_interview("", "Backend Engineer")
            .await
            .unwrap_err();
        assert!(matches!(err, InterviewError::Validation(_)));
        let err = h.controller.start_interview("a@b.com", "").await.unwrap_err();
        assert!(matches!(err, InterviewError::Validation(_)));
    }

    #[tokio::test]
    async fn start_only_rejects_empty_fields() {
        let h = backend(3, "7");
        let started = h
            .controller
            .start_interview("  ", "Backend Engineer")
            .await
            .unwrap();
        assert_eq!(started.question_count, 3);

        let err = h.controller.start_interview("a@b.com", " ").await.unwrap_err();
        assert!(matches!(err, InterviewError::NoQuestionsForRole { .. }));
    }

    #[tokio::test]
    async fn start_unknown_role_lists_available_roles() {
        let h = backend(3, "7");
        let err = h
            .controller
            .start_interview("a@b.com", "Astronaut")
            .await
            .unwrap_err();
        match err {
            InterviewError::NoQuestionsForRole {
                role,
                available_roles,
            } => {
                assert_eq!(role, "Astronaut");
                assert_eq!(available_roles, vec!["Backend Engineer".to_string()]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(h.controller.sessions().is_empty());
    }

    #[tokio::test]
    async fn start_surfaces_repository_failure() {
        let mut repo = FixedRepo::with_role("Backend Engineer", 3);
        repo.fail = true;
        let h = harness(repo, "7", RecordingAudit::default());
        let err = h
            .controller
            .start_interview("a@b.com", "Backend Engineer")
            .await
            .unwrap_err();
        assert!(matches!(err, InterviewError::Repository(_)));
    }

    #[tokio::test]
    async fn next_question_walks_to_completion() {
        let h = backend(12, "7");
        let started = h
            .controller
            .start_interview("a@b.com", "Backend Engineer")
            .await
            .unwrap();
        let id = started.session_id;

        for i in 1..10 {
            match h.controller.next_question(&id).unwrap() {
                NextQuestion::Question { status, .. } => {
                    assert_eq!(status, SessionStatus::InProgress, "call {i}");
                }
                NextQuestion::Completed => panic!("completed early at call {i}"),
            }
        }
        assert_eq!(h.controller.next_question(&id).unwrap(), NextQuestion::Completed);

        let session = h.controller.sessions().get(&id).unwrap();
        assert_eq!(session.current_question_index, 9);
        assert_eq!(session.status, SessionStatus::InProgress);
    }

    #[tokio::test]
    async fn single_question_session_completes_immediately() {
        let h = backend(1, "7");
        let started = h
            .controller
            .start_interview("a@b.com", "Backend Engineer")
            .await
            .unwrap();
        assert_eq!(
            h.controller.next_question(&started.session_id).unwrap(),
            NextQuestion::Completed
        );
        let report = h.controller.report(&started.session_id).unwrap();
        assert_eq!(report.status, SessionStatus::Started);
    }

    #[tokio::test]
    async fn completed_status_is_never_reverted() {
        let h = backend(4, "7");
        let started = h
            .controller
            .start_interview("a@b.com", "Backend Engineer")
            .await
            .unwrap();
        let id = started.session_id;
        h.controller.end_interview(&id).await.unwrap();

        match h.controller.next_question(&id).unwrap() {
            NextQuestion::Question { status, .. } => assert_eq!(status, SessionStatus::Completed),
            NextQuestion::Completed => panic!("expected another question"),
        }
        assert_eq!(
            h.controller.report(&id).unwrap().status,
            SessionStatus::Completed
        );
    }

    #[tokio::test]
    async fn submit_scores_and_logs() {
        let h = backend(3, "Score: 8");
        let started = h
            .controller
            .start_interview("a@b.com", "Backend Engineer")
            .await
            .unwrap();
        let id = started.session_id;

        let submitted = h.controller.submit_answer(&id, "My answer").await.unwrap();
        assert_eq!(submitted.score, 8);

        let session = h.controller.sessions().get(&id).unwrap();
        assert_eq!(session.current_question_index, 0, "submit does not advance");
        assert_eq!(session.answers.len(), 1);
        let answer = &session.answers[0];
        assert_eq!(answer.question_id, started.question.question_id);
        assert_eq!(answer.answer, "My answer");
        assert!(answer.expected_answer.is_some());

        let conversations = h.audit.conversations.lock().unwrap();
        assert_eq!(conversations.len(), 1);
        assert_eq!(conversations[0].user, "a@b.com");
        assert_eq!(conversations[0].role, "Backend Engineer");
        let scores = h.audit.scores.lock().unwrap();
        assert_eq!(scores.len(), 1);
        assert_eq!(scores[0].score, 8);
    }

    #[tokio::test]
    async fn empty_answer_scores_zero_without_model_call() {
        let h = backend(3, "9");
        let started = h
            .controller
            .start_interview("a@b.com", "Backend Engineer")
            .await
            .unwrap();
        let submitted = h
            .controller
            .submit_answer(&started.session_id, "")
            .await
            .unwrap();
        assert_eq!(submitted.score, 0);
        assert_eq!(h.provider.calls.load(Ordering::Relaxed), 0);
    }

    #[tokio::test]
    async fn audit_failures_do_not_surface() {
        let audit = RecordingAudit {
            fail: true,
            ..RecordingAudit::default()
        };
        let h = harness(FixedRepo::with_role("Backend Engineer", 3), "6", audit);
        let started = h
            .controller
            .start_interview("a@b.com", "Backend Engineer")
            .await
            .unwrap();
        let submitted = h
            .controller
            .submit_answer(&started.session_id, "answer")
            .await
            .unwrap();
        assert_eq!(submitted.score, 6);
        let final_score = h.controller.end_interview(&started.session_id).await.unwrap();
        assert_eq!(final_score.total_score, 6);
    }

    #[tokio::test]
    async fn end_interview_totals() {
        let h = backend(5, "7");
        let started = h
            .controller
            .start_interview("a@b.com", "Backend Engineer")
            .await
            .unwrap();
        let id = started.session_id;

        h.controller.submit_answer(&id, "one").await.unwrap();
        h.controller.next_question(&id).unwrap();
        h.controller.submit_answer(&id, "two").await.unwrap();
        h.controller.next_question(&id).unwrap();
        h.controller.submit_answer(&id, "").await.unwrap();
        h.controller.update_posture_score(&id, 6.5).unwrap();
        h.controller.update_eye_score(&id, 8.0).unwrap();

        let final_score = h.controller.end_interview(&id).await.unwrap();
        assert_eq!(final_score.total_score, 14);
        assert_eq!(final_score.percentage_score, 46.67);
        assert_eq!(final_score.posture_score, 6.5);
        assert_eq!(final_score.eye_score, 8.0);

        let finals = h.audit.finals.lock().unwrap();
        assert_eq!(finals.len(), 1);
        assert_eq!(finals[0].user, "a@b.com");
        assert!((finals[0].percentage_score - 46.666_666).abs() < 1e-3);

        let report = h.controller.report(&id).unwrap();
        assert_eq!(report.status, SessionStatus::Completed);
    }

    #[tokio::test]
    async fn end_without_answers_is_zero_percent() {
        let h = backend(2, "7");
        let started = h
            .controller
            .start_interview("a@b.com", "Backend Engineer")
            .await
            .unwrap();
        let final_score = h.controller.end_interview(&started.session_id).await.unwrap();
        assert_eq!(final_score.total_score, 0);
        assert_eq!(final_score.percentage_score, 0.0);
    }

    #[tokio::test]
    async fn report_is_idempotent() {
        let h = backend(3, "9");
        let started = h
            .controller
            .start_interview("a@b.com", "Backend Engineer")
            .await
            .unwrap();
        let id = started.session_id;
        h.controller.submit_answer(&id, "answer").await.unwrap();

        let first = h.controller.report(&id).unwrap();
        let second = h.controller.report(&id).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.questions.len(), 3);
        assert_eq!(first.total_score, 9);
        assert_eq!(first.percentage_score, 90.0);
        assert_eq!(first.status, SessionStatus::Started);
    }

    #[tokio::test]
    async fn unknown_session_everywhere() {
        let h = backend(3, "7");
        let is_not_found = |e: InterviewError| matches!(e, InterviewError::SessionNotFound(_));

        assert!(is_not_found(h.controller.next_question("nope").unwrap_err()));
        assert!(is_not_found(
            h.controller.submit_answer("nope", "a").await.unwrap_err()
        ));
        assert!(is_not_found(h.controller.end_interview("nope").await.unwrap_err()));
        assert!(is_not_found(h.controller.report("nope").unwrap_err()));
        assert!(is_not_found(
            h.controller.update_posture_score("nope", 1.0).unwrap_err()
        ));
        assert!(is_not_found(h.controller.update_eye_score("nope", 1.0).unwrap_err()));
        assert_eq!(h.provider.calls.load(Ordering::Relaxed), 0);
    }
}
