//! HTTP handlers.
//!
//! Request and response bodies use camelCase keys. Handlers that take a
//! session id treat a missing id as an unknown session. A body that is
//! present but does not deserialize is rejected with 400.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use interview_core::controller::{FinalScore, InterviewReport, NextQuestion};
use interview_core::model::{QuestionView, SessionStatus};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub job_role: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionQuery {
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRequest {
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub answer: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreUpdateRequest {
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub score: Option<f64>,
}

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionResponse {
    pub session_id: String,
    pub question: String,
    pub category: Option<String>,
    pub difficulty: Option<String>,
    pub question_id: String,
    pub status: SessionStatus,
}

impl QuestionResponse {
    fn new(session_id: String, view: QuestionView, status: SessionStatus) -> Self {
        Self {
            session_id,
            question: view.question,
            category: view.category,
            difficulty: view.difficulty,
            question_id: view.question_id,
            status,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum NextQuestionResponse {
    Question(QuestionResponse),
    Completed {
        message: &'static str,
        status: SessionStatus,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    pub session_id: String,
    pub score: u8,
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EndResponse {
    pub session_id: String,
    pub total_score: u32,
    pub percentage_score: f64,
    pub posture_score: f64,
    pub eye_score: f64,
    pub status: SessionStatus,
}

impl From<FinalScore> for EndResponse {
    fn from(f: FinalScore) -> Self {
        Self {
            session_id: f.session_id,
            total_score: f.total_score,
            percentage_score: f.percentage_score,
            posture_score: f.posture_score,
            eye_score: f.eye_score,
            status: SessionStatus::Completed,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostureResponse {
    pub session_id: String,
    pub posture_score: f64,
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EyeResponse {
    pub session_id: String,
    pub eye_score: f64,
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct RolesResponse {
    pub roles: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub uptime_seconds: i64,
    pub active_sessions: usize,
}

fn session_id(id: Option<String>) -> ApiResult<String> {
    id.filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::NotFound("Session not found".into()))
}

fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> ApiResult<T> {
    body.map(|Json(req)| req).map_err(|rejection| {
        tracing::debug!(error = %rejection, "rejected request body");
        ApiError::BadRequest(format!("Invalid JSON body: {}", rejection.body_text()))
    })
}

/// A rejected query string carries no usable session id.
fn session_query(query: Option<Query<SessionQuery>>) -> SessionQuery {
    query.map(|Query(q)| q).unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /start_interview
pub async fn start_interview(
    State(state): State<AppState>,
    body: Option<Json<StartRequest>>,
) -> ApiResult<Json<QuestionResponse>> {
    let Some(Json(req)) = body else {
        return Err(ApiError::BadRequest("No JSON data received".into()));
    };

    let started = state
        .controller
        .start_interview(
            req.email.as_deref().unwrap_or_default(),
            req.job_role.as_deref().unwrap_or_default(),
        )
        .await?;

    Ok(Json(QuestionResponse::new(
        started.session_id,
        started.question,
        SessionStatus::Started,
    )))
}

/// GET /next_question?sessionId=
pub async fn next_question(
    State(state): State<AppState>,
    query: Option<Query<SessionQuery>>,
) -> ApiResult<Json<NextQuestionResponse>> {
    let id = session_id(session_query(query).session_id)?;

    let response = match state.controller.next_question(&id)? {
        NextQuestion::Question {
            session_id,
            question,
            ..
        } => NextQuestionResponse::Question(QuestionResponse::new(
            session_id,
            question,
            SessionStatus::InProgress,
        )),
        NextQuestion::Completed => NextQuestionResponse::Completed {
            message: "Interview completed",
            status: SessionStatus::Completed,
        },
    };
    Ok(Json(response))
}

/// POST /submit_answer
pub async fn submit_answer(
    State(state): State<AppState>,
    body: Result<Json<SubmitRequest>, JsonRejection>,
) -> ApiResult<Json<SubmitResponse>> {
    let req = json_body(body)?;
    let id = session_id(req.session_id)?;

    let submitted = state
        .controller
        .submit_answer(&id, req.answer.as_deref().unwrap_or_default())
        .await?;

    Ok(Json(SubmitResponse {
        session_id: submitted.session_id,
        score: submitted.score,
        status: "answer_received",
    }))
}

/// POST /end_interview
pub async fn end_interview(
    State(state): State<AppState>,
    body: Result<Json<SessionQuery>, JsonRejection>,
) -> ApiResult<Json<EndResponse>> {
    let req = json_body(body)?;
    let id = session_id(req.session_id)?;

    let final_score = state.controller.end_interview(&id).await?;
    Ok(Json(final_score.into()))
}

/// GET /interview_report?sessionId=
pub async fn interview_report(
    State(state): State<AppState>,
    query: Option<Query<SessionQuery>>,
) -> ApiResult<Json<InterviewReport>> {
    let id = session_id(session_query(query).session_id)?;
    Ok(Json(state.controller.report(&id)?))
}

/// POST /update_posture_score
pub async fn update_posture_score(
    State(state): State<AppState>,
    body: Result<Json<ScoreUpdateRequest>, JsonRejection>,
) -> ApiResult<Json<PostureResponse>> {
    let req = json_body(body)?;
    let id = session_id(req.session_id)?;

    let posture_score = state
        .controller
        .update_posture_score(&id, req.score.unwrap_or_default())?;

    Ok(Json(PostureResponse {
        session_id: id,
        posture_score,
        status: "updated",
    }))
}

/// POST /update_eye_score
pub async fn update_eye_score(
    State(state): State<AppState>,
    body: Result<Json<ScoreUpdateRequest>, JsonRejection>,
) -> ApiResult<Json<EyeResponse>> {
    let req = json_body(body)?;
    let id = session_id(req.session_id)?;

    let eye_score = state
        .controller
        .update_eye_score(&id, req.score.unwrap_or_default())?;

    Ok(Json(EyeResponse {
        session_id: id,
        eye_score,
        status: "updated",
    }))
}

/// GET /job_roles
pub async fn job_roles(State(state): State<AppState>) -> ApiResult<Json<RolesResponse>> {
    let roles = state.controller.known_roles().await?;
    Ok(Json(RolesResponse { roles }))
}

/// GET /health
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        uptime_seconds: state.uptime_seconds(),
        active_sessions: state.controller.sessions().len(),
    })
}
