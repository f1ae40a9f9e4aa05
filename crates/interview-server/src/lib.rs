//! interview-server — HTTP API for scored mock interviews.
//!
//! Wraps an [`InterviewController`] in an axum router with permissive CORS and
//! request tracing, and runs a background sweep that drops idle sessions.

pub mod api;
pub mod error;
pub mod state;

use std::sync::Arc;
use std::time::Duration;

use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use interview_core::store::SessionStore;

pub use error::{ApiError, ServerError};
pub use interview_core::InterviewController;
pub use state::AppState;

/// Build the application router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/start_interview", post(api::start_interview))
        .route("/next_question", get(api::next_question))
        .route("/submit_answer", post(api::submit_answer))
        .route("/end_interview", post(api::end_interview))
        .route("/interview_report", get(api::interview_report))
        .route("/update_posture_score", post(api::update_posture_score))
        .route("/update_eye_score", post(api::update_eye_score))
        .route("/job_roles", get(api::job_roles))
        .route("/health", get(api::health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Periodically evict idle sessions from `sessions`.
pub fn spawn_session_reaper(sessions: Arc<dyn SessionStore>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // The first tick completes immediately.
        interval.tick().await;
        loop {
            interval.tick().await;
            let evicted = sessions.evict_expired();
            if evicted > 0 {
                tracing::info!(evicted, remaining = sessions.len(), "expired sessions evicted");
            }
        }
    })
}

/// Bind `addr` and serve until ctrl-c.
pub async fn serve(state: AppState, addr: &str) -> Result<(), ServerError> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| ServerError::Bind {
            addr: addr.to_string(),
            source: e,
        })?;

    let local = listener
        .local_addr()
        .map(|a| a.to_string())
        .unwrap_or_else(|_| addr.to_string());
    tracing::info!("interview server listening on {local}");

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(ServerError::Serve)?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("failed to listen for ctrl-c: {e}");
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use interview_core::model::{Question, Session};
    use interview_core::store::MemorySessionStore;

    fn session() -> Session {
        Session::new(
            "a@b.com",
            "QA",
            vec![Question {
                id: "q1".into(),
                question: "Q?".into(),
                category: None,
                difficulty: None,
                expected_answer: None,
                skill_tags: vec![],
            }],
        )
    }

    #[tokio::test(start_paused = true)]
    async fn reaper_evicts_idle_sessions() {
        let store = Arc::new(MemorySessionStore::with_ttl(Duration::from_secs(60)));
        store.create(session()).unwrap();
        assert_eq!(store.len(), 1);

        let handle = spawn_session_reaper(store.clone(), Duration::from_secs(10));
        tokio::time::sleep(Duration::from_secs(75)).await;

        assert_eq!(store.len(), 0);
        handle.abort();
    }

    #[tokio::test]
    async fn bind_failure_is_reported() {
        let state = {
            use interview_core::scoring::{ScoringClient, ScoringConfig};
            use interview_providers::MockProvider;
            use interview_store::MemoryStore;

            let store = Arc::new(MemoryStore::default());
            let scorer = Arc::new(ScoringClient::new(
                Arc::new(MockProvider::with_fixed_response("5")),
                ScoringConfig::default(),
            ));
            let controller = InterviewController::new(
                store.clone(),
                scorer,
                store,
                Arc::new(MemorySessionStore::new()),
            );
            AppState::new(Arc::new(controller))
        };

        let err = serve(state, "not-an-address").await.unwrap_err();
        assert!(matches!(err, ServerError::Bind { .. }));
    }
}
