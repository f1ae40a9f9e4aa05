//! The `interview serve` command.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};

use interview_core::config::load_config_from;
use interview_core::scoring::ScoringClient;
use interview_core::store::{MemorySessionStore, SessionStore};
use interview_core::InterviewController;
use interview_providers::create_provider;
use interview_server::{spawn_session_reaper, AppState};
use interview_store::create_store;

pub async fn execute(config_path: Option<PathBuf>, bind: Option<String>) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;

    let provider_name = config.scoring.provider.clone();
    let provider_config = config.scoring_provider()?;
    let provider = create_provider(&provider_name, provider_config, config.scoring.timeout())
        .with_context(|| format!("failed to create scoring provider '{provider_name}'"))?;
    let scorer = Arc::new(ScoringClient::new(
        provider,
        config.scoring.scoring_config(),
    ));

    let backends = create_store(&config.store)?;

    let sessions: Arc<dyn SessionStore> = match config.sessions.ttl() {
        Some(ttl) => Arc::new(MemorySessionStore::with_ttl(ttl)),
        None => Arc::new(MemorySessionStore::new()),
    };

    let controller = InterviewController::new(
        backends.questions,
        scorer,
        backends.audit,
        sessions.clone(),
    )
    .with_max_questions(config.sessions.max_questions);

    let reaper = config.sessions.ttl().map(|ttl| {
        tracing::info!(
            ttl_secs = ttl.as_secs(),
            sweep_secs = config.sessions.sweep_interval().as_secs(),
            "session expiry enabled"
        );
        spawn_session_reaper(sessions, config.sessions.sweep_interval())
    });

    let addr = bind.unwrap_or_else(|| config.server.bind.clone());
    tracing::info!(
        provider = %provider_name,
        model = %config.scoring.model,
        "starting interview service"
    );

    let result = interview_server::serve(AppState::new(Arc::new(controller)), &addr).await;
    if let Some(handle) = reaper {
        handle.abort();
    }
    result?;
    Ok(())
}
