//! The `interview score` command.

use std::path::PathBuf;

use anyhow::{Context, Result};

use interview_core::config::load_config_from;
use interview_core::scoring::{AnswerScorer, ScoreOutcome, ScoringClient};
use interview_providers::create_provider;

pub async fn execute(question: String, answer: String, config_path: Option<PathBuf>) -> Result<()> {
    anyhow::ensure!(!question.trim().is_empty(), "question must not be empty");

    let config = load_config_from(config_path.as_deref())?;
    let provider_name = config.scoring.provider.clone();
    let provider = create_provider(
        &provider_name,
        config.scoring_provider()?,
        config.scoring.timeout(),
    )
    .with_context(|| format!("failed to create scoring provider '{provider_name}'"))?;

    let scorer = ScoringClient::new(provider, config.scoring.scoring_config());
    let outcome = scorer.score(&question, &answer).await;

    println!("Score: {}/10", outcome.score());
    match &outcome {
        ScoreOutcome::Scored { .. } => {}
        ScoreOutcome::EmptyAnswer => println!("  (empty answer, model not called)"),
        ScoreOutcome::Unparseable { response } => {
            println!("  (defaulted: no score in model response {response:?})")
        }
        ScoreOutcome::Failed { error } => println!("  (defaulted: scoring failed: {error})"),
    }
    println!("{}", serde_json::to_string_pretty(&outcome)?);

    Ok(())
}
