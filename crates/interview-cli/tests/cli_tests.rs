//! CLI integration tests using assert_cmd.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn interview() -> Command {
    #[allow(deprecated)]
    Command::cargo_bin("interview").unwrap()
}

/// A command isolated from the caller's config and API keys.
fn isolated(dir: &TempDir) -> Command {
    let mut cmd = interview();
    cmd.current_dir(dir.path())
        .env("HOME", dir.path())
        .env_remove("TOGETHER_API_KEY");
    cmd
}

const OFFLINE_CONFIG: &str = r#"
[scoring]
provider = "local"
model = "llama3"
timeout_secs = 5

[providers.local]
type = "ollama"
base_url = "http://127.0.0.1:9"
"#;

#[test]
fn help_lists_subcommands() {
    interview()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("serve"))
        .stdout(predicate::str::contains("validate"))
        .stdout(predicate::str::contains("init"))
        .stdout(predicate::str::contains("score"));
}

#[test]
fn init_creates_files() {
    let dir = TempDir::new().unwrap();

    isolated(&dir)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created interview.toml"))
        .stdout(predicate::str::contains("Created question-bank/example.toml"));

    assert!(dir.path().join("interview.toml").exists());
    assert!(dir.path().join("question-bank/example.toml").exists());
}

#[test]
fn init_skips_existing_files() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("interview.toml"), "# mine\n").unwrap();

    isolated(&dir)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("interview.toml already exists"));

    let contents = std::fs::read_to_string(dir.path().join("interview.toml")).unwrap();
    assert_eq!(contents, "# mine\n");
}

#[test]
fn validate_initialized_bank() {
    let dir = TempDir::new().unwrap();
    isolated(&dir).arg("init").assert().success();

    isolated(&dir)
        .arg("validate")
        .arg("--bank")
        .arg("question-bank")
        .assert()
        .success()
        .stdout(predicate::str::contains("Question bank: Example (5 questions)"))
        .stdout(predicate::str::contains("Backend Engineer"))
        .stdout(predicate::str::contains("Data Analyst"))
        .stdout(predicate::str::contains("shorter than 10"));
}

#[test]
fn validate_reports_duplicate_ids() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("dup.toml"),
        r#"
[[questions]]
id = "q1"
job_role = "QA"
question = "First?"
expected_answer = "a"

[[questions]]
id = "q1"
job_role = "QA"
question = "Second?"
expected_answer = "b"
"#,
    )
    .unwrap();

    isolated(&dir)
        .arg("validate")
        .arg("--bank")
        .arg("dup.toml")
        .assert()
        .success()
        .stdout(predicate::str::contains("[q1] WARNING: duplicate question ID"));
}

#[test]
fn validate_nonexistent_file() {
    let dir = TempDir::new().unwrap();
    isolated(&dir)
        .arg("validate")
        .arg("--bank")
        .arg("nonexistent.toml")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn serve_fails_fast_without_scoring_provider() {
    let dir = TempDir::new().unwrap();
    isolated(&dir)
        .arg("serve")
        .assert()
        .failure()
        .stderr(predicate::str::contains("not configured"));
}

#[test]
fn serve_with_missing_config_file() {
    let dir = TempDir::new().unwrap();
    isolated(&dir)
        .arg("serve")
        .arg("--config")
        .arg("missing.toml")
        .assert()
        .failure()
        .stderr(predicate::str::contains("config file not found"));
}

#[test]
fn score_empty_answer_skips_model() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("interview.toml"), OFFLINE_CONFIG).unwrap();

    isolated(&dir)
        .arg("score")
        .arg("--question")
        .arg("What is a left join?")
        .arg("--answer")
        .arg("")
        .assert()
        .success()
        .stdout(predicate::str::contains("Score: 0/10"))
        .stdout(predicate::str::contains("empty answer"));
}

#[test]
fn score_defaults_to_zero_when_model_unreachable() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("interview.toml"), OFFLINE_CONFIG).unwrap();

    isolated(&dir)
        .arg("score")
        .arg("--question")
        .arg("What is a left join?")
        .arg("--answer")
        .arg("It keeps all rows from the left table.")
        .assert()
        .success()
        .stdout(predicate::str::contains("Score: 0/10"))
        .stdout(predicate::str::contains("scoring failed"));
}

#[test]
fn score_rejects_empty_question() {
    let dir = TempDir::new().unwrap();
    isolated(&dir)
        .arg("score")
        .arg("--question")
        .arg("")
        .arg("--answer")
        .arg("anything")
        .assert()
        .failure()
        .stderr(predicate::str::contains("question must not be empty"));
}
