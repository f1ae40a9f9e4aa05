//! The `interview init` command.

use std::path::Path;

use anyhow::{Context, Result};

pub fn execute() -> Result<()> {
    write_if_missing(Path::new("interview.toml"), SAMPLE_CONFIG)?;

    std::fs::create_dir_all("question-bank").context("failed to create question-bank/")?;
    write_if_missing(Path::new("question-bank/example.toml"), EXAMPLE_BANK)?;

    println!("\nNext steps:");
    println!("  1. export TOGETHER_API_KEY=...");
    println!("  2. Run: interview validate --bank question-bank");
    println!("  3. Run: interview serve");

    Ok(())
}

fn write_if_missing(path: &Path, contents: &str) -> Result<()> {
    if path.exists() {
        println!("{} already exists, skipping.", path.display());
    } else {
        std::fs::write(path, contents)
            .with_context(|| format!("failed to write {}", path.display()))?;
        println!("Created {}", path.display());
    }
    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# interview service configuration

[server]
bind = "127.0.0.1:5000"

[sessions]
ttl_secs = 14400
sweep_interval_secs = 60
max_questions = 10

[scoring]
provider = "together"
model = "meta-llama/Llama-3.3-70B-Instruct-Turbo-Free"
temperature = 0.5
max_tokens = 100
timeout_secs = 120
max_retries = 0

[providers.together]
type = "together"
api_key = "${TOGETHER_API_KEY}"

[providers.ollama]
type = "ollama"
base_url = "http://localhost:11434"

[store]
type = "memory"
question_bank = "question-bank"

# [store]
# type = "firestore"
# project_id = "my-project"
# access_token = "${FIRESTORE_ACCESS_TOKEN}"
"#;

const EXAMPLE_BANK: &str = r#"[bank]
name = "Example"
description = "A small starter question bank"

[[questions]]
id = "be-001"
job_role = "Backend Engineer"
question = "Explain the difference between a process and a thread."
category = "Technical"
difficulty = "Easy"
expected_answer = "A process has its own address space; threads within a process share memory and resources."
skill_tags = ["operating-systems", "concurrency"]

[[questions]]
id = "be-002"
job_role = "Backend Engineer"
question = "How would you make an HTTP endpoint idempotent?"
category = "Technical"
difficulty = "Medium"
expected_answer = "Use idempotency keys or natural keys so repeated requests produce the same result without duplicate side effects."
skill_tags = ["api-design"]

[[questions]]
id = "be-003"
job_role = "Backend Engineer"
question = "Tell me about a production incident you helped resolve."
category = "Behavioral"
difficulty = "Medium"
expected_answer = "Describes detection, mitigation, root cause, and follow-up actions with a clear personal contribution."
skill_tags = ["incident-response"]

[[questions]]
id = "da-001"
job_role = "Data Analyst"
question = "What is the difference between an inner join and a left join?"
category = "Technical"
difficulty = "Easy"
expected_answer = "An inner join keeps only matching rows; a left join keeps every row from the left table and fills missing matches with nulls."
skill_tags = ["sql"]

[[questions]]
id = "da-002"
job_role = "Data Analyst"
question = "How do you handle missing values in a dataset?"
category = "Technical"
difficulty = "Medium"
expected_answer = "Investigate why values are missing, then drop, impute, or flag them depending on the mechanism and the analysis."
skill_tags = ["data-cleaning"]
"#;
