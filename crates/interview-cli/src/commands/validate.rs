//! The `interview validate` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use interview_core::question_bank::{load_question_banks, validate_question_bank};

pub fn execute(bank_path: PathBuf) -> Result<()> {
    let banks = load_question_banks(&bank_path)?;
    anyhow::ensure!(
        !banks.is_empty(),
        "no question banks found under {}",
        bank_path.display()
    );

    let mut total_warnings = 0;

    for bank in &banks {
        println!(
            "Question bank: {} ({} questions)",
            bank.name,
            bank.entries.len()
        );

        let warnings = validate_question_bank(bank);
        for w in &warnings {
            let prefix = w
                .question_id
                .as_ref()
                .map(|id| format!("  [{id}]"))
                .unwrap_or_else(|| "  ".to_string());
            println!("{prefix} WARNING: {}", w.message);
        }
        total_warnings += warnings.len();

        let mut table = Table::new();
        table.set_header(vec!["Job role", "Questions"]);
        for (role, count) in bank.role_counts() {
            table.add_row(vec![Cell::new(role), Cell::new(count)]);
        }
        println!("{table}");
    }

    if total_warnings == 0 {
        println!("All question banks valid.");
    } else {
        println!("\n{total_warnings} warning(s) found.");
    }

    Ok(())
}
