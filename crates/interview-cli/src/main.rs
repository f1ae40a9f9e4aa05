//! interview CLI — run the interview service and manage question banks.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "interview", version, about = "LLM-scored mock interview service")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API
    Serve {
        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,

        /// Address to bind, overriding the config file
        #[arg(long)]
        bind: Option<String>,
    },

    /// Validate question-bank TOML files
    Validate {
        /// Path to a question-bank file or directory
        #[arg(long)]
        bank: PathBuf,
    },

    /// Create a starter config and example question bank
    Init,

    /// Score a single answer with the configured model
    Score {
        /// Question text
        #[arg(long)]
        question: String,

        /// Candidate answer
        #[arg(long)]
        answer: String,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    let directive = match "interview=info".parse() {
        Ok(directive) => directive,
        Err(e) => {
            eprintln!("Error: invalid log directive: {e}");
            process::exit(1);
        }
    };
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(directive))
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Serve { config, bind } => commands::serve::execute(config, bind).await,
        Commands::Validate { bank } => commands::validate::execute(bank),
        Commands::Init => commands::init::execute(),
        Commands::Score {
            question,
            answer,
            config,
        } => commands::score::execute(question, answer, config).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
