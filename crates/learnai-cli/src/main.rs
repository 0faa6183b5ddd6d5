//! learnai CLI — the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use learnai_core::engine::GradingMode;
use learnai_core::wizard::WizardMode;

mod commands;

#[derive(Parser)]
#[command(
    name = "learnai",
    version,
    about = "Learn any topic: curated resources, tutorials, and quizzes"
)]
struct Cli {
    /// Config file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding score history and user id (overrides config)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the interactive learning wizard
    Learn {
        /// Topic to learn (prompted for when omitted)
        #[arg(long)]
        topic: Option<String>,

        /// Wizard flavour: resources or tutorial
        #[arg(long)]
        mode: Option<WizardMode>,

        /// Where to grade quizzes: local or remote
        #[arg(long)]
        grading: Option<GradingMode>,

        /// Write the final result as JSON to this path
        #[arg(long)]
        save_report: Option<PathBuf>,
    },

    /// Show recorded quiz scores for a topic
    History {
        /// Topic to look up
        topic: String,
    },

    /// Grade a quiz offline from correctness flags
    Grade {
        /// Topic the quiz was about
        #[arg(long)]
        topic: String,

        /// Comma-separated correctness flags (e.g. "1,0,1")
        #[arg(long, value_delimiter = ',', num_args = 1.., required = true, value_parser = commands::grade::parse_flag)]
        answers: Vec<bool>,

        /// Benchmark without saving the score
        #[arg(long)]
        no_record: bool,
    },

    /// Show the top remote scores for a topic
    Leaderboard {
        /// Topic to look up
        topic: String,
    },

    /// Create a starter config file
    Init,

    /// Print the anonymous user id sent with remote grading
    Whoami,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("learnai=info")),
        )
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let settings = || commands::load_settings(cli.config.as_deref(), cli.data_dir.clone());

    match cli.command {
        Commands::Learn {
            topic,
            mode,
            grading,
            save_report,
        } => commands::learn::execute(&settings()?, topic, mode, grading, save_report).await,
        Commands::History { topic } => commands::history::execute(&settings()?, &topic),
        Commands::Grade {
            topic,
            answers,
            no_record,
        } => commands::grade::execute(&settings()?, &topic, &answers, no_record),
        Commands::Leaderboard { topic } => {
            commands::leaderboard::execute(&settings()?, &topic).await
        }
        Commands::Whoami => commands::whoami::execute(&settings()?),
        Commands::Init => commands::init::execute(),
    }
}
