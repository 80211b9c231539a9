mod cmd;
mod output;
mod wiring;

use clap::{Parser, Subcommand};
use cmd::config::ConfigSubcommand;
use cmd::submit::SubmitArgs;
use std::path::PathBuf;
use uuid::Uuid;

#[derive(Parser)]
#[command(
    name = "gtm",
    about = "Event-driven go-to-market pipeline — from PRD to posted content and feedback",
    version,
    propagate_version = true
)]
struct Cli {
    /// Config file (default: ~/.gtm/config.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Data directory for the event log and entity store
    #[arg(long, global = true, env = "GTM_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit a PRD and run the full pipeline
    Submit {
        /// Project name
        #[arg(long)]
        name: String,

        /// Owner id (random if omitted)
        #[arg(long)]
        owner: Option<Uuid>,

        /// Read the PRD from a file
        #[arg(long)]
        prd: Option<PathBuf>,

        /// Pass the PRD inline
        #[arg(long)]
        prd_text: Option<String>,

        /// Industry hint stored on the project
        #[arg(long)]
        industry: Option<String>,

        /// Use canned adapters instead of real model calls
        #[arg(long)]
        mock: bool,
    },

    /// List the stored event log for a project
    Events { project_id: Uuid },

    /// Show workflow state rebuilt from the event log
    Status { project_id: Uuid },

    /// Republish a project's event log through the stage handlers
    Replay {
        project_id: Uuid,

        /// Use canned adapters instead of real model calls
        #[arg(long)]
        mock: bool,
    },

    /// Inspect or initialize the configuration
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_target(false)
        .init();

    let result = wiring::load_env(cli.config.as_deref(), cli.data_dir.as_deref()).and_then(|env| {
        match cli.command {
            Commands::Submit {
                name,
                owner,
                prd,
                prd_text,
                industry,
                mock,
            } => cmd::submit::run(
                &env,
                SubmitArgs {
                    name,
                    owner,
                    prd,
                    prd_text,
                    industry,
                    mock,
                },
                cli.json,
            ),
            Commands::Events { project_id } => cmd::events::run(&env, project_id, cli.json),
            Commands::Status { project_id } => cmd::status::run(&env, project_id, cli.json),
            Commands::Replay { project_id, mock } => {
                cmd::replay::run(&env, project_id, mock, cli.json)
            }
            Commands::Config { subcommand } => cmd::config::run(&env, subcommand, cli.json),
        }
    });

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
