use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use planscope_lib::{
    commands::parse_plans::{parse_plans, PlanUpload},
    core::{
        config::Settings,
        errors::{AppError, AppResult},
        types::{PlanTier, Provider, UserContext},
    },
    init_tracing,
    providers::openai::OpenAiClient,
    security::keyring,
    AppState,
};

#[derive(Parser)]
#[command(name = "planscope", version, about = "Extract per-trade scope items from construction plan sets")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Parse a PDF plan set and print per-trade scope items as JSON
    Parse {
        /// Path to the PDF plan set
        file: PathBuf,
        /// JSON array of trade names, e.g. '["Electrical","Plumbing"]'
        #[arg(long)]
        trades: String,
        #[arg(long)]
        user_id: Option<String>,
        #[arg(long, default_value = "free")]
        plan: String,
        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },
    /// Store the OpenAI API key in the OS key store
    SetKey { api_key: String },
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let body = serde_json::to_string(&err)
                .unwrap_or_else(|_| format!("{{\"code\":\"{}\"}}", err.code()));
            eprintln!("{body}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> AppResult<()> {
    match cli.command {
        Command::SetKey { api_key } => keyring::set_provider_key(Provider::OpenAi, &api_key),
        Command::Parse {
            file,
            trades,
            user_id,
            plan,
            pretty,
        } => {
            let settings = Settings::from_env()?;
            let api_key = keyring::resolve_provider_key(Provider::OpenAi)?;
            // The blocking HTTP client is created (and later dropped) outside the runtime.
            let oracle = Arc::new(OpenAiClient::new(&settings, api_key)?);
            let state = AppState::new(settings, oracle)?;

            let bytes = std::fs::read(&file)?;
            let upload = PlanUpload {
                file_name: file
                    .file_name()
                    .map(|name| name.to_string_lossy().to_string())
                    .unwrap_or_default(),
                content_type: None,
                bytes,
            };
            let user = UserContext {
                uid: user_id,
                plan: PlanTier::from_name(&plan),
            };

            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .map_err(|err| AppError::Internal(err.to_string()))?;
            let response = runtime.block_on(parse_plans(&state, user, upload, &trades))?;
            drop(runtime);

            let output = if pretty {
                serde_json::to_string_pretty(&response)
            } else {
                serde_json::to_string(&response)
            }
            .map_err(|err| AppError::Internal(err.to_string()))?;
            println!("{output}");
            Ok(())
        }
    }
}
