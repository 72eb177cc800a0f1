//! CivicScribe server binary - composition root.
//!
//! 1. Load `.env`, configuration and CLI overrides
//! 2. Open the transcript store (SQLite, or memory on failure)
//! 3. Build the model client, audio notifier and interview controller
//! 4. Serve the axum API until interrupted

mod cli;

use clap::Parser;

use scribe_api::{start_server, AppState, StaticTokenVerifier};
use scribe_core::config::ScribeConfig;
use scribe_interview::{model_from_config, notifier_from_config, InterviewController, SessionManager};
use scribe_storage::open_transcript_store;

use crate::cli::CliArgs;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Secrets such as GEMINI_API_KEY may come from a local .env file.
    let dotenv = dotenvy::dotenv().ok();

    let args = CliArgs::parse();
    let config_file = args.resolve_config_path();
    let mut config = ScribeConfig::load_or_default(&config_file);
    args.apply(&mut config);

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.general.log_level)),
        )
        .init();

    tracing::info!("Starting CivicScribe v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(path = %config_file.display(), "Configuration resolved");
    if let Some(path) = dotenv {
        tracing::debug!(path = %path.display(), "Environment loaded from file");
    }

    let data_dir = config.data_dir();
    if let Err(e) = std::fs::create_dir_all(&data_dir) {
        tracing::error!(path = %data_dir.display(), error = %e, "Failed to create data directory");
        return Err(e.into());
    }

    let storage = open_transcript_store(&config.storage, &data_dir)?;
    tracing::info!(backend = ?storage.backend, "Storage ready");

    let model = model_from_config(&config.llm);
    let notifier = notifier_from_config(&config.speech, &data_dir);
    let sessions = SessionManager::new(storage.transcripts, config.interview.form_type.clone());
    let controller = InterviewController::new(sessions, model, notifier, &config.interview);
    tracing::info!(
        model = controller.model_name(),
        form_type = %config.interview.form_type,
        "Interview controller ready"
    );

    let verifier = StaticTokenVerifier::from_config(&config.auth, &data_dir);
    tracing::info!(tokens = verifier.len(), "Bearer token verifier ready");

    let state = AppState::new(
        config.clone(),
        controller,
        storage.users,
        std::sync::Arc::new(verifier),
    );

    if let Err(e) = start_server(&config, state).await {
        tracing::error!(error = %e, "Server stopped with an error");
        tracing::error!("Try: civicscribe --port {}", config.server.port.saturating_add(1));
        return Err(e.into());
    }

    tracing::info!("CivicScribe stopped");
    Ok(())
}
