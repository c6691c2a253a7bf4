//! Survey bot
//!
//! A Telegram bot that walks users through remote surveys: setup fields
//! first, then a dynamically served sequence of text and choice questions.

mod config;
mod credential;
mod runtime;
mod state_machine;
mod store;
mod survey;
mod transport;

use config::BotConfig;
use credential::CredentialIssuer;
use runtime::{ProductionManager, RuntimeSettings};
use std::sync::Arc;
use store::InMemoryStore;
use survey::{HttpSurveyClient, LoggingSurveyApi};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use transport::TelegramTransport;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // An optional .env sits next to the binary in deployments
    let env_file = dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "survey_bot=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    if let Some(path) = env_file {
        tracing::info!(path = %path.display(), "Loaded environment file");
    }

    // Configuration
    let config = BotConfig::from_env()?;
    tracing::info!(
        base_url = %config.base_url,
        conversation_ttl_secs = config.conversation_ttl.as_secs(),
        "Configuration loaded"
    );

    // Survey service
    let client = HttpSurveyClient::new(&config.base_url, config.survey_timeout)?;
    let survey = Arc::new(LoggingSurveyApi::new(Arc::new(client)));

    let telegram = Arc::new(TelegramTransport::new(
        &config.telegram_api_url,
        &config.bot_token,
    )?);

    let manager: Arc<ProductionManager> = Arc::new(runtime::RuntimeManager::new(
        Arc::new(InMemoryStore::new()),
        survey,
        telegram.clone(),
        Arc::new(CredentialIssuer::new(config.secret_key.as_bytes())),
        RuntimeSettings {
            effect_timeout: config.effect_timeout,
            conversation_ttl: config.conversation_ttl,
            eviction_interval: config.eviction_interval,
        },
    ));

    // Shutdown on Ctrl-C
    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for Ctrl-C");
                return;
            }
            tracing::info!("Shutdown requested");
            cancel.cancel();
        });
    }

    let sweeper = manager.spawn_eviction_sweeper(cancel.clone());

    telegram.start_polling(&manager, &cancel).await;

    sweeper.await?;
    tracing::info!("Survey bot stopped");

    Ok(())
}
