//! `useradmin` - user administration backend
//!
//! Loads settings, opens the account database, seeds default accounts, and
//! serves JSON-lines requests from stdin until it closes.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod serve;
mod settings;

use tokio::io::BufReader;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use useradmin_core::{AccountRepository, AccountWriter, BcryptHasher, seed_default_accounts};

use settings::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load(&Settings::path()).await?;

    // Initialize logging; stdout carries responses
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| settings.log_filter.as_str().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("Starting useradmin");

    let db_path = settings.database_path();
    if let Some(parent) = db_path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let repo = AccountRepository::new(&db_path).await?;
    info!("Opened account database at {}", db_path.display());

    let writer = AccountWriter::new(repo, BcryptHasher::new(settings.bcrypt_cost));

    if settings.seed_default_accounts {
        seed_default_accounts(&writer).await?;
    }

    let input = BufReader::new(tokio::io::stdin());
    let served = serve::serve(&writer, input, tokio::io::stdout()).await?;

    info!("Input closed after {served} requests, shutting down");
    writer.store().close().await;
    Ok(())
}
