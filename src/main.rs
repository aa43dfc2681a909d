//! rawconv server binary
//!
//! Reads `.env`, builds the configuration from `RAWCONV_*` variables (and the
//! optional JSON file named by `RAWCONV_CONFIG`), and serves until SIGTERM or
//! SIGINT.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> rawconv::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("rawconv=info,tower_http=info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = rawconv::Config::from_env()?;
    tracing::info!(
        bind_address = %config.server.bind_address,
        upload_dir = ?config.storage.upload_dir,
        converted_dir = ?config.storage.converted_dir,
        converter = ?config.converter.executable,
        "starting rawconv"
    );

    rawconv::run_server_with_shutdown(config).await
}
