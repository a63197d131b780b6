pub mod app;
pub mod config;
pub mod error;
pub mod preferences;

pub use app::App;
pub use config::{ApiConfig, CacheConfig, Config, UiConfig, ValidationResult};
pub use error::{classify, MeteoError, ReqwestErrorExt};
pub use preferences::{PreferenceStore, Preferences};

use anyhow::Result;

/// Initialize the core application
pub fn init() -> Result<()> {
    // Initialize tracing/logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::info!("Instant Weather core initialized");
    Ok(())
}
