use anyhow::Result;
use std::sync::Arc;

use crate::{Config, PreferenceStore, Preferences};

/// Application state and lifecycle: configuration plus persisted preferences.
pub struct App {
    config: Arc<Config>,
    preferences: Preferences,
    store: PreferenceStore,
}

impl App {
    /// Create a new application instance from the on-disk configuration
    pub fn new() -> Result<Self> {
        let (config, _) = Config::load_validated()?;
        Ok(Self::with_config(config))
    }

    /// Create an application around an already loaded configuration
    pub fn with_config(config: Config) -> Self {
        let store = PreferenceStore::in_dir(&config.config_dir);
        let preferences = store.load();
        tracing::info!(
            "Loaded preferences from {} (theme: {})",
            store.path().display(),
            preferences.theme()
        );

        Self {
            config: Arc::new(config),
            preferences,
            store,
        }
    }

    /// Get reference to application config
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Shared handle to the configuration
    pub fn shared_config(&self) -> Arc<Config> {
        self.config.clone()
    }

    pub fn preferences(&self) -> Preferences {
        self.preferences
    }

    /// Flip dark mode and persist it
    pub fn toggle_dark_mode(&mut self) -> Result<bool> {
        self.store.toggle_dark_mode(&mut self.preferences)
    }

    /// Shutdown the application
    pub fn shutdown(&mut self) -> Result<()> {
        tracing::info!("Shutting down application");
        Ok(())
    }
}
