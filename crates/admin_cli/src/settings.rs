//! Optional `wallet.toml` configuration, overridden by `WALLET_*`
//! environment variables and command-line flags.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct Settings {
    pub database_url: Option<String>,
    pub log_level: Option<String>,
}

impl Settings {
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("wallet").required(false))
            .add_source(Environment::with_prefix("WALLET"))
            .build()?;

        settings.try_deserialize()
    }
}
