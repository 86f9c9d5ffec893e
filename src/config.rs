use std::env;
use std::time::Duration;

use crate::services::ImportOptions;

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub app_env: String,
    pub import_row_delay_ms: u64,
    pub import_row_timeout_ms: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, env::VarError> {
        dotenvy::dotenv().ok();

        Ok(Config {
            database_url: env::var("DATABASE_URL")?,
            app_env: env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
            import_row_delay_ms: env::var("IMPORT_ROW_DELAY_MS")
                .unwrap_or_else(|_| "150".to_string())
                .parse()
                .unwrap_or(150),
            import_row_timeout_ms: env::var("IMPORT_ROW_TIMEOUT_MS")
                .unwrap_or_else(|_| "30000".to_string())
                .parse()
                .unwrap_or(30_000),
        })
    }

    pub fn is_production(&self) -> bool {
        self.app_env == "production"
    }

    pub fn import_options(&self) -> ImportOptions {
        ImportOptions {
            row_delay: Duration::from_millis(self.import_row_delay_ms),
            row_timeout: Some(Duration::from_millis(self.import_row_timeout_ms)),
        }
    }
}
