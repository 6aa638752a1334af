use crate::errors::ConfigError;

pub const DATABASE_URL_VAR: &str = "DATABASE_URL";
pub const BUFFER_SIZE_VAR: &str = "CSV_EXPORT_BUFFER_SIZE";

/// Default size of the destination write buffer (64KB).
pub const DEFAULT_WRITE_BUFFER_SIZE: usize = 64 * 1024;

/// Tuning knobs for the export executor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSettings {
    pub write_buffer_size: usize,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            write_buffer_size: DEFAULT_WRITE_BUFFER_SIZE,
        }
    }
}

/// Process configuration, read once at startup and passed down explicitly.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppConfig {
    pub database_url: Option<String>,
    pub export: ExportSettings,
}

impl AppConfig {
    /// Load from the process environment, after applying an optional `.env` file.
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Ok(path) = dotenv::dotenv() {
            log::debug!("Loaded environment overrides from {}", path.display());
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup(DATABASE_URL_VAR)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());

        let mut export = ExportSettings::default();
        if let Some(raw) = lookup(BUFFER_SIZE_VAR) {
            let size = raw.trim().parse::<usize>().map_err(|e| ConfigError::Invalid {
                key: BUFFER_SIZE_VAR,
                value: raw.clone(),
                reason: e.to_string(),
            })?;
            if size == 0 {
                return Err(ConfigError::Invalid {
                    key: BUFFER_SIZE_VAR,
                    value: raw,
                    reason: "must be greater than zero".to_string(),
                });
            }
            export.write_buffer_size = size;
        }

        Ok(Self { database_url, export })
    }

    pub fn require_database_url(&self) -> Result<&str, ConfigError> {
        self.database_url
            .as_deref()
            .ok_or(ConfigError::Missing(DATABASE_URL_VAR))
    }
}
