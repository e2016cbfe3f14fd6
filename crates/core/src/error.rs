//! Errors raised while loading settings and setting up shared services

/// Standard result type for core operations
pub type CoreResult<T> = std::result::Result<T, CoreError>;

/// Core error types that can be shared across crates
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize, thiserror::Error)]
pub enum CoreError {
    /// A setting is missing or has an unusable value
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// A settings file exists but could not be parsed
    #[error("Failed to read settings from {origin}: {message}")]
    SettingsFile { origin: String, message: String },

    #[error("Logging setup failed: {message}")]
    Logging { message: String },
}

impl CoreError {
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    pub fn logging(message: impl Into<String>) -> Self {
        Self::Logging {
            message: message.into(),
        }
    }
}

impl From<config::ConfigError> for CoreError {
    fn from(err: config::ConfigError) -> Self {
        match &err {
            config::ConfigError::FileParse { uri, .. } => Self::SettingsFile {
                origin: uri.clone().unwrap_or_else(|| "settings file".to_string()),
                message: err.to_string(),
            },
            _ => Self::invalid_config(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_errors_are_invalid_config() {
        let err: CoreError = config::ConfigError::Message("timeout_secs: invalid digit".into()).into();
        assert!(matches!(err, CoreError::InvalidConfig { .. }));
        assert!(err.to_string().contains("timeout_secs"));
    }
}
