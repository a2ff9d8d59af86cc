use thiserror::Error;

/// Failure while reading, parsing or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config is not valid JSON5: {0}")]
    Syntax(#[from] json5::Error),
    #[error("config does not match the expected shape: {0}")]
    Decode(#[from] serde_json::Error),
    /// A value is present but unacceptable.
    #[error("invalid config value at {path}: {reason}")]
    Invalid { path: String, reason: String },
    #[error("cannot apply {name}={value:?} from the environment")]
    EnvOverride { name: String, value: String },
}

impl ConfigError {
    pub(crate) fn invalid(path: impl Into<String>, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
