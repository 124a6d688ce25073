use thiserror::Error;

/// Failure of a single clean call. Both kinds depend only on the input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CleanError {
    #[error("{message}")]
    InvalidUrl { message: String },
    #[error("{message}")]
    UnsupportedPlatform {
        message: String,
        supported_platforms: Vec<String>,
    },
}

impl CleanError {
    pub(crate) fn invalid_url() -> Self {
        CleanError::InvalidUrl {
            message: "Invalid URL format".into(),
        }
    }

    pub(crate) fn unsupported(supported_platforms: Vec<String>) -> Self {
        CleanError::UnsupportedPlatform {
            message: format!(
                "Unsupported platform. Supported platforms: {}",
                supported_platforms.join(", ")
            ),
            supported_platforms,
        }
    }

    /// Stable machine-readable name of the variant.
    pub fn kind(&self) -> &'static str {
        match self {
            CleanError::InvalidUrl { .. } => "invalid_url",
            CleanError::UnsupportedPlatform { .. } => "unsupported_platform",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            CleanError::InvalidUrl { message }
            | CleanError::UnsupportedPlatform { message, .. } => message,
        }
    }
}

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Registry must contain at least one platform")]
    Empty,
    #[error("Invalid platform '{key}': {reason}")]
    InvalidEntry { key: String, reason: String },
    #[error("Duplicate platform key '{0}'")]
    DuplicateKey(String),
}
