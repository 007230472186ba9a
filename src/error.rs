use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Invalid reference label '{label}': {reason}")]
    InvalidRefLabel { label: String, reason: String },

    #[error("Unknown month abbreviation '{token}' in reference label '{label}'")]
    UnknownMonth { label: String, token: String },

    #[error("Invalid engine configuration: {0}")]
    InvalidConfig(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ReportError>;
