use thiserror::Error;

#[derive(Error, Debug)]
pub enum IntrusionError {
    #[error("Invalid value {value:?} for {field}")]
    InvalidValue { field: &'static str, value: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Unknown confidence level: {0}")]
    UnknownConfidence(f64),

    #[error("Malformed samples file: {0}")]
    MalformedSamples(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),
}

impl IntrusionError {
    pub fn invalid_value(field: &'static str, value: impl Into<String>) -> Self {
        Self::InvalidValue {
            field,
            value: value.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, IntrusionError>;
