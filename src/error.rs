//! Error handling module for the properties packer

use std::fmt;

#[derive(Debug)]
pub enum PackerError {
    /// Staging directory creation or permission failure
    Staging(String),
    /// Standard-input read or location fetch failure
    Input(String),
    /// Properties, image-reference or manifest parse failure
    Parse(String),
    /// Registry pull or image-layout write failure
    Store(String),
    /// Archive creation or streamed write failure
    Archive(String),
    Io(std::io::Error),
    Network(reqwest::Error),
    Serialization(serde_json::Error),
}

impl fmt::Display for PackerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PackerError::Staging(msg) => write!(f, "Staging error: {}", msg),
            PackerError::Input(msg) => write!(f, "Input error: {}", msg),
            PackerError::Parse(msg) => write!(f, "Parse error: {}", msg),
            PackerError::Store(msg) => write!(f, "Store error: {}", msg),
            PackerError::Archive(msg) => write!(f, "Archive error: {}", msg),
            PackerError::Io(err) => write!(f, "IO error: {}", err),
            PackerError::Network(err) => write!(f, "Network error: {}", err),
            PackerError::Serialization(err) => write!(f, "Serialization error: {}", err),
        }
    }
}

impl std::error::Error for PackerError {}

impl From<std::io::Error> for PackerError {
    fn from(err: std::io::Error) -> Self {
        PackerError::Io(err)
    }
}

impl From<reqwest::Error> for PackerError {
    fn from(err: reqwest::Error) -> Self {
        PackerError::Network(err)
    }
}

impl From<serde_json::Error> for PackerError {
    fn from(err: serde_json::Error) -> Self {
        PackerError::Serialization(err)
    }
}

pub type Result<T> = std::result::Result<T, PackerError>;
