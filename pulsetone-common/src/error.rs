//! Common error types for pulsetone

use thiserror::Error;

/// Common result type for pulsetone operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types shared by the engine and front-ends
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(format!("Malformed TOML: {}", err))
    }
}
