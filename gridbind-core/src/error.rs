//! Error types for the gridbind core library.

use thiserror::Error;

/// Main error type for gridbind operations.
#[derive(Error, Debug, Clone)]
pub enum Error {
    /// Invalid or missing configuration, including binds attempted before
    /// the binder was initialized.
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Invalid configuration parameter value.
    #[error("Invalid configuration parameter {parameter}={value}: {reason}")]
    InvalidParameter {
        parameter: String,
        value: String,
        reason: String,
    },

    /// Partition routing failure: key extraction failed or a custom
    /// selector returned an out-of-range index. Fatal to that send only.
    #[error("Routing error: {message}")]
    Routing { message: String },

    /// Grid transport failure: grid unavailable or region attach failed.
    #[error("Transport error: {message}")]
    Transport { message: String },

    /// Serialization/deserialization errors
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// A second bind was attempted for a name that is already bound.
    #[error("Binding '{name}' is already bound")]
    BindingConflict { name: String },

    /// A bind was attempted before `init()` was called on the binder.
    #[error("Binder has not been initialized; call init() before binding")]
    NotInitialized,

    /// Internal system errors
    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Result type alias for gridbind operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<bincode::Error> for Error {
    fn from(err: bincode::Error) -> Self {
        Error::Serialization {
            message: err.to_string(),
        }
    }
}
