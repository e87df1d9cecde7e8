use nextbox_core::NextboxError;
use nextbox_server::ServerError;
use thiserror::Error;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// The result of a nextbox CLI operation.
pub type NextboxCliResult<T> = Result<T, NextboxCliError>;

/// An error that occurred while starting or running the nextbox server.
#[derive(pretty_error_debug::Debug, Error)]
pub enum NextboxCliError {
    /// An I/O error, e.g. the address is already in use.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The provider configuration is invalid.
    #[error(transparent)]
    Core(#[from] NextboxError),

    /// The server configuration is invalid.
    #[error(transparent)]
    Server(#[from] ServerError),

    /// A required setting is missing.
    #[error("missing required setting: {0}")]
    MissingSetting(String),

    /// Logging could not be initialized.
    #[error("failed to initialize logging: {0}")]
    Logging(String),
}
