//! Server error taxonomy.
//!
//! Only startup and transport-level failures are typed; per-message
//! failures follow the silent-drop/close contract and never become errors
//! that cross a task boundary.

use thiserror::Error;

/// Errors from the production server runtime.
#[derive(Error, Debug)]
pub enum ServerError {
    /// Invalid configuration (bind address, origin list).
    #[error("config error: {0}")]
    Config(String),

    /// Socket-level failure while binding or serving.
    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),
}
