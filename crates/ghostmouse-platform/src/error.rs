//! Common error types for ghostmouse-platform.

use thiserror::Error;

/// Platform-level errors.
#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("window not found: {0}")]
    WindowNotFound(String),
    #[error("mouse hook installation failed: {0}")]
    HookInstall(String),
    #[error("not supported on this platform")]
    Unsupported,
}

/// Result type for platform operations.
pub type PlatformResult<T> = Result<T, PlatformError>;
