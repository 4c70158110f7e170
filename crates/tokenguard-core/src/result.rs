//! Convenience result type alias for Tokenguard.

use crate::error::AppError;

/// A specialized `Result` type for Tokenguard infrastructure operations.
pub type AppResult<T> = Result<T, AppError>;
