//! Input checks that run before any store call.

use ma_core::error::{AppError, Result};
use ma_core::models::UserId;

/// Mutations need a resolved caller; a blank id counts as none.
pub fn require_caller(caller: Option<&UserId>) -> Result<&UserId> {
    match caller {
        Some(user) if !user.as_str().trim().is_empty() => Ok(user),
        _ => Err(AppError::Unauthenticated),
    }
}

/// Returns the trimmed value, or a `ValidationError` naming `field` when blank.
pub fn required(field: &str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::ValidationError(format!("{field} must not be empty")));
    }
    Ok(trimmed.to_string())
}
