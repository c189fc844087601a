// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::error::DomainError;

/// Longest name accepted for catalog entries.
pub const MAX_NAME_LENGTH: usize = 255;

/// Validates a required name field.
///
/// # Errors
///
/// Returns `DomainError::InvalidName` if the name is blank or too long.
pub fn validate_name(field: &str, value: &str) -> Result<(), DomainError> {
    if value.trim().is_empty() {
        return Err(DomainError::InvalidName(format!("{field} cannot be empty")));
    }
    validate_optional_name(field, value)
}

/// Validates a name field that may be left empty.
///
/// # Errors
///
/// Returns `DomainError::InvalidName` if the name is too long.
pub fn validate_optional_name(field: &str, value: &str) -> Result<(), DomainError> {
    if value.chars().count() > MAX_NAME_LENGTH {
        return Err(DomainError::InvalidName(format!(
            "{field} cannot exceed {MAX_NAME_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Validates an email address and returns its local part.
///
/// # Errors
///
/// Returns `DomainError::InvalidEmail` unless the address has a non-empty
/// local part and domain separated by a single `@`.
pub fn email_local_part(email: &str) -> Result<&str, DomainError> {
    let mut parts = email.split('@');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) if !local.is_empty() && domain.contains('.') => {
            Ok(local)
        }
        _ => Err(DomainError::InvalidEmail(email.to_string())),
    }
}

/// Validates the fields of a user record.
///
/// # Errors
///
/// Returns an error if the username is blank or the email is malformed.
pub fn validate_user_fields(username: &str, email: &str) -> Result<(), DomainError> {
    validate_name("Username", username)?;
    if username.chars().any(char::is_whitespace) {
        return Err(DomainError::InvalidName(
            "Username cannot contain whitespace".to_string(),
        ));
    }
    email_local_part(email)?;
    Ok(())
}
