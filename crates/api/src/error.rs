// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Error types for the API layer.

use lms::CoreError;
use lms_domain::DomainError;
use lms_persistence::PersistenceError;

/// Attribution errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// The request did not say who is acting.
    AuthenticationFailed {
        /// The reason authentication failed.
        reason: String,
    },
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AuthenticationFailed { reason } => {
                write!(f, "Authentication failed: {reason}")
            }
        }
    }
}

impl std::error::Error for AuthError {}

/// API-level errors.
///
/// These are distinct from domain/core errors and represent the API contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The acting user could not be determined.
    AuthenticationFailed {
        /// The reason authentication failed.
        reason: String,
    },
    /// A domain rule was violated.
    DomainRuleViolation {
        /// The rule that was violated.
        rule: String,
        /// A human-readable description of the violation.
        message: String,
    },
    /// Invalid input was provided.
    InvalidInput {
        /// The field that was invalid.
        field: String,
        /// A human-readable description of the error.
        message: String,
    },
    /// A requested resource was not found.
    ResourceNotFound {
        /// The type of resource that was not found.
        resource_type: String,
        /// A human-readable description of what was not found.
        message: String,
    },
    /// An internal error occurred.
    Internal {
        /// A description of the internal error.
        message: String,
    },
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AuthenticationFailed { reason } => {
                write!(f, "Authentication failed: {reason}")
            }
            Self::DomainRuleViolation { rule, message } => {
                write!(f, "Domain rule violation ({rule}): {message}")
            }
            Self::InvalidInput { field, message } => {
                write!(f, "Invalid input for field '{field}': {message}")
            }
            Self::ResourceNotFound {
                resource_type,
                message,
            } => {
                write!(f, "{resource_type} not found: {message}")
            }
            Self::Internal { message } => {
                write!(f, "Internal error: {message}")
            }
        }
    }
}

impl std::error::Error for ApiError {}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::AuthenticationFailed { reason } => Self::AuthenticationFailed { reason },
        }
    }
}

impl From<PersistenceError> for ApiError {
    fn from(err: PersistenceError) -> Self {
        translate_persistence_error(err)
    }
}

fn invalid(field: &str, message: String) -> ApiError {
    ApiError::InvalidInput {
        field: field.to_string(),
        message,
    }
}

fn violation(rule: &str, message: String) -> ApiError {
    ApiError::DomainRuleViolation {
        rule: rule.to_string(),
        message,
    }
}

/// Translates a domain error into an API error.
///
/// This translation is explicit and ensures domain errors are not leaked directly.
#[must_use]
pub fn translate_domain_error(err: DomainError) -> ApiError {
    let message: String = err.to_string();
    match err {
        DomainError::InvalidName(_) => invalid("name", message),
        DomainError::InvalidEmail(_) => invalid("email", message),
        DomainError::UnknownVariant { kind, .. } => invalid(kind, message),
        DomainError::DateParseError { .. } => invalid("date", message),
        DomainError::InvalidTotal(_) => invalid("total", message),
        DomainError::TotalBelowUsed { .. } => violation("total_covers_used_seats", message),
        DomainError::MissingSubscriptionDates | DomainError::TermTooShort { .. } => {
            invalid("ended_date", message)
        }
        DomainError::MissingOemDevice => invalid("oem_device", message),
        DomainError::StartBeforePurchase { .. } => invalid("started_date", message),
        DomainError::FamilyMismatch { .. } => violation("same_software_family", message),
        DomainError::PlatformNotSupported { .. } => violation("supported_platform", message),
        DomainError::LicenseMismatch { .. } => violation("license_covers_software", message),
        DomainError::LicenseInactive(_) => violation("active_license", message),
        DomainError::NotEnoughLicenses { .. } => violation("seat_capacity", message),
        DomainError::SeatUnderflow { .. } => violation("seat_underflow", message),
        DomainError::LicenseKeyWithoutLicense => invalid("license_key_id", message),
        DomainError::LicenseKeyMismatch(_) => violation("key_matches_license", message),
        DomainError::KeyPlatformMismatch { .. } => violation("key_platform", message),
        DomainError::LicenseKeyUnavailable(_) => violation("single_activation_key", message),
        DomainError::EmptySelection(kind) => invalid(kind, message),
        DomainError::InvalidWarrantyPeriod => invalid("warranty_end_date", message),
        DomainError::WarrantyBeforePurchase => invalid("warranty_start_date", message),
        DomainError::ExchangeAlreadyPending(_) => violation("single_pending_exchange", message),
        DomainError::ExchangeNotPending { .. } => violation("pending_exchange", message),
        DomainError::NotAssetHolder { .. } => violation("asset_holder", message),
        DomainError::ExchangeParticipantMismatch { .. } => {
            violation("exchange_participant", message)
        }
        DomainError::MissingDestination => invalid("destination_id", message),
        DomainError::KittingIncomplete(_) => violation("kitting_complete", message),
        DomainError::KittingNotRequired(_) => violation("kitting_required", message),
    }
}

/// Translates a core error into an API error.
#[must_use]
pub fn translate_core_error(err: CoreError) -> ApiError {
    match err {
        CoreError::DomainViolation(domain_err) => translate_domain_error(domain_err),
        CoreError::UnknownSoftware(id) => ApiError::ResourceNotFound {
            resource_type: String::from("Software"),
            message: format!("Software {id} does not exist"),
        },
    }
}

/// Translates a persistence error into an API error.
///
/// Rule violations keep their meaning; storage failures become `Internal`.
#[must_use]
pub fn translate_persistence_error(err: PersistenceError) -> ApiError {
    match err {
        PersistenceError::DomainViolation(domain_err) => translate_domain_error(domain_err),
        PersistenceError::NotFound(what) => ApiError::ResourceNotFound {
            resource_type: what
                .split_whitespace()
                .next()
                .unwrap_or("Resource")
                .to_string(),
            message: format!("{what} does not exist"),
        },
        PersistenceError::Conflict(message) => violation("unique", message),
        PersistenceError::ReferenceViolation(message) => violation("existing_reference", message),
        PersistenceError::DatabaseError(_)
        | PersistenceError::DatabaseConnectionFailed(_)
        | PersistenceError::MigrationFailed(_)
        | PersistenceError::QueryFailed(_)
        | PersistenceError::SerializationError(_)
        | PersistenceError::InitializationError(_)
        | PersistenceError::ForeignKeyEnforcementNotEnabled
        | PersistenceError::Other(_) => ApiError::Internal {
            message: err.to_string(),
        },
    }
}
