// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::license::{License, LicenseKey, LicensedSoftware};
use crate::types::{Platform, Software};

/// A user's use of a software, optionally backed by a license seat and key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenseAssignment {
    pub assignment_id: i64,
    pub user_id: i64,
    pub software_id: i64,
    pub platform: Option<Platform>,
    pub license_id: Option<i64>,
    pub license_key_id: Option<i64>,
    pub note: String,
}

/// The fields of an assignment being created or edited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentDraft {
    pub user_id: i64,
    pub software_id: i64,
    pub platform: Option<Platform>,
    pub license_id: Option<i64>,
    pub license_key_id: Option<i64>,
    pub note: String,
}

impl From<&LicenseAssignment> for AssignmentDraft {
    fn from(assignment: &LicenseAssignment) -> Self {
        Self {
            user_id: assignment.user_id,
            software_id: assignment.software_id,
            platform: assignment.platform,
            license_id: assignment.license_id,
            license_key_id: assignment.license_key_id,
            note: assignment.note.clone(),
        }
    }
}

/// Entities the caller loaded to validate a draft.
#[derive(Debug, Clone, Copy)]
pub struct AssignmentContext<'a> {
    /// The software of the draft.
    pub software: &'a Software,
    /// The license of the draft, if any.
    pub license: Option<&'a License>,
    /// Everything the license covers.
    pub coverage: &'a [LicensedSoftware],
    /// The key of the draft, if any.
    pub key: Option<&'a LicenseKey>,
    /// Whether another assignment already holds the key.
    pub key_held_elsewhere: bool,
    /// The stored assignment when editing.
    pub previous: Option<&'a LicenseAssignment>,
}

/// Validates an assignment draft against the loaded entities.
///
/// Capacity is only checked when the license is new to the assignment;
/// an unchanged license already counts this assignment in `used_total`.
///
/// # Errors
///
/// Returns the first rule the draft violates.
pub fn validate_assignment(
    draft: &AssignmentDraft,
    ctx: &AssignmentContext<'_>,
) -> Result<(), DomainError> {
    if let Some(platform) = draft.platform
        && !ctx.software.supports(platform)
    {
        return Err(DomainError::PlatformNotSupported {
            software_id: draft.software_id,
            platform,
        });
    }

    if let Some(license) = ctx.license {
        let covered: bool = ctx.coverage.iter().any(|ls| {
            ls.license_id == license.license_id
                && ls.software_id == draft.software_id
                && draft.platform.is_none_or(|p| ls.platform.covers(p))
        });
        if !covered {
            return Err(DomainError::LicenseMismatch {
                license_id: license.license_id,
                software_id: draft.software_id,
            });
        }

        let license_changed: bool =
            ctx.previous.and_then(|a| a.license_id) != Some(license.license_id);
        if license_changed {
            if !license.is_active {
                return Err(DomainError::LicenseInactive(license.license_id));
            }
            license.reserve_seats(1)?;
        }
    }

    if let Some(key) = ctx.key {
        let Some(license) = ctx.license else {
            return Err(DomainError::LicenseKeyWithoutLicense);
        };
        let Some(owner) = ctx.coverage.iter().find(|ls| {
            ls.licensed_software_id == key.licensed_software_id
                && ls.license_id == license.license_id
                && ls.software_id == draft.software_id
        }) else {
            return Err(DomainError::LicenseKeyMismatch(key.license_key_id));
        };
        if let Some(platform) = draft.platform
            && !owner.platform.covers(platform)
        {
            return Err(DomainError::KeyPlatformMismatch {
                license_key_id: key.license_key_id,
                platform,
            });
        }

        let key_changed: bool =
            ctx.previous.and_then(|a| a.license_key_id) != Some(key.license_key_id);
        if key_changed && key.activation_type.is_exclusive() && ctx.key_held_elsewhere {
            return Err(DomainError::LicenseKeyUnavailable(key.license_key_id));
        }
    }

    Ok(())
}
