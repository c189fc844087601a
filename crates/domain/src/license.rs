// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Licenses, the software they cover, and their keys.
//!
//! A license owns a fixed number of seats (`total`). Every assignment that
//! references the license consumes one seat and is counted in `used_total`.
//! The seat arithmetic here is the only place that decides whether a
//! reservation fits; persistence calls it while holding the license row lock.

use serde::{Deserialize, Serialize};
use time::Date;

use crate::error::DomainError;
use crate::types::{ActivationType, LicenseType, Platform, iso_date};

/// Minimum length of a license term, in days.
pub const MIN_TERM_DAYS: i64 = 30;

/// A purchased entitlement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct License {
    pub license_id: i64,
    pub description: String,
    pub is_active: bool,
    pub software_family_id: i64,
    pub total: u32,
    pub used_total: u32,
    pub license_type: LicenseType,
    pub oem_device: Option<String>,
    pub supplier_id: Option<i64>,
    pub license_number: String,
    #[serde(with = "iso_date::option")]
    pub purchased_date: Option<Date>,
    #[serde(with = "iso_date::option")]
    pub started_date: Option<Date>,
    #[serde(with = "iso_date::option")]
    pub ended_date: Option<Date>,
    pub note: String,
}

impl License {
    /// Seats that can still be assigned.
    #[must_use]
    pub const fn remaining(&self) -> u32 {
        self.total.saturating_sub(self.used_total)
    }

    /// Days until the license ends, clamped at zero.
    ///
    /// Licenses without an end date never run out.
    #[must_use]
    pub fn remaining_days(&self, today: Date) -> Option<i64> {
        self.ended_date
            .map(|ended| (ended - today).whole_days().max(0))
    }

    /// Returns whether a subscription has already ended.
    #[must_use]
    pub fn is_expired(&self, today: Date) -> bool {
        self.license_type == LicenseType::Subscription
            && self.ended_date.is_some_and(|ended| ended < today)
    }

    /// Returns whether a subscription ends within `warning_days` of `today`.
    ///
    /// Compares the gap in whole days so any window size is safe.
    #[must_use]
    pub fn is_expiring(&self, today: Date, warning_days: i64) -> bool {
        self.license_type == LicenseType::Subscription
            && self
                .ended_date
                .is_some_and(|ended| (ended - today).whole_days() < warning_days)
    }

    /// Computes `used_total` after reserving `amount` seats.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::NotEnoughLicenses` if fewer than `amount` seats remain.
    pub const fn reserve_seats(&self, amount: u32) -> Result<u32, DomainError> {
        let remaining: u32 = self.remaining();
        if remaining < amount {
            return Err(DomainError::NotEnoughLicenses {
                license_id: self.license_id,
                requested: amount,
                remaining,
            });
        }
        Ok(self.used_total + amount)
    }

    /// Computes `used_total` after releasing `amount` seats.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::SeatUnderflow` if fewer than `amount` seats are in use.
    pub const fn release_seats(&self, amount: u32) -> Result<u32, DomainError> {
        if self.used_total < amount {
            return Err(DomainError::SeatUnderflow {
                license_id: self.license_id,
                requested: amount,
                used_total: self.used_total,
            });
        }
        Ok(self.used_total - amount)
    }
}

/// The commercial terms of a license as submitted for create or update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LicenseTerms {
    pub license_type: LicenseType,
    pub total: u32,
    pub oem_device: Option<String>,
    pub purchased_date: Option<Date>,
    pub started_date: Option<Date>,
    pub ended_date: Option<Date>,
}

/// Validates license terms.
///
/// `used_total` is the number of seats already in use when updating an
/// existing license, and `None` on creation.
///
/// # Errors
///
/// Returns the first rule the terms violate.
pub fn validate_license_terms(
    terms: &LicenseTerms,
    used_total: Option<u32>,
) -> Result<(), DomainError> {
    if terms.total < 1 {
        return Err(DomainError::InvalidTotal(terms.total));
    }
    if let Some(used_total) = used_total
        && terms.total < used_total
    {
        return Err(DomainError::TotalBelowUsed {
            total: terms.total,
            used_total,
        });
    }

    match terms.license_type {
        LicenseType::Subscription => {
            if terms.started_date.is_none() || terms.ended_date.is_none() {
                return Err(DomainError::MissingSubscriptionDates);
            }
        }
        LicenseType::Oem => {
            let has_device: bool = terms
                .oem_device
                .as_deref()
                .is_some_and(|device| !device.trim().is_empty());
            if !has_device {
                return Err(DomainError::MissingOemDevice);
            }
        }
        LicenseType::Perpetual => {}
    }

    if let (Some(purchased), Some(started)) = (terms.purchased_date, terms.started_date)
        && started < purchased
    {
        return Err(DomainError::StartBeforePurchase { purchased, started });
    }

    if let Some(ended) = terms.ended_date {
        if let Some(started) = terms.started_date {
            check_term(started, ended, "start date")?;
        }
        if let Some(purchased) = terms.purchased_date {
            check_term(purchased, ended, "purchased date")?;
        }
    }

    Ok(())
}

fn check_term(from: Date, ended: Date, reference: &'static str) -> Result<(), DomainError> {
    let days: i64 = (ended - from).whole_days();
    if days < MIN_TERM_DAYS {
        return Err(DomainError::TermTooShort {
            reference,
            days,
            minimum: MIN_TERM_DAYS,
        });
    }
    Ok(())
}

/// Builds the generated description of a license.
///
/// `ordinal` is one plus the number of licenses of the same type and family
/// created before this one.
#[must_use]
pub fn license_description(
    family_name: &str,
    license_type: LicenseType,
    oem_device: Option<&str>,
    ordinal: u32,
) -> String {
    let mut description: String =
        format!("{family_name} {} Licenses", license_type.display_name());
    if license_type == LicenseType::Oem
        && let Some(device) = oem_device.filter(|d| !d.trim().is_empty())
    {
        description.push_str(" for ");
        description.push_str(device.trim());
    }
    description.push_str(&format!(" #{ordinal:03}"));
    description
}

/// A software covered by a license, optionally scoped to one platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicensedSoftware {
    pub licensed_software_id: i64,
    pub license_id: i64,
    pub software_id: i64,
    pub platform: Platform,
    pub note: String,
}

/// Checks that a software can be attached to a license.
///
/// # Errors
///
/// Returns `DomainError::FamilyMismatch` if the families differ.
pub const fn validate_licensed_software(
    license: &License,
    software_id: i64,
    software_family_id: i64,
) -> Result<(), DomainError> {
    if license.software_family_id != software_family_id {
        return Err(DomainError::FamilyMismatch {
            software_id,
            license_id: license.license_id,
        });
    }
    Ok(())
}

/// A serial key for a licensed software.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenseKey {
    pub license_key_id: i64,
    pub licensed_software_id: i64,
    pub serial_key: String,
    pub activation_type: ActivationType,
}
