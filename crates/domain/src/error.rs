// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::types::Platform;

/// Errors that can occur during domain validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A name field is empty or too long.
    InvalidName(String),
    /// An email address is malformed.
    InvalidEmail(String),
    /// A stored or submitted enum value is not recognized.
    UnknownVariant {
        /// The kind of value (e.g. `platform`).
        kind: &'static str,
        /// The rejected value.
        value: String,
    },
    /// A date string could not be parsed.
    DateParseError {
        /// The string that failed to parse.
        date_string: String,
        /// The parser error.
        error: String,
    },
    /// A license must have at least one seat.
    InvalidTotal(u32),
    /// A license total cannot drop below the seats already handed out.
    TotalBelowUsed {
        /// The requested total.
        total: u32,
        /// The seats currently in use.
        used_total: u32,
    },
    /// Subscription licenses need a start and an end date.
    MissingSubscriptionDates,
    /// OEM licenses need the device they are bound to.
    MissingOemDevice,
    /// The license started before it was purchased.
    StartBeforePurchase {
        /// Purchase date.
        purchased: time::Date,
        /// Start date.
        started: time::Date,
    },
    /// The end date is before (or too close to) a reference date.
    TermTooShort {
        /// Which date the end was compared against.
        reference: &'static str,
        /// Days between the reference and the end date.
        days: i64,
        /// Minimum number of days required.
        minimum: i64,
    },
    /// The software belongs to another family than the license.
    FamilyMismatch {
        /// The software.
        software_id: i64,
        /// The license.
        license_id: i64,
    },
    /// The software is not available on the platform.
    PlatformNotSupported {
        /// The software.
        software_id: i64,
        /// The requested platform.
        platform: Platform,
    },
    /// The license does not cover the software on the platform.
    LicenseMismatch {
        /// The license.
        license_id: i64,
        /// The software.
        software_id: i64,
    },
    /// The license is deactivated and cannot take new assignments.
    LicenseInactive(i64),
    /// Reserving seats would exceed the license total.
    NotEnoughLicenses {
        /// The license.
        license_id: i64,
        /// Seats requested.
        requested: u32,
        /// Seats left.
        remaining: u32,
    },
    /// Releasing more seats than are in use.
    SeatUnderflow {
        /// The license.
        license_id: i64,
        /// Seats to release.
        requested: u32,
        /// Seats currently in use.
        used_total: u32,
    },
    /// A license key was given without a license.
    LicenseKeyWithoutLicense,
    /// The key does not belong to the licensed software of (license, software).
    LicenseKeyMismatch(i64),
    /// The key's platform scope does not cover the assignment platform.
    KeyPlatformMismatch {
        /// The key.
        license_key_id: i64,
        /// The assignment platform.
        platform: Platform,
    },
    /// A single-activation key is already held by another assignment.
    LicenseKeyUnavailable(i64),
    /// Bulk operations need at least one entry of the given kind.
    EmptySelection(&'static str),
    /// Warranty end is not after warranty start.
    InvalidWarrantyPeriod,
    /// Warranty starts before the asset was purchased.
    WarrantyBeforePurchase,
    /// The asset already has an exchange waiting for a decision.
    ExchangeAlreadyPending(i64),
    /// The exchange already reached a final status.
    ExchangeNotPending {
        /// The exchange.
        exchange_id: i64,
        /// Its current status.
        status: &'static str,
    },
    /// The user is not allowed to move the asset.
    NotAssetHolder {
        /// The asset.
        asset_id: i64,
        /// The user attempting the move.
        user_id: i64,
    },
    /// The user does not play the required part in the exchange.
    ExchangeParticipantMismatch {
        /// The exchange.
        exchange_id: i64,
        /// The user attempting the change.
        user_id: i64,
        /// The part required (`sender` or `receiver`).
        role: &'static str,
    },
    /// Location assignments need a destination.
    MissingDestination,
    /// Kitting has not been completed for an exchange that requires it.
    KittingIncomplete(i64),
    /// Kitting was requested for an exchange that does not need it.
    KittingNotRequired(i64),
}

impl std::fmt::Display for DomainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidName(msg) => write!(f, "Invalid name: {msg}"),
            Self::InvalidEmail(email) => write!(f, "Invalid email address: {email}"),
            Self::UnknownVariant { kind, value } => write!(f, "Unknown {kind}: {value}"),
            Self::DateParseError { date_string, error } => {
                write!(f, "Failed to parse date '{date_string}': {error}")
            }
            Self::InvalidTotal(total) => {
                write!(f, "Total must be at least 1 (got {total})")
            }
            Self::TotalBelowUsed { total, used_total } => write!(
                f,
                "Total ({total}) must be greater than or equal to used total ({used_total})"
            ),
            Self::MissingSubscriptionDates => {
                write!(f, "Subscription licenses need a start date and an end date")
            }
            Self::MissingOemDevice => write!(f, "OEM licenses need an OEM device"),
            Self::StartBeforePurchase { purchased, started } => write!(
                f,
                "Start date ({started}) must be on or after purchased date ({purchased})"
            ),
            Self::TermTooShort {
                reference,
                days,
                minimum,
            } => {
                if *days < 0 {
                    write!(f, "End date must be after {reference}")
                } else {
                    write!(
                        f,
                        "End date must be at least {minimum} days after {reference} (got {days})"
                    )
                }
            }
            Self::FamilyMismatch {
                software_id,
                license_id,
            } => write!(
                f,
                "Software {software_id} does not belong to the family of license {license_id}"
            ),
            Self::PlatformNotSupported {
                software_id,
                platform,
            } => write!(f, "Software {software_id} is not available on {platform}"),
            Self::LicenseMismatch {
                license_id,
                software_id,
            } => write!(
                f,
                "License mismatch: license {license_id} does not cover software {software_id}"
            ),
            Self::LicenseInactive(id) => write!(f, "License {id} is not active"),
            Self::NotEnoughLicenses {
                license_id,
                requested,
                remaining,
            } => write!(
                f,
                "Not enough license: license {license_id} has {remaining} seat(s) left, {requested} requested"
            ),
            Self::SeatUnderflow {
                license_id,
                requested,
                used_total,
            } => write!(
                f,
                "Cannot release {requested} seat(s) of license {license_id}: only {used_total} in use"
            ),
            Self::LicenseKeyWithoutLicense => {
                write!(f, "A license key requires a license")
            }
            Self::LicenseKeyMismatch(id) => write!(
                f,
                "License key mismatch: key {id} does not belong to the chosen license and software"
            ),
            Self::KeyPlatformMismatch {
                license_key_id,
                platform,
            } => write!(
                f,
                "Platform mismatch: key {license_key_id} cannot be used on {platform}"
            ),
            Self::LicenseKeyUnavailable(id) => write!(f, "License key {id} is unavailable"),
            Self::EmptySelection(what) => write!(f, "At least one {what} must be selected"),
            Self::InvalidWarrantyPeriod => {
                write!(f, "Warranty end date must be after warranty start date")
            }
            Self::WarrantyBeforePurchase => {
                write!(f, "Warranty start date must be on or after purchased date")
            }
            Self::ExchangeAlreadyPending(asset_id) => {
                write!(f, "Asset {asset_id} already has a pending exchange")
            }
            Self::ExchangeNotPending {
                exchange_id,
                status,
            } => write!(f, "Exchange {exchange_id} is already {status}"),
            Self::NotAssetHolder { asset_id, user_id } => {
                write!(f, "User {user_id} cannot hand over asset {asset_id}")
            }
            Self::ExchangeParticipantMismatch {
                exchange_id,
                user_id,
                role,
            } => write!(f, "User {user_id} is not the {role} of exchange {exchange_id}"),
            Self::MissingDestination => {
                write!(f, "Location assignments need a destination location")
            }
            Self::KittingIncomplete(id) => {
                write!(f, "Kitting for exchange {id} has not been completed")
            }
            Self::KittingNotRequired(id) => {
                write!(f, "Exchange {id} does not require kitting")
            }
        }
    }
}

impl std::error::Error for DomainError {}
