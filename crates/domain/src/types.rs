// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use time::Date;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;

use crate::error::DomainError;

/// ISO `YYYY-MM-DD`, used for every stored and exchanged date.
const ISO_DATE: &[BorrowedFormatItem<'_>] = format_description!("[year]-[month]-[day]");

time::serde::format_description!(pub(crate) iso_date, Date, "[year]-[month]-[day]");

/// Parses an ISO `YYYY-MM-DD` date.
///
/// # Errors
///
/// Returns `DomainError::DateParseError` if the string is not a valid date.
pub fn parse_date(value: &str) -> Result<Date, DomainError> {
    Date::parse(value, ISO_DATE).map_err(|e| DomainError::DateParseError {
        date_string: value.to_string(),
        error: e.to_string(),
    })
}

/// Formats a date as ISO `YYYY-MM-DD`.
#[must_use]
pub fn format_date(date: Date) -> String {
    date.format(ISO_DATE).unwrap_or_else(|_| date.to_string())
}

/// Operating system a software product (or a license for it) applies to.
///
/// `All` is only meaningful on the license side: a licensed software scoped
/// to `All` covers every concrete platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    All,
    Windows,
    MacOs,
    Linux,
}

impl Platform {
    /// Every platform, in display order.
    pub const ALL: [Self; 4] = [Self::All, Self::Windows, Self::MacOs, Self::Linux];

    /// Converts this platform to its stored representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Windows => "windows",
            Self::MacOs => "macos",
            Self::Linux => "linux",
        }
    }

    /// Returns whether a license scoped to `self` can be used on `target`.
    #[must_use]
    pub fn covers(&self, target: Self) -> bool {
        *self == Self::All || *self == target
    }
}

impl FromStr for Platform {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "windows" => Ok(Self::Windows),
            "macos" => Ok(Self::MacOs),
            "linux" => Ok(Self::Linux),
            _ => Err(DomainError::UnknownVariant {
                kind: "platform",
                value: s.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name: &str = match self {
            Self::All => "All",
            Self::Windows => "Windows",
            Self::MacOs => "MacOS",
            Self::Linux => "Linux",
        };
        write!(f, "{name}")
    }
}

/// Commercial model of a license.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LicenseType {
    Perpetual,
    Subscription,
    Oem,
}

impl LicenseType {
    /// Converts this license type to its stored representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Perpetual => "perpetual",
            Self::Subscription => "subscription",
            Self::Oem => "oem",
        }
    }

    /// Human readable name used in license descriptions.
    #[must_use]
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::Perpetual => "Perpetual",
            Self::Subscription => "Subscription-based",
            Self::Oem => "OEM",
        }
    }
}

impl FromStr for LicenseType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "perpetual" => Ok(Self::Perpetual),
            "subscription" => Ok(Self::Subscription),
            "oem" => Ok(Self::Oem),
            _ => Err(DomainError::UnknownVariant {
                kind: "license type",
                value: s.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for LicenseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// How many installations a license key may activate.
///
/// Variants are ordered by allocation preference: single keys are handed
/// out first so shared keys stay available for later requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivationType {
    Single,
    Volume,
    Server,
}

impl ActivationType {
    /// Converts this activation type to its stored representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Volume => "volume",
            Self::Server => "server",
        }
    }

    /// Returns whether a key of this type may be held by one assignment only.
    #[must_use]
    pub const fn is_exclusive(&self) -> bool {
        matches!(self, Self::Single)
    }
}

impl FromStr for ActivationType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "single" => Ok(Self::Single),
            "volume" => Ok(Self::Volume),
            "server" => Ok(Self::Server),
            _ => Err(DomainError::UnknownVariant {
                kind: "activation type",
                value: s.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for ActivationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A person who can hold license seats and assets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub user_id: i64,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub is_active: bool,
    #[serde(with = "iso_date::option")]
    pub date_joined: Option<Date>,
}

impl User {
    /// Returns "first last", falling back to the username.
    #[must_use]
    pub fn display_name(&self) -> String {
        let full: String = format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string();
        if full.is_empty() {
            self.username.clone()
        } else {
            full
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Supplier {
    pub supplier_id: i64,
    pub name: String,
    pub contact: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoftwareFamily {
    pub software_family_id: i64,
    pub name: String,
}

/// A software product.
///
/// `name` may be empty when the product is identified by its family alone,
/// and `version` may be a glob such as `12.*`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Software {
    pub software_id: i64,
    pub software_family_id: i64,
    pub family_name: String,
    pub name: String,
    pub version: String,
    pub platforms: Vec<Platform>,
}

impl Software {
    /// Family and product name, e.g. "Adobe Photoshop".
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.family_name, self.name)
            .trim()
            .to_string()
    }

    /// Returns whether the software can be installed on `platform`.
    #[must_use]
    pub fn supports(&self, platform: Platform) -> bool {
        self.platforms.contains(&platform)
    }
}

impl std::fmt::Display for Software {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.version.is_empty() {
            write!(f, "{}", self.full_name())
        } else {
            write!(f, "{} {}", self.full_name(), self.version)
        }
    }
}
