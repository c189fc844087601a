// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Physical assets and the places they live.

use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::error::DomainError;
use crate::types::iso_date;

/// Declares a fieldless enum stored as a lowercase string, with `as_str`,
/// `FromStr` and `Display`.
macro_rules! stored_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $kind:literal {
            $($variant:ident => $text:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            /// Converts this value to its stored representation.
            #[must_use]
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    _ => Err(DomainError::UnknownVariant {
                        kind: $kind,
                        value: s.to_string(),
                    }),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.as_str())
            }
        }
    };
}

pub(crate) use stored_enum;

stored_enum! {
    /// Where an asset came from.
    AssetOrigin, "asset origin" {
        BrandNew => "brand_new",
        Compensated => "compensated",
        Reused => "reused",
    }
}

stored_enum! {
    /// Physical condition or disposition of an asset.
    AssetStatus, "asset status" {
        Excellent => "excellent",
        Good => "good",
        Fair => "fair",
        Broken => "broken",
        Lost => "lost",
        Repairing => "repairing",
        Disposed => "disposed",
        Auctioned => "auctioned",
        NotFound => "not_found",
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Office {
    pub office_id: i64,
    pub name: String,
    pub address: String,
}

/// A named place inside an office, looked after by its managers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub location_id: i64,
    pub office_id: i64,
    pub name: String,
    pub floor: Option<i32>,
    pub room: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manufacturer {
    pub manufacturer_id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetType {
    pub asset_type_id: i64,
    pub name: String,
    pub kitting_required: bool,
    pub user_searchable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    pub asset_id: i64,
    pub old_code: String,
    pub name: String,
    pub asset_type_id: i64,
    pub supplier_id: Option<i64>,
    pub manufacturer_id: Option<i64>,
    #[serde(with = "iso_date::option")]
    pub purchased_date: Option<Date>,
    #[serde(with = "iso_date::option")]
    pub warranty_start_date: Option<Date>,
    #[serde(with = "iso_date::option")]
    pub warranty_end_date: Option<Date>,
    pub origin: AssetOrigin,
    pub status: AssetStatus,
    pub is_assigned: bool,
    pub holder_id: Option<i64>,
    pub location_id: Option<i64>,
    #[serde(with = "iso_date::option")]
    pub available_at: Option<Date>,
    pub note: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Asset {
    /// Returns whether `user_id` may see this asset.
    ///
    /// Users see the unassigned stock they hold, and everything stored at a
    /// location they manage.
    #[must_use]
    pub fn is_visible_to(&self, user_id: i64, managed_locations: &[i64]) -> bool {
        let holds_stock: bool = !self.is_assigned && self.holder_id == Some(user_id);
        let manages_location: bool = self
            .location_id
            .is_some_and(|location| managed_locations.contains(&location));
        holds_stock || manages_location
    }
}

/// Formats the public code of an asset, e.g. `AMS00042`.
#[must_use]
pub fn asset_code(prefix: &str, asset_id: i64) -> String {
    format!("{prefix}{asset_id:05}")
}

/// Validates the purchase and warranty dates of an asset.
///
/// # Errors
///
/// Returns `InvalidWarrantyPeriod` if the warranty ends before it starts, and
/// `WarrantyBeforePurchase` if it starts before the asset was bought.
pub fn validate_asset_dates(
    purchased: Option<Date>,
    warranty_start: Option<Date>,
    warranty_end: Option<Date>,
) -> Result<(), DomainError> {
    if let (Some(start), Some(end)) = (warranty_start, warranty_end)
        && end <= start
    {
        return Err(DomainError::InvalidWarrantyPeriod);
    }
    if let (Some(purchased), Some(start)) = (purchased, warranty_start)
        && start < purchased
    {
        return Err(DomainError::WarrantyBeforePurchase);
    }
    Ok(())
}
