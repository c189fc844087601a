// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Inputs accepted by the persistence layer and helpers converting between
//! stored columns and domain values.

use std::collections::BTreeSet;
use std::str::FromStr;

use num_traits::ToPrimitive;
use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use time::{Date, OffsetDateTime};

use lms::{BulkInventory, LicenseCandidate, UsedTotalMismatch};
use lms_domain::{
    AssetOrigin, AssetStatus, DomainError, LicenseKey, LicenseType, Platform, Software, format_date,
    parse_date,
};

use crate::error::PersistenceError;

/// A new software product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSoftware {
    pub software_family_id: i64,
    pub name: String,
    pub version: String,
    /// Supported platforms; `All` expands to every concrete platform.
    pub platforms: Vec<Platform>,
}

/// A new license or the editable fields of an existing one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenseFields {
    pub software_family_id: i64,
    pub license_type: LicenseType,
    pub total: u32,
    pub oem_device: Option<String>,
    pub supplier_id: Option<i64>,
    pub license_number: String,
    pub purchased_date: Option<Date>,
    pub started_date: Option<Date>,
    pub ended_date: Option<Date>,
    pub note: String,
}

impl LicenseFields {
    #[must_use]
    pub fn terms(&self) -> lms_domain::LicenseTerms {
        lms_domain::LicenseTerms {
            license_type: self.license_type,
            total: self.total,
            oem_device: self.oem_device.clone(),
            purchased_date: self.purchased_date,
            started_date: self.started_date,
            ended_date: self.ended_date,
        }
    }
}

/// A new location inside an office.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewLocation {
    pub office_id: i64,
    pub name: String,
    pub floor: Option<i32>,
    pub room: Option<i32>,
}

/// A new physical asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAsset {
    pub name: String,
    pub old_code: String,
    pub asset_type_id: i64,
    pub supplier_id: Option<i64>,
    pub manufacturer_id: Option<i64>,
    pub purchased_date: Option<Date>,
    pub warranty_start_date: Option<Date>,
    pub warranty_end_date: Option<Date>,
    pub origin: AssetOrigin,
    pub status: AssetStatus,
    pub location_id: Option<i64>,
    pub note: String,
}

/// Everything the bulk planner reads, owned.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkInventoryData {
    pub softwares: Vec<Software>,
    pub candidates: Vec<LicenseCandidate>,
    pub keys: Vec<LicenseKey>,
    pub held_keys: BTreeSet<i64>,
    pub existing: BTreeSet<(i64, i64)>,
}

impl BulkInventoryData {
    /// Borrows the data in the shape the planner expects.
    #[must_use]
    pub fn as_inventory(&self) -> BulkInventory<'_> {
        BulkInventory {
            softwares: &self.softwares,
            candidates: &self.candidates,
            keys: &self.keys,
            held_keys: &self.held_keys,
            existing: &self.existing,
        }
    }
}

/// Result of recounting `used_total`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileOutcome {
    pub mismatches: Vec<UsedTotalMismatch>,
    /// Licenses whose `used_total` was rewritten.
    pub repaired: Vec<i64>,
}

/// Result of applying a directory sync plan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectorySyncOutcome {
    pub created: Vec<i64>,
    pub deactivated: Vec<i64>,
}

pub(crate) fn flag(value: bool) -> i32 {
    i32::from(value)
}

pub(crate) const fn is_set(value: i32) -> bool {
    value != 0
}

/// Parses a stored enum column.
pub(crate) fn parse_stored<T>(value: &str) -> Result<T, PersistenceError>
where
    T: FromStr<Err = DomainError>,
{
    value
        .parse()
        .map_err(|e: DomainError| PersistenceError::SerializationError(e.to_string()))
}

pub(crate) fn parse_stored_date(value: Option<&str>) -> Result<Option<Date>, PersistenceError> {
    value
        .map(parse_date)
        .transpose()
        .map_err(|e| PersistenceError::SerializationError(e.to_string()))
}

pub(crate) fn store_date(value: Option<Date>) -> Option<String> {
    value.map(format_date)
}

pub(crate) fn parse_timestamp(value: &str) -> Result<OffsetDateTime, PersistenceError> {
    OffsetDateTime::parse(value, &Rfc3339)
        .map_err(|e| PersistenceError::SerializationError(format!("Invalid timestamp {value}: {e}")))
}

pub(crate) fn parse_optional_timestamp(
    value: Option<&str>,
) -> Result<Option<OffsetDateTime>, PersistenceError> {
    value.map(parse_timestamp).transpose()
}

pub(crate) fn store_timestamp(value: OffsetDateTime) -> Result<String, PersistenceError> {
    value
        .format(&Rfc3339)
        .map_err(|e| PersistenceError::SerializationError(e.to_string()))
}

/// The current time, formatted for storage.
pub(crate) fn now_timestamp() -> Result<String, PersistenceError> {
    store_timestamp(OffsetDateTime::now_utc())
}

pub(crate) fn seats_from_column(value: i32) -> Result<u32, PersistenceError> {
    value
        .to_u32()
        .ok_or_else(|| PersistenceError::SerializationError(format!("Invalid seat count {value}")))
}

pub(crate) fn seats_to_column(value: u32) -> Result<i32, PersistenceError> {
    value
        .to_i32()
        .ok_or_else(|| PersistenceError::Other(format!("Seat count {value} out of range")))
}
