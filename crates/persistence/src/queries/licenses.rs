// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! License, coverage and key queries.

use std::collections::BTreeMap;

use diesel::prelude::*;
use diesel::{MysqlConnection, SqliteConnection};
use tracing::debug;

use lms::{LicenseCandidate, LicenseOverview};
use lms_domain::{License, LicenseKey, LicensedSoftware};

use crate::data_models::{is_set, parse_stored, parse_stored_date, seats_from_column};
use crate::diesel_schema::{
    license_keys, licensed_softwares, licenses, software_families, softwares,
};
use crate::error::PersistenceError;

/// Diesel Queryable struct for license rows.
#[derive(Queryable, Selectable)]
#[diesel(table_name = licenses)]
pub(crate) struct LicenseRow {
    license_id: i64,
    description: String,
    is_active: i32,
    software_family_id: i64,
    total: i32,
    used_total: i32,
    license_type: String,
    oem_device: Option<String>,
    supplier_id: Option<i64>,
    license_number: String,
    purchased_date: Option<String>,
    started_date: Option<String>,
    ended_date: Option<String>,
    note: String,
}

impl LicenseRow {
    pub(crate) fn into_license(self) -> Result<License, PersistenceError> {
        Ok(License {
            license_id: self.license_id,
            description: self.description,
            is_active: is_set(self.is_active),
            software_family_id: self.software_family_id,
            total: seats_from_column(self.total)?,
            used_total: seats_from_column(self.used_total)?,
            license_type: parse_stored(&self.license_type)?,
            oem_device: self.oem_device,
            supplier_id: self.supplier_id,
            license_number: self.license_number,
            purchased_date: parse_stored_date(self.purchased_date.as_deref())?,
            started_date: parse_stored_date(self.started_date.as_deref())?,
            ended_date: parse_stored_date(self.ended_date.as_deref())?,
            note: self.note,
        })
    }
}

/// Diesel Queryable struct for licensed software rows.
#[derive(Queryable, Selectable)]
#[diesel(table_name = licensed_softwares)]
struct LicensedSoftwareRow {
    licensed_software_id: i64,
    license_id: i64,
    software_id: i64,
    platform: String,
    note: String,
}

impl LicensedSoftwareRow {
    fn into_licensed_software(self) -> Result<LicensedSoftware, PersistenceError> {
        Ok(LicensedSoftware {
            licensed_software_id: self.licensed_software_id,
            license_id: self.license_id,
            software_id: self.software_id,
            platform: parse_stored(&self.platform)?,
            note: self.note,
        })
    }
}

/// Diesel Queryable struct for license key rows.
#[derive(Queryable, Selectable)]
#[diesel(table_name = license_keys)]
struct LicenseKeyRow {
    license_key_id: i64,
    licensed_software_id: i64,
    serial_key: String,
    activation_type: String,
}

impl LicenseKeyRow {
    fn into_license_key(self) -> Result<LicenseKey, PersistenceError> {
        Ok(LicenseKey {
            license_key_id: self.license_key_id,
            licensed_software_id: self.licensed_software_id,
            serial_key: self.serial_key,
            activation_type: parse_stored(&self.activation_type)?,
        })
    }
}

backend_fn! {
/// Retrieves a license by ID.
///
/// # Errors
///
/// Returns `NotFound` if the license does not exist.
pub fn get_license(conn: &mut _, license_id: i64) -> Result<License, PersistenceError> {
    debug!("Looking up license ID: {}", license_id);

    licenses::table
        .filter(licenses::license_id.eq(license_id))
        .select(LicenseRow::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| PersistenceError::NotFound(format!("License {license_id}")))?
        .into_license()
}
}

backend_fn! {
/// Lists licenses ordered by description.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn list_licenses(
    conn: &mut _,
    family_id: Option<i64>,
) -> Result<Vec<License>, PersistenceError> {
    let mut query = licenses::table.select(LicenseRow::as_select()).into_boxed();
    if let Some(family_id) = family_id {
        query = query.filter(licenses::software_family_id.eq(family_id));
    }

    let rows: Vec<LicenseRow> = query
        .order((licenses::description.asc(), licenses::license_id.asc()))
        .load(conn)?;
    rows.into_iter().map(LicenseRow::into_license).collect()
}
}

backend_fn! {
/// Counts licenses of a type within a family.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn count_licenses_of_kind(
    conn: &mut _,
    software_family_id: i64,
    license_type: &str,
) -> Result<i64, PersistenceError> {
    Ok(licenses::table
        .filter(licenses::software_family_id.eq(software_family_id))
        .filter(licenses::license_type.eq(license_type))
        .count()
        .get_result(conn)?)
}
}

backend_fn! {
/// Lists what the given licenses cover.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn list_licensed_softwares(
    conn: &mut _,
    license_ids: &[i64],
) -> Result<Vec<LicensedSoftware>, PersistenceError> {
    let rows: Vec<LicensedSoftwareRow> = licensed_softwares::table
        .filter(licensed_softwares::license_id.eq_any(license_ids))
        .select(LicensedSoftwareRow::as_select())
        .order(licensed_softwares::licensed_software_id.asc())
        .load(conn)?;
    rows.into_iter()
        .map(LicensedSoftwareRow::into_licensed_software)
        .collect()
}
}

backend_fn! {
/// Retrieves one licensed software.
///
/// # Errors
///
/// Returns `NotFound` if it does not exist.
pub fn get_licensed_software(
    conn: &mut _,
    licensed_software_id: i64,
) -> Result<LicensedSoftware, PersistenceError> {
    licensed_softwares::table
        .filter(licensed_softwares::licensed_software_id.eq(licensed_software_id))
        .select(LicensedSoftwareRow::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| {
            PersistenceError::NotFound(format!("Licensed software {licensed_software_id}"))
        })?
        .into_licensed_software()
}
}

backend_fn! {
/// Lists the keys of the given licenses, ordered by ID.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn list_license_keys(
    conn: &mut _,
    license_ids: &[i64],
) -> Result<Vec<LicenseKey>, PersistenceError> {
    let rows: Vec<LicenseKeyRow> = license_keys::table
        .inner_join(licensed_softwares::table)
        .filter(licensed_softwares::license_id.eq_any(license_ids))
        .select(LicenseKeyRow::as_select())
        .order(license_keys::license_key_id.asc())
        .load(conn)?;
    rows.into_iter().map(LicenseKeyRow::into_license_key).collect()
}
}

backend_fn! {
/// Retrieves a license key by ID.
///
/// # Errors
///
/// Returns `NotFound` if the key does not exist.
pub fn get_license_key(
    conn: &mut _,
    license_key_id: i64,
) -> Result<LicenseKey, PersistenceError> {
    license_keys::table
        .filter(license_keys::license_key_id.eq(license_key_id))
        .select(LicenseKeyRow::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| PersistenceError::NotFound(format!("License key {license_key_id}")))?
        .into_license_key()
}
}

backend_fn! {
/// Loads every license covering one of `software_ids`, with its full coverage.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn load_license_candidates(
    conn: &mut _,
    software_ids: &[i64],
) -> Result<Vec<LicenseCandidate>, PersistenceError> {
    let license_ids: Vec<i64> = licensed_softwares::table
        .filter(licensed_softwares::software_id.eq_any(software_ids))
        .select(licensed_softwares::license_id)
        .distinct()
        .load(conn)?;

    let rows: Vec<LicenseRow> = licenses::table
        .filter(licenses::license_id.eq_any(&license_ids))
        .select(LicenseRow::as_select())
        .order(licenses::license_id.asc())
        .load(conn)?;

    let coverage_rows: Vec<LicensedSoftwareRow> = licensed_softwares::table
        .filter(licensed_softwares::license_id.eq_any(&license_ids))
        .select(LicensedSoftwareRow::as_select())
        .load(conn)?;
    let mut coverage: BTreeMap<i64, Vec<LicensedSoftware>> = BTreeMap::new();
    for row in coverage_rows {
        let licensed: LicensedSoftware = row.into_licensed_software()?;
        coverage.entry(licensed.license_id).or_default().push(licensed);
    }

    debug!(count = rows.len(), "Loaded license candidates");
    rows.into_iter()
        .map(|row| {
            let license: License = row.into_license()?;
            let covered: Vec<LicensedSoftware> =
                coverage.remove(&license.license_id).unwrap_or_default();
            Ok(LicenseCandidate {
                license,
                coverage: covered,
            })
        })
        .collect()
}
}

backend_fn! {
/// Loads licenses with their family and covered software names.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn list_license_overviews(
    conn: &mut _,
    family_id: Option<i64>,
) -> Result<Vec<LicenseOverview>, PersistenceError> {
    let mut query = licenses::table
        .inner_join(software_families::table)
        .select((LicenseRow::as_select(), software_families::name))
        .into_boxed();
    if let Some(family_id) = family_id {
        query = query.filter(licenses::software_family_id.eq(family_id));
    }
    let rows: Vec<(LicenseRow, String)> = query.order(licenses::license_id.asc()).load(conn)?;

    let covered: Vec<(i64, i64, String, String)> = licensed_softwares::table
        .inner_join(softwares::table.inner_join(software_families::table))
        .select((
            licensed_softwares::license_id,
            softwares::software_id,
            software_families::name,
            softwares::name,
        ))
        .distinct()
        .load(conn)?;
    let mut by_license: BTreeMap<i64, Vec<(i64, String)>> = BTreeMap::new();
    for (license_id, software_id, family, name) in covered {
        let full_name: String = format!("{family} {name}").trim().to_string();
        by_license
            .entry(license_id)
            .or_default()
            .push((software_id, full_name));
    }

    rows.into_iter()
        .map(|(row, family_name)| {
            let license: License = row.into_license()?;
            let softwares: Vec<(i64, String)> =
                by_license.remove(&license.license_id).unwrap_or_default();
            Ok(LicenseOverview {
                license,
                family_name,
                softwares,
            })
        })
        .collect()
}
}
