// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! License assignment queries.

use std::collections::{BTreeMap, BTreeSet};

use diesel::dsl::count_star;
use diesel::prelude::*;
use diesel::{MysqlConnection, SqliteConnection};
use num_traits::ToPrimitive;
use tracing::debug;

use lms::{BulkAssignRequest, LicenseCandidate, UnlicensedUse};
use lms_domain::{LicenseAssignment, LicenseKey, Platform, Software};

use crate::data_models::{BulkInventoryData, parse_stored};
use crate::diesel_schema::{license_assignments, software_families, softwares, users};
use crate::error::PersistenceError;
use crate::queries::{catalog, licenses};

/// Diesel Queryable struct for assignment rows.
#[derive(Queryable, Selectable)]
#[diesel(table_name = license_assignments)]
pub(crate) struct AssignmentRow {
    assignment_id: i64,
    user_id: i64,
    software_id: i64,
    platform: Option<String>,
    license_id: Option<i64>,
    license_key_id: Option<i64>,
    note: String,
}

impl AssignmentRow {
    pub(crate) fn into_assignment(self) -> Result<LicenseAssignment, PersistenceError> {
        let platform: Option<Platform> = self.platform.as_deref().map(parse_stored).transpose()?;
        Ok(LicenseAssignment {
            assignment_id: self.assignment_id,
            user_id: self.user_id,
            software_id: self.software_id,
            platform,
            license_id: self.license_id,
            license_key_id: self.license_key_id,
            note: self.note,
        })
    }
}

/// Filters for listing assignments; unset fields match everything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssignmentFilter {
    pub user_id: Option<i64>,
    pub software_id: Option<i64>,
    pub license_id: Option<i64>,
}

backend_fn! {
/// Retrieves an assignment by ID.
///
/// # Errors
///
/// Returns `NotFound` if the assignment does not exist.
pub fn get_assignment(
    conn: &mut _,
    assignment_id: i64,
) -> Result<LicenseAssignment, PersistenceError> {
    license_assignments::table
        .filter(license_assignments::assignment_id.eq(assignment_id))
        .select(AssignmentRow::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| PersistenceError::NotFound(format!("Assignment {assignment_id}")))?
        .into_assignment()
}
}

backend_fn! {
/// Lists assignments matching `filter`, ordered by ID.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn list_assignments(
    conn: &mut _,
    filter: AssignmentFilter,
) -> Result<Vec<LicenseAssignment>, PersistenceError> {
    let mut query = license_assignments::table
        .select(AssignmentRow::as_select())
        .into_boxed();
    if let Some(user_id) = filter.user_id {
        query = query.filter(license_assignments::user_id.eq(user_id));
    }
    if let Some(software_id) = filter.software_id {
        query = query.filter(license_assignments::software_id.eq(software_id));
    }
    if let Some(license_id) = filter.license_id {
        query = query.filter(license_assignments::license_id.eq(license_id));
    }

    let rows: Vec<AssignmentRow> = query
        .order(license_assignments::assignment_id.asc())
        .load(conn)?;
    rows.into_iter().map(AssignmentRow::into_assignment).collect()
}
}

/// Converts the rows loaded for `assignment_ids`.
///
/// # Errors
///
/// Returns `NotFound` naming every requested ID without a row.
pub(crate) fn expect_assignments(
    assignment_ids: &[i64],
    rows: Vec<AssignmentRow>,
) -> Result<Vec<LicenseAssignment>, PersistenceError> {
    let wanted: BTreeSet<i64> = assignment_ids.iter().copied().collect();
    if rows.len() != wanted.len() {
        let found: BTreeSet<i64> = rows.iter().map(|row| row.assignment_id).collect();
        let missing: Vec<String> = wanted
            .difference(&found)
            .map(ToString::to_string)
            .collect();
        return Err(PersistenceError::NotFound(format!(
            "Assignments {}",
            missing.join(", ")
        )));
    }
    rows.into_iter().map(AssignmentRow::into_assignment).collect()
}

backend_fn! {
/// IDs of the assignments holding a license key.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn key_holders(conn: &mut _, license_key_id: i64) -> Result<Vec<i64>, PersistenceError> {
    Ok(license_assignments::table
        .filter(license_assignments::license_key_id.eq(license_key_id))
        .select(license_assignments::assignment_id)
        .load(conn)?)
}
}

backend_fn! {
/// The subset of `license_key_ids` held by at least one assignment.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn held_license_keys(
    conn: &mut _,
    license_key_ids: &[i64],
) -> Result<BTreeSet<i64>, PersistenceError> {
    let held: Vec<Option<i64>> = license_assignments::table
        .filter(license_assignments::license_key_id.eq_any(license_key_ids))
        .select(license_assignments::license_key_id)
        .distinct()
        .load(conn)?;
    Ok(held.into_iter().flatten().collect())
}
}

backend_fn! {
/// (user, software) pairs among the given users and softwares that already
/// have an assignment.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn existing_assignment_pairs(
    conn: &mut _,
    user_ids: &[i64],
    software_ids: &[i64],
) -> Result<BTreeSet<(i64, i64)>, PersistenceError> {
    let pairs: Vec<(i64, i64)> = license_assignments::table
        .filter(license_assignments::user_id.eq_any(user_ids))
        .filter(license_assignments::software_id.eq_any(software_ids))
        .select((license_assignments::user_id, license_assignments::software_id))
        .load(conn)?;
    Ok(pairs.into_iter().collect())
}
}

backend_fn! {
/// Number of assignments referencing each license.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn count_assignments_by_license(
    conn: &mut _,
) -> Result<BTreeMap<i64, u32>, PersistenceError> {
    let counts: Vec<(Option<i64>, i64)> = license_assignments::table
        .filter(license_assignments::license_id.is_not_null())
        .group_by(license_assignments::license_id)
        .select((license_assignments::license_id, count_star()))
        .load(conn)?;

    counts
        .into_iter()
        .filter_map(|(license_id, count)| license_id.map(|id| (id, count)))
        .map(|(license_id, count)| {
            let count: u32 = count.to_u32().ok_or_else(|| {
                PersistenceError::DatabaseError("Count conversion failed".to_string())
            })?;
            Ok((license_id, count))
        })
        .collect()
}
}

backend_fn! {
/// Assignments without a license, with software and user names.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn list_unlicensed_uses(conn: &mut _) -> Result<Vec<UnlicensedUse>, PersistenceError> {
    let rows: Vec<(i64, String, String, String)> = license_assignments::table
        .inner_join(softwares::table.inner_join(software_families::table))
        .inner_join(users::table)
        .filter(license_assignments::license_id.is_null())
        .select((
            softwares::software_id,
            software_families::name,
            softwares::name,
            users::username,
        ))
        .order((softwares::software_id.asc(), users::username.asc()))
        .load(conn)?;

    debug!(count = rows.len(), "Loaded unlicensed assignments");
    Ok(rows
        .into_iter()
        .map(|(software_id, family, name, username)| UnlicensedUse {
            software_id,
            software_name: format!("{family} {name}").trim().to_string(),
            username,
        })
        .collect())
}
}

/// Loads what the bulk planner needs for a request (`SQLite` version).
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn load_bulk_inventory_sqlite(
    conn: &mut SqliteConnection,
    request: &BulkAssignRequest,
) -> Result<BulkInventoryData, PersistenceError> {
    let softwares: Vec<Software> =
        catalog::list_softwares_sqlite(conn, Some(&request.software_ids), None)?;
    let candidates: Vec<LicenseCandidate> =
        licenses::load_license_candidates_sqlite(conn, &request.software_ids)?;
    let license_ids: Vec<i64> = candidates.iter().map(|c| c.license.license_id).collect();
    let keys: Vec<LicenseKey> = licenses::list_license_keys_sqlite(conn, &license_ids)?;
    let key_ids: Vec<i64> = keys.iter().map(|k| k.license_key_id).collect();
    let held_keys: BTreeSet<i64> = held_license_keys_sqlite(conn, &key_ids)?;
    let existing: BTreeSet<(i64, i64)> =
        existing_assignment_pairs_sqlite(conn, &request.user_ids, &request.software_ids)?;

    Ok(BulkInventoryData {
        softwares,
        candidates,
        keys,
        held_keys,
        existing,
    })
}

/// Loads what the bulk planner needs for a request (`MySQL` version).
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn load_bulk_inventory_mysql(
    conn: &mut MysqlConnection,
    request: &BulkAssignRequest,
) -> Result<BulkInventoryData, PersistenceError> {
    let softwares: Vec<Software> =
        catalog::list_softwares_mysql(conn, Some(&request.software_ids), None)?;
    let candidates: Vec<LicenseCandidate> =
        licenses::load_license_candidates_mysql(conn, &request.software_ids)?;
    let license_ids: Vec<i64> = candidates.iter().map(|c| c.license.license_id).collect();
    let keys: Vec<LicenseKey> = licenses::list_license_keys_mysql(conn, &license_ids)?;
    let key_ids: Vec<i64> = keys.iter().map(|k| k.license_key_id).collect();
    let held_keys: BTreeSet<i64> = held_license_keys_mysql(conn, &key_ids)?;
    let existing: BTreeSet<(i64, i64)> =
        existing_assignment_pairs_mysql(conn, &request.user_ids, &request.software_ids)?;

    Ok(BulkInventoryData {
        softwares,
        candidates,
        keys,
        held_keys,
        existing,
    })
}
