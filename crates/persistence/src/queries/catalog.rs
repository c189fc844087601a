// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Supplier, software family and software queries.

use std::collections::BTreeMap;

use diesel::prelude::*;
use diesel::{MysqlConnection, SqliteConnection};
use tracing::debug;

use lms_domain::{Platform, Software, SoftwareFamily, Supplier};

use crate::data_models::parse_stored;
use crate::diesel_schema::{software_families, software_platforms, softwares, suppliers};
use crate::error::PersistenceError;

/// (`software_id`, `family_id`, `family_name`, `name`, `version`)
type SoftwareHead = (i64, i64, String, String, String);

fn assemble_softwares(
    heads: Vec<SoftwareHead>,
    platforms: Vec<(i64, String)>,
) -> Result<Vec<Software>, PersistenceError> {
    let mut by_software: BTreeMap<i64, Vec<Platform>> = BTreeMap::new();
    for (software_id, platform) in platforms {
        by_software
            .entry(software_id)
            .or_default()
            .push(parse_stored(&platform)?);
    }

    Ok(heads
        .into_iter()
        .map(|(software_id, software_family_id, family_name, name, version)| {
            let mut platforms: Vec<Platform> =
                by_software.remove(&software_id).unwrap_or_default();
            platforms.sort();
            Software {
                software_id,
                software_family_id,
                family_name,
                name,
                version,
                platforms,
            }
        })
        .collect())
}

backend_fn! {
/// Lists suppliers ordered by name.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn list_suppliers(conn: &mut _) -> Result<Vec<Supplier>, PersistenceError> {
    let rows: Vec<(i64, String, String)> = suppliers::table
        .select((suppliers::supplier_id, suppliers::name, suppliers::contact))
        .order(suppliers::name.asc())
        .load(conn)?;

    Ok(rows
        .into_iter()
        .map(|(supplier_id, name, contact)| Supplier {
            supplier_id,
            name,
            contact,
        })
        .collect())
}
}

backend_fn! {
/// Lists software families ordered by name.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn list_software_families(conn: &mut _) -> Result<Vec<SoftwareFamily>, PersistenceError> {
    let rows: Vec<(i64, String)> = software_families::table
        .select((software_families::software_family_id, software_families::name))
        .order(software_families::name.asc())
        .load(conn)?;

    Ok(rows
        .into_iter()
        .map(|(software_family_id, name)| SoftwareFamily {
            software_family_id,
            name,
        })
        .collect())
}
}

backend_fn! {
/// Retrieves the name of a software family.
///
/// # Errors
///
/// Returns `NotFound` if the family does not exist.
pub fn get_software_family_name(
    conn: &mut _,
    software_family_id: i64,
) -> Result<String, PersistenceError> {
    software_families::table
        .filter(software_families::software_family_id.eq(software_family_id))
        .select(software_families::name)
        .first(conn)
        .optional()?
        .ok_or_else(|| PersistenceError::NotFound(format!("Software family {software_family_id}")))
}
}

backend_fn! {
/// Loads softwares with their family names and platforms.
///
/// `software_ids` restricts the result when given; `family_id` keeps one
/// family. Results are ordered by family name, name and version.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn list_softwares(
    conn: &mut _,
    software_ids: Option<&[i64]>,
    family_id: Option<i64>,
) -> Result<Vec<Software>, PersistenceError> {
    let mut query = softwares::table
        .inner_join(software_families::table)
        .select((
            softwares::software_id,
            softwares::software_family_id,
            software_families::name,
            softwares::name,
            softwares::version,
        ))
        .into_boxed();
    if let Some(ids) = software_ids {
        query = query.filter(softwares::software_id.eq_any(ids.to_vec()));
    }
    if let Some(family_id) = family_id {
        query = query.filter(softwares::software_family_id.eq(family_id));
    }
    let heads: Vec<SoftwareHead> = query
        .order((
            software_families::name.asc(),
            softwares::name.asc(),
            softwares::version.asc(),
        ))
        .load(conn)?;

    let ids: Vec<i64> = heads.iter().map(|head| head.0).collect();
    let platforms: Vec<(i64, String)> = software_platforms::table
        .filter(software_platforms::software_id.eq_any(&ids))
        .select((software_platforms::software_id, software_platforms::platform))
        .load(conn)?;

    debug!(count = heads.len(), "Loaded softwares");
    assemble_softwares(heads, platforms)
}
}

backend_fn! {
/// Retrieves one software with its family name and platforms.
///
/// # Errors
///
/// Returns `NotFound` if the software does not exist.
pub fn get_software(conn: &mut _, software_id: i64) -> Result<Software, PersistenceError> {
    let head: SoftwareHead = softwares::table
        .inner_join(software_families::table)
        .filter(softwares::software_id.eq(software_id))
        .select((
            softwares::software_id,
            softwares::software_family_id,
            software_families::name,
            softwares::name,
            softwares::version,
        ))
        .first(conn)
        .optional()?
        .ok_or_else(|| PersistenceError::NotFound(format!("Software {software_id}")))?;

    let platforms: Vec<(i64, String)> = software_platforms::table
        .filter(software_platforms::software_id.eq(software_id))
        .select((software_platforms::software_id, software_platforms::platform))
        .load(conn)?;

    assemble_softwares(vec![head], platforms)?
        .pop()
        .ok_or_else(|| PersistenceError::NotFound(format!("Software {software_id}")))
}
}
