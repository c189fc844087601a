// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Supplier, software family and software mutations.

use std::collections::BTreeSet;

use diesel::prelude::*;
use diesel::{MysqlConnection, SqliteConnection};
use tracing::info;

use lms_domain::{DomainError, Platform, validate_name, validate_optional_name};

use crate::backend::PersistenceBackend;
use crate::data_models::NewSoftware;
use crate::diesel_schema::{software_families, software_platforms, softwares, suppliers};
use crate::error::PersistenceError;

/// Expands `All` and removes duplicates; stored platforms are concrete.
pub(crate) fn concrete_platforms(platforms: &[Platform]) -> Vec<Platform> {
    let mut concrete: BTreeSet<Platform> = BTreeSet::new();
    for platform in platforms {
        if *platform == Platform::All {
            concrete.extend([Platform::Windows, Platform::MacOs, Platform::Linux]);
        } else {
            concrete.insert(*platform);
        }
    }
    concrete.into_iter().collect()
}

backend_fn! {
/// Creates a supplier.
///
/// # Errors
///
/// Returns `Conflict` if the name is taken.
pub fn create_supplier(conn: &mut _, name: &str, contact: &str) -> Result<i64, PersistenceError> {
    validate_name("Supplier name", name)?;

    diesel::insert_into(suppliers::table)
        .values((suppliers::name.eq(name.trim()), suppliers::contact.eq(contact)))
        .execute(conn)?;
    let supplier_id: i64 = conn.get_last_insert_rowid()?;

    info!(supplier_id, name, "Created supplier");
    Ok(supplier_id)
}
}

backend_fn! {
/// Creates a software family.
///
/// # Errors
///
/// Returns `Conflict` if the name is taken.
pub fn create_software_family(conn: &mut _, name: &str) -> Result<i64, PersistenceError> {
    validate_name("Software family name", name)?;

    diesel::insert_into(software_families::table)
        .values(software_families::name.eq(name.trim()))
        .execute(conn)?;
    let software_family_id: i64 = conn.get_last_insert_rowid()?;

    info!(software_family_id, name, "Created software family");
    Ok(software_family_id)
}
}

backend_fn! {
/// Creates a software with its supported platforms.
///
/// # Errors
///
/// Returns a domain error if no platform is given and `Conflict` if the
/// (name, version) pair exists.
pub fn create_software(conn: &mut _, software: &NewSoftware) -> Result<i64, PersistenceError> {
    validate_optional_name("Software name", &software.name)?;
    validate_optional_name("Software version", &software.version)?;
    let platforms: Vec<Platform> = concrete_platforms(&software.platforms);
    if platforms.is_empty() {
        return Err(DomainError::EmptySelection("platform").into());
    }

    conn.write_transaction(|conn| {
        diesel::insert_into(softwares::table)
            .values((
                softwares::software_family_id.eq(software.software_family_id),
                softwares::name.eq(software.name.trim()),
                softwares::version.eq(software.version.trim()),
            ))
            .execute(conn)?;
        let software_id: i64 = conn.get_last_insert_rowid()?;

        for platform in &platforms {
            diesel::insert_into(software_platforms::table)
                .values((
                    software_platforms::software_id.eq(software_id),
                    software_platforms::platform.eq(platform.as_str()),
                ))
                .execute(conn)?;
        }

        info!(
            software_id,
            family_id = software.software_family_id,
            name = %software.name,
            version = %software.version,
            "Created software"
        );
        Ok(software_id)
    })
}
}
