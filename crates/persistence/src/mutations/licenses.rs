// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! License, coverage, key and seat mutations.

use diesel::prelude::*;
use diesel::{MysqlConnection, SqliteConnection};
use num_traits::ToPrimitive;
use tracing::{info, warn};

use lms::{SeatChange, SeatDelta};
use lms_domain::{
    ActivationType, DomainError, License, LicensedSoftware, Platform, Software,
    license_description, validate_license_terms, validate_licensed_software, validate_name,
};

use crate::backend::PersistenceBackend;
use crate::data_models::{LicenseFields, flag, seats_to_column, store_date};
use crate::diesel_schema::{license_keys, licensed_softwares, licenses, software_families};
use crate::error::PersistenceError;

fn ordinal_from_count(count: i64) -> Result<u32, PersistenceError> {
    count
        .to_u32()
        .and_then(|count| count.checked_add(1))
        .ok_or_else(|| PersistenceError::Other(format!("License count {count} out of range")))
}

backend_fn! {
/// Creates a license with a generated description.
///
/// # Errors
///
/// Returns a domain error if the terms are invalid.
pub fn create_license(conn: &mut _, fields: &LicenseFields) -> Result<i64, PersistenceError> {
    validate_license_terms(&fields.terms(), None)?;
    let total: i32 = seats_to_column(fields.total)?;

    conn.write_transaction(|conn| {
        let family_name: String = software_families::table
            .filter(software_families::software_family_id.eq(fields.software_family_id))
            .select(software_families::name)
            .first(conn)
            .optional()?
            .ok_or_else(|| {
                PersistenceError::NotFound(format!(
                    "Software family {}",
                    fields.software_family_id
                ))
            })?;
        let existing: i64 = licenses::table
            .filter(licenses::software_family_id.eq(fields.software_family_id))
            .filter(licenses::license_type.eq(fields.license_type.as_str()))
            .count()
            .get_result(conn)?;
        let description: String = license_description(
            &family_name,
            fields.license_type,
            fields.oem_device.as_deref(),
            ordinal_from_count(existing)?,
        );

        diesel::insert_into(licenses::table)
            .values((
                licenses::description.eq(&description),
                licenses::is_active.eq(flag(true)),
                licenses::software_family_id.eq(fields.software_family_id),
                licenses::total.eq(total),
                licenses::used_total.eq(0),
                licenses::license_type.eq(fields.license_type.as_str()),
                licenses::oem_device.eq(fields.oem_device.as_deref()),
                licenses::supplier_id.eq(fields.supplier_id),
                licenses::license_number.eq(&fields.license_number),
                licenses::purchased_date.eq(store_date(fields.purchased_date)),
                licenses::started_date.eq(store_date(fields.started_date)),
                licenses::ended_date.eq(store_date(fields.ended_date)),
                licenses::note.eq(&fields.note),
            ))
            .execute(conn)?;
        let license_id: i64 = conn.get_last_insert_rowid()?;

        info!(license_id, description = %description, total = fields.total, "Created license");
        Ok(license_id)
    })
}
}

backend_fn! {
/// Updates the terms of a license and regenerates its description.
///
/// The total cannot drop below the seats in use, and the family cannot
/// change once the license covers any software.
///
/// # Errors
///
/// Returns a domain error if the new terms are invalid.
pub fn update_license(
    conn: &mut _,
    license_id: i64,
    fields: &LicenseFields,
) -> Result<License, PersistenceError> {
    let total: i32 = seats_to_column(fields.total)?;

    conn.write_transaction(|conn| {
        let current: License = conn.lock_license(license_id)?;
        validate_license_terms(&fields.terms(), Some(current.used_total))?;

        if fields.software_family_id != current.software_family_id {
            let coverage: Vec<LicensedSoftware> = conn.load_coverage(license_id)?;
            if let Some(covered) = coverage.first() {
                return Err(DomainError::FamilyMismatch {
                    software_id: covered.software_id,
                    license_id,
                }
                .into());
            }
        }

        let family_name: String = software_families::table
            .filter(software_families::software_family_id.eq(fields.software_family_id))
            .select(software_families::name)
            .first(conn)
            .optional()?
            .ok_or_else(|| {
                PersistenceError::NotFound(format!(
                    "Software family {}",
                    fields.software_family_id
                ))
            })?;
        let earlier: i64 = licenses::table
            .filter(licenses::software_family_id.eq(fields.software_family_id))
            .filter(licenses::license_type.eq(fields.license_type.as_str()))
            .filter(licenses::license_id.lt(license_id))
            .count()
            .get_result(conn)?;
        let description: String = license_description(
            &family_name,
            fields.license_type,
            fields.oem_device.as_deref(),
            ordinal_from_count(earlier)?,
        );

        diesel::update(licenses::table.filter(licenses::license_id.eq(license_id)))
            .set((
                licenses::description.eq(&description),
                licenses::software_family_id.eq(fields.software_family_id),
                licenses::total.eq(total),
                licenses::license_type.eq(fields.license_type.as_str()),
                licenses::oem_device.eq(fields.oem_device.as_deref()),
                licenses::supplier_id.eq(fields.supplier_id),
                licenses::license_number.eq(&fields.license_number),
                licenses::purchased_date.eq(store_date(fields.purchased_date)),
                licenses::started_date.eq(store_date(fields.started_date)),
                licenses::ended_date.eq(store_date(fields.ended_date)),
                licenses::note.eq(&fields.note),
            ))
            .execute(conn)?;

        info!(license_id, description = %description, total = fields.total, "Updated license");
        conn.load_license(license_id)
    })
}
}

backend_fn! {
/// Activates or deactivates a license.
///
/// Inactive licenses keep their assignments but take no new ones.
///
/// # Errors
///
/// Returns `NotFound` if the license does not exist.
pub fn set_license_active(
    conn: &mut _,
    license_id: i64,
    is_active: bool,
) -> Result<(), PersistenceError> {
    let updated: usize = diesel::update(licenses::table.filter(licenses::license_id.eq(license_id)))
        .set(licenses::is_active.eq(flag(is_active)))
        .execute(conn)?;
    if updated == 0 {
        return Err(PersistenceError::NotFound(format!("License {license_id}")));
    }

    info!(license_id, is_active, "Updated license active flag");
    Ok(())
}
}

backend_fn! {
/// Attaches a software to a license, optionally scoped to one platform.
///
/// # Errors
///
/// Returns a domain error if the families differ or the software does
/// not run on the platform, and `Conflict` for a duplicate.
pub fn add_licensed_software(
    conn: &mut _,
    license_id: i64,
    software_id: i64,
    platform: Platform,
    note: &str,
) -> Result<i64, PersistenceError> {
    let license: License = conn.load_license(license_id)?;
    let software: Software = conn.load_software(software_id)?;
    validate_licensed_software(&license, software_id, software.software_family_id)?;
    if platform != Platform::All && !software.supports(platform) {
        return Err(DomainError::PlatformNotSupported {
            software_id,
            platform,
        }
        .into());
    }

    diesel::insert_into(licensed_softwares::table)
        .values((
            licensed_softwares::license_id.eq(license_id),
            licensed_softwares::software_id.eq(software_id),
            licensed_softwares::platform.eq(platform.as_str()),
            licensed_softwares::note.eq(note),
        ))
        .execute(conn)?;
    let licensed_software_id: i64 = conn.get_last_insert_rowid()?;

    info!(licensed_software_id, license_id, software_id, %platform, "Added licensed software");
    Ok(licensed_software_id)
}
}

backend_fn! {
/// Adds a serial key to a licensed software.
///
/// # Errors
///
/// Returns a domain error for a blank key and `ReferenceViolation` if the
/// licensed software does not exist.
pub fn add_license_key(
    conn: &mut _,
    licensed_software_id: i64,
    serial_key: &str,
    activation_type: ActivationType,
) -> Result<i64, PersistenceError> {
    validate_name("Serial key", serial_key)?;

    diesel::insert_into(license_keys::table)
        .values((
            license_keys::licensed_software_id.eq(licensed_software_id),
            license_keys::serial_key.eq(serial_key.trim()),
            license_keys::activation_type.eq(activation_type.as_str()),
        ))
        .execute(conn)?;
    let license_key_id: i64 = conn.get_last_insert_rowid()?;

    info!(license_key_id, licensed_software_id, %activation_type, "Added license key");
    Ok(license_key_id)
}
}

backend_fn! {
/// Writes one seat change to a license loaded under lock.
///
/// Returns the new `used_total`.
///
/// # Errors
///
/// Returns `NotEnoughLicenses` or `SeatUnderflow` if the change would
/// break the seat invariant; nothing is written then.
pub fn apply_seat_delta(
    conn: &mut _,
    license: &License,
    delta: &SeatDelta,
) -> Result<u32, PersistenceError> {
    let used_total: u32 = match delta.change {
        SeatChange::Reserve => license.reserve_seats(delta.amount),
        SeatChange::Release => license.release_seats(delta.amount),
    }
    .inspect_err(|e| warn!(license_id = license.license_id, error = %e, "Seat change rejected"))?;

    diesel::update(licenses::table.filter(licenses::license_id.eq(license.license_id)))
        .set(licenses::used_total.eq(seats_to_column(used_total)?))
        .execute(conn)?;

    info!(
        license_id = license.license_id,
        change = ?delta.change,
        amount = delta.amount,
        used_total,
        "Applied seat change"
    );
    Ok(used_total)
}
}
