// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! SQLite-specific backend utilities.
//!
//! `SQLite` has no row locks. Write transactions are opened with
//! `BEGIN IMMEDIATE`, which takes the database write lock up front, so a
//! license read inside one cannot change until the transaction ends.

use diesel::dsl::sql;
use diesel::prelude::*;
use diesel::sql_types::{BigInt, Integer};
use diesel::{Connection, RunQueryDsl, SqliteConnection};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use tracing::{debug, info};

use lms_domain::{License, LicenseAssignment};

use crate::diesel_schema::{license_assignments, licenses};
use crate::error::PersistenceError;
use crate::queries::assignments::{AssignmentRow, expect_assignments};
use crate::queries::licenses::LicenseRow;

/// SQLite-specific migrations.
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Helper row struct for PRAGMA queries.
#[derive(QueryableByName)]
struct PragmaRow {
    #[diesel(sql_type = Integer)]
    foreign_keys: i32,
}

/// Returns the ID of the last inserted row.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn get_last_insert_rowid(conn: &mut SqliteConnection) -> Result<i64, PersistenceError> {
    Ok(diesel::select(sql::<BigInt>("last_insert_rowid()")).get_result(conn)?)
}

/// Verifies that foreign key enforcement is enabled.
///
/// # Errors
///
/// Returns an error if foreign key enforcement is not enabled.
pub fn verify_foreign_key_enforcement(conn: &mut SqliteConnection) -> Result<(), PersistenceError> {
    // NOTE: PRAGMA is raw SQL (Diesel has no PRAGMA DSL)
    let foreign_keys_enabled: i32 = diesel::sql_query("PRAGMA foreign_keys")
        .get_result::<PragmaRow>(conn)?
        .foreign_keys;

    if foreign_keys_enabled == 0 {
        return Err(PersistenceError::ForeignKeyEnforcementNotEnabled);
    }

    info!("SQLite foreign key enforcement is enabled");
    Ok(())
}

/// Runs `f` inside a `BEGIN IMMEDIATE` transaction.
///
/// # Errors
///
/// Returns the error of `f`, or an error if the transaction fails.
pub fn write_transaction<T, F>(conn: &mut SqliteConnection, f: F) -> Result<T, PersistenceError>
where
    F: FnOnce(&mut SqliteConnection) -> Result<T, PersistenceError>,
{
    conn.immediate_transaction(f)
}

/// Loads a license inside the current write transaction.
///
/// The write lock taken by [`write_transaction`] already covers the row.
///
/// # Errors
///
/// Returns `NotFound` if the license does not exist.
pub fn lock_license(
    conn: &mut SqliteConnection,
    license_id: i64,
) -> Result<License, PersistenceError> {
    debug!(license_id, "Loading license for update");
    licenses::table
        .filter(licenses::license_id.eq(license_id))
        .select(LicenseRow::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| PersistenceError::NotFound(format!("License {license_id}")))?
        .into_license()
}

/// Loads assignments inside the current write transaction.
///
/// # Errors
///
/// Returns `NotFound` if any of them does not exist.
pub fn lock_assignments(
    conn: &mut SqliteConnection,
    assignment_ids: &[i64],
) -> Result<Vec<LicenseAssignment>, PersistenceError> {
    let rows: Vec<AssignmentRow> = license_assignments::table
        .filter(license_assignments::assignment_id.eq_any(assignment_ids))
        .select(AssignmentRow::as_select())
        .order(license_assignments::assignment_id.asc())
        .load(conn)?;
    expect_assignments(assignment_ids, rows)
}

/// Run pending migrations on the provided connection.
///
/// # Errors
///
/// Returns an error if migration execution fails.
pub fn run_migrations(
    conn: &mut SqliteConnection,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    info!("Running SQLite database migrations");
    conn.run_pending_migrations(MIGRATIONS)?;
    Ok(())
}

/// Opens a `SQLite` database, enables foreign keys and runs migrations.
///
/// # Arguments
///
/// * `database_url` - The `SQLite` database URL (e.g., `":memory:"` or file path)
///
/// # Errors
///
/// Returns an error if connection or migration fails.
pub fn initialize_database(database_url: &str) -> Result<SqliteConnection, PersistenceError> {
    info!("Initializing SQLite database at: {}", database_url);

    let mut conn: SqliteConnection = SqliteConnection::establish(database_url)
        .map_err(|e| PersistenceError::DatabaseConnectionFailed(e.to_string()))?;

    // NOTE: PRAGMA is raw SQL (Diesel has no PRAGMA DSL)
    diesel::sql_query("PRAGMA foreign_keys = ON")
        .execute(&mut conn)
        .map_err(|e| PersistenceError::QueryFailed(e.to_string()))?;

    run_migrations(&mut conn).map_err(|e| PersistenceError::MigrationFailed(e.to_string()))?;

    Ok(conn)
}

/// Enable WAL mode for file-based `SQLite` databases.
///
/// # Errors
///
/// Returns an error if the PRAGMA statement fails.
pub fn enable_wal_mode(conn: &mut SqliteConnection) -> Result<(), PersistenceError> {
    diesel::sql_query("PRAGMA journal_mode = WAL")
        .execute(conn)
        .map_err(|e| PersistenceError::QueryFailed(e.to_string()))?;
    Ok(())
}
