// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Database backend-specific code.
//!
//! This module isolates backend-specific initialization, migration,
//! row locking, and helper functions that cannot be expressed in
//! backend-agnostic Diesel DSL.
//!
//! ## Backend Support
//!
//! - `sqlite`: `SQLite` backend (default for development and testing)
//! - `mysql`: MySQL/MariaDB backend (validated via opt-in tests)
//!
//! ## Backend-Agnostic Code
//!
//! Most persistence code is backend-agnostic and uses Diesel DSL.
//! Backend-specific code is limited to:
//!
//! - Connection initialization
//! - Migration execution
//! - Backend-specific configuration (e.g., PRAGMA, engine settings)
//! - Write transactions and license / assignment row locks
//!
//! Queries and mutations live in `queries/` and `mutations/`. Functions
//! generated by `backend_fn!` cannot name each other without knowing the
//! backend, so the ones shared between mutations are reachable through
//! the `PersistenceBackend` trait below.

pub mod mysql;
pub mod sqlite;

use std::collections::BTreeMap;

use diesel::{Connection, MysqlConnection, SqliteConnection};

use lms::{BulkAssignRequest, SeatDelta};
use lms_domain::{
    Asset, AssignmentDraft, Exchange, License, LicenseAssignment, LicenseKey, LicensedSoftware,
    Software,
};

use crate::data_models::BulkInventoryData;
use crate::error::PersistenceError;
use crate::{mutations, queries};

/// Trait for backend-specific operations and shared mutation steps.
///
/// Implemented for both `SqliteConnection` and `MysqlConnection`, so that
/// functions generated by `backend_fn!` can call each other through the
/// connection they were given.
pub trait PersistenceBackend: Connection {
    /// Retrieves the last inserted row ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    fn get_last_insert_rowid(&mut self) -> Result<i64, PersistenceError>;

    /// Verifies that foreign key enforcement is enabled.
    ///
    /// # Errors
    ///
    /// Returns an error if foreign key enforcement is not enabled.
    fn verify_foreign_key_enforcement(&mut self) -> Result<(), PersistenceError>;

    /// Runs `f` in a transaction that may write.
    ///
    /// Never call this from inside another write transaction.
    ///
    /// # Errors
    ///
    /// Returns the error of `f`, or an error if the transaction fails.
    fn write_transaction<T, F>(&mut self, f: F) -> Result<T, PersistenceError>
    where
        F: FnOnce(&mut Self) -> Result<T, PersistenceError>;

    /// Loads a license and locks its row until the transaction ends.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the license does not exist.
    fn lock_license(&mut self, license_id: i64) -> Result<License, PersistenceError>;

    /// Loads a license without locking it.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the license does not exist.
    fn load_license(&mut self, license_id: i64) -> Result<License, PersistenceError>;

    /// Loads every license, optionally within one family.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    fn load_licenses(&mut self, family_id: Option<i64>) -> Result<Vec<License>, PersistenceError>;

    /// Number of assignments referencing each license.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    fn count_assignments_by_license(&mut self) -> Result<BTreeMap<i64, u32>, PersistenceError>;

    /// Loads everything one license covers.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    fn load_coverage(&mut self, license_id: i64)
    -> Result<Vec<LicensedSoftware>, PersistenceError>;

    /// # Errors
    ///
    /// Returns `NotFound` if the software does not exist.
    fn load_software(&mut self, software_id: i64) -> Result<Software, PersistenceError>;

    /// # Errors
    ///
    /// Returns `NotFound` if the key does not exist.
    fn load_license_key(&mut self, license_key_id: i64) -> Result<LicenseKey, PersistenceError>;

    /// IDs of the assignments holding a key.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    fn key_holders(&mut self, license_key_id: i64) -> Result<Vec<i64>, PersistenceError>;

    /// Loads assignments and locks their rows until the transaction ends.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if any of them does not exist.
    fn lock_assignments(
        &mut self,
        assignment_ids: &[i64],
    ) -> Result<Vec<LicenseAssignment>, PersistenceError>;

    /// Writes one seat change to a locked license.
    ///
    /// # Errors
    ///
    /// Returns a domain error if the change breaks the seat invariant.
    fn apply_seat_delta(
        &mut self,
        license: &License,
        delta: &SeatDelta,
    ) -> Result<u32, PersistenceError>;

    /// Validates and stores an assignment, moving seats as needed.
    ///
    /// Must run inside a write transaction.
    ///
    /// # Errors
    ///
    /// Returns the first violated rule or a database error.
    fn insert_assignment(
        &mut self,
        draft: &AssignmentDraft,
        previous: Option<&LicenseAssignment>,
    ) -> Result<i64, PersistenceError>;

    /// Loads what the bulk planner needs for a request.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    fn load_bulk_inventory(
        &mut self,
        request: &BulkAssignRequest,
    ) -> Result<BulkInventoryData, PersistenceError>;

    /// # Errors
    ///
    /// Returns `NotFound` if the asset does not exist.
    fn load_asset(&mut self, asset_id: i64) -> Result<Asset, PersistenceError>;

    /// # Errors
    ///
    /// Returns `NotFound` if the exchange does not exist.
    fn load_exchange(&mut self, exchange_id: i64) -> Result<Exchange, PersistenceError>;

    /// # Errors
    ///
    /// Returns an error if the database query fails.
    fn managed_location_ids(&mut self, user_id: i64) -> Result<Vec<i64>, PersistenceError>;
}

/// Implements `PersistenceBackend` for one connection type by delegating to
/// the backend module and the `_sqlite` / `_mysql` generated functions.
macro_rules! impl_persistence_backend {
    ($conn:ty, $backend:ident) => {
        pastey::paste! {
            impl PersistenceBackend for $conn {
                fn get_last_insert_rowid(&mut self) -> Result<i64, PersistenceError> {
                    $backend::get_last_insert_rowid(self)
                }

                fn verify_foreign_key_enforcement(&mut self) -> Result<(), PersistenceError> {
                    $backend::verify_foreign_key_enforcement(self)
                }

                fn write_transaction<T, F>(&mut self, f: F) -> Result<T, PersistenceError>
                where
                    F: FnOnce(&mut Self) -> Result<T, PersistenceError>,
                {
                    $backend::write_transaction(self, f)
                }

                fn lock_license(&mut self, license_id: i64) -> Result<License, PersistenceError> {
                    $backend::lock_license(self, license_id)
                }

                fn load_license(&mut self, license_id: i64) -> Result<License, PersistenceError> {
                    queries::licenses::[<get_license_ $backend>](self, license_id)
                }

                fn load_licenses(
                    &mut self,
                    family_id: Option<i64>,
                ) -> Result<Vec<License>, PersistenceError> {
                    queries::licenses::[<list_licenses_ $backend>](self, family_id)
                }

                fn count_assignments_by_license(
                    &mut self,
                ) -> Result<BTreeMap<i64, u32>, PersistenceError> {
                    queries::assignments::[<count_assignments_by_license_ $backend>](self)
                }

                fn load_coverage(
                    &mut self,
                    license_id: i64,
                ) -> Result<Vec<LicensedSoftware>, PersistenceError> {
                    queries::licenses::[<list_licensed_softwares_ $backend>](self, &[license_id])
                }

                fn load_software(&mut self, software_id: i64) -> Result<Software, PersistenceError> {
                    queries::catalog::[<get_software_ $backend>](self, software_id)
                }

                fn load_license_key(
                    &mut self,
                    license_key_id: i64,
                ) -> Result<LicenseKey, PersistenceError> {
                    queries::licenses::[<get_license_key_ $backend>](self, license_key_id)
                }

                fn key_holders(&mut self, license_key_id: i64) -> Result<Vec<i64>, PersistenceError> {
                    queries::assignments::[<key_holders_ $backend>](self, license_key_id)
                }

                fn lock_assignments(
                    &mut self,
                    assignment_ids: &[i64],
                ) -> Result<Vec<LicenseAssignment>, PersistenceError> {
                    $backend::lock_assignments(self, assignment_ids)
                }

                fn apply_seat_delta(
                    &mut self,
                    license: &License,
                    delta: &SeatDelta,
                ) -> Result<u32, PersistenceError> {
                    mutations::licenses::[<apply_seat_delta_ $backend>](self, license, delta)
                }

                fn insert_assignment(
                    &mut self,
                    draft: &AssignmentDraft,
                    previous: Option<&LicenseAssignment>,
                ) -> Result<i64, PersistenceError> {
                    mutations::assignments::[<insert_assignment_ $backend>](self, draft, previous)
                }

                fn load_bulk_inventory(
                    &mut self,
                    request: &BulkAssignRequest,
                ) -> Result<BulkInventoryData, PersistenceError> {
                    queries::assignments::[<load_bulk_inventory_ $backend>](self, request)
                }

                fn load_asset(&mut self, asset_id: i64) -> Result<Asset, PersistenceError> {
                    queries::assets::[<get_asset_ $backend>](self, asset_id)
                }

                fn load_exchange(&mut self, exchange_id: i64) -> Result<Exchange, PersistenceError> {
                    queries::assets::[<get_exchange_ $backend>](self, exchange_id)
                }

                fn managed_location_ids(&mut self, user_id: i64) -> Result<Vec<i64>, PersistenceError> {
                    queries::assets::[<managed_location_ids_ $backend>](self, user_id)
                }
            }
        }
    };
}

impl_persistence_backend!(SqliteConnection, sqlite);
impl_persistence_backend!(MysqlConnection, mysql);
