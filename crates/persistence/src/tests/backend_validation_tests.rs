// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Backend validation tests for multi-database support.
//!
//! These tests validate that the persistence layer works the same on
//! `SQLite` and MariaDB/MySQL.
//!
//! ## Test Execution
//!
//! - `SQLite` is covered by the rest of the suite via `cargo test`
//! - MariaDB/MySQL tests are marked `#[ignore]` and run only via
//!   `cargo xtask test-mariadb`
//!
//! ## Infrastructure Requirements
//!
//! `MariaDB` tests require:
//! - `DATABASE_URL` environment variable (set by xtask)
//! - `LMS_TEST_BACKEND=mariadb` environment variable
//! - Running `MariaDB` instance (provisioned by xtask)
//!
//! Tests fail fast if required infrastructure is missing. All tests share
//! one database, so every row they insert carries a unique name.
//!
//! ## What These Tests Validate
//!
//! - Schema creation and migration application
//! - Constraint enforcement (FK, UNIQUE, CHECK)
//! - Seat bookkeeping through `SELECT ... FOR UPDATE` transactions
//! - Assignment rows staying locked while they are edited

use diesel::MysqlConnection;
use diesel::QueryableByName;
use diesel::prelude::*;
use diesel::sql_types::BigInt;
use std::env;
use std::time::{SystemTime, UNIX_EPOCH};

use lms_domain::{DomainError, Platform};

use crate::backend::mysql;
use crate::{Persistence, PersistenceError};

use super::{create_test_software, create_test_user, draft, perpetual_fields};

/// Result type for `LAST_INSERT_ID` queries.
#[derive(QueryableByName)]
struct LastInsertIdResult {
    #[diesel(sql_type = BigInt)]
    id: i64,
}

/// Helper to get the `MariaDB` connection URL from environment.
///
/// # Panics
///
/// Panics if `DATABASE_URL` is not set, indicating missing infrastructure.
fn get_mariadb_url() -> String {
    env::var("DATABASE_URL")
        .expect("DATABASE_URL not set - MariaDB tests must be run via `cargo xtask test-mariadb`")
}

/// Helper to verify we're running in the `MariaDB` test environment.
///
/// # Panics
///
/// Panics if `LMS_TEST_BACKEND` is not set to `mariadb`.
fn verify_mariadb_test_environment() {
    let backend = env::var("LMS_TEST_BACKEND").expect(
        "LMS_TEST_BACKEND not set - MariaDB tests must be run via `cargo xtask test-mariadb`",
    );
    assert_eq!(backend, "mariadb", "LMS_TEST_BACKEND must be 'mariadb'");
}

fn unique_name(prefix: &str) -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("Clock before epoch")
        .as_nanos();
    format!("{prefix}_{nanos}")
}

fn insert_family(conn: &mut MysqlConnection, name: &str) -> i64 {
    diesel::sql_query(format!(
        "INSERT INTO software_families (name) VALUES ('{name}')"
    ))
    .execute(conn)
    .expect("Failed to insert software family");
    diesel::sql_query("SELECT LAST_INSERT_ID() as id")
        .get_result::<LastInsertIdResult>(conn)
        .map(|r| r.id)
        .expect("Failed to get software_family_id")
}

#[test]
#[ignore = "requires MariaDB via cargo xtask test-mariadb"]
fn test_mariadb_connection() {
    verify_mariadb_test_environment();
    let url = get_mariadb_url();

    let result = MysqlConnection::establish(&url);
    assert!(
        result.is_ok(),
        "Failed to connect to MariaDB: {:?}",
        result.err()
    );
}

#[test]
#[ignore = "requires MariaDB via cargo xtask test-mariadb"]
fn test_mariadb_migrations_apply_cleanly() {
    verify_mariadb_test_environment();
    let url = get_mariadb_url();

    let result = mysql::initialize_database(&url);
    assert!(
        result.is_ok(),
        "Failed to initialize MariaDB and run migrations: {:?}",
        result.err()
    );
}

#[test]
#[ignore = "requires MariaDB via cargo xtask test-mariadb"]
fn test_mariadb_foreign_key_enforcement() {
    verify_mariadb_test_environment();
    let url = get_mariadb_url();

    let mut conn = mysql::initialize_database(&url).expect("Failed to initialize MariaDB database");
    mysql::verify_foreign_key_enforcement(&mut conn).expect("Foreign keys not enforced");

    let result = diesel::sql_query(
        "INSERT INTO licenses (description, software_family_id, total, license_type, note)
         VALUES ('Orphan', 99999999, 1, 'perpetual', '')",
    )
    .execute(&mut conn);

    assert!(
        result.is_err(),
        "License with non-existent family should fail due to foreign key constraint"
    );
}

#[test]
#[ignore = "requires MariaDB via cargo xtask test-mariadb"]
fn test_mariadb_software_unique_constraint() {
    verify_mariadb_test_environment();
    let url = get_mariadb_url();

    let mut conn = mysql::initialize_database(&url).expect("Failed to initialize MariaDB database");
    let family = unique_name("family");
    let family_id = insert_family(&mut conn, &family);

    let insert = format!(
        "INSERT INTO softwares (software_family_id, name, version)
         VALUES ({family_id}, '{family}', '2026')"
    );
    diesel::sql_query(&insert)
        .execute(&mut conn)
        .expect("Failed to insert software");
    let duplicate_result = diesel::sql_query(&insert).execute(&mut conn);

    assert!(
        duplicate_result.is_err(),
        "Duplicate (name, version) should fail due to UNIQUE constraint"
    );
}

#[test]
#[ignore = "requires MariaDB via cargo xtask test-mariadb"]
fn test_mariadb_used_total_check_constraint() {
    verify_mariadb_test_environment();
    let url = get_mariadb_url();

    let mut conn = mysql::initialize_database(&url).expect("Failed to initialize MariaDB database");
    let family_id = insert_family(&mut conn, &unique_name("family"));

    let result = diesel::sql_query(format!(
        "INSERT INTO licenses (description, software_family_id, total, used_total, license_type, note)
         VALUES ('Overbooked', {family_id}, 1, 2, 'perpetual', '')"
    ))
    .execute(&mut conn);

    assert!(
        result.is_err(),
        "used_total above total should fail due to CHECK constraint"
    );
}

#[test]
#[ignore = "requires MariaDB via cargo xtask test-mariadb"]
fn test_mariadb_seats_are_counted_under_lock() {
    verify_mariadb_test_environment();
    let url = get_mariadb_url();

    let mut persistence =
        Persistence::new_with_mysql(&url).expect("Failed to initialize MariaDB persistence");
    let family_id = persistence
        .create_software_family(&unique_name("family"))
        .expect("Failed to create family");
    let software_id = create_test_software(
        &mut persistence,
        family_id,
        &unique_name("software"),
        &[Platform::Windows],
    );
    let license_id = persistence
        .create_license(&perpetual_fields(family_id, 1))
        .expect("Failed to create license");
    persistence
        .add_licensed_software(license_id, software_id, Platform::All, "")
        .expect("Failed to cover software");
    let first = create_test_user(&mut persistence, &unique_name("first"));
    let second = create_test_user(&mut persistence, &unique_name("second"));

    let assignment_id = persistence
        .create_assignment(&draft(first, software_id, Some(license_id)))
        .expect("Failed to assign the only seat");
    let full = persistence.create_assignment(&draft(second, software_id, Some(license_id)));
    assert!(matches!(
        full,
        Err(PersistenceError::DomainViolation(
            DomainError::NotEnoughLicenses { .. }
        ))
    ));
    assert_eq!(
        persistence.get_license(license_id).unwrap().used_total,
        1
    );

    persistence
        .delete_assignments(&[assignment_id])
        .expect("Failed to delete assignment");
    assert_eq!(
        persistence.get_license(license_id).unwrap().used_total,
        0
    );
}

#[test]
#[ignore = "requires MariaDB via cargo xtask test-mariadb"]
fn test_mariadb_assignment_rows_are_locked_while_edited() {
    verify_mariadb_test_environment();
    let url = get_mariadb_url();

    let mut persistence =
        Persistence::new_with_mysql(&url).expect("Failed to initialize MariaDB persistence");
    let family_id = persistence
        .create_software_family(&unique_name("family"))
        .expect("Failed to create family");
    let software_id = create_test_software(
        &mut persistence,
        family_id,
        &unique_name("software"),
        &[Platform::Windows],
    );
    let user_id = create_test_user(&mut persistence, &unique_name("holder"));
    let assignment_id = persistence
        .create_assignment(&draft(user_id, software_id, None))
        .expect("Failed to create assignment");

    let mut holder = mysql::initialize_database(&url).expect("Failed to open first connection");
    let mut waiter = MysqlConnection::establish(&url).expect("Failed to open second connection");
    diesel::sql_query("SET SESSION innodb_lock_wait_timeout = 1")
        .execute(&mut waiter)
        .expect("Failed to shorten lock wait");

    let blocked = mysql::write_transaction(&mut holder, |conn| {
        let held = mysql::lock_assignments(conn, &[assignment_id])?;
        assert_eq!(held.len(), 1);
        Ok(mysql::write_transaction(&mut waiter, |conn| {
            mysql::lock_assignments(conn, &[assignment_id])
        })
        .is_err())
    })
    .expect("Holder transaction failed");
    assert!(blocked, "A second writer must wait for the assignment row");

    let released = mysql::write_transaction(&mut waiter, |conn| {
        mysql::lock_assignments(conn, &[assignment_id])
    });
    assert!(released.is_ok(), "Lock should be released on commit");
}

#[test]
#[ignore = "requires MariaDB via cargo xtask test-mariadb"]
fn test_mariadb_update_after_delete_takes_no_seat() {
    verify_mariadb_test_environment();
    let url = get_mariadb_url();

    let mut persistence =
        Persistence::new_with_mysql(&url).expect("Failed to initialize MariaDB persistence");
    let family_id = persistence
        .create_software_family(&unique_name("family"))
        .expect("Failed to create family");
    let software_id = create_test_software(
        &mut persistence,
        family_id,
        &unique_name("software"),
        &[Platform::Windows],
    );
    let license_id = persistence
        .create_license(&perpetual_fields(family_id, 1))
        .expect("Failed to create license");
    persistence
        .add_licensed_software(license_id, software_id, Platform::All, "")
        .expect("Failed to cover software");
    let user_id = create_test_user(&mut persistence, &unique_name("user"));
    let assignment_id = persistence
        .create_assignment(&draft(user_id, software_id, None))
        .expect("Failed to create assignment");
    persistence
        .delete_assignments(&[assignment_id])
        .expect("Failed to delete assignment");

    let result =
        persistence.update_assignment(assignment_id, &draft(user_id, software_id, Some(license_id)));

    assert!(matches!(result, Err(PersistenceError::NotFound(_))));
    assert_eq!(
        persistence.get_license(license_id).unwrap().used_total,
        0
    );
}
