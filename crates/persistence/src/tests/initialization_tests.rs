// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Backend initialization tests.
//!
//! Migrations and foreign key enforcement are also exercised implicitly by
//! every other test that calls `Persistence::new_in_memory()`.

use crate::{Persistence, PersistenceError};

use super::create_test_user;

#[test]
fn test_persistence_initialization() {
    let result: Result<Persistence, PersistenceError> = Persistence::new_in_memory();
    assert!(result.is_ok());
}

#[test]
fn test_foreign_keys_are_enforced() {
    let mut persistence = Persistence::new_in_memory().unwrap();
    persistence.verify_foreign_key_enforcement().unwrap();

    // Software for a family that does not exist
    let result = persistence.create_software(&crate::NewSoftware {
        software_family_id: 999,
        name: String::from("Ghost"),
        version: String::new(),
        platforms: vec![lms_domain::Platform::Linux],
    });
    assert!(matches!(
        result,
        Err(PersistenceError::ReferenceViolation(_) | PersistenceError::DatabaseError(_))
    ));
}

#[test]
fn test_multiple_in_memory_instances_are_isolated() {
    let mut db1 = Persistence::new_in_memory().unwrap();
    let mut db2 = Persistence::new_in_memory().unwrap();

    create_test_user(&mut db1, "alice");

    assert_eq!(db1.list_users(None, false).unwrap().len(), 1);
    assert!(db2.list_users(None, false).unwrap().is_empty());
}

#[test]
fn test_file_database_persists_between_connections() {
    let path = std::env::temp_dir().join(format!(
        "lms_init_test_{}.sqlite3",
        std::process::id()
    ));
    let _ = std::fs::remove_file(&path);

    {
        let mut persistence = Persistence::new_with_file(&path).unwrap();
        create_test_user(&mut persistence, "carol");
    }
    {
        let mut persistence = Persistence::new_with_file(&path).unwrap();
        let users = persistence.list_users(Some("car"), true).unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].username, "carol");
    }

    let _ = std::fs::remove_file(&path);
    let _ = std::fs::remove_file(path.with_extension("sqlite3-wal"));
    let _ = std::fs::remove_file(path.with_extension("sqlite3-shm"));
}
