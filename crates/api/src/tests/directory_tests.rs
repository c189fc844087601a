// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use time::{Date, Month};

use crate::{
    ApiError, DirectoryImportError, ListUsersQuery, SetActiveRequest, SyncDirectoryRequest,
    get_audit_trail, list_users, parse_directory_csv, set_user_active, sync_directory,
};

use super::helpers::{add_user, create_test_cause, create_test_operator, create_test_store};

const EXPORT: &str = "\
Primary Email,Given Name,Family Name,Suspended,Creation Time
alice@example.com,Alice,Tester,True,2024-01-02T09:00:00.000Z
carol@example.com,Carol,Smith,False,2025-06-01T10:30:00.000Z
";

#[test]
fn test_export_headers_are_normalized() {
    let entries = parse_directory_csv(EXPORT).unwrap();

    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].primary_email, "alice@example.com");
    assert!(entries[0].suspended);
    assert_eq!(entries[1].given_name, "Carol");
    assert!(!entries[1].suspended);
    assert_eq!(
        entries[1].created_on,
        Some(Date::from_calendar_date(2025, Month::June, 1).unwrap())
    );
}

#[test]
fn test_missing_headers_are_reported() {
    let result = parse_directory_csv("primary_email,given_name\nx@example.com,X\n");

    assert_eq!(
        result,
        Err(DirectoryImportError::MissingHeaders(vec![
            String::from("family_name"),
            String::from("suspended"),
        ]))
    );
}

#[test]
fn test_bad_row_fails_the_whole_import() {
    let content = "\
primary_email,given_name,family_name,suspended
ok@example.com,Ok,User,false
bad@example.com,Bad,User,maybe
";

    let result = parse_directory_csv(content);

    assert!(matches!(
        result,
        Err(DirectoryImportError::InvalidRow { row: 2, .. })
    ));
}

#[test]
fn test_blank_email_is_an_invalid_row() {
    let content = "primary_email,given_name,family_name,suspended\n,No,Email,false\n";

    let result = parse_directory_csv(content);

    assert!(matches!(
        result,
        Err(DirectoryImportError::InvalidRow { row: 1, .. })
    ));
}

#[test]
fn test_dry_run_reports_without_writing() {
    let mut store = create_test_store();

    let response = sync_directory(
        &mut store.persistence,
        &SyncDirectoryRequest {
            csv_content: EXPORT.to_string(),
            dry_run: true,
        },
        &create_test_operator(),
        create_test_cause(),
    )
    .unwrap();

    assert!(response.dry_run);
    assert_eq!(response.created, vec![String::from("carol")]);
    assert_eq!(response.deactivated, vec![store.alice]);
    let users = list_users(&mut store.persistence, &ListUsersQuery::default()).unwrap();
    assert_eq!(users.users.len(), 2);
    assert!(users.users.iter().all(|u| u.is_active));
}

#[test]
fn test_sync_applies_and_records_one_event() {
    let mut store = create_test_store();

    let response = sync_directory(
        &mut store.persistence,
        &SyncDirectoryRequest {
            csv_content: EXPORT.to_string(),
            dry_run: false,
        },
        &create_test_operator(),
        create_test_cause(),
    )
    .unwrap();

    assert!(!response.dry_run);
    assert_eq!(response.deactivated, vec![store.alice]);
    let active = list_users(
        &mut store.persistence,
        &ListUsersQuery {
            search: None,
            active_only: true,
        },
    )
    .unwrap();
    let names: Vec<&str> = active.users.iter().map(|u| u.username.as_str()).collect();
    assert_eq!(names, vec!["bob", "carol"]);
    let trail = get_audit_trail(&mut store.persistence, "user", None).unwrap();
    let syncs = trail
        .events
        .iter()
        .filter(|e| e.action.name == "SyncDirectory")
        .count();
    assert_eq!(syncs, 1);
}

#[test]
fn test_malformed_export_is_invalid_input() {
    let mut store = create_test_store();

    let result = sync_directory(
        &mut store.persistence,
        &SyncDirectoryRequest {
            csv_content: String::from("email\nx@example.com\n"),
            dry_run: false,
        },
        &create_test_operator(),
        create_test_cause(),
    );

    assert!(matches!(
        result,
        Err(ApiError::InvalidInput { ref field, .. }) if field == "csv"
    ));
}

#[test]
fn test_user_search_and_deactivation() {
    let mut store = create_test_store();
    add_user(&mut store.persistence, "albert");

    set_user_active(
        &mut store.persistence,
        store.alice,
        SetActiveRequest { is_active: false },
        &create_test_operator(),
        create_test_cause(),
    )
    .unwrap();

    let all = list_users(
        &mut store.persistence,
        &ListUsersQuery {
            search: Some(String::from("al")),
            active_only: false,
        },
    )
    .unwrap();
    assert_eq!(all.users.len(), 2);
    let active = list_users(
        &mut store.persistence,
        &ListUsersQuery {
            search: Some(String::from("al")),
            active_only: true,
        },
    )
    .unwrap();
    assert_eq!(active.users.len(), 1);
    assert_eq!(active.users[0].username, "albert");
}

#[test]
fn test_deactivating_missing_user_is_not_found() {
    let mut store = create_test_store();

    let result = set_user_active(
        &mut store.persistence,
        9999,
        SetActiveRequest { is_active: false },
        &create_test_operator(),
        create_test_cause(),
    );

    assert!(matches!(result, Err(ApiError::ResourceNotFound { .. })));
}
