// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::{
    AddLicenseKeyRequest, AddLicensedSoftwareRequest, ApiError, AssignmentRequest,
    AvailableKeysQuery, AvailableLicensesQuery, SetActiveRequest, add_license_key,
    add_licensed_software, available_keys, available_licenses, create_assignment,
    create_license, get_audit_trail, get_license, list_softwares, set_license_active,
    update_license,
};

use super::helpers::{
    TestStore, add_license, create_test_cause, create_test_operator, create_test_store,
    perpetual_request,
};

fn assign(store: &mut TestStore, user_id: i64, license_id: Option<i64>) -> Result<i64, ApiError> {
    create_assignment(
        &mut store.persistence,
        &AssignmentRequest {
            user_id,
            software_id: store.photoshop_id,
            platform: Some(String::from("windows")),
            license_id,
            license_key_id: None,
            note: String::new(),
        },
        &create_test_operator(),
        create_test_cause(),
    )
    .map(|response| response.assignment.assignment_id)
}

#[test]
fn test_software_list_shows_display_names() {
    let mut store = create_test_store();

    let response = list_softwares(&mut store.persistence, Some(store.family_id)).unwrap();

    assert_eq!(response.softwares.len(), 1);
    assert_eq!(response.softwares[0].display_name, "Adobe Photoshop 2026");
}

#[test]
fn test_create_license_records_audit_event() {
    let mut store = create_test_store();

    let response = create_license(
        &mut store.persistence,
        &perpetual_request(store.family_id, 5),
        &create_test_operator(),
        create_test_cause(),
    )
    .unwrap();

    assert_eq!(response.license.description, "Adobe Perpetual Licenses #001");
    assert_eq!(response.license.used_total, 0);
    let trail = get_audit_trail(
        &mut store.persistence,
        "license",
        Some(response.license.license_id),
    )
    .unwrap();
    assert_eq!(trail.events.len(), 1);
    assert_eq!(trail.events[0].action.name, "CreateLicense");
    assert_eq!(trail.events[0].actor.id, "it-desk");
    assert_eq!(trail.events[0].actor.actor_type, "operator");
}

#[test]
fn test_unknown_license_type_is_invalid_input() {
    let mut store = create_test_store();
    let mut request = perpetual_request(store.family_id, 5);
    request.license_type = String::from("rental");

    let result = create_license(
        &mut store.persistence,
        &request,
        &create_test_operator(),
        create_test_cause(),
    );

    assert!(matches!(
        result,
        Err(ApiError::InvalidInput { ref field, .. }) if field == "license_type"
    ));
}

#[test]
fn test_malformed_date_is_invalid_input() {
    let mut store = create_test_store();
    let mut request = perpetual_request(store.family_id, 5);
    request.purchased_date = Some(String::from("01/02/2026"));

    let result = create_license(
        &mut store.persistence,
        &request,
        &create_test_operator(),
        create_test_cause(),
    );

    assert!(matches!(
        result,
        Err(ApiError::InvalidInput { ref field, .. }) if field == "purchased_date"
    ));
}

#[test]
fn test_full_license_rejects_another_seat() {
    let mut store = create_test_store();
    let license_id = add_license(
        &mut store.persistence,
        store.family_id,
        1,
        &[store.photoshop_id],
    );
    let alice = store.alice;
    let bob = store.bob;

    assign(&mut store, alice, Some(license_id)).unwrap();
    let result = assign(&mut store, bob, Some(license_id));

    assert!(matches!(
        result,
        Err(ApiError::DomainRuleViolation { ref rule, .. }) if rule == "seat_capacity"
    ));
    let detail = get_license(&mut store.persistence, license_id).unwrap();
    assert_eq!(detail.license.used_total, 1);
    assert_eq!(detail.remaining, 0);
}

#[test]
fn test_total_cannot_drop_below_used_seats() {
    let mut store = create_test_store();
    let license_id = add_license(
        &mut store.persistence,
        store.family_id,
        2,
        &[store.photoshop_id],
    );
    let alice = store.alice;
    let bob = store.bob;
    assign(&mut store, alice, Some(license_id)).unwrap();
    assign(&mut store, bob, Some(license_id)).unwrap();

    let result = update_license(
        &mut store.persistence,
        license_id,
        &perpetual_request(store.family_id, 1),
        &create_test_operator(),
        create_test_cause(),
    );

    assert!(matches!(
        result,
        Err(ApiError::DomainRuleViolation { ref rule, .. }) if rule == "total_covers_used_seats"
    ));
}

#[test]
fn test_update_license_keeps_used_seats() {
    let mut store = create_test_store();
    let license_id = add_license(
        &mut store.persistence,
        store.family_id,
        2,
        &[store.photoshop_id],
    );
    let alice = store.alice;
    assign(&mut store, alice, Some(license_id)).unwrap();

    let response = update_license(
        &mut store.persistence,
        license_id,
        &perpetual_request(store.family_id, 10),
        &create_test_operator(),
        create_test_cause(),
    )
    .unwrap();

    assert_eq!(response.license.total, 10);
    assert_eq!(response.license.used_total, 1);
    let trail = get_audit_trail(&mut store.persistence, "license", Some(license_id)).unwrap();
    assert_eq!(trail.events.last().unwrap().action.name, "UpdateLicense");
}

#[test]
fn test_deactivated_license_is_not_offered() {
    let mut store = create_test_store();
    let license_id = add_license(
        &mut store.persistence,
        store.family_id,
        3,
        &[store.photoshop_id],
    );

    set_license_active(
        &mut store.persistence,
        license_id,
        SetActiveRequest { is_active: false },
        &create_test_operator(),
        create_test_cause(),
    )
    .unwrap();

    let available = available_licenses(
        &mut store.persistence,
        &AvailableLicensesQuery {
            software_ids: vec![store.photoshop_id],
            platform: Some(String::from("windows")),
            current_license_id: None,
        },
    )
    .unwrap();
    assert!(available.licenses.is_empty());
    let alice = store.alice;
    let result = assign(&mut store, alice, Some(license_id));
    assert!(matches!(
        result,
        Err(ApiError::DomainRuleViolation { ref rule, .. }) if rule == "active_license"
    ));
}

#[test]
fn test_available_licenses_prefer_nearly_full_ones() {
    let mut store = create_test_store();
    let roomy = add_license(
        &mut store.persistence,
        store.family_id,
        10,
        &[store.photoshop_id],
    );
    let tight = add_license(
        &mut store.persistence,
        store.family_id,
        2,
        &[store.photoshop_id],
    );

    let available = available_licenses(
        &mut store.persistence,
        &AvailableLicensesQuery {
            software_ids: vec![store.photoshop_id],
            platform: None,
            current_license_id: None,
        },
    )
    .unwrap();

    let ids: Vec<i64> = available.licenses.iter().map(|l| l.license_id).collect();
    assert_eq!(ids, vec![tight, roomy]);
    assert_eq!(available.licenses[0].remaining, 2);
}

#[test]
fn test_held_single_key_is_not_offered_again() {
    let mut store = create_test_store();
    let license_id = add_license(&mut store.persistence, store.family_id, 5, &[]);
    let licensed_software_id = add_licensed_software(
        &mut store.persistence,
        license_id,
        &AddLicensedSoftwareRequest {
            software_id: store.photoshop_id,
            platform: Some(String::from("windows")),
            note: String::new(),
        },
        &create_test_operator(),
        create_test_cause(),
    )
    .unwrap()
    .id;
    let key_id = add_license_key(
        &mut store.persistence,
        licensed_software_id,
        &AddLicenseKeyRequest {
            serial_key: String::from("AAAA-BBBB"),
            activation_type: String::from("single"),
        },
        &create_test_operator(),
        create_test_cause(),
    )
    .unwrap()
    .id;

    create_assignment(
        &mut store.persistence,
        &AssignmentRequest {
            user_id: store.alice,
            software_id: store.photoshop_id,
            platform: Some(String::from("windows")),
            license_id: Some(license_id),
            license_key_id: Some(key_id),
            note: String::new(),
        },
        &create_test_operator(),
        create_test_cause(),
    )
    .unwrap();

    let query = AvailableKeysQuery {
        license_id,
        software_id: store.photoshop_id,
        platform: Some(String::from("windows")),
        current_license_key_id: None,
    };
    assert!(
        available_keys(&mut store.persistence, &query)
            .unwrap()
            .keys
            .is_empty()
    );
    let editing = AvailableKeysQuery {
        current_license_key_id: Some(key_id),
        ..query
    };
    assert_eq!(
        available_keys(&mut store.persistence, &editing)
            .unwrap()
            .keys
            .len(),
        1
    );

    let result = create_assignment(
        &mut store.persistence,
        &AssignmentRequest {
            user_id: store.bob,
            software_id: store.photoshop_id,
            platform: Some(String::from("windows")),
            license_id: Some(license_id),
            license_key_id: Some(key_id),
            note: String::new(),
        },
        &create_test_operator(),
        create_test_cause(),
    );
    assert!(matches!(
        result,
        Err(ApiError::DomainRuleViolation { ref rule, .. }) if rule == "single_activation_key"
    ));
}

#[test]
fn test_unknown_activation_type_is_invalid_input() {
    let mut store = create_test_store();
    let license_id = add_license(
        &mut store.persistence,
        store.family_id,
        5,
        &[store.photoshop_id],
    );
    let detail = get_license(&mut store.persistence, license_id).unwrap();

    let result = add_license_key(
        &mut store.persistence,
        detail.softwares[0].licensed_software_id,
        &AddLicenseKeyRequest {
            serial_key: String::from("CCCC"),
            activation_type: String::from("unlimited"),
        },
        &create_test_operator(),
        create_test_cause(),
    );

    assert!(matches!(
        result,
        Err(ApiError::InvalidInput { ref field, .. }) if field == "activation_type"
    ));
}

#[test]
fn test_missing_license_is_not_found() {
    let mut store = create_test_store();

    let result = get_license(&mut store.persistence, 999);

    assert!(matches!(
        result,
        Err(ApiError::ResourceNotFound { ref resource_type, .. }) if resource_type == "License"
    ));
}
