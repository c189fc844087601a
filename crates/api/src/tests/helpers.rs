// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use lms_audit::Cause;
use lms_persistence::Persistence;

use crate::{
    AddLicensedSoftwareRequest, AuthenticatedActor, CreateSoftwareFamilyRequest,
    CreateSoftwareRequest, CreateUserRequest, LicenseRequest, add_licensed_software,
    create_license, create_software, create_software_family, create_user,
};

pub fn create_test_operator() -> AuthenticatedActor {
    AuthenticatedActor::operator("it-desk").unwrap()
}

pub fn create_test_cause() -> Cause {
    Cause::new(String::from("api-req-1"), String::from("API request"))
}

pub fn add_user(persistence: &mut Persistence, username: &str) -> i64 {
    create_user(
        persistence,
        &CreateUserRequest {
            username: username.to_string(),
            email: format!("{username}@example.com"),
            first_name: username.to_string(),
            last_name: String::from("Tester"),
            date_joined: None,
        },
        &create_test_operator(),
        create_test_cause(),
    )
    .unwrap()
    .id
}

pub fn perpetual_request(family_id: i64, total: u32) -> LicenseRequest {
    LicenseRequest {
        software_family_id: family_id,
        license_type: String::from("perpetual"),
        total,
        oem_device: None,
        supplier_id: None,
        license_number: String::new(),
        purchased_date: None,
        started_date: None,
        ended_date: None,
        note: String::new(),
    }
}

/// Creates a license covering `software_ids` on every platform.
pub fn add_license(
    persistence: &mut Persistence,
    family_id: i64,
    total: u32,
    software_ids: &[i64],
) -> i64 {
    let license_id: i64 = create_license(
        persistence,
        &perpetual_request(family_id, total),
        &create_test_operator(),
        create_test_cause(),
    )
    .unwrap()
    .license
    .license_id;
    for software_id in software_ids {
        add_licensed_software(
            persistence,
            license_id,
            &AddLicensedSoftwareRequest {
                software_id: *software_id,
                platform: None,
                note: String::new(),
            },
            &create_test_operator(),
            create_test_cause(),
        )
        .unwrap();
    }
    license_id
}

/// A store with one family ("Adobe") holding Photoshop, which runs on
/// Windows and macOS, and two users.
pub struct TestStore {
    pub persistence: Persistence,
    pub family_id: i64,
    pub photoshop_id: i64,
    pub alice: i64,
    pub bob: i64,
}

pub fn create_test_store() -> TestStore {
    let mut persistence: Persistence =
        Persistence::new_in_memory().expect("Failed to create persistence");
    let family_id: i64 = create_software_family(
        &mut persistence,
        &CreateSoftwareFamilyRequest {
            name: String::from("Adobe"),
        },
        &create_test_operator(),
        create_test_cause(),
    )
    .unwrap()
    .id;
    let photoshop_id: i64 = create_software(
        &mut persistence,
        &CreateSoftwareRequest {
            software_family_id: family_id,
            name: String::from("Photoshop"),
            version: String::from("2026"),
            platforms: vec![String::from("windows"), String::from("macos")],
        },
        &create_test_operator(),
        create_test_cause(),
    )
    .unwrap()
    .id;
    let alice: i64 = add_user(&mut persistence, "alice");
    let bob: i64 = add_user(&mut persistence, "bob");
    TestStore {
        persistence,
        family_id,
        photoshop_id,
        alice,
        bob,
    }
}
