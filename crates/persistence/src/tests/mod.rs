// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![allow(clippy::expect_used, clippy::unwrap_used)]

mod assignment_tests;
mod asset_tests;
mod backend_validation_tests;
mod initialization_tests;

use time::Date;

use lms::UserDraft;
use lms_audit::{Actor, Cause};
use lms_domain::{AssignmentDraft, LicenseType, Platform};

use crate::{LicenseFields, NewSoftware, Persistence};

pub fn create_test_actor() -> Actor {
    Actor::new(String::from("test-actor"), String::from("operator"))
}

pub fn create_test_cause() -> Cause {
    Cause::new(String::from("test-cause"), String::from("Test operation"))
}

pub fn date(year: i32, month: time::Month, day: u8) -> Date {
    Date::from_calendar_date(year, month, day).expect("Valid test date")
}

pub fn create_test_user(persistence: &mut Persistence, username: &str) -> i64 {
    persistence
        .create_user(&UserDraft {
            username: username.to_string(),
            email: format!("{username}@example.com"),
            first_name: username.to_string(),
            last_name: String::from("Tester"),
            is_active: true,
            date_joined: None,
        })
        .expect("Failed to create user")
}

pub fn create_test_software(
    persistence: &mut Persistence,
    family_id: i64,
    name: &str,
    platforms: &[Platform],
) -> i64 {
    persistence
        .create_software(&NewSoftware {
            software_family_id: family_id,
            name: name.to_string(),
            version: String::new(),
            platforms: platforms.to_vec(),
        })
        .expect("Failed to create software")
}

pub fn perpetual_fields(family_id: i64, total: u32) -> LicenseFields {
    LicenseFields {
        software_family_id: family_id,
        license_type: LicenseType::Perpetual,
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

/// Creates a perpetual license covering `software_ids` on every platform.
pub fn create_test_license(
    persistence: &mut Persistence,
    family_id: i64,
    total: u32,
    software_ids: &[i64],
) -> i64 {
    let license_id: i64 = persistence
        .create_license(&perpetual_fields(family_id, total))
        .expect("Failed to create license");
    for software_id in software_ids {
        persistence
            .add_licensed_software(license_id, *software_id, Platform::All, "")
            .expect("Failed to cover software");
    }
    license_id
}

pub fn draft(user_id: i64, software_id: i64, license_id: Option<i64>) -> AssignmentDraft {
    AssignmentDraft {
        user_id,
        software_id,
        platform: Some(Platform::Windows),
        license_id,
        license_key_id: None,
        note: String::new(),
    }
}

/// A catalog with one family ("Adobe") and two softwares running on
/// Windows and macOS.
pub struct Catalog {
    pub persistence: Persistence,
    pub family_id: i64,
    pub photoshop_id: i64,
    pub illustrator_id: i64,
}

pub fn create_test_catalog() -> Catalog {
    let mut persistence: Persistence =
        Persistence::new_in_memory().expect("Failed to create persistence");
    let family_id: i64 = persistence
        .create_software_family("Adobe")
        .expect("Failed to create family");
    let photoshop_id: i64 = create_test_software(
        &mut persistence,
        family_id,
        "Photoshop",
        &[Platform::Windows, Platform::MacOs],
    );
    let illustrator_id: i64 = create_test_software(
        &mut persistence,
        family_id,
        "Illustrator",
        &[Platform::Windows, Platform::MacOs],
    );
    Catalog {
        persistence,
        family_id,
        photoshop_id,
        illustrator_id,
    }
}
