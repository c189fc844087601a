// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use lms_audit::{Actor, Cause};
use lms_domain::{
    ActivationType, License, LicenseKey, LicenseType, LicensedSoftware, Platform, Software,
};

use crate::LicenseCandidate;

pub fn create_test_actor() -> Actor {
    Actor::new(String::from("operator-1"), String::from("operator"))
}

pub fn create_test_cause() -> Cause {
    Cause::new(String::from("req-456"), String::from("Onboarding batch"))
}

pub fn create_test_software(software_id: i64, platforms: Vec<Platform>) -> Software {
    Software {
        software_id,
        software_family_id: 10,
        family_name: String::from("Adobe"),
        name: format!("Product {software_id}"),
        version: String::new(),
        platforms,
    }
}

pub fn create_test_license(license_id: i64, total: u32, used_total: u32) -> License {
    License {
        license_id,
        description: format!("Adobe Perpetual Licenses #{license_id:03}"),
        is_active: true,
        software_family_id: 10,
        total,
        used_total,
        license_type: LicenseType::Perpetual,
        oem_device: None,
        supplier_id: None,
        license_number: String::new(),
        purchased_date: None,
        started_date: None,
        ended_date: None,
        note: String::new(),
    }
}

/// A license covering each software in `software_ids` on `platform`.
///
/// Licensed software ids are `license_id * 100 + software_id`.
pub fn create_test_candidate(
    license_id: i64,
    total: u32,
    used_total: u32,
    software_ids: &[i64],
    platform: Platform,
) -> LicenseCandidate {
    LicenseCandidate {
        license: create_test_license(license_id, total, used_total),
        coverage: software_ids
            .iter()
            .map(|software_id| LicensedSoftware {
                licensed_software_id: license_id * 100 + software_id,
                license_id,
                software_id: *software_id,
                platform,
                note: String::new(),
            })
            .collect(),
    }
}

pub fn create_test_key(
    license_key_id: i64,
    licensed_software_id: i64,
    activation_type: ActivationType,
) -> LicenseKey {
    LicenseKey {
        license_key_id,
        licensed_software_id,
        serial_key: format!("KEY-{license_key_id}"),
        activation_type,
    }
}
