// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use lms::CoreError;
use lms_domain::DomainError;
use lms_persistence::PersistenceError;

use crate::{
    ApiError, translate_core_error, translate_domain_error, translate_persistence_error,
};

#[test]
fn test_seat_shortage_names_its_rule() {
    let err = translate_domain_error(DomainError::NotEnoughLicenses {
        license_id: 3,
        requested: 1,
        remaining: 0,
    });

    assert!(matches!(
        err,
        ApiError::DomainRuleViolation { ref rule, .. } if rule == "seat_capacity"
    ));
}

#[test]
fn test_unknown_variant_points_at_its_kind() {
    let err = translate_domain_error(DomainError::UnknownVariant {
        kind: "platform",
        value: String::from("beos"),
    });

    assert!(matches!(
        err,
        ApiError::InvalidInput { ref field, ref message }
            if field == "platform" && message.contains("beos")
    ));
}

#[test]
fn test_not_found_keeps_the_resource_type() {
    let err = translate_persistence_error(PersistenceError::NotFound(String::from("Asset 12")));

    assert_eq!(
        err,
        ApiError::ResourceNotFound {
            resource_type: String::from("Asset"),
            message: String::from("Asset 12 does not exist"),
        }
    );
}

#[test]
fn test_conflicts_are_rule_violations() {
    let err = translate_persistence_error(PersistenceError::Conflict(String::from(
        "Username alice is taken",
    )));

    assert!(matches!(
        err,
        ApiError::DomainRuleViolation { ref rule, .. } if rule == "unique"
    ));
}

#[test]
fn test_storage_failures_are_internal() {
    let err = translate_persistence_error(PersistenceError::ForeignKeyEnforcementNotEnabled);

    assert!(matches!(err, ApiError::Internal { .. }));
}

#[test]
fn test_unknown_software_is_not_found() {
    let err = translate_core_error(CoreError::UnknownSoftware(4));

    assert!(matches!(
        err,
        ApiError::ResourceNotFound { ref resource_type, .. } if resource_type == "Software"
    ));
}
