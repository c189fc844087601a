// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::{DomainError, Platform};

#[test]
fn test_not_enough_licenses_message_names_the_license() {
    let err: DomainError = DomainError::NotEnoughLicenses {
        license_id: 7,
        requested: 2,
        remaining: 1,
    };
    let message: String = err.to_string();
    assert!(message.starts_with("Not enough license"));
    assert!(message.contains("license 7"));
}

#[test]
fn test_term_too_short_reports_negative_delta_as_ordering() {
    let err: DomainError = DomainError::TermTooShort {
        reference: "start date",
        days: -3,
        minimum: 30,
    };
    assert_eq!(err.to_string(), "End date must be after start date");
}

#[test]
fn test_term_too_short_reports_minimum() {
    let err: DomainError = DomainError::TermTooShort {
        reference: "purchased date",
        days: 12,
        minimum: 30,
    };
    assert_eq!(
        err.to_string(),
        "End date must be at least 30 days after purchased date (got 12)"
    );
}

#[test]
fn test_platform_mismatch_uses_display_name() {
    let err: DomainError = DomainError::KeyPlatformMismatch {
        license_key_id: 3,
        platform: Platform::MacOs,
    };
    assert_eq!(
        err.to_string(),
        "Platform mismatch: key 3 cannot be used on MacOS"
    );
}

#[test]
fn test_domain_error_is_std_error() {
    let err: Box<dyn std::error::Error> = Box::new(DomainError::MissingOemDevice);
    assert_eq!(err.to_string(), "OEM licenses need an OEM device");
}
