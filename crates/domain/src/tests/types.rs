// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use std::str::FromStr;
use time::macros::date;

use crate::{
    ActivationType, AssetStatus, DomainError, ExchangeStatus, LicenseType, Platform, Software,
    User, format_date, parse_date,
};

fn create_test_software(name: &str, platforms: Vec<Platform>) -> Software {
    Software {
        software_id: 1,
        software_family_id: 10,
        family_name: String::from("Adobe"),
        name: name.to_string(),
        version: String::new(),
        platforms,
    }
}

#[test]
fn test_platform_round_trips_through_storage_string() {
    for platform in Platform::ALL {
        assert_eq!(Platform::from_str(platform.as_str()), Ok(platform));
    }
}

#[test]
fn test_platform_parse_is_case_insensitive() {
    assert_eq!(Platform::from_str("MacOS"), Ok(Platform::MacOs));
}

#[test]
fn test_platform_rejects_unknown_value() {
    assert_eq!(
        Platform::from_str("beos"),
        Err(DomainError::UnknownVariant {
            kind: "platform",
            value: String::from("beos"),
        })
    );
}

#[test]
fn test_all_platform_covers_every_platform() {
    assert!(Platform::All.covers(Platform::Linux));
    assert!(Platform::All.covers(Platform::Windows));
    assert!(Platform::Linux.covers(Platform::Linux));
    assert!(!Platform::Linux.covers(Platform::Windows));
    assert!(!Platform::Windows.covers(Platform::All));
}

#[test]
fn test_platform_serializes_lowercase() {
    let json: String = serde_json::to_string(&Platform::MacOs).unwrap();
    assert_eq!(json, "\"macos\"");
}

#[test]
fn test_activation_types_order_single_first() {
    let mut types: Vec<ActivationType> = vec![
        ActivationType::Server,
        ActivationType::Single,
        ActivationType::Volume,
    ];
    types.sort();
    assert_eq!(
        types,
        vec![
            ActivationType::Single,
            ActivationType::Volume,
            ActivationType::Server
        ]
    );
    assert!(ActivationType::Single.is_exclusive());
    assert!(!ActivationType::Volume.is_exclusive());
}

#[test]
fn test_license_type_display_names() {
    assert_eq!(LicenseType::Perpetual.to_string(), "Perpetual");
    assert_eq!(LicenseType::Subscription.to_string(), "Subscription-based");
    assert_eq!(LicenseType::Oem.to_string(), "OEM");
    assert_eq!(LicenseType::from_str("oem"), Ok(LicenseType::Oem));
}

#[test]
fn test_stored_enums_parse_their_own_output() {
    assert_eq!(
        AssetStatus::from_str(AssetStatus::NotFound.as_str()),
        Ok(AssetStatus::NotFound)
    );
    assert_eq!(
        ExchangeStatus::from_str("taken"),
        Ok(ExchangeStatus::Taken)
    );
    assert!(ExchangeStatus::from_str("Taken").is_err());
}

#[test]
fn test_software_full_name_trims_empty_product_name() {
    let software: Software = create_test_software("", vec![Platform::Windows]);
    assert_eq!(software.full_name(), "Adobe");

    let software: Software = create_test_software("Photoshop", vec![Platform::Windows]);
    assert_eq!(software.full_name(), "Adobe Photoshop");
}

#[test]
fn test_software_display_includes_version() {
    let mut software: Software = create_test_software("Acrobat", vec![Platform::Windows]);
    software.version = String::from("12.*");
    assert_eq!(software.to_string(), "Adobe Acrobat 12.*");
}

#[test]
fn test_software_supports_only_listed_platforms() {
    let software: Software =
        create_test_software("Photoshop", vec![Platform::Windows, Platform::MacOs]);
    assert!(software.supports(Platform::MacOs));
    assert!(!software.supports(Platform::Linux));
}

#[test]
fn test_user_display_name_falls_back_to_username() {
    let user: User = User {
        user_id: 1,
        username: String::from("jdoe"),
        email: String::from("jdoe@example.com"),
        first_name: String::new(),
        last_name: String::new(),
        is_active: true,
        date_joined: None,
    };
    assert_eq!(user.display_name(), "jdoe");
}

#[test]
fn test_date_parse_and_format() {
    let parsed = parse_date("2026-03-09").unwrap();
    assert_eq!(parsed, date!(2026 - 03 - 09));
    assert_eq!(format_date(parsed), "2026-03-09");
    assert!(matches!(
        parse_date("2026-13-01"),
        Err(DomainError::DateParseError { .. })
    ));
}

#[test]
fn test_formatted_dates_are_zero_padded_and_parse_back() {
    let early = date!(999 - 01 - 05);
    assert_eq!(format_date(early), "0999-01-05");
    assert_eq!(parse_date(&format_date(early)).unwrap(), early);

    let last = date!(9999 - 12 - 31);
    assert_eq!(format_date(last), "9999-12-31");
    assert_eq!(parse_date(&format_date(last)).unwrap(), last);
}
