// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Seat bookkeeping through single assignments.

use lms_domain::{ActivationType, AssignmentDraft, DomainError, Platform};

use crate::{AssignmentFilter, PersistenceError};

use super::{
    Catalog, create_test_catalog, create_test_license, create_test_software, create_test_user,
    draft,
};

/// Adds a key to the only licensed software of `license_id`.
fn add_key(
    persistence: &mut crate::Persistence,
    license_id: i64,
    serial: &str,
    activation_type: ActivationType,
) -> i64 {
    let coverage = persistence.list_licensed_softwares(&[license_id]).unwrap();
    persistence
        .add_license_key(coverage[0].licensed_software_id, serial, activation_type)
        .unwrap()
}

#[test]
fn test_assignment_reserves_a_seat() {
    let Catalog {
        mut persistence,
        family_id,
        photoshop_id,
        ..
    } = create_test_catalog();
    let license_id = create_test_license(&mut persistence, family_id, 2, &[photoshop_id]);
    let alice = create_test_user(&mut persistence, "alice");

    let assignment_id = persistence
        .create_assignment(&draft(alice, photoshop_id, Some(license_id)))
        .unwrap();

    assert_eq!(persistence.get_license(license_id).unwrap().used_total, 1);
    let stored = persistence.get_assignment(assignment_id).unwrap();
    assert_eq!(stored.license_id, Some(license_id));
    assert_eq!(stored.platform, Some(Platform::Windows));
}

#[test]
fn test_full_license_rejects_assignment_without_writing() {
    let Catalog {
        mut persistence,
        family_id,
        photoshop_id,
        ..
    } = create_test_catalog();
    let license_id = create_test_license(&mut persistence, family_id, 1, &[photoshop_id]);
    let alice = create_test_user(&mut persistence, "alice");
    let bob = create_test_user(&mut persistence, "bob");
    persistence
        .create_assignment(&draft(alice, photoshop_id, Some(license_id)))
        .unwrap();

    let result = persistence.create_assignment(&draft(bob, photoshop_id, Some(license_id)));

    assert!(matches!(
        result,
        Err(PersistenceError::DomainViolation(
            DomainError::NotEnoughLicenses { .. }
        ))
    ));
    assert_eq!(persistence.get_license(license_id).unwrap().used_total, 1);
    let bobs = persistence
        .list_assignments(AssignmentFilter {
            user_id: Some(bob),
            ..AssignmentFilter::default()
        })
        .unwrap();
    assert!(bobs.is_empty());
}

#[test]
fn test_unlicensed_assignment_takes_no_seat() {
    let Catalog {
        mut persistence,
        family_id,
        photoshop_id,
        ..
    } = create_test_catalog();
    let license_id = create_test_license(&mut persistence, family_id, 1, &[photoshop_id]);
    let alice = create_test_user(&mut persistence, "alice");

    persistence
        .create_assignment(&draft(alice, photoshop_id, None))
        .unwrap();

    assert_eq!(persistence.get_license(license_id).unwrap().used_total, 0);
}

#[test]
fn test_license_must_cover_the_software() {
    let Catalog {
        mut persistence,
        family_id,
        photoshop_id,
        illustrator_id,
    } = create_test_catalog();
    let license_id = create_test_license(&mut persistence, family_id, 5, &[photoshop_id]);
    let alice = create_test_user(&mut persistence, "alice");

    let result = persistence.create_assignment(&draft(alice, illustrator_id, Some(license_id)));

    assert!(matches!(
        result,
        Err(PersistenceError::DomainViolation(
            DomainError::LicenseMismatch { .. }
        ))
    ));
}

#[test]
fn test_platform_must_be_supported_by_the_software() {
    let Catalog {
        mut persistence,
        photoshop_id,
        ..
    } = create_test_catalog();
    let alice = create_test_user(&mut persistence, "alice");
    let mut linux = draft(alice, photoshop_id, None);
    linux.platform = Some(Platform::Linux);

    let result = persistence.create_assignment(&linux);

    assert!(matches!(
        result,
        Err(PersistenceError::DomainViolation(
            DomainError::PlatformNotSupported { .. }
        ))
    ));
}

#[test]
fn test_inactive_license_takes_no_new_assignments() {
    let Catalog {
        mut persistence,
        family_id,
        photoshop_id,
        ..
    } = create_test_catalog();
    let license_id = create_test_license(&mut persistence, family_id, 5, &[photoshop_id]);
    let alice = create_test_user(&mut persistence, "alice");
    persistence.set_license_active(license_id, false).unwrap();

    let result = persistence.create_assignment(&draft(alice, photoshop_id, Some(license_id)));

    assert!(matches!(
        result,
        Err(PersistenceError::DomainViolation(DomainError::LicenseInactive(id))) if id == license_id
    ));
}

#[test]
fn test_changing_license_moves_the_seat() {
    let Catalog {
        mut persistence,
        family_id,
        photoshop_id,
        ..
    } = create_test_catalog();
    let first = create_test_license(&mut persistence, family_id, 2, &[photoshop_id]);
    let second = create_test_license(&mut persistence, family_id, 2, &[photoshop_id]);
    let alice = create_test_user(&mut persistence, "alice");
    let assignment_id = persistence
        .create_assignment(&draft(alice, photoshop_id, Some(first)))
        .unwrap();

    let before = persistence
        .update_assignment(assignment_id, &draft(alice, photoshop_id, Some(second)))
        .unwrap();

    assert_eq!(before.license_id, Some(first));
    assert_eq!(persistence.get_license(first).unwrap().used_total, 0);
    assert_eq!(persistence.get_license(second).unwrap().used_total, 1);
    assert_eq!(
        persistence.get_assignment(assignment_id).unwrap().license_id,
        Some(second)
    );
}

#[test]
fn test_editing_note_on_full_license_keeps_the_seat() {
    let Catalog {
        mut persistence,
        family_id,
        photoshop_id,
        ..
    } = create_test_catalog();
    let license_id = create_test_license(&mut persistence, family_id, 1, &[photoshop_id]);
    let alice = create_test_user(&mut persistence, "alice");
    let assignment_id = persistence
        .create_assignment(&draft(alice, photoshop_id, Some(license_id)))
        .unwrap();

    let mut edited: AssignmentDraft = draft(alice, photoshop_id, Some(license_id));
    edited.note = String::from("Design team");
    persistence.update_assignment(assignment_id, &edited).unwrap();

    assert_eq!(persistence.get_license(license_id).unwrap().used_total, 1);
    assert_eq!(
        persistence.get_assignment(assignment_id).unwrap().note,
        "Design team"
    );
}

#[test]
fn test_failed_move_leaves_both_licenses_untouched() {
    let Catalog {
        mut persistence,
        family_id,
        photoshop_id,
        ..
    } = create_test_catalog();
    let first = create_test_license(&mut persistence, family_id, 2, &[photoshop_id]);
    let full = create_test_license(&mut persistence, family_id, 1, &[photoshop_id]);
    let alice = create_test_user(&mut persistence, "alice");
    let bob = create_test_user(&mut persistence, "bob");
    let assignment_id = persistence
        .create_assignment(&draft(alice, photoshop_id, Some(first)))
        .unwrap();
    persistence
        .create_assignment(&draft(bob, photoshop_id, Some(full)))
        .unwrap();

    let result =
        persistence.update_assignment(assignment_id, &draft(alice, photoshop_id, Some(full)));

    assert!(result.is_err());
    assert_eq!(persistence.get_license(first).unwrap().used_total, 1);
    assert_eq!(persistence.get_license(full).unwrap().used_total, 1);
}

#[test]
fn test_deleting_assignments_releases_seats() {
    let Catalog {
        mut persistence,
        family_id,
        photoshop_id,
        illustrator_id,
    } = create_test_catalog();
    let license_id =
        create_test_license(&mut persistence, family_id, 5, &[photoshop_id, illustrator_id]);
    let alice = create_test_user(&mut persistence, "alice");
    let first = persistence
        .create_assignment(&draft(alice, photoshop_id, Some(license_id)))
        .unwrap();
    let second = persistence
        .create_assignment(&draft(alice, illustrator_id, Some(license_id)))
        .unwrap();
    assert_eq!(persistence.get_license(license_id).unwrap().used_total, 2);

    let removed = persistence.delete_assignments(&[first, second]).unwrap();

    assert_eq!(removed.len(), 2);
    assert_eq!(persistence.get_license(license_id).unwrap().used_total, 0);
}

#[test]
fn test_deleting_unknown_assignment_deletes_nothing() {
    let Catalog {
        mut persistence,
        family_id,
        photoshop_id,
        ..
    } = create_test_catalog();
    let license_id = create_test_license(&mut persistence, family_id, 5, &[photoshop_id]);
    let alice = create_test_user(&mut persistence, "alice");
    let assignment_id = persistence
        .create_assignment(&draft(alice, photoshop_id, Some(license_id)))
        .unwrap();

    let result = persistence.delete_assignments(&[assignment_id, 9999]);

    assert!(matches!(result, Err(PersistenceError::NotFound(_))));
    assert!(persistence.get_assignment(assignment_id).is_ok());
    assert_eq!(persistence.get_license(license_id).unwrap().used_total, 1);
}

#[test]
fn test_updating_a_deleted_assignment_takes_no_seat() {
    let Catalog {
        mut persistence,
        family_id,
        photoshop_id,
        ..
    } = create_test_catalog();
    let first = create_test_license(&mut persistence, family_id, 2, &[photoshop_id]);
    let second = create_test_license(&mut persistence, family_id, 2, &[photoshop_id]);
    let alice = create_test_user(&mut persistence, "alice");
    let assignment_id = persistence
        .create_assignment(&draft(alice, photoshop_id, Some(first)))
        .unwrap();
    persistence.delete_assignments(&[assignment_id]).unwrap();

    let result =
        persistence.update_assignment(assignment_id, &draft(alice, photoshop_id, Some(second)));

    assert!(matches!(result, Err(PersistenceError::NotFound(_))));
    assert_eq!(persistence.get_license(first).unwrap().used_total, 0);
    assert_eq!(persistence.get_license(second).unwrap().used_total, 0);
}

#[test]
fn test_deleting_the_same_assignment_twice_in_one_request() {
    let Catalog {
        mut persistence,
        family_id,
        photoshop_id,
        ..
    } = create_test_catalog();
    let license_id = create_test_license(&mut persistence, family_id, 2, &[photoshop_id]);
    let alice = create_test_user(&mut persistence, "alice");
    let assignment_id = persistence
        .create_assignment(&draft(alice, photoshop_id, Some(license_id)))
        .unwrap();

    let removed = persistence
        .delete_assignments(&[assignment_id, assignment_id])
        .unwrap();

    assert_eq!(removed.len(), 1);
    assert_eq!(persistence.get_license(license_id).unwrap().used_total, 0);
}

#[test]
fn test_adding_a_held_single_key_on_the_same_license_is_rejected() {
    let Catalog {
        mut persistence,
        family_id,
        photoshop_id,
        ..
    } = create_test_catalog();
    let license_id = create_test_license(&mut persistence, family_id, 5, &[photoshop_id]);
    let key_id = add_key(&mut persistence, license_id, "SINGLE-2", ActivationType::Single);
    let alice = create_test_user(&mut persistence, "alice");
    let bob = create_test_user(&mut persistence, "bob");
    let first = persistence
        .create_assignment(&draft(alice, photoshop_id, Some(license_id)))
        .unwrap();
    let second = persistence
        .create_assignment(&draft(bob, photoshop_id, Some(license_id)))
        .unwrap();

    let mut with_key = draft(alice, photoshop_id, Some(license_id));
    with_key.license_key_id = Some(key_id);
    persistence.update_assignment(first, &with_key).unwrap();

    // Same license, so no seat moves; the key check still applies
    let mut taken = draft(bob, photoshop_id, Some(license_id));
    taken.license_key_id = Some(key_id);
    let result = persistence.update_assignment(second, &taken);

    assert!(matches!(
        result,
        Err(PersistenceError::DomainViolation(DomainError::LicenseKeyUnavailable(id))) if id == key_id
    ));
    assert_eq!(persistence.get_assignment(second).unwrap().license_key_id, None);
    assert_eq!(persistence.get_license(license_id).unwrap().used_total, 2);
}

#[test]
fn test_single_key_is_held_by_one_assignment() {
    let Catalog {
        mut persistence,
        family_id,
        photoshop_id,
        ..
    } = create_test_catalog();
    let license_id = create_test_license(&mut persistence, family_id, 5, &[photoshop_id]);
    let key_id = add_key(&mut persistence, license_id, "SINGLE-1", ActivationType::Single);
    let alice = create_test_user(&mut persistence, "alice");
    let bob = create_test_user(&mut persistence, "bob");

    let mut with_key = draft(alice, photoshop_id, Some(license_id));
    with_key.license_key_id = Some(key_id);
    let assignment_id = persistence.create_assignment(&with_key).unwrap();

    let mut taken = draft(bob, photoshop_id, Some(license_id));
    taken.license_key_id = Some(key_id);
    let result = persistence.create_assignment(&taken);
    assert!(matches!(
        result,
        Err(PersistenceError::DomainViolation(DomainError::LicenseKeyUnavailable(id))) if id == key_id
    ));
    assert_eq!(persistence.get_license(license_id).unwrap().used_total, 1);

    // The holder keeps its own key when edited
    with_key.note = String::from("Renamed");
    assert!(persistence.update_assignment(assignment_id, &with_key).is_ok());
}

#[test]
fn test_volume_key_may_be_shared() {
    let Catalog {
        mut persistence,
        family_id,
        photoshop_id,
        ..
    } = create_test_catalog();
    let license_id = create_test_license(&mut persistence, family_id, 5, &[photoshop_id]);
    let key_id = add_key(&mut persistence, license_id, "VOLUME-1", ActivationType::Volume);

    for username in ["alice", "bob", "carol"] {
        let user_id = create_test_user(&mut persistence, username);
        let mut with_key = draft(user_id, photoshop_id, Some(license_id));
        with_key.license_key_id = Some(key_id);
        persistence.create_assignment(&with_key).unwrap();
    }

    assert_eq!(persistence.get_license(license_id).unwrap().used_total, 3);
}

#[test]
fn test_key_without_license_is_rejected() {
    let Catalog {
        mut persistence,
        family_id,
        photoshop_id,
        ..
    } = create_test_catalog();
    let license_id = create_test_license(&mut persistence, family_id, 5, &[photoshop_id]);
    let key_id = add_key(&mut persistence, license_id, "SINGLE-1", ActivationType::Single);
    let alice = create_test_user(&mut persistence, "alice");

    let mut orphan = draft(alice, photoshop_id, None);
    orphan.license_key_id = Some(key_id);
    let result = persistence.create_assignment(&orphan);

    assert!(matches!(
        result,
        Err(PersistenceError::DomainViolation(
            DomainError::LicenseKeyWithoutLicense
        ))
    ));
}

#[test]
fn test_available_licenses_prefer_least_remaining() {
    let Catalog {
        mut persistence,
        family_id,
        photoshop_id,
        ..
    } = create_test_catalog();
    let roomy = create_test_license(&mut persistence, family_id, 10, &[photoshop_id]);
    let tight = create_test_license(&mut persistence, family_id, 2, &[photoshop_id]);
    let full = create_test_license(&mut persistence, family_id, 1, &[photoshop_id]);
    let alice = create_test_user(&mut persistence, "alice");
    let assignment_id = persistence
        .create_assignment(&draft(alice, photoshop_id, Some(full)))
        .unwrap();

    let available: Vec<i64> = persistence
        .available_licenses(&[photoshop_id], Some(Platform::Windows), None)
        .unwrap()
        .into_iter()
        .map(|l| l.license_id)
        .collect();
    assert_eq!(available, vec![tight, roomy]);

    // The license an assignment already uses stays selectable
    let current = persistence.get_assignment(assignment_id).unwrap().license_id;
    let editing: Vec<i64> = persistence
        .available_licenses(&[photoshop_id], Some(Platform::Windows), current)
        .unwrap()
        .into_iter()
        .map(|l| l.license_id)
        .collect();
    assert_eq!(editing, vec![full, tight, roomy]);
}

#[test]
fn test_available_licenses_need_a_software_running_on_the_platform() {
    let Catalog {
        mut persistence,
        family_id,
        ..
    } = create_test_catalog();
    let windows_only =
        create_test_software(&mut persistence, family_id, "Acrobat", &[Platform::Windows]);
    let license_id = create_test_license(&mut persistence, family_id, 3, &[windows_only]);

    let on_linux = persistence
        .available_licenses(&[windows_only], Some(Platform::Linux), None)
        .unwrap();
    assert!(on_linux.is_empty());

    let on_windows: Vec<i64> = persistence
        .available_licenses(&[windows_only], Some(Platform::Windows), None)
        .unwrap()
        .into_iter()
        .map(|l| l.license_id)
        .collect();
    assert_eq!(on_windows, vec![license_id]);

    let any_platform = persistence
        .available_licenses(&[windows_only], None, None)
        .unwrap();
    assert_eq!(any_platform.len(), 1);
}

#[test]
fn test_available_keys_skip_held_single_keys() {
    let Catalog {
        mut persistence,
        family_id,
        photoshop_id,
        ..
    } = create_test_catalog();
    let license_id = create_test_license(&mut persistence, family_id, 5, &[photoshop_id]);
    let volume = add_key(&mut persistence, license_id, "VOLUME-1", ActivationType::Volume);
    let single = add_key(&mut persistence, license_id, "SINGLE-1", ActivationType::Single);
    let alice = create_test_user(&mut persistence, "alice");

    let before: Vec<i64> = persistence
        .available_keys(license_id, photoshop_id, Some(Platform::Windows), None)
        .unwrap()
        .into_iter()
        .map(|k| k.license_key_id)
        .collect();
    assert_eq!(before, vec![single, volume]);

    let mut with_key = draft(alice, photoshop_id, Some(license_id));
    with_key.license_key_id = Some(single);
    persistence.create_assignment(&with_key).unwrap();

    let after: Vec<i64> = persistence
        .available_keys(license_id, photoshop_id, Some(Platform::Windows), None)
        .unwrap()
        .into_iter()
        .map(|k| k.license_key_id)
        .collect();
    assert_eq!(after, vec![volume]);

    let editing: Vec<i64> = persistence
        .available_keys(license_id, photoshop_id, Some(Platform::Windows), Some(single))
        .unwrap()
        .into_iter()
        .map(|k| k.license_key_id)
        .collect();
    assert_eq!(editing, vec![single, volume]);
}
