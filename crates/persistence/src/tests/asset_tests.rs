// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Assets and the exchanges that move them.

use lms_domain::{
    AssetOrigin, AssetStatus, DomainError, ExchangeDecision, ExchangeKind, ExchangeReason,
    ExchangeRequest, ExchangeStatus,
};
use time::Month;

use crate::{NewAsset, NewLocation, Persistence, PersistenceError};

use super::{create_test_user, date};

struct Site {
    persistence: Persistence,
    manager: i64,
    alice: i64,
    bob: i64,
    storage: i64,
    desk: i64,
    laptop_type: i64,
    kitted_type: i64,
}

fn create_test_site() -> Site {
    let mut persistence = Persistence::new_in_memory().unwrap();
    let manager = create_test_user(&mut persistence, "manager");
    let alice = create_test_user(&mut persistence, "alice");
    let bob = create_test_user(&mut persistence, "bob");
    let office = persistence.create_office("HQ", "1 Main Street").unwrap();
    let storage = persistence
        .create_location(&NewLocation {
            office_id: office,
            name: String::from("Storage"),
            floor: Some(-1),
            room: None,
        })
        .unwrap();
    let desk = persistence
        .create_location(&NewLocation {
            office_id: office,
            name: String::from("Desk 12"),
            floor: Some(3),
            room: Some(301),
        })
        .unwrap();
    persistence.add_location_manager(storage, manager).unwrap();
    let laptop_type = persistence.create_asset_type("Laptop", false, true).unwrap();
    let kitted_type = persistence.create_asset_type("Workstation", true, false).unwrap();
    Site {
        persistence,
        manager,
        alice,
        bob,
        storage,
        desk,
        laptop_type,
        kitted_type,
    }
}

fn new_asset(asset_type_id: i64, location_id: Option<i64>) -> NewAsset {
    NewAsset {
        name: String::from("ThinkPad X1"),
        old_code: String::new(),
        asset_type_id,
        supplier_id: None,
        manufacturer_id: None,
        purchased_date: Some(date(2026, Month::January, 10)),
        warranty_start_date: Some(date(2026, Month::January, 10)),
        warranty_end_date: Some(date(2029, Month::January, 10)),
        origin: AssetOrigin::BrandNew,
        status: AssetStatus::Excellent,
        location_id,
        note: String::new(),
    }
}

fn hand_over(asset_id: i64, sender_id: i64, receiver_id: i64) -> ExchangeRequest {
    ExchangeRequest {
        asset_id,
        kind: ExchangeKind::UserAssignment,
        sender_id,
        receiver_id,
        destination_id: None,
        reason: ExchangeReason::Onboarding,
        comment: String::new(),
    }
}

#[test]
fn test_new_asset_is_held_by_its_creator() {
    let Site {
        mut persistence,
        manager,
        storage,
        laptop_type,
        ..
    } = create_test_site();

    let asset_id = persistence
        .create_asset(&new_asset(laptop_type, Some(storage)), manager)
        .unwrap();
    let asset = persistence.get_asset(asset_id).unwrap();

    assert_eq!(asset.holder_id, Some(manager));
    assert!(!asset.is_assigned);
    assert_eq!(asset.location_id, Some(storage));
    assert_eq!(asset.status, AssetStatus::Excellent);
}

#[test]
fn test_warranty_dates_are_validated() {
    let Site {
        mut persistence,
        manager,
        laptop_type,
        ..
    } = create_test_site();
    let mut asset = new_asset(laptop_type, None);
    asset.warranty_start_date = Some(date(2026, Month::January, 1));

    let result = persistence.create_asset(&asset, manager);

    assert!(matches!(
        result,
        Err(PersistenceError::DomainViolation(
            DomainError::WarrantyBeforePurchase
        ))
    ));
}

#[test]
fn test_visible_assets_follow_holders_and_managed_locations() {
    let Site {
        mut persistence,
        manager,
        alice,
        storage,
        desk,
        laptop_type,
        ..
    } = create_test_site();
    let stored = persistence
        .create_asset(&new_asset(laptop_type, Some(storage)), alice)
        .unwrap();
    let at_desk = persistence
        .create_asset(&new_asset(laptop_type, Some(desk)), alice)
        .unwrap();

    let managed: Vec<i64> = persistence
        .list_visible_assets(manager)
        .unwrap()
        .into_iter()
        .map(|a| a.asset_id)
        .collect();
    assert_eq!(managed, vec![stored]);

    let held: Vec<i64> = persistence
        .list_visible_assets(alice)
        .unwrap()
        .into_iter()
        .map(|a| a.asset_id)
        .collect();
    assert_eq!(held, vec![stored, at_desk]);
}

#[test]
fn test_pending_exchange_is_taken_by_the_receiver() {
    let Site {
        mut persistence,
        manager,
        alice,
        storage,
        laptop_type,
        ..
    } = create_test_site();
    let asset_id = persistence
        .create_asset(&new_asset(laptop_type, Some(storage)), manager)
        .unwrap();

    let exchange = persistence
        .start_exchange(&hand_over(asset_id, manager, alice))
        .unwrap();
    assert_eq!(exchange.status, ExchangeStatus::Pending);
    assert_eq!(exchange.source_id, Some(storage));

    // One pending exchange per asset
    let again = persistence.start_exchange(&hand_over(asset_id, manager, alice));
    assert!(matches!(
        again,
        Err(PersistenceError::DomainViolation(
            DomainError::ExchangeAlreadyPending(_)
        ))
    ));

    // Only the receiver may take it
    let wrong = persistence.decide_exchange(exchange.exchange_id, manager, ExchangeDecision::Take);
    assert!(matches!(
        wrong,
        Err(PersistenceError::DomainViolation(
            DomainError::ExchangeParticipantMismatch { .. }
        ))
    ));

    persistence
        .decide_exchange(exchange.exchange_id, alice, ExchangeDecision::Take)
        .unwrap();

    let asset = persistence.get_asset(asset_id).unwrap();
    assert_eq!(asset.holder_id, Some(alice));
    assert!(asset.is_assigned);
    assert_eq!(asset.location_id, Some(storage));
    let taken = persistence.get_exchange(exchange.exchange_id).unwrap();
    assert_eq!(taken.status, ExchangeStatus::Taken);
    assert_eq!(taken.ended_by, Some(alice));
    assert!(taken.ended_at.is_some());
}

#[test]
fn test_closed_exchange_cannot_be_decided_again() {
    let Site {
        mut persistence,
        manager,
        alice,
        laptop_type,
        ..
    } = create_test_site();
    let asset_id = persistence
        .create_asset(&new_asset(laptop_type, None), manager)
        .unwrap();
    let exchange = persistence
        .start_exchange(&hand_over(asset_id, manager, alice))
        .unwrap();

    persistence
        .decide_exchange(exchange.exchange_id, manager, ExchangeDecision::Cancel)
        .unwrap();
    let result = persistence.decide_exchange(exchange.exchange_id, alice, ExchangeDecision::Take);

    assert!(matches!(
        result,
        Err(PersistenceError::DomainViolation(
            DomainError::ExchangeNotPending { .. }
        ))
    ));
    assert_eq!(
        persistence.get_asset(asset_id).unwrap().holder_id,
        Some(manager)
    );
}

#[test]
fn test_only_the_holder_or_a_manager_can_start() {
    let Site {
        mut persistence,
        alice,
        bob,
        desk,
        laptop_type,
        ..
    } = create_test_site();
    let asset_id = persistence
        .create_asset(&new_asset(laptop_type, Some(desk)), alice)
        .unwrap();

    let result = persistence.start_exchange(&hand_over(asset_id, bob, bob));

    assert!(matches!(
        result,
        Err(PersistenceError::DomainViolation(DomainError::NotAssetHolder { .. }))
    ));
}

#[test]
fn test_placing_at_a_managed_location_completes_at_once() {
    let Site {
        mut persistence,
        manager,
        storage,
        desk,
        laptop_type,
        ..
    } = create_test_site();
    let asset_id = persistence
        .create_asset(&new_asset(laptop_type, Some(desk)), manager)
        .unwrap();

    let exchange = persistence
        .start_exchange(&ExchangeRequest {
            asset_id,
            kind: ExchangeKind::LocationAssignment,
            sender_id: manager,
            receiver_id: manager,
            destination_id: Some(storage),
            reason: ExchangeReason::Return,
            comment: String::from("Back to storage"),
        })
        .unwrap();

    assert_eq!(exchange.status, ExchangeStatus::Taken);
    let asset = persistence.get_asset(asset_id).unwrap();
    assert_eq!(asset.location_id, Some(storage));
    assert_eq!(persistence.list_asset_exchanges(asset_id).unwrap().len(), 1);
}

#[test]
fn test_kitting_must_finish_before_take() {
    let Site {
        mut persistence,
        manager,
        alice,
        kitted_type,
        laptop_type,
        ..
    } = create_test_site();
    let asset_id = persistence
        .create_asset(&new_asset(kitted_type, None), manager)
        .unwrap();
    let exchange = persistence
        .start_exchange(&hand_over(asset_id, manager, alice))
        .unwrap();
    assert!(exchange.kitting_required);

    let early = persistence.decide_exchange(exchange.exchange_id, alice, ExchangeDecision::Take);
    assert!(matches!(
        early,
        Err(PersistenceError::DomainViolation(DomainError::KittingIncomplete(_)))
    ));

    persistence
        .record_kitting(
            exchange.exchange_id,
            manager,
            false,
            Some(date(2026, Month::March, 1)),
        )
        .unwrap();
    let started = persistence.get_exchange(exchange.exchange_id).unwrap();
    assert_eq!(started.kitting_by, Some(manager));
    assert!(started.kitting_started_at.is_some());
    assert!(started.kitting_completed_at.is_none());
    assert_eq!(started.kitting_due_date, Some(date(2026, Month::March, 1)));

    persistence
        .record_kitting(exchange.exchange_id, manager, true, None)
        .unwrap();
    persistence
        .decide_exchange(exchange.exchange_id, alice, ExchangeDecision::Take)
        .unwrap();
    assert_eq!(
        persistence.get_asset(asset_id).unwrap().holder_id,
        Some(alice)
    );

    // Kitting on an exchange that does not need it
    let plain = persistence
        .create_asset(&new_asset(laptop_type, None), manager)
        .unwrap();
    let plain_exchange = persistence
        .start_exchange(&hand_over(plain, manager, alice))
        .unwrap();
    assert!(matches!(
        persistence.record_kitting(plain_exchange.exchange_id, manager, true, None),
        Err(PersistenceError::DomainViolation(DomainError::KittingNotRequired(_)))
    ));
}

#[test]
fn test_status_update_returns_the_previous_asset() {
    let Site {
        mut persistence,
        manager,
        laptop_type,
        ..
    } = create_test_site();
    let asset_id = persistence
        .create_asset(&new_asset(laptop_type, None), manager)
        .unwrap();

    let before = persistence
        .update_asset_status(asset_id, AssetStatus::Broken)
        .unwrap();

    assert_eq!(before.status, AssetStatus::Excellent);
    assert_eq!(
        persistence.get_asset(asset_id).unwrap().status,
        AssetStatus::Broken
    );
}
