// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use time::OffsetDateTime;
use time::macros::{date, datetime};

use crate::{
    Asset, AssetOrigin, AssetPlacement, AssetStatus, DomainError, Exchange, ExchangeDecision,
    ExchangeKind, ExchangeReason, ExchangeRequest, ExchangeStatus, SenderStanding, asset_code,
    validate_asset_dates, validate_exchange_start,
};

const NOW: OffsetDateTime = datetime!(2026-05-04 09:00 UTC);

fn create_test_asset(holder_id: Option<i64>, location_id: Option<i64>) -> Asset {
    Asset {
        asset_id: 42,
        old_code: String::new(),
        name: String::from("ThinkPad T14"),
        asset_type_id: 1,
        supplier_id: None,
        manufacturer_id: None,
        purchased_date: None,
        warranty_start_date: None,
        warranty_end_date: None,
        origin: AssetOrigin::BrandNew,
        status: AssetStatus::Excellent,
        is_assigned: false,
        holder_id,
        location_id,
        available_at: None,
        note: String::new(),
        created_at: NOW,
        updated_at: NOW,
    }
}

fn create_test_exchange(kind: ExchangeKind, kitting_required: bool) -> Exchange {
    Exchange {
        exchange_id: 5,
        asset_id: 42,
        kind,
        sender_id: 1,
        receiver_id: 2,
        source_id: Some(10),
        destination_id: None,
        reason: ExchangeReason::Onboarding,
        status: ExchangeStatus::Pending,
        started_at: NOW,
        ended_at: None,
        ended_by: None,
        kitting_required,
        kitting_by: None,
        kitting_started_at: None,
        kitting_completed_at: None,
        kitting_due_date: None,
        comment: String::new(),
    }
}

fn request(kind: ExchangeKind, sender_id: i64, receiver_id: i64) -> ExchangeRequest {
    ExchangeRequest {
        asset_id: 42,
        kind,
        sender_id,
        receiver_id,
        destination_id: None,
        reason: ExchangeReason::Exchange,
        comment: String::new(),
    }
}

#[test]
fn test_asset_code_is_zero_padded() {
    assert_eq!(asset_code("AMS", 42), "AMS00042");
    assert_eq!(asset_code("IT", 123_456), "IT123456");
}

#[test]
fn test_asset_dates() {
    assert!(validate_asset_dates(None, None, None).is_ok());
    assert_eq!(
        validate_asset_dates(None, Some(date!(2026 - 01 - 10)), Some(date!(2026 - 01 - 10))),
        Err(DomainError::InvalidWarrantyPeriod)
    );
    assert_eq!(
        validate_asset_dates(
            Some(date!(2026 - 02 - 01)),
            Some(date!(2026 - 01 - 10)),
            Some(date!(2027 - 01 - 10))
        ),
        Err(DomainError::WarrantyBeforePurchase)
    );
}

#[test]
fn test_visibility_covers_held_stock_and_managed_locations() {
    let stock: Asset = create_test_asset(Some(1), None);
    assert!(stock.is_visible_to(1, &[]));
    assert!(!stock.is_visible_to(2, &[]));

    let mut assigned: Asset = create_test_asset(Some(1), Some(10));
    assigned.is_assigned = true;
    assert!(!assigned.is_visible_to(1, &[]));
    assert!(assigned.is_visible_to(3, &[10]));
}

#[test]
fn test_only_holder_or_location_manager_may_start() {
    let asset: Asset = create_test_asset(Some(1), Some(10));
    let by_stranger: ExchangeRequest = request(ExchangeKind::HandOver, 9, 2);
    assert_eq!(
        validate_exchange_start(&asset, &by_stranger, SenderStanding::default(), false),
        Err(DomainError::NotAssetHolder {
            asset_id: 42,
            user_id: 9,
        })
    );

    let standing: SenderStanding = SenderStanding {
        manages_source: true,
        ..SenderStanding::default()
    };
    assert_eq!(
        validate_exchange_start(&asset, &by_stranger, standing, false),
        Ok(false)
    );
}

#[test]
fn test_pending_exchange_blocks_new_one() {
    let asset: Asset = create_test_asset(Some(1), None);
    let standing: SenderStanding = SenderStanding {
        has_pending_exchange: true,
        ..SenderStanding::default()
    };
    assert_eq!(
        validate_exchange_start(&asset, &request(ExchangeKind::HandOver, 1, 2), standing, false),
        Err(DomainError::ExchangeAlreadyPending(42))
    );
}

#[test]
fn test_location_assignment_needs_destination() {
    let asset: Asset = create_test_asset(Some(1), None);
    assert_eq!(
        validate_exchange_start(
            &asset,
            &request(ExchangeKind::LocationAssignment, 1, 2),
            SenderStanding::default(),
            false
        ),
        Err(DomainError::MissingDestination)
    );
}

#[test]
fn test_self_assignment_completes_immediately_unless_kitting() {
    let asset: Asset = create_test_asset(Some(1), None);
    let to_self: ExchangeRequest = request(ExchangeKind::UserAssignment, 1, 1);
    assert_eq!(
        validate_exchange_start(&asset, &to_self, SenderStanding::default(), false),
        Ok(true)
    );
    assert_eq!(
        validate_exchange_start(&asset, &to_self, SenderStanding::default(), true),
        Ok(false)
    );
}

#[test]
fn test_managed_destination_completes_immediately() {
    let asset: Asset = create_test_asset(Some(1), None);
    let mut to_shelf: ExchangeRequest = request(ExchangeKind::LocationAssignment, 1, 2);
    to_shelf.destination_id = Some(11);
    let standing: SenderStanding = SenderStanding {
        manages_destination: true,
        ..SenderStanding::default()
    };
    assert_eq!(
        validate_exchange_start(&asset, &to_shelf, standing, false),
        Ok(true)
    );
}

#[test]
fn test_receiver_takes_and_rejects_sender_cancels() {
    let exchange: Exchange = create_test_exchange(ExchangeKind::UserAssignment, false);
    assert_eq!(
        exchange.check_decision(ExchangeDecision::Take, 2),
        Ok(ExchangeStatus::Taken)
    );
    assert_eq!(
        exchange.check_decision(ExchangeDecision::Reject, 2),
        Ok(ExchangeStatus::Rejected)
    );
    assert_eq!(
        exchange.check_decision(ExchangeDecision::Cancel, 1),
        Ok(ExchangeStatus::Cancelled)
    );
    assert_eq!(
        exchange.check_decision(ExchangeDecision::Take, 1),
        Err(DomainError::ExchangeParticipantMismatch {
            exchange_id: 5,
            user_id: 1,
            role: "receiver",
        })
    );
}

#[test]
fn test_closed_exchange_cannot_change() {
    let mut exchange: Exchange = create_test_exchange(ExchangeKind::HandOver, false);
    exchange.status = ExchangeStatus::Rejected;
    assert_eq!(
        exchange.check_decision(ExchangeDecision::Cancel, 1),
        Err(DomainError::ExchangeNotPending {
            exchange_id: 5,
            status: "rejected",
        })
    );
}

#[test]
fn test_kitting_gates_take() {
    let mut exchange: Exchange = create_test_exchange(ExchangeKind::UserAssignment, true);
    assert_eq!(
        exchange.check_decision(ExchangeDecision::Take, 2),
        Err(DomainError::KittingIncomplete(5))
    );
    assert!(exchange.check_kitting().is_ok());

    exchange.kitting_completed_at = Some(NOW);
    assert!(exchange.check_decision(ExchangeDecision::Take, 2).is_ok());

    let plain: Exchange = create_test_exchange(ExchangeKind::HandOver, false);
    assert_eq!(plain.check_kitting(), Err(DomainError::KittingNotRequired(5)));
}

#[test]
fn test_freshness_window() {
    let exchange: Exchange = create_test_exchange(ExchangeKind::HandOver, false);
    assert!(exchange.is_fresh(datetime!(2026-05-04 09:04:59 UTC)));
    assert!(!exchange.is_fresh(datetime!(2026-05-04 09:05 UTC)));
}

#[test]
fn test_placement_after_take() {
    let asset: Asset = create_test_asset(Some(1), Some(10));
    let hand_over: Exchange = create_test_exchange(ExchangeKind::HandOver, false);
    assert_eq!(
        hand_over.placement_after_take(&asset),
        AssetPlacement {
            holder_id: Some(2),
            location_id: Some(10),
            is_assigned: false,
        }
    );

    let mut to_desk: Exchange = create_test_exchange(ExchangeKind::LocationAssignment, false);
    to_desk.destination_id = Some(11);
    assert_eq!(
        to_desk.placement_after_take(&asset),
        AssetPlacement {
            holder_id: Some(2),
            location_id: Some(11),
            is_assigned: true,
        }
    );
}
