// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Hand-over of assets between people and places.
//!
//! An exchange starts `Pending` and ends in exactly one of `Taken`,
//! `Rejected` or `Cancelled`. Only the receiver can take or reject it and
//! only the sender can cancel it. Taking an exchange moves the asset.

use serde::{Deserialize, Serialize};
use time::{Date, Duration, OffsetDateTime};

use crate::asset::{Asset, stored_enum};
use crate::error::DomainError;
use crate::types::iso_date;

/// How long a freshly started exchange stays highlighted.
pub const FRESH_WINDOW: Duration = Duration::minutes(5);

stored_enum! {
    /// What the exchange does with the asset.
    ExchangeKind, "exchange kind" {
        HandOver => "hand_over",
        UserAssignment => "user_assignment",
        LocationAssignment => "location_assignment",
    }
}

stored_enum! {
    ExchangeReason, "exchange reason" {
        Exchange => "exchange",
        Return => "return",
        Broken => "broken",
        Lost => "lost",
        Resigning => "resigning",
        Onboarding => "onboarding",
        Requested => "requested",
        Other => "other",
    }
}

stored_enum! {
    ExchangeStatus, "exchange status" {
        Pending => "pending",
        Cancelled => "cancelled",
        Rejected => "rejected",
        Taken => "taken",
    }
}

/// The decision that closes a pending exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExchangeDecision {
    Take,
    Reject,
    Cancel,
}

impl ExchangeDecision {
    /// Status the exchange ends in.
    #[must_use]
    pub const fn resulting_status(&self) -> ExchangeStatus {
        match self {
            Self::Take => ExchangeStatus::Taken,
            Self::Reject => ExchangeStatus::Rejected,
            Self::Cancel => ExchangeStatus::Cancelled,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exchange {
    pub exchange_id: i64,
    pub asset_id: i64,
    pub kind: ExchangeKind,
    pub sender_id: i64,
    pub receiver_id: i64,
    pub source_id: Option<i64>,
    pub destination_id: Option<i64>,
    pub reason: ExchangeReason,
    pub status: ExchangeStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub started_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub ended_at: Option<OffsetDateTime>,
    pub ended_by: Option<i64>,
    pub kitting_required: bool,
    pub kitting_by: Option<i64>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub kitting_started_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub kitting_completed_at: Option<OffsetDateTime>,
    #[serde(with = "iso_date::option")]
    pub kitting_due_date: Option<Date>,
    pub comment: String,
}

impl Exchange {
    /// Returns whether the exchange started less than five minutes ago.
    #[must_use]
    pub fn is_fresh(&self, now: OffsetDateTime) -> bool {
        now - self.started_at < FRESH_WINDOW
    }

    /// Checks that `user_id` may apply `decision` to this exchange.
    ///
    /// # Errors
    ///
    /// Fails if the exchange is already closed, the user plays the wrong
    /// part, or required kitting is unfinished.
    pub fn check_decision(
        &self,
        decision: ExchangeDecision,
        user_id: i64,
    ) -> Result<ExchangeStatus, DomainError> {
        self.ensure_pending()?;

        let (expected, role): (i64, &'static str) = match decision {
            ExchangeDecision::Take | ExchangeDecision::Reject => (self.receiver_id, "receiver"),
            ExchangeDecision::Cancel => (self.sender_id, "sender"),
        };
        if user_id != expected {
            return Err(DomainError::ExchangeParticipantMismatch {
                exchange_id: self.exchange_id,
                user_id,
                role,
            });
        }

        if decision == ExchangeDecision::Take
            && self.kitting_required
            && self.kitting_completed_at.is_none()
        {
            return Err(DomainError::KittingIncomplete(self.exchange_id));
        }

        Ok(decision.resulting_status())
    }

    /// Checks that kitting may be recorded on this exchange.
    ///
    /// # Errors
    ///
    /// Fails if the exchange is closed or does not need kitting.
    pub fn check_kitting(&self) -> Result<(), DomainError> {
        self.ensure_pending()?;
        if !self.kitting_required {
            return Err(DomainError::KittingNotRequired(self.exchange_id));
        }
        Ok(())
    }

    fn ensure_pending(&self) -> Result<(), DomainError> {
        if self.status != ExchangeStatus::Pending {
            return Err(DomainError::ExchangeNotPending {
                exchange_id: self.exchange_id,
                status: self.status.as_str(),
            });
        }
        Ok(())
    }

    /// Where the asset ends up once this exchange is taken.
    #[must_use]
    pub fn placement_after_take(&self, asset: &Asset) -> AssetPlacement {
        AssetPlacement {
            holder_id: Some(self.receiver_id),
            location_id: self.destination_id.or(asset.location_id),
            is_assigned: self.kind != ExchangeKind::HandOver,
        }
    }
}

/// Holder and location of an asset after a move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssetPlacement {
    pub holder_id: Option<i64>,
    pub location_id: Option<i64>,
    pub is_assigned: bool,
}

/// A request to start moving an asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeRequest {
    pub asset_id: i64,
    pub kind: ExchangeKind,
    pub sender_id: i64,
    pub receiver_id: i64,
    pub destination_id: Option<i64>,
    pub reason: ExchangeReason,
    pub comment: String,
}

/// Facts about the sender that the start rules depend on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SenderStanding {
    /// The asset already has a pending exchange.
    pub has_pending_exchange: bool,
    /// The sender manages the asset's current location.
    pub manages_source: bool,
    /// The sender manages the requested destination.
    pub manages_destination: bool,
}

/// Validates a new exchange and decides whether it completes at once.
///
/// Returns `true` when no confirmation from the receiver is needed: the
/// sender hands the asset to themself, or places it at a location they
/// manage. Exchanges that need kitting always wait for the receiver.
///
/// # Errors
///
/// Fails if the asset is already moving, the sender neither holds it nor
/// manages its location, or a location assignment lacks a destination.
pub fn validate_exchange_start(
    asset: &Asset,
    request: &ExchangeRequest,
    standing: SenderStanding,
    kitting_required: bool,
) -> Result<bool, DomainError> {
    if standing.has_pending_exchange {
        return Err(DomainError::ExchangeAlreadyPending(asset.asset_id));
    }
    if asset.holder_id != Some(request.sender_id) && !standing.manages_source {
        return Err(DomainError::NotAssetHolder {
            asset_id: asset.asset_id,
            user_id: request.sender_id,
        });
    }
    if request.kind == ExchangeKind::LocationAssignment && request.destination_id.is_none() {
        return Err(DomainError::MissingDestination);
    }

    let self_assignment: bool = request.sender_id == request.receiver_id;
    let own_destination: bool = request.destination_id.is_some() && standing.manages_destination;
    Ok(!kitting_required && (self_assignment || own_destination))
}
