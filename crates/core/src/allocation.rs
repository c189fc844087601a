// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Seat bookkeeping and availability ranking.
//!
//! These functions are pure: callers load licenses, coverage and keys, and
//! persistence applies the resulting seat changes under a row lock.

use std::collections::{BTreeMap, BTreeSet};

use lms_domain::{License, LicenseAssignment, LicenseKey, LicensedSoftware, Platform};

/// Direction of a seat change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeatChange {
    Reserve,
    Release,
}

/// A seat change applied to one license.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeatDelta {
    pub license_id: i64,
    pub change: SeatChange,
    pub amount: u32,
}

/// Seat changes implied by moving an assignment from `before` to `after`.
///
/// Deltas are ordered by license id so that concurrent writers lock license
/// rows in the same order.
#[must_use]
pub fn seat_deltas(before: Option<i64>, after: Option<i64>) -> Vec<SeatDelta> {
    if before == after {
        return Vec::new();
    }
    let mut deltas: Vec<SeatDelta> = Vec::with_capacity(2);
    if let Some(license_id) = before {
        deltas.push(SeatDelta {
            license_id,
            change: SeatChange::Release,
            amount: 1,
        });
    }
    if let Some(license_id) = after {
        deltas.push(SeatDelta {
            license_id,
            change: SeatChange::Reserve,
            amount: 1,
        });
    }
    deltas.sort_by_key(|delta| delta.license_id);
    deltas
}

/// Seats to release per license when `removed` assignments are deleted.
#[must_use]
pub fn seats_released_by(removed: &[LicenseAssignment]) -> Vec<SeatDelta> {
    let mut counts: BTreeMap<i64, u32> = BTreeMap::new();
    for license_id in removed.iter().filter_map(|a| a.license_id) {
        *counts.entry(license_id).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .map(|(license_id, amount)| SeatDelta {
            license_id,
            change: SeatChange::Release,
            amount,
        })
        .collect()
}

/// Remaining capacity per license while a plan is being built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeatLedger {
    remaining: BTreeMap<i64, u32>,
}

impl SeatLedger {
    /// Starts a ledger from the current state of `licenses`.
    #[must_use]
    pub fn from_licenses<'a, I>(licenses: I) -> Self
    where
        I: IntoIterator<Item = &'a License>,
    {
        Self {
            remaining: licenses
                .into_iter()
                .map(|license| (license.license_id, license.remaining()))
                .collect(),
        }
    }

    /// Seats left on a license; unknown licenses have none.
    #[must_use]
    pub fn remaining(&self, license_id: i64) -> u32 {
        self.remaining.get(&license_id).copied().unwrap_or(0)
    }

    /// Takes one seat if any is left.
    pub fn take(&mut self, license_id: i64) -> bool {
        match self.remaining.get_mut(&license_id) {
            Some(left) if *left > 0 => {
                *left -= 1;
                true
            }
            _ => false,
        }
    }
}

/// A license together with everything it covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LicenseCandidate {
    pub license: License,
    pub coverage: Vec<LicensedSoftware>,
}

impl LicenseCandidate {
    /// Returns whether the license covers `software_id`, on `platform` if given.
    #[must_use]
    pub fn covers(&self, software_id: i64, platform: Option<Platform>) -> bool {
        self.coverage.iter().any(|ls| {
            ls.software_id == software_id && platform.is_none_or(|p| ls.platform.covers(p))
        })
    }
}

/// Licenses that can back an assignment of any of `software_ids`.
///
/// A license qualifies if it covers one of the softwares on the platform and
/// is active with a free seat. The `current` license always qualifies so an
/// edit can keep it. Results are ordered by ascending remaining capacity,
/// then by id, so nearly full licenses are used up first.
#[must_use]
pub fn rank_available_licenses<'a>(
    candidates: &'a [LicenseCandidate],
    software_ids: &[i64],
    platform: Option<Platform>,
    current: Option<i64>,
) -> Vec<&'a License> {
    let mut ranked: Vec<&License> = candidates
        .iter()
        .filter(|c| software_ids.iter().any(|id| c.covers(*id, platform)))
        .filter(|c| {
            current == Some(c.license.license_id)
                || (c.license.is_active && c.license.remaining() > 0)
        })
        .map(|c| &c.license)
        .collect();
    ranked.sort_by_key(|license| (license.remaining(), license.license_id));
    ranked
}

/// Keys usable for (`license_id`, `software_id`) on `platform`.
///
/// Single-activation keys held by an assignment in `held` are left out,
/// except the `current` key of the assignment being edited. Keys are
/// ordered by activation type, then by id.
#[must_use]
pub fn available_keys<'a>(
    coverage: &[LicensedSoftware],
    keys: &'a [LicenseKey],
    license_id: i64,
    software_id: i64,
    platform: Option<Platform>,
    held: &BTreeSet<i64>,
    current: Option<i64>,
) -> Vec<&'a LicenseKey> {
    let owners: BTreeSet<i64> = coverage
        .iter()
        .filter(|ls| {
            ls.license_id == license_id
                && ls.software_id == software_id
                && platform.is_none_or(|p| ls.platform.covers(p))
        })
        .map(|ls| ls.licensed_software_id)
        .collect();

    let mut available: Vec<&LicenseKey> = keys
        .iter()
        .filter(|key| owners.contains(&key.licensed_software_id))
        .filter(|key| {
            current == Some(key.license_key_id)
                || !key.activation_type.is_exclusive()
                || !held.contains(&key.license_key_id)
        })
        .collect();
    available.sort_by_key(|key| (key.activation_type, key.license_key_id));
    available
}
