// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! First-fit planning of bulk assignments.
//!
//! Every (user, software) pair of the request is visited users-first. Each
//! pair takes a seat from the first license in the software's ranked list
//! that still has capacity, and the first key of that license available for
//! the software. Capacity is tracked per license across the whole plan, so a
//! license covering several softwares is never over-committed.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use lms_domain::{AssignmentDraft, DomainError, LicenseKey, LicensedSoftware, Platform, Software};

use crate::allocation::{LicenseCandidate, SeatLedger, available_keys, rank_available_licenses};
use crate::error::CoreError;

/// What the operator asked for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkAssignRequest {
    pub user_ids: Vec<i64>,
    pub software_ids: Vec<i64>,
    pub platform: Platform,
    /// Leave out pairs the user already has an assignment for.
    pub skip_existing: bool,
    /// Leave out pairs no license can cover instead of assigning them unlicensed.
    pub skip_unlicensed: bool,
    pub note: String,
}

/// Everything the planner reads, loaded by the caller.
#[derive(Debug, Clone, Copy)]
pub struct BulkInventory<'a> {
    /// The requested softwares.
    pub softwares: &'a [Software],
    /// Licenses covering any requested software, with their coverage.
    pub candidates: &'a [LicenseCandidate],
    /// Keys of those licenses.
    pub keys: &'a [LicenseKey],
    /// Single-activation keys already held by an assignment.
    pub held_keys: &'a BTreeSet<i64>,
    /// (user, software) pairs that already have an assignment.
    pub existing: &'a BTreeSet<(i64, i64)>,
}

/// Outcome of one (user, software) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PlanOutcome {
    /// Assign a seat of `license_id`, with a key when one is available.
    Assign {
        license_id: i64,
        license_key_id: Option<i64>,
    },
    /// No capacity left; assign without a license.
    Unlicensed,
    /// The user already has this software.
    SkippedExisting,
    /// No capacity left and unlicensed assignments were not wanted.
    SkippedUnlicensed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanEntry {
    pub user_id: i64,
    pub software_id: i64,
    #[serde(flatten)]
    pub outcome: PlanOutcome,
}

/// An ordered bulk assignment plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkAssignPlan {
    pub platform: Platform,
    pub note: String,
    pub entries: Vec<PlanEntry>,
}

impl BulkAssignPlan {
    /// Assignments to create, in plan order.
    #[must_use]
    pub fn drafts(&self) -> Vec<AssignmentDraft> {
        self.entries
            .iter()
            .filter_map(|entry| {
                let (license_id, license_key_id) = match entry.outcome {
                    PlanOutcome::Assign {
                        license_id,
                        license_key_id,
                    } => (Some(license_id), license_key_id),
                    PlanOutcome::Unlicensed => (None, None),
                    PlanOutcome::SkippedExisting | PlanOutcome::SkippedUnlicensed => {
                        return None;
                    }
                };
                Some(AssignmentDraft {
                    user_id: entry.user_id,
                    software_id: entry.software_id,
                    platform: Some(self.platform),
                    license_id,
                    license_key_id,
                    note: self.note.clone(),
                })
            })
            .collect()
    }

    /// Number of entries with the given outcome kind.
    #[must_use]
    pub fn count(&self, matches: impl Fn(&PlanOutcome) -> bool) -> usize {
        self.entries.iter().filter(|e| matches(&e.outcome)).count()
    }

    /// Number of licensed assignments in the plan.
    #[must_use]
    pub fn licensed(&self) -> usize {
        self.count(|o| matches!(o, PlanOutcome::Assign { .. }))
    }
}

fn dedup_preserving_order(ids: &[i64]) -> Vec<i64> {
    let mut seen: BTreeSet<i64> = BTreeSet::new();
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}

/// Builds a bulk assignment plan.
///
/// # Errors
///
/// Fails if no user or no software is selected, a software was not loaded,
/// or a software is not available on the requested platform.
pub fn plan_bulk_assignment(
    request: &BulkAssignRequest,
    inventory: &BulkInventory<'_>,
) -> Result<BulkAssignPlan, CoreError> {
    let user_ids: Vec<i64> = dedup_preserving_order(&request.user_ids);
    let software_ids: Vec<i64> = dedup_preserving_order(&request.software_ids);
    if user_ids.is_empty() {
        return Err(DomainError::EmptySelection("user").into());
    }
    if software_ids.is_empty() {
        return Err(DomainError::EmptySelection("software").into());
    }

    for software_id in &software_ids {
        let software: &Software = inventory
            .softwares
            .iter()
            .find(|s| s.software_id == *software_id)
            .ok_or(CoreError::UnknownSoftware(*software_id))?;
        if !software.supports(request.platform) {
            return Err(DomainError::PlatformNotSupported {
                software_id: *software_id,
                platform: request.platform,
            }
            .into());
        }
    }

    let platform: Option<Platform> = Some(request.platform);
    let ranked: BTreeMap<i64, Vec<i64>> = software_ids
        .iter()
        .map(|software_id| {
            let licenses: Vec<i64> =
                rank_available_licenses(inventory.candidates, &[*software_id], platform, None)
                    .into_iter()
                    .map(|license| license.license_id)
                    .collect();
            (*software_id, licenses)
        })
        .collect();
    let coverage: Vec<LicensedSoftware> = inventory
        .candidates
        .iter()
        .flat_map(|c| c.coverage.iter().cloned())
        .collect();

    let mut ledger: SeatLedger =
        SeatLedger::from_licenses(inventory.candidates.iter().map(|c| &c.license));
    let mut held: BTreeSet<i64> = inventory.held_keys.clone();
    let mut entries: Vec<PlanEntry> = Vec::with_capacity(user_ids.len() * software_ids.len());

    for user_id in &user_ids {
        for software_id in &software_ids {
            if request.skip_existing && inventory.existing.contains(&(*user_id, *software_id)) {
                entries.push(PlanEntry {
                    user_id: *user_id,
                    software_id: *software_id,
                    outcome: PlanOutcome::SkippedExisting,
                });
                continue;
            }

            let license_id: Option<i64> = ranked
                .get(software_id)
                .and_then(|licenses| licenses.iter().copied().find(|id| ledger.take(*id)));

            let outcome: PlanOutcome = match license_id {
                Some(license_id) => {
                    let key: Option<&LicenseKey> = available_keys(
                        &coverage,
                        inventory.keys,
                        license_id,
                        *software_id,
                        platform,
                        &held,
                        None,
                    )
                    .into_iter()
                    .next();
                    if let Some(key) = key
                        && key.activation_type.is_exclusive()
                    {
                        held.insert(key.license_key_id);
                    }
                    PlanOutcome::Assign {
                        license_id,
                        license_key_id: key.map(|k| k.license_key_id),
                    }
                }
                None if request.skip_unlicensed => PlanOutcome::SkippedUnlicensed,
                None => PlanOutcome::Unlicensed,
            };
            entries.push(PlanEntry {
                user_id: *user_id,
                software_id: *software_id,
                outcome,
            });
        }
    }

    debug!(
        users = user_ids.len(),
        softwares = software_ids.len(),
        entries = entries.len(),
        "Planned bulk assignment"
    );

    Ok(BulkAssignPlan {
        platform: request.platform,
        note: request.note.clone(),
        entries,
    })
}
