// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! License assignment mutations.
//!
//! Every change to an assignment's license moves seats in the same write
//! transaction that writes the assignment. The assignment rows being
//! changed are locked first, then license rows in ascending id order, all
//! before anything is validated. Two writers touching the same rows always
//! queue in the same order.

use std::collections::{BTreeMap, BTreeSet};

use diesel::prelude::*;
use diesel::{MysqlConnection, SqliteConnection};
use tracing::{debug, info, warn};

use lms::{
    BulkAssignPlan, BulkAssignRequest, SeatDelta, UsedTotalMismatch, find_used_total_mismatches,
    plan_bulk_assignment, seat_deltas, seats_released_by,
};
use lms_domain::{
    AssignmentContext, AssignmentDraft, License, LicenseAssignment, LicenseKey, LicensedSoftware,
    Platform, Software, validate_assignment,
};

use crate::backend::PersistenceBackend;
use crate::data_models::{BulkInventoryData, ReconcileOutcome, seats_to_column};
use crate::diesel_schema::{license_assignments, licenses};
use crate::error::PersistenceError;

backend_fn! {
/// Validates a draft and writes it, moving seats as needed.
///
/// With `previous` the stored assignment is updated in place; otherwise a
/// new one is inserted. Must run inside a write transaction, with
/// `previous` already locked. The draft's license is locked as well when
/// it carries a key, so key checks and seat moves see settled rows.
///
/// # Errors
///
/// Returns the first violated rule, or `NotFound` for a missing
/// software, license, key or stored assignment.
pub fn insert_assignment(
    conn: &mut _,
    draft: &AssignmentDraft,
    previous: Option<&LicenseAssignment>,
) -> Result<i64, PersistenceError> {
    let deltas: Vec<SeatDelta> = seat_deltas(previous.and_then(|a| a.license_id), draft.license_id);
    let mut to_lock: BTreeSet<i64> = deltas.iter().map(|delta| delta.license_id).collect();
    if draft.license_key_id.is_some()
        && let Some(license_id) = draft.license_id
    {
        to_lock.insert(license_id);
    }
    let mut locked: BTreeMap<i64, License> = BTreeMap::new();
    for license_id in to_lock {
        locked.insert(license_id, conn.lock_license(license_id)?);
    }

    let license: Option<License> = match draft.license_id {
        Some(license_id) => match locked.get(&license_id) {
            Some(license) => Some(license.clone()),
            None => Some(conn.load_license(license_id)?),
        },
        None => None,
    };
    let software: Software = conn.load_software(draft.software_id)?;
    let coverage: Vec<LicensedSoftware> = match &license {
        Some(license) => conn.load_coverage(license.license_id)?,
        None => Vec::new(),
    };
    let key: Option<LicenseKey> = match draft.license_key_id {
        Some(license_key_id) => Some(conn.load_license_key(license_key_id)?),
        None => None,
    };
    let key_held_elsewhere: bool = match &key {
        Some(key) => {
            let own: Option<i64> = previous.map(|a| a.assignment_id);
            conn.key_holders(key.license_key_id)?
                .into_iter()
                .any(|holder| Some(holder) != own)
        }
        None => false,
    };

    let context: AssignmentContext<'_> = AssignmentContext {
        software: &software,
        license: license.as_ref(),
        coverage: &coverage,
        key: key.as_ref(),
        key_held_elsewhere,
        previous,
    };
    validate_assignment(draft, &context).inspect_err(|e| {
        warn!(
            user_id = draft.user_id,
            software_id = draft.software_id,
            error = %e,
            "Assignment rejected"
        );
    })?;

    for delta in &deltas {
        let license: &License = locked
            .get(&delta.license_id)
            .ok_or_else(|| PersistenceError::NotFound(format!("License {}", delta.license_id)))?;
        conn.apply_seat_delta(license, delta)?;
    }

    let platform: Option<&str> = draft.platform.as_ref().map(Platform::as_str);
    let assignment_id: i64 = if let Some(previous) = previous {
        let updated: usize = diesel::update(
            license_assignments::table
                .filter(license_assignments::assignment_id.eq(previous.assignment_id)),
        )
        .set((
            license_assignments::user_id.eq(draft.user_id),
            license_assignments::software_id.eq(draft.software_id),
            license_assignments::platform.eq(platform),
            license_assignments::license_id.eq(draft.license_id),
            license_assignments::license_key_id.eq(draft.license_key_id),
            license_assignments::note.eq(&draft.note),
        ))
        .execute(conn)?;
        if updated == 0 {
            return Err(PersistenceError::NotFound(format!(
                "Assignment {}",
                previous.assignment_id
            )));
        }
        previous.assignment_id
    } else {
        diesel::insert_into(license_assignments::table)
            .values((
                license_assignments::user_id.eq(draft.user_id),
                license_assignments::software_id.eq(draft.software_id),
                license_assignments::platform.eq(platform),
                license_assignments::license_id.eq(draft.license_id),
                license_assignments::license_key_id.eq(draft.license_key_id),
                license_assignments::note.eq(&draft.note),
            ))
            .execute(conn)?;
        conn.get_last_insert_rowid()?
    };

    debug!(
        assignment_id,
        user_id = draft.user_id,
        software_id = draft.software_id,
        license_id = ?draft.license_id,
        "Stored assignment"
    );
    Ok(assignment_id)
}
}

backend_fn! {
/// Creates an assignment.
///
/// # Errors
///
/// Returns the first violated rule; no seat is taken then.
pub fn create_assignment(conn: &mut _, draft: &AssignmentDraft) -> Result<i64, PersistenceError> {
    let assignment_id: i64 = conn.write_transaction(|conn| conn.insert_assignment(draft, None))?;
    info!(
        assignment_id,
        user_id = draft.user_id,
        software_id = draft.software_id,
        "Created assignment"
    );
    Ok(assignment_id)
}
}

backend_fn! {
/// Replaces an assignment with `draft`.
///
/// Moving to another license releases the old seat and reserves the new
/// one in the same transaction. Returns the assignment as it was before.
///
/// # Errors
///
/// Returns `NotFound` for an unknown assignment, or the first violated rule.
pub fn update_assignment(
    conn: &mut _,
    assignment_id: i64,
    draft: &AssignmentDraft,
) -> Result<LicenseAssignment, PersistenceError> {
    let previous: LicenseAssignment = conn.write_transaction(|conn| {
        let previous: LicenseAssignment = conn
            .lock_assignments(&[assignment_id])?
            .into_iter()
            .next()
            .ok_or_else(|| PersistenceError::NotFound(format!("Assignment {assignment_id}")))?;
        conn.insert_assignment(draft, Some(&previous))?;
        Ok(previous)
    })?;
    info!(assignment_id, license_id = ?draft.license_id, "Updated assignment");
    Ok(previous)
}
}

backend_fn! {
/// Deletes assignments and releases their seats.
///
/// Returns the removed assignments.
///
/// # Errors
///
/// Returns `NotFound` if any ID is unknown; nothing is deleted then.
pub fn delete_assignments(
    conn: &mut _,
    assignment_ids: &[i64],
) -> Result<Vec<LicenseAssignment>, PersistenceError> {
    if assignment_ids.is_empty() {
        return Ok(Vec::new());
    }

    let removed: Vec<LicenseAssignment> = conn.write_transaction(|conn| {
        let removed: Vec<LicenseAssignment> = conn.lock_assignments(assignment_ids)?;

        for delta in seats_released_by(&removed) {
            let license: License = conn.lock_license(delta.license_id)?;
            conn.apply_seat_delta(&license, &delta)?;
        }
        let deleted: usize = diesel::delete(
            license_assignments::table
                .filter(license_assignments::assignment_id.eq_any(assignment_ids)),
        )
        .execute(conn)?;
        if deleted != removed.len() {
            return Err(PersistenceError::NotFound(format!(
                "Assignments {assignment_ids:?}"
            )));
        }
        Ok(removed)
    })?;

    info!(count = removed.len(), "Deleted assignments");
    Ok(removed)
}
}

backend_fn! {
/// Plans a bulk assignment without writing anything.
///
/// # Errors
///
/// Returns an error if the request is invalid or a query fails.
pub fn preview_bulk_assignment(
    conn: &mut _,
    request: &BulkAssignRequest,
) -> Result<BulkAssignPlan, PersistenceError> {
    let inventory: BulkInventoryData = conn.load_bulk_inventory(request)?;
    Ok(plan_bulk_assignment(request, &inventory.as_inventory())?)
}
}

backend_fn! {
/// Plans and stores a bulk assignment in one transaction.
///
/// The plan is rebuilt from the current state under the write lock, so
/// it may differ from an earlier preview. Returns the plan that was
/// applied and the IDs of the created assignments, in plan order.
///
/// # Errors
///
/// Returns an error if the request is invalid or any assignment fails;
/// nothing is stored then.
pub fn apply_bulk_assignment(
    conn: &mut _,
    request: &BulkAssignRequest,
) -> Result<(BulkAssignPlan, Vec<i64>), PersistenceError> {
    let (plan, created): (BulkAssignPlan, Vec<i64>) = conn.write_transaction(|conn| {
        let inventory: BulkInventoryData = conn.load_bulk_inventory(request)?;
        let plan: BulkAssignPlan = plan_bulk_assignment(request, &inventory.as_inventory())?;
        let created: Vec<i64> = plan
            .drafts()
            .iter()
            .map(|draft| conn.insert_assignment(draft, None))
            .collect::<Result<_, _>>()?;
        Ok((plan, created))
    })?;

    info!(
        entries = plan.entries.len(),
        created = created.len(),
        licensed = plan.licensed(),
        "Applied bulk assignment"
    );
    Ok((plan, created))
}
}

backend_fn! {
/// Recounts `used_total` from the assignments.
///
/// With `repair`, mismatches whose count fits in the license total are
/// rewritten; the others are only reported.
///
/// # Errors
///
/// Returns an error if a query or update fails.
pub fn reconcile_used_totals(
    conn: &mut _,
    repair: bool,
) -> Result<ReconcileOutcome, PersistenceError> {
    conn.write_transaction(|conn| {
        let all: Vec<License> = conn.load_licenses(None)?;
        let counted: BTreeMap<i64, u32> = conn.count_assignments_by_license()?;
        let mismatches: Vec<UsedTotalMismatch> = find_used_total_mismatches(&all, &counted);

        let mut repaired: Vec<i64> = Vec::new();
        for mismatch in &mismatches {
            warn!(
                license_id = mismatch.license_id,
                stored = mismatch.stored,
                counted = mismatch.counted,
                "used_total does not match assignments"
            );
            if repair && mismatch.is_repairable() {
                diesel::update(licenses::table.filter(licenses::license_id.eq(mismatch.license_id)))
                    .set(licenses::used_total.eq(seats_to_column(mismatch.counted)?))
                    .execute(conn)?;
                repaired.push(mismatch.license_id);
            }
        }

        info!(
            mismatches = mismatches.len(),
            repaired = repaired.len(),
            "Reconciled used totals"
        );
        Ok(ReconcileOutcome {
            mismatches,
            repaired,
        })
    })
}
}
