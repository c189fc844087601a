// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! One-shot maintenance commands run from the command line or a scheduler.
//!
//! Jobs act as a system actor so their changes show up in the audit trail.

use std::path::Path;

use time::OffsetDateTime;
use tracing::{info, warn};

use lms_api::{
    ApiError, AuthenticatedActor, LicenseReportQuery, ReconcileRequest, SyncDirectoryRequest,
    SyncDirectoryResponse,
};
use lms_audit::Cause;
use lms_persistence::{Persistence, ReconcileOutcome};

fn job_cause(job: &str, description: &str) -> Cause {
    Cause::new(
        format!("{job}-{}", OffsetDateTime::now_utc().unix_timestamp()),
        description.to_string(),
    )
}

/// Builds the license report and renders it as text or JSON.
///
/// # Errors
///
/// Returns an error if the report cannot be built or serialized.
pub fn run_report(
    persistence: &mut Persistence,
    query: &LicenseReportQuery,
    default_warning_days: i64,
    json: bool,
) -> Result<String, Box<dyn std::error::Error>> {
    let today = OffsetDateTime::now_utc().date();
    let report = lms_api::license_report(persistence, query, today, default_warning_days)?;
    info!(
        expiring = report.expiring.len(),
        available = report.available.len(),
        "Built license report"
    );
    if json {
        Ok(serde_json::to_string_pretty(&report)?)
    } else {
        Ok(report.render_text())
    }
}

/// Synchronizes users from a directory export on disk.
///
/// # Errors
///
/// Returns an error if the file cannot be read or the sync fails.
pub fn run_sync_users(
    persistence: &mut Persistence,
    csv_path: &Path,
    dry_run: bool,
) -> Result<SyncDirectoryResponse, Box<dyn std::error::Error>> {
    let csv_content: String = std::fs::read_to_string(csv_path)?;
    let response: SyncDirectoryResponse = lms_api::sync_directory(
        persistence,
        &SyncDirectoryRequest {
            csv_content,
            dry_run,
        },
        &AuthenticatedActor::system("sync-users"),
        job_cause("sync-users", "Directory sync"),
    )?;

    for rejected in &response.rejected {
        warn!(email = %rejected.email, reason = %rejected.reason, "Directory entry rejected");
    }
    info!(
        dry_run,
        created = response.created.len(),
        deactivated = response.deactivated.len(),
        skipped = response.skipped,
        "Directory sync finished"
    );
    Ok(response)
}

/// Recounts seat usage and optionally repairs it.
///
/// # Errors
///
/// Returns an error if the recount or a repair fails.
pub fn run_reconcile(
    persistence: &mut Persistence,
    repair: bool,
) -> Result<ReconcileOutcome, ApiError> {
    let outcome: ReconcileOutcome = lms_api::reconcile_used_totals(
        persistence,
        ReconcileRequest { repair },
        &AuthenticatedActor::system("reconcile"),
        job_cause("reconcile", "Seat count reconciliation"),
    )?;

    for mismatch in &outcome.mismatches {
        warn!(
            license_id = mismatch.license_id,
            stored = mismatch.stored,
            counted = mismatch.counted,
            total = mismatch.total,
            "Seat count mismatch"
        );
    }
    info!(
        mismatches = outcome.mismatches.len(),
        repaired = outcome.repaired.len(),
        "Reconciliation finished"
    );
    Ok(outcome)
}
