// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]

mod allocation;
mod bulk;
mod command;
mod directory;
mod error;
mod reports;

#[cfg(test)]
mod tests;

pub use allocation::{
    LicenseCandidate, SeatChange, SeatDelta, SeatLedger, available_keys, rank_available_licenses,
    seat_deltas, seats_released_by,
};
pub use bulk::{
    BulkAssignPlan, BulkAssignRequest, BulkInventory, PlanEntry, PlanOutcome,
    plan_bulk_assignment,
};
pub use command::Command;
pub use directory::{DirectoryEntry, DirectorySyncPlan, UserDraft, plan_directory_sync};
pub use error::CoreError;
pub use reports::{
    AvailableLicense, DEFAULT_WARNING_DAYS, ExpiringLicense, LicenseOverview, LicenseReport,
    MAX_WARNING_DAYS, SummaryRow, UnlicensedSoftware, UnlicensedUse, UsedTotalMismatch,
    build_license_report, find_used_total_mismatches, group_unlicensed, summarize_licenses,
};
