// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Read-only license reports.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use time::Date;

use lms_domain::{License, LicenseType};

/// Default look-ahead for expiring subscriptions, in days.
pub const DEFAULT_WARNING_DAYS: i64 = 30;

/// Largest accepted look-ahead, in days.
pub const MAX_WARNING_DAYS: i64 = 3650;

/// A license with the names needed to report on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LicenseOverview {
    pub license: License,
    pub family_name: String,
    /// (software id, display name) for everything the license covers.
    pub softwares: Vec<(i64, String)>,
}

/// Licenses covering the same family and softwares, added up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryRow {
    pub key: String,
    pub family_name: String,
    pub software_ids: Vec<i64>,
    pub software_names: Vec<String>,
    pub total: u64,
    pub used_total: u64,
    pub remaining: u64,
}

/// Groups licenses by family and covered softwares.
///
/// Rows are keyed `"{family}_{id}_{id}..."` with software ids ascending and
/// sorted by that key.
#[must_use]
pub fn summarize_licenses(licenses: &[LicenseOverview]) -> Vec<SummaryRow> {
    let mut rows: BTreeMap<String, SummaryRow> = BTreeMap::new();
    for overview in licenses {
        let covered: BTreeMap<i64, &str> = overview
            .softwares
            .iter()
            .map(|(id, name)| (*id, name.as_str()))
            .collect();
        let mut key: String = overview.family_name.clone();
        for id in covered.keys() {
            key.push('_');
            key.push_str(&id.to_string());
        }

        let row: &mut SummaryRow = rows.entry(key.clone()).or_insert_with(|| SummaryRow {
            key,
            family_name: overview.family_name.clone(),
            software_ids: covered.keys().copied().collect(),
            software_names: covered.values().map(|name| (*name).to_string()).collect(),
            total: 0,
            used_total: 0,
            remaining: 0,
        });
        row.total += u64::from(overview.license.total);
        row.used_total += u64::from(overview.license.used_total);
        row.remaining = row.total.saturating_sub(row.used_total);
    }
    rows.into_values().collect()
}

/// One unlicensed assignment, as loaded for the report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnlicensedUse {
    pub software_id: i64,
    pub software_name: String,
    pub username: String,
}

/// Users of a software that have no license seat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnlicensedSoftware {
    pub software_id: i64,
    pub software_name: String,
    pub usernames: Vec<String>,
    pub count: usize,
}

/// Groups unlicensed assignments per software, ordered by software id.
#[must_use]
pub fn group_unlicensed(uses: &[UnlicensedUse]) -> Vec<UnlicensedSoftware> {
    let mut grouped: BTreeMap<i64, UnlicensedSoftware> = BTreeMap::new();
    for usage in uses {
        let entry: &mut UnlicensedSoftware =
            grouped
                .entry(usage.software_id)
                .or_insert_with(|| UnlicensedSoftware {
                    software_id: usage.software_id,
                    software_name: usage.software_name.clone(),
                    usernames: Vec::new(),
                    count: 0,
                });
        entry.usernames.push(usage.username.clone());
        entry.count += 1;
    }
    grouped.into_values().collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpiringLicense {
    pub license_id: i64,
    pub description: String,
    pub ended_date: Option<String>,
    pub remaining_days: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailableLicense {
    pub license_id: i64,
    pub description: String,
    pub license_type: LicenseType,
    pub total: u32,
    pub used_total: u32,
    pub remaining: u32,
}

/// The periodic license report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenseReport {
    pub generated_on: String,
    pub warning_days: i64,
    /// Subscriptions ending within the warning window, soonest first.
    pub expiring: Vec<ExpiringLicense>,
    /// Licenses with free seats, excluding expired subscriptions.
    pub available: Vec<AvailableLicense>,
    pub unlicensed: Option<Vec<UnlicensedSoftware>>,
}

/// Builds the license report for `today`.
#[must_use]
pub fn build_license_report(
    licenses: &[License],
    today: Date,
    warning_days: i64,
    unlicensed: Option<Vec<UnlicensedSoftware>>,
) -> LicenseReport {
    let mut expiring: Vec<&License> = licenses
        .iter()
        .filter(|license| license.is_expiring(today, warning_days))
        .collect();
    expiring.sort_by_key(|license| (license.ended_date, license.license_id));

    let mut available: Vec<&License> = licenses
        .iter()
        .filter(|license| license.remaining() > 0 && !license.is_expired(today))
        .collect();
    available.sort_by(|a, b| {
        a.description
            .cmp(&b.description)
            .then(a.license_id.cmp(&b.license_id))
    });

    LicenseReport {
        generated_on: lms_domain::format_date(today),
        warning_days,
        expiring: expiring
            .into_iter()
            .map(|license| ExpiringLicense {
                license_id: license.license_id,
                description: license.description.clone(),
                ended_date: license.ended_date.map(lms_domain::format_date),
                remaining_days: license.remaining_days(today).unwrap_or(0),
            })
            .collect(),
        available: available
            .into_iter()
            .map(|license| AvailableLicense {
                license_id: license.license_id,
                description: license.description.clone(),
                license_type: license.license_type,
                total: license.total,
                used_total: license.used_total,
                remaining: license.remaining(),
            })
            .collect(),
        unlicensed,
    }
}

impl LicenseReport {
    /// Renders the report as plain text for terminals and mail bodies.
    #[must_use]
    pub fn render_text(&self) -> String {
        let mut lines: Vec<String> = vec![format!("License report for {}", self.generated_on)];

        lines.push(String::new());
        lines.push(format!(
            "Subscriptions ending within {} days:",
            self.warning_days
        ));
        if self.expiring.is_empty() {
            lines.push(String::from("  (none)"));
        }
        for license in &self.expiring {
            lines.push(format!(
                "  {} ends {} ({} days left)",
                license.description,
                license.ended_date.as_deref().unwrap_or("-"),
                license.remaining_days
            ));
        }

        lines.push(String::new());
        lines.push(String::from("Licenses with free seats:"));
        if self.available.is_empty() {
            lines.push(String::from("  (none)"));
        }
        for license in &self.available {
            lines.push(format!(
                "  {}: {} of {} free",
                license.description, license.remaining, license.total
            ));
        }

        if let Some(unlicensed) = &self.unlicensed {
            lines.push(String::new());
            lines.push(String::from("Software used without a license:"));
            if unlicensed.is_empty() {
                lines.push(String::from("  (none)"));
            }
            for software in unlicensed {
                lines.push(format!(
                    "  {} ({}): {}",
                    software.software_name,
                    software.count,
                    software.usernames.join(", ")
                ));
            }
        }

        lines.join("\n")
    }
}

/// A license whose stored `used_total` disagrees with its assignments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsedTotalMismatch {
    pub license_id: i64,
    pub stored: u32,
    pub counted: u32,
    pub total: u32,
}

impl UsedTotalMismatch {
    /// Returns whether the counted seats fit in the license.
    #[must_use]
    pub const fn is_repairable(&self) -> bool {
        self.counted <= self.total
    }
}

/// Compares stored `used_total` values with counted assignments.
///
/// `counted` maps license id to the number of assignments referencing it;
/// licenses missing from the map have none.
#[must_use]
pub fn find_used_total_mismatches(
    licenses: &[License],
    counted: &BTreeMap<i64, u32>,
) -> Vec<UsedTotalMismatch> {
    licenses
        .iter()
        .filter_map(|license| {
            let actual: u32 = counted.get(&license.license_id).copied().unwrap_or(0);
            (actual != license.used_total).then(|| UsedTotalMismatch {
                license_id: license.license_id,
                stored: license.used_total,
                counted: actual,
                total: license.total,
            })
        })
        .collect()
}
