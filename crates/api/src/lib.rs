// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! API boundary of the license management system.
//!
//! Requests arrive as plain serde DTOs with enums and dates as strings.
//! Handlers parse them into domain types, call persistence, and record one
//! audit event per successful state change. Domain and persistence errors
//! are translated into [`ApiError`] here so that transports never see them.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(clippy::multiple_crate_versions)]

mod auth;
mod directory_import;
mod error;
mod handlers;
mod request_response;

#[cfg(test)]
mod tests;

pub use auth::{ActorKind, AuthenticatedActor};
pub use directory_import::{DirectoryImportError, parse_directory_csv};
pub use error::{
    ApiError, AuthError, translate_core_error, translate_domain_error,
    translate_persistence_error,
};
pub use handlers::{
    add_license_key, add_licensed_software, add_location_manager, apply_bulk_assignment,
    available_keys, available_licenses, create_asset, create_asset_type, create_assignment,
    create_license, create_location, create_manufacturer, create_office, create_software,
    create_software_family, create_supplier, create_user, decide_exchange, delete_assignments,
    get_asset, get_audit_event, get_audit_trail, get_license, get_recent_audit_events,
    license_report, license_summary, list_asset_types, list_assignments, list_licenses,
    list_locations, list_manufacturers, list_offices, list_software_families, list_softwares,
    list_suppliers, list_users, list_visible_assets, preview_bulk_assignment,
    reconcile_used_totals, record_kitting, set_license_active, set_user_active, start_exchange,
    sync_directory, unlicensed_softwares, update_asset_status, update_assignment,
    update_license,
};
pub use request_response::*;
