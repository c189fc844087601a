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

mod assignment;
mod asset;
mod error;
mod exchange;
mod license;
mod types;
mod validation;

#[cfg(test)]
mod tests;

pub use assignment::{AssignmentContext, AssignmentDraft, LicenseAssignment, validate_assignment};
pub use asset::{
    Asset, AssetOrigin, AssetStatus, AssetType, Location, Manufacturer, Office, asset_code,
    validate_asset_dates,
};
pub use error::DomainError;
pub use exchange::{
    AssetPlacement, Exchange, ExchangeDecision, ExchangeKind, ExchangeReason, ExchangeRequest,
    ExchangeStatus, FRESH_WINDOW, SenderStanding, validate_exchange_start,
};
pub use license::{
    License, LicenseKey, LicenseTerms, LicensedSoftware, MIN_TERM_DAYS, license_description,
    validate_license_terms, validate_licensed_software,
};
pub use types::{
    ActivationType, LicenseType, Platform, Software, SoftwareFamily, Supplier, User, format_date,
    parse_date,
};
pub use validation::{
    MAX_NAME_LENGTH, email_local_part, validate_name, validate_optional_name,
    validate_user_fields,
};
