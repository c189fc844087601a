// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! API request and response data transfer objects.
//!
//! Requests carry enum values and dates as strings so that parse failures
//! are reported per field. Responses reuse the domain entities, which
//! serialize dates as `YYYY-MM-DD`.

use lms::{BulkAssignPlan, SummaryRow, UnlicensedSoftware};
use lms_audit::AuditEvent;
use lms_domain::{
    Asset, AssetType, Exchange, ExchangeDecision, License, LicenseAssignment, LicenseKey,
    LicensedSoftware, Location, Manufacturer, Office, Software, SoftwareFamily, Supplier, User,
};
use serde::{Deserialize, Serialize};

/// Response for any request that created one entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedResponse {
    /// The identifier of the new entity.
    pub id: i64,
    /// A success message.
    pub message: String,
}

/// Response for requests that change an entity without returning it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdatedResponse {
    pub id: i64,
    pub message: String,
}

/// Activates or deactivates a user or a license.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetActiveRequest {
    pub is_active: bool,
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    /// Date joined (ISO 8601), optional.
    #[serde(default)]
    pub date_joined: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListUsersQuery {
    /// Username prefix.
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub active_only: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListUsersResponse {
    pub users: Vec<User>,
}

/// A directory export to synchronize users from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncDirectoryRequest {
    /// The CSV content of the export.
    pub csv_content: String,
    /// Report what would change without writing anything.
    #[serde(default)]
    pub dry_run: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectedEntry {
    pub email: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncDirectoryResponse {
    pub dry_run: bool,
    /// Usernames created (or to be created on a dry run).
    pub created: Vec<String>,
    /// Users deactivated (or to be deactivated on a dry run).
    pub deactivated: Vec<i64>,
    pub skipped: usize,
    pub rejected: Vec<RejectedEntry>,
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateSupplierRequest {
    pub name: String,
    #[serde(default)]
    pub contact: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateSoftwareFamilyRequest {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateSoftwareRequest {
    pub software_family_id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub version: String,
    /// Platform names (`windows`, `macos`, `linux` or `all`).
    pub platforms: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListSuppliersResponse {
    pub suppliers: Vec<Supplier>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListSoftwareFamiliesResponse {
    pub software_families: Vec<SoftwareFamily>,
}

/// A software with its display name, e.g. "Adobe Photoshop 2024".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoftwareInfo {
    #[serde(flatten)]
    pub software: Software,
    pub display_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListSoftwaresResponse {
    pub softwares: Vec<SoftwareInfo>,
}

// ---------------------------------------------------------------------------
// Licenses
// ---------------------------------------------------------------------------

/// The fields of a license, for creation and edits alike.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenseRequest {
    pub software_family_id: i64,
    /// `perpetual`, `subscription` or `oem`.
    pub license_type: String,
    pub total: u32,
    #[serde(default)]
    pub oem_device: Option<String>,
    #[serde(default)]
    pub supplier_id: Option<i64>,
    #[serde(default)]
    pub license_number: String,
    #[serde(default)]
    pub purchased_date: Option<String>,
    #[serde(default)]
    pub started_date: Option<String>,
    #[serde(default)]
    pub ended_date: Option<String>,
    #[serde(default)]
    pub note: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenseResponse {
    pub license: License,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddLicensedSoftwareRequest {
    pub software_id: i64,
    /// Defaults to `all`.
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub note: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddLicenseKeyRequest {
    pub serial_key: String,
    /// `single`, `volume` or `server`.
    pub activation_type: String,
}

/// A license with everything it covers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenseDetailResponse {
    pub license: License,
    pub remaining: u32,
    pub softwares: Vec<LicensedSoftware>,
    pub keys: Vec<LicenseKey>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListLicensesResponse {
    pub licenses: Vec<License>,
}

/// Which licenses could back an assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailableLicensesQuery {
    pub software_ids: Vec<i64>,
    #[serde(default)]
    pub platform: Option<String>,
    /// The license of the assignment being edited, kept even when full.
    #[serde(default)]
    pub current_license_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailableLicenseInfo {
    pub license_id: i64,
    pub description: String,
    pub remaining: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailableLicensesResponse {
    /// Ordered by ascending remaining capacity.
    pub licenses: Vec<AvailableLicenseInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailableKeysQuery {
    pub license_id: i64,
    pub software_id: i64,
    #[serde(default)]
    pub platform: Option<String>,
    /// The key of the assignment being edited, kept even when held.
    #[serde(default)]
    pub current_license_key_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailableKeysResponse {
    pub keys: Vec<LicenseKey>,
}

// ---------------------------------------------------------------------------
// Assignments
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentRequest {
    pub user_id: i64,
    pub software_id: i64,
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub license_id: Option<i64>,
    #[serde(default)]
    pub license_key_id: Option<i64>,
    #[serde(default)]
    pub note: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentResponse {
    pub assignment: LicenseAssignment,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteAssignmentsRequest {
    pub assignment_ids: Vec<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteAssignmentsResponse {
    pub deleted: Vec<i64>,
    pub message: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListAssignmentsQuery {
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub software_id: Option<i64>,
    #[serde(default)]
    pub license_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListAssignmentsResponse {
    pub assignments: Vec<LicenseAssignment>,
}

/// Users × softwares to assign in one go.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkAssignmentRequest {
    pub user_ids: Vec<i64>,
    pub software_ids: Vec<i64>,
    pub platform: String,
    #[serde(default)]
    pub skip_existing: bool,
    #[serde(default)]
    pub skip_unlicensed: bool,
    #[serde(default)]
    pub note: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkAssignmentResponse {
    /// Whether the plan was written.
    pub applied: bool,
    pub plan: BulkAssignPlan,
    /// Assignments created, in plan order; empty for a preview.
    pub created: Vec<i64>,
    pub licensed: usize,
    pub unlicensed: usize,
    pub skipped: usize,
}

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenseSummaryResponse {
    pub rows: Vec<SummaryRow>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnlicensedSoftwareResponse {
    pub softwares: Vec<UnlicensedSoftware>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenseReportQuery {
    /// Report date (ISO 8601); today when absent.
    #[serde(default)]
    pub today: Option<String>,
    #[serde(default)]
    pub warning_days: Option<i64>,
    #[serde(default)]
    pub include_unlicensed: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileRequest {
    /// Rewrite mismatching counts that fit the license.
    #[serde(default)]
    pub repair: bool,
}

// ---------------------------------------------------------------------------
// Assets
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateOfficeRequest {
    pub name: String,
    #[serde(default)]
    pub address: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateLocationRequest {
    pub office_id: i64,
    pub name: String,
    #[serde(default)]
    pub floor: Option<i32>,
    #[serde(default)]
    pub room: Option<i32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddLocationManagerRequest {
    pub user_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateManufacturerRequest {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateAssetTypeRequest {
    pub name: String,
    #[serde(default)]
    pub kitting_required: bool,
    #[serde(default)]
    pub user_searchable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListOfficesResponse {
    pub offices: Vec<Office>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListLocationsResponse {
    pub locations: Vec<Location>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListManufacturersResponse {
    pub manufacturers: Vec<Manufacturer>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListAssetTypesResponse {
    pub asset_types: Vec<AssetType>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateAssetRequest {
    pub name: String,
    #[serde(default)]
    pub old_code: String,
    pub asset_type_id: i64,
    #[serde(default)]
    pub supplier_id: Option<i64>,
    #[serde(default)]
    pub manufacturer_id: Option<i64>,
    #[serde(default)]
    pub purchased_date: Option<String>,
    #[serde(default)]
    pub warranty_start_date: Option<String>,
    #[serde(default)]
    pub warranty_end_date: Option<String>,
    /// `brand_new`, `compensated` or `reused`.
    pub origin: String,
    pub status: String,
    #[serde(default)]
    pub location_id: Option<i64>,
    #[serde(default)]
    pub note: String,
    /// The user creating the asset, who becomes its first holder.
    pub creator_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateAssetStatusRequest {
    pub status: String,
}

/// An asset with its printed code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetInfo {
    pub code: String,
    #[serde(flatten)]
    pub asset: Asset,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetResponse {
    pub asset: AssetInfo,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetDetailResponse {
    pub asset: AssetInfo,
    /// Newest first.
    pub exchanges: Vec<ExchangeInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListAssetsResponse {
    pub assets: Vec<AssetInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartExchangeRequest {
    pub asset_id: i64,
    /// `hand_over`, `user_assignment` or `location_assignment`.
    pub kind: String,
    pub sender_id: i64,
    pub receiver_id: i64,
    #[serde(default)]
    pub destination_id: Option<i64>,
    pub reason: String,
    #[serde(default)]
    pub comment: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecideExchangeRequest {
    /// The user taking the decision.
    pub user_id: i64,
    pub decision: ExchangeDecision,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordKittingRequest {
    pub user_id: i64,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub due_date: Option<String>,
}

/// An exchange and whether it started in the last few minutes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeInfo {
    #[serde(flatten)]
    pub exchange: Exchange,
    pub is_fresh: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeResponse {
    pub exchange: ExchangeInfo,
    pub message: String,
}

// ---------------------------------------------------------------------------
// Audit
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditTrailResponse {
    pub events: Vec<AuditEvent>,
}
