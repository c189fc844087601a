// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! HTTP routes.
//!
//! Handlers lock the shared persistence, delegate to `lms_api`, and wrap the
//! result in JSON. Write routes require [`Attribution`].

use axum::{
    Json, Router,
    extract::{Path, Query, State as AxumState},
    routing::{get, post, put},
};
use serde::Deserialize;
use time::OffsetDateTime;
use tracing::info;

use lms::LicenseReport;
use lms_api::{
    AddLicenseKeyRequest, AddLicensedSoftwareRequest, AddLocationManagerRequest,
    AssetDetailResponse, AssetResponse, AssignmentRequest, AssignmentResponse,
    AuditTrailResponse, AvailableKeysQuery, AvailableKeysResponse, AvailableLicensesQuery,
    AvailableLicensesResponse, BulkAssignmentRequest, BulkAssignmentResponse, CreateAssetRequest,
    CreateAssetTypeRequest, CreateLocationRequest, CreateManufacturerRequest,
    CreateOfficeRequest, CreateSoftwareFamilyRequest, CreateSoftwareRequest,
    CreateSupplierRequest, CreateUserRequest, CreatedResponse, DecideExchangeRequest,
    DeleteAssignmentsRequest, DeleteAssignmentsResponse, ExchangeResponse,
    LicenseDetailResponse, LicenseReportQuery, LicenseRequest, LicenseResponse,
    LicenseSummaryResponse, ListAssetTypesResponse, ListAssetsResponse, ListAssignmentsQuery,
    ListAssignmentsResponse, ListLicensesResponse, ListLocationsResponse,
    ListManufacturersResponse, ListOfficesResponse, ListSoftwareFamiliesResponse,
    ListSoftwaresResponse, ListSuppliersResponse, ListUsersQuery, ListUsersResponse,
    ReconcileRequest, RecordKittingRequest, SetActiveRequest, StartExchangeRequest,
    SyncDirectoryRequest, SyncDirectoryResponse, UnlicensedSoftwareResponse,
    UpdateAssetStatusRequest, UpdatedResponse,
};
use lms_audit::AuditEvent;
use lms_persistence::ReconcileOutcome;

use crate::attribution::Attribution;
use crate::{AppState, HttpError};

/// Number of events returned by `/audit/recent` when no limit is given.
const DEFAULT_RECENT_EVENTS: usize = 50;

#[derive(Debug, Default, Deserialize)]
struct FamilyFilter {
    family_id: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
struct OfficeFilter {
    office_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct AuditTrailQuery {
    entity_type: String,
    entity_id: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
struct RecentEventsQuery {
    limit: Option<usize>,
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

async fn handle_create_user(
    AxumState(app_state): AxumState<AppState>,
    Attribution(actor, cause): Attribution,
    Json(req): Json<CreateUserRequest>,
) -> Result<Json<CreatedResponse>, HttpError> {
    info!(actor_id = %actor.id, username = %req.username, "Handling create_user request");
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(lms_api::create_user(
        &mut persistence,
        &req,
        &actor,
        cause,
    )?))
}

async fn handle_list_users(
    AxumState(app_state): AxumState<AppState>,
    Query(query): Query<ListUsersQuery>,
) -> Result<Json<ListUsersResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(lms_api::list_users(&mut persistence, &query)?))
}

async fn handle_set_user_active(
    AxumState(app_state): AxumState<AppState>,
    Path(user_id): Path<i64>,
    Attribution(actor, cause): Attribution,
    Json(req): Json<SetActiveRequest>,
) -> Result<Json<UpdatedResponse>, HttpError> {
    info!(
        actor_id = %actor.id,
        user_id,
        is_active = req.is_active,
        "Handling set_user_active request"
    );
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(lms_api::set_user_active(
        &mut persistence,
        user_id,
        req,
        &actor,
        cause,
    )?))
}

async fn handle_sync_directory(
    AxumState(app_state): AxumState<AppState>,
    Attribution(actor, cause): Attribution,
    Json(req): Json<SyncDirectoryRequest>,
) -> Result<Json<SyncDirectoryResponse>, HttpError> {
    info!(actor_id = %actor.id, dry_run = req.dry_run, "Handling sync_directory request");
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(lms_api::sync_directory(
        &mut persistence,
        &req,
        &actor,
        cause,
    )?))
}

async fn handle_list_user_assets(
    AxumState(app_state): AxumState<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<ListAssetsResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(lms_api::list_visible_assets(
        &mut persistence,
        user_id,
        &app_state.asset_code_prefix,
    )?))
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

async fn handle_create_supplier(
    AxumState(app_state): AxumState<AppState>,
    Attribution(actor, cause): Attribution,
    Json(req): Json<CreateSupplierRequest>,
) -> Result<Json<CreatedResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(lms_api::create_supplier(
        &mut persistence,
        &req,
        &actor,
        cause,
    )?))
}

async fn handle_list_suppliers(
    AxumState(app_state): AxumState<AppState>,
) -> Result<Json<ListSuppliersResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(lms_api::list_suppliers(&mut persistence)?))
}

async fn handle_create_software_family(
    AxumState(app_state): AxumState<AppState>,
    Attribution(actor, cause): Attribution,
    Json(req): Json<CreateSoftwareFamilyRequest>,
) -> Result<Json<CreatedResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(lms_api::create_software_family(
        &mut persistence,
        &req,
        &actor,
        cause,
    )?))
}

async fn handle_list_software_families(
    AxumState(app_state): AxumState<AppState>,
) -> Result<Json<ListSoftwareFamiliesResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(lms_api::list_software_families(&mut persistence)?))
}

async fn handle_create_software(
    AxumState(app_state): AxumState<AppState>,
    Attribution(actor, cause): Attribution,
    Json(req): Json<CreateSoftwareRequest>,
) -> Result<Json<CreatedResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(lms_api::create_software(
        &mut persistence,
        &req,
        &actor,
        cause,
    )?))
}

async fn handle_list_softwares(
    AxumState(app_state): AxumState<AppState>,
    Query(filter): Query<FamilyFilter>,
) -> Result<Json<ListSoftwaresResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(lms_api::list_softwares(
        &mut persistence,
        filter.family_id,
    )?))
}

// ---------------------------------------------------------------------------
// Licenses
// ---------------------------------------------------------------------------

async fn handle_create_license(
    AxumState(app_state): AxumState<AppState>,
    Attribution(actor, cause): Attribution,
    Json(req): Json<LicenseRequest>,
) -> Result<Json<LicenseResponse>, HttpError> {
    info!(
        actor_id = %actor.id,
        family_id = req.software_family_id,
        total = req.total,
        "Handling create_license request"
    );
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(lms_api::create_license(
        &mut persistence,
        &req,
        &actor,
        cause,
    )?))
}

async fn handle_update_license(
    AxumState(app_state): AxumState<AppState>,
    Path(license_id): Path<i64>,
    Attribution(actor, cause): Attribution,
    Json(req): Json<LicenseRequest>,
) -> Result<Json<LicenseResponse>, HttpError> {
    info!(
        actor_id = %actor.id,
        license_id,
        total = req.total,
        "Handling update_license request"
    );
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(lms_api::update_license(
        &mut persistence,
        license_id,
        &req,
        &actor,
        cause,
    )?))
}

async fn handle_set_license_active(
    AxumState(app_state): AxumState<AppState>,
    Path(license_id): Path<i64>,
    Attribution(actor, cause): Attribution,
    Json(req): Json<SetActiveRequest>,
) -> Result<Json<UpdatedResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(lms_api::set_license_active(
        &mut persistence,
        license_id,
        req,
        &actor,
        cause,
    )?))
}

async fn handle_get_license(
    AxumState(app_state): AxumState<AppState>,
    Path(license_id): Path<i64>,
) -> Result<Json<LicenseDetailResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(lms_api::get_license(&mut persistence, license_id)?))
}

async fn handle_list_licenses(
    AxumState(app_state): AxumState<AppState>,
    Query(filter): Query<FamilyFilter>,
) -> Result<Json<ListLicensesResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(lms_api::list_licenses(
        &mut persistence,
        filter.family_id,
    )?))
}

async fn handle_add_licensed_software(
    AxumState(app_state): AxumState<AppState>,
    Path(license_id): Path<i64>,
    Attribution(actor, cause): Attribution,
    Json(req): Json<AddLicensedSoftwareRequest>,
) -> Result<Json<CreatedResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(lms_api::add_licensed_software(
        &mut persistence,
        license_id,
        &req,
        &actor,
        cause,
    )?))
}

async fn handle_add_license_key(
    AxumState(app_state): AxumState<AppState>,
    Path(licensed_software_id): Path<i64>,
    Attribution(actor, cause): Attribution,
    Json(req): Json<AddLicenseKeyRequest>,
) -> Result<Json<CreatedResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(lms_api::add_license_key(
        &mut persistence,
        licensed_software_id,
        &req,
        &actor,
        cause,
    )?))
}

/// Takes a JSON body because the software ids form a list.
async fn handle_available_licenses(
    AxumState(app_state): AxumState<AppState>,
    Json(query): Json<AvailableLicensesQuery>,
) -> Result<Json<AvailableLicensesResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(lms_api::available_licenses(&mut persistence, &query)?))
}

async fn handle_available_keys(
    AxumState(app_state): AxumState<AppState>,
    Query(query): Query<AvailableKeysQuery>,
) -> Result<Json<AvailableKeysResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(lms_api::available_keys(&mut persistence, &query)?))
}

// ---------------------------------------------------------------------------
// Assignments
// ---------------------------------------------------------------------------

async fn handle_create_assignment(
    AxumState(app_state): AxumState<AppState>,
    Attribution(actor, cause): Attribution,
    Json(req): Json<AssignmentRequest>,
) -> Result<Json<AssignmentResponse>, HttpError> {
    info!(
        actor_id = %actor.id,
        user_id = req.user_id,
        software_id = req.software_id,
        license_id = ?req.license_id,
        "Handling create_assignment request"
    );
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(lms_api::create_assignment(
        &mut persistence,
        &req,
        &actor,
        cause,
    )?))
}

async fn handle_update_assignment(
    AxumState(app_state): AxumState<AppState>,
    Path(assignment_id): Path<i64>,
    Attribution(actor, cause): Attribution,
    Json(req): Json<AssignmentRequest>,
) -> Result<Json<AssignmentResponse>, HttpError> {
    info!(
        actor_id = %actor.id,
        assignment_id,
        license_id = ?req.license_id,
        "Handling update_assignment request"
    );
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(lms_api::update_assignment(
        &mut persistence,
        assignment_id,
        &req,
        &actor,
        cause,
    )?))
}

async fn handle_delete_assignments(
    AxumState(app_state): AxumState<AppState>,
    Attribution(actor, cause): Attribution,
    Json(req): Json<DeleteAssignmentsRequest>,
) -> Result<Json<DeleteAssignmentsResponse>, HttpError> {
    info!(
        actor_id = %actor.id,
        count = req.assignment_ids.len(),
        "Handling delete_assignments request"
    );
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(lms_api::delete_assignments(
        &mut persistence,
        &req,
        &actor,
        cause,
    )?))
}

async fn handle_list_assignments(
    AxumState(app_state): AxumState<AppState>,
    Query(query): Query<ListAssignmentsQuery>,
) -> Result<Json<ListAssignmentsResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(lms_api::list_assignments(&mut persistence, query)?))
}

async fn handle_preview_bulk_assignment(
    AxumState(app_state): AxumState<AppState>,
    Json(req): Json<BulkAssignmentRequest>,
) -> Result<Json<BulkAssignmentResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(lms_api::preview_bulk_assignment(
        &mut persistence,
        &req,
    )?))
}

async fn handle_apply_bulk_assignment(
    AxumState(app_state): AxumState<AppState>,
    Attribution(actor, cause): Attribution,
    Json(req): Json<BulkAssignmentRequest>,
) -> Result<Json<BulkAssignmentResponse>, HttpError> {
    info!(
        actor_id = %actor.id,
        users = req.user_ids.len(),
        softwares = req.software_ids.len(),
        "Handling bulk assignment request"
    );
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(lms_api::apply_bulk_assignment(
        &mut persistence,
        &req,
        &actor,
        cause,
    )?))
}

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

async fn handle_license_summary(
    AxumState(app_state): AxumState<AppState>,
    Query(filter): Query<FamilyFilter>,
) -> Result<Json<LicenseSummaryResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(lms_api::license_summary(
        &mut persistence,
        filter.family_id,
    )?))
}

async fn handle_unlicensed_softwares(
    AxumState(app_state): AxumState<AppState>,
) -> Result<Json<UnlicensedSoftwareResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(lms_api::unlicensed_softwares(&mut persistence)?))
}

async fn build_report(
    app_state: &AppState,
    query: &LicenseReportQuery,
) -> Result<LicenseReport, HttpError> {
    let today = OffsetDateTime::now_utc().date();
    let mut persistence = app_state.persistence.lock().await;
    Ok(lms_api::license_report(
        &mut persistence,
        query,
        today,
        app_state.report_warning_days,
    )?)
}

async fn handle_license_report(
    AxumState(app_state): AxumState<AppState>,
    Query(query): Query<LicenseReportQuery>,
) -> Result<Json<LicenseReport>, HttpError> {
    Ok(Json(build_report(&app_state, &query).await?))
}

async fn handle_license_report_text(
    AxumState(app_state): AxumState<AppState>,
    Query(query): Query<LicenseReportQuery>,
) -> Result<String, HttpError> {
    Ok(build_report(&app_state, &query).await?.render_text())
}

async fn handle_reconcile(
    AxumState(app_state): AxumState<AppState>,
    Attribution(actor, cause): Attribution,
    Json(req): Json<ReconcileRequest>,
) -> Result<Json<ReconcileOutcome>, HttpError> {
    info!(actor_id = %actor.id, repair = req.repair, "Handling reconcile request");
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(lms_api::reconcile_used_totals(
        &mut persistence,
        req,
        &actor,
        cause,
    )?))
}

// ---------------------------------------------------------------------------
// Offices and asset catalog
// ---------------------------------------------------------------------------

async fn handle_create_office(
    AxumState(app_state): AxumState<AppState>,
    Attribution(actor, cause): Attribution,
    Json(req): Json<CreateOfficeRequest>,
) -> Result<Json<CreatedResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(lms_api::create_office(
        &mut persistence,
        &req,
        &actor,
        cause,
    )?))
}

async fn handle_list_offices(
    AxumState(app_state): AxumState<AppState>,
) -> Result<Json<ListOfficesResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(lms_api::list_offices(&mut persistence)?))
}

async fn handle_create_location(
    AxumState(app_state): AxumState<AppState>,
    Attribution(actor, cause): Attribution,
    Json(req): Json<CreateLocationRequest>,
) -> Result<Json<CreatedResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(lms_api::create_location(
        &mut persistence,
        &req,
        &actor,
        cause,
    )?))
}

async fn handle_list_locations(
    AxumState(app_state): AxumState<AppState>,
    Query(filter): Query<OfficeFilter>,
) -> Result<Json<ListLocationsResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(lms_api::list_locations(
        &mut persistence,
        filter.office_id,
    )?))
}

async fn handle_add_location_manager(
    AxumState(app_state): AxumState<AppState>,
    Path(location_id): Path<i64>,
    Attribution(actor, cause): Attribution,
    Json(req): Json<AddLocationManagerRequest>,
) -> Result<Json<CreatedResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(lms_api::add_location_manager(
        &mut persistence,
        location_id,
        req,
        &actor,
        cause,
    )?))
}

async fn handle_create_manufacturer(
    AxumState(app_state): AxumState<AppState>,
    Attribution(actor, cause): Attribution,
    Json(req): Json<CreateManufacturerRequest>,
) -> Result<Json<CreatedResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(lms_api::create_manufacturer(
        &mut persistence,
        &req,
        &actor,
        cause,
    )?))
}

async fn handle_list_manufacturers(
    AxumState(app_state): AxumState<AppState>,
) -> Result<Json<ListManufacturersResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(lms_api::list_manufacturers(&mut persistence)?))
}

async fn handle_create_asset_type(
    AxumState(app_state): AxumState<AppState>,
    Attribution(actor, cause): Attribution,
    Json(req): Json<CreateAssetTypeRequest>,
) -> Result<Json<CreatedResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(lms_api::create_asset_type(
        &mut persistence,
        &req,
        &actor,
        cause,
    )?))
}

async fn handle_list_asset_types(
    AxumState(app_state): AxumState<AppState>,
) -> Result<Json<ListAssetTypesResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(lms_api::list_asset_types(&mut persistence)?))
}

// ---------------------------------------------------------------------------
// Assets and exchanges
// ---------------------------------------------------------------------------

async fn handle_create_asset(
    AxumState(app_state): AxumState<AppState>,
    Attribution(actor, cause): Attribution,
    Json(req): Json<CreateAssetRequest>,
) -> Result<Json<AssetResponse>, HttpError> {
    info!(actor_id = %actor.id, name = %req.name, "Handling create_asset request");
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(lms_api::create_asset(
        &mut persistence,
        &req,
        &app_state.asset_code_prefix,
        &actor,
        cause,
    )?))
}

async fn handle_get_asset(
    AxumState(app_state): AxumState<AppState>,
    Path(asset_id): Path<i64>,
) -> Result<Json<AssetDetailResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(lms_api::get_asset(
        &mut persistence,
        asset_id,
        &app_state.asset_code_prefix,
    )?))
}

async fn handle_update_asset_status(
    AxumState(app_state): AxumState<AppState>,
    Path(asset_id): Path<i64>,
    Attribution(actor, cause): Attribution,
    Json(req): Json<UpdateAssetStatusRequest>,
) -> Result<Json<AssetResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(lms_api::update_asset_status(
        &mut persistence,
        asset_id,
        &req,
        &app_state.asset_code_prefix,
        &actor,
        cause,
    )?))
}

async fn handle_start_exchange(
    AxumState(app_state): AxumState<AppState>,
    Attribution(actor, cause): Attribution,
    Json(req): Json<StartExchangeRequest>,
) -> Result<Json<ExchangeResponse>, HttpError> {
    info!(
        actor_id = %actor.id,
        asset_id = req.asset_id,
        kind = %req.kind,
        "Handling start_exchange request"
    );
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(lms_api::start_exchange(
        &mut persistence,
        &req,
        &actor,
        cause,
    )?))
}

async fn handle_decide_exchange(
    AxumState(app_state): AxumState<AppState>,
    Path(exchange_id): Path<i64>,
    Attribution(actor, cause): Attribution,
    Json(req): Json<DecideExchangeRequest>,
) -> Result<Json<ExchangeResponse>, HttpError> {
    info!(
        actor_id = %actor.id,
        exchange_id,
        decision = ?req.decision,
        "Handling decide_exchange request"
    );
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(lms_api::decide_exchange(
        &mut persistence,
        exchange_id,
        req,
        &actor,
        cause,
    )?))
}

async fn handle_record_kitting(
    AxumState(app_state): AxumState<AppState>,
    Path(exchange_id): Path<i64>,
    Attribution(actor, cause): Attribution,
    Json(req): Json<RecordKittingRequest>,
) -> Result<Json<ExchangeResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(lms_api::record_kitting(
        &mut persistence,
        exchange_id,
        &req,
        &actor,
        cause,
    )?))
}

// ---------------------------------------------------------------------------
// Audit
// ---------------------------------------------------------------------------

async fn handle_get_audit_event(
    AxumState(app_state): AxumState<AppState>,
    Path(event_id): Path<i64>,
) -> Result<Json<AuditEvent>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(lms_api::get_audit_event(&mut persistence, event_id)?))
}

async fn handle_get_audit_trail(
    AxumState(app_state): AxumState<AppState>,
    Query(query): Query<AuditTrailQuery>,
) -> Result<Json<AuditTrailResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(lms_api::get_audit_trail(
        &mut persistence,
        &query.entity_type,
        query.entity_id,
    )?))
}

async fn handle_get_recent_audit_events(
    AxumState(app_state): AxumState<AppState>,
    Query(query): Query<RecentEventsQuery>,
) -> Result<Json<AuditTrailResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(lms_api::get_recent_audit_events(
        &mut persistence,
        query.limit.unwrap_or(DEFAULT_RECENT_EVENTS),
    )?))
}

/// Builds the application router with all endpoints.
pub fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/users", post(handle_create_user).get(handle_list_users))
        .route("/users/sync", post(handle_sync_directory))
        .route("/users/{user_id}/active", post(handle_set_user_active))
        .route("/users/{user_id}/assets", get(handle_list_user_assets))
        .route(
            "/suppliers",
            post(handle_create_supplier).get(handle_list_suppliers),
        )
        .route(
            "/software_families",
            post(handle_create_software_family).get(handle_list_software_families),
        )
        .route(
            "/softwares",
            post(handle_create_software).get(handle_list_softwares),
        )
        .route(
            "/licenses",
            post(handle_create_license).get(handle_list_licenses),
        )
        .route("/licenses/available", post(handle_available_licenses))
        .route(
            "/licenses/{license_id}",
            get(handle_get_license).put(handle_update_license),
        )
        .route(
            "/licenses/{license_id}/active",
            post(handle_set_license_active),
        )
        .route(
            "/licenses/{license_id}/softwares",
            post(handle_add_licensed_software),
        )
        .route(
            "/licensed_softwares/{licensed_software_id}/keys",
            post(handle_add_license_key),
        )
        .route("/license_keys/available", get(handle_available_keys))
        .route(
            "/assignments",
            post(handle_create_assignment).get(handle_list_assignments),
        )
        .route("/assignments/delete", post(handle_delete_assignments))
        .route(
            "/assignments/bulk/preview",
            post(handle_preview_bulk_assignment),
        )
        .route("/assignments/bulk", post(handle_apply_bulk_assignment))
        .route(
            "/assignments/{assignment_id}",
            put(handle_update_assignment),
        )
        .route("/reports/summary", get(handle_license_summary))
        .route("/reports/unlicensed", get(handle_unlicensed_softwares))
        .route("/reports/license", get(handle_license_report))
        .route("/reports/license.txt", get(handle_license_report_text))
        .route("/reports/reconcile", post(handle_reconcile))
        .route("/offices", post(handle_create_office).get(handle_list_offices))
        .route(
            "/locations",
            post(handle_create_location).get(handle_list_locations),
        )
        .route(
            "/locations/{location_id}/managers",
            post(handle_add_location_manager),
        )
        .route(
            "/manufacturers",
            post(handle_create_manufacturer).get(handle_list_manufacturers),
        )
        .route(
            "/asset_types",
            post(handle_create_asset_type).get(handle_list_asset_types),
        )
        .route("/assets", post(handle_create_asset))
        .route("/assets/{asset_id}", get(handle_get_asset))
        .route("/assets/{asset_id}/status", post(handle_update_asset_status))
        .route("/exchanges", post(handle_start_exchange))
        .route(
            "/exchanges/{exchange_id}/decision",
            post(handle_decide_exchange),
        )
        .route(
            "/exchanges/{exchange_id}/kitting",
            post(handle_record_kitting),
        )
        .route("/audit/events/{event_id}", get(handle_get_audit_event))
        .route("/audit/trail", get(handle_get_audit_trail))
        .route("/audit/recent", get(handle_get_recent_audit_events))
        .with_state(app_state)
}
