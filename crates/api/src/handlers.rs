// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! API handler functions for state-changing and read-only operations.
//!
//! State-changing handlers apply the change through persistence first and
//! then record exactly one audit event naming the actor and the cause.

use std::str::FromStr;

use lms::{
    BulkAssignPlan, BulkAssignRequest, Command, DirectorySyncPlan, LicenseReport,
    MAX_WARNING_DAYS, PlanOutcome, UserDraft, plan_directory_sync,
};
use lms_audit::{AuditEvent, Cause, EntityRef, StateSnapshot};
use lms_domain::{
    ActivationType, Asset, AssetOrigin, AssetStatus, AssignmentDraft, DomainError, Exchange,
    ExchangeKind, ExchangeReason, ExchangeRequest, License, LicenseAssignment, LicenseKey,
    LicenseType, LicensedSoftware, Location, Office, Platform, asset_code, parse_date,
};
use lms_persistence::{
    AssignmentFilter, LicenseFields, NewAsset, NewLocation, NewSoftware, Persistence,
    ReconcileOutcome,
};
use num_traits::cast::ToPrimitive;
use serde::Serialize;
use time::{Date, OffsetDateTime};
use tracing::{debug, info};

use crate::auth::AuthenticatedActor;
use crate::directory_import::parse_directory_csv;
use crate::error::ApiError;
use crate::request_response::{
    AddLicenseKeyRequest, AddLicensedSoftwareRequest, AddLocationManagerRequest,
    AssetDetailResponse, AssetInfo, AssetResponse, AssignmentRequest, AssignmentResponse,
    AuditTrailResponse, AvailableKeysQuery, AvailableKeysResponse, AvailableLicenseInfo,
    AvailableLicensesQuery, AvailableLicensesResponse, BulkAssignmentRequest,
    BulkAssignmentResponse, CreateAssetRequest, CreateAssetTypeRequest, CreateLocationRequest,
    CreateManufacturerRequest, CreateOfficeRequest, CreateSoftwareFamilyRequest,
    CreateSoftwareRequest, CreateSupplierRequest, CreateUserRequest, CreatedResponse,
    DecideExchangeRequest, DeleteAssignmentsRequest, DeleteAssignmentsResponse, ExchangeInfo,
    ExchangeResponse, LicenseDetailResponse, LicenseReportQuery, LicenseRequest,
    LicenseResponse, LicenseSummaryResponse, ListAssetTypesResponse, ListAssetsResponse,
    ListAssignmentsQuery, ListAssignmentsResponse, ListLicensesResponse, ListLocationsResponse,
    ListManufacturersResponse, ListOfficesResponse, ListSoftwareFamiliesResponse,
    ListSoftwaresResponse, ListSuppliersResponse, ListUsersQuery, ListUsersResponse,
    ReconcileRequest, RecordKittingRequest, RejectedEntry, SetActiveRequest, SoftwareInfo,
    StartExchangeRequest, SyncDirectoryRequest, SyncDirectoryResponse,
    UnlicensedSoftwareResponse, UpdateAssetStatusRequest, UpdatedResponse,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Parses a stored-enum field such as a platform or a license type.
fn parse_field<T>(field: &str, value: &str) -> Result<T, ApiError>
where
    T: FromStr<Err = DomainError>,
{
    value.trim().parse::<T>().map_err(|err| ApiError::InvalidInput {
        field: field.to_string(),
        message: err.to_string(),
    })
}

fn parse_optional_platform(value: Option<&str>) -> Result<Option<Platform>, ApiError> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(|v| parse_field("platform", v))
        .transpose()
}

/// Parses an optional ISO 8601 date; blank strings count as absent.
fn parse_optional_date(field: &str, value: Option<&str>) -> Result<Option<Date>, ApiError> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(|v| {
            parse_date(v).map_err(|err| ApiError::InvalidInput {
                field: field.to_string(),
                message: err.to_string(),
            })
        })
        .transpose()
}

fn snapshot<T: Serialize>(value: &T) -> Result<StateSnapshot, ApiError> {
    serde_json::to_string(value)
        .map(StateSnapshot::new)
        .map_err(|e| ApiError::Internal {
            message: format!("Failed to serialize snapshot: {e}"),
        })
}

/// Records the audit event of a completed command.
fn record_event(
    persistence: &mut Persistence,
    command: &Command,
    actor: &AuthenticatedActor,
    cause: Cause,
    target: EntityRef,
    before: StateSnapshot,
    after: StateSnapshot,
) -> Result<i64, ApiError> {
    let event: AuditEvent =
        command.audit_event(actor.to_audit_actor(), cause, target, before, after);
    let event_id: i64 = persistence
        .persist_audit_event(&event)
        .map_err(|e| ApiError::Internal {
            message: format!("Failed to persist audit event: {e}"),
        })?;
    debug!(event_id, action = command.name(), "Recorded audit event");
    Ok(event_id)
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

/// Creates an active user.
///
/// # Errors
///
/// Returns an error if the username or email is invalid, the username is
/// taken, or the join date does not parse.
pub fn create_user(
    persistence: &mut Persistence,
    request: &CreateUserRequest,
    actor: &AuthenticatedActor,
    cause: Cause,
) -> Result<CreatedResponse, ApiError> {
    let draft: UserDraft = UserDraft {
        username: request.username.trim().to_string(),
        email: request.email.trim().to_string(),
        first_name: request.first_name.trim().to_string(),
        last_name: request.last_name.trim().to_string(),
        is_active: true,
        date_joined: parse_optional_date("date_joined", request.date_joined.as_deref())?,
    };
    let user_id: i64 = persistence.create_user(&draft)?;
    let user = persistence.get_user(user_id)?;

    record_event(
        persistence,
        &Command::CreateUser {
            username: user.username.clone(),
        },
        actor,
        cause,
        EntityRef::new("user", user_id),
        StateSnapshot::empty(),
        snapshot(&user)?,
    )?;

    Ok(CreatedResponse {
        id: user_id,
        message: format!("Created user {}", user.username),
    })
}

/// Activates or deactivates a user.
///
/// # Errors
///
/// Returns an error if the user does not exist.
pub fn set_user_active(
    persistence: &mut Persistence,
    user_id: i64,
    request: SetActiveRequest,
    actor: &AuthenticatedActor,
    cause: Cause,
) -> Result<UpdatedResponse, ApiError> {
    let before = persistence.get_user(user_id)?;
    persistence.set_user_active(user_id, request.is_active)?;
    let after = persistence.get_user(user_id)?;

    record_event(
        persistence,
        &Command::SetUserActive {
            user_id,
            is_active: request.is_active,
        },
        actor,
        cause,
        EntityRef::new("user", user_id),
        snapshot(&before)?,
        snapshot(&after)?,
    )?;

    let state: &str = if request.is_active {
        "Activated"
    } else {
        "Deactivated"
    };
    Ok(UpdatedResponse {
        id: user_id,
        message: format!("{state} user {}", after.username),
    })
}

/// Lists users, optionally by username prefix.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn list_users(
    persistence: &mut Persistence,
    query: &ListUsersQuery,
) -> Result<ListUsersResponse, ApiError> {
    let users = persistence.list_users(query.search.as_deref(), query.active_only)?;
    Ok(ListUsersResponse { users })
}

fn sync_response(
    dry_run: bool,
    plan: &DirectorySyncPlan,
    deactivated: Vec<i64>,
) -> SyncDirectoryResponse {
    SyncDirectoryResponse {
        dry_run,
        created: plan.create.iter().map(|d| d.username.clone()).collect(),
        deactivated,
        skipped: plan.skipped,
        rejected: plan
            .rejected
            .iter()
            .map(|(email, reason)| RejectedEntry {
                email: email.clone(),
                reason: reason.clone(),
            })
            .collect(),
    }
}

/// Synchronizes users from a directory export.
///
/// Unknown accounts are created and suspended accounts deactivated. A dry
/// run reports the same plan without writing it.
///
/// # Errors
///
/// Returns an error if the export cannot be parsed or a write fails; in the
/// latter case nothing is applied.
pub fn sync_directory(
    persistence: &mut Persistence,
    request: &SyncDirectoryRequest,
    actor: &AuthenticatedActor,
    cause: Cause,
) -> Result<SyncDirectoryResponse, ApiError> {
    let entries = parse_directory_csv(&request.csv_content)?;

    if request.dry_run {
        let users = persistence.list_users(None, false)?;
        let plan: DirectorySyncPlan = plan_directory_sync(&users, &entries);
        return Ok(sync_response(true, &plan, plan.deactivate.clone()));
    }

    let (plan, outcome) = persistence.sync_directory(&entries)?;
    if !outcome.created.is_empty() || !outcome.deactivated.is_empty() {
        record_event(
            persistence,
            &Command::SyncDirectory {
                created: outcome.created.len(),
                deactivated: outcome.deactivated.len(),
            },
            actor,
            cause,
            EntityRef::many("user"),
            StateSnapshot::empty(),
            snapshot(&outcome)?,
        )?;
    }

    Ok(sync_response(false, &plan, outcome.deactivated))
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// # Errors
///
/// Returns an error if the name is invalid or already used.
pub fn create_supplier(
    persistence: &mut Persistence,
    request: &CreateSupplierRequest,
    actor: &AuthenticatedActor,
    cause: Cause,
) -> Result<CreatedResponse, ApiError> {
    let name: &str = request.name.trim();
    let supplier_id: i64 = persistence.create_supplier(name, request.contact.trim())?;

    record_event(
        persistence,
        &Command::CreateSupplier {
            name: name.to_string(),
        },
        actor,
        cause,
        EntityRef::new("supplier", supplier_id),
        StateSnapshot::empty(),
        snapshot(request)?,
    )?;

    Ok(CreatedResponse {
        id: supplier_id,
        message: format!("Created supplier {name}"),
    })
}

/// # Errors
///
/// Returns an error if the name is invalid or already used.
pub fn create_software_family(
    persistence: &mut Persistence,
    request: &CreateSoftwareFamilyRequest,
    actor: &AuthenticatedActor,
    cause: Cause,
) -> Result<CreatedResponse, ApiError> {
    let name: &str = request.name.trim();
    let family_id: i64 = persistence.create_software_family(name)?;

    record_event(
        persistence,
        &Command::CreateSoftwareFamily {
            name: name.to_string(),
        },
        actor,
        cause,
        EntityRef::new("software_family", family_id),
        StateSnapshot::empty(),
        snapshot(request)?,
    )?;

    Ok(CreatedResponse {
        id: family_id,
        message: format!("Created software family {name}"),
    })
}

/// Creates a software product.
///
/// # Errors
///
/// Returns an error if a platform is unknown, none is given, the family
/// does not exist, or the (name, version) pair is taken.
pub fn create_software(
    persistence: &mut Persistence,
    request: &CreateSoftwareRequest,
    actor: &AuthenticatedActor,
    cause: Cause,
) -> Result<CreatedResponse, ApiError> {
    let platforms: Vec<Platform> = request
        .platforms
        .iter()
        .map(|p| parse_field("platforms", p))
        .collect::<Result<_, _>>()?;
    let software_id: i64 = persistence.create_software(&NewSoftware {
        software_family_id: request.software_family_id,
        name: request.name.trim().to_string(),
        version: request.version.trim().to_string(),
        platforms,
    })?;
    let software = persistence.get_software(software_id)?;

    record_event(
        persistence,
        &Command::CreateSoftware {
            software_family_id: software.software_family_id,
            name: software.name.clone(),
            version: software.version.clone(),
        },
        actor,
        cause,
        EntityRef::new("software", software_id),
        StateSnapshot::empty(),
        snapshot(&software)?,
    )?;

    Ok(CreatedResponse {
        id: software_id,
        message: format!("Created software {software}"),
    })
}

/// # Errors
///
/// Returns an error if the query fails.
pub fn list_suppliers(persistence: &mut Persistence) -> Result<ListSuppliersResponse, ApiError> {
    Ok(ListSuppliersResponse {
        suppliers: persistence.list_suppliers()?,
    })
}

/// # Errors
///
/// Returns an error if the query fails.
pub fn list_software_families(
    persistence: &mut Persistence,
) -> Result<ListSoftwareFamiliesResponse, ApiError> {
    Ok(ListSoftwareFamiliesResponse {
        software_families: persistence.list_software_families()?,
    })
}

/// # Errors
///
/// Returns an error if the query fails.
pub fn list_softwares(
    persistence: &mut Persistence,
    family_id: Option<i64>,
) -> Result<ListSoftwaresResponse, ApiError> {
    let softwares: Vec<SoftwareInfo> = persistence
        .list_softwares(None, family_id)?
        .into_iter()
        .map(|software| SoftwareInfo {
            display_name: software.to_string(),
            software,
        })
        .collect();
    Ok(ListSoftwaresResponse { softwares })
}

// ---------------------------------------------------------------------------
// Licenses
// ---------------------------------------------------------------------------

fn license_fields(request: &LicenseRequest) -> Result<LicenseFields, ApiError> {
    Ok(LicenseFields {
        software_family_id: request.software_family_id,
        license_type: parse_field::<LicenseType>("license_type", &request.license_type)?,
        total: request.total,
        oem_device: request
            .oem_device
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(str::to_string),
        supplier_id: request.supplier_id,
        license_number: request.license_number.trim().to_string(),
        purchased_date: parse_optional_date("purchased_date", request.purchased_date.as_deref())?,
        started_date: parse_optional_date("started_date", request.started_date.as_deref())?,
        ended_date: parse_optional_date("ended_date", request.ended_date.as_deref())?,
        note: request.note.clone(),
    })
}

/// Creates a license with no seats in use.
///
/// # Errors
///
/// Returns an error if the license terms are invalid or the family does
/// not exist.
pub fn create_license(
    persistence: &mut Persistence,
    request: &LicenseRequest,
    actor: &AuthenticatedActor,
    cause: Cause,
) -> Result<LicenseResponse, ApiError> {
    let fields: LicenseFields = license_fields(request)?;
    let license_id: i64 = persistence.create_license(&fields)?;
    let license: License = persistence.get_license(license_id)?;

    record_event(
        persistence,
        &Command::CreateLicense {
            software_family_id: license.software_family_id,
            license_type: license.license_type,
            total: license.total,
        },
        actor,
        cause,
        EntityRef::new("license", license_id),
        StateSnapshot::empty(),
        snapshot(&license)?,
    )?;

    Ok(LicenseResponse {
        message: format!("Created {}", license.description),
        license,
    })
}

/// Updates the terms of a license. Seats in use are kept.
///
/// # Errors
///
/// Returns an error if the license does not exist, the new terms are
/// invalid, or the total would drop below the seats in use.
pub fn update_license(
    persistence: &mut Persistence,
    license_id: i64,
    request: &LicenseRequest,
    actor: &AuthenticatedActor,
    cause: Cause,
) -> Result<LicenseResponse, ApiError> {
    let fields: LicenseFields = license_fields(request)?;
    let before: License = persistence.get_license(license_id)?;
    let license: License = persistence.update_license(license_id, &fields)?;

    record_event(
        persistence,
        &Command::UpdateLicense {
            license_id,
            total: license.total,
        },
        actor,
        cause,
        EntityRef::new("license", license_id),
        snapshot(&before)?,
        snapshot(&license)?,
    )?;

    Ok(LicenseResponse {
        message: format!("Updated {}", license.description),
        license,
    })
}

/// Activates or deactivates a license.
///
/// Deactivated licenses keep their seats but take no new assignments.
///
/// # Errors
///
/// Returns an error if the license does not exist.
pub fn set_license_active(
    persistence: &mut Persistence,
    license_id: i64,
    request: SetActiveRequest,
    actor: &AuthenticatedActor,
    cause: Cause,
) -> Result<UpdatedResponse, ApiError> {
    let before: License = persistence.get_license(license_id)?;
    persistence.set_license_active(license_id, request.is_active)?;
    let after: License = persistence.get_license(license_id)?;

    record_event(
        persistence,
        &Command::SetLicenseActive {
            license_id,
            is_active: request.is_active,
        },
        actor,
        cause,
        EntityRef::new("license", license_id),
        snapshot(&before)?,
        snapshot(&after)?,
    )?;

    let state: &str = if request.is_active {
        "Activated"
    } else {
        "Deactivated"
    };
    Ok(UpdatedResponse {
        id: license_id,
        message: format!("{state} {}", after.description),
    })
}

/// Adds a software to the coverage of a license.
///
/// # Errors
///
/// Returns an error if the software is of another family, does not run on
/// the platform, or is already covered on it.
pub fn add_licensed_software(
    persistence: &mut Persistence,
    license_id: i64,
    request: &AddLicensedSoftwareRequest,
    actor: &AuthenticatedActor,
    cause: Cause,
) -> Result<CreatedResponse, ApiError> {
    let platform: Platform = parse_optional_platform(request.platform.as_deref())?
        .unwrap_or(Platform::All);
    let licensed_software_id: i64 = persistence.add_licensed_software(
        license_id,
        request.software_id,
        platform,
        request.note.trim(),
    )?;
    let coverage: LicensedSoftware = LicensedSoftware {
        licensed_software_id,
        license_id,
        software_id: request.software_id,
        platform,
        note: request.note.trim().to_string(),
    };

    record_event(
        persistence,
        &Command::AddLicensedSoftware {
            license_id,
            software_id: request.software_id,
            platform,
        },
        actor,
        cause,
        EntityRef::new("licensed_software", licensed_software_id),
        StateSnapshot::empty(),
        snapshot(&coverage)?,
    )?;

    Ok(CreatedResponse {
        id: licensed_software_id,
        message: format!(
            "License {license_id} now covers software {} on {platform}",
            request.software_id
        ),
    })
}

/// Adds a serial key to a licensed software.
///
/// # Errors
///
/// Returns an error if the key is blank, the activation type is unknown,
/// or the licensed software does not exist.
pub fn add_license_key(
    persistence: &mut Persistence,
    licensed_software_id: i64,
    request: &AddLicenseKeyRequest,
    actor: &AuthenticatedActor,
    cause: Cause,
) -> Result<CreatedResponse, ApiError> {
    let activation_type: ActivationType =
        parse_field("activation_type", &request.activation_type)?;
    let license_key_id: i64 = persistence.add_license_key(
        licensed_software_id,
        request.serial_key.trim(),
        activation_type,
    )?;
    let key: LicenseKey = LicenseKey {
        license_key_id,
        licensed_software_id,
        serial_key: request.serial_key.trim().to_string(),
        activation_type,
    };

    record_event(
        persistence,
        &Command::AddLicenseKey {
            licensed_software_id,
            activation_type,
        },
        actor,
        cause,
        EntityRef::new("license_key", license_key_id),
        StateSnapshot::empty(),
        snapshot(&key)?,
    )?;

    Ok(CreatedResponse {
        id: license_key_id,
        message: format!("Added {activation_type} key"),
    })
}

/// Loads a license with its coverage and keys.
///
/// # Errors
///
/// Returns an error if the license does not exist.
pub fn get_license(
    persistence: &mut Persistence,
    license_id: i64,
) -> Result<LicenseDetailResponse, ApiError> {
    let license: License = persistence.get_license(license_id)?;
    let softwares: Vec<LicensedSoftware> = persistence.list_licensed_softwares(&[license_id])?;
    let keys: Vec<LicenseKey> = persistence.list_license_keys(&[license_id])?;
    Ok(LicenseDetailResponse {
        remaining: license.remaining(),
        license,
        softwares,
        keys,
    })
}

/// # Errors
///
/// Returns an error if the query fails.
pub fn list_licenses(
    persistence: &mut Persistence,
    family_id: Option<i64>,
) -> Result<ListLicensesResponse, ApiError> {
    Ok(ListLicensesResponse {
        licenses: persistence.list_licenses(family_id)?,
    })
}

/// Licenses that can back an assignment of any of the softwares.
///
/// # Errors
///
/// Returns an error if the platform is unknown or the query fails.
pub fn available_licenses(
    persistence: &mut Persistence,
    query: &AvailableLicensesQuery,
) -> Result<AvailableLicensesResponse, ApiError> {
    let platform: Option<Platform> = parse_optional_platform(query.platform.as_deref())?;
    let licenses: Vec<AvailableLicenseInfo> = persistence
        .available_licenses(&query.software_ids, platform, query.current_license_id)?
        .into_iter()
        .map(|license| AvailableLicenseInfo {
            license_id: license.license_id,
            remaining: license.remaining(),
            description: license.description,
        })
        .collect();
    Ok(AvailableLicensesResponse { licenses })
}

/// Keys usable for a (license, software) pair.
///
/// # Errors
///
/// Returns an error if the platform is unknown or the query fails.
pub fn available_keys(
    persistence: &mut Persistence,
    query: &AvailableKeysQuery,
) -> Result<AvailableKeysResponse, ApiError> {
    let platform: Option<Platform> = parse_optional_platform(query.platform.as_deref())?;
    let keys: Vec<LicenseKey> = persistence.available_keys(
        query.license_id,
        query.software_id,
        platform,
        query.current_license_key_id,
    )?;
    Ok(AvailableKeysResponse { keys })
}

// ---------------------------------------------------------------------------
// Assignments
// ---------------------------------------------------------------------------

fn assignment_draft(request: &AssignmentRequest) -> Result<AssignmentDraft, ApiError> {
    Ok(AssignmentDraft {
        user_id: request.user_id,
        software_id: request.software_id,
        platform: parse_optional_platform(request.platform.as_deref())?,
        license_id: request.license_id,
        license_key_id: request.license_key_id,
        note: request.note.trim().to_string(),
    })
}

/// Assigns a software to a user, taking a seat when a license is given.
///
/// # Errors
///
/// Returns an error if the assignment breaks an allocation rule, for
/// example when the license has no seat left.
pub fn create_assignment(
    persistence: &mut Persistence,
    request: &AssignmentRequest,
    actor: &AuthenticatedActor,
    cause: Cause,
) -> Result<AssignmentResponse, ApiError> {
    let draft: AssignmentDraft = assignment_draft(request)?;
    let assignment_id: i64 = persistence.create_assignment(&draft)?;
    let assignment: LicenseAssignment = persistence.get_assignment(assignment_id)?;

    record_event(
        persistence,
        &Command::CreateAssignment {
            user_id: assignment.user_id,
            software_id: assignment.software_id,
            license_id: assignment.license_id,
        },
        actor,
        cause,
        EntityRef::new("assignment", assignment_id),
        StateSnapshot::empty(),
        snapshot(&assignment)?,
    )?;

    Ok(AssignmentResponse {
        assignment,
        message: format!("Created assignment {assignment_id}"),
    })
}

/// Edits an assignment, moving its seat when the license changes.
///
/// # Errors
///
/// Returns an error if the assignment does not exist or the edit breaks
/// an allocation rule; nothing is changed in that case.
pub fn update_assignment(
    persistence: &mut Persistence,
    assignment_id: i64,
    request: &AssignmentRequest,
    actor: &AuthenticatedActor,
    cause: Cause,
) -> Result<AssignmentResponse, ApiError> {
    let draft: AssignmentDraft = assignment_draft(request)?;
    let before: LicenseAssignment = persistence.update_assignment(assignment_id, &draft)?;
    let assignment: LicenseAssignment = persistence.get_assignment(assignment_id)?;

    record_event(
        persistence,
        &Command::UpdateAssignment {
            assignment_id,
            license_id: assignment.license_id,
        },
        actor,
        cause,
        EntityRef::new("assignment", assignment_id),
        snapshot(&before)?,
        snapshot(&assignment)?,
    )?;

    Ok(AssignmentResponse {
        assignment,
        message: format!("Updated assignment {assignment_id}"),
    })
}

/// Deletes assignments and releases their seats.
///
/// # Errors
///
/// Returns an error if no id is given or any assignment does not exist;
/// nothing is deleted in that case.
pub fn delete_assignments(
    persistence: &mut Persistence,
    request: &DeleteAssignmentsRequest,
    actor: &AuthenticatedActor,
    cause: Cause,
) -> Result<DeleteAssignmentsResponse, ApiError> {
    if request.assignment_ids.is_empty() {
        return Err(ApiError::InvalidInput {
            field: String::from("assignment_ids"),
            message: String::from("At least one assignment must be selected"),
        });
    }

    let removed: Vec<LicenseAssignment> =
        persistence.delete_assignments(&request.assignment_ids)?;
    let (command, target, before): (Command, EntityRef, StateSnapshot) = match removed.as_slice() {
        [single] => (
            Command::DeleteAssignment {
                assignment_id: single.assignment_id,
            },
            EntityRef::new("assignment", single.assignment_id),
            snapshot(single)?,
        ),
        many => (
            Command::DeleteAssignments { count: many.len() },
            EntityRef::many("assignment"),
            snapshot(&many)?,
        ),
    };
    record_event(
        persistence,
        &command,
        actor,
        cause,
        target,
        before,
        StateSnapshot::empty(),
    )?;

    let deleted: Vec<i64> = removed.iter().map(|a| a.assignment_id).collect();
    Ok(DeleteAssignmentsResponse {
        message: format!("Deleted {} assignment(s)", deleted.len()),
        deleted,
    })
}

/// # Errors
///
/// Returns an error if the query fails.
pub fn list_assignments(
    persistence: &mut Persistence,
    query: ListAssignmentsQuery,
) -> Result<ListAssignmentsResponse, ApiError> {
    let assignments: Vec<LicenseAssignment> = persistence.list_assignments(AssignmentFilter {
        user_id: query.user_id,
        software_id: query.software_id,
        license_id: query.license_id,
    })?;
    Ok(ListAssignmentsResponse { assignments })
}

fn bulk_request(request: &BulkAssignmentRequest) -> Result<BulkAssignRequest, ApiError> {
    Ok(BulkAssignRequest {
        user_ids: request.user_ids.clone(),
        software_ids: request.software_ids.clone(),
        platform: parse_field("platform", &request.platform)?,
        skip_existing: request.skip_existing,
        skip_unlicensed: request.skip_unlicensed,
        note: request.note.trim().to_string(),
    })
}

fn bulk_response(
    applied: bool,
    plan: BulkAssignPlan,
    created: Vec<i64>,
) -> BulkAssignmentResponse {
    let licensed: usize = plan.licensed();
    let unlicensed: usize = plan.count(|o| matches!(o, PlanOutcome::Unlicensed));
    let skipped: usize = plan.count(|o| {
        matches!(
            o,
            PlanOutcome::SkippedExisting | PlanOutcome::SkippedUnlicensed
        )
    });
    BulkAssignmentResponse {
        applied,
        plan,
        created,
        licensed,
        unlicensed,
        skipped,
    }
}

/// Plans a bulk assignment without writing anything.
///
/// # Errors
///
/// Returns an error if no user or software is selected, or a software does
/// not run on the platform.
pub fn preview_bulk_assignment(
    persistence: &mut Persistence,
    request: &BulkAssignmentRequest,
) -> Result<BulkAssignmentResponse, ApiError> {
    let plan: BulkAssignPlan = persistence.preview_bulk_assignment(&bulk_request(request)?)?;
    Ok(bulk_response(false, plan, Vec::new()))
}

/// Plans and writes a bulk assignment in one transaction.
///
/// The plan is rebuilt under the lock, so it may differ from an earlier
/// preview if seats were taken in between.
///
/// # Errors
///
/// Returns an error if the request is invalid or a write fails; nothing is
/// written in that case.
pub fn apply_bulk_assignment(
    persistence: &mut Persistence,
    request: &BulkAssignmentRequest,
    actor: &AuthenticatedActor,
    cause: Cause,
) -> Result<BulkAssignmentResponse, ApiError> {
    let (plan, created) = persistence.apply_bulk_assignment(&bulk_request(request)?)?;

    if !created.is_empty() {
        record_event(
            persistence,
            &Command::BulkAssign {
                users: request.user_ids.len(),
                softwares: request.software_ids.len(),
                assigned: created.len(),
            },
            actor,
            cause,
            EntityRef::many("assignment"),
            StateSnapshot::empty(),
            snapshot(&plan)?,
        )?;
    }
    info!(
        created = created.len(),
        entries = plan.entries.len(),
        "Applied bulk assignment"
    );

    Ok(bulk_response(true, plan, created))
}

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

/// # Errors
///
/// Returns an error if the query fails.
pub fn license_summary(
    persistence: &mut Persistence,
    family_id: Option<i64>,
) -> Result<LicenseSummaryResponse, ApiError> {
    Ok(LicenseSummaryResponse {
        rows: persistence.license_summary(family_id)?,
    })
}

/// # Errors
///
/// Returns an error if the query fails.
pub fn unlicensed_softwares(
    persistence: &mut Persistence,
) -> Result<UnlicensedSoftwareResponse, ApiError> {
    Ok(UnlicensedSoftwareResponse {
        softwares: persistence.unlicensed_softwares()?,
    })
}

/// Builds the license report.
///
/// `today` and `default_warning_days` apply when the query leaves them out.
///
/// # Errors
///
/// Returns an error if the date does not parse, the warning window is
/// negative or longer than [`MAX_WARNING_DAYS`], or the query fails.
pub fn license_report(
    persistence: &mut Persistence,
    query: &LicenseReportQuery,
    today: Date,
    default_warning_days: i64,
) -> Result<LicenseReport, ApiError> {
    let today: Date = parse_optional_date("today", query.today.as_deref())?.unwrap_or(today);
    let warning_days: i64 = query.warning_days.unwrap_or(default_warning_days);
    if warning_days < 0 {
        return Err(ApiError::InvalidInput {
            field: String::from("warning_days"),
            message: format!("Warning window cannot be negative (got {warning_days})"),
        });
    }
    if warning_days > MAX_WARNING_DAYS {
        return Err(ApiError::InvalidInput {
            field: String::from("warning_days"),
            message: format!(
                "Warning window cannot exceed {MAX_WARNING_DAYS} days (got {warning_days})"
            ),
        });
    }
    Ok(persistence.license_report(today, warning_days, query.include_unlicensed)?)
}

/// Recounts `used_total` of every license and optionally repairs it.
///
/// # Errors
///
/// Returns an error if the query or a repair fails.
pub fn reconcile_used_totals(
    persistence: &mut Persistence,
    request: ReconcileRequest,
    actor: &AuthenticatedActor,
    cause: Cause,
) -> Result<ReconcileOutcome, ApiError> {
    let outcome: ReconcileOutcome = persistence.reconcile_used_totals(request.repair)?;

    if !outcome.repaired.is_empty() {
        record_event(
            persistence,
            &Command::ReconcileUsedTotals {
                repaired: outcome.repaired.len(),
            },
            actor,
            cause,
            EntityRef::many("license"),
            snapshot(&outcome.mismatches)?,
            snapshot(&outcome.repaired)?,
        )?;
    }

    Ok(outcome)
}

// ---------------------------------------------------------------------------
// Offices, locations and asset catalog
// ---------------------------------------------------------------------------

/// # Errors
///
/// Returns an error if the name is invalid or already used.
pub fn create_office(
    persistence: &mut Persistence,
    request: &CreateOfficeRequest,
    actor: &AuthenticatedActor,
    cause: Cause,
) -> Result<CreatedResponse, ApiError> {
    let name: &str = request.name.trim();
    let office_id: i64 = persistence.create_office(name, request.address.trim())?;
    let office: Office = Office {
        office_id,
        name: name.to_string(),
        address: request.address.trim().to_string(),
    };

    record_event(
        persistence,
        &Command::CreateOffice {
            name: office.name.clone(),
        },
        actor,
        cause,
        EntityRef::new("office", office_id),
        StateSnapshot::empty(),
        snapshot(&office)?,
    )?;

    Ok(CreatedResponse {
        id: office_id,
        message: format!("Created office {name}"),
    })
}

/// # Errors
///
/// Returns an error if the office does not exist or already has a location
/// of that name.
pub fn create_location(
    persistence: &mut Persistence,
    request: &CreateLocationRequest,
    actor: &AuthenticatedActor,
    cause: Cause,
) -> Result<CreatedResponse, ApiError> {
    let name: &str = request.name.trim();
    let location_id: i64 = persistence.create_location(&NewLocation {
        office_id: request.office_id,
        name: name.to_string(),
        floor: request.floor,
        room: request.room,
    })?;
    let location: Location = Location {
        location_id,
        office_id: request.office_id,
        name: name.to_string(),
        floor: request.floor,
        room: request.room,
    };

    record_event(
        persistence,
        &Command::CreateLocation {
            office_id: request.office_id,
            name: location.name.clone(),
        },
        actor,
        cause,
        EntityRef::new("location", location_id),
        StateSnapshot::empty(),
        snapshot(&location)?,
    )?;

    Ok(CreatedResponse {
        id: location_id,
        message: format!("Created location {name}"),
    })
}

/// Makes a user a manager of a location.
///
/// # Errors
///
/// Returns an error if the location or user does not exist, or the user
/// already manages the location.
pub fn add_location_manager(
    persistence: &mut Persistence,
    location_id: i64,
    request: AddLocationManagerRequest,
    actor: &AuthenticatedActor,
    cause: Cause,
) -> Result<CreatedResponse, ApiError> {
    let manager_id: i64 = persistence.add_location_manager(location_id, request.user_id)?;

    record_event(
        persistence,
        &Command::AddLocationManager {
            location_id,
            user_id: request.user_id,
        },
        actor,
        cause,
        EntityRef::new("location", location_id),
        StateSnapshot::empty(),
        snapshot(&request)?,
    )?;

    Ok(CreatedResponse {
        id: manager_id,
        message: format!(
            "User {} now manages location {location_id}",
            request.user_id
        ),
    })
}

/// # Errors
///
/// Returns an error if the name is invalid or already used.
pub fn create_manufacturer(
    persistence: &mut Persistence,
    request: &CreateManufacturerRequest,
    actor: &AuthenticatedActor,
    cause: Cause,
) -> Result<CreatedResponse, ApiError> {
    let name: &str = request.name.trim();
    let manufacturer_id: i64 = persistence.create_manufacturer(name)?;

    record_event(
        persistence,
        &Command::CreateManufacturer {
            name: name.to_string(),
        },
        actor,
        cause,
        EntityRef::new("manufacturer", manufacturer_id),
        StateSnapshot::empty(),
        snapshot(request)?,
    )?;

    Ok(CreatedResponse {
        id: manufacturer_id,
        message: format!("Created manufacturer {name}"),
    })
}

/// # Errors
///
/// Returns an error if the name is invalid or already used.
pub fn create_asset_type(
    persistence: &mut Persistence,
    request: &CreateAssetTypeRequest,
    actor: &AuthenticatedActor,
    cause: Cause,
) -> Result<CreatedResponse, ApiError> {
    let name: &str = request.name.trim();
    let asset_type_id: i64 =
        persistence.create_asset_type(name, request.kitting_required, request.user_searchable)?;

    record_event(
        persistence,
        &Command::CreateAssetType {
            name: name.to_string(),
        },
        actor,
        cause,
        EntityRef::new("asset_type", asset_type_id),
        StateSnapshot::empty(),
        snapshot(request)?,
    )?;

    Ok(CreatedResponse {
        id: asset_type_id,
        message: format!("Created asset type {name}"),
    })
}

/// # Errors
///
/// Returns an error if the query fails.
pub fn list_offices(persistence: &mut Persistence) -> Result<ListOfficesResponse, ApiError> {
    Ok(ListOfficesResponse {
        offices: persistence.list_offices()?,
    })
}

/// # Errors
///
/// Returns an error if the query fails.
pub fn list_locations(
    persistence: &mut Persistence,
    office_id: Option<i64>,
) -> Result<ListLocationsResponse, ApiError> {
    Ok(ListLocationsResponse {
        locations: persistence.list_locations(office_id)?,
    })
}

/// # Errors
///
/// Returns an error if the query fails.
pub fn list_manufacturers(
    persistence: &mut Persistence,
) -> Result<ListManufacturersResponse, ApiError> {
    Ok(ListManufacturersResponse {
        manufacturers: persistence.list_manufacturers()?,
    })
}

/// # Errors
///
/// Returns an error if the query fails.
pub fn list_asset_types(persistence: &mut Persistence) -> Result<ListAssetTypesResponse, ApiError> {
    Ok(ListAssetTypesResponse {
        asset_types: persistence.list_asset_types()?,
    })
}

// ---------------------------------------------------------------------------
// Assets and exchanges
// ---------------------------------------------------------------------------

fn asset_info(asset: Asset, code_prefix: &str) -> AssetInfo {
    AssetInfo {
        code: asset_code(code_prefix, asset.asset_id),
        asset,
    }
}

fn exchange_info(exchange: Exchange) -> ExchangeInfo {
    ExchangeInfo {
        is_fresh: exchange.is_fresh(OffsetDateTime::now_utc()),
        exchange,
    }
}

/// Registers an asset. Its creator becomes its first holder.
///
/// # Errors
///
/// Returns an error if a field is invalid or the warranty dates are
/// inconsistent.
pub fn create_asset(
    persistence: &mut Persistence,
    request: &CreateAssetRequest,
    code_prefix: &str,
    actor: &AuthenticatedActor,
    cause: Cause,
) -> Result<AssetResponse, ApiError> {
    let new_asset: NewAsset = NewAsset {
        name: request.name.trim().to_string(),
        old_code: request.old_code.trim().to_string(),
        asset_type_id: request.asset_type_id,
        supplier_id: request.supplier_id,
        manufacturer_id: request.manufacturer_id,
        purchased_date: parse_optional_date("purchased_date", request.purchased_date.as_deref())?,
        warranty_start_date: parse_optional_date(
            "warranty_start_date",
            request.warranty_start_date.as_deref(),
        )?,
        warranty_end_date: parse_optional_date(
            "warranty_end_date",
            request.warranty_end_date.as_deref(),
        )?,
        origin: parse_field::<AssetOrigin>("origin", &request.origin)?,
        status: parse_field::<AssetStatus>("status", &request.status)?,
        location_id: request.location_id,
        note: request.note.clone(),
    };
    let asset_id: i64 = persistence.create_asset(&new_asset, request.creator_id)?;
    let asset: Asset = persistence.get_asset(asset_id)?;

    record_event(
        persistence,
        &Command::CreateAsset {
            name: asset.name.clone(),
            asset_type_id: asset.asset_type_id,
        },
        actor,
        cause,
        EntityRef::new("asset", asset_id),
        StateSnapshot::empty(),
        snapshot(&asset)?,
    )?;

    let info: AssetInfo = asset_info(asset, code_prefix);
    Ok(AssetResponse {
        message: format!("Created asset {}", info.code),
        asset: info,
    })
}

/// # Errors
///
/// Returns an error if the asset does not exist or the status is unknown.
pub fn update_asset_status(
    persistence: &mut Persistence,
    asset_id: i64,
    request: &UpdateAssetStatusRequest,
    code_prefix: &str,
    actor: &AuthenticatedActor,
    cause: Cause,
) -> Result<AssetResponse, ApiError> {
    let status: AssetStatus = parse_field("status", &request.status)?;
    let before: Asset = persistence.update_asset_status(asset_id, status)?;
    let asset: Asset = persistence.get_asset(asset_id)?;

    record_event(
        persistence,
        &Command::UpdateAssetStatus { asset_id, status },
        actor,
        cause,
        EntityRef::new("asset", asset_id),
        snapshot(&before)?,
        snapshot(&asset)?,
    )?;

    let info: AssetInfo = asset_info(asset, code_prefix);
    Ok(AssetResponse {
        message: format!("Asset {} is now {status}", info.code),
        asset: info,
    })
}

/// Loads an asset with its exchanges, newest first.
///
/// # Errors
///
/// Returns an error if the asset does not exist.
pub fn get_asset(
    persistence: &mut Persistence,
    asset_id: i64,
    code_prefix: &str,
) -> Result<AssetDetailResponse, ApiError> {
    let asset: Asset = persistence.get_asset(asset_id)?;
    let exchanges: Vec<ExchangeInfo> = persistence
        .list_asset_exchanges(asset_id)?
        .into_iter()
        .map(exchange_info)
        .collect();
    Ok(AssetDetailResponse {
        asset: asset_info(asset, code_prefix),
        exchanges,
    })
}

/// Assets a user may act on: unassigned ones they hold and those at
/// locations they manage.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn list_visible_assets(
    persistence: &mut Persistence,
    user_id: i64,
    code_prefix: &str,
) -> Result<ListAssetsResponse, ApiError> {
    let assets: Vec<AssetInfo> = persistence
        .list_visible_assets(user_id)?
        .into_iter()
        .map(|asset| asset_info(asset, code_prefix))
        .collect();
    Ok(ListAssetsResponse { assets })
}

/// Starts moving an asset.
///
/// # Errors
///
/// Returns an error if the sender may not move the asset, the asset is
/// already moving, or a location assignment has no destination.
pub fn start_exchange(
    persistence: &mut Persistence,
    request: &StartExchangeRequest,
    actor: &AuthenticatedActor,
    cause: Cause,
) -> Result<ExchangeResponse, ApiError> {
    let kind: ExchangeKind = parse_field("kind", &request.kind)?;
    let exchange: Exchange = persistence.start_exchange(&ExchangeRequest {
        asset_id: request.asset_id,
        kind,
        sender_id: request.sender_id,
        receiver_id: request.receiver_id,
        destination_id: request.destination_id,
        reason: parse_field::<ExchangeReason>("reason", &request.reason)?,
        comment: request.comment.trim().to_string(),
    })?;

    record_event(
        persistence,
        &Command::StartExchange {
            asset_id: request.asset_id,
            kind,
            receiver_id: request.receiver_id,
        },
        actor,
        cause,
        EntityRef::new("exchange", exchange.exchange_id),
        StateSnapshot::empty(),
        snapshot(&exchange)?,
    )?;

    let message: String = format!(
        "Exchange {} of asset {} is {}",
        exchange.exchange_id, exchange.asset_id, exchange.status
    );
    Ok(ExchangeResponse {
        exchange: exchange_info(exchange),
        message,
    })
}

/// Takes, rejects or cancels a pending exchange.
///
/// # Errors
///
/// Returns an error if the exchange is not pending, the user plays the
/// wrong part, or kitting is unfinished.
pub fn decide_exchange(
    persistence: &mut Persistence,
    exchange_id: i64,
    request: DecideExchangeRequest,
    actor: &AuthenticatedActor,
    cause: Cause,
) -> Result<ExchangeResponse, ApiError> {
    let before: Exchange =
        persistence.decide_exchange(exchange_id, request.user_id, request.decision)?;
    let exchange: Exchange = persistence.get_exchange(exchange_id)?;

    record_event(
        persistence,
        &Command::DecideExchange {
            exchange_id,
            decision: request.decision,
        },
        actor,
        cause,
        EntityRef::new("exchange", exchange_id),
        snapshot(&before)?,
        snapshot(&exchange)?,
    )?;

    let message: String = format!("Exchange {exchange_id} is {}", exchange.status);
    Ok(ExchangeResponse {
        exchange: exchange_info(exchange),
        message,
    })
}

/// Records kitting progress on an exchange.
///
/// # Errors
///
/// Returns an error if the exchange is not pending or needs no kitting.
pub fn record_kitting(
    persistence: &mut Persistence,
    exchange_id: i64,
    request: &RecordKittingRequest,
    actor: &AuthenticatedActor,
    cause: Cause,
) -> Result<ExchangeResponse, ApiError> {
    let due_date: Option<Date> = parse_optional_date("due_date", request.due_date.as_deref())?;
    let before: Exchange =
        persistence.record_kitting(exchange_id, request.user_id, request.completed, due_date)?;
    let exchange: Exchange = persistence.get_exchange(exchange_id)?;

    record_event(
        persistence,
        &Command::RecordKitting {
            exchange_id,
            completed: request.completed,
        },
        actor,
        cause,
        EntityRef::new("exchange", exchange_id),
        snapshot(&before)?,
        snapshot(&exchange)?,
    )?;

    let message: String = if request.completed {
        format!("Kitting of exchange {exchange_id} is complete")
    } else {
        format!("Kitting of exchange {exchange_id} is in progress")
    };
    Ok(ExchangeResponse {
        exchange: exchange_info(exchange),
        message,
    })
}

// ---------------------------------------------------------------------------
// Audit
// ---------------------------------------------------------------------------

/// # Errors
///
/// Returns an error if the event does not exist.
pub fn get_audit_event(
    persistence: &mut Persistence,
    event_id: i64,
) -> Result<AuditEvent, ApiError> {
    Ok(persistence.get_audit_event(event_id)?)
}

/// # Errors
///
/// Returns an error if the query fails.
pub fn get_audit_trail(
    persistence: &mut Persistence,
    entity_type: &str,
    entity_id: Option<i64>,
) -> Result<AuditTrailResponse, ApiError> {
    Ok(AuditTrailResponse {
        events: persistence.get_audit_trail(entity_type, entity_id)?,
    })
}

/// # Errors
///
/// Returns an error if `limit` is out of range or the query fails.
pub fn get_recent_audit_events(
    persistence: &mut Persistence,
    limit: usize,
) -> Result<AuditTrailResponse, ApiError> {
    let limit: i64 = limit.to_i64().ok_or_else(|| ApiError::InvalidInput {
        field: String::from("limit"),
        message: format!("Limit {limit} is too large"),
    })?;
    Ok(AuditTrailResponse {
        events: persistence.get_recent_audit_events(limit)?,
    })
}
