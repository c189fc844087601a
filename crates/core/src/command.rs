// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use lms_audit::{Action, Actor, AuditEvent, Cause, EntityRef, StateSnapshot};
use lms_domain::{ActivationType, AssetStatus, ExchangeDecision, ExchangeKind, LicenseType, Platform};

/// A command represents user or system intent as data only.
///
/// Every state change is described by exactly one command, which names the
/// audit action recorded for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    CreateUser {
        username: String,
    },
    SetUserActive {
        user_id: i64,
        is_active: bool,
    },
    SyncDirectory {
        created: usize,
        deactivated: usize,
    },
    CreateSupplier {
        name: String,
    },
    CreateSoftwareFamily {
        name: String,
    },
    CreateSoftware {
        software_family_id: i64,
        name: String,
        version: String,
    },
    CreateLicense {
        software_family_id: i64,
        license_type: LicenseType,
        total: u32,
    },
    UpdateLicense {
        license_id: i64,
        total: u32,
    },
    SetLicenseActive {
        license_id: i64,
        is_active: bool,
    },
    AddLicensedSoftware {
        license_id: i64,
        software_id: i64,
        platform: Platform,
    },
    AddLicenseKey {
        licensed_software_id: i64,
        activation_type: ActivationType,
    },
    CreateAssignment {
        user_id: i64,
        software_id: i64,
        license_id: Option<i64>,
    },
    UpdateAssignment {
        assignment_id: i64,
        license_id: Option<i64>,
    },
    DeleteAssignment {
        assignment_id: i64,
    },
    DeleteAssignments {
        count: usize,
    },
    /// Persist a confirmed bulk assignment plan.
    BulkAssign {
        users: usize,
        softwares: usize,
        assigned: usize,
    },
    /// Recount `used_total` of every license from its assignments.
    ReconcileUsedTotals {
        repaired: usize,
    },
    CreateOffice {
        name: String,
    },
    CreateLocation {
        office_id: i64,
        name: String,
    },
    AddLocationManager {
        location_id: i64,
        user_id: i64,
    },
    CreateManufacturer {
        name: String,
    },
    CreateAssetType {
        name: String,
    },
    CreateAsset {
        name: String,
        asset_type_id: i64,
    },
    UpdateAssetStatus {
        asset_id: i64,
        status: AssetStatus,
    },
    StartExchange {
        asset_id: i64,
        kind: ExchangeKind,
        receiver_id: i64,
    },
    DecideExchange {
        exchange_id: i64,
        decision: ExchangeDecision,
    },
    RecordKitting {
        exchange_id: i64,
        completed: bool,
    },
}

impl Command {
    /// The audit action name of this command.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::CreateUser { .. } => "CreateUser",
            Self::SetUserActive { .. } => "SetUserActive",
            Self::SyncDirectory { .. } => "SyncDirectory",
            Self::CreateSupplier { .. } => "CreateSupplier",
            Self::CreateSoftwareFamily { .. } => "CreateSoftwareFamily",
            Self::CreateSoftware { .. } => "CreateSoftware",
            Self::CreateLicense { .. } => "CreateLicense",
            Self::UpdateLicense { .. } => "UpdateLicense",
            Self::SetLicenseActive { .. } => "SetLicenseActive",
            Self::AddLicensedSoftware { .. } => "AddLicensedSoftware",
            Self::AddLicenseKey { .. } => "AddLicenseKey",
            Self::CreateAssignment { .. } => "CreateAssignment",
            Self::UpdateAssignment { .. } => "UpdateAssignment",
            Self::DeleteAssignment { .. } => "DeleteAssignment",
            Self::DeleteAssignments { .. } => "DeleteAssignments",
            Self::BulkAssign { .. } => "BulkAssign",
            Self::ReconcileUsedTotals { .. } => "ReconcileUsedTotals",
            Self::CreateOffice { .. } => "CreateOffice",
            Self::CreateLocation { .. } => "CreateLocation",
            Self::AddLocationManager { .. } => "AddLocationManager",
            Self::CreateManufacturer { .. } => "CreateManufacturer",
            Self::CreateAssetType { .. } => "CreateAssetType",
            Self::CreateAsset { .. } => "CreateAsset",
            Self::UpdateAssetStatus { .. } => "UpdateAssetStatus",
            Self::StartExchange { .. } => "StartExchange",
            Self::DecideExchange { .. } => "DecideExchange",
            Self::RecordKitting { .. } => "RecordKitting",
        }
    }

    /// Human readable details recorded alongside the action name.
    #[must_use]
    pub fn details(&self) -> Option<String> {
        match self {
            Self::CreateUser { username } => Some(format!("username={username}")),
            Self::SetUserActive { user_id, is_active } => {
                Some(format!("user_id={user_id}, is_active={is_active}"))
            }
            Self::SyncDirectory {
                created,
                deactivated,
            } => Some(format!("created={created}, deactivated={deactivated}")),
            Self::CreateSupplier { name }
            | Self::CreateSoftwareFamily { name }
            | Self::CreateOffice { name }
            | Self::CreateManufacturer { name }
            | Self::CreateAssetType { name } => Some(format!("name={name}")),
            Self::CreateSoftware {
                software_family_id,
                name,
                version,
            } => Some(format!(
                "family_id={software_family_id}, name={name}, version={version}"
            )),
            Self::CreateLicense {
                software_family_id,
                license_type,
                total,
            } => Some(format!(
                "family_id={software_family_id}, type={}, total={total}",
                license_type.as_str()
            )),
            Self::UpdateLicense { license_id, total } => {
                Some(format!("license_id={license_id}, total={total}"))
            }
            Self::SetLicenseActive {
                license_id,
                is_active,
            } => Some(format!("license_id={license_id}, is_active={is_active}")),
            Self::AddLicensedSoftware {
                license_id,
                software_id,
                platform,
            } => Some(format!(
                "license_id={license_id}, software_id={software_id}, platform={}",
                platform.as_str()
            )),
            Self::AddLicenseKey {
                licensed_software_id,
                activation_type,
            } => Some(format!(
                "licensed_software_id={licensed_software_id}, activation={activation_type}"
            )),
            Self::CreateAssignment {
                user_id,
                software_id,
                license_id,
            } => Some(format!(
                "user_id={user_id}, software_id={software_id}, license_id={}",
                describe_id(*license_id)
            )),
            Self::UpdateAssignment {
                assignment_id,
                license_id,
            } => Some(format!(
                "assignment_id={assignment_id}, license_id={}",
                describe_id(*license_id)
            )),
            Self::DeleteAssignment { assignment_id } => {
                Some(format!("assignment_id={assignment_id}"))
            }
            Self::DeleteAssignments { count } => Some(format!("count={count}")),
            Self::BulkAssign {
                users,
                softwares,
                assigned,
            } => Some(format!(
                "users={users}, softwares={softwares}, assigned={assigned}"
            )),
            Self::ReconcileUsedTotals { repaired } => Some(format!("repaired={repaired}")),
            Self::CreateLocation { office_id, name } => {
                Some(format!("office_id={office_id}, name={name}"))
            }
            Self::AddLocationManager {
                location_id,
                user_id,
            } => Some(format!("location_id={location_id}, user_id={user_id}")),
            Self::CreateAsset {
                name,
                asset_type_id,
            } => Some(format!("name={name}, type_id={asset_type_id}")),
            Self::UpdateAssetStatus { asset_id, status } => {
                Some(format!("asset_id={asset_id}, status={status}"))
            }
            Self::StartExchange {
                asset_id,
                kind,
                receiver_id,
            } => Some(format!(
                "asset_id={asset_id}, kind={kind}, receiver_id={receiver_id}"
            )),
            Self::DecideExchange {
                exchange_id,
                decision,
            } => Some(format!(
                "exchange_id={exchange_id}, status={}",
                decision.resulting_status()
            )),
            Self::RecordKitting {
                exchange_id,
                completed,
            } => Some(format!("exchange_id={exchange_id}, completed={completed}")),
        }
    }

    /// Builds the audit event recording this command.
    #[must_use]
    pub fn audit_event(
        &self,
        actor: Actor,
        cause: Cause,
        target: EntityRef,
        before: StateSnapshot,
        after: StateSnapshot,
    ) -> AuditEvent {
        let action: Action = Action::new(self.name().to_string(), self.details());
        AuditEvent::new(actor, cause, action, target, before, after)
    }
}

fn describe_id(id: Option<i64>) -> String {
    id.map_or_else(|| String::from("none"), |id| id.to_string())
}
