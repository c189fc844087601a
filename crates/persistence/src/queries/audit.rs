// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Audit event queries.
//!
//! Events are append-only; these queries never filter on anything but the
//! event id and the target entity.

use diesel::prelude::*;
use diesel::{MysqlConnection, SqliteConnection};
use lms_audit::{Action, Actor, AuditEvent, Cause, EntityRef, StateSnapshot};

use crate::diesel_schema::audit_events;
use crate::error::PersistenceError;

/// Diesel Queryable struct for audit event rows.
#[derive(Queryable, Selectable)]
#[diesel(table_name = audit_events)]
struct AuditEventRow {
    event_id: i64,
    actor_id: String,
    actor_type: String,
    cause_id: String,
    cause_description: String,
    action_name: String,
    action_details: Option<String>,
    entity_type: String,
    entity_id: Option<i64>,
    before_snapshot: String,
    after_snapshot: String,
    created_at: String,
}

impl AuditEventRow {
    fn into_event(self) -> AuditEvent {
        AuditEvent::new(
            Actor::new(self.actor_id, self.actor_type),
            Cause::new(self.cause_id, self.cause_description),
            Action::new(self.action_name, self.action_details),
            EntityRef {
                entity_type: self.entity_type,
                entity_id: self.entity_id,
            },
            StateSnapshot::new(self.before_snapshot),
            StateSnapshot::new(self.after_snapshot),
        )
        .with_id(self.event_id, Some(self.created_at))
    }
}

backend_fn! {
/// Retrieves an audit event by ID.
///
/// # Errors
///
/// Returns `NotFound` if no event has this ID.
pub fn get_audit_event(conn: &mut _, event_id: i64) -> Result<AuditEvent, PersistenceError> {
    let row: AuditEventRow = audit_events::table
        .filter(audit_events::event_id.eq(event_id))
        .select(AuditEventRow::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| PersistenceError::NotFound(format!("Audit event {event_id}")))?;
    Ok(row.into_event())
}
}

backend_fn! {
/// Retrieves the audit trail of one entity type, oldest first.
///
/// When `entity_id` is given only events targeting that entity are
/// returned; events that touched many entities at once are included in
/// every trail of their type.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn get_audit_trail(
    conn: &mut _,
    entity_type: &str,
    entity_id: Option<i64>,
) -> Result<Vec<AuditEvent>, PersistenceError> {
    let mut query = audit_events::table
        .filter(audit_events::entity_type.eq(entity_type))
        .select(AuditEventRow::as_select())
        .into_boxed();
    if let Some(entity_id) = entity_id {
        query = query.filter(
            audit_events::entity_id
                .eq(entity_id)
                .or(audit_events::entity_id.is_null()),
        );
    }
    let rows: Vec<AuditEventRow> = query.order(audit_events::event_id.asc()).load(conn)?;
    Ok(rows.into_iter().map(AuditEventRow::into_event).collect())
}
}

backend_fn! {
/// Retrieves the most recent audit events across all entities.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn get_recent_audit_events(
    conn: &mut _,
    limit: i64,
) -> Result<Vec<AuditEvent>, PersistenceError> {
    let rows: Vec<AuditEventRow> = audit_events::table
        .select(AuditEventRow::as_select())
        .order(audit_events::event_id.desc())
        .limit(limit)
        .load(conn)?;
    Ok(rows.into_iter().map(AuditEventRow::into_event).collect())
}
}
