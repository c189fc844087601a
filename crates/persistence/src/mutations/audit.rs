// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Audit event persistence.

use diesel::prelude::*;
use diesel::{MysqlConnection, SqliteConnection};
use lms_audit::AuditEvent;
use tracing::debug;

use crate::backend::PersistenceBackend;
use crate::data_models::now_timestamp;
use crate::diesel_schema::audit_events;
use crate::error::PersistenceError;

backend_fn! {
/// Appends an audit event.
///
/// Events without a timestamp are stamped with the current time.
///
/// # Returns
///
/// The event ID assigned by the database.
///
/// # Errors
///
/// Returns an error if the insert fails.
pub fn persist_audit_event(conn: &mut _, event: &AuditEvent) -> Result<i64, PersistenceError> {
    let created_at: String = match &event.created_at {
        Some(created_at) => created_at.clone(),
        None => now_timestamp()?,
    };

    diesel::insert_into(audit_events::table)
        .values((
            audit_events::actor_id.eq(&event.actor.id),
            audit_events::actor_type.eq(&event.actor.actor_type),
            audit_events::cause_id.eq(&event.cause.id),
            audit_events::cause_description.eq(&event.cause.description),
            audit_events::action_name.eq(&event.action.name),
            audit_events::action_details.eq(&event.action.details),
            audit_events::entity_type.eq(&event.target.entity_type),
            audit_events::entity_id.eq(event.target.entity_id),
            audit_events::before_snapshot.eq(&event.before.data),
            audit_events::after_snapshot.eq(&event.after.data),
            audit_events::created_at.eq(&created_at),
        ))
        .execute(conn)?;
    let event_id: i64 = conn.get_last_insert_rowid()?;

    debug!(
        event_id,
        action = %event.action.name,
        entity_type = %event.target.entity_type,
        "Persisted audit event"
    );
    Ok(event_id)
}
}
