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
    clippy::all
)]

use serde::{Deserialize, Serialize};

/// Represents the entity performing an action.
///
/// An actor is any identifiable entity that initiates a state change:
/// an operator calling the API, the directory sync job, or the CLI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    /// The unique identifier for this actor.
    pub id: String,
    /// The type of actor (e.g., "operator", "system").
    pub actor_type: String,
}

impl Actor {
    /// Creates a new Actor.
    #[must_use]
    pub const fn new(id: String, actor_type: String) -> Self {
        Self { id, actor_type }
    }

    /// The actor used for changes made by scheduled or command-line jobs.
    #[must_use]
    pub fn system(job: &str) -> Self {
        Self::new(job.to_string(), String::from("system"))
    }
}

/// Represents the reason or trigger for an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cause {
    /// The unique identifier for this cause (e.g. a request id or ticket).
    pub id: String,
    /// A human-readable description of the cause.
    pub description: String,
}

impl Cause {
    /// Creates a new Cause.
    #[must_use]
    pub const fn new(id: String, description: String) -> Self {
        Self { id, description }
    }
}

/// Represents the action that was performed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    /// The name of the action (e.g. `CreateAssignment`).
    pub name: String,
    /// Optional additional details about the action.
    pub details: Option<String>,
}

impl Action {
    /// Creates a new Action.
    #[must_use]
    pub const fn new(name: String, details: Option<String>) -> Self {
        Self { name, details }
    }
}

/// A serialized view of an entity before or after a change.
///
/// Snapshots are opaque JSON strings. An empty snapshot means the entity did
/// not exist on that side of the change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateSnapshot {
    /// The serialized state data.
    pub data: String,
}

impl StateSnapshot {
    /// Creates a new `StateSnapshot`.
    #[must_use]
    pub const fn new(data: String) -> Self {
        Self { data }
    }

    /// The snapshot of an entity that does not exist.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            data: String::new(),
        }
    }

    /// Returns whether this snapshot records a missing entity.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// The entity an audit event is about, e.g. `("license", 12)`.
///
/// Bulk operations that touch many rows use no id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRef {
    /// The kind of entity.
    pub entity_type: String,
    /// The entity's identifier, when a single entity is affected.
    pub entity_id: Option<i64>,
}

impl EntityRef {
    /// Creates a reference to a single entity.
    #[must_use]
    pub fn new(entity_type: &str, entity_id: i64) -> Self {
        Self {
            entity_type: entity_type.to_string(),
            entity_id: Some(entity_id),
        }
    }

    /// Creates a reference to a group of entities of one type.
    #[must_use]
    pub fn many(entity_type: &str) -> Self {
        Self {
            entity_type: entity_type.to_string(),
            entity_id: None,
        }
    }
}

/// An immutable audit event representing a state change.
///
/// Every successful state change must produce exactly one audit event.
/// Audit events are immutable once created and capture:
/// - Who performed the action (actor)
/// - Why it was performed (cause)
/// - What action was performed (action)
/// - Which entity it touched (target)
/// - The state before and after the change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Assigned by persistence; `None` until stored.
    pub event_id: Option<i64>,
    /// The actor who initiated this state change.
    pub actor: Actor,
    /// The cause or reason for this state change.
    pub cause: Cause,
    /// The action that was performed.
    pub action: Action,
    /// The entity the change applies to.
    pub target: EntityRef,
    /// The state before the change.
    pub before: StateSnapshot,
    /// The state after the change.
    pub after: StateSnapshot,
    /// Storage timestamp, set when read back from persistence.
    pub created_at: Option<String>,
}

impl AuditEvent {
    /// Creates a new, not yet persisted, `AuditEvent`.
    #[must_use]
    pub const fn new(
        actor: Actor,
        cause: Cause,
        action: Action,
        target: EntityRef,
        before: StateSnapshot,
        after: StateSnapshot,
    ) -> Self {
        Self {
            event_id: None,
            actor,
            cause,
            action,
            target,
            before,
            after,
            created_at: None,
        }
    }

    /// Returns a copy of this event carrying its stored id and timestamp.
    #[must_use]
    pub fn with_id(self, event_id: i64, created_at: Option<String>) -> Self {
        Self {
            event_id: Some(event_id),
            created_at,
            ..self
        }
    }
}

#[cfg(test)]
mod tests;
