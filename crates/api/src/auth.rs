// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Attribution of state changes.
//!
//! There is no permission model: every caller may perform every action.
//! Callers still have to say who they are so that the audit trail can
//! name them.

use lms_audit::Actor;

use crate::error::AuthError;

/// Who is acting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActorKind {
    /// A person using the API.
    Operator,
    /// A scheduled job or CLI command.
    System,
}

impl ActorKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Operator => "operator",
            Self::System => "system",
        }
    }
}

/// An identified actor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedActor {
    /// The unique identifier for this actor.
    pub id: String,
    pub kind: ActorKind,
}

impl AuthenticatedActor {
    /// Identifies an operator.
    ///
    /// # Errors
    ///
    /// Returns an error if the identifier is blank.
    pub fn operator(id: &str) -> Result<Self, AuthError> {
        let id: &str = id.trim();
        if id.is_empty() {
            return Err(AuthError::AuthenticationFailed {
                reason: String::from("Actor id cannot be empty"),
            });
        }
        Ok(Self {
            id: id.to_string(),
            kind: ActorKind::Operator,
        })
    }

    /// The actor of a scheduled job or CLI command.
    #[must_use]
    pub fn system(job: &str) -> Self {
        Self {
            id: job.to_string(),
            kind: ActorKind::System,
        }
    }

    /// Converts this actor into the audit representation.
    #[must_use]
    pub fn to_audit_actor(&self) -> Actor {
        Actor::new(self.id.clone(), self.kind.as_str().to_string())
    }
}
