// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Synchronizing users with a directory export.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use time::Date;
use tracing::debug;

use lms_domain::{DomainError, User, email_local_part, validate_user_fields};

/// A user as listed by the directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryEntry {
    pub primary_email: String,
    pub given_name: String,
    pub family_name: String,
    pub suspended: bool,
    pub created_on: Option<Date>,
}

/// The fields of a user about to be created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserDraft {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub is_active: bool,
    pub date_joined: Option<Date>,
}

impl UserDraft {
    /// Builds a draft from a directory entry, named after the email's local part.
    ///
    /// # Errors
    ///
    /// Returns an error if the email or derived username is invalid.
    pub fn from_entry(entry: &DirectoryEntry) -> Result<Self, DomainError> {
        let username: &str = email_local_part(&entry.primary_email)?;
        validate_user_fields(username, &entry.primary_email)?;
        Ok(Self {
            username: username.to_string(),
            email: entry.primary_email.clone(),
            first_name: entry.given_name.clone(),
            last_name: entry.family_name.clone(),
            is_active: true,
            date_joined: entry.created_on,
        })
    }
}

/// What a directory sync will change.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectorySyncPlan {
    pub create: Vec<UserDraft>,
    /// Active users suspended in the directory.
    pub deactivate: Vec<i64>,
    /// Entries that change nothing.
    pub skipped: usize,
    /// Entries that could not be turned into users, with the reason.
    pub rejected: Vec<(String, String)>,
}

/// Compares the directory with the stored users.
///
/// Users are matched by email. Unknown, non-suspended entries are created;
/// known active users that are suspended are deactivated. Nothing is ever
/// reactivated.
#[must_use]
pub fn plan_directory_sync(users: &[User], entries: &[DirectoryEntry]) -> DirectorySyncPlan {
    let by_email: BTreeMap<&str, &User> = users.iter().map(|u| (u.email.as_str(), u)).collect();
    let taken: BTreeSet<&str> = users.iter().map(|u| u.username.as_str()).collect();
    let mut plan: DirectorySyncPlan = DirectorySyncPlan::default();

    for entry in entries {
        match by_email.get(entry.primary_email.as_str()) {
            Some(user) if entry.suspended && user.is_active => {
                plan.deactivate.push(user.user_id);
            }
            Some(_) => plan.skipped += 1,
            None if entry.suspended => plan.skipped += 1,
            None => match UserDraft::from_entry(entry) {
                Ok(draft) if taken.contains(draft.username.as_str()) => plan.rejected.push((
                    entry.primary_email.clone(),
                    format!("Username {} is already taken", draft.username),
                )),
                Ok(draft) => {
                    if plan.create.iter().any(|d| d.username == draft.username) {
                        plan.skipped += 1;
                    } else {
                        plan.create.push(draft);
                    }
                }
                Err(err) => plan
                    .rejected
                    .push((entry.primary_email.clone(), err.to_string())),
            },
        }
    }

    debug!(
        create = plan.create.len(),
        deactivate = plan.deactivate.len(),
        skipped = plan.skipped,
        rejected = plan.rejected.len(),
        "Planned directory sync"
    );
    plan
}
