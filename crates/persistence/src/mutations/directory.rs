// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! User mutations and directory synchronization.

use diesel::prelude::*;
use diesel::{MysqlConnection, SqliteConnection};
use tracing::info;

use lms::{DirectoryEntry, DirectorySyncPlan, UserDraft, plan_directory_sync};
use lms_domain::{User, validate_user_fields};

use crate::backend::PersistenceBackend;
use crate::data_models::{DirectorySyncOutcome, flag, store_date};
use crate::diesel_schema::users;
use crate::error::PersistenceError;
use crate::queries::directory::UserRow;

backend_fn! {
/// Creates a user.
///
/// # Errors
///
/// Returns a domain error for invalid fields and `Conflict` if the
/// username is taken.
pub fn create_user(conn: &mut _, draft: &UserDraft) -> Result<i64, PersistenceError> {
    validate_user_fields(&draft.username, &draft.email)?;

    diesel::insert_into(users::table)
        .values((
            users::username.eq(&draft.username),
            users::email.eq(&draft.email),
            users::first_name.eq(&draft.first_name),
            users::last_name.eq(&draft.last_name),
            users::is_active.eq(flag(draft.is_active)),
            users::date_joined.eq(store_date(draft.date_joined)),
        ))
        .execute(conn)?;
    let user_id: i64 = conn.get_last_insert_rowid()?;

    info!(user_id, username = %draft.username, "Created user");
    Ok(user_id)
}
}

backend_fn! {
/// Activates or deactivates a user.
///
/// # Errors
///
/// Returns `NotFound` if the user does not exist.
pub fn set_user_active(
    conn: &mut _,
    user_id: i64,
    is_active: bool,
) -> Result<(), PersistenceError> {
    let updated: usize = diesel::update(users::table.filter(users::user_id.eq(user_id)))
        .set(users::is_active.eq(flag(is_active)))
        .execute(conn)?;
    if updated == 0 {
        return Err(PersistenceError::NotFound(format!("User {user_id}")));
    }

    info!(user_id, is_active, "Updated user active flag");
    Ok(())
}
}

backend_fn! {
/// Plans and applies a directory sync in one transaction.
///
/// Unknown accounts are created and known accounts suspended in the
/// directory are deactivated. Nothing is ever reactivated.
///
/// # Errors
///
/// Returns an error if a write fails; nothing is applied in that case.
pub fn sync_directory(
    conn: &mut _,
    entries: &[DirectoryEntry],
) -> Result<(DirectorySyncPlan, DirectorySyncOutcome), PersistenceError> {
    conn.write_transaction(|conn| {
        let rows: Vec<UserRow> = users::table.select(UserRow::as_select()).load(conn)?;
        let known: Vec<User> = rows
            .into_iter()
            .map(UserRow::into_user)
            .collect::<Result<_, _>>()?;
        let plan: DirectorySyncPlan = plan_directory_sync(&known, entries);

        let mut outcome: DirectorySyncOutcome = DirectorySyncOutcome::default();
        for draft in &plan.create {
            diesel::insert_into(users::table)
                .values((
                    users::username.eq(&draft.username),
                    users::email.eq(&draft.email),
                    users::first_name.eq(&draft.first_name),
                    users::last_name.eq(&draft.last_name),
                    users::is_active.eq(flag(draft.is_active)),
                    users::date_joined.eq(store_date(draft.date_joined)),
                ))
                .execute(conn)?;
            outcome.created.push(conn.get_last_insert_rowid()?);
        }
        if !plan.deactivate.is_empty() {
            diesel::update(users::table.filter(users::user_id.eq_any(&plan.deactivate)))
                .set(users::is_active.eq(flag(false)))
                .execute(conn)?;
            outcome.deactivated.clone_from(&plan.deactivate);
        }

        info!(
            created = outcome.created.len(),
            deactivated = outcome.deactivated.len(),
            skipped = plan.skipped,
            rejected = plan.rejected.len(),
            "Synchronized users from directory"
        );
        Ok((plan, outcome))
    })
}
}
