// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! User queries.

use diesel::prelude::*;
use diesel::{MysqlConnection, SqliteConnection};
use tracing::debug;

use lms_domain::User;

use crate::data_models::{is_set, parse_stored_date};
use crate::diesel_schema::users;
use crate::error::PersistenceError;

/// Diesel Queryable struct for user rows.
#[derive(Queryable, Selectable)]
#[diesel(table_name = users)]
pub(crate) struct UserRow {
    user_id: i64,
    username: String,
    email: String,
    first_name: String,
    last_name: String,
    is_active: i32,
    date_joined: Option<String>,
}

impl UserRow {
    pub(crate) fn into_user(self) -> Result<User, PersistenceError> {
        Ok(User {
            user_id: self.user_id,
            username: self.username,
            email: self.email,
            first_name: self.first_name,
            last_name: self.last_name,
            is_active: is_set(self.is_active),
            date_joined: parse_stored_date(self.date_joined.as_deref())?,
        })
    }
}

backend_fn! {
/// Retrieves a user by ID.
///
/// # Errors
///
/// Returns `NotFound` if the user does not exist.
pub fn get_user(conn: &mut _, user_id: i64) -> Result<User, PersistenceError> {
    debug!("Looking up user ID: {}", user_id);

    let row: UserRow = users::table
        .filter(users::user_id.eq(user_id))
        .select(UserRow::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| PersistenceError::NotFound(format!("User {user_id}")))?;
    row.into_user()
}
}

backend_fn! {
/// Lists users ordered by username.
///
/// `search` keeps users whose username starts with it; `active_only` drops
/// deactivated users.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn list_users(
    conn: &mut _,
    search: Option<&str>,
    active_only: bool,
) -> Result<Vec<User>, PersistenceError> {
    let mut query = users::table.select(UserRow::as_select()).into_boxed();
    if let Some(prefix) = search.filter(|s| !s.is_empty()) {
        query = query.filter(users::username.like(format!("{prefix}%")));
    }
    if active_only {
        query = query.filter(users::is_active.eq(1));
    }

    let rows: Vec<UserRow> = query.order(users::username.asc()).load(conn)?;
    rows.into_iter().map(UserRow::into_user).collect()
}
}
