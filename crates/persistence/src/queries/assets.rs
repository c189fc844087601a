// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Asset, location and exchange queries.

use diesel::prelude::*;
use diesel::{MysqlConnection, SqliteConnection};
use tracing::debug;

use lms_domain::{Asset, AssetType, Exchange, Location, Manufacturer, Office};

use crate::data_models::{
    is_set, parse_optional_timestamp, parse_stored, parse_stored_date, parse_timestamp,
};
use crate::diesel_schema::{
    asset_types, assets, exchanges, location_managers, locations, manufacturers, offices,
};
use crate::error::PersistenceError;

/// Diesel Queryable struct for asset rows.
#[derive(Queryable, Selectable)]
#[diesel(table_name = assets)]
pub(crate) struct AssetRow {
    asset_id: i64,
    old_code: String,
    name: String,
    asset_type_id: i64,
    supplier_id: Option<i64>,
    manufacturer_id: Option<i64>,
    purchased_date: Option<String>,
    warranty_start_date: Option<String>,
    warranty_end_date: Option<String>,
    origin: String,
    status: String,
    is_assigned: i32,
    holder_id: Option<i64>,
    location_id: Option<i64>,
    available_at: Option<String>,
    note: String,
    created_at: String,
    updated_at: String,
}

impl AssetRow {
    pub(crate) fn into_asset(self) -> Result<Asset, PersistenceError> {
        Ok(Asset {
            asset_id: self.asset_id,
            old_code: self.old_code,
            name: self.name,
            asset_type_id: self.asset_type_id,
            supplier_id: self.supplier_id,
            manufacturer_id: self.manufacturer_id,
            purchased_date: parse_stored_date(self.purchased_date.as_deref())?,
            warranty_start_date: parse_stored_date(self.warranty_start_date.as_deref())?,
            warranty_end_date: parse_stored_date(self.warranty_end_date.as_deref())?,
            origin: parse_stored(&self.origin)?,
            status: parse_stored(&self.status)?,
            is_assigned: is_set(self.is_assigned),
            holder_id: self.holder_id,
            location_id: self.location_id,
            available_at: parse_stored_date(self.available_at.as_deref())?,
            note: self.note,
            created_at: parse_timestamp(&self.created_at)?,
            updated_at: parse_timestamp(&self.updated_at)?,
        })
    }
}

/// Diesel Queryable struct for exchange rows.
#[derive(Queryable, Selectable)]
#[diesel(table_name = exchanges)]
pub(crate) struct ExchangeRow {
    exchange_id: i64,
    asset_id: i64,
    kind: String,
    sender_id: i64,
    receiver_id: i64,
    source_id: Option<i64>,
    destination_id: Option<i64>,
    reason: String,
    status: String,
    started_at: String,
    ended_at: Option<String>,
    ended_by: Option<i64>,
    kitting_required: i32,
    kitting_by: Option<i64>,
    kitting_started_at: Option<String>,
    kitting_completed_at: Option<String>,
    kitting_due_date: Option<String>,
    comment: String,
}

impl ExchangeRow {
    pub(crate) fn into_exchange(self) -> Result<Exchange, PersistenceError> {
        Ok(Exchange {
            exchange_id: self.exchange_id,
            asset_id: self.asset_id,
            kind: parse_stored(&self.kind)?,
            sender_id: self.sender_id,
            receiver_id: self.receiver_id,
            source_id: self.source_id,
            destination_id: self.destination_id,
            reason: parse_stored(&self.reason)?,
            status: parse_stored(&self.status)?,
            started_at: parse_timestamp(&self.started_at)?,
            ended_at: parse_optional_timestamp(self.ended_at.as_deref())?,
            ended_by: self.ended_by,
            kitting_required: is_set(self.kitting_required),
            kitting_by: self.kitting_by,
            kitting_started_at: parse_optional_timestamp(self.kitting_started_at.as_deref())?,
            kitting_completed_at: parse_optional_timestamp(self.kitting_completed_at.as_deref())?,
            kitting_due_date: parse_stored_date(self.kitting_due_date.as_deref())?,
            comment: self.comment,
        })
    }
}

backend_fn! {
/// Lists offices ordered by name.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn list_offices(conn: &mut _) -> Result<Vec<Office>, PersistenceError> {
    let rows: Vec<(i64, String, String)> = offices::table
        .select((offices::office_id, offices::name, offices::address))
        .order(offices::name.asc())
        .load(conn)?;
    Ok(rows
        .into_iter()
        .map(|(office_id, name, address)| Office {
            office_id,
            name,
            address,
        })
        .collect())
}
}

backend_fn! {
/// Lists locations, optionally within one office.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn list_locations(
    conn: &mut _,
    office_id: Option<i64>,
) -> Result<Vec<Location>, PersistenceError> {
    let mut query = locations::table
        .select((
            locations::location_id,
            locations::office_id,
            locations::name,
            locations::floor,
            locations::room,
        ))
        .into_boxed();
    if let Some(office_id) = office_id {
        query = query.filter(locations::office_id.eq(office_id));
    }
    let rows: Vec<(i64, i64, String, Option<i32>, Option<i32>)> =
        query.order(locations::name.asc()).load(conn)?;
    Ok(rows
        .into_iter()
        .map(|(location_id, office_id, name, floor, room)| Location {
            location_id,
            office_id,
            name,
            floor,
            room,
        })
        .collect())
}
}

backend_fn! {
/// IDs of the locations `user_id` manages.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn managed_location_ids(conn: &mut _, user_id: i64) -> Result<Vec<i64>, PersistenceError> {
    Ok(location_managers::table
        .filter(location_managers::user_id.eq(user_id))
        .select(location_managers::location_id)
        .order(location_managers::location_id.asc())
        .load(conn)?)
}
}

backend_fn! {
/// Lists manufacturers ordered by name.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn list_manufacturers(conn: &mut _) -> Result<Vec<Manufacturer>, PersistenceError> {
    let rows: Vec<(i64, String)> = manufacturers::table
        .select((manufacturers::manufacturer_id, manufacturers::name))
        .order(manufacturers::name.asc())
        .load(conn)?;
    Ok(rows
        .into_iter()
        .map(|(manufacturer_id, name)| Manufacturer {
            manufacturer_id,
            name,
        })
        .collect())
}
}

backend_fn! {
/// Lists asset types ordered by name.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn list_asset_types(conn: &mut _) -> Result<Vec<AssetType>, PersistenceError> {
    let rows: Vec<(i64, String, i32, i32)> = asset_types::table
        .select((
            asset_types::asset_type_id,
            asset_types::name,
            asset_types::kitting_required,
            asset_types::user_searchable,
        ))
        .order(asset_types::name.asc())
        .load(conn)?;
    Ok(rows
        .into_iter()
        .map(
            |(asset_type_id, name, kitting_required, user_searchable)| AssetType {
                asset_type_id,
                name,
                kitting_required: is_set(kitting_required),
                user_searchable: is_set(user_searchable),
            },
        )
        .collect())
}
}

backend_fn! {
/// Returns whether assets of a type need kitting before hand-over.
///
/// # Errors
///
/// Returns `NotFound` if the asset type does not exist.
pub fn asset_type_requires_kitting(
    conn: &mut _,
    asset_type_id: i64,
) -> Result<bool, PersistenceError> {
    let flag: i32 = asset_types::table
        .filter(asset_types::asset_type_id.eq(asset_type_id))
        .select(asset_types::kitting_required)
        .first(conn)
        .optional()?
        .ok_or_else(|| PersistenceError::NotFound(format!("Asset type {asset_type_id}")))?;
    Ok(is_set(flag))
}
}

backend_fn! {
/// Retrieves an asset by ID.
///
/// # Errors
///
/// Returns `NotFound` if the asset does not exist.
pub fn get_asset(conn: &mut _, asset_id: i64) -> Result<Asset, PersistenceError> {
    assets::table
        .filter(assets::asset_id.eq(asset_id))
        .select(AssetRow::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| PersistenceError::NotFound(format!("Asset {asset_id}")))?
        .into_asset()
}
}

backend_fn! {
/// Assets `user_id` may see: unassigned stock they hold and anything at a
/// location they manage.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn list_visible_assets(conn: &mut _, user_id: i64) -> Result<Vec<Asset>, PersistenceError> {
    let managed: Vec<i64> = location_managers::table
        .filter(location_managers::user_id.eq(user_id))
        .select(location_managers::location_id)
        .load(conn)?;

    let rows: Vec<AssetRow> = assets::table
        .filter(
            assets::holder_id
                .eq(user_id)
                .and(assets::is_assigned.eq(0))
                .or(assets::location_id.eq_any(&managed)),
        )
        .select(AssetRow::as_select())
        .order(assets::asset_id.asc())
        .load(conn)?;

    debug!(user_id, count = rows.len(), "Loaded visible assets");
    rows.into_iter().map(AssetRow::into_asset).collect()
}
}

backend_fn! {
/// Retrieves an exchange by ID.
///
/// # Errors
///
/// Returns `NotFound` if the exchange does not exist.
pub fn get_exchange(conn: &mut _, exchange_id: i64) -> Result<Exchange, PersistenceError> {
    exchanges::table
        .filter(exchanges::exchange_id.eq(exchange_id))
        .select(ExchangeRow::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| PersistenceError::NotFound(format!("Exchange {exchange_id}")))?
        .into_exchange()
}
}

backend_fn! {
/// Exchanges of an asset, newest first.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn list_asset_exchanges(
    conn: &mut _,
    asset_id: i64,
) -> Result<Vec<Exchange>, PersistenceError> {
    let rows: Vec<ExchangeRow> = exchanges::table
        .filter(exchanges::asset_id.eq(asset_id))
        .select(ExchangeRow::as_select())
        .order(exchanges::exchange_id.desc())
        .load(conn)?;
    rows.into_iter().map(ExchangeRow::into_exchange).collect()
}
}

backend_fn! {
/// Returns whether an asset has a pending exchange.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn has_pending_exchange(conn: &mut _, asset_id: i64) -> Result<bool, PersistenceError> {
    let pending: i64 = exchanges::table
        .filter(exchanges::asset_id.eq(asset_id))
        .filter(exchanges::status.eq("pending"))
        .count()
        .get_result(conn)?;
    Ok(pending > 0)
}
}
