// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Asset, location and exchange mutations.

use diesel::prelude::*;
use diesel::{MysqlConnection, SqliteConnection};
use time::Date;
use tracing::info;

use lms_domain::{
    Asset, AssetPlacement, AssetStatus, Exchange, ExchangeDecision, ExchangeRequest,
    ExchangeStatus, SenderStanding, validate_asset_dates, validate_exchange_start, validate_name,
};

use crate::backend::PersistenceBackend;
use crate::data_models::{NewAsset, NewLocation, flag, is_set, now_timestamp, store_date};
use crate::diesel_schema::{
    asset_types, assets, exchanges, location_managers, locations, manufacturers, offices,
};
use crate::error::PersistenceError;

backend_fn! {
/// Creates an office.
///
/// # Errors
///
/// Returns `Conflict` if the name is taken.
pub fn create_office(conn: &mut _, name: &str, address: &str) -> Result<i64, PersistenceError> {
    validate_name("Office name", name)?;

    diesel::insert_into(offices::table)
        .values((offices::name.eq(name.trim()), offices::address.eq(address)))
        .execute(conn)?;
    let office_id: i64 = conn.get_last_insert_rowid()?;

    info!(office_id, name, "Created office");
    Ok(office_id)
}
}

backend_fn! {
/// Creates a location inside an office.
///
/// # Errors
///
/// Returns `Conflict` if the office already has a location of that name.
pub fn create_location(conn: &mut _, location: &NewLocation) -> Result<i64, PersistenceError> {
    validate_name("Location name", &location.name)?;

    diesel::insert_into(locations::table)
        .values((
            locations::office_id.eq(location.office_id),
            locations::name.eq(location.name.trim()),
            locations::floor.eq(location.floor),
            locations::room.eq(location.room),
        ))
        .execute(conn)?;
    let location_id: i64 = conn.get_last_insert_rowid()?;

    info!(location_id, office_id = location.office_id, "Created location");
    Ok(location_id)
}
}

backend_fn! {
/// Makes a user a manager of a location.
///
/// # Errors
///
/// Returns `Conflict` if the user already manages it.
pub fn add_location_manager(
    conn: &mut _,
    location_id: i64,
    user_id: i64,
) -> Result<i64, PersistenceError> {
    diesel::insert_into(location_managers::table)
        .values((
            location_managers::location_id.eq(location_id),
            location_managers::user_id.eq(user_id),
        ))
        .execute(conn)?;
    let location_manager_id: i64 = conn.get_last_insert_rowid()?;

    info!(location_id, user_id, "Added location manager");
    Ok(location_manager_id)
}
}

backend_fn! {
/// Creates a manufacturer.
///
/// # Errors
///
/// Returns `Conflict` if the name is taken.
pub fn create_manufacturer(conn: &mut _, name: &str) -> Result<i64, PersistenceError> {
    validate_name("Manufacturer name", name)?;

    diesel::insert_into(manufacturers::table)
        .values(manufacturers::name.eq(name.trim()))
        .execute(conn)?;
    let manufacturer_id: i64 = conn.get_last_insert_rowid()?;

    info!(manufacturer_id, name, "Created manufacturer");
    Ok(manufacturer_id)
}
}

backend_fn! {
/// Creates an asset type.
///
/// # Errors
///
/// Returns `Conflict` if the name is taken.
pub fn create_asset_type(
    conn: &mut _,
    name: &str,
    kitting_required: bool,
    user_searchable: bool,
) -> Result<i64, PersistenceError> {
    validate_name("Asset type name", name)?;

    diesel::insert_into(asset_types::table)
        .values((
            asset_types::name.eq(name.trim()),
            asset_types::kitting_required.eq(flag(kitting_required)),
            asset_types::user_searchable.eq(flag(user_searchable)),
        ))
        .execute(conn)?;
    let asset_type_id: i64 = conn.get_last_insert_rowid()?;

    info!(asset_type_id, name, kitting_required, "Created asset type");
    Ok(asset_type_id)
}
}

backend_fn! {
/// Registers a new asset, held by its creator and not yet assigned.
///
/// # Errors
///
/// Returns a domain error for a blank name or inconsistent dates.
pub fn create_asset(
    conn: &mut _,
    asset: &NewAsset,
    creator_id: i64,
) -> Result<i64, PersistenceError> {
    validate_name("Asset name", &asset.name)?;
    validate_asset_dates(
        asset.purchased_date,
        asset.warranty_start_date,
        asset.warranty_end_date,
    )?;
    let now: String = now_timestamp()?;

    diesel::insert_into(assets::table)
        .values((
            assets::old_code.eq(&asset.old_code),
            assets::name.eq(asset.name.trim()),
            assets::asset_type_id.eq(asset.asset_type_id),
            assets::supplier_id.eq(asset.supplier_id),
            assets::manufacturer_id.eq(asset.manufacturer_id),
            assets::purchased_date.eq(store_date(asset.purchased_date)),
            assets::warranty_start_date.eq(store_date(asset.warranty_start_date)),
            assets::warranty_end_date.eq(store_date(asset.warranty_end_date)),
            assets::origin.eq(asset.origin.as_str()),
            assets::status.eq(asset.status.as_str()),
            assets::is_assigned.eq(flag(false)),
            assets::holder_id.eq(Some(creator_id)),
            assets::location_id.eq(asset.location_id),
            assets::note.eq(&asset.note),
            assets::created_at.eq(&now),
            assets::updated_at.eq(&now),
        ))
        .execute(conn)?;
    let asset_id: i64 = conn.get_last_insert_rowid()?;

    info!(asset_id, creator_id, name = %asset.name, "Created asset");
    Ok(asset_id)
}
}

backend_fn! {
/// Changes the status of an asset and returns it as it was before.
///
/// # Errors
///
/// Returns `NotFound` if the asset does not exist.
pub fn update_asset_status(
    conn: &mut _,
    asset_id: i64,
    status: AssetStatus,
) -> Result<Asset, PersistenceError> {
    conn.write_transaction(|conn| {
        let before: Asset = conn.load_asset(asset_id)?;
        diesel::update(assets::table.filter(assets::asset_id.eq(asset_id)))
            .set((
                assets::status.eq(status.as_str()),
                assets::updated_at.eq(now_timestamp()?),
            ))
            .execute(conn)?;
        info!(asset_id, %status, "Updated asset status");
        Ok(before)
    })
}
}

backend_fn! {
/// Starts moving an asset.
///
/// The exchange is taken at once when the sender hands the asset to
/// themself or places it at a location they manage; otherwise it waits
/// for the receiver.
///
/// # Errors
///
/// Returns a domain error if the sender may not move the asset, or the
/// asset already has a pending exchange.
pub fn start_exchange(
    conn: &mut _,
    request: &ExchangeRequest,
) -> Result<Exchange, PersistenceError> {
    conn.write_transaction(|conn| {
        let asset: Asset = conn.load_asset(request.asset_id)?;
        let pending: i64 = exchanges::table
            .filter(exchanges::asset_id.eq(request.asset_id))
            .filter(exchanges::status.eq(ExchangeStatus::Pending.as_str()))
            .count()
            .get_result(conn)?;
        let kitting_required: bool = asset_types::table
            .filter(asset_types::asset_type_id.eq(asset.asset_type_id))
            .select(asset_types::kitting_required)
            .first::<i32>(conn)
            .map(is_set)?;
        let managed: Vec<i64> = conn.managed_location_ids(request.sender_id)?;
        let standing: SenderStanding = SenderStanding {
            has_pending_exchange: pending > 0,
            manages_source: asset.location_id.is_some_and(|l| managed.contains(&l)),
            manages_destination: request.destination_id.is_some_and(|l| managed.contains(&l)),
        };
        let completes: bool = validate_exchange_start(&asset, request, standing, kitting_required)?;

        let now: String = now_timestamp()?;
        let status: ExchangeStatus = if completes {
            ExchangeStatus::Taken
        } else {
            ExchangeStatus::Pending
        };
        diesel::insert_into(exchanges::table)
            .values((
                exchanges::asset_id.eq(request.asset_id),
                exchanges::kind.eq(request.kind.as_str()),
                exchanges::sender_id.eq(request.sender_id),
                exchanges::receiver_id.eq(request.receiver_id),
                exchanges::source_id.eq(asset.location_id),
                exchanges::destination_id.eq(request.destination_id),
                exchanges::reason.eq(request.reason.as_str()),
                exchanges::status.eq(status.as_str()),
                exchanges::started_at.eq(&now),
                exchanges::ended_at.eq(completes.then(|| now.clone())),
                exchanges::ended_by.eq(completes.then_some(request.sender_id)),
                exchanges::kitting_required.eq(flag(kitting_required)),
                exchanges::comment.eq(&request.comment),
            ))
            .execute(conn)?;
        let exchange_id: i64 = conn.get_last_insert_rowid()?;
        let exchange: Exchange = conn.load_exchange(exchange_id)?;

        if completes {
            let placement: AssetPlacement = exchange.placement_after_take(&asset);
            diesel::update(assets::table.filter(assets::asset_id.eq(asset.asset_id)))
                .set((
                    assets::holder_id.eq(placement.holder_id),
                    assets::location_id.eq(placement.location_id),
                    assets::is_assigned.eq(flag(placement.is_assigned)),
                    assets::updated_at.eq(&now),
                ))
                .execute(conn)?;
        }

        info!(
            exchange_id,
            asset_id = request.asset_id,
            sender_id = request.sender_id,
            receiver_id = request.receiver_id,
            %status,
            "Started exchange"
        );
        Ok(exchange)
    })
}
}

backend_fn! {
/// Takes, rejects or cancels a pending exchange.
///
/// Taking moves the asset to the receiver. Returns the exchange as it was
/// before the decision.
///
/// # Errors
///
/// Returns a domain error if the exchange is closed, the user plays the
/// wrong part, or required kitting is unfinished.
pub fn decide_exchange(
    conn: &mut _,
    exchange_id: i64,
    user_id: i64,
    decision: ExchangeDecision,
) -> Result<Exchange, PersistenceError> {
    conn.write_transaction(|conn| {
        let exchange: Exchange = conn.load_exchange(exchange_id)?;
        let status: ExchangeStatus = exchange.check_decision(decision, user_id)?;
        let now: String = now_timestamp()?;

        diesel::update(exchanges::table.filter(exchanges::exchange_id.eq(exchange_id)))
            .set((
                exchanges::status.eq(status.as_str()),
                exchanges::ended_at.eq(Some(now.clone())),
                exchanges::ended_by.eq(Some(user_id)),
            ))
            .execute(conn)?;

        if decision == ExchangeDecision::Take {
            let asset: Asset = conn.load_asset(exchange.asset_id)?;
            let placement: AssetPlacement = exchange.placement_after_take(&asset);
            diesel::update(assets::table.filter(assets::asset_id.eq(asset.asset_id)))
                .set((
                    assets::holder_id.eq(placement.holder_id),
                    assets::location_id.eq(placement.location_id),
                    assets::is_assigned.eq(flag(placement.is_assigned)),
                    assets::updated_at.eq(&now),
                ))
                .execute(conn)?;
        }

        info!(exchange_id, user_id, %status, "Decided exchange");
        Ok(exchange)
    })
}
}

backend_fn! {
/// Records kitting progress on a pending exchange.
///
/// The first call marks kitting as started by `user_id`; `completed`
/// finishes it. A due date replaces the previous one when given.
///
/// # Errors
///
/// Returns a domain error if the exchange is closed or needs no kitting.
pub fn record_kitting(
    conn: &mut _,
    exchange_id: i64,
    user_id: i64,
    completed: bool,
    due_date: Option<Date>,
) -> Result<Exchange, PersistenceError> {
    conn.write_transaction(|conn| {
        let exchange: Exchange = conn.load_exchange(exchange_id)?;
        exchange.check_kitting()?;
        let now: String = now_timestamp()?;

        if exchange.kitting_started_at.is_none() {
            diesel::update(exchanges::table.filter(exchanges::exchange_id.eq(exchange_id)))
                .set((
                    exchanges::kitting_by.eq(Some(user_id)),
                    exchanges::kitting_started_at.eq(Some(now.clone())),
                ))
                .execute(conn)?;
        }
        if let Some(due_date) = due_date {
            diesel::update(exchanges::table.filter(exchanges::exchange_id.eq(exchange_id)))
                .set(exchanges::kitting_due_date.eq(store_date(Some(due_date))))
                .execute(conn)?;
        }
        if completed && exchange.kitting_completed_at.is_none() {
            diesel::update(exchanges::table.filter(exchanges::exchange_id.eq(exchange_id)))
                .set(exchanges::kitting_completed_at.eq(Some(now.clone())))
                .execute(conn)?;
        }

        info!(exchange_id, user_id, completed, "Recorded kitting");
        Ok(exchange)
    })
}
}
