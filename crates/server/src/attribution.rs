// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Attribution of write requests.
//!
//! Every state-changing request names who is acting and why through
//! headers:
//!
//! - `X-Actor-Id` (required): the operator performing the change
//! - `X-Cause-Id` (optional): a ticket or request reference
//! - `X-Cause-Description` (optional): free text for the audit trail

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use tracing::{debug, warn};

use lms_api::AuthenticatedActor;
use lms_audit::Cause;

use crate::AppState;

pub const ACTOR_HEADER: &str = "x-actor-id";
pub const CAUSE_ID_HEADER: &str = "x-cause-id";
pub const CAUSE_DESCRIPTION_HEADER: &str = "x-cause-description";

/// Extractor for the actor and cause of a write request.
///
/// ```ignore
/// async fn my_handler(
///     Attribution(actor, cause): Attribution,
/// ) -> Result<Json<Response>, HttpError> {
///     // actor: AuthenticatedActor
///     // cause: Cause
/// }
/// ```
pub struct Attribution(pub AuthenticatedActor, pub Cause);

fn header_value<'a>(parts: &'a Parts, name: &str) -> Result<Option<&'a str>, AttributionError> {
    parts
        .headers
        .get(name)
        .map(|value| {
            value.to_str().map_err(|_| {
                warn!(header = name, "Invalid header encoding");
                AttributionError::InvalidHeader(name.to_string())
            })
        })
        .transpose()
}

impl FromRequestParts<AppState> for Attribution {
    type Rejection = AttributionError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let actor_id: &str = header_value(parts, ACTOR_HEADER)?.ok_or_else(|| {
            debug!("Missing actor header");
            AttributionError::MissingActor
        })?;
        let actor: AuthenticatedActor = AuthenticatedActor::operator(actor_id)
            .map_err(|e| AttributionError::InvalidActor(e.to_string()))?;

        let cause_id: String = header_value(parts, CAUSE_ID_HEADER)?
            .map_or_else(|| format!("{} {}", parts.method, parts.uri.path()), str::to_string);
        let description: String = header_value(parts, CAUSE_DESCRIPTION_HEADER)?
            .map_or_else(|| String::from("API request"), str::to_string);

        Ok(Self(actor, Cause::new(cause_id, description)))
    }
}

/// Attribution extraction errors.
#[derive(Debug)]
pub enum AttributionError {
    MissingActor,
    InvalidHeader(String),
    InvalidActor(String),
}

impl IntoResponse for AttributionError {
    fn into_response(self) -> Response {
        let message: String = match self {
            Self::MissingActor => String::from("Missing X-Actor-Id header"),
            Self::InvalidHeader(name) => format!("Header {name} is not valid text"),
            Self::InvalidActor(reason) => reason,
        };
        crate::HttpError {
            status: StatusCode::UNAUTHORIZED,
            message,
        }
        .into_response()
    }
}
