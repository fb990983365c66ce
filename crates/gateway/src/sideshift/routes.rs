//! SideShift proxy handlers.

use std::sync::Arc;

use axum::{
    Json,
    body::Bytes,
    extract::{Path, Query, State},
};
use proto::ValidationError;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, error};

use super::SideshiftError;
use crate::error::ApiError;
use crate::server::GatewayState;

type RouteResult = Result<Json<Value>, ApiError>;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PairsQuery {
    pub deposit_coin: Option<String>,
    pub settle_coin: Option<String>,
}

// ─── Body validation ───────────────────────────────────────

/// Parses a request body that must be a JSON object.
pub fn parse_object(body: &[u8]) -> Result<Map<String, Value>, ValidationError> {
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) => Ok(map),
        _ => Err(ValidationError::InvalidBody),
    }
}

/// Requires `field` to be a non-empty string.
pub fn require_string(body: &Map<String, Value>, field: &str) -> Result<(), ValidationError> {
    match body.get(field) {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(()),
        _ => Err(ValidationError::MissingOrInvalid(field.to_string())),
    }
}

/// Normalizes an amount field in place: numbers become strings, null is
/// dropped. Returns whether a non-empty amount remains.
pub fn normalize_amount(
    body: &mut Map<String, Value>,
    field: &str,
) -> Result<bool, ValidationError> {
    let normalized = match body.remove(field) {
        None | Some(Value::Null) => return Ok(false),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::String(s)) => s,
        Some(_) => return Err(ValidationError::InvalidAmount),
    };
    let present = !normalized.trim().is_empty();
    body.insert(field.to_string(), Value::String(normalized));
    Ok(present)
}

/// Fills `affiliateId` when the caller left it absent, null, or empty.
pub fn inject_affiliate(body: &mut Map<String, Value>, affiliate_id: Option<&str>) {
    let Some(id) = affiliate_id else {
        return;
    };
    let missing = match body.get("affiliateId") {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(_) => false,
    };
    if missing {
        body.insert("affiliateId".to_string(), Value::String(id.to_string()));
    }
}

/// Validates and normalizes a quote request body.
pub fn prepare_quote(
    body: &[u8],
    affiliate_id: Option<&str>,
) -> Result<Value, ValidationError> {
    let mut map = parse_object(body)?;
    require_string(&map, "depositCoin")?;
    require_string(&map, "settleCoin")?;
    let has_deposit = normalize_amount(&mut map, "depositAmount")?;
    let has_settle = normalize_amount(&mut map, "settleAmount")?;
    if !has_deposit && !has_settle {
        return Err(ValidationError::MissingAmount);
    }
    inject_affiliate(&mut map, affiliate_id);
    Ok(Value::Object(map))
}

/// Validates a fixed-rate shift request body.
pub fn prepare_fixed_shift(
    body: &[u8],
    affiliate_id: Option<&str>,
) -> Result<Value, ValidationError> {
    let mut map = parse_object(body)?;
    require_string(&map, "quoteId")?;
    require_string(&map, "settleAddress")?;
    inject_affiliate(&mut map, affiliate_id);
    Ok(Value::Object(map))
}

fn upstream_failure(route: &'static str, fallback: &str, err: SideshiftError) -> ApiError {
    match &err {
        SideshiftError::Upstream(e) => {
            error!(route, status = e.status, message = %e.message, "SideShift upstream error")
        }
        SideshiftError::Config(e) => error!(route, error = %e, "SideShift not configured"),
        SideshiftError::Transport(e) => error!(route, error = %e, "SideShift request failed"),
    }
    err.into_api(fallback)
}

// ─── Handlers ──────────────────────────────────────────────

pub async fn coins(State(state): State<Arc<GatewayState>>) -> RouteResult {
    state
        .sideshift
        .coins()
        .await
        .map(Json)
        .map_err(|e| {
            upstream_failure("coins", "Unexpected error while fetching SideShift coins.", e)
        })
}

pub async fn pairs(
    State(state): State<Arc<GatewayState>>,
    Query(query): Query<PairsQuery>,
) -> RouteResult {
    state
        .sideshift
        .pairs(query.deposit_coin.as_deref(), query.settle_coin.as_deref())
        .await
        .map(Json)
        .map_err(|e| {
            upstream_failure("pairs", "Unexpected error while fetching SideShift pairs.", e)
        })
}

pub async fn create_quote(State(state): State<Arc<GatewayState>>, body: Bytes) -> RouteResult {
    let payload = prepare_quote(&body, state.sideshift.affiliate_id())?;
    debug!(route = "quotes", "Forwarding SideShift quote request");
    state
        .sideshift
        .create_quote(&payload)
        .await
        .map(Json)
        .map_err(|e| {
            upstream_failure(
                "quotes",
                "Unexpected error while requesting a SideShift quote.",
                e,
            )
        })
}

pub async fn create_fixed_shift(
    State(state): State<Arc<GatewayState>>,
    body: Bytes,
) -> RouteResult {
    let payload = prepare_fixed_shift(&body, state.sideshift.affiliate_id())?;
    debug!(route = "shifts/fixed", "Forwarding SideShift fixed shift request");
    state
        .sideshift
        .create_fixed_shift(&payload)
        .await
        .map(Json)
        .map_err(|e| {
            upstream_failure(
                "shifts/fixed",
                "Unexpected error while creating a SideShift shift.",
                e,
            )
        })
}

pub async fn shift_status(
    State(state): State<Arc<GatewayState>>,
    Path(shift_id): Path<String>,
) -> RouteResult {
    let shift_id = shift_id.trim();
    if shift_id.is_empty() {
        return Err(ValidationError::MissingShiftId.into());
    }
    state.sideshift.shift(shift_id).await.map(Json).map_err(|e| {
        upstream_failure(
            "shifts/status",
            "Unexpected error while fetching the SideShift shift status.",
            e,
        )
    })
}

/// `GET /api/sideshift/shifts/` with an empty id segment.
pub async fn missing_shift_id() -> ApiError {
    ValidationError::MissingShiftId.into()
}
