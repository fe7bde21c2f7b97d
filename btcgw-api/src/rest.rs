//! REST handlers for the anchor and API-key routes.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use btcgw_gw::GatewayError;
use btcgw_model::AnchorRecord;

use crate::error::ServiceError;
use crate::server::AppState;

/// Anchor fields as they appear in responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnchorDto {
    /// BBc-1 domain ID, 64 hex chars.
    pub bbc1dom: String,
    /// BBc-1 transaction ID, 64 hex chars.
    pub bbc1tx: String,
    /// Chain name, e.g. `"Testnet3"`.
    pub chain: String,
    /// Anchor timestamp, unix seconds.
    pub time: i64,
    /// Anchor format version.
    pub version: u8,
}

/// A full anchor record as it appears in responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnchorRecordDto {
    /// The anchor.
    pub anchor: AnchorDto,
    /// Optional BBc-1 domain name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bbc1name: Option<String>,
    /// Bitcoin transaction ID, display-order hex.
    pub btctx: String,
    /// Confirmations as of the last refresh.
    pub confirmations: u64,
    /// Optional note.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// Node-reported transaction time, unix seconds.
    pub time: i64,
}

impl From<&AnchorRecord> for AnchorRecordDto {
    fn from(r: &AnchorRecord) -> Self {
        Self {
            anchor: AnchorDto {
                bbc1dom: hex::encode(r.anchor.domain_id),
                bbc1tx: hex::encode(r.anchor.transaction_id),
                chain: r.anchor.network.name().to_string(),
                time: r.anchor.timestamp.timestamp(),
                version: r.anchor.version,
            },
            bbc1name: (!r.domain_name.is_empty()).then(|| r.domain_name.clone()),
            btctx: hex::encode(&r.btc_txid),
            confirmations: r.confirmations,
            note: (!r.note.is_empty()).then(|| r.note.clone()),
            time: r.tx_time.timestamp(),
        }
    }
}

/// Decode a path ID: exactly 64 lowercase hex chars.
fn decode_id(id: &str) -> Result<Vec<u8>, ServiceError> {
    if id.len() != 64
        || !id
            .chars()
            .all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase())
    {
        return Err(ServiceError::InvalidId);
    }
    hex::decode(id).map_err(|_| ServiceError::InvalidId)
}

fn decode_ids(dom: &str, tx: &str) -> Result<(Vec<u8>, Vec<u8>), ServiceError> {
    Ok((decode_id(dom)?, decode_id(tx)?))
}

/// `GET /anchors/domains/{dom}/transactions/{tx}`
pub async fn get_anchor(
    State(state): State<Arc<AppState>>,
    Path((dom, tx)): Path<(String, String)>,
) -> Result<Response, ServiceError> {
    let (bdom, btx) = decode_ids(&dom, &tx)?;
    match state.gateway.get_record(&bdom, &btx).await {
        Ok(record) => Ok(state.json(StatusCode::OK, &AnchorRecordDto::from(&record))),
        Err(GatewayError::RecordNotFound) => Err(ServiceError::TxNotFound),
        Err(e) => {
            error!(error = %e, "record lookup failed");
            Err(ServiceError::TxNotFound)
        }
    }
}

/// `POST /anchors/domains/{dom}/transactions/{tx}`
///
/// Precondition: no record exists yet. Registers, stores, and responds
/// with the stored record.
pub async fn post_anchor(
    State(state): State<Arc<AppState>>,
    Path((dom, tx)): Path<(String, String)>,
) -> Result<Response, ServiceError> {
    let (bdom, btx) = decode_ids(&dom, &tx)?;

    match state.gateway.get_record(&bdom, &btx).await {
        Err(GatewayError::RecordNotFound) => {}
        Ok(_) => return Err(ServiceError::TxAlreadyExists),
        Err(e) => {
            error!(error = %e, "precondition check failed");
            return Err(ServiceError::RegisterFailed);
        }
    }

    let btc_txid = state
        .gateway
        .register_transaction(&bdom, &btx)
        .await
        .map_err(|e| {
            error!(error = %e, "registration failed");
            ServiceError::RegisterFailed
        })?;
    state.gateway.store_record(&btc_txid).await.map_err(|e| {
        error!(
            error = %e,
            btc_txid = %hex::encode(&btc_txid),
            "anchor broadcast but the record could not be stored"
        );
        ServiceError::RegisterFailed
    })?;

    let record = state.gateway.get_record(&bdom, &btx).await.map_err(|e| {
        error!(error = %e, "stored record could not be read back");
        ServiceError::RegisterFailed
    })?;
    info!(dom = %dom, tx = %tx, btctx = %hex::encode(&btc_txid), "anchor registered");
    Ok(state.json(StatusCode::OK, &AnchorRecordDto::from(&record)))
}

/// `PATCH /anchors/domains/{dom}/transactions/{tx}`
///
/// Refreshes confirmations and stamps the note with the refresh time.
pub async fn patch_anchor(
    State(state): State<Arc<AppState>>,
    Path((dom, tx)): Path<(String, String)>,
) -> Result<Response, ServiceError> {
    let (bdom, btx) = decode_ids(&dom, &tx)?;
    let note = format!(
        "Updated at {}",
        Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
    );
    match state
        .gateway
        .refresh_record(&bdom, &btx, None, Some(&note))
        .await
    {
        Ok(()) => Ok(StatusCode::NO_CONTENT.into_response()),
        Err(GatewayError::RecordNotFound) => Err(ServiceError::TxNotFound),
        Err(e) => {
            error!(error = %e, "refresh failed");
            Err(ServiceError::TxNotFound)
        }
    }
}

/// Request body for `POST /apikeys/create`.
#[derive(Debug, Deserialize)]
pub struct CreateKeyRequest {
    /// The BBc-1 domain (hex) the key will be bound to.
    pub domain: String,
}

/// Body carrying an API key, used by create responses and delete requests.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiKeyBody {
    /// The key, 32 hex chars.
    pub key: String,
}

/// `POST /apikeys/create`: issue a key bound to one domain.
pub async fn create_apikey(
    State(state): State<Arc<AppState>>,
    body: Result<Json<CreateKeyRequest>, JsonRejection>,
) -> Result<Response, ServiceError> {
    let Json(request) = body.map_err(|_| ServiceError::InvalidRequestBody)?;
    if hex::decode(&request.domain).is_err() {
        return Err(ServiceError::InvalidParam);
    }
    let note = format!(
        "Created by API at: {}",
        Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
    );
    let key = state
        .keys
        .generate(&request.domain, false, &note)
        .await
        .map_err(|e| {
            error!(error = %e, "key creation failed");
            ServiceError::ApiKeyCreationFailed
        })?;
    Ok(state.json(StatusCode::OK, &ApiKeyBody { key: key.key }))
}

/// `POST /apikeys/delete`: revoke a key.
pub async fn delete_apikey(
    State(state): State<Arc<AppState>>,
    body: Result<Json<ApiKeyBody>, JsonRejection>,
) -> Result<Response, ServiceError> {
    let Json(request) = body.map_err(|_| ServiceError::InvalidRequestBody)?;
    state.keys.delete(&request.key).await.map_err(|e| {
        error!(error = %e, "key deletion failed");
        ServiceError::ApiKeyDeletionFailed
    })?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

/// `GET /healthz`
pub async fn healthz() -> &'static str {
    "ok"
}
