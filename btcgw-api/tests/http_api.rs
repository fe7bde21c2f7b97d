//! Route-level tests over in-memory backends.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use btcgw_api::{router, AppState, KeyStore, MemoryKeyStore};
use btcgw_btc::MockBtc;
use btcgw_gw::{Gateway, GatewayImpl};
use btcgw_model::{BtcNet, Mode};
use btcgw_store::MemoryStore;
use btcgw_wallet::{MemoryBackend, MemoryWallet, Wallet};

const ADDR: &str = "tb1qhexc7d0fzex7lrzw3l0j2dmvhgegt02ckfdzjr";
const DOM_A: &str = "456789abc0ef0123456089abcdef0023456789a0cdef0123406789abcde00123";
const DOM_B: &str = "6789abcde00123456780abcdef0120456789abc0ef0123456089abcdef002345";
const TX_1: &str = "56789abcd0f0123456709abcdef0103456789ab0def0123450789abcdef01234";

async fn app(utxos: usize, confirmations: Vec<u64>) -> (Router, Arc<MemoryKeyStore>) {
    let backend = MemoryBackend::new();
    let seeder = MemoryWallet::open(backend.clone(), ADDR);
    for n in 0..utxos {
        seeder.add(&[n as u8 + 1; 32], ADDR).await.unwrap();
    }

    let gateway: Arc<dyn Gateway> = Arc::new(GatewayImpl::new(
        BtcNet::Testnet3,
        Mode::Production,
        MockBtc::new(BtcNet::Testnet3, Mode::Production).with_confirmations(confirmations),
        MemoryWallet::open(backend, ADDR),
        MemoryStore::new(),
    ));
    let keys = Arc::new(MemoryKeyStore::new());
    let state = Arc::new(AppState::new(gateway, keys.clone(), false));
    (router(state), keys)
}

fn anchor_uri(dom: &str, tx: &str) -> String {
    format!("/anchors/domains/{dom}/transactions/{tx}")
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn request(method: &str, uri: &str, key: Option<&str>, body: Option<String>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(key) = key {
        builder = builder.header("X-API-Key", key);
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

#[tokio::test]
async fn healthz_is_open() {
    let (app, _keys) = app(0, vec![0]).await;
    let response = app
        .oneshot(request("GET", "/healthz", None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn anchor_routes_require_a_key() {
    let (app, _keys) = app(1, vec![0]).await;
    let response = app
        .oneshot(request("GET", &anchor_uri(DOM_A, TX_1), None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn domain_scoped_key_only_works_on_its_domain() {
    let (app, keys) = app(2, vec![0]).await;
    let key = keys.generate(DOM_A, false, "test").await.unwrap().key;

    let response = app
        .clone()
        .oneshot(request("GET", &anchor_uri(DOM_B, TX_1), Some(&key), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Same key, bound domain: passes auth (404 because nothing registered).
    let response = app
        .oneshot(request("GET", &anchor_uri(DOM_A, TX_1), Some(&key), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn global_key_works_everywhere() {
    let (app, keys) = app(0, vec![0]).await;
    let key = keys.generate("", true, "admin").await.unwrap().key;
    for dom in [DOM_A, DOM_B] {
        let response = app
            .clone()
            .oneshot(request("GET", &anchor_uri(dom, TX_1), Some(&key), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}

#[tokio::test]
async fn register_then_get_then_refresh() {
    let (app, keys) = app(1, vec![0, 7]).await;
    let key = keys.generate(DOM_A, false, "test").await.unwrap().key;

    // Register.
    let response = app
        .clone()
        .oneshot(request("POST", &anchor_uri(DOM_A, TX_1), Some(&key), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["anchor"]["bbc1dom"], DOM_A);
    assert_eq!(body["anchor"]["bbc1tx"], TX_1);
    assert_eq!(body["anchor"]["chain"], "Testnet3");
    assert_eq!(body["anchor"]["version"], 1);
    assert_eq!(body["confirmations"], 0);
    assert!(body["btctx"].as_str().unwrap().len() == 64);
    assert!(body.get("note").is_none());

    // Registering the same pair again is a conflict.
    let response = app
        .clone()
        .oneshot(request("POST", &anchor_uri(DOM_A, TX_1), Some(&key), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = body_json(response).await;
    assert_eq!(body["error"], "btcgw::tx_already_exists");

    // Refresh bumps confirmations and stamps the note.
    let response = app
        .clone()
        .oneshot(request("PATCH", &anchor_uri(DOM_A, TX_1), Some(&key), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .oneshot(request("GET", &anchor_uri(DOM_A, TX_1), Some(&key), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["confirmations"], 7);
    assert!(body["note"].as_str().unwrap().starts_with("Updated at "));
}

#[tokio::test]
async fn register_without_utxo_fails() {
    let (app, keys) = app(0, vec![0]).await;
    let key = keys.generate(DOM_A, false, "test").await.unwrap().key;
    let response = app
        .oneshot(request("POST", &anchor_uri(DOM_A, TX_1), Some(&key), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert_eq!(body["error"], "btcgw::register_failed");
}

#[tokio::test]
async fn invalid_path_ids_are_rejected() {
    let (app, keys) = app(0, vec![0]).await;
    let key = keys.generate("abcd", false, "test").await.unwrap().key;
    // Auth scope matches the path parameter verbatim, so a short "domain"
    // passes auth and fails ID validation.
    let response = app
        .clone()
        .oneshot(request(
            "GET",
            "/anchors/domains/abcd/transactions/abcd",
            Some(&key),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "btcgw::invalid_id");

    // Uppercase hex is rejected too.
    let upper = DOM_A.to_uppercase();
    let key2 = keys.generate(&upper, false, "test").await.unwrap().key;
    let response = app
        .oneshot(request(
            "GET",
            &anchor_uri(&upper, TX_1),
            Some(&key2),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn patch_unknown_record_is_not_found() {
    let (app, keys) = app(0, vec![0]).await;
    let key = keys.generate(DOM_A, false, "test").await.unwrap().key;
    let response = app
        .oneshot(request("PATCH", &anchor_uri(DOM_A, TX_1), Some(&key), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["error"], "btcgw::tx_not_found");
}

#[tokio::test]
async fn apikey_create_and_use() {
    let (app, _keys) = app(1, vec![0]).await;

    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/apikeys/create",
            None,
            Some(format!(r#"{{"domain": "{DOM_A}"}}"#)),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let key = body["key"].as_str().unwrap().to_string();
    assert_eq!(key.len(), 32);

    // The issued key is immediately usable on its domain.
    let response = app
        .oneshot(request("POST", &anchor_uri(DOM_A, TX_1), Some(&key), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn apikey_create_rejects_bad_input() {
    let (app, _keys) = app(0, vec![0]).await;

    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/apikeys/create",
            None,
            Some("not json".to_string()),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "btcgw::invalid_request_body");

    let response = app
        .oneshot(request(
            "POST",
            "/apikeys/create",
            None,
            Some(r#"{"domain": "zzzz"}"#.to_string()),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "btcgw::invalid_param");
}

#[tokio::test]
async fn apikey_delete_revokes() {
    let (app, keys) = app(0, vec![0]).await;
    let key = keys.generate(DOM_A, false, "test").await.unwrap().key;

    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/apikeys/delete",
            None,
            Some(format!(r#"{{"key": "{key}"}}"#)),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .oneshot(request("GET", &anchor_uri(DOM_A, TX_1), Some(&key), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
