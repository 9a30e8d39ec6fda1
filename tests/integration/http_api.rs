//! The HTTP router driven end to end with `tower::ServiceExt::oneshot`.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use rust_decimal_macros::dec;
use secrecy::SecretString;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use layoffs_market::config::{GameConfig, UploadsConfig};
use layoffs_market::storage::Store;
use layoffs_market::types::Candidate;
use layoffs_market::web::{build_router, WebState};

use crate::support::{seeded_market, MemoryPhotoStore};

const TOKEN: &str = "s3cret-admin";

fn router(store: Store, photos: MemoryPhotoStore) -> Router {
    let uploads = UploadsConfig {
        dir: std::env::temp_dir()
            .join("layoffs_it_uploads")
            .to_string_lossy()
            .into_owned(),
        max_bytes: 1024 * 1024,
    };
    let state = WebState::new(
        store,
        Arc::new(photos),
        SecretString::new(TOKEN.to_string()),
        &uploads,
        &GameConfig::default(),
    );
    build_router(Arc::new(state))
}

async fn app() -> (Router, Store, Vec<Candidate>) {
    let (store, candidates) = seeded_market(&[dec!(3.0), dec!(1.5)]).await;
    (router(store.clone(), MemoryPhotoStore::new()), store, candidates)
}

async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>, admin: bool) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if admin {
        builder = builder.header("authorization", format!("Bearer {TOKEN}"));
    }
    let req = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), 1_000_000).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

#[tokio::test]
async fn test_summary_reflects_seeded_catalog() {
    let (app, _, _) = app().await;
    let (status, summary) = call(&app, "GET", "/api/summary", None, false).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["departments"], 13);
    assert_eq!(summary["positions"], 91);
    assert_eq!(summary["total_employees"], 262);
    assert_eq!(summary["candidates"], 2);

    let (_, departments) = call(&app, "GET", "/api/departments", None, false).await;
    assert_eq!(departments.as_array().unwrap().len(), 13);
}

#[tokio::test]
async fn test_player_journey() {
    let (app, _, candidates) = app().await;
    let (likely, unlikely) = (&candidates[1], &candidates[0]);

    let (_, reg) = call(&app, "POST", "/api/register", Some(json!({"username": "dana"})), false).await;
    let user_id = reg["user_id"].as_i64().unwrap();

    for (candidate, amount) in [(likely, 400), (unlikely, 100)] {
        let (status, _) = call(
            &app,
            "POST",
            "/api/bet",
            Some(json!({"user_id": user_id, "candidate_id": candidate.id, "amount": amount})),
            false,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (_, profile) = call(&app, "GET", &format!("/api/users/{user_id}/profile"), None, false).await;
    assert_eq!(profile["user"]["coins"], 500);
    assert_eq!(profile["coins_at_risk"], 500);
    assert_eq!(profile["bets"].as_array().unwrap().len(), 2);

    let (status, report) = call(
        &app,
        "POST",
        &format!("/api/admin/candidates/{}/layoff", likely.id),
        Some(json!({"laid_off": true})),
        true,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["total_paid"], 600);

    let (_, profile) = call(&app, "GET", &format!("/api/users/{user_id}/profile"), None, false).await;
    assert_eq!(profile["user"]["coins"], 1100);
    assert_eq!(profile["coins_at_risk"], 100);

    let (_, board) = call(&app, "GET", "/api/leaderboard?limit=1", None, false).await;
    assert_eq!(board[0]["username"], "dana");
    assert_eq!(board[0]["coins"], 1100);

    // Re-posting the same layoff pays nothing more.
    let (_, again) = call(
        &app,
        "POST",
        &format!("/api/admin/candidates/{}/layoff", likely.id),
        Some(json!({"laid_off": true})),
        true,
    )
    .await;
    assert_eq!(again["total_paid"], 0);
    let (_, user) = call(&app, "GET", &format!("/api/users/{user_id}"), None, false).await;
    assert_eq!(user["coins"], 1100);
}

#[tokio::test]
async fn test_admin_layoff_requires_token() {
    let (app, store, candidates) = app().await;
    let (status, body) = call(
        &app,
        "POST",
        &format!("/api/admin/candidates/{}/layoff", candidates[0].id),
        Some(json!({"laid_off": true})),
        false,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
    assert!(!store.candidate(candidates[0].id).await.unwrap().unwrap().is_laid_off);
}

#[tokio::test]
async fn test_upload_failure_is_reported_generically() {
    let (store, candidates) = seeded_market(&[dec!(2.0)]).await;
    let photos = MemoryPhotoStore::new();
    photos.set_error("disk full at /var/secret/path");
    let app = router(store.clone(), photos.clone());

    let boundary = "B0UNDARY";
    let body = format!(
        "--{boundary}\r\nContent-Disposition: form-data; name=\"name\"\r\n\r\nPat\r\n\
         --{boundary}\r\nContent-Disposition: form-data; name=\"position_id\"\r\n\r\n{}\r\n\
         --{boundary}\r\nContent-Disposition: form-data; name=\"photo\"; filename=\"pat.jpg\"\r\n\r\nJPEG\r\n\
         --{boundary}--\r\n",
        candidates[0].position_id
    );
    let req = Request::builder()
        .method("POST")
        .uri("/api/admin/candidates")
        .header("authorization", format!("Bearer {TOKEN}"))
        .header("content-type", format!("multipart/form-data; boundary={boundary}"))
        .body(Body::from(body))
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let bytes = axum::body::to_bytes(resp.into_body(), 10_000).await.unwrap();
    let json: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(json["success"], false);
    assert!(!json["message"].as_str().unwrap().contains("/var/secret"));

    assert!(photos.saved().is_empty());
    assert!(store.candidate_by_name("Pat").await.unwrap().is_none());
}

#[tokio::test]
async fn test_photo_reference_lands_on_candidate() {
    let (store, candidates) = seeded_market(&[dec!(2.0)]).await;
    let photos = MemoryPhotoStore::new();
    let app = router(store.clone(), photos.clone());

    let boundary = "B0UNDARY";
    let body = format!(
        "--{boundary}\r\nContent-Disposition: form-data; name=\"photo\"; filename=\"new.webp\"\r\n\r\nWEBP\r\n\
         --{boundary}--\r\n"
    );
    let req = Request::builder()
        .method("PUT")
        .uri(format!("/api/admin/candidates/{}", candidates[0].id))
        .header("x-admin-token", TOKEN)
        .header("content-type", format!("multipart/form-data; boundary={boundary}"))
        .body(Body::from(body))
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let saved = photos.saved();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].0, "mem_new.webp");
    assert_eq!(saved[0].1, b"WEBP".to_vec());
    let updated = store.candidate(candidates[0].id).await.unwrap().unwrap();
    assert_eq!(updated.photo, "mem_new.webp");
    assert_eq!(updated.name, candidates[0].name);
}
