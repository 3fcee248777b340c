//! Test helpers and utilities for integration testing.
//!
//! Builds an in-memory database with the real migrations, an `AppState`
//! wired to the recording mock provider, and small request helpers.

#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use sea_orm::{Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use tower::util::ServiceExt;

use vm_manage::config::provisioning::ProvisioningConfig;
use vm_manage::endpoints::create_router;
use vm_manage::migrations::Migrator;
use vm_manage::services::cloud::ImageReference;
use vm_manage::services::provisioning::SkuTable;
use vm_manage::services::{MockCloud, Provisioner};
use vm_manage::state::AppState;

pub const PASSWORD_SEED: &str = "Seed#2024";
pub const PUBLIC_URL: &str = "https://vm-manage.test";

/// Create an in-memory SQLite database for testing
pub async fn create_test_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to create test database");

    Migrator::up(&db, None)
        .await
        .expect("Failed to run test migrations");

    db
}

pub fn test_provisioning_config() -> ProvisioningConfig {
    ProvisioningConfig {
        password_seed: PASSWORD_SEED.to_string(),
        location: "eastus".to_string(),
        image: ImageReference::from_urn("Canonical:UbuntuServer:18.04-LTS:latest").unwrap(),
        public_url: PUBLIC_URL.to_string(),
        skus: SkuTable::azure(),
    }
}

pub fn build_provisioner(cloud: &MockCloud) -> Provisioner {
    Provisioner::new(Arc::new(cloud.clone()), test_provisioning_config())
}

/// Build an AppState backed by `db` and the given mock provider
pub fn build_app_state(db: DatabaseConnection, cloud: &MockCloud) -> AppState {
    AppState::new(db, build_provisioner(cloud))
}

/// Router over a fresh database; the returned mock shares its call log
pub async fn test_app() -> (Router, MockCloud) {
    let cloud = MockCloud::new();
    let state = build_app_state(create_test_db().await, &cloud);
    (create_router(state), cloud)
}

pub async fn send(app: &Router, method: &str, uri: &str, body: Body) -> (StatusCode, String) {
    let request = Request::builder()
        .uri(uri)
        .method(method)
        .body(body)
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, String::from_utf8_lossy(&bytes).to_string())
}

pub async fn get(app: &Router, uri: &str) -> (StatusCode, String) {
    send(app, "GET", uri, Body::empty()).await
}

pub async fn get_json(app: &Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let (status, body) = get(app, uri).await;
    let json = serde_json::from_str(&body).unwrap_or(serde_json::Value::Null);
    (status, json)
}

pub async fn post(app: &Router, uri: &str) -> (StatusCode, String) {
    send(app, "POST", uri, Body::empty()).await
}

/// Post a boot report the way the on-VM agent does: raw JSON, no content type
pub async fn post_boot(app: &Router, name: &str, body: &str) -> StatusCode {
    let (status, _) = send(
        app,
        "POST",
        &format!("/vm/{}/boot", name),
        Body::from(body.to_string()),
    )
    .await;
    status
}
