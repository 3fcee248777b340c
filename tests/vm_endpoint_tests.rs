//! VM endpoint integration tests
//!
//! Covers:
//! - GET / and GET /health
//! - GET /openapi.json
//! - POST /vm/{name}/{size} (validation, provisioning, failures)
//! - GET /vm and GET /vm/{name}

use axum::http::StatusCode;

mod common;
use common::{get, get_json, post, test_app};

use vm_manage::endpoints::create_router;
use vm_manage::services::{MockCloud, ProvisioningStep};

// ============================================================================
// Service identity
// ============================================================================

#[tokio::test]
async fn test_root_identifies_application() {
    let (app, _) = test_app().await;

    let (status, body) = get_json(&app, "/").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, serde_json::json!({ "application": "vm-manage" }));
}

#[tokio::test]
async fn test_health_check_returns_ok() {
    let (app, _) = test_app().await;

    let (status, body) = get(&app, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.trim(), "OK");
}

#[tokio::test]
async fn test_openapi_document_lists_vm_routes() {
    let (app, _) = test_app().await;

    let (status, body) = get_json(&app, "/openapi.json").await;

    assert_eq!(status, StatusCode::OK);
    let paths = body["paths"].as_object().expect("paths object");
    for path in [
        "/",
        "/vm",
        "/vm/{name}",
        "/vm/{name}/{size}",
        "/vm/{name}/boot",
        "/vm/{name}/boot/{unit}",
    ] {
        assert!(paths.contains_key(path), "missing {}", path);
    }
}

// ============================================================================
// POST /vm/{name}/{size}
// ============================================================================

#[tokio::test]
async fn test_create_then_get_vm() {
    let (app, cloud) = test_app().await;

    let (status, body) = post(&app, "/vm/alpha/small").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.is_empty());

    let (status, vm) = get_json(&app, "/vm/alpha").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(vm["name"], "alpha");
    assert_eq!(vm["size"], "SMALL");
    assert!(vm["vm_id"].is_i64());

    assert_eq!(
        cloud.steps().last(),
        Some(&ProvisioningStep::Extension),
        "every provider step should have run"
    );
}

#[tokio::test]
async fn test_size_is_case_insensitive() {
    let (app, _) = test_app().await;

    for (name, size, stored) in [
        ("one", "SMALL", "SMALL"),
        ("two", "Medium", "MEDIUM"),
        ("three", "lArGe", "LARGE"),
    ] {
        let (status, _) = post(&app, &format!("/vm/{}/{}", name, size)).await;
        assert_eq!(status, StatusCode::OK, "size {}", size);

        let (_, vm) = get_json(&app, &format!("/vm/{}", name)).await;
        assert_eq!(vm["size"], stored);
    }
}

#[tokio::test]
async fn test_invalid_size_is_rejected_without_provisioning() {
    let (app, cloud) = test_app().await;

    let (status, body) = post(&app, "/vm/beta/xlarge").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("small, medium, large"), "body: {}", body);
    assert!(cloud.calls().is_empty());

    let (status, _) = get(&app, "/vm/beta").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_invalid_name_is_rejected_without_provisioning() {
    let (app, cloud) = test_app().await;

    let (status, _) = post(&app, "/vm/-bad-/small").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(cloud.calls().is_empty());
}

#[tokio::test]
async fn test_duplicate_name_is_conflict() {
    let (app, cloud) = test_app().await;

    let (status, _) = post(&app, "/vm/alpha/small").await;
    assert_eq!(status, StatusCode::OK);
    let calls_after_first = cloud.calls().len();

    let (status, body) = post(&app, "/vm/alpha/large").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body.contains("register"));
    assert_eq!(
        cloud.calls().len(),
        calls_after_first,
        "a taken name must not touch the provider"
    );

    let (_, vm) = get_json(&app, "/vm/alpha").await;
    assert_eq!(vm["size"], "SMALL");
}

#[tokio::test]
async fn test_provider_failure_is_bad_gateway_and_not_registered() {
    let cloud = MockCloud::failing_at(ProvisioningStep::PublicIp);
    let db = common::create_test_db().await;
    let app = create_router(common::build_app_state(db, &cloud));

    let (status, body) = get_json(&app, "/vm/alpha").await;
    assert_eq!(status, StatusCode::NOT_FOUND, "{}", body);

    let (status, body) = post(&app, "/vm/alpha/medium").await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    let error: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(error["step"], "public_ip");
    assert!(error["detail"].as_str().unwrap().contains("alpha"));

    let (_, vms) = get_json(&app, "/vm").await;
    assert_eq!(vms, serde_json::json!([]));
}

#[tokio::test]
async fn test_authentication_failure_is_bad_gateway() {
    let cloud = MockCloud::failing_at(ProvisioningStep::Authenticate);
    let db = common::create_test_db().await;
    let app = create_router(common::build_app_state(db, &cloud));

    let (status, body) = post(&app, "/vm/alpha/small").await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body.contains("authenticate"));
    assert_eq!(cloud.steps(), vec![ProvisioningStep::Authenticate]);
}

// ============================================================================
// GET /vm and GET /vm/{name}
// ============================================================================

#[tokio::test]
async fn test_list_vms_empty() {
    let (app, _) = test_app().await;

    let (status, body) = get_json(&app, "/vm").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, serde_json::json!([]));
}

#[tokio::test]
async fn test_list_vms_returns_all() {
    let (app, _) = test_app().await;
    post(&app, "/vm/alpha/small").await;
    post(&app, "/vm/beta/large").await;

    let (status, body) = get_json(&app, "/vm").await;

    assert_eq!(status, StatusCode::OK);
    let vms = body.as_array().unwrap();
    assert_eq!(vms.len(), 2);

    let mut names: Vec<&str> = vms.iter().map(|vm| vm["name"].as_str().unwrap()).collect();
    names.sort_unstable();
    assert_eq!(names, vec!["alpha", "beta"]);
    for vm in vms {
        assert!(vm.get("vm_id").is_some());
        assert!(vm.get("size").is_some());
    }
}

#[tokio::test]
async fn test_get_unknown_vm_is_not_found() {
    let (app, _) = test_app().await;

    let (status, body) = get_json(&app, "/vm/ghost").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["detail"].as_str().unwrap().contains("ghost"));
}
