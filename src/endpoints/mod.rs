pub mod vms;

use axum::{routing::get, Json, Router};
use utoipa::OpenApi;

use crate::models::VmSize;
use crate::schemas::{ApplicationInfo, BootEventResponse, BootReport, VirtualMachineResponse};
use crate::state::AppState;

/// OpenAPI document for the public routes
#[derive(OpenApi)]
#[openapi(
    paths(
        root,
        vms::list_vms,
        vms::get_vm,
        vms::create_vm,
        vms::list_boot_events,
        vms::list_unit_boot_events,
        vms::report_boot_event,
    ),
    components(schemas(
        ApplicationInfo,
        VirtualMachineResponse,
        BootEventResponse,
        BootReport,
        VmSize
    )),
    tags((name = "VirtualMachines", description = "VM provisioning and boot telemetry"))
)]
pub struct ApiDoc;

/// Create the main API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/openapi.json", get(openapi))
        .nest("/vm", vms::vm_routes(state))
}

/// Application identity
#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, body = ApplicationInfo)
    )
)]
pub async fn root() -> Json<ApplicationInfo> {
    Json(ApplicationInfo {
        application: "vm-manage".to_string(),
    })
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

async fn openapi() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
