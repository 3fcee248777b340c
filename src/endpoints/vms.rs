//! Virtual machine and boot-event endpoints

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};

use crate::error::{AppError, Result};
use crate::models::{virtual_machine, VmSize};
use crate::schemas::{BootEventResponse, BootReport, VirtualMachineResponse};
use crate::services::inventory;
use crate::services::provisioning::validate_vm_name;
use crate::state::{AppState, DbConn};

/// Create the /vm routes
pub fn vm_routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(list_vms))
        .route("/{name}", get(get_vm))
        .route("/{name}/boot", get(list_boot_events).post(report_boot_event))
        .route("/{name}/boot/{unit}", get(list_unit_boot_events))
        .route("/{name}/{size}", post(create_vm))
        .with_state(state)
}

// ============================================================================
// Helpers
// ============================================================================

/// Boot-event listings answer 400 for an unknown VM
async fn require_vm(db: &DbConn, name: &str) -> Result<virtual_machine::Model> {
    inventory::get_virtual_machine(db, name)
        .await?
        .ok_or_else(|| AppError::BadRequest(format!("Virtual machine '{}' does not exist", name)))
}

async fn boot_events(
    db: &DbConn,
    name: &str,
    unit: Option<&str>,
) -> Result<Json<Vec<BootEventResponse>>> {
    require_vm(db, name).await?;
    let events = inventory::list_boot_events(db, name, unit).await?;
    Ok(Json(events.into_iter().map(BootEventResponse::from).collect()))
}

// ============================================================================
// Endpoint Handlers
// ============================================================================

/// List all virtual machines
#[utoipa::path(
    get,
    path = "/vm",
    tag = "VirtualMachines",
    responses(
        (status = 200, body = Vec<VirtualMachineResponse>)
    )
)]
pub async fn list_vms(State(state): State<AppState>) -> Result<Json<Vec<VirtualMachineResponse>>> {
    let vms = inventory::list_virtual_machines(&state.db).await?;
    Ok(Json(vms.into_iter().map(VirtualMachineResponse::from).collect()))
}

/// Get a virtual machine by name
#[utoipa::path(
    get,
    path = "/vm/{name}",
    tag = "VirtualMachines",
    params(("name" = String, Path, description = "VM name")),
    responses(
        (status = 200, body = VirtualMachineResponse),
        (status = 404, description = "No VM with that name")
    )
)]
pub async fn get_vm(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<VirtualMachineResponse>> {
    let vm = inventory::get_virtual_machine(&state.db, &name)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Virtual machine '{}' not found", name)))?;
    Ok(Json(vm.into()))
}

/// Provision a new virtual machine
#[utoipa::path(
    post,
    path = "/vm/{name}/{size}",
    tag = "VirtualMachines",
    params(
        ("name" = String, Path, description = "VM name"),
        ("size" = String, Path, description = "small, medium or large (any case)")
    ),
    responses(
        (status = 200, description = "VM provisioned and registered"),
        (status = 400, description = "Invalid size or name"),
        (status = 409, description = "Name already registered"),
        (status = 502, description = "A cloud provider step failed")
    )
)]
pub async fn create_vm(
    State(state): State<AppState>,
    Path((name, size)): Path<(String, String)>,
) -> Result<StatusCode> {
    let size: VmSize = size.parse().map_err(AppError::BadRequest)?;
    validate_vm_name(&name).map_err(AppError::BadRequest)?;

    state.provisioner.provision(&state.db, &name, size).await?;
    Ok(StatusCode::OK)
}

/// List boot events for a virtual machine
#[utoipa::path(
    get,
    path = "/vm/{name}/boot",
    tag = "VirtualMachines",
    params(("name" = String, Path, description = "VM name")),
    responses(
        (status = 200, body = Vec<BootEventResponse>),
        (status = 400, description = "VM does not exist")
    )
)]
pub async fn list_boot_events(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<Vec<BootEventResponse>>> {
    boot_events(&state.db, &name, None).await
}

/// List boot events for a virtual machine, filtered to one unit
#[utoipa::path(
    get,
    path = "/vm/{name}/boot/{unit}",
    tag = "VirtualMachines",
    params(
        ("name" = String, Path, description = "VM name"),
        ("unit" = String, Path, description = "systemd unit, e.g. sshd.service")
    ),
    responses(
        (status = 200, body = Vec<BootEventResponse>),
        (status = 400, description = "VM does not exist")
    )
)]
pub async fn list_unit_boot_events(
    State(state): State<AppState>,
    Path((name, unit)): Path<(String, String)>,
) -> Result<Json<Vec<BootEventResponse>>> {
    boot_events(&state.db, &name, Some(&unit)).await
}

/// Report one boot journal line
///
/// The body is a JSON object with string `UNIT` and `MESSAGE` fields; the
/// agent posts it without a JSON content type, so the body is read raw.
/// Anything else is ignored. Reports for unknown VMs are dropped.
#[utoipa::path(
    post,
    path = "/vm/{name}/boot",
    tag = "VirtualMachines",
    params(("name" = String, Path, description = "VM name")),
    request_body = BootReport,
    responses(
        (status = 200, description = "Accepted (recorded when the VM exists and both fields are present)")
    )
)]
pub async fn report_boot_event(
    State(state): State<AppState>,
    Path(name): Path<String>,
    body: Bytes,
) -> Result<StatusCode> {
    let Some(report) = BootReport::from_body(&body) else {
        tracing::debug!("Ignoring boot report for '{}' without UNIT/MESSAGE", name);
        return Ok(StatusCode::OK);
    };

    let recorded =
        inventory::insert_boot_event(&state.db, &name, &report.unit, &report.message).await?;
    if !recorded {
        tracing::warn!(
            "Dropped boot event for unknown virtual machine '{}' (unit {})",
            name,
            report.unit
        );
    }

    Ok(StatusCode::OK)
}
