//! VM provisioning workflow
//!
//! Creates, strictly in order: resource group, virtual network, subnet,
//! public IP, network interface, VM, boot-log extension; then records the VM
//! in the inventory. Each provider call is attempted once. A failure aborts
//! the run and nothing already created is rolled back; the error lists what
//! was left behind.

pub mod plan;
pub mod sku;

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

use crate::config::provisioning::ProvisioningConfig;
use crate::models::{virtual_machine, VmSize};
use crate::services::cloud::{CloudProvider, CloudSession, ProviderError, ResourceId};
use crate::services::inventory::{self, StorageError};
use crate::state::DbConn;

pub use plan::{boot_log_script, validate_vm_name, ResourcePlan};
pub use sku::SkuTable;

/// Workflow stage, reported when a run fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProvisioningStep {
    Authenticate,
    ResourceGroup,
    VirtualNetwork,
    Subnet,
    PublicIp,
    NetworkInterface,
    VirtualMachine,
    Extension,
    Register,
}

impl ProvisioningStep {
    /// Steps executed against the cloud provider, in order
    pub const PROVIDER_STEPS: [ProvisioningStep; 8] = [
        ProvisioningStep::Authenticate,
        ProvisioningStep::ResourceGroup,
        ProvisioningStep::VirtualNetwork,
        ProvisioningStep::Subnet,
        ProvisioningStep::PublicIp,
        ProvisioningStep::NetworkInterface,
        ProvisioningStep::VirtualMachine,
        ProvisioningStep::Extension,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProvisioningStep::Authenticate => "authenticate",
            ProvisioningStep::ResourceGroup => "resource_group",
            ProvisioningStep::VirtualNetwork => "virtual_network",
            ProvisioningStep::Subnet => "subnet",
            ProvisioningStep::PublicIp => "public_ip",
            ProvisioningStep::NetworkInterface => "network_interface",
            ProvisioningStep::VirtualMachine => "virtual_machine",
            ProvisioningStep::Extension => "extension",
            ProvisioningStep::Register => "register",
        }
    }

    pub fn is_provider_step(&self) -> bool {
        !matches!(self, ProvisioningStep::Register)
    }
}

impl fmt::Display for ProvisioningStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("provisioning '{vm}' failed at step {step}: {detail}")]
pub struct ProvisioningError {
    pub vm: String,
    pub step: ProvisioningStep,
    pub detail: String,
    /// Provider ids created before the failure; these need manual cleanup
    pub created: Vec<ResourceId>,
    /// Registration failed because the name is already recorded
    pub name_taken: bool,
}

/// Runs the provisioning workflow against a [`CloudProvider`]
pub struct Provisioner {
    provider: Arc<dyn CloudProvider>,
    config: ProvisioningConfig,
}

/// Progress of one run, used to attribute failures
struct Run<'a> {
    vm: &'a str,
    created: Vec<ResourceId>,
}

impl Run<'_> {
    fn fail(&self, step: ProvisioningStep, detail: impl ToString) -> ProvisioningError {
        let error = ProvisioningError {
            vm: self.vm.to_string(),
            step,
            detail: detail.to_string(),
            created: self.created.clone(),
            name_taken: false,
        };
        if !error.created.is_empty() {
            tracing::warn!(
                "Provisioning of '{}' aborted at {}; orphaned resources: {}",
                self.vm,
                step,
                error.created.join(", ")
            );
        }
        error
    }

    fn record(
        &mut self,
        step: ProvisioningStep,
        result: Result<ResourceId, ProviderError>,
    ) -> Result<ResourceId, ProvisioningError> {
        match result {
            Ok(id) => {
                tracing::info!("Provisioning '{}': {} ready ({})", self.vm, step, id);
                self.created.push(id.clone());
                Ok(id)
            }
            Err(e) => Err(self.fail(step, e)),
        }
    }
}

impl Provisioner {
    pub fn new(provider: Arc<dyn CloudProvider>, config: ProvisioningConfig) -> Self {
        Self { provider, config }
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    /// Bring a new VM into existence and register it locally
    pub async fn provision(
        &self,
        db: &DbConn,
        name: &str,
        size: VmSize,
    ) -> Result<virtual_machine::Model, ProvisioningError> {
        let plan = ResourcePlan::new(name, size, &self.config);
        let mut run = Run {
            vm: name,
            created: Vec::new(),
        };

        // ARM PUTs are create-or-update; a taken name must never reach the provider
        let existing = inventory::get_virtual_machine(db, name)
            .await
            .map_err(|e| run.fail(ProvisioningStep::Register, e))?;
        if existing.is_some() {
            return Err(ProvisioningError {
                name_taken: true,
                ..run.fail(
                    ProvisioningStep::Register,
                    StorageError::Duplicate(name.to_string()),
                )
            });
        }

        tracing::info!(
            "Provisioning '{}' ({}, {}) on {}",
            name,
            size,
            self.config.skus.sku_for(size),
            self.provider.name()
        );

        let session = self
            .provider
            .open_session()
            .await
            .map_err(|e| run.fail(ProvisioningStep::Authenticate, e))?;

        self.create_resources(session.as_ref(), &plan, &mut run)
            .await?;

        let vm = inventory::insert_virtual_machine(db, name, size)
            .await
            .map_err(|e| {
                let name_taken = matches!(e, StorageError::Duplicate(_));
                ProvisioningError {
                    name_taken,
                    ..run.fail(ProvisioningStep::Register, e)
                }
            })?;

        tracing::info!("Provisioned '{}' (vm_id {})", vm.name, vm.vm_id);
        Ok(vm)
    }

    async fn create_resources(
        &self,
        session: &dyn CloudSession,
        plan: &ResourcePlan<'_>,
        run: &mut Run<'_>,
    ) -> Result<(), ProvisioningError> {
        let result = session
            .ensure_resource_group(&plan.resource_group_spec())
            .await;
        run.record(ProvisioningStep::ResourceGroup, result)?;

        let result = session
            .create_virtual_network(&plan.virtual_network_spec())
            .await;
        run.record(ProvisioningStep::VirtualNetwork, result)?;

        let result = session.create_subnet(&plan.subnet_spec()).await;
        let subnet_id = run.record(ProvisioningStep::Subnet, result)?;

        let result = session.create_public_ip(&plan.public_ip_spec()).await;
        let public_ip_id = run.record(ProvisioningStep::PublicIp, result)?;

        let result = session
            .create_network_interface(&plan.network_interface_spec(subnet_id, public_ip_id))
            .await;
        let nic_id = run.record(ProvisioningStep::NetworkInterface, result)?;

        let result = session
            .create_virtual_machine(&plan.virtual_machine_spec(nic_id))
            .await;
        run.record(ProvisioningStep::VirtualMachine, result)?;

        let result = session.submit_extension(&plan.extension_spec()).await;
        run.record(ProvisioningStep::Extension, result)?;

        Ok(())
    }
}
