//! In-process provider that records every call and fabricates resource ids.
//! Used by the test-suite in place of a real cloud.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{
    CloudProvider, CloudSession, ExtensionSpec, NetworkInterfaceSpec, ProviderError, PublicIpSpec,
    ResourceGroupSpec, ResourceId, SubnetSpec, VirtualMachineSpec, VirtualNetworkSpec,
};
use crate::services::provisioning::ProvisioningStep;

/// A call received by the mock, in arrival order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    OpenSession,
    ResourceGroup(ResourceGroupSpec),
    VirtualNetwork(VirtualNetworkSpec),
    Subnet(SubnetSpec),
    PublicIp(PublicIpSpec),
    NetworkInterface(NetworkInterfaceSpec),
    VirtualMachine(VirtualMachineSpec),
    Extension(ExtensionSpec),
}

impl MockCall {
    pub fn step(&self) -> ProvisioningStep {
        match self {
            MockCall::OpenSession => ProvisioningStep::Authenticate,
            MockCall::ResourceGroup(_) => ProvisioningStep::ResourceGroup,
            MockCall::VirtualNetwork(_) => ProvisioningStep::VirtualNetwork,
            MockCall::Subnet(_) => ProvisioningStep::Subnet,
            MockCall::PublicIp(_) => ProvisioningStep::PublicIp,
            MockCall::NetworkInterface(_) => ProvisioningStep::NetworkInterface,
            MockCall::VirtualMachine(_) => ProvisioningStep::VirtualMachine,
            MockCall::Extension(_) => ProvisioningStep::Extension,
        }
    }
}

#[derive(Default)]
struct MockState {
    calls: Vec<MockCall>,
    fail_at: Option<ProvisioningStep>,
}

/// Recording provider; clones share the same call log
#[derive(Clone, Default)]
pub struct MockCloud {
    state: Arc<Mutex<MockState>>,
}

impl MockCloud {
    pub fn new() -> Self {
        Self::default()
    }

    /// Provider whose call for `step` is rejected
    pub fn failing_at(step: ProvisioningStep) -> Self {
        let mock = Self::new();
        mock.state.lock().fail_at = Some(step);
        mock
    }

    /// Snapshot of the calls received so far
    pub fn calls(&self) -> Vec<MockCall> {
        self.state.lock().calls.clone()
    }

    pub fn steps(&self) -> Vec<ProvisioningStep> {
        self.state.lock().calls.iter().map(MockCall::step).collect()
    }

    fn record(&self, call: MockCall) -> Result<(), ProviderError> {
        let step = call.step();
        let mut state = self.state.lock();
        state.calls.push(call);

        if state.fail_at == Some(step) {
            return Err(ProviderError::Rejected {
                status: 400,
                code: "MockFailure".to_string(),
                message: format!("mock rejected {}", step),
            });
        }
        Ok(())
    }
}

fn mock_id(resource_group: &str, provider: &str, resource: &str) -> ResourceId {
    format!(
        "/subscriptions/mock/resourceGroups/{}/providers/{}/{}",
        resource_group, provider, resource
    )
}

#[async_trait]
impl CloudProvider for MockCloud {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn open_session(&self) -> Result<Box<dyn CloudSession>, ProviderError> {
        self.record(MockCall::OpenSession)
            .map_err(|e| ProviderError::Authentication(e.to_string()))?;
        Ok(Box::new(self.clone()))
    }
}

#[async_trait]
impl CloudSession for MockCloud {
    async fn ensure_resource_group(
        &self,
        spec: &ResourceGroupSpec,
    ) -> Result<ResourceId, ProviderError> {
        self.record(MockCall::ResourceGroup(spec.clone()))?;
        Ok(format!("/subscriptions/mock/resourceGroups/{}", spec.name))
    }

    async fn create_virtual_network(
        &self,
        spec: &VirtualNetworkSpec,
    ) -> Result<ResourceId, ProviderError> {
        self.record(MockCall::VirtualNetwork(spec.clone()))?;
        Ok(mock_id(
            &spec.resource_group,
            "Microsoft.Network",
            &format!("virtualNetworks/{}", spec.name),
        ))
    }

    async fn create_subnet(&self, spec: &SubnetSpec) -> Result<ResourceId, ProviderError> {
        self.record(MockCall::Subnet(spec.clone()))?;
        Ok(mock_id(
            &spec.resource_group,
            "Microsoft.Network",
            &format!("virtualNetworks/{}/subnets/{}", spec.virtual_network, spec.name),
        ))
    }

    async fn create_public_ip(&self, spec: &PublicIpSpec) -> Result<ResourceId, ProviderError> {
        self.record(MockCall::PublicIp(spec.clone()))?;
        Ok(mock_id(
            &spec.resource_group,
            "Microsoft.Network",
            &format!("publicIPAddresses/{}", spec.name),
        ))
    }

    async fn create_network_interface(
        &self,
        spec: &NetworkInterfaceSpec,
    ) -> Result<ResourceId, ProviderError> {
        self.record(MockCall::NetworkInterface(spec.clone()))?;
        Ok(mock_id(
            &spec.resource_group,
            "Microsoft.Network",
            &format!("networkInterfaces/{}", spec.name),
        ))
    }

    async fn create_virtual_machine(
        &self,
        spec: &VirtualMachineSpec,
    ) -> Result<ResourceId, ProviderError> {
        self.record(MockCall::VirtualMachine(spec.clone()))?;
        Ok(mock_id(
            &spec.resource_group,
            "Microsoft.Compute",
            &format!("virtualMachines/{}", spec.name),
        ))
    }

    async fn submit_extension(&self, spec: &ExtensionSpec) -> Result<ResourceId, ProviderError> {
        self.record(MockCall::Extension(spec.clone()))?;
        Ok(mock_id(
            &spec.resource_group,
            "Microsoft.Compute",
            &format!("virtualMachines/{}/extensions/{}", spec.vm_name, spec.name),
        ))
    }
}
