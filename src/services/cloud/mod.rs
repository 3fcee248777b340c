//! Cloud provider seam.
//!
//! The provisioning workflow describes each resource it needs as a plain
//! spec and hands it to a [`CloudSession`]. Adapters translate specs into
//! provider API calls and block until the provider reports a terminal state.

pub mod azure;
pub mod mock;

use std::fmt;

use async_trait::async_trait;
use thiserror::Error;

pub use azure::AzureProvider;
pub use mock::MockCloud;

/// Fully-qualified provider identifier of a created resource
pub type ResourceId = String;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("authentication failed: {0}")]
    Authentication(String),

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("provider rejected request ({status}): {code}: {message}")]
    Rejected {
        status: u16,
        code: String,
        message: String,
    },

    #[error("operation ended in state {state}: {detail}")]
    OperationFailed { state: String, detail: String },

    #[error("unexpected provider response: {0}")]
    MalformedResponse(String),
}

/// Entry point to a provider; one session is opened per provisioning run
#[async_trait]
pub trait CloudProvider: Send + Sync {
    /// Short provider name for logs
    fn name(&self) -> &'static str;

    /// Authenticate and return a session for a single workflow run
    async fn open_session(&self) -> Result<Box<dyn CloudSession>, ProviderError>;
}

/// Resource-creation calls available within an authenticated session.
///
/// Every call except [`CloudSession::submit_extension`] returns only once
/// the provider reports the resource as created.
#[async_trait]
pub trait CloudSession: Send + Sync {
    /// Create or update (reuse) a resource group
    async fn ensure_resource_group(
        &self,
        spec: &ResourceGroupSpec,
    ) -> Result<ResourceId, ProviderError>;

    async fn create_virtual_network(
        &self,
        spec: &VirtualNetworkSpec,
    ) -> Result<ResourceId, ProviderError>;

    async fn create_subnet(&self, spec: &SubnetSpec) -> Result<ResourceId, ProviderError>;

    async fn create_public_ip(&self, spec: &PublicIpSpec) -> Result<ResourceId, ProviderError>;

    async fn create_network_interface(
        &self,
        spec: &NetworkInterfaceSpec,
    ) -> Result<ResourceId, ProviderError>;

    async fn create_virtual_machine(
        &self,
        spec: &VirtualMachineSpec,
    ) -> Result<ResourceId, ProviderError>;

    /// Submit a VM extension; does not wait for it to finish
    async fn submit_extension(&self, spec: &ExtensionSpec) -> Result<ResourceId, ProviderError>;
}

// ============================================================================
// Resource specs
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceGroupSpec {
    pub name: String,
    pub location: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VirtualNetworkSpec {
    pub resource_group: String,
    pub name: String,
    pub location: String,
    pub address_prefixes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubnetSpec {
    pub resource_group: String,
    pub virtual_network: String,
    pub name: String,
    pub address_prefix: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicIpSpec {
    pub resource_group: String,
    pub name: String,
    pub location: String,
    /// e.g. `Basic`
    pub sku: String,
    /// `Dynamic` or `Static`
    pub allocation_method: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkInterfaceSpec {
    pub resource_group: String,
    pub name: String,
    pub location: String,
    pub ip_configuration_name: String,
    pub subnet_id: ResourceId,
    pub public_ip_id: ResourceId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VirtualMachineSpec {
    pub resource_group: String,
    pub name: String,
    pub location: String,
    pub computer_name: String,
    pub admin: AdminCredential,
    /// Provider SKU, already resolved from the requested size
    pub vm_size: String,
    pub image: ImageReference,
    pub network_interface_id: ResourceId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionSpec {
    pub resource_group: String,
    pub vm_name: String,
    pub name: String,
    pub location: String,
    pub publisher: String,
    pub extension_type: String,
    pub type_handler_version: String,
    pub command: String,
}

/// Marketplace image coordinates
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageReference {
    pub publisher: String,
    pub offer: String,
    pub sku: String,
    pub version: String,
}

impl ImageReference {
    /// Parse a `publisher:offer:sku:version` URN
    pub fn from_urn(urn: &str) -> Option<Self> {
        let parts: Vec<&str> = urn.trim().split(':').collect();
        match parts.as_slice() {
            [publisher, offer, sku, version]
                if parts.iter().all(|part| !part.is_empty()) =>
            {
                Some(Self {
                    publisher: publisher.to_string(),
                    offer: offer.to_string(),
                    sku: sku.to_string(),
                    version: version.to_string(),
                })
            }
            _ => None,
        }
    }
}

/// Admin login placed on a new VM
#[derive(Clone, PartialEq, Eq)]
pub struct AdminCredential {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for AdminCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminCredential")
            .field("username", &self.username)
            .field("password", &"****")
            .finish()
    }
}
