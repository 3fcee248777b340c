//! Azure Resource Manager adapter
//!
//! Talks to the ARM REST API directly: a client-credentials token from the
//! identity endpoint, then one PUT per resource. Long-running operations are
//! awaited by polling `Azure-AsyncOperation` (or the resource's
//! `provisioningState`) until it reaches a terminal state. Each PUT is sent
//! exactly once.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::Response;
use serde::Deserialize;
use serde_json::json;

use super::{
    CloudProvider, CloudSession, ExtensionSpec, NetworkInterfaceSpec, ProviderError, PublicIpSpec,
    ResourceGroupSpec, ResourceId, SubnetSpec, VirtualMachineSpec, VirtualNetworkSpec,
};
use crate::config::azure::AzureConfig;

const RESOURCES_API_VERSION: &str = "2021-04-01";
const NETWORK_API_VERSION: &str = "2023-09-01";
const COMPUTE_API_VERSION: &str = "2023-09-01";
const ASYNC_OPERATION_HEADER: &str = "azure-asyncoperation";

/// Azure provider built from the service principal in [`AzureConfig`]
pub struct AzureProvider {
    http: reqwest::Client,
    config: AzureConfig,
}

impl AzureProvider {
    pub fn new(config: AzureConfig) -> Result<Self, ProviderError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()?;

        Ok(Self { http, config })
    }

    /// OAuth2 client-credentials grant against the tenant's token endpoint
    async fn acquire_token(&self) -> Result<String, ProviderError> {
        #[derive(Deserialize)]
        struct TokenResponse {
            access_token: String,
        }

        #[derive(Deserialize)]
        struct TokenError {
            error: String,
            #[serde(default)]
            error_description: Option<String>,
        }

        let url = format!(
            "{}/{}/oauth2/v2.0/token",
            self.config.authority_host, self.config.tenant_id
        );
        let scope = format!("{}/.default", self.config.resource_manager_url);

        let resp = self
            .http
            .post(&url)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("scope", scope.as_str()),
            ])
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<TokenError>(&text)
                .map(|e| e.error_description.unwrap_or(e.error))
                .unwrap_or_else(|_| format!("HTTP {}", status));
            return Err(ProviderError::Authentication(detail));
        }

        let token: TokenResponse = resp
            .json()
            .await
            .map_err(|e| ProviderError::Authentication(format!("invalid token response: {}", e)))?;

        Ok(token.access_token)
    }
}

#[async_trait]
impl CloudProvider for AzureProvider {
    fn name(&self) -> &'static str {
        "azure"
    }

    async fn open_session(&self) -> Result<Box<dyn CloudSession>, ProviderError> {
        let token = self.acquire_token().await?;

        Ok(Box::new(ArmSession {
            http: self.http.clone(),
            subscription_url: format!(
                "{}/subscriptions/{}",
                self.config.resource_manager_url, self.config.subscription_id
            ),
            token,
            poll_interval: self.config.poll_interval,
        }))
    }
}

// ============================================================================
// ARM response envelopes
// ============================================================================

#[derive(Deserialize)]
struct ArmErrorEnvelope {
    error: ArmErrorDetail,
}

#[derive(Deserialize)]
struct ArmErrorDetail {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

#[derive(Deserialize)]
struct ArmResource {
    id: String,
    #[serde(default)]
    properties: Option<ArmProperties>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ArmProperties {
    #[serde(default)]
    provisioning_state: Option<String>,
}

#[derive(Deserialize)]
struct ArmOperationStatus {
    status: String,
    #[serde(default)]
    error: Option<ArmErrorDetail>,
}

/// Outcome of a provider-side state string
enum OperationState {
    Succeeded,
    Failed,
    Running,
}

fn classify(state: &str) -> OperationState {
    if state.eq_ignore_ascii_case("Succeeded") {
        OperationState::Succeeded
    } else if state.eq_ignore_ascii_case("Failed") || state.eq_ignore_ascii_case("Canceled") {
        OperationState::Failed
    } else {
        OperationState::Running
    }
}

// ============================================================================
// Session
// ============================================================================

/// Authenticated session scoped to one subscription
struct ArmSession {
    http: reqwest::Client,
    subscription_url: String,
    token: String,
    poll_interval: Duration,
}

impl ArmSession {
    fn resource_url(&self, path: &str) -> String {
        format!("{}{}", self.subscription_url, path)
    }

    /// PUT a resource definition and, when `wait` is set, block until the
    /// provider reports the operation as finished
    async fn put_resource(
        &self,
        path: &str,
        api_version: &str,
        body: serde_json::Value,
        wait: bool,
    ) -> Result<ResourceId, ProviderError> {
        let url = self.resource_url(path);
        tracing::debug!("PUT {}", url);

        let resp = self
            .http
            .put(&url)
            .query(&[("api-version", api_version)])
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await?;

        let resp = check_status(resp).await?;
        let async_url = header_str(resp.headers(), ASYNC_OPERATION_HEADER);
        let retry_after = retry_after(resp.headers());

        let resource: ArmResource = resp
            .json()
            .await
            .map_err(|e| ProviderError::MalformedResponse(format!("{}: {}", path, e)))?;

        if !wait {
            return Ok(resource.id);
        }

        if let Some(operation_url) = async_url {
            self.wait_for_operation(&operation_url, retry_after).await?;
        } else {
            let state = resource
                .properties
                .and_then(|p| p.provisioning_state)
                .unwrap_or_else(|| "Succeeded".to_string());
            match classify(&state) {
                OperationState::Succeeded => {}
                OperationState::Failed => {
                    return Err(ProviderError::OperationFailed {
                        state,
                        detail: format!("{} was not provisioned", path),
                    })
                }
                OperationState::Running => {
                    self.wait_for_resource(&url, api_version, retry_after).await?
                }
            }
        }

        Ok(resource.id)
    }

    /// Poll an `Azure-AsyncOperation` URL until it leaves the running state
    async fn wait_for_operation(
        &self,
        operation_url: &str,
        mut delay: Option<Duration>,
    ) -> Result<(), ProviderError> {
        loop {
            tokio::time::sleep(delay.unwrap_or(self.poll_interval)).await;

            let resp = self
                .http
                .get(operation_url)
                .bearer_auth(&self.token)
                .send()
                .await?;
            let resp = check_status(resp).await?;
            delay = retry_after(resp.headers());

            let operation: ArmOperationStatus = resp
                .json()
                .await
                .map_err(|e| ProviderError::MalformedResponse(format!("operation status: {}", e)))?;

            match classify(&operation.status) {
                OperationState::Succeeded => return Ok(()),
                OperationState::Failed => {
                    let detail = operation
                        .error
                        .map(|e| format!("{}: {}", e.code, e.message))
                        .unwrap_or_else(|| "no error detail".to_string());
                    return Err(ProviderError::OperationFailed {
                        state: operation.status,
                        detail,
                    });
                }
                OperationState::Running => {
                    tracing::debug!("Operation still {}", operation.status);
                }
            }
        }
    }

    /// Poll a resource's `provisioningState` until it leaves the running state
    async fn wait_for_resource(
        &self,
        url: &str,
        api_version: &str,
        mut delay: Option<Duration>,
    ) -> Result<(), ProviderError> {
        loop {
            tokio::time::sleep(delay.unwrap_or(self.poll_interval)).await;

            let resp = self
                .http
                .get(url)
                .query(&[("api-version", api_version)])
                .bearer_auth(&self.token)
                .send()
                .await?;
            let resp = check_status(resp).await?;
            delay = retry_after(resp.headers());

            let resource: ArmResource = resp
                .json()
                .await
                .map_err(|e| ProviderError::MalformedResponse(format!("{}: {}", url, e)))?;
            let state = resource
                .properties
                .and_then(|p| p.provisioning_state)
                .unwrap_or_default();

            match classify(&state) {
                OperationState::Succeeded => return Ok(()),
                OperationState::Failed => {
                    return Err(ProviderError::OperationFailed {
                        detail: format!("{} was not provisioned", resource.id),
                        state,
                    })
                }
                OperationState::Running => {
                    tracing::debug!("{} still {}", resource.id, state);
                }
            }
        }
    }
}

/// Map a non-2xx ARM response into [`ProviderError::Rejected`]
async fn check_status(resp: Response) -> Result<Response, ProviderError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let text = resp.text().await.unwrap_or_default();
    let (code, message) = match serde_json::from_str::<ArmErrorEnvelope>(&text) {
        Ok(envelope) => (envelope.error.code, envelope.error.message),
        Err(_) => (status.to_string(), text),
    };

    Err(ProviderError::Rejected {
        status: status.as_u16(),
        code,
        message,
    })
}

fn header_str(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

fn network_path(resource_group: &str, resource: &str) -> String {
    format!(
        "/resourceGroups/{}/providers/Microsoft.Network/{}",
        resource_group, resource
    )
}

fn compute_path(resource_group: &str, resource: &str) -> String {
    format!(
        "/resourceGroups/{}/providers/Microsoft.Compute/{}",
        resource_group, resource
    )
}

#[async_trait]
impl CloudSession for ArmSession {
    async fn ensure_resource_group(
        &self,
        spec: &ResourceGroupSpec,
    ) -> Result<ResourceId, ProviderError> {
        self.put_resource(
            &format!("/resourceGroups/{}", spec.name),
            RESOURCES_API_VERSION,
            json!({ "location": spec.location }),
            false,
        )
        .await
    }

    async fn create_virtual_network(
        &self,
        spec: &VirtualNetworkSpec,
    ) -> Result<ResourceId, ProviderError> {
        self.put_resource(
            &network_path(
                &spec.resource_group,
                &format!("virtualNetworks/{}", spec.name),
            ),
            NETWORK_API_VERSION,
            json!({
                "location": spec.location,
                "properties": {
                    "addressSpace": { "addressPrefixes": spec.address_prefixes }
                }
            }),
            true,
        )
        .await
    }

    async fn create_subnet(&self, spec: &SubnetSpec) -> Result<ResourceId, ProviderError> {
        self.put_resource(
            &network_path(
                &spec.resource_group,
                &format!("virtualNetworks/{}/subnets/{}", spec.virtual_network, spec.name),
            ),
            NETWORK_API_VERSION,
            json!({
                "properties": { "addressPrefix": spec.address_prefix }
            }),
            true,
        )
        .await
    }

    async fn create_public_ip(&self, spec: &PublicIpSpec) -> Result<ResourceId, ProviderError> {
        self.put_resource(
            &network_path(
                &spec.resource_group,
                &format!("publicIPAddresses/{}", spec.name),
            ),
            NETWORK_API_VERSION,
            json!({
                "location": spec.location,
                "sku": { "name": spec.sku },
                "properties": { "publicIPAllocationMethod": spec.allocation_method }
            }),
            true,
        )
        .await
    }

    async fn create_network_interface(
        &self,
        spec: &NetworkInterfaceSpec,
    ) -> Result<ResourceId, ProviderError> {
        self.put_resource(
            &network_path(
                &spec.resource_group,
                &format!("networkInterfaces/{}", spec.name),
            ),
            NETWORK_API_VERSION,
            json!({
                "location": spec.location,
                "properties": {
                    "ipConfigurations": [{
                        "name": spec.ip_configuration_name,
                        "properties": {
                            "subnet": { "id": spec.subnet_id },
                            "publicIPAddress": { "id": spec.public_ip_id }
                        }
                    }]
                }
            }),
            true,
        )
        .await
    }

    async fn create_virtual_machine(
        &self,
        spec: &VirtualMachineSpec,
    ) -> Result<ResourceId, ProviderError> {
        self.put_resource(
            &compute_path(
                &spec.resource_group,
                &format!("virtualMachines/{}", spec.name),
            ),
            COMPUTE_API_VERSION,
            json!({
                "location": spec.location,
                "properties": {
                    "hardwareProfile": { "vmSize": spec.vm_size },
                    "storageProfile": {
                        "imageReference": {
                            "publisher": spec.image.publisher,
                            "offer": spec.image.offer,
                            "sku": spec.image.sku,
                            "version": spec.image.version
                        }
                    },
                    "osProfile": {
                        "computerName": spec.computer_name,
                        "adminUsername": spec.admin.username,
                        "adminPassword": spec.admin.password
                    },
                    "networkProfile": {
                        "networkInterfaces": [{ "id": spec.network_interface_id }]
                    }
                }
            }),
            true,
        )
        .await
    }

    async fn submit_extension(&self, spec: &ExtensionSpec) -> Result<ResourceId, ProviderError> {
        self.put_resource(
            &compute_path(
                &spec.resource_group,
                &format!("virtualMachines/{}/extensions/{}", spec.vm_name, spec.name),
            ),
            COMPUTE_API_VERSION,
            json!({
                "location": spec.location,
                "properties": {
                    "publisher": spec.publisher,
                    "type": spec.extension_type,
                    "typeHandlerVersion": spec.type_handler_version,
                    "settings": {
                        "skipDos2Unix": true,
                        "commandToExecute": spec.command
                    }
                }
            }),
            false,
        )
        .await
    }
}
