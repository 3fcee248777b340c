use std::fmt;
use std::time::Duration;

use super::{optional, parse, required, ConfigError, Lookup};

/// Service principal and endpoints used to talk to Azure Resource Manager
#[derive(Clone)]
pub struct AzureConfig {
    pub client_id: String,
    pub client_secret: String,
    pub tenant_id: String,
    pub subscription_id: String,
    /// Identity endpoint, e.g. `https://login.microsoftonline.com`
    pub authority_host: String,
    /// Resource Manager endpoint, e.g. `https://management.azure.com`
    pub resource_manager_url: String,
    /// Delay between polls of a long-running operation
    pub poll_interval: Duration,
}

impl AzureConfig {
    pub(crate) fn from_lookup(lookup: Lookup<'_>) -> Result<Self, ConfigError> {
        let poll_secs: u64 = parse(
            "VM_MANAGE_POLL_INTERVAL_SECS",
            optional(lookup, "VM_MANAGE_POLL_INTERVAL_SECS", "5"),
        )?;
        if poll_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "VM_MANAGE_POLL_INTERVAL_SECS",
                value: poll_secs.to_string(),
            });
        }

        Ok(Self {
            client_id: required(lookup, "AZURE_CLIENT_ID")?,
            client_secret: required(lookup, "AZURE_CLIENT_SECRET")?,
            tenant_id: required(lookup, "AZURE_TENANT_ID")?,
            subscription_id: required(lookup, "AZURE_SUBSCRIPTION_ID")?,
            authority_host: optional(
                lookup,
                "AZURE_AUTHORITY_HOST",
                "https://login.microsoftonline.com",
            )
            .trim_end_matches('/')
            .to_string(),
            resource_manager_url: optional(
                lookup,
                "AZURE_RESOURCE_MANAGER_URL",
                "https://management.azure.com",
            )
            .trim_end_matches('/')
            .to_string(),
            poll_interval: Duration::from_secs(poll_secs),
        })
    }
}

impl fmt::Debug for AzureConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AzureConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"****")
            .field("tenant_id", &self.tenant_id)
            .field("subscription_id", &self.subscription_id)
            .field("authority_host", &self.authority_host)
            .field("resource_manager_url", &self.resource_manager_url)
            .field("poll_interval", &self.poll_interval)
            .finish()
    }
}
