use std::fmt;

use super::{optional, required, ConfigError, Lookup};
use crate::services::cloud::ImageReference;
use crate::services::provisioning::SkuTable;

/// Settings that shape every VM the workflow creates
#[derive(Clone)]
pub struct ProvisioningConfig {
    /// Shared secret appended to the VM name to form the admin password
    pub password_seed: String,
    pub location: String,
    pub image: ImageReference,
    /// Base URL the on-VM boot agent reports back to
    pub public_url: String,
    pub skus: SkuTable,
}

impl ProvisioningConfig {
    pub(crate) fn from_lookup(lookup: Lookup<'_>) -> Result<Self, ConfigError> {
        let urn = optional(
            lookup,
            "VM_MANAGE_IMAGE",
            "Canonical:UbuntuServer:18.04-LTS:latest",
        );
        let image = ImageReference::from_urn(&urn).ok_or(ConfigError::Invalid {
            key: "VM_MANAGE_IMAGE",
            value: urn.clone(),
        })?;

        let defaults = SkuTable::azure();

        Ok(Self {
            password_seed: required(lookup, "PASSWORD_SEED")?,
            location: optional(lookup, "VM_MANAGE_LOCATION", "eastus"),
            image,
            public_url: optional(
                lookup,
                "VM_MANAGE_PUBLIC_URL",
                "https://vm-manage-app.azurewebsites.net",
            )
            .trim_end_matches('/')
            .to_string(),
            skus: SkuTable::new(
                optional(lookup, "VM_MANAGE_SKU_SMALL", &defaults.small),
                optional(lookup, "VM_MANAGE_SKU_MEDIUM", &defaults.medium),
                optional(lookup, "VM_MANAGE_SKU_LARGE", &defaults.large),
            ),
        })
    }
}

impl fmt::Debug for ProvisioningConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProvisioningConfig")
            .field("password_seed", &"****")
            .field("location", &self.location)
            .field("image", &self.image)
            .field("public_url", &self.public_url)
            .field("skus", &self.skus)
            .finish()
    }
}
