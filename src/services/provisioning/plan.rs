//! Resource naming and request specs for a single VM.

use crate::config::provisioning::ProvisioningConfig;
use crate::models::VmSize;
use crate::services::cloud::{
    AdminCredential, ExtensionSpec, NetworkInterfaceSpec, PublicIpSpec, ResourceGroupSpec,
    ResourceId, SubnetSpec, VirtualMachineSpec, VirtualNetworkSpec,
};

const VNET_ADDRESS_SPACE: &str = "10.0.0.0/16";
const SUBNET_PREFIX: &str = "10.0.0.0/24";
const PUBLIC_IP_SKU: &str = "Basic";
const PUBLIC_IP_ALLOCATION: &str = "Dynamic";
const EXTENSION_PUBLISHER: &str = "Microsoft.Azure.Extensions";
const EXTENSION_TYPE: &str = "CustomScript";
const EXTENSION_VERSION: &str = "2.0";
const MAX_NAME_LEN: usize = 60;

/// Reject names that cannot be embedded in provider resource names
pub fn validate_vm_name(name: &str) -> Result<(), String> {
    if name.is_empty() || name.len() > MAX_NAME_LEN {
        return Err(format!(
            "Invalid VM name '{}': must be 1-{} characters",
            name, MAX_NAME_LEN
        ));
    }
    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return Err(format!(
            "Invalid VM name '{}': only letters, digits and '-' are allowed",
            name
        ));
    }
    if name.starts_with('-') || name.ends_with('-') {
        return Err(format!(
            "Invalid VM name '{}': must not start or end with '-'",
            name
        ));
    }
    Ok(())
}

/// Shell one-liner installed on the VM that ships boot journal lines back
/// to `POST {public_url}/vm/{name}/boot`
pub fn boot_log_script(public_url: &str, name: &str) -> String {
    let journal = r#"journalctl -b 0 -o json --output-fields "UNIT,MESSAGE" --no-pager"#;
    let forward = format!(
        r#"grep UNIT | grep MESSAGE | while read line; do curl -L -X POST -d "$line" "{}/vm/{}/boot"; done"#,
        public_url, name
    );

    format!(
        "{journal} | {forward} && while true; do sleep 5; {recent} | {forward}; done",
        journal = journal,
        forward = forward,
        recent = journal.replacen("-o json", "-o json --since -5s", 1),
    )
}

/// Every provider-side name derived from one VM name
#[derive(Debug, Clone)]
pub struct ResourcePlan<'a> {
    pub name: &'a str,
    pub size: VmSize,
    pub resource_group: String,
    pub virtual_network: String,
    pub subnet: String,
    pub public_ip: String,
    pub network_interface: String,
    pub ip_configuration: String,
    pub extension: String,
    config: &'a ProvisioningConfig,
}

impl<'a> ResourcePlan<'a> {
    pub fn new(name: &'a str, size: VmSize, config: &'a ProvisioningConfig) -> Self {
        Self {
            name,
            size,
            resource_group: format!("{}-rg", name),
            virtual_network: format!("{}vnet", name),
            subnet: format!("{}subnet", name),
            public_ip: format!("{}pip", name),
            network_interface: format!("{}nic", name),
            ip_configuration: format!("{}ipconfig", name),
            extension: format!("{}ext", name),
            config,
        }
    }

    /// Admin login derived from the VM name and the shared seed
    pub fn admin(&self) -> AdminCredential {
        AdminCredential {
            username: format!("{}admin", self.name),
            password: format!("{}{}", self.name, self.config.password_seed),
        }
    }

    pub fn resource_group_spec(&self) -> ResourceGroupSpec {
        ResourceGroupSpec {
            name: self.resource_group.clone(),
            location: self.config.location.clone(),
        }
    }

    pub fn virtual_network_spec(&self) -> VirtualNetworkSpec {
        VirtualNetworkSpec {
            resource_group: self.resource_group.clone(),
            name: self.virtual_network.clone(),
            location: self.config.location.clone(),
            address_prefixes: vec![VNET_ADDRESS_SPACE.to_string()],
        }
    }

    pub fn subnet_spec(&self) -> SubnetSpec {
        SubnetSpec {
            resource_group: self.resource_group.clone(),
            virtual_network: self.virtual_network.clone(),
            name: self.subnet.clone(),
            address_prefix: SUBNET_PREFIX.to_string(),
        }
    }

    pub fn public_ip_spec(&self) -> PublicIpSpec {
        PublicIpSpec {
            resource_group: self.resource_group.clone(),
            name: self.public_ip.clone(),
            location: self.config.location.clone(),
            sku: PUBLIC_IP_SKU.to_string(),
            allocation_method: PUBLIC_IP_ALLOCATION.to_string(),
        }
    }

    pub fn network_interface_spec(
        &self,
        subnet_id: ResourceId,
        public_ip_id: ResourceId,
    ) -> NetworkInterfaceSpec {
        NetworkInterfaceSpec {
            resource_group: self.resource_group.clone(),
            name: self.network_interface.clone(),
            location: self.config.location.clone(),
            ip_configuration_name: self.ip_configuration.clone(),
            subnet_id,
            public_ip_id,
        }
    }

    pub fn virtual_machine_spec(&self, network_interface_id: ResourceId) -> VirtualMachineSpec {
        VirtualMachineSpec {
            resource_group: self.resource_group.clone(),
            name: self.name.to_string(),
            location: self.config.location.clone(),
            computer_name: self.name.to_string(),
            admin: self.admin(),
            vm_size: self.config.skus.sku_for(self.size).to_string(),
            image: self.config.image.clone(),
            network_interface_id,
        }
    }

    pub fn extension_spec(&self) -> ExtensionSpec {
        ExtensionSpec {
            resource_group: self.resource_group.clone(),
            vm_name: self.name.to_string(),
            name: self.extension.clone(),
            location: self.config.location.clone(),
            publisher: EXTENSION_PUBLISHER.to_string(),
            extension_type: EXTENSION_TYPE.to_string(),
            type_handler_version: EXTENSION_VERSION.to_string(),
            command: boot_log_script(&self.config.public_url, self.name),
        }
    }
}
