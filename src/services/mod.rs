pub mod cloud;
pub mod inventory;
pub mod provisioning;

pub use cloud::{AzureProvider, CloudProvider, MockCloud};
pub use provisioning::{Provisioner, ProvisioningError, ProvisioningStep};
