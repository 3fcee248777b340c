pub mod virtual_machine;
pub mod virtual_machine_event;

pub use virtual_machine::VmSize;

#[allow(unused_imports)]
pub mod prelude {
    pub use super::virtual_machine::{self, Entity as VirtualMachine};
    pub use super::virtual_machine_event::{self, Entity as VirtualMachineEvent};
}
