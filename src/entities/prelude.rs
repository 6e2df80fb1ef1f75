pub use super::users::Entity as Users;
pub use super::virtual_machines::Entity as VirtualMachines;
