pub mod password;
pub mod policy;
pub mod token;

pub use policy::{Action, Caller};
pub use token::{TokenIssuer, TokenSubject};

pub mod auth_service;
pub mod auth_service_impl;
pub use auth_service::{AuthError, AuthService, LoginResult};
pub use auth_service_impl::SeaOrmAuthService;

pub mod vm_service;
pub mod vm_service_impl;
pub use vm_service::{RecordError, VirtualMachineService};
pub use vm_service_impl::SeaOrmVirtualMachineService;
