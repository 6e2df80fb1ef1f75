pub mod user;
pub mod virtual_machine;
