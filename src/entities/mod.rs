pub mod prelude;

pub mod users;
pub mod virtual_machines;
