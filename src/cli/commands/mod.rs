mod init;
mod seed;

pub use init::cmd_init;
pub use seed::{DEMO_ACCOUNTS, cmd_seed, seed_accounts};
