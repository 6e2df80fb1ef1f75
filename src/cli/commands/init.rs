//! Init command handler

use crate::config::Config;

pub fn cmd_init() -> anyhow::Result<()> {
    if Config::create_default_if_missing()? {
        println!(
            "Created {} with a random secret key.",
            Config::default_config_path().display()
        );
        println!("Edit it, then start the server with: vmapi serve");
    } else {
        println!(
            "Config file already exists: {}",
            Config::default_config_path().display()
        );
    }

    Ok(())
}
