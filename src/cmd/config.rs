//! Configuration view and validation commands: `cvtailor config`.

use anyhow::Result;

use cvtailor::config::{Config, ConfigFile};

use super::super::ConfigCommands;

pub fn cmd_config(config: &Config, command: Option<ConfigCommands>) -> Result<()> {
    let config_path = config.config_path();

    match command {
        None | Some(ConfigCommands::Show) => {
            println!();
            println!("cvtailor configuration");
            println!("======================");
            println!();

            if config_path.exists() {
                println!("Config file: {}", config_path.display());
            } else {
                println!(
                    "No config file at {} (using defaults)",
                    config_path.display()
                );
            }
            println!();
            println!("  api_url = \"{}\"", config.file.api_url);
            println!("  timeout_secs = {}", config.file.timeout_secs);
            println!("  user_id = \"{}\"", config.file.user_id);
            println!();
            println!("Effective values (with env/CLI overrides):");
            println!("  api_url = \"{}\"", config.api_url());
            println!("  timeout = {}s", config.timeout().as_secs());
            println!("  user_id = \"{}\"", config.user_id());
            println!();
            println!("  credentials: {}", config.credentials_path().display());
            println!(
                "  pipeline snapshot: {}",
                config.pipeline_cache_path().display()
            );
            println!();
        }
        Some(ConfigCommands::Validate) => {
            println!();
            let warnings = config.validate();
            if warnings.is_empty() {
                println!("Configuration is valid.");
            } else {
                println!("Configuration warnings:");
                for warning in warnings {
                    println!("  - {}", warning);
                }
            }
            println!();
        }
        Some(ConfigCommands::Init) => {
            if config_path.exists() {
                println!("config.toml already exists at {}", config_path.display());
                println!("Delete it first if you want to recreate it.");
                return Ok(());
            }

            ConfigFile::default().save(&config_path)?;

            println!("Created {}", config_path.display());
            println!();
            println!("You can now customize:");
            println!("  - api_url (backend address)");
            println!("  - timeout_secs (request timeout)");
            println!("  - user_id (identity for profile comparison)");
            println!();
        }
    }

    Ok(())
}
