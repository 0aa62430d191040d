//! Config file inspection and editing.
//!
//! Keys are dot paths into the TOML sections (`api.org_name`,
//! `certificates.pem_path`, `sync.replay_policy`, `store.path`).

use std::path::PathBuf;

use clap::Subcommand;
use search_ads_core::Config;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Get a config value
    Get {
        /// Config key (e.g. "api.org_name", "sync.replay_policy")
        key: String,
    },
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// New value
        value: String,
    },
    /// List all config values
    List,
    /// Show where the config and the local store live
    Path,
    /// Write the current config to another file
    Export {
        /// Destination file
        file: PathBuf,
    },
    /// Replace the current config with one read from a file
    Import {
        /// Source file
        file: PathBuf,
    },
    /// Reset config to defaults
    Reset,
}

pub fn run(action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ConfigAction::Get { key } => {
            let config = Config::load()?;
            match config.get(&key) {
                Some(value) => println!("{value}"),
                None => return Err(format!("unknown key: {key}").into()),
            }
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load()?;
            config.set(&key, &value)?;
            println!("{key} = {}", config.get(&key).unwrap_or(value));
        }
        ConfigAction::List => {
            let config = Config::load()?;
            println!("{}", toml::to_string_pretty(&config)?);
        }
        ConfigAction::Path => {
            let config = Config::load()?;
            println!("config\t{}", Config::path()?.display());
            println!("store\t{}", config.store_path()?.display());
        }
        ConfigAction::Export { file } => {
            Config::load()?.save_to(&file)?;
            println!("exported config to {}", file.display());
        }
        ConfigAction::Import { file } => {
            // load_from treats a missing file as defaults
            if !file.exists() {
                return Err(format!("no config file at {}", file.display()).into());
            }
            let config = Config::load_from(&file)?;
            config.save()?;
            tracing::debug!(source = %file.display(), "imported config");
            println!("imported config from {}", file.display());
        }
        ConfigAction::Reset => {
            Config::default().save()?;
            println!("config reset to defaults");
        }
    }
    Ok(())
}
