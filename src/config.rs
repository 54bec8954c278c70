use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Persisted user defaults, used to seed the interactive prompts when the
/// split flags are omitted.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Default total number of horcruxes (N)
    pub default_total: u8,
    /// Default threshold required to bind (K)
    pub default_threshold: u8,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_total: 5,
            default_threshold: 3,
        }
    }
}

impl Config {
    /// Get config file path
    pub fn config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("com", "hrcx", "hrcx")
            .context("Failed to determine configuration directory")?;

        Ok(proj_dirs.config_dir().join("config.json"))
    }

    /// Load configuration from file, falling back to defaults if absent
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;

        if path.exists() {
            let contents = fs::read_to_string(&path).context("Failed to read config file")?;

            let config: Config =
                serde_json::from_str(&contents).context("Failed to parse config file")?;

            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let contents = serde_json::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(&path, contents).context("Failed to write config file")?;

        Ok(())
    }

    /// Interactively update and persist the defaults
    pub fn initialize() -> Result<Self> {
        use console::style;
        use dialoguer::Input;

        println!("{}", style("hrcx configuration").bold().green());

        let defaults = Config::default();

        let default_total: u8 = Input::new()
            .with_prompt("Default total number of horcruxes")
            .default(defaults.default_total)
            .validate_with(|n: &u8| {
                if *n >= 2 {
                    Ok(())
                } else {
                    Err("total must be at least 2")
                }
            })
            .interact_text()?;

        let default_threshold: u8 = Input::new()
            .with_prompt("Default threshold needed to reconstruct")
            .default(defaults.default_threshold.min(default_total))
            .validate_with(move |k: &u8| {
                if *k < 2 {
                    Err("threshold must be at least 2".to_string())
                } else if *k > default_total {
                    Err(format!("threshold cannot exceed the total ({default_total})"))
                } else {
                    Ok(())
                }
            })
            .interact_text()?;

        let config = Config {
            default_total,
            default_threshold,
        };

        config.save()?;

        println!("{}", style("Configuration saved.").green());

        Ok(config)
    }
}
