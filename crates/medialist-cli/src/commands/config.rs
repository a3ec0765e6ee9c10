//! Config command handlers

use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use medialist_core::Config;

use crate::output::{Output, OutputFormat};

/// Show current configuration
pub fn show(config_path: Option<&PathBuf>, output: &Output) -> Result<()> {
    let config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "data_dir": config.data_dir,
                    "backend": config.backend,
                    "delimiter": config.delimiter,
                    "pool_size": config.pool_size,
                    "log_file": config.log_file
                })
            );
        }
        OutputFormat::Quiet => {
            println!("{}", config.data_dir.display());
        }
        OutputFormat::Human => {
            let effective_path = config_path
                .cloned()
                .unwrap_or_else(Config::config_file_path);
            println!("Configuration:");
            println!("  data_dir:  {}", config.data_dir.display());
            println!("  backend:   {}", config.backend);
            println!("  delimiter: {:?}", config.delimiter);
            println!("  pool_size: {}", config.pool_size);
            println!(
                "  log_file:  {}",
                config
                    .log_file
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "(not set)".to_string())
            );
            println!();
            println!("Config file: {}", effective_path.display());
        }
    }

    Ok(())
}

/// Set a configuration value
pub fn set(
    key: String,
    value: String,
    config_path: Option<&PathBuf>,
    output: &Output,
) -> Result<()> {
    let mut config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;

    apply_setting(&mut config, &key, &value)?;
    config.validate()?;

    // Save to the CLI-specified path or default
    let save_path = config_path
        .cloned()
        .unwrap_or_else(Config::config_file_path);
    config
        .save_to_path(&save_path)
        .context("Failed to save configuration")?;

    output.success(&format!("Set {} = {}", key, value));

    Ok(())
}

fn apply_setting(config: &mut Config, key: &str, value: &str) -> Result<()> {
    match key {
        "data_dir" => {
            config.data_dir = value.into();
        }
        "backend" => {
            config.backend = value.parse()?;
        }
        "delimiter" => {
            let mut chars = value.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => config.delimiter = c,
                _ => bail!("delimiter must be a single character"),
            }
        }
        "pool_size" => {
            config.pool_size = value
                .parse()
                .context("Invalid value for pool_size. Use a positive number.")?;
        }
        "log_file" => {
            config.log_file = if value.is_empty() || value == "none" {
                None
            } else {
                Some(value.into())
            };
        }
        _ => {
            bail!(
                "Unknown configuration key: '{}'\n\
                 Valid keys: data_dir, backend, delimiter, pool_size, log_file",
                key
            );
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use medialist_core::Backend;

    #[test]
    fn test_apply_setting() {
        let mut config = Config::default();

        apply_setting(&mut config, "backend", "sqlite").unwrap();
        assert_eq!(config.backend, Backend::Sqlite);

        apply_setting(&mut config, "delimiter", ";").unwrap();
        assert_eq!(config.delimiter, ';');
        assert!(apply_setting(&mut config, "delimiter", ";;").is_err());

        apply_setting(&mut config, "log_file", "/tmp/medialist.log").unwrap();
        assert!(config.log_file.is_some());
        apply_setting(&mut config, "log_file", "none").unwrap();
        assert!(config.log_file.is_none());

        assert!(apply_setting(&mut config, "pool_size", "many").is_err());
        assert!(apply_setting(&mut config, "sync_url", "x").is_err());
    }

    #[test]
    fn test_set_writes_config_file() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        let output = Output::new(OutputFormat::Quiet);

        set("pool_size".into(), "8".into(), Some(&path), &output).unwrap();

        let saved = std::fs::read_to_string(&path).unwrap();
        assert!(saved.contains("pool_size = 8"));
    }

    #[test]
    fn test_set_rejects_invalid_delimiter() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        let output = Output::new(OutputFormat::Quiet);

        assert!(set("delimiter".into(), "5".into(), Some(&path), &output).is_err());
        assert!(!path.exists());
    }
}
