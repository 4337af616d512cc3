//! `gatepass config` command - Configuration management
//!
//! Values live in a single user-level YAML file. Environment variables and
//! command-line flags override it at run time but are never written back.

use clap::Subcommand;
use console::style;
use miette::{IntoDiagnostic, Result};
use std::fs;
use std::path::PathBuf;

use crate::cli::helpers::load_config;
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::config::{ConfigLayer, CONFIG_KEYS};
use crate::core::Config;

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show current configuration values
    Show(ShowArgs),

    /// Set a configuration value
    Set(SetArgs),

    /// Unset (remove) a configuration value
    Unset(UnsetArgs),

    /// Show the path to the configuration file
    Path,

    /// List all available configuration keys
    Keys,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Show only this key's value
    pub key: Option<String>,

    /// Show only what the config file contains
    #[arg(long = "file-only")]
    pub file_only: bool,
}

#[derive(clap::Args, Debug)]
pub struct SetArgs {
    /// Configuration key (e.g., api_url, prepared_by)
    pub key: String,

    /// Value to set
    pub value: String,
}

#[derive(clap::Args, Debug)]
pub struct UnsetArgs {
    /// Configuration key to remove
    pub key: String,
}

/// Run a config subcommand
pub fn run(cmd: ConfigCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        ConfigCommands::Show(args) => run_show(args, global),
        ConfigCommands::Set(args) => run_set(args),
        ConfigCommands::Unset(args) => run_unset(args),
        ConfigCommands::Path => run_path(),
        ConfigCommands::Keys => run_keys(),
    }
}

fn run_show(args: ShowArgs, global: &GlobalOpts) -> Result<()> {
    let config = load_config(global);

    if let Some(key) = &args.key {
        check_key(key)?;
        return match config.get(key) {
            Some(v) => {
                println!("{}", v);
                Ok(())
            }
            None => Err(miette::miette!("Key '{}' is not set", key)),
        };
    }

    if args.file_only {
        let path = config_path()?;
        println!(
            "{} {}",
            style("Config file:").bold(),
            style(path.display()).dim()
        );
        println!();
        if path.exists() {
            let content = fs::read_to_string(&path).into_diagnostic()?;
            print!("{}", content);
        } else {
            println!("{}", style("(not created)").dim());
        }
        return Ok(());
    }

    match global.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&config).into_diagnostic()?);
        }
        OutputFormat::Yaml => {
            print!("{}", serde_yml::to_string(&config).into_diagnostic()?);
        }
        _ => {
            println!("{}", style("Effective Configuration").bold().underlined());
            println!();
            for (key, _) in CONFIG_KEYS {
                print_config_value(key, config.get(key).as_deref());
            }
            println!();
            println!("{}", style("Config Sources (in priority order):").dim());
            println!("  1. Command-line flags (--api-url, --timeout)");
            println!("  2. Environment variables (GATEPASS_API_URL, GATEPASS_TIMEOUT_SECS, GATEPASS_PREPARED_BY)");
            println!("  3. Config file (~/.config/gatepass/config.yaml)");
        }
    }

    Ok(())
}

fn run_set(args: SetArgs) -> Result<()> {
    let path = config_path()?;
    let mut layer = read_layer(&path)?;
    layer
        .set(&args.key, &args.value)
        .map_err(|e| miette::miette!("{}\nRun 'gatepass config keys' to list valid keys", e))?;
    write_layer(&path, &layer)?;

    println!(
        "{} Set {} {} {}",
        style("✓").green(),
        style(&args.key).cyan(),
        style("→").dim(),
        style(&args.value).yellow()
    );
    Ok(())
}

fn run_unset(args: UnsetArgs) -> Result<()> {
    let path = config_path()?;
    if !path.exists() {
        return Err(miette::miette!(
            "Config file does not exist: {}",
            path.display()
        ));
    }

    let mut layer = read_layer(&path)?;
    let removed = layer.unset(&args.key).map_err(|e| miette::miette!("{}", e))?;
    if !removed {
        return Err(miette::miette!("Key '{}' not found in config", args.key));
    }
    write_layer(&path, &layer)?;

    println!(
        "{} Removed {} from config",
        style("✓").green(),
        style(&args.key).cyan()
    );
    Ok(())
}

fn run_path() -> Result<()> {
    let path = config_path()?;
    println!("{}", path.display());
    Ok(())
}

fn run_keys() -> Result<()> {
    println!("{}", style("Available configuration keys:").bold());
    println!();

    for (key, description) in CONFIG_KEYS {
        println!("  {:<14} {}", style(key).cyan(), style(description).dim());
    }

    println!();
    println!(
        "{}",
        style("Use 'gatepass config set <key> <value>' to set a value.").dim()
    );
    Ok(())
}

fn config_path() -> Result<PathBuf> {
    Config::global_config_path()
        .ok_or_else(|| miette::miette!("Could not determine config directory"))
}

/// Read the file for rewriting; a file that does not parse is left untouched
fn read_layer(path: &std::path::Path) -> Result<ConfigLayer> {
    ConfigLayer::try_read(path)
        .map_err(|e| miette::miette!("{}\nFix or remove the file before changing settings", e))
}

fn check_key(key: &str) -> Result<()> {
    if CONFIG_KEYS.iter().any(|(k, _)| *k == key) {
        Ok(())
    } else {
        Err(miette::miette!("Unknown configuration key: {}", key))
    }
}

fn write_layer(path: &std::path::Path, layer: &ConfigLayer) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).into_diagnostic()?;
    }
    let yaml = serde_yml::to_string(layer).into_diagnostic()?;
    fs::write(path, yaml).into_diagnostic()?;
    Ok(())
}

fn print_config_value(key: &str, value: Option<&str>) {
    if let Some(v) = value {
        println!("  {}: {}", style(key).cyan(), style(v).yellow());
    } else {
        println!("  {}: {}", style(key).cyan(), style("(not set)").dim());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_key() {
        assert!(check_key("api_url").is_ok());
        assert!(check_key("prepared_by").is_ok());
        assert!(check_key("author").is_err());
    }

    #[test]
    fn test_read_layer_refuses_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "timeout_secs: abc\n").unwrap();
        assert!(read_layer(&path).is_err());
    }

    #[test]
    fn test_write_layer_round_trips_through_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/config.yaml");

        let mut layer = ConfigLayer::default();
        layer.set("station", "Hyderabad GIS").unwrap();
        layer.set("timeout_secs", "5").unwrap();
        write_layer(&path, &layer).unwrap();

        let read = ConfigLayer::read(&path);
        assert_eq!(read.station.as_deref(), Some("Hyderabad GIS"));
        assert_eq!(read.timeout_secs, Some(5));
        assert!(read.api_url.is_none());
    }
}
