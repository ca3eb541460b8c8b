//! Configuration management command
//!
//! Provides CLI interface to view and edit the per-user configuration file.

use anyhow::{Context, Result};
use helper_core::config::{self, Config};
use owo_colors::OwoColorize;
use std::path::Path;

/// Keys accepted by `get` and `set`, in display order
pub const KEYS: &[&str] = &[
    "model",
    "api_endpoint",
    "temperature",
    "max_tokens",
    "marker",
    "extensions",
    "debounce_ms",
    "timeout_secs",
    "max_concurrency",
    "skip_annotated",
    "respect_gitignore",
];

/// List all configuration values
pub fn run_list(config_path: &Path) -> Result<()> {
    let config = config::load_from(config_path)?;

    println!("{}", "ai-helper Configuration".bold());
    println!("{}: {}", "Location".dimmed(), config_path.display().dimmed());
    if !config_path.exists() {
        println!("{}", "(file does not exist, showing defaults)".dimmed());
    }
    println!();

    println!("{}", "[generation]".yellow());
    println!("  {} = {}", "model".cyan(), config.model);
    println!("  {} = {}", "api_endpoint".cyan(), config.endpoint);
    println!("  {} = {}", "temperature".cyan(), config.temperature);
    println!("  {} = {}", "max_tokens".cyan(), config.max_tokens);
    println!(
        "  {} = {} {}",
        "timeout_secs".cyan(),
        config.timeout_secs,
        format!("({}s per request)", config.timeout_secs).dimmed()
    );

    println!("\n{}", "[watch]".yellow());
    println!("  {} = {}", "marker".cyan(), config.marker);
    println!("  {} = {}", "extensions".cyan(), config.extensions.join(", "));
    println!(
        "  {} = {} {}",
        "debounce_ms".cyan(),
        config.debounce_ms,
        format!("({:.1}s)", config.debounce_ms as f64 / 1000.0).dimmed()
    );
    println!("  {} = {}", "max_concurrency".cyan(), config.max_concurrency);
    println!("  {} = {}", "skip_annotated".cyan(), config.skip_annotated);
    println!("  {} = {}", "respect_gitignore".cyan(), config.respect_gitignore);

    println!("\n{}", "Valid Ranges:".bold());
    println!("  temperature: 0-2");
    println!("  max_tokens, debounce_ms, timeout_secs, max_concurrency: at least 1");
    println!("  api_endpoint: http:// or https:// URL");

    Ok(())
}

/// Get a single configuration value
pub fn run_get(config_path: &Path, key: &str) -> Result<()> {
    let config = config::load_from(config_path)?;
    println!("{}", get_value(&config, key)?);
    Ok(())
}

/// Set a configuration value
pub fn run_set(config_path: &Path, key: &str, value: &str) -> Result<()> {
    let mut config = config::load_from(config_path)?;
    set_value(&mut config, key, value)?;

    // Validate before saving
    config.validate().context("Invalid configuration value")?;
    config::save_to(&config, config_path)?;

    println!("{} {} = {}", "✓".green(), key.cyan(), get_value(&config, key)?);
    println!(
        "{}",
        "Note: Restart a running watcher for changes to take effect".yellow()
    );

    Ok(())
}

/// Show the config file path and optionally create it
pub fn run_path(config_path: &Path, create: bool) -> Result<()> {
    if create && config::init_if_missing(config_path)? {
        println!("{} Created config file at: {}", "✓".green(), config_path.display());
    } else if config_path.exists() {
        println!("{}", config_path.display());
    } else {
        println!("{}", config_path.display());
        println!("{}", "File does not exist. Use --create to create it.".yellow());
    }

    Ok(())
}

/// Show example configuration
pub fn run_example() -> Result<()> {
    println!("{}", config::example_config());
    Ok(())
}

pub fn get_value(config: &Config, key: &str) -> Result<String> {
    let value = match key {
        "model" => config.model.clone(),
        "api_endpoint" => config.endpoint.clone(),
        "temperature" => config.temperature.to_string(),
        "max_tokens" => config.max_tokens.to_string(),
        "marker" => config.marker.clone(),
        "extensions" => config.extensions.join(","),
        "debounce_ms" => config.debounce_ms.to_string(),
        "timeout_secs" => config.timeout_secs.to_string(),
        "max_concurrency" => config.max_concurrency.to_string(),
        "skip_annotated" => config.skip_annotated.to_string(),
        "respect_gitignore" => config.respect_gitignore.to_string(),
        _ => anyhow::bail!(
            "Unknown config key: {}. Use 'ai-helper config list' to see available keys.",
            key
        ),
    };
    Ok(value)
}

pub fn set_value(config: &mut Config, key: &str, value: &str) -> Result<()> {
    match key {
        "model" => config.model = value.to_string(),
        "api_endpoint" => config.endpoint = value.to_string(),
        "temperature" => {
            config.temperature = value
                .parse()
                .context("Invalid value: must be a number")?;
        }
        "max_tokens" => {
            config.max_tokens = value
                .parse()
                .context("Invalid value: must be a positive integer")?;
        }
        "marker" => config.marker = value.to_string(),
        "extensions" => {
            config.extensions = value
                .split(',')
                .map(|ext| ext.trim().trim_start_matches('.').to_string())
                .filter(|ext| !ext.is_empty())
                .collect();
        }
        "debounce_ms" => {
            config.debounce_ms = value
                .parse()
                .context("Invalid value: must be a positive integer")?;
        }
        "timeout_secs" => {
            config.timeout_secs = value
                .parse()
                .context("Invalid value: must be a positive integer")?;
        }
        "max_concurrency" => {
            config.max_concurrency = value
                .parse()
                .context("Invalid value: must be a positive integer")?;
        }
        "skip_annotated" => {
            config.skip_annotated = value
                .parse()
                .context("Invalid value: must be 'true' or 'false'")?;
        }
        "respect_gitignore" => {
            config.respect_gitignore = value
                .parse()
                .context("Invalid value: must be 'true' or 'false'")?;
        }
        _ => anyhow::bail!(
            "Unknown config key: {}. Use 'ai-helper config list' to see available keys.",
            key
        ),
    }
    Ok(())
}
