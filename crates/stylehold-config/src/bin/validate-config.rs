//! Config validation CLI tool
//!
//! Validates a stylehold configuration file and reports any errors.

use std::path::PathBuf;
use std::process::ExitCode;
use stylehold_config::{ConfigError, CURRENT_CONFIG_VERSION};
use stylehold_util::default_config_path;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();

    let config_path = match args.get(1) {
        Some(path) => PathBuf::from(path),
        None => {
            let default_path = default_config_path();
            eprintln!("Usage: validate-config [config-file]");
            eprintln!();
            eprintln!("Validates a stylehold configuration file.");
            eprintln!();
            eprintln!("Example:");
            eprintln!("  validate-config {}", default_path.display());
            return ExitCode::from(2);
        }
    };

    if !config_path.exists() {
        eprintln!("Error: Configuration file not found: {}", config_path.display());
        return ExitCode::from(1);
    }

    match stylehold_config::load_config(&config_path) {
        Ok(policy) => {
            println!("✓ Configuration is valid");
            println!();
            println!("Summary:");
            println!("  Config version: {}", CURRENT_CONFIG_VERSION);
            println!("  Data directory: {}", policy.service.data_dir.display());
            println!("  Sweep interval: {}s", policy.service.sweep_interval.as_secs());
            println!(
                "  Default expiry: buffer {}m, window {}m",
                policy.expiry.buffer_minutes, policy.expiry.default_window_minutes
            );

            if !policy.stylists.is_empty() {
                println!();
                println!("Stylist overrides:");
                for stylist in &policy.stylists {
                    println!(
                        "  - {}{}: buffer {}m, window {}m",
                        stylist.id,
                        stylist
                            .label
                            .as_deref()
                            .map(|l| format!(" ({})", l))
                            .unwrap_or_default(),
                        stylist.expiry.buffer_minutes,
                        stylist.expiry.default_window_minutes
                    );
                }
            }

            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("✗ Configuration validation failed");
            eprintln!();
            match &e {
                ConfigError::ReadError(io_err) => {
                    eprintln!("Failed to read file: {}", io_err);
                }
                ConfigError::ParseError(parse_err) => {
                    eprintln!("TOML parse error:");
                    eprintln!("  {}", parse_err);
                }
                ConfigError::ValidationFailed { errors } => {
                    eprintln!("Validation errors ({}):", errors.len());
                    for err in errors {
                        eprintln!("  - {}", err);
                    }
                }
                ConfigError::UnsupportedVersion(ver) => {
                    eprintln!(
                        "Unsupported config version: {} (expected {})",
                        ver, CURRENT_CONFIG_VERSION
                    );
                }
            }
            ExitCode::from(1)
        }
    }
}
