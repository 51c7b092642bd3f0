//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::HandlerBlueprint;
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;
use crate::error::CliError;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    ultra_simple_path: String,
    port: String,
    baud_rate: u32,
    max_distance_limit: f64,
    query_width: usize,
    direction_count: usize,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        Err(CliError::config_validation(result.error.unwrap_or_default()).into())
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(blueprint) => {
            let warnings = collect_warnings(&blueprint);
            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                summary: Some(ConfigSummary {
                    version: format!("{:?}", blueprint.version),
                    ultra_simple_path: blueprint.handler.ultra_simple_path.display().to_string(),
                    port: blueprint.handler.port.clone(),
                    baud_rate: blueprint.handler.baud_rate,
                    max_distance_limit: blueprint.handler.max_distance_limit,
                    query_width: blueprint.query.width,
                    direction_count: blueprint.query.effective_directions().len(),
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(blueprint: &HandlerBlueprint) -> Vec<String> {
    let mut warnings = Vec::new();
    let handler = &blueprint.handler;

    // The executable is only required when running
    if !handler.ultra_simple_path.exists() {
        warnings.push(format!(
            "ultra_simple not found at {} - `run` will fail",
            handler.ultra_simple_path.display()
        ));
    }

    if handler.startup_lines == 0 {
        warnings.push(
            "startup_lines is 0 - ultra_simple banner lines will be logged as parse errors"
                .to_string(),
        );
    }

    if handler.close_timeout_ms == 0 {
        warnings.push("close_timeout_ms is 0 - ultra_simple will be killed immediately".to_string());
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  ultra_simple: {}", summary.ultra_simple_path);
            println!("  Serial: {} @ {} baud", summary.port, summary.baud_rate);
            println!("  Max distance: {}", summary.max_distance_limit);
            println!(
                "  Reports: width {} over {} directions",
                summary.query_width, summary.direction_count
            );
        }

        if let Some(ref warnings) = result.warnings {
            println!("\nWarnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn write_config(dir: &Path, content: &str) -> std::path::PathBuf {
        let path = dir.join("rplidar.toml");
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_valid_config_with_warnings() {
        let dir = tempfile::tempdir().unwrap();
        let config = write_config(
            dir.path(),
            "[handler]\nultra_simple_path = \"/nonexistent/ultra_simple\"\nmax_distance_limit = 100.0\nstartup_lines = 0\n",
        );

        let result = validate_config(&ValidateArgs {
            config,
            json: true,
        });
        assert!(result.valid);
        let warnings = result.warnings.unwrap();
        assert_eq!(warnings.len(), 2);
        assert_eq!(result.summary.unwrap().direction_count, 16);
    }

    #[test]
    fn test_invalid_config() {
        let dir = tempfile::tempdir().unwrap();
        let config = write_config(
            dir.path(),
            "[handler]\nultra_simple_path = \"/opt/ultra_simple\"\nmax_distance_limit = -1.0\n",
        );

        let args = ValidateArgs {
            config,
            json: false,
        };
        let result = validate_config(&args);
        assert!(!result.valid);
        assert!(result.error.unwrap().contains("max_distance_limit"));
        assert!(run_validate(&args).is_err());
    }

    #[test]
    fn test_missing_file() {
        let result = validate_config(&ValidateArgs {
            config: "/nonexistent/rplidar.toml".into(),
            json: false,
        });
        assert!(!result.valid);
        assert!(result.error.unwrap().contains("File not found"));
    }
}
