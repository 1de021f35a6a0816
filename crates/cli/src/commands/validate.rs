//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::{Category, DispatcherSettings};
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;
use crate::commands::info::worst_case_shutdown_ms;

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
    summary: Option<SettingsSummary>,
}

#[derive(Serialize)]
struct SettingsSummary {
    version: String,
    total_threads: usize,
    shutdown_timeout_ms: u64,
    worst_case_shutdown_ms: u64,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating settings");

    let result = validate_settings(args);

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
        anyhow::bail!("Settings validation failed")
    }
}

fn validate_settings(args: &ValidateArgs) -> ValidationResult {
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
        Ok(settings) => {
            let warnings = collect_warnings(&settings);
            let total_threads = Category::ALL
                .into_iter()
                .map(|c| settings.threads.get(c))
                .sum();

            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                summary: Some(SettingsSummary {
                    version: format!("{:?}", settings.version),
                    total_threads,
                    shutdown_timeout_ms: settings.shutdown.timeout_ms,
                    worst_case_shutdown_ms: worst_case_shutdown_ms(&settings),
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

/// Collect non-fatal issues
fn collect_warnings(settings: &DispatcherSettings) -> Vec<String> {
    let mut warnings = Vec::new();

    for category in Category::ALL {
        let threads = settings.threads.get(category);
        if category.is_order_sensitive() && threads > 1 {
            warnings.push(format!(
                "{category} pool has {threads} threads - {category} work may run out of order"
            ));
        }
    }

    if settings.threads.method_call == 1 {
        warnings.push(
            "method-call pool has 1 thread - a handler waiting on a nested method call will deadlock"
                .to_string(),
        );
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Settings are valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Threads: {}", summary.total_threads);
            println!("  Shutdown timeout: {} ms", summary.shutdown_timeout_ms);
            println!("  Worst-case shutdown: {} ms", summary.worst_case_shutdown_ms);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Settings are invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}
