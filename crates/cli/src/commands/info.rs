//! `info` command implementation.

use anyhow::{Context, Result};
use contracts::{Category, DispatcherSettings, ShutdownBudget};
use serde::Serialize;
use tracing::info;

use crate::cli::InfoArgs;
use crate::commands::load_settings;

/// Settings info for JSON output
#[derive(Serialize)]
struct SettingsInfo {
    version: String,
    pools: Vec<PoolInfo>,
    total_threads: usize,
    shutdown: ShutdownInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    connection: Option<ConnectionInfo>,
}

#[derive(Serialize)]
struct PoolInfo {
    category: Category,
    threads: usize,
    ordered: bool,
}

#[derive(Serialize)]
struct ShutdownInfo {
    timeout_ms: u64,
    budget: ShutdownBudget,
    worst_case_ms: u64,
}

#[derive(Serialize)]
struct ConnectionInfo {
    endianness: String,
    connect_timeout_ms: u64,
    weak_references: bool,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading settings info");

    let settings = load_settings(&args.config)
        .with_context(|| format!("Failed to load settings from {}", args.config.display()))?;

    let info = build_settings_info(&settings, args)?;
    if args.json {
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize settings info")?;
        println!("{}", json);
    } else {
        print_settings_info(&info);
    }

    Ok(())
}

/// Longest graceful shutdown the settings allow
pub fn worst_case_shutdown_ms(settings: &DispatcherSettings) -> u64 {
    match settings.shutdown.budget {
        ShutdownBudget::PerPool => settings.shutdown.timeout_ms * Category::COUNT as u64,
        ShutdownBudget::Shared => settings.shutdown.timeout_ms,
    }
}

fn build_settings_info(settings: &DispatcherSettings, args: &InfoArgs) -> Result<SettingsInfo> {
    let resolved = settings
        .connection_builder()
        .build()
        .context("Invalid settings")?;
    let config = &resolved.dispatch;

    let pools = Category::ALL
        .into_iter()
        .map(|category| {
            let threads = config.thread_count(category);
            PoolInfo {
                category,
                threads,
                ordered: threads == 1,
            }
        })
        .collect();

    let connection = args.connection.then(|| ConnectionInfo {
        endianness: format!(
            "{:?} ('{}')",
            resolved.endianness,
            resolved.endianness.marker() as char
        ),
        connect_timeout_ms: resolved.connect_timeout.as_millis() as u64,
        weak_references: resolved.weak_references,
    });

    Ok(SettingsInfo {
        version: format!("{:?}", settings.version),
        pools,
        total_threads: config.total_threads(),
        shutdown: ShutdownInfo {
            timeout_ms: settings.shutdown.timeout_ms,
            budget: settings.shutdown.budget,
            worst_case_ms: worst_case_shutdown_ms(settings),
        },
        connection,
    })
}

fn print_settings_info(info: &SettingsInfo) {
    println!("=== Dispatcher Settings ({}) ===\n", info.version);

    println!("Pools ({} threads total)", info.total_threads);
    for (i, pool) in info.pools.iter().enumerate() {
        let prefix = if i == info.pools.len() - 1 { "└─" } else { "├─" };
        let order = if pool.ordered { "ordered" } else { "unordered" };
        println!(
            "   {} {:<14} {} thread(s), {}",
            prefix,
            pool.category.label(),
            pool.threads,
            order
        );
    }

    println!("\nShutdown");
    println!("   ├─ Timeout: {} ms", info.shutdown.timeout_ms);
    println!("   ├─ Budget: {:?}", info.shutdown.budget);
    println!("   └─ Worst case: {} ms", info.shutdown.worst_case_ms);

    if let Some(ref connection) = info.connection {
        println!("\nConnection");
        println!("   ├─ Endianness: {}", connection.endianness);
        println!("   ├─ Connect timeout: {} ms", connection.connect_timeout_ms);
        println!("   └─ Weak references: {}", connection.weak_references);
    }

    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_worst_case_shutdown() {
        let mut settings = DispatcherSettings::default();
        settings.shutdown.timeout_ms = 100;
        assert_eq!(worst_case_shutdown_ms(&settings), 400);

        settings.shutdown.budget = ShutdownBudget::Shared;
        assert_eq!(worst_case_shutdown_ms(&settings), 100);
    }

    #[test]
    fn test_build_info_marks_ordering() {
        let args = InfoArgs {
            config: PathBuf::from("unused.toml"),
            json: true,
            connection: false,
        };
        let info = build_settings_info(&DispatcherSettings::default(), &args).unwrap();

        assert_eq!(info.total_threads, 7);
        assert!(info.connection.is_none());
        let method_call = &info.pools[Category::MethodCall.index()];
        assert_eq!(method_call.threads, 4);
        assert!(!method_call.ordered);
        assert!(info.pools[Category::Signal.index()].ordered);
    }

    #[test]
    fn test_build_info_with_connection() {
        let args = InfoArgs {
            config: PathBuf::from("unused.toml"),
            json: false,
            connection: true,
        };
        let mut settings = DispatcherSettings::default();
        settings.connection.endianness = contracts::Endianness::Big;

        let info = build_settings_info(&settings, &args).unwrap();
        let connection = info.connection.unwrap();
        assert_eq!(connection.endianness, "Big ('B')");
        assert_eq!(connection.connect_timeout_ms, 100_000);
    }
}
