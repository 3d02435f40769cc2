//! Command parsing and execution
//!
//! Commands:
//!   sync            Reconcile every enabled store's shortcut folder
//!   scan            List installed games without writing anything
//!   stores          Show installed/running state of each client
//!   open <store>    Start a store client
//!
//! Options:
//!   --roms <dir>    Library root (overrides the config file)
//!   --keep          Keep shortcuts of uninstalled games
//!   --no-keep       Delete shortcuts of uninstalled games
//!   --config <file> Read configuration from <file>
//!   --json          Output in JSON format
//!   -v, -vv         More logging

use std::path::PathBuf;

use anyhow::Context;
use storefront_sync_core::{
    default_stores, scan_stores, Config, LibraryAggregator, LibraryReport, Store, StoreAdapter,
};

/// CLI command to execute
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliCommand {
    Sync,
    Scan,
    Stores,
    Open(Store),
}

/// CLI options
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliOptions {
    pub json: bool,
    pub verbosity: u8,
    pub roms: Option<PathBuf>,
    pub keep: Option<bool>,
    pub config: Option<PathBuf>,
}

/// Parse CLI arguments and return command + options
pub fn parse_args(args: &[String]) -> Result<(CliCommand, CliOptions), String> {
    let mut options = CliOptions::default();
    let mut command: Option<CliCommand> = None;

    let mut i = 0;
    while i < args.len() {
        let arg = &args[i];
        match arg.as_str() {
            "--json" => options.json = true,
            "--keep" => options.keep = Some(true),
            "--no-keep" => options.keep = Some(false),
            "-v" | "--verbose" => options.verbosity = options.verbosity.saturating_add(1),
            "-vv" => options.verbosity = options.verbosity.saturating_add(2),
            "--roms" => {
                i += 1;
                let value = args.get(i).ok_or("--roms requires a directory")?;
                options.roms = Some(PathBuf::from(value));
            }
            "--config" => {
                i += 1;
                let value = args.get(i).ok_or("--config requires a file")?;
                options.config = Some(PathBuf::from(value));
            }
            "sync" | "scan" | "stores" | "open" if command.is_some() => {
                return Err(format!("Unexpected command: {}", arg));
            }
            "sync" => command = Some(CliCommand::Sync),
            "scan" => command = Some(CliCommand::Scan),
            "stores" => command = Some(CliCommand::Stores),
            "open" => {
                i += 1;
                let name = args.get(i).ok_or("open requires a store name")?;
                command = Some(CliCommand::Open(parse_store(name)?));
            }
            _ if arg.starts_with('-') => return Err(format!("Unknown option: {}", arg)),
            _ => return Err(format!("Unknown command: {}", arg)),
        }
        i += 1;
    }

    let command = command
        .ok_or_else(|| "No command specified. Use: sync, scan, stores, or open <store>".to_string())?;
    Ok((command, options))
}

fn parse_store(name: &str) -> Result<Store, String> {
    Store::from_name(name).ok_or_else(|| {
        let known: Vec<&str> = Store::ALL.iter().map(|s| s.folder_name()).collect();
        format!("Unknown store '{}'. Use one of: {}", name, known.join(", "))
    })
}

/// Run CLI command
pub fn run(command: CliCommand, options: CliOptions) -> anyhow::Result<()> {
    let config = load_config(&options)?;
    match command {
        CliCommand::Sync => run_sync(&config, &options),
        CliCommand::Scan => run_scan(&config, &options),
        CliCommand::Stores => run_stores(&config, &options),
        CliCommand::Open(store) => run_open(store),
    }
}

/// Loads the config file and applies command-line overrides.
fn load_config(options: &CliOptions) -> anyhow::Result<Config> {
    let mut config = match &options.config {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?,
        None => Config::load(),
    };

    if let Some(roms) = &options.roms {
        config.roms_path = Some(roms.clone());
    }
    if let Some(keep) = options.keep {
        config.store_keep = keep;
    }
    Ok(config)
}

fn enabled_stores(config: &Config) -> Vec<Box<dyn StoreAdapter>> {
    default_stores()
        .into_iter()
        .filter(|adapter| config.is_enabled(adapter.store()))
        .collect()
}

fn run_sync(config: &Config, options: &CliOptions) -> anyhow::Result<()> {
    let aggregator = LibraryAggregator::new(config)
        .context("Set a library directory with --roms <dir> or in the config file")?;
    let report = aggregator.run();

    if options.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_sync_report(&report);
    }
    Ok(())
}

fn print_sync_report(report: &LibraryReport) {
    println!("storefront-sync results:");
    println!();
    for store in &report.stores {
        match (&store.result, &store.error) {
            (Some(result), _) => println!(
                "{:<14} {:>3} games  {:>3} created  {:>3} unchanged  {:>3} deleted  {:>3} errors",
                store.store.display_name(),
                store.games,
                result.created,
                result.unchanged,
                result.deleted,
                result.errors
            ),
            (None, error) => println!(
                "{:<14} failed: {}",
                store.store.display_name(),
                error.as_deref().unwrap_or("unknown error")
            ),
        }
    }

    let totals = report.totals();
    println!();
    println!(
        "Total: {} created, {} unchanged, {} deleted, {} errors",
        totals.created, totals.unchanged, totals.deleted, totals.errors
    );
}

fn run_scan(config: &Config, options: &CliOptions) -> anyhow::Result<()> {
    let results = scan_stores(&enabled_stores(config));

    if options.json {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    for result in &results {
        if !result.installed {
            println!("{}: not installed", result.store.display_name());
            continue;
        }
        println!(
            "{}: {} installed games",
            result.store.display_name(),
            result.games.len()
        );
        for game in &result.games {
            println!("    {:<40} {}", game.name, game.launch);
        }
    }
    Ok(())
}

fn run_stores(config: &Config, options: &CliOptions) -> anyhow::Result<()> {
    let stores = default_stores();

    if options.json {
        let entries: Vec<_> = stores
            .iter()
            .map(|adapter| {
                serde_json::json!({
                    "store": adapter.store(),
                    "enabled": config.is_enabled(adapter.store()),
                    "installed": adapter.is_installed(),
                    "running": adapter.is_client_running(),
                    "directory": config.store_directory(adapter.store()),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    for adapter in &stores {
        let store = adapter.store();
        let state = match (adapter.is_installed(), adapter.is_client_running()) {
            (false, _) => "not installed",
            (true, true) => "installed, running",
            (true, false) => "installed",
        };
        let enabled = if config.is_enabled(store) { "" } else { " (disabled)" };
        println!("{:<14} {}{}", store.display_name(), state, enabled);
    }
    Ok(())
}

fn run_open(store: Store) -> anyhow::Result<()> {
    let adapter = default_stores()
        .into_iter()
        .find(|adapter| adapter.store() == store)
        .with_context(|| format!("No adapter registered for {}", store))?;

    adapter.open()?;
    println!("Started {}", store.display_name());
    Ok(())
}

pub fn print_help() {
    println!("storefront-sync v{}", env!("CARGO_PKG_VERSION"));
    println!("Mirror games installed through store clients into launch shortcuts");
    println!();
    println!("USAGE:");
    println!("    storefront-sync <command> [options]");
    println!();
    println!("COMMANDS:");
    println!("    sync                        Create and remove shortcuts to match installed games");
    println!("    scan                        List installed games per store");
    println!("    stores                      Show each store client's status");
    println!("    open <store>                Start a store client (amazon, epic, gog, steam)");
    println!();
    println!("OPTIONS:");
    println!("    --roms <dir>                Library root; one subfolder per store");
    println!("    --keep                      Keep shortcuts of uninstalled games");
    println!("    --no-keep                   Delete shortcuts of uninstalled games");
    println!("    --config <file>             Read configuration from <file>");
    println!("    --json                      Output in JSON format");
    println!("    -v, -vv                     Log more (RUST_LOG overrides)");
    println!("    --help                      Show this help message");
    println!();
    println!("EXAMPLES:");
    println!("    storefront-sync sync --roms D:\\Roms");
    println!("    storefront-sync scan --json");
    println!("    storefront-sync open epic");
}
