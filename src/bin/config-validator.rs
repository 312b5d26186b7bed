//! # Dispatcher Configuration Validator
//!
//! Command-line tool for validating dispatcher configuration files across
//! environments, before a host starts leasing partitions.

use clap::{Parser, Subcommand};
use dispatcher_core::config::{ConfigManager, DispatcherConfig};
use dispatcher_core::handlers;
use dispatcher_core::logging::log_error;
use std::path::PathBuf;
use std::process;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "config-validator")]
#[command(about = "Validate dispatcher configuration files")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// Environment to validate (development, test, production)
    #[arg(short, long, default_value = "development")]
    environment: String,

    /// Configuration directory path (default: config)
    #[arg(short, long)]
    config_dir: Option<PathBuf>,

    /// Verbose output level (use multiple times for more verbosity)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Validate all configuration sections
    All,

    /// Print the merged configuration as YAML
    Show,

    /// List the handler registration table
    Handlers,
}

fn main() {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let _subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .try_init();

    let result = load(&cli).and_then(|config| match &cli.command {
        Some(Commands::All) | None => validate_all_config(&config),
        Some(Commands::Show) => show_config(&config),
        Some(Commands::Handlers) => list_handlers(&config),
    });

    match result {
        Ok(()) => {
            info!("Configuration validation completed successfully");
            process::exit(0);
        }
        Err(e) => {
            log_error("config-validator", "validate", &e.to_string(), Some(&cli.environment));
            eprintln!("❌ {e}");
            process::exit(1);
        }
    }
}

fn load(cli: &Cli) -> Result<DispatcherConfig, Box<dyn std::error::Error>> {
    println!("🔧 Validating Dispatcher Configuration");
    println!("Environment: {}", cli.environment);
    if let Some(config_dir) = &cli.config_dir {
        println!("Config Directory: {}", config_dir.display());
    }
    println!();

    let manager = ConfigManager::load_from_directory_with_env(cli.config_dir.clone(), &cli.environment)?;
    println!("✅ Configuration loaded and validated");
    Ok(manager.config().clone())
}

fn validate_all_config(config: &DispatcherConfig) -> Result<(), Box<dyn std::error::Error>> {
    println!("📬 Dispatcher");
    println!("   ✅ Stream: {}", config.dispatcher.stream_name);
    println!("   ✅ Consumer group: {}", config.dispatcher.consumer_group);
    println!(
        "   ✅ Batch size: {} (prefetch {})",
        config.dispatcher.max_batch_size, config.dispatcher.prefetch_count
    );
    println!(
        "   ✅ Max concurrency per processor: {}",
        config.dispatcher.max_concurrency_per_processor
    );

    let breaker = &config.circuit_breaker;
    println!("🛡️  Circuit breaker");
    println!(
        "   ✅ Warning level: {}, trip level: {}",
        breaker.warning_level, breaker.trip_level
    );
    println!(
        "   ✅ Stall interval: {:?}, log cooldown: {:?}",
        breaker.stall_interval(),
        breaker.log_cooldown()
    );
    if (breaker.trip_level as usize) < config.dispatcher.max_concurrency_per_processor {
        println!("   ⚠️  Trip level is below the per-processor concurrency limit");
    }

    println!("☠️  Poison");
    if config.poison.enabled {
        println!("   ✅ Directory: {}", config.poison.directory.display());
    } else {
        println!("   ℹ️  Poison reporting disabled");
    }

    println!("📊 Instrumentation");
    println!("   ✅ Enabled: {}", config.instrumentation.enabled);

    println!("\n🎉 All configuration validation checks passed!");
    Ok(())
}

fn show_config(config: &DispatcherConfig) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_yaml::to_string(config)?);
    Ok(())
}

fn list_handlers(config: &DispatcherConfig) -> Result<(), Box<dyn std::error::Error>> {
    println!("📚 Handler registrations:");
    for entry in handlers::registrations(&config.handlers) {
        match (entry.factory)() {
            Ok(handler) => println!(
                "  • {} → {} (timeout {:?})",
                entry.registration,
                handler.name(),
                handler.timeout()
            ),
            Err(e) => println!("  • {} → ❌ {e:#}", entry.registration),
        }
    }
    Ok(())
}
