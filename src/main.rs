//! Resale Engine - Main Entry Point
//!
//! Command-line access to fee breakdowns, platform comparisons, pricing
//! strategies and full analyses. Results are printed as JSON.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, info, Level};
use tracing_subscriber::FmtSubscriber;

use resale_engine::config::{load_config, LogFormat};
use resale_engine::pricing::{summarize_prices, AnalysisRequest, ComparisonRequest, FeeOptions};
use resale_engine::{FeeCalculator, ItemCondition, PlatformId, ResaleEngine, SellerPriority};

/// CLI arguments for the application
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/default.toml", env = "RESALE_CONFIG")]
    config: String,

    /// Log level (trace, debug, info, warn, error); overrides the config file
    #[arg(long)]
    log_level: Option<String>,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fee breakdown for one platform
    Fees {
        #[arg(long)]
        platform: PlatformId,
        #[arg(long)]
        sale_price: Decimal,
        #[arg(long, default_value = "0")]
        shipping: Decimal,
        #[arg(long, default_value = "0")]
        item_cost: Decimal,
        #[arg(long)]
        category: Option<String>,
        /// Platform options as a JSON object
        #[arg(long)]
        options: Option<String>,
    },
    /// Rank platforms for a sale price
    Compare {
        #[arg(long)]
        sale_price: Decimal,
        #[arg(long, default_value = "0")]
        item_cost: Decimal,
        #[arg(long, default_value = "0")]
        shipping: Decimal,
        /// Platforms to compare (repeatable); defaults to all configured
        #[arg(long = "platform")]
        platforms: Vec<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        condition: Option<ItemCondition>,
    },
    /// Candidate prices from observed market prices
    Strategies {
        /// Comma-separated observed prices
        #[arg(long, value_delimiter = ',')]
        prices: Vec<f64>,
        #[arg(long, default_value = "balanced")]
        priority: SellerPriority,
    },
    /// Full analysis from a JSON request file
    Analyze {
        #[arg(long)]
        input: PathBuf,
    },
}

#[derive(Serialize)]
struct StrategyReport<'a> {
    statistics: &'a resale_engine::PriceStatisticsResult,
    strategies: &'a [resale_engine::PricingStrategy],
    chosen: Option<&'a resale_engine::PricingStrategy>,
}

fn init_logging(level: &str, format: LogFormat) -> Result<()> {
    let level = match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Json => tracing::subscriber::set_global_default(builder.json().finish())?,
        LogFormat::Text => tracing::subscriber::set_global_default(builder.finish())?,
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Load environment variables from .env file if present
    dotenvy::dotenv().ok();

    let config = load_config(Some(&args.config)).context("failed to load configuration")?;

    let level = args
        .log_level
        .clone()
        .unwrap_or_else(|| config.settings.log_level.clone());
    let format = if args.json_logs {
        LogFormat::Json
    } else {
        config.settings.log_format
    };
    init_logging(&level, format)?;

    info!(
        config = %args.config,
        fee_version = %config.fees.version,
        "Starting resale engine"
    );

    let engine = ResaleEngine::from_config(&config)?;

    match args.command {
        Command::Fees {
            platform,
            sale_price,
            shipping,
            item_cost,
            category,
            options,
        } => {
            let mut fee_options = match options {
                Some(raw) => FeeOptions::from_json(
                    serde_json::from_str(&raw).context("--options must be a JSON object")?,
                )?,
                None => FeeOptions::default(),
            };
            if category.is_some() {
                fee_options.category = category;
            }
            let breakdown =
                engine
                    .fees()
                    .compute_fees(platform, sale_price, shipping, item_cost, &fee_options)?;
            print_json(&breakdown)
        }
        Command::Compare {
            sale_price,
            item_cost,
            shipping,
            platforms,
            category,
            condition,
        } => {
            let mut request = ComparisonRequest::new(sale_price, item_cost, shipping);
            if !platforms.is_empty() {
                request = request.with_platforms(platforms);
            }
            if let Some(category) = category {
                request = request.with_category(category);
            }
            if let Some(condition) = condition {
                request = request.with_condition(condition);
            }
            let recommendation = engine.comparator().recommend(&request)?;
            print_json(&recommendation)
        }
        Command::Strategies { prices, priority } => {
            let statistics = summarize_prices(&prices);
            let strategies = engine.strategies().derive_strategies(&statistics)?;
            let chosen = engine.strategies().select(&strategies, priority);
            print_json(&StrategyReport {
                statistics: &statistics,
                strategies: &strategies,
                chosen,
            })
        }
        Command::Analyze { input } => {
            let raw = std::fs::read_to_string(&input)
                .with_context(|| format!("failed to read {}", input.display()))?;
            let request: AnalysisRequest = serde_json::from_str(&raw)
                .with_context(|| format!("invalid analysis request in {}", input.display()))?;
            debug!(observations = request.observations.len(), "analysis request parsed");
            let report = engine.analyze(&request)?;
            print_json(&report)
        }
    }
}
