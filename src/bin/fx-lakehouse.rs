//! fx-lakehouse CLI - Run the exchange-rate pipeline layers
//!
//! ## Example Usage
//!
//! ```bash
//! # Validate today's snapshot into the silver layer
//! fx-lakehouse transform
//!
//! # Build gold analytics over the last 30 days
//! fx-lakehouse aggregate --date 2024-01-15 --days-back 30
//!
//! # Both layers in sequence
//! fx-lakehouse run --date 2024-01-15
//! ```

use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use colored::Colorize;
use fx_lakehouse::pipeline::{GoldPipeline, SilverPipeline};
use fx_lakehouse::store::StorePaths;
use std::path::PathBuf;
use std::process;

/// fx-lakehouse: Layered exchange-rate processing pipeline
#[derive(Parser)]
#[command(name = "fx-lakehouse")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Layered exchange-rate processing pipeline", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Root directory of the raw/silver/gold store
    #[arg(short = 'd', long, global = true, default_value = "data")]
    data_path: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a raw snapshot into the silver layer
    Transform {
        /// Target date (YYYY-MM-DD, default: today)
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Build gold analytics from a trailing silver window
    Aggregate {
        /// Target date (YYYY-MM-DD, default: today)
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Number of trailing days to include
        #[arg(long, default_value = "30")]
        days_back: u32,
    },

    /// Run both layers in sequence for one date
    Run {
        /// Target date (YYYY-MM-DD, default: today)
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Number of trailing days to include in the gold window
        #[arg(long, default_value = "30")]
        days_back: u32,
    },
}

fn main() {
    let cli = Cli::parse();

    let mut builder = env_logger::Builder::from_default_env();
    if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.init();

    let paths = StorePaths::under(&cli.data_path);
    if cli.verbose {
        println!(
            "{} v{}",
            "fx-lakehouse".cyan().bold(),
            env!("CARGO_PKG_VERSION")
        );
        println!(
            "Data dir: {}",
            cli.data_path.display().to_string().dimmed()
        );
    }

    let ok = match cli.command {
        Commands::Transform { date } => run_transform(&paths, resolve_date(date)),
        Commands::Aggregate { date, days_back } => {
            run_aggregate(&paths, resolve_date(date), days_back)
        }
        Commands::Run { date, days_back } => {
            let date = resolve_date(date);
            run_transform(&paths, date) && run_aggregate(&paths, date, days_back)
        }
    };

    if !ok {
        process::exit(1);
    }
}

fn resolve_date(date: Option<NaiveDate>) -> NaiveDate {
    date.unwrap_or_else(|| Utc::now().date_naive())
}

fn run_transform(paths: &StorePaths, date: NaiveDate) -> bool {
    println!(
        "{}",
        format!("Transforming snapshot for {}...", date).cyan().bold()
    );

    let report = SilverPipeline::new(paths).process_date(date);
    print_report(&report, report.is_success());
    report.is_success()
}

fn run_aggregate(paths: &StorePaths, date: NaiveDate, days_back: u32) -> bool {
    println!(
        "{}",
        format!("Aggregating {} days up to {}...", days_back, date)
            .cyan()
            .bold()
    );

    let report = GoldPipeline::new(paths).process_date(date, days_back);
    print_report(&report, report.is_success());
    report.is_success()
}

fn print_report<T: serde::Serialize>(report: &T, success: bool) {
    match serde_json::to_string_pretty(report) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("{} Failed to render report: {}", "Error:".red().bold(), e),
    }

    if success {
        println!("{} Run complete", "✓".green().bold());
    } else {
        eprintln!("{} Run failed", "Error:".red().bold());
    }
    println!();
}
