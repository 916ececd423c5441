//! Pourguard CLI - Main entry point

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use pourguard_rpc::{commands, AppContext};
use rust_decimal::Decimal;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pourguard")]
#[command(about = "Pourguard - compliance eligibility for regulated deliveries", long_about = None)]
struct Cli {
    /// Zone registry (JSON)
    #[arg(long, default_value = "./config/zones.json")]
    zones: PathBuf,

    /// Compliance config (JSON); defaults are used when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Audit ledger (JSONL, append-only)
    #[arg(long, default_value = "./data/audit.jsonl")]
    audit: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List exclusion and delivery zones
    Zones,

    /// Check whether a point can be delivered to
    CheckLocation {
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
        #[arg(long, allow_negative_numbers = true)]
        lon: f64,
    },

    /// Compute age from a date of birth (YYYY-MM-DD)
    CheckAge {
        #[arg(long)]
        dob: String,
        /// Evaluate on this day instead of today
        #[arg(long)]
        as_of: Option<String>,
    },

    /// Evaluate an order
    Evaluate {
        /// Verification record as JSON
        #[arg(long)]
        identity: String,
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
        #[arg(long, allow_negative_numbers = true)]
        lon: f64,
        /// Regulated volume of the order in ml
        #[arg(long)]
        volume: u64,
        /// Volume already admitted today in ml
        #[arg(long, default_value = "0")]
        consumed_today: u64,
    },

    /// Summarise the audit ledger (RFC 3339 bounds, last 30 days by default)
    Report {
        #[arg(long)]
        from: Option<DateTime<Utc>>,
        #[arg(long)]
        to: Option<DateTime<Utc>>,
    },

    /// Excise tax and GST for a product
    Excise {
        /// Product type (whiskey, rum, wine, beer, ...)
        #[arg(long)]
        product: String,
        /// Base price
        #[arg(long)]
        price: Decimal,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // Excise needs no zones or ledger
    if let Commands::Excise { product, price } = &cli.command {
        commands::excise(product, *price).await?;
        return Ok(());
    }

    let ctx = AppContext::new(&cli.zones, cli.config.as_deref(), &cli.audit).await?;
    let now = Utc::now();

    match cli.command {
        Commands::Zones => {
            commands::zones(&ctx).await?;
        }

        Commands::CheckLocation { lat, lon } => {
            commands::check_location(&ctx, lat, lon, now).await?;
        }

        Commands::CheckAge { dob, as_of } => {
            commands::check_age(&ctx, &dob, as_of.as_deref(), now).await?;
        }

        Commands::Evaluate {
            identity,
            lat,
            lon,
            volume,
            consumed_today,
        } => {
            commands::evaluate(&ctx, &identity, lat, lon, volume, consumed_today, now).await?;
        }

        Commands::Report { from, to } => {
            commands::report(&ctx, from, to, now).await?;
        }

        Commands::Excise { product, price } => {
            commands::excise(&product, price).await?;
        }
    }

    Ok(())
}
