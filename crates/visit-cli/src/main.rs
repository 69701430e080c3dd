//! `visits` CLI — run session availability queries against a scenario file.
//!
//! ## Usage
//!
//! ```sh
//! # Every schedulable session at a prison, annotated with conflicts
//! visits sessions -s scenario.json --prison HEI \
//!     --from 2024-01-01 --to 2024-01-31 --prisoner A1234BC
//!
//! # Only the sessions the prisoner can actually book
//! visits available -s scenario.json --prison HEI \
//!     --from 2024-01-01 --to 2024-01-31 --prisoner A1234BC --restriction open
//!
//! # Pooled open/closed capacity of a single slot
//! visits capacity -s scenario.json --prison HEI \
//!     --date 2024-01-08 --start 14:00:00 --end 15:00:00
//! ```
//!
//! The scenario file is a JSON bundle of prisons, templates, prisoners,
//! bookings and non-associations; results are printed as pretty JSON.

use anyhow::{bail, Context, Result};
use chrono::{NaiveDate, NaiveTime, Utc};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use visit_engine::{
    ClientType, DateRange, MemoryStore, Restriction, Scenario, SessionService, SessionsRequest,
};

#[derive(Parser)]
#[command(
    name = "visits",
    version,
    about = "Prison visit session availability CLI"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List every schedulable session, annotated with conflicts
    Sessions {
        /// Scenario JSON file
        #[arg(short, long)]
        scenario: String,
        /// Prison code
        #[arg(long)]
        prison: String,
        /// Window start date
        #[arg(long)]
        from: NaiveDate,
        /// Window end date
        #[arg(long)]
        to: NaiveDate,
        /// Prisoner in scope (optional for a staff overview)
        #[arg(long)]
        prisoner: Option<String>,
        /// Requesting client type: staff or public
        #[arg(long, default_value = "staff")]
        client: String,
        /// Booking username, so their own in-progress application is not a conflict
        #[arg(long)]
        username: Option<String>,
        /// Anchor date for the booking-notice window (defaults to today)
        #[arg(long)]
        today: Option<NaiveDate>,
    },
    /// List only the sessions the prisoner can book
    Available {
        /// Scenario JSON file
        #[arg(short, long)]
        scenario: String,
        /// Prison code
        #[arg(long)]
        prison: String,
        /// Window start date
        #[arg(long)]
        from: NaiveDate,
        /// Window end date
        #[arg(long)]
        to: NaiveDate,
        /// Prisoner the query is for
        #[arg(long)]
        prisoner: String,
        /// Capacity channel to book: open or closed
        #[arg(long)]
        restriction: String,
        /// Requesting client type: staff or public
        #[arg(long, default_value = "staff")]
        client: String,
        /// Booking username
        #[arg(long)]
        username: Option<String>,
        /// Anchor date for the booking-notice window (defaults to today)
        #[arg(long)]
        today: Option<NaiveDate>,
    },
    /// Pooled open/closed capacity of a single slot
    Capacity {
        /// Scenario JSON file
        #[arg(short, long)]
        scenario: String,
        /// Prison code
        #[arg(long)]
        prison: String,
        /// Slot date
        #[arg(long)]
        date: NaiveDate,
        /// Slot start time, e.g. 14:00:00
        #[arg(long)]
        start: NaiveTime,
        /// Slot end time, e.g. 15:00:00
        #[arg(long)]
        end: NaiveTime,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Sessions {
            scenario,
            prison,
            from,
            to,
            prisoner,
            client,
            username,
            today,
        } => {
            let store = load_store(&scenario)?;
            let service = SessionService::new(&store, &store, &store, &store);
            let request = SessionsRequest {
                prison_code: prison,
                window: DateRange::new(from, to)?,
                prisoner_id: prisoner,
                client: parse_client(&client)?,
                username,
                today: today.unwrap_or_else(|| Utc::now().date_naive()),
            };
            let sessions = service.list_sessions(&request)?;
            println!("{}", serde_json::to_string_pretty(&sessions)?);
        }
        Commands::Available {
            scenario,
            prison,
            from,
            to,
            prisoner,
            restriction,
            client,
            username,
            today,
        } => {
            let store = load_store(&scenario)?;
            let service = SessionService::new(&store, &store, &store, &store);
            let request = SessionsRequest {
                prison_code: prison,
                window: DateRange::new(from, to)?,
                prisoner_id: Some(prisoner),
                client: parse_client(&client)?,
                username,
                today: today.unwrap_or_else(|| Utc::now().date_naive()),
            };
            let sessions =
                service.list_available_sessions(&request, parse_restriction(&restriction)?)?;
            println!("{}", serde_json::to_string_pretty(&sessions)?);
        }
        Commands::Capacity {
            scenario,
            prison,
            date,
            start,
            end,
        } => {
            let store = load_store(&scenario)?;
            let service = SessionService::new(&store, &store, &store, &store);
            let capacity = service.compute_capacity(&prison, date, start, end)?;
            println!("{}", serde_json::to_string_pretty(&capacity)?);
        }
    }
    Ok(())
}

fn load_store(path: &str) -> Result<MemoryStore> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading scenario file {path}"))?;
    let scenario: Scenario =
        serde_json::from_str(&raw).with_context(|| format!("parsing scenario file {path}"))?;
    Ok(MemoryStore::from(scenario))
}

fn parse_client(raw: &str) -> Result<ClientType> {
    match raw.to_ascii_lowercase().as_str() {
        "staff" => Ok(ClientType::Staff),
        "public" => Ok(ClientType::Public),
        other => bail!("unknown client type {other:?} (expected staff or public)"),
    }
}

fn parse_restriction(raw: &str) -> Result<Restriction> {
    match raw.to_ascii_lowercase().as_str() {
        "open" => Ok(Restriction::Open),
        "closed" => Ok(Restriction::Closed),
        other => bail!("unknown restriction {other:?} (expected open or closed)"),
    }
}
