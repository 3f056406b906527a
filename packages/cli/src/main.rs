//! `des` - drive the simulation kernel from the command line

mod workload;

use anyhow::{ensure, Result};
use clap::{Parser, Subcommand};
use des_kernel::{SchedulerKind, SimulatorConfig, Time, TimeUnit};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::workload::Workload;

/// Environment variable holding the log filter
const LOG_ENV: &str = "DES_LOG";

/// Discrete-event simulation kernel driver
#[derive(Parser)]
#[command(name = "des", version)]
#[command(about = "Run and compare discrete-event scheduler backends", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a seeded synthetic workload on one backend
    Run {
        /// heap, list, map or calendar (default: $DES_SCHEDULER or heap)
        #[arg(short, long)]
        scheduler: Option<SchedulerKind>,
        #[arg(short, long, default_value_t = 10_000)]
        events: usize,
        #[arg(long, default_value_t = 1)]
        seed: u64,
        /// Stop the run at this time, e.g. `50ms`
        #[arg(long)]
        stop: Option<Time>,
    },
    /// Run the same workload on every backend and check the traces match
    Compare {
        #[arg(short, long, default_value_t = 10_000)]
        events: usize,
        #[arg(long, default_value_t = 1)]
        seed: u64,
    },
    /// Parse a time and print it at a resolution
    Time {
        value: Time,
        #[arg(short, long, default_value = "ns")]
        unit: TimeUnit,
    },
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    // before clap parses any time argument
    let config = SimulatorConfig::from_env()?;
    Time::set_resolution(config.resolution)?;

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            scheduler,
            events,
            seed,
            stop,
        } => {
            if let Some(stop) = stop {
                ensure!(!stop.is_negative(), "stop time must not be negative: {stop}");
            }
            let config = scheduler.map_or(config, |kind| config.with_scheduler(kind));
            let report = Workload::generate(events, seed, stop).run(config);
            info!(
                scheduler = report.scheduler,
                executed = report.executed,
                cancelled = report.cancelled,
                pending = report.pending,
                end = %report.end.display(config.resolution),
                "workload finished"
            );
        }
        Commands::Compare { events, seed } => {
            let reports = Workload::generate(events, seed, None).compare(config)?;
            for report in &reports {
                info!(scheduler = report.scheduler, executed = report.executed, "trace matches");
            }
            println!(
                "all {} backends agree on {} dispatches",
                reports.len(),
                reports.first().map_or(0, |r| r.trace.len())
            );
        }
        Commands::Time { value, unit } => {
            println!("{}", value.display(unit));
            println!("{} {}", value.to_integer(unit), unit.suffix());
        }
    }

    Ok(())
}
