use anyhow::{Context as AnyhowContext, Result};
use clap::Parser;
use paramflow::cli::{self, Command, OutputFormat};
use paramflow::config::{self, SchedulerConfig};
use paramflow::logging::{self, Verbosity};
use paramflow::output::{EventRecord, OutputFormatter, RunSummary};
use paramflow::scheduler::Scheduler;
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Args::parse();
    logging::init(Verbosity::from_flags(args.verbose, args.quiet));
    args.validate().context("Invalid arguments")?;

    match &args.command {
        Command::Validate { config } => validate(config),
        Command::Run {
            config,
            duration,
            format,
        } => run(config, *duration, *format).await,
    }
}

fn load(path: &Path) -> Result<SchedulerConfig> {
    let config = config::load_path(path)
        .with_context(|| format!("Failed to load config from {}", path.display()))?;
    config.validate().context("Invalid config")?;
    Ok(config)
}

fn validate(path: &Path) -> Result<()> {
    let config = load(path)?;
    println!(
        "{}: {} job(s) OK{}",
        path.display(),
        config.jobs.len(),
        if config.enabled { "" } else { " (scheduler disabled)" }
    );
    Ok(())
}

fn register_printers(scheduler: &Scheduler, format: OutputFormat) {
    scheduler.events().successful().observe(move |event| {
        match OutputFormatter::event(&EventRecord::from(event), format) {
            Ok(line) => println!("{line}"),
            Err(err) => warn!(error = %err, "failed to format event"),
        }
    });
    scheduler.events().failed().observe(move |event| {
        match OutputFormatter::event(&EventRecord::from(event), format) {
            Ok(line) => println!("{line}"),
            Err(err) => warn!(error = %err, "failed to format event"),
        }
    });
}

async fn run(path: &Path, duration: Option<Duration>, format: OutputFormat) -> Result<()> {
    let config = load(path)?;
    let scheduler = config
        .build_scheduler()
        .context("Failed to build scheduler")?;
    register_printers(&scheduler, format);

    let started = Instant::now();
    scheduler.start().context("Failed to start scheduler")?;

    match duration {
        Some(duration) => {
            tokio::select! {
                _ = tokio::time::sleep(duration) => {}
                _ = tokio::signal::ctrl_c() => info!("interrupted"),
            }
        }
        None => {
            tokio::signal::ctrl_c()
                .await
                .context("Failed to listen for Ctrl-C")?;
            info!("interrupted");
        }
    }

    scheduler.shutdown().await;

    let summary = RunSummary::new(started.elapsed(), scheduler.all_stats());
    println!("{}", OutputFormatter::summary(&summary, format)?);
    Ok(())
}
