mod buffer;
mod config;
mod error;
mod harness;
mod jitter;
mod logging;
mod report;
mod trace;
mod types;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use crate::config::{
    DEFAULT_CAPACITY, DEFAULT_CONSUMERS, DEFAULT_JITTER_MS, DEFAULT_PRODUCERS, DEFAULT_TARGET,
    RunConfig,
};
use crate::error::ConfigError;
use crate::harness::Harness;
use crate::report::audit_lines;
use crate::trace::{TraceAudit, TraceRecorder};

/// Bounded producer/consumer buffer driven under a monitor or semaphore strategy.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Synchronization strategy: monitor | semaphore
    #[arg(default_value = "monitor")]
    mode: String,

    /// Number of producer threads
    #[arg(default_value_t = DEFAULT_PRODUCERS)]
    producers: usize,

    /// Number of consumer threads
    #[arg(default_value_t = DEFAULT_CONSUMERS)]
    consumers: usize,

    /// Items to deliver before stopping
    #[arg(default_value_t = DEFAULT_TARGET)]
    target: u64,

    /// Buffer capacity
    #[arg(long, default_value_t = DEFAULT_CAPACITY)]
    capacity: usize,

    /// Upper bound (exclusive) of the random pause between operations, in ms; 0 disables it
    #[arg(long, default_value_t = DEFAULT_JITTER_MS)]
    jitter_ms: u64,

    /// Seed for reproducible pauses
    #[arg(long)]
    seed: Option<u64>,

    /// Trace CSV path (default: events_<mode>_P<p>_C<c>_N<target>.csv)
    #[arg(long)]
    output: Option<PathBuf>,

    /// Audit the trace for lost, duplicated or unknown items
    #[arg(long)]
    validate: bool,
}

impl Cli {
    fn run_config(&self) -> Result<RunConfig, ConfigError> {
        let config = RunConfig {
            strategy: self.mode.parse()?,
            producers: self.producers,
            consumers: self.consumers,
            target: self.target,
            capacity: self.capacity,
            jitter_ms: self.jitter_ms,
            seed: self.seed,
        };
        config.validate()?;
        Ok(config)
    }
}

fn exit_with_error(message: &str) -> ! {
    eprintln!("{message}");
    std::process::exit(1);
}

fn main() {
    let cli = Cli::parse();
    let config = cli
        .run_config()
        .unwrap_or_else(|err| exit_with_error(&err.to_string()));

    println!(
        "Mode: {} | P={} | C={} | targetItems={} | capacity={}",
        config.strategy, config.producers, config.consumers, config.target, config.capacity
    );

    let recorder = Arc::new(TraceRecorder::new());
    let report = Harness::new(config, recorder.clone())
        .and_then(Harness::run)
        .unwrap_or_else(|err| exit_with_error(&format!("run failed: {err}")));

    let path = cli
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(config.trace_file_name()));
    if let Err(err) = recorder.write_csv_file(&path) {
        exit_with_error(&format!("Failed to write {}: {err}", path.display()));
    }
    println!("Wrote log to {}", path.display());

    println!("RUN SUMMARY");
    for line in report.summary_lines() {
        println!("{line}");
    }

    if cli.validate {
        let audit = TraceAudit::from_events(&recorder.events());
        for line in audit_lines(&audit, config.target) {
            println!("{line}");
        }
        if !audit.passed(config.target) {
            eprintln!("# violation,trace_audit");
            std::process::exit(1);
        }
    }
}
