#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that plans fuel slip batches for the form filler.

mod config;
mod gate;
mod slice_transfer;

use std::{
    fs,
    io::{self, Write},
    num::NonZeroUsize,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use fuel_slips_batch::{receipts_for, AmountPlan, Planner, SeedContext, SlipBatch};
use fuel_slips_core::DEFAULT_MAX_ATTEMPTS;
use fuel_slips_system_allocation::AllocationEngine;
use gate::{AutoApprove, ConfirmationGate, PromptGate};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Generates randomized fuel slip batches.
#[derive(Debug, Parser)]
#[command(name = "fuel-slips", version)]
struct CliArgs {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Plan a batch from a configuration file and emit it as JSON.
    Plan(PlanArgs),
    /// Decode a worker slice string and print its slips.
    Inspect {
        /// Slice string produced by `plan --workers`.
        slice: String,
    },
}

#[derive(Debug, clap::Args)]
struct PlanArgs {
    /// TOML configuration describing the run.
    #[arg(long, short)]
    config: PathBuf,
    /// Master seed overriding the configured one.
    #[arg(long)]
    seed: Option<u64>,
    /// Approve every review point without prompting.
    #[arg(long, short)]
    yes: bool,
    /// Number of workers to split the batch across.
    #[arg(long, default_value = "1")]
    workers: NonZeroUsize,
    /// Allocation attempts before falling back to an equal split.
    #[arg(long, default_value_t = DEFAULT_MAX_ATTEMPTS)]
    max_attempts: u32,
    /// File receiving the output instead of stdout.
    #[arg(long, short)]
    output: Option<PathBuf>,
}

/// Entry point for the fuel slip command-line interface.
fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fuel_slips=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let args = CliArgs::parse();
    match args.command {
        Command::Plan(plan) => {
            if plan.yes {
                run_plan(&plan, &mut AutoApprove)
            } else {
                let mut gate = PromptGate::new(io::stdin().lock(), io::stderr());
                run_plan(&plan, &mut gate)
            }
        }
        Command::Inspect { slice } => inspect(&slice),
    }
}

fn run_plan(args: &PlanArgs, gate: &mut dyn ConfirmationGate) -> Result<()> {
    let mut config = config::load_config(&args.config)?;
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    let validated = config.validate().context("configuration is invalid")?;

    let seeds = validated
        .seed()
        .map_or_else(SeedContext::from_entropy, SeedContext::new);
    info!(seed = seeds.master_seed(), "starting run");

    let mut planner = Planner::new(AllocationEngine::new(args.max_attempts));
    let plan = planner.plan_amounts(&validated, seeds)?;
    report_plan(&plan)?;
    if !gate.confirm("Proceed with these amounts?")? {
        warn!("run cancelled after amount review");
        return Ok(());
    }

    let batch = plan.enrich(&validated, &mut receipts_for(&validated))?;
    report_batch(&batch)?;
    if !gate.confirm("Hand this batch to the form filler?")? {
        warn!("run cancelled after slip review");
        return Ok(());
    }

    let rendered = render_output(&batch, args.workers)?;
    write_output(args.output.as_deref(), &rendered)?;
    info!(
        slips = batch.len(),
        workers = args.workers.get(),
        seed = batch.master_seed(),
        "batch emitted"
    );
    Ok(())
}

fn report_plan(plan: &AmountPlan) -> Result<()> {
    let mut err = io::stderr().lock();
    for notice in plan.notices() {
        writeln!(err, "note: {notice}")?;
    }
    writeln!(err, "{:>4}  {:<10}  {:>10}", "#", "date", "amount")?;
    for (index, pair) in plan.pairs().iter().enumerate() {
        writeln!(
            err,
            "{:>4}  {:<10}  {:>10}",
            index + 1,
            pair.date(),
            pair.amount()
        )?;
    }
    writeln!(
        err,
        "total {} across {} slips{}",
        plan.allocation().sum(),
        plan.pairs().len(),
        if plan.allocation().is_approximate() {
            " (approximate)"
        } else {
            ""
        }
    )?;
    Ok(())
}

fn report_batch(batch: &SlipBatch) -> Result<()> {
    let mut err = io::stderr().lock();
    for record in batch {
        writeln!(
            err,
            "{}  {}  {:>10}  {:>8.2} @ {:.2}",
            record.identifiers().receipt_number,
            record.display_date(),
            record.amount(),
            record.quantity(),
            record.rate()
        )?;
    }
    writeln!(
        err,
        "{} slips totalling {}; replay with --seed {}",
        batch.len(),
        batch.total_amount(),
        batch.master_seed()
    )?;
    Ok(())
}

/// Renders the whole batch as JSON, or one slice string per worker.
fn render_output(batch: &SlipBatch, workers: NonZeroUsize) -> Result<String> {
    if workers.get() == 1 {
        let mut json =
            serde_json::to_string_pretty(&batch.job()).context("failed to serialise batch")?;
        json.push('\n');
        return Ok(json);
    }

    let mut lines = String::new();
    for slice in batch.partition(workers) {
        lines.push_str(&slice_transfer::encode(&slice)?);
        lines.push('\n');
    }
    Ok(lines)
}

fn write_output(path: Option<&Path>, rendered: &str) -> Result<()> {
    match path {
        Some(path) => fs::write(path, rendered)
            .with_context(|| format!("failed to write output to {}", path.display())),
        None => {
            let mut out = io::stdout().lock();
            out.write_all(rendered.as_bytes())
                .context("failed to write output")?;
            out.flush().context("failed to flush output")
        }
    }
}

fn inspect(value: &str) -> Result<()> {
    let slice = slice_transfer::decode(value).context("failed to decode slice")?;
    info!(
        index = slice.index,
        workers = slice.workers,
        slips = slice.job.records.len(),
        "decoded slice"
    );
    let json = serde_json::to_string_pretty(&slice.job).context("failed to serialise slice")?;
    println!("{json}");
    Ok(())
}
