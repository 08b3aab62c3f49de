use clap::Parser;
use color_eyre::eyre::WrapErr;
use colored::{Color, Colorize};
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use twin_core::config::{parse_override, set_cadence, set_fault_threshold};
use twin_core::logger::{ensure_log_dir, DEFAULT_LOG_FILE};
use twin_core::{Logger, PipelineCoordinator};
use twin_protocol::{LineConfig, RunOutcome, RunSummary, StageOutcome};

/// Run the Hopper/Blender/Extruder production line simulation.
#[derive(Parser, Debug)]
#[command(name = "digital-twin", version, about)]
struct Args {
    /// Capacity of the shared queue between producers and consumers.
    #[arg(long, value_name = "N")]
    queue_capacity: Option<usize>,

    /// Override a producer's publish cadence, e.g. `Hopper=500`.
    #[arg(long = "cadence-ms", value_name = "STAGE=MS", value_parser = parse_override)]
    cadences: Vec<(String, u64)>,

    /// Override a consumer's fault threshold, e.g. `Blender=10`.
    #[arg(long = "fault-threshold", value_name = "STAGE=N", value_parser = parse_override)]
    fault_thresholds: Vec<(String, u64)>,

    /// Processing delay applied by every consumer after each envelope.
    #[arg(long, value_name = "MS")]
    processing_delay_ms: Option<u64>,

    /// Stop each producer after this many completed cycles.
    #[arg(long, value_name = "N")]
    cycles: Option<u64>,

    /// Directory the log file is written to.
    #[arg(long, default_value = "logs")]
    log_dir: PathBuf,

    /// Name of the log file inside the log directory.
    #[arg(long, default_value = DEFAULT_LOG_FILE)]
    log_file: String,

    /// Print the run summary as JSON instead of a table.
    #[arg(long)]
    json: bool,

    /// Exit as soon as the run is over instead of waiting for Enter.
    #[arg(long)]
    no_wait: bool,
}

impl Args {
    fn line_config(&self) -> color_eyre::Result<LineConfig> {
        let mut config = LineConfig::standard();

        if let Some(capacity) = self.queue_capacity {
            config.queue_capacity = capacity;
        }
        for (stage, cadence_ms) in &self.cadences {
            set_cadence(&mut config, stage, *cadence_ms)?;
        }
        for (stage, threshold) in &self.fault_thresholds {
            set_fault_threshold(&mut config, stage, *threshold)?;
        }
        if let Some(delay_ms) = self.processing_delay_ms {
            for consumer in &mut config.consumers {
                consumer.processing_delay_ms = delay_ms;
            }
        }
        if self.cycles.is_some() {
            for producer in &mut config.producers {
                producer.cycle_limit = self.cycles;
            }
        }

        Ok(config)
    }
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let args = Args::parse();

    let config = args.line_config()?;

    ensure_log_dir(&args.log_dir)
        .wrap_err_with(|| format!("failed to create log directory {}", args.log_dir.display()))?;
    let logger = Logger::new(args.log_dir.join(&args.log_file));

    let summary = PipelineCoordinator::new(config, logger.clone())
        .run()
        .await?;
    logger.log("Done!", Color::White);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary);
    }

    if !args.no_wait {
        println!("Press Enter to exit...");
        let mut line = String::new();
        BufReader::new(tokio::io::stdin())
            .read_line(&mut line)
            .await?;
    }

    if summary.outcome.is_halted() {
        std::process::exit(1);
    }
    Ok(())
}

fn print_summary(summary: &RunSummary) {
    println!();
    println!("{} {}", "Run".bold(), summary.run_id.to_string().dimmed());

    for report in &summary.reports {
        let outcome = match &report.outcome {
            StageOutcome::Completed => "completed".green(),
            StageOutcome::Interrupted => "interrupted".yellow(),
            StageOutcome::Faulted { reason } => format!("faulted: {reason}").red(),
            StageOutcome::Failed { error } => format!("failed: {error}").red().bold(),
        };
        println!(
            "  {:<10} {:<9} {:>5}  {}",
            report.stage,
            report.role.to_string(),
            report.processed,
            outcome
        );
    }

    match &summary.outcome {
        RunOutcome::Completed => println!("{}", "Line completed".green().bold()),
        RunOutcome::Halted { stage, reason } => {
            println!("{} {}", format!("Line halted by {stage}:").red().bold(), reason)
        }
    }
}
