//! welllog: command-line inspector and editor for Petrolog well logs.
//!
//! Every command takes the log's base path or any of its member files.
//!
//! # Usage
//!
//! ```bash
//! welllog info logs/well_a
//! welllog info logs/well_a.header --json
//! welllog stats logs/well_a
//! welllog dump logs/well_a --channel GR --limit 20
//! welllog delete logs/well_a WAVE NOISE
//! welllog convert logs/well_a --from degF --to degC --gain 0.5556 --offset -17.78
//! welllog remap logs/well_a RT=ILD
//! welllog crop logs/well_a --from 5000 --to 5500
//! welllog set-constant logs/well_a Run_1_BHT 187
//! ```

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use welllog_model::Channel;
use welllog_petrolog::{DepthUnits, PetrologConfig, PetrologLog};

// ───────────────────────────── CLI definition ─────────────────────────────

/// Top-level CLI entry point for the `welllog` binary.
#[derive(Parser)]
#[command(
    name = "welllog",
    about = "Inspect and edit Petrolog fixed-record well logs",
    version
)]
struct Cli {
    /// Enable verbose (debug-level) logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Present depths in metres instead of feet.
    #[arg(long, global = true)]
    metric: bool,

    /// Maximum number of index values to generate.
    #[arg(long, global = true, value_name = "N")]
    max_index_iterations: Option<usize>,

    /// Neither read nor write the .statistics side-car.
    #[arg(long, global = true)]
    no_cache: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available sub-commands.
#[derive(Subcommand)]
enum Commands {
    /// Show the header summary, channels and well-header constants.
    Info {
        /// Log base path or member file.
        input: PathBuf,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Compute (or load cached) channel statistics and print them.
    Stats {
        input: PathBuf,

        #[arg(long)]
        json: bool,
    },

    /// Print index and value pairs for one channel.
    Dump {
        input: PathBuf,

        /// Channel name.
        #[arg(short, long)]
        channel: String,

        /// Print at most this many records.
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Delete channels and shrink every record.
    Delete {
        input: PathBuf,

        /// Channels to delete.
        #[arg(required = true)]
        names: Vec<String>,
    },

    /// Convert every channel in one unit with `value * gain + offset`.
    Convert {
        input: PathBuf,

        /// Unit to convert from.
        #[arg(long)]
        from: String,

        /// Unit label after conversion.
        #[arg(long)]
        to: String,

        #[arg(long, default_value_t = 1.0, allow_negative_numbers = true)]
        gain: f64,

        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        offset: f64,
    },

    /// Overwrite channel values with another channel's, given as DEST=SRC.
    Remap {
        input: PathBuf,

        #[arg(required = true, value_name = "DEST=SRC")]
        pairs: Vec<String>,
    },

    /// Keep only the records between two depths.
    Crop {
        input: PathBuf,

        #[arg(long, allow_negative_numbers = true)]
        from: f64,

        #[arg(long, allow_negative_numbers = true)]
        to: f64,
    },

    /// Set a well-header constant (`Run_<n>_NAME` addresses a run).
    SetConstant {
        input: PathBuf,
        name: String,
        value: String,
    },
}

// ───────────────────────────── main ─────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing subscriber with env-filter support.
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = config_from(&cli);
    tracing::debug!(?config, "Resolved log configuration");
    match cli.command {
        Commands::Info { input, json } => cmd_info(&input, config, json),
        Commands::Stats { input, json } => cmd_stats(&input, config, json),
        Commands::Dump {
            input,
            channel,
            limit,
        } => cmd_dump(&input, config, &channel, limit),
        Commands::Delete { input, names } => cmd_delete(&input, config, &names),
        Commands::Convert {
            input,
            from,
            to,
            gain,
            offset,
        } => cmd_convert(&input, config, &from, &to, gain, offset),
        Commands::Remap { input, pairs } => cmd_remap(&input, config, &pairs),
        Commands::Crop { input, from, to } => cmd_crop(&input, config, from, to),
        Commands::SetConstant { input, name, value } => {
            cmd_set_constant(&input, config, &name, &value)
        }
    }
}

fn config_from(cli: &Cli) -> PetrologConfig {
    let mut config = PetrologConfig::default().with_statistics_cache(!cli.no_cache);
    if cli.metric {
        config = config.with_depth_units(DepthUnits::Metric);
    }
    if let Some(limit) = cli.max_index_iterations {
        config = config.with_index_iteration_limit(limit);
    }
    config
}

fn open(input: &Path, config: PetrologConfig) -> Result<PetrologLog> {
    PetrologLog::open(input, config)
        .with_context(|| format!("Failed to open log: {}", input.display()))
}

// ───────────────────────────── commands ─────────────────────────────

fn cmd_info(input: &Path, config: PetrologConfig, json: bool) -> Result<()> {
    let log = open(input, config)?;
    let header = log.header();

    if json {
        let channels: Vec<serde_json::Value> = log.log().channels.iter().map(channel_json).collect();
        let constants: Vec<serde_json::Value> = log
            .log()
            .constants
            .iter()
            .map(|c| serde_json::json!({ "name": c.name, "unit": c.unit, "value": c.value }))
            .collect();
        let info = serde_json::json!({
            "base": log.paths().base.display().to_string(),
            "header": {
                "number_of_logs": header.number_of_logs,
                "number_of_columns": header.number_of_columns,
                "number_of_empty_columns": header.number_of_empty_columns,
                "number_of_records": header.number_of_records,
                "depth_start": header.depth_start,
                "depth_end": header.depth_end,
                "depth_frame": header.depth_frame,
                "record_width": header.record_width,
                "data_start": header.data_start,
            },
            "channels": channels,
            "constants": constants,
        });
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    println!("Log: {}", log.paths().base.display());
    println!("  Records:      {}", header.number_of_records);
    println!(
        "  Depth:        {} to {} ft, step {}",
        header.depth_start, header.depth_end, header.depth_frame
    );
    println!(
        "  Columns:      {} ({} empty)",
        header.number_of_columns, header.number_of_empty_columns
    );
    println!(
        "  Record width: {} bytes, data from byte {}",
        header.record_width, header.data_start
    );

    println!("\nChannels ({}):", log.log().channels.len());
    for channel in &log.log().channels {
        println!(
            "  {:<12} {:<8} {:<10} dim {:<3} {}",
            channel.name,
            channel.unit,
            channel.encoding.tag(),
            channel.dimension,
            channel.description
        );
    }

    if !log.log().constants.is_empty() {
        println!("\nConstants:");
        for constant in &log.log().constants {
            println!("  {:<16} {}", constant.name, constant.value);
        }
    }
    Ok(())
}

fn cmd_stats(input: &Path, config: PetrologConfig, json: bool) -> Result<()> {
    let mut log = open(input, config)?;
    log.refresh_statistics()
        .with_context(|| format!("Failed to compute statistics: {}", input.display()))?;

    if json {
        let channels: Vec<serde_json::Value> = log.log().channels.iter().map(channel_json).collect();
        println!("{}", serde_json::to_string_pretty(&channels)?);
        return Ok(());
    }

    println!(
        "{:<12} {:>8} {:>8} {:>14} {:>14} {:>14}",
        "Channel", "Valid", "Missing", "Min", "Max", "Average"
    );
    for channel in &log.log().channels {
        let s = &channel.stats;
        println!(
            "{:<12} {:>8} {:>8} {:>14.4} {:>14.4} {:>14.4}",
            channel.name, s.valid_count, s.missing_count, s.min, s.max, s.average
        );
    }
    Ok(())
}

fn cmd_dump(input: &Path, config: PetrologConfig, name: &str, limit: Option<usize>) -> Result<()> {
    let mut log = open(input, config)?;
    let index = log
        .log()
        .channel_index(name)
        .with_context(|| format!("No channel named {name}"))?;
    log.load_channel(0)?;
    log.load_channel(index)
        .with_context(|| format!("Failed to load channel {name}"))?;

    let channels = &log.log().channels;
    let (depth, channel) = (&channels[0], &channels[index]);
    println!("{}\t{}", depth.name, channel.name);
    let count = limit.unwrap_or(usize::MAX);
    for (d, v) in depth.samples.iter().zip(&channel.samples).take(count) {
        if v.is_nan() {
            println!("{:.*}\tNaN", depth.decimals as usize, d);
        } else {
            println!("{:.*}\t{:.*}", depth.decimals as usize, d, channel.decimals as usize, v);
        }
    }
    Ok(())
}

fn cmd_delete(input: &Path, config: PetrologConfig, names: &[String]) -> Result<()> {
    let mut log = open(input, config)?;
    let names: Vec<&str> = names.iter().map(String::as_str).collect();
    let removed = log
        .delete_channels(&names)
        .with_context(|| format!("Failed to delete channels from {}", input.display()))?;
    println!(
        "Deleted {removed} channel(s); record width is now {} bytes",
        log.header().record_width
    );
    Ok(())
}

fn cmd_convert(
    input: &Path,
    config: PetrologConfig,
    from: &str,
    to: &str,
    gain: f64,
    offset: f64,
) -> Result<()> {
    let mut log = open(input, config)?;
    let converted = log
        .convert_unit(from, to, gain, offset)
        .with_context(|| format!("Failed to convert {from} to {to}"))?;
    println!("Converted {converted} channel(s) from {from} to {to}");
    Ok(())
}

fn cmd_remap(input: &Path, config: PetrologConfig, pairs: &[String]) -> Result<()> {
    let parsed = pairs
        .iter()
        .map(|p| parse_pair(p))
        .collect::<Result<Vec<_>>>()?;
    let mut log = open(input, config)?;
    log.copy_channel_values(&parsed)
        .with_context(|| format!("Failed to remap channels in {}", input.display()))?;
    for (dest, src) in &parsed {
        println!("{dest} <- {src}");
    }
    Ok(())
}

fn cmd_crop(input: &Path, config: PetrologConfig, from: f64, to: f64) -> Result<()> {
    let mut log = open(input, config)?;
    log.crop(from, to)
        .with_context(|| format!("Failed to crop {}", input.display()))?;
    let header = log.header();
    println!(
        "Kept {} record(s) from {} to {}",
        header.number_of_records, header.depth_start, header.depth_end
    );
    Ok(())
}

fn cmd_set_constant(input: &Path, config: PetrologConfig, name: &str, value: &str) -> Result<()> {
    let mut log = open(input, config)?;
    log.set_well_constant(name, value);
    log.save_well_header()
        .with_context(|| format!("Failed to write well header for {}", input.display()))?;
    println!("{name} = {value}");
    Ok(())
}

// ───────────────────────────── helpers ─────────────────────────────

/// Split `DEST=SRC`.
fn parse_pair(pair: &str) -> Result<(&str, &str)> {
    match pair.split_once('=') {
        Some((dest, src)) if !dest.is_empty() && !src.is_empty() => Ok((dest, src)),
        _ => bail!("Expected DEST=SRC, got '{pair}'"),
    }
}

fn channel_json(channel: &Channel) -> serde_json::Value {
    let s = &channel.stats;
    serde_json::json!({
        "name": channel.name,
        "unit": channel.unit,
        "description": channel.description,
        "type": channel.encoding.tag(),
        "dimension": channel.dimension,
        "column_start": channel.column_start,
        "valid_count": s.valid_count,
        "missing_count": s.missing_count,
        "min": s.min,
        "max": s.max,
        "average": s.average,
    })
}
