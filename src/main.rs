//! MDR torque calculator
//!
//! Calibrates loadcell counts from an offset capture and a known-torque
//! capture, converts a sample capture to torque, and writes the torque series
//! and per-cycle amplitude/RMS to CSV.
//!
//! Usage:
//!   mdr-torque --offset offset.csv --cal cal.csv --sample run.csv --torque 5.0
//!   mdr-torque --sample run.csv --weight 2.0 --lever 0.1 --freq 1.66 --out torque.csv

use clap::Parser;
use loadcell_torque::output::{save_outputs, summary_lines};
use loadcell_torque::{
    read_inputs, run_pipeline, CalibrationReference, PipelineConfig, ReaderKind, TorqueReport,
};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "mdr-torque")]
#[command(about = "Simulate MDR torque from loadcell logs", long_about = None)]
struct Args {
    /// Offset (no load) CSV path
    #[arg(long, default_value = "offset_loadcell_log.csv")]
    offset: PathBuf,

    /// Calibration CSV path
    #[arg(long, default_value = "calibration_loadcell_log.csv")]
    cal: PathBuf,

    /// Sample CSV path
    #[arg(long, default_value = "sample_loadcell_log.csv")]
    sample: PathBuf,

    /// Oscillation frequency in Hz (<= 0 disables per-cycle processing)
    #[arg(long, default_value = "1.66", allow_negative_numbers = true)]
    freq: f64,

    /// Known torque at calibration in N·m
    #[arg(long)]
    torque: Option<f64>,

    /// Known weight in kg for calibration (with --lever)
    #[arg(long)]
    weight: Option<f64>,

    /// Lever arm in meters (used with --weight)
    #[arg(long)]
    lever: Option<f64>,

    /// Output CSV for the torque series
    #[arg(short, long, default_value = "torque_output.csv")]
    out: PathBuf,

    /// Output CSV for per-cycle metrics
    #[arg(long, default_value = "torque_cycles.csv")]
    cycles_out: PathBuf,

    /// CSV reader implementation
    #[arg(long, value_enum, default_value_t = ReaderKind::Csv)]
    reader: ReaderKind,

    /// Save a PNG plot of the result
    #[cfg(feature = "plot")]
    #[arg(long)]
    plot: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let args = Args::parse();

    let level = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    if let Err(e) = run(&args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    // Reference options are checked before any file is read
    let reference = CalibrationReference::from_options(args.torque, args.weight, args.lever)?;
    let config = PipelineConfig {
        frequency_hz: Some(args.freq),
        reference,
    };

    let reader = args.reader.reader();
    let inputs = read_inputs(reader.as_ref(), &args.offset, &args.cal, &args.sample)?;
    println!(
        "Loaded {} offset, {} calibration, {} sample rows",
        inputs.offset.len(),
        inputs.calibration.len(),
        inputs.sample.len()
    );

    let (calibration, report) = run_pipeline(&inputs, &config)?;

    if save_outputs(&args.out, &args.cycles_out, &report)? {
        println!("Wrote per-cycle metrics -> {}", args.cycles_out.display());
    }

    for line in summary_lines(&calibration) {
        println!("{}", line);
    }
    println!("Wrote torque series -> {}", args.out.display());

    save_plot(args, &report)?;
    Ok(())
}

#[cfg(feature = "plot")]
fn save_plot(args: &Args, report: &TorqueReport) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(path) = &args.plot {
        loadcell_torque::plot::render_torque_png(path, report, &Default::default())?;
        println!("Saved plot -> {}", path.display());
    }
    Ok(())
}

#[cfg(not(feature = "plot"))]
fn save_plot(_args: &Args, _report: &TorqueReport) -> Result<(), Box<dyn std::error::Error>> {
    Ok(())
}
