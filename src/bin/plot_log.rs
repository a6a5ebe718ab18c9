//! Loadcell Log Plotter
//!
//! Renders a captured loadcell CSV log to PNG, optionally smoothed with a
//! trailing moving average.
//!
//! Usage:
//!   plot-log --file loadcell_log.csv
//!   plot-log --file sample_loadcell_log.csv --ma 10 --save sample.png

use clap::Parser;
use loadcell_torque::plot::{render_log_png, PlotStyle};
use loadcell_torque::{ReaderKind, SeriesReader};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "plot-log")]
#[command(about = "Plot loadcell CSV log", long_about = None)]
struct Args {
    /// CSV file to plot
    #[arg(short, long, default_value = "loadcell_log.csv")]
    file: PathBuf,

    /// Output PNG path
    #[arg(short, long, default_value = "loadcell_plot.png")]
    save: PathBuf,

    /// Moving average window (samples, 1 = off)
    #[arg(long, default_value = "1")]
    ma: usize,

    /// CSV reader implementation
    #[arg(long, value_enum, default_value_t = ReaderKind::Csv)]
    reader: ReaderKind,

    /// Image width in pixels
    #[arg(long, default_value = "1500")]
    width: u32,

    /// Image height in pixels
    #[arg(long, default_value = "900")]
    height: u32,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let series = args.reader.reader().read_series(&args.file)?;
    if series.is_empty() {
        eprintln!("No data to plot.");
        std::process::exit(1);
    }

    println!("Loaded {} rows from {}", series.len(), args.file.display());
    println!("Mean raw_value: {:.3}", series.mean());

    let style = PlotStyle {
        width: args.width,
        height: args.height,
    };
    render_log_png(&args.save, &series, args.ma, &style)?;
    println!("Saved plot -> {}", args.save.display());

    Ok(())
}
