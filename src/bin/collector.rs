//! Loadcell Data Collector
//!
//! Reads firmware log lines from a serial port, extracts the raw loadcell
//! count from each `UART: {"raw": ...}` line and appends it with a UTC
//! timestamp to a CSV log.
//!
//! Usage:
//!   collector --port /dev/ttyUSB0 --out offset_loadcell_log.csv
//!   collector --port COM5 --baud 115200 --print

use clap::Parser;
use loadcell_torque::capture::{decode_line, open_port, parse_raw_line, CsvLogAppender};
use loadcell_torque::common::{format_timestamp, utc_now};
use std::io::{BufRead, BufReader, ErrorKind};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

#[derive(Parser, Debug)]
#[command(name = "collector")]
#[command(about = "Log raw loadcell data from ESP32 UART to CSV", long_about = None)]
struct Args {
    /// Serial port (e.g., COM5 or /dev/ttyUSB0)
    #[arg(short, long)]
    port: String,

    /// Baud rate
    #[arg(short, long, default_value = "115200")]
    baud: u32,

    /// Output CSV path
    #[arg(short, long, default_value = "loadcell_log.csv")]
    out: PathBuf,

    /// Print values to console
    #[arg(long = "print")]
    do_print: bool,

    /// Print debug information (all received lines)
    #[arg(long)]
    debug: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let level = if args.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let port = open_port(&args.port, args.baud)?;
    let mut appender = CsvLogAppender::open(&args.out)?;

    // Setup Ctrl+C handler
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })?;

    println!(
        "Logging raw loadcell values from {} @ {} to {}. Press Ctrl+C to stop.",
        args.port,
        args.baud,
        args.out.display()
    );

    let collection_start = Instant::now();
    let mut reader = BufReader::new(port);
    let mut line_bytes = Vec::with_capacity(128);

    while running.load(Ordering::SeqCst) {
        // A timed-out read keeps its partial line in `line_bytes`
        match reader.read_until(b'\n', &mut line_bytes) {
            Ok(0) => {
                eprintln!("Serial port closed");
                break;
            }
            Ok(_) => {}
            Err(e) if matches!(e.kind(), ErrorKind::TimedOut | ErrorKind::Interrupted) => continue,
            Err(e) => {
                eprintln!("Serial error: {}", e);
                break;
            }
        }

        let line = decode_line(&line_bytes);
        line_bytes.clear();
        log::debug!("Received line: '{}'", line);

        match parse_raw_line(&line) {
            Some(raw) => {
                let ts = utc_now();
                appender.append(&ts, raw)?;
                if args.do_print {
                    println!("{}, {}", format_timestamp(&ts), raw);
                }
                log::debug!("Parsed value: {}", raw);
            }
            None if !line.is_empty() => log::debug!("No match found for line: '{}'", line),
            None => {}
        }
    }

    let elapsed = collection_start.elapsed().as_secs_f64();
    let samples = appender.rows_written();
    println!("\nStopped.");
    println!("Total samples: {}", samples);
    println!("Elapsed time: {:.2} seconds", elapsed);
    if elapsed > 0.0 {
        println!("Actual sample rate: {:.1} Hz", samples as f64 / elapsed);
    }
    println!("File: {}", appender.path().display());

    Ok(())
}
