//! PNG rendering of loadcell logs and torque results
//!
//! The x axis is seconds since the first sample.

use std::path::Path;

use chrono::NaiveDateTime;
use plotters::coord::Shift;
use plotters::prelude::*;

use crate::common::moving_average;
use crate::error::{LoadcellError, Result};
use crate::pipeline::TorqueReport;
use crate::series::Series;

const RAW_COLOR: RGBColor = RGBColor(31, 119, 180);
const CORRECTED_COLOR: RGBColor = RGBColor(148, 103, 189);
const TORQUE_COLOR: RGBColor = RGBColor(214, 39, 40);
const RMS_COLOR: RGBColor = RGBColor(44, 160, 44);
const AMPLITUDE_COLOR: RGBColor = RGBColor(255, 127, 14);

#[derive(Clone, Debug)]
pub struct PlotStyle {
    pub width: u32,
    pub height: u32,
}

impl Default for PlotStyle {
    fn default() -> Self {
        Self {
            width: 1500,
            height: 900,
        }
    }
}

struct Trace {
    label: String,
    points: Vec<(f64, f64)>,
    color: RGBColor,
    markers: bool,
}

fn seconds_since(origin: NaiveDateTime, ts: NaiveDateTime) -> f64 {
    (ts - origin)
        .num_microseconds()
        .map(|us| us as f64 / 1e6)
        .unwrap_or_default()
}

fn bounds(traces: &[Trace]) -> (std::ops::Range<f64>, std::ops::Range<f64>) {
    let points = || traces.iter().flat_map(|t| t.points.iter().copied());
    let x_min = points().map(|p| p.0).fold(f64::INFINITY, f64::min);
    let x_max = points().map(|p| p.0).fold(f64::NEG_INFINITY, f64::max);
    let y_min = points().map(|p| p.1).fold(f64::INFINITY, f64::min);
    let y_max = points().map(|p| p.1).fold(f64::NEG_INFINITY, f64::max);

    let pad = |lo: f64, hi: f64| {
        if !lo.is_finite() || !hi.is_finite() {
            0.0..1.0
        } else if hi - lo < f64::EPSILON {
            lo - 1.0..hi + 1.0
        } else {
            let margin = (hi - lo) * 0.05;
            lo - margin..hi + margin
        }
    };
    (pad(x_min, x_max), pad(y_min, y_max))
}

fn draw_panel<DB>(
    area: &DrawingArea<DB, Shift>,
    caption: &str,
    y_desc: &str,
    traces: &[Trace],
) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let (x_range, y_range) = bounds(traces);
    let mut chart = ChartBuilder::on(area)
        .margin(10)
        .caption(caption, ("sans-serif", 22).into_font())
        .set_label_area_size(LabelAreaPosition::Left, 70)
        .set_label_area_size(LabelAreaPosition::Bottom, 40)
        .build_cartesian_2d(x_range, y_range)?;
    chart
        .configure_mesh()
        .x_desc("Time [s]")
        .y_desc(y_desc)
        .light_line_style(&BLACK.mix(0.05))
        .draw()?;

    for trace in traces {
        let color = trace.color;
        chart
            .draw_series(LineSeries::new(trace.points.iter().copied(), &color))?
            .label(trace.label.as_str())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &color));
        if trace.markers {
            chart.draw_series(
                trace
                    .points
                    .iter()
                    .map(|&p| Circle::new(p, 3, color.filled())),
            )?;
        }
    }

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;
    Ok(())
}

/// Plot the raw values of a log, optionally smoothed with a moving average
pub fn render_log_png(
    path: &Path,
    series: &Series,
    ma_window: usize,
    style: &PlotStyle,
) -> Result<()> {
    let origin = series
        .first()
        .map(|s| s.timestamp)
        .ok_or_else(|| LoadcellError::Plot("no data to plot".to_string()))?;

    let values: Vec<f64> = series.values().collect();
    let smoothed = moving_average(&values, ma_window);
    let points = series
        .timestamps()
        .map(|t| seconds_since(origin, t))
        .zip(smoothed)
        .collect();
    let caption = if ma_window > 1 {
        format!("Loadcell raw_value (MA={ma_window})")
    } else {
        "Loadcell raw_value".to_string()
    };

    let root = BitMapBackend::new(path, (style.width, style.height)).into_drawing_area();
    root.fill(&WHITE)?;
    draw_panel(
        &root,
        &caption,
        "Raw Value",
        &[Trace {
            label: "raw_value".to_string(),
            points,
            color: RAW_COLOR,
            markers: false,
        }],
    )?;
    root.present()?;
    log::info!("saved plot to {}", path.display());
    Ok(())
}

/// Two-panel plot: raw and corrected counts, then torque with per-cycle metrics
pub fn render_torque_png(path: &Path, report: &TorqueReport, style: &PlotStyle) -> Result<()> {
    let origin = report
        .rows
        .first()
        .map(|r| r.timestamp)
        .ok_or_else(|| LoadcellError::Plot("no torque rows to plot".to_string()))?;
    let t = |ts| seconds_since(origin, ts);

    let counts = [
        Trace {
            label: "raw counts".to_string(),
            points: report.rows.iter().map(|r| (t(r.timestamp), r.raw_value)).collect(),
            color: RAW_COLOR,
            markers: false,
        },
        Trace {
            label: "adc_corr".to_string(),
            points: report.rows.iter().map(|r| (t(r.timestamp), r.adc_corrected)).collect(),
            color: CORRECTED_COLOR,
            markers: false,
        },
    ];

    let mut torque = vec![Trace {
        label: "torque [N·m]".to_string(),
        points: report.rows.iter().map(|r| (t(r.timestamp), r.torque_nm)).collect(),
        color: TORQUE_COLOR,
        markers: false,
    }];
    let rms: Vec<(f64, f64)> = report
        .cycles
        .iter()
        .filter_map(|c| c.rms.map(|v| (t(c.cycle_start), v)))
        .collect();
    if !rms.is_empty() {
        torque.push(Trace {
            label: "torque RMS [N·m]".to_string(),
            points: rms,
            color: RMS_COLOR,
            markers: true,
        });
    }
    let amplitude: Vec<(f64, f64)> = report
        .cycles
        .iter()
        .filter_map(|c| c.amplitude.map(|v| (t(c.cycle_start), v)))
        .collect();
    if !amplitude.is_empty() {
        torque.push(Trace {
            label: "torque Amp [N·m]".to_string(),
            points: amplitude,
            color: AMPLITUDE_COLOR,
            markers: true,
        });
    }

    let root = BitMapBackend::new(path, (style.width, style.height)).into_drawing_area();
    root.fill(&WHITE)?;
    let panels = root.split_evenly((2, 1));
    draw_panel(&panels[0], "Loadcell Raw and Corrected", "ADC counts", &counts)?;
    draw_panel(&panels[1], "Torque", "N·m", &torque)?;
    root.present()?;
    log::info!("saved plot to {}", path.display());
    Ok(())
}
