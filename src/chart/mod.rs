//! Chart rendering using plotters.
//!
//! Draws altitude (top) and speed (bottom) against mission time, one line
//! per stage. The same drawing code renders into a PNG file and into an RGB
//! buffer for the live view.

use anyhow::{anyhow, Context, Result};
use plotters::coord::Shift;
use plotters::prelude::*;
use std::path::Path;

use crate::telemetry::{Field, TelemetrySeries};

const TIME_LABEL: &str = "Time [s]";
const ALTITUDE_LABEL: &str = "Altitude [km]";
const SPEED_LABEL: &str = "Speed [km/h]";

/// Line color of a stage: cyan for the first, red for the second.
pub fn stage_color(stage: usize) -> RGBColor {
    match stage {
        0 => CYAN,
        1 => RED,
        _ => MAGENTA,
    }
}

/// Legend text of a stage (0-based index).
pub fn stage_label(stage: usize) -> String {
    let n = stage + 1;
    let suffix = match (n % 10, n % 100) {
        (1, r) if r != 11 => "st",
        (2, r) if r != 12 => "nd",
        (3, r) if r != 13 => "rd",
        _ => "th",
    };
    format!("{}{} Stage", n, suffix)
}

/// Renders the chart into a tightly packed RGB buffer of `width * height * 3` bytes.
pub fn render_to_buffer(series: &TelemetrySeries, width: u32, height: u32) -> Result<Vec<u8>> {
    if width == 0 || height == 0 {
        return Err(anyhow!("Chart size must not be empty ({}x{})", width, height));
    }
    let mut buffer = vec![0u8; (width * height * 3) as usize];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
        draw_chart(&root, series)?;
        root.present().context("Failed to render chart")?;
    }
    Ok(buffer)
}

/// Renders the chart into a PNG file.
pub fn render_to_file(series: &TelemetrySeries, path: &Path, width: u32, height: u32) -> Result<()> {
    let root = BitMapBackend::new(path, (width, height)).into_drawing_area();
    draw_chart(&root, series)?;
    root.present()
        .with_context(|| format!("Failed to save chart {}", path.display()))?;
    Ok(())
}

fn draw_chart(root: &DrawingArea<BitMapBackend, Shift>, series: &TelemetrySeries) -> Result<()> {
    root.fill(&WHITE).context("Failed to fill chart background")?;

    // Nothing to scale the axes to yet
    if series.is_empty() {
        return Ok(());
    }

    let panels = root.split_evenly((2, 1));
    draw_panel(&panels[0], series, Field::Altitude, ALTITUDE_LABEL)?;
    draw_panel(&panels[1], series, Field::Speed, SPEED_LABEL)?;
    Ok(())
}

fn draw_panel(
    area: &DrawingArea<BitMapBackend, Shift>,
    series: &TelemetrySeries,
    field: Field,
    y_desc: &str,
) -> Result<()> {
    let (Some((x_min, x_max)), Some((y_min, y_max))) =
        (series.time_range(), series.value_range(field))
    else {
        return Ok(());
    };

    let mut chart = ChartBuilder::on(area)
        .margin(8)
        .x_label_area_size(30)
        .y_label_area_size(55)
        .build_cartesian_2d(x_min..x_max, y_min..y_max)
        .context("Failed to build chart")?;

    chart
        .configure_mesh()
        .x_desc(TIME_LABEL)
        .y_desc(y_desc)
        .x_label_formatter(&|x| format!("{:.0}", x))
        .y_label_formatter(&|y| format!("{:.0}", y))
        .draw()
        .context("Failed to draw mesh")?;

    for (stage, values) in series.values(field).iter().enumerate() {
        let color = stage_color(stage);
        chart
            .draw_series(LineSeries::new(
                series.times.iter().copied().zip(values.iter().copied()),
                color.stroke_width(2),
            ))?
            .label(stage_label(stage))
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2)));
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperLeft)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .context("Failed to draw legend")?;

    Ok(())
}
