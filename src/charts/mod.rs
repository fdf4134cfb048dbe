//! Chart rendering for planning tables.
//!
//! A [`ChartSpec`] maps table columns onto a bar, horizontal-bar, line or
//! scatter chart. Charts are drawn with the [`plotters`] bitmap backend and
//! saved as PNG files, 1200x800 unless [`ChartSpec::size`] overrides it.

pub mod festival;
pub mod palette;

use plotters::coord::types::RangedCoordf64;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::path::Path;
use thiserror::Error;
use tracing::debug;

use crate::table::Table;
use palette::{PRIMARY, color_for};

/// Errors that can occur during chart generation
#[derive(Error, Debug)]
pub enum ChartError {
    #[error("Failed to create drawing area: {0}")]
    DrawingArea(String),

    #[error("Failed to configure chart: {0}")]
    ChartConfig(String),

    #[error("Failed to draw chart elements: {0}")]
    Drawing(String),

    #[error("Table has no rows to chart")]
    EmptyTable,

    #[error("Unknown column '{0}'")]
    UnknownColumn(String),

    #[error("Column '{column}' row {row} is not numeric")]
    NotNumeric { column: String, row: usize },

    #[error("Invalid chart size {0}x{1}")]
    InvalidSize(u32, u32),
}

type Result<T> = core::result::Result<T, ChartError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    Bar,
    HorizontalBar,
    Line,
    Scatter,
}

/// Column mapping and presentation options for one chart.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSpec {
    pub kind: ChartKind,
    pub x_field: String,
    pub y_field: String,
    /// Category column looked up in the shared palette.
    pub color_field: Option<String>,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub size: (u32, u32),
    /// Print each bar's value next to it.
    pub show_values: bool,
}

impl ChartSpec {
    pub fn new(kind: ChartKind, x_field: &str, y_field: &str) -> Self {
        Self {
            kind,
            x_field: x_field.to_string(),
            y_field: y_field.to_string(),
            color_field: None,
            title: String::new(),
            x_label: x_field.to_string(),
            y_label: y_field.to_string(),
            size: (1200, 800),
            show_values: false,
        }
    }

    pub fn title(mut self, title: &str) -> Self {
        self.title = title.to_string();
        self
    }

    pub fn axis_labels(mut self, x_label: &str, y_label: &str) -> Self {
        self.x_label = x_label.to_string();
        self.y_label = y_label.to_string();
        self
    }

    pub fn color_by(mut self, field: &str) -> Self {
        self.color_field = Some(field.to_string());
        self
    }

    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.size = (width, height);
        self
    }

    pub fn with_values(mut self) -> Self {
        self.show_values = true;
        self
    }
}

/// One plotted row: category label, value and resolved color.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartPoint {
    pub label: String,
    pub value: f64,
    pub category: Option<String>,
    pub color: RGBColor,
}

/// Resolves the rows of `table` into plot points, validating the spec.
///
/// Nothing is written; every validation failure of [`render_chart`]
/// surfaces here.
pub fn chart_points(table: &Table, spec: &ChartSpec) -> Result<Vec<ChartPoint>> {
    let (width, height) = spec.size;
    if width == 0 || height == 0 {
        return Err(ChartError::InvalidSize(width, height));
    }
    if table.row_count() == 0 {
        return Err(ChartError::EmptyTable);
    }

    let column = |name: &str| {
        table
            .column(name)
            .map_err(|_| ChartError::UnknownColumn(name.to_string()))
    };
    let xs = column(&spec.x_field)?;
    let ys = column(&spec.y_field)?;
    let categories = spec.color_field.as_deref().map(column).transpose()?;

    let mut points = Vec::with_capacity(table.row_count());
    for (row, (x, y)) in xs.cells().iter().zip(ys.cells()).enumerate() {
        let value = y.as_f64().ok_or_else(|| ChartError::NotNumeric {
            column: spec.y_field.clone(),
            row,
        })?;

        let category = categories.map(|c| c.cells()[row].to_string());
        let color = match category.as_deref() {
            Some(label) => color_for(label).unwrap_or_else(|| {
                debug!(label, "No palette entry, using primary color");
                PRIMARY
            }),
            None => PRIMARY,
        };

        points.push(ChartPoint {
            label: x.to_string(),
            value,
            category,
            color,
        });
    }

    Ok(points)
}

/// Renders `table` as described by `spec` and saves it as a PNG at `path`.
pub fn render_chart(table: &Table, spec: &ChartSpec, path: &Path) -> Result<()> {
    let points = chart_points(table, spec)?;

    debug!(
        path = %path.display(),
        kind = ?spec.kind,
        points = points.len(),
        "Rendering chart"
    );

    let root = BitMapBackend::new(path, spec.size);
    let drawing_area = root.into_drawing_area();

    drawing_area
        .fill(&WHITE)
        .map_err(|e| ChartError::DrawingArea(e.to_string()))?;

    match spec.kind {
        ChartKind::Bar => draw_bars(&drawing_area, spec, &points)?,
        ChartKind::HorizontalBar => draw_horizontal_bars(&drawing_area, spec, &points)?,
        ChartKind::Line => draw_points(&drawing_area, spec, &points, true)?,
        ChartKind::Scatter => draw_points(&drawing_area, spec, &points, false)?,
    }

    drawing_area
        .present()
        .map_err(|e| ChartError::Drawing(e.to_string()))?;

    Ok(())
}

type Area<'a> = DrawingArea<BitMapBackend<'a>, plotters::coord::Shift>;

/// Category label for an axis position; blank between categories.
fn label_at(labels: &[String], position: f64) -> String {
    let index = position.round();
    if (position - index).abs() > 0.01 || index < 0.0 {
        return String::new();
    }
    labels.get(index as usize).cloned().unwrap_or_default()
}

fn format_value(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.1}")
    }
}

/// Upper axis bound with headroom for value labels.
fn value_ceiling(points: &[ChartPoint]) -> f64 {
    let max = points.iter().map(|p| p.value).fold(0.0, f64::max);
    if max <= 0.0 { 1.0 } else { max * 1.12 }
}

fn draw_bars(area: &Area<'_>, spec: &ChartSpec, points: &[ChartPoint]) -> Result<()> {
    let n = points.len() as f64;
    let labels: Vec<String> = points.iter().map(|p| p.label.clone()).collect();
    let y_max = value_ceiling(points);

    let mut chart = ChartBuilder::on(area)
        .caption(&spec.title, ("sans-serif", 40))
        .margin(20)
        .x_label_area_size(60)
        .y_label_area_size(85)
        .build_cartesian_2d(-0.5..n - 0.5, 0.0..y_max)
        .map_err(|e| ChartError::ChartConfig(e.to_string()))?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(points.len())
        .x_label_formatter(&|x| label_at(&labels, *x))
        .x_desc(spec.x_label.as_str())
        .y_desc(spec.y_label.as_str())
        .label_style(("sans-serif", 16))
        .draw()
        .map_err(|e| ChartError::Drawing(e.to_string()))?;

    chart
        .draw_series(points.iter().enumerate().map(|(i, p)| {
            let x = i as f64;
            Rectangle::new([(x - 0.4, 0.0), (x + 0.4, p.value)], p.color.filled())
        }))
        .map_err(|e| ChartError::Drawing(e.to_string()))?;

    if spec.show_values {
        let style = ("sans-serif", 18)
            .into_font()
            .color(&BLACK)
            .pos(Pos::new(HPos::Center, VPos::Bottom));
        chart
            .draw_series(points.iter().enumerate().map(|(i, p)| {
                Text::new(format_value(p.value), (i as f64, p.value), style.clone())
            }))
            .map_err(|e| ChartError::Drawing(e.to_string()))?;
    }

    draw_legend(&mut chart, points)
}

/// First row is drawn at the top.
fn draw_horizontal_bars(area: &Area<'_>, spec: &ChartSpec, points: &[ChartPoint]) -> Result<()> {
    let n = points.len() as f64;
    let labels: Vec<String> = points.iter().rev().map(|p| p.label.clone()).collect();
    let x_max = value_ceiling(points);
    let position = |i: usize| n - 1.0 - i as f64;

    let mut chart = ChartBuilder::on(area)
        .caption(&spec.title, ("sans-serif", 40))
        .margin(20)
        .x_label_area_size(60)
        .y_label_area_size(220)
        .build_cartesian_2d(0.0..x_max, -0.5..n - 0.5)
        .map_err(|e| ChartError::ChartConfig(e.to_string()))?;

    chart
        .configure_mesh()
        .disable_y_mesh()
        .y_labels(points.len())
        .y_label_formatter(&|y| label_at(&labels, *y))
        .x_desc(spec.y_label.as_str())
        .y_desc(spec.x_label.as_str())
        .label_style(("sans-serif", 16))
        .draw()
        .map_err(|e| ChartError::Drawing(e.to_string()))?;

    chart
        .draw_series(points.iter().enumerate().map(|(i, p)| {
            let y = position(i);
            Rectangle::new([(0.0, y - 0.4), (p.value, y + 0.4)], p.color.filled())
        }))
        .map_err(|e| ChartError::Drawing(e.to_string()))?;

    if spec.show_values {
        let style = ("sans-serif", 18)
            .into_font()
            .color(&BLACK)
            .pos(Pos::new(HPos::Left, VPos::Center));
        chart
            .draw_series(points.iter().enumerate().map(|(i, p)| {
                Text::new(format!(" {}", format_value(p.value)), (p.value, position(i)), style.clone())
            }))
            .map_err(|e| ChartError::Drawing(e.to_string()))?;
    }

    draw_legend(&mut chart, points)
}

fn draw_points(
    area: &Area<'_>,
    spec: &ChartSpec,
    points: &[ChartPoint],
    connect: bool,
) -> Result<()> {
    let n = points.len() as f64;
    let labels: Vec<String> = points.iter().map(|p| p.label.clone()).collect();
    let y_min = points.iter().map(|p| p.value).fold(0.0, f64::min);
    let y_max = value_ceiling(points);

    let mut chart = ChartBuilder::on(area)
        .caption(&spec.title, ("sans-serif", 40))
        .margin(20)
        .x_label_area_size(60)
        .y_label_area_size(85)
        .build_cartesian_2d(-0.5..n - 0.5, y_min..y_max)
        .map_err(|e| ChartError::ChartConfig(e.to_string()))?;

    chart
        .configure_mesh()
        .x_labels(points.len())
        .x_label_formatter(&|x| label_at(&labels, *x))
        .x_desc(spec.x_label.as_str())
        .y_desc(spec.y_label.as_str())
        .label_style(("sans-serif", 16))
        .draw()
        .map_err(|e| ChartError::Drawing(e.to_string()))?;

    if connect {
        chart
            .draw_series(LineSeries::new(
                points.iter().enumerate().map(|(i, p)| (i as f64, p.value)),
                PRIMARY.stroke_width(3),
            ))
            .map_err(|e| ChartError::Drawing(e.to_string()))?;
    }

    chart
        .draw_series(
            points
                .iter()
                .enumerate()
                .map(|(i, p)| Circle::new((i as f64, p.value), 7, p.color.filled())),
        )
        .map_err(|e| ChartError::Drawing(e.to_string()))?;

    draw_legend(&mut chart, points)
}

/// One legend entry per distinct category, in first-seen order.
fn draw_legend<'a>(
    chart: &mut ChartContext<'a, BitMapBackend<'a>, Cartesian2d<RangedCoordf64, RangedCoordf64>>,
    points: &[ChartPoint],
) -> Result<()> {
    let mut seen: Vec<(&str, RGBColor)> = Vec::new();
    for point in points {
        if let Some(category) = point.category.as_deref() {
            if !seen.iter().any(|(label, _)| *label == category) {
                seen.push((category, point.color));
            }
        }
    }
    if seen.is_empty() {
        return Ok(());
    }

    for (label, color) in seen {
        chart
            .draw_series(std::iter::empty::<Circle<(f64, f64), i32>>())
            .map_err(|e| ChartError::Drawing(e.to_string()))?
            .label(label)
            .legend(move |(x, y)| Rectangle::new([(x, y - 6), (x + 14, y + 6)], color.filled()));
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .background_style(WHITE.mix(0.85))
        .border_style(&BLACK)
        .label_font(("sans-serif", 18))
        .draw()
        .map_err(|e| ChartError::Drawing(e.to_string()))?;

    Ok(())
}
