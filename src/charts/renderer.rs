//! Static Chart Renderer
//! Draws charts into in-memory RGB images with plotters.
//!
//! Every chart is painted onto a white `BitMapBackend` buffer which is then
//! handed back as an [`RgbImage`], so callers decide whether to save or
//! display it.

use super::prep::{self, BoxSummary, WindRose, SECTOR_LABELS, SPEED_BINS, WIND_SECTORS};
use super::ChartError;
use crate::stats::{CorrelationMatrix, Profile, TimeSeries};
use image::RgbImage;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

const FONT: &str = "sans-serif";
const TITLE_SIZE: f64 = 24.0;
const LABEL_SIZE: f64 = 14.0;

/// Series colours, one per country or column.
pub const PALETTE: [RGBColor; 6] = [
    RGBColor(52, 152, 219),  // Blue
    RGBColor(231, 76, 60),   // Red
    RGBColor(46, 204, 113),  // Green
    RGBColor(155, 89, 182),  // Purple
    RGBColor(243, 156, 18),  // Orange
    RGBColor(26, 188, 156),  // Teal
];

// Light to dark, one per speed bin
const SPEED_COLORS: [RGBColor; SPEED_BINS] = [
    RGBColor(199, 233, 180),
    RGBColor(127, 205, 187),
    RGBColor(65, 182, 196),
    RGBColor(34, 94, 168),
    RGBColor(37, 52, 148),
];

pub fn series_color(index: usize) -> RGBColor {
    PALETTE[index % PALETTE.len()]
}

fn label_style(h: HPos, v: VPos) -> TextStyle<'static> {
    (FONT, LABEL_SIZE)
        .into_font()
        .color(&BLACK)
        .pos(Pos::new(h, v))
}

pub struct ChartRenderer {
    width: u32,
    height: u32,
}

impl ChartRenderer {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    fn draw<F>(&self, paint: F) -> Result<RgbImage, ChartError>
    where
        F: FnOnce(&DrawingArea<BitMapBackend<'_>, Shift>) -> Result<(), ChartError>,
    {
        let mut buffer = vec![0u8; self.width as usize * self.height as usize * 3];
        {
            let root =
                BitMapBackend::with_buffer(&mut buffer, (self.width, self.height)).into_drawing_area();
            root.fill(&WHITE)?;
            paint(&root)?;
            root.present()?;
        }
        RgbImage::from_raw(self.width, self.height, buffer)
            .ok_or_else(|| ChartError::Render("image buffer size mismatch".to_string()))
    }

    /// Line per column against row order, labelled with timestamps.
    pub fn time_series(&self, title: &str, series: &TimeSeries) -> Result<RgbImage, ChartError> {
        let rows = series.timestamps.len().max(2);
        let (y_min, y_max) =
            prep::value_range(series.series.values().flatten().flatten().copied())
                .unwrap_or((0.0, 1.0));

        self.draw(|root| {
            let mut chart = ChartBuilder::on(root)
                .caption(title, (FONT, TITLE_SIZE))
                .margin(15)
                .x_label_area_size(40)
                .y_label_area_size(60)
                .build_cartesian_2d(0..rows - 1, y_min..y_max)?;

            let stamp = |row: &usize| -> String {
                series
                    .timestamps
                    .get(*row)
                    .cloned()
                    .flatten()
                    .map(|s| s.chars().take(16).collect::<String>())
                    .unwrap_or_default()
            };
            chart
                .configure_mesh()
                .x_labels(6)
                .x_label_formatter(&stamp)
                .draw()?;

            for (index, (name, values)) in series.series.iter().enumerate() {
                let color = series_color(index);
                let mut segments = prep::segments(values).into_iter();
                if let Some(first) = segments.next() {
                    chart
                        .draw_series(LineSeries::new(first, color.stroke_width(1)))?
                        .label(name.as_str())
                        .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
                }
                for segment in segments {
                    chart.draw_series(LineSeries::new(segment, color.stroke_width(1)))?;
                }
            }

            chart
                .configure_series_labels()
                .background_style(WHITE.mix(0.8))
                .border_style(BLACK)
                .draw()?;
            Ok(())
        })
    }

    /// One box per summary, side by side.
    pub fn boxplot(
        &self,
        title: &str,
        y_desc: &str,
        boxes: &[BoxSummary],
    ) -> Result<RgbImage, ChartError> {
        let (y_min, y_max) = prep::value_range(boxes.iter().flat_map(|b| {
            let (low, high) = b.extent();
            [low, high]
        }))
        .unwrap_or((0.0, 1.0));
        let n = boxes.len().max(1) as f64;

        self.draw(|root| {
            let mut chart = ChartBuilder::on(root)
                .caption(title, (FONT, TITLE_SIZE))
                .margin(15)
                .x_label_area_size(40)
                .y_label_area_size(60)
                .build_cartesian_2d(-0.5..n - 0.5, y_min..y_max)?;

            chart
                .configure_mesh()
                .disable_x_mesh()
                .x_label_formatter(&|_: &f64| String::new())
                .y_desc(y_desc)
                .draw()?;

            let below = label_style(HPos::Center, VPos::Top);
            for (i, b) in boxes.iter().enumerate() {
                let x = i as f64;
                let color = series_color(i);

                chart.draw_series([
                    Rectangle::new([(x - 0.3, b.q1), (x + 0.3, b.q3)], color.mix(0.3).filled()),
                    Rectangle::new([(x - 0.3, b.q1), (x + 0.3, b.q3)], color.stroke_width(2)),
                ])?;
                chart.draw_series([
                    PathElement::new(
                        vec![(x - 0.3, b.median), (x + 0.3, b.median)],
                        BLACK.stroke_width(2),
                    ),
                    PathElement::new(vec![(x, b.q3), (x, b.whisker_high)], color),
                    PathElement::new(vec![(x, b.q1), (x, b.whisker_low)], color),
                    PathElement::new(
                        vec![(x - 0.15, b.whisker_high), (x + 0.15, b.whisker_high)],
                        color,
                    ),
                    PathElement::new(
                        vec![(x - 0.15, b.whisker_low), (x + 0.15, b.whisker_low)],
                        color,
                    ),
                ])?;
                chart.draw_series(
                    b.outliers
                        .iter()
                        .map(|&v| Circle::new((x, v), 2, color.mix(0.6).filled())),
                )?;
                chart.draw_series(std::iter::once(Cross::new((x, b.mean), 4, BLACK)))?;

                let (px, py) = chart.backend_coord(&(x, y_min));
                root.draw(&Text::new(
                    format!("{} (n={})", b.label, b.count),
                    (px, py + 8),
                    below.clone(),
                ))?;
            }
            Ok(())
        })
    }

    /// Stacked frequency wedges per direction sector, coloured by speed.
    pub fn wind_rose(&self, title: &str, rose: &WindRose) -> Result<RgbImage, ChartError> {
        self.draw(|root| {
            let area = root.titled(title, (FONT, TITLE_SIZE))?;
            let (w, h) = area.dim_in_pixel();
            let center = (w as i32 / 2 - 60, h as i32 / 2);
            let radius = (w.min(h) as f64 / 2.0 - 40.0).max(10.0);
            let scale = rose.max_sector_frequency().max(f64::EPSILON);
            let width = WindRose::sector_width();

            for ring in 1..=4 {
                let r = radius * ring as f64 / 4.0;
                area.draw(&Circle::new(center, r.round() as i32, BLACK.mix(0.2)))?;
                area.draw(&Text::new(
                    format!("{:.1}%", scale * ring as f64 / 4.0),
                    (center.0 + 4, center.1 - r.round() as i32),
                    (FONT, 12.0),
                ))?;
            }

            let centered = label_style(HPos::Center, VPos::Center);
            for sector in 0..WIND_SECTORS {
                let mid = sector as f64 * width;
                let (a0, a1) = (mid - width * 0.45, mid + width * 0.45);
                let mut inner = 0.0;
                for (bin, color) in SPEED_COLORS.into_iter().enumerate() {
                    let freq = rose.frequency(sector, bin);
                    if freq <= 0.0 {
                        continue;
                    }
                    let outer = inner + freq;
                    let points = wedge(center, radius * inner / scale, radius * outer / scale, a0, a1);
                    area.draw(&Polygon::new(points, color.filled()))?;
                    inner = outer;
                }
                area.draw(&Text::new(
                    SECTOR_LABELS[sector],
                    polar(center, radius + 18.0, mid),
                    centered.clone(),
                ))?;
            }

            let legend_x = w as i32 - 120;
            for (bin, color) in SPEED_COLORS.into_iter().enumerate() {
                let y = 40 + bin as i32 * 22;
                area.draw(&Rectangle::new(
                    [(legend_x, y), (legend_x + 14, y + 14)],
                    color.filled(),
                ))?;
                area.draw(&Text::new(
                    WindRose::speed_label(bin),
                    (legend_x + 20, y),
                    (FONT, LABEL_SIZE),
                ))?;
            }
            Ok(())
        })
    }

    /// Coloured correlation grid with the coefficient in each cell.
    pub fn heatmap(&self, title: &str, matrix: &CorrelationMatrix) -> Result<RgbImage, ChartError> {
        let cells = prep::heatmap_cells(matrix);

        self.draw(|root| {
            let area = root.titled(title, (FONT, TITLE_SIZE))?;
            let (w, h) = area.dim_in_pixel();
            let n = matrix.len().max(1) as i32;
            let (left, top) = (80, 40);
            let cell = ((w as i32 - left - 120) / n)
                .min((h as i32 - top - 20) / n)
                .max(1);

            let centered = label_style(HPos::Center, VPos::Center);
            for c in &cells {
                let x0 = left + c.col as i32 * cell;
                let y0 = top + c.row as i32 * cell;
                let (r, g, b) = c.color;
                area.draw(&Rectangle::new(
                    [(x0, y0), (x0 + cell, y0 + cell)],
                    RGBColor(r, g, b).filled(),
                ))?;
                let text = if c.value.is_nan() {
                    "-".to_string()
                } else {
                    format!("{:.2}", c.value)
                };
                area.draw(&Text::new(
                    text,
                    (x0 + cell / 2, y0 + cell / 2),
                    centered.clone(),
                ))?;
            }

            let row_label = label_style(HPos::Right, VPos::Center);
            let col_label = label_style(HPos::Center, VPos::Bottom);
            for (i, name) in matrix.columns.iter().enumerate() {
                let offset = i as i32 * cell + cell / 2;
                area.draw(&Text::new(
                    name.as_str(),
                    (left - 8, top + offset),
                    row_label.clone(),
                ))?;
                area.draw(&Text::new(
                    name.as_str(),
                    (left + offset, top - 6),
                    col_label.clone(),
                ))?;
            }

            // colour bar, +1 at the top
            let bar_x = left + n * cell + 30;
            let bar_h = n * cell;
            for step in 0..bar_h {
                let value = 1.0 - 2.0 * step as f64 / (bar_h - 1).max(1) as f64;
                let (r, g, b) = prep::diverging_color(value);
                area.draw(&Rectangle::new(
                    [(bar_x, top + step), (bar_x + 16, top + step + 1)],
                    RGBColor(r, g, b).filled(),
                ))?;
            }
            let bar_label = label_style(HPos::Left, VPos::Center);
            for (value, y) in [(1.0, top), (0.0, top + bar_h / 2), (-1.0, top + bar_h)] {
                area.draw(&Text::new(
                    format!("{value:+.1}"),
                    (bar_x + 22, y),
                    bar_label.clone(),
                ))?;
            }
            Ok(())
        })
    }

    /// Mean per calendar bucket, one line per named profile.
    pub fn profiles(
        &self,
        title: &str,
        x_desc: &str,
        x_range: (i32, i32),
        profiles: &[(String, Profile)],
    ) -> Result<RgbImage, ChartError> {
        let (y_min, y_max) = prep::value_range(
            profiles
                .iter()
                .flat_map(|(_, p)| p.points.iter().map(|&(_, v)| v)),
        )
        .unwrap_or((0.0, 1.0));

        self.draw(|root| {
            let mut chart = ChartBuilder::on(root)
                .caption(title, (FONT, TITLE_SIZE))
                .margin(15)
                .x_label_area_size(40)
                .y_label_area_size(60)
                .build_cartesian_2d(x_range.0..x_range.1, y_min..y_max)?;

            chart.configure_mesh().x_desc(x_desc).draw()?;

            for (index, (name, profile)) in profiles.iter().enumerate() {
                let color = series_color(index);
                chart
                    .draw_series(
                        LineSeries::new(profile.points.iter().copied(), color.stroke_width(2))
                            .point_size(3),
                    )?
                    .label(name.as_str())
                    .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
            }

            chart
                .configure_series_labels()
                .background_style(WHITE.mix(0.8))
                .border_style(BLACK)
                .draw()?;
            Ok(())
        })
    }
}

/// Pixel position `r` away from `center` at a compass bearing in degrees.
fn polar(center: (i32, i32), r: f64, degrees: f64) -> (i32, i32) {
    let t = degrees.to_radians();
    (
        center.0 + (r * t.sin()).round() as i32,
        center.1 - (r * t.cos()).round() as i32,
    )
}

/// Annular sector between two radii and two bearings.
fn wedge(center: (i32, i32), r_in: f64, r_out: f64, a0: f64, a1: f64) -> Vec<(i32, i32)> {
    const STEPS: usize = 8;
    let angle = |k: usize| a0 + (a1 - a0) * k as f64 / STEPS as f64;
    let mut points: Vec<(i32, i32)> = (0..=STEPS).map(|k| polar(center, r_out, angle(k))).collect();
    points.extend((0..=STEPS).rev().map(|k| polar(center, r_in, angle(k))));
    points
}
