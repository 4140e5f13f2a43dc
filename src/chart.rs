//! Dual-axis trend chart rendered to an SVG string with `plotters`.
//!
//! Temperature uses the left axis, humidity the right axis (fixed 0–100).
//! Elevated-temperature readings are drawn again as larger red points.

use std::error::Error;

use chrono::{Duration, NaiveDateTime};
use plotters::coord::types::RangedDateTime;
use plotters::prelude::*;

use crate::models::DashboardRow;

// ---

const WIDTH: u32 = 960;
const HEIGHT: u32 = 420;

/// Result of trying to draw the trend chart.
#[derive(Debug, Clone, PartialEq)]
pub enum Chart {
    Svg(String),
    /// One of the two series has no plottable point.
    InsufficientData,
}

/// Series extracted from dashboard rows, oldest first, missing values dropped.
#[derive(Debug, Default, PartialEq)]
pub struct Series {
    pub temperature: Vec<(NaiveDateTime, f64)>,
    pub humidity: Vec<(NaiveDateTime, f64)>,
    pub alerts: Vec<(NaiveDateTime, f64)>,
}

impl Series {
    pub fn from_rows(rows: &[DashboardRow]) -> Self {
        // ---
        let mut series = Series::default();
        for row in rows {
            let Some(value) = row.value else { continue };
            let point = (row.timestamp, value);
            if row.is_temperature() {
                series.temperature.push(point);
                if row.is_alert() {
                    series.alerts.push(point);
                }
            } else if row.is_humidity() {
                series.humidity.push(point);
            }
        }
        for points in [
            &mut series.temperature,
            &mut series.humidity,
            &mut series.alerts,
        ] {
            points.sort_by_key(|(ts, _)| *ts);
        }
        series
    }

    fn time_range(&self) -> (NaiveDateTime, NaiveDateTime) {
        // ---
        let mut all = self
            .temperature
            .iter()
            .chain(self.humidity.iter())
            .map(|(ts, _)| *ts);
        let first = all.next().unwrap_or_default();
        let (min, max) = all.fold((first, first), |(min, max), ts| (min.min(ts), max.max(ts)));
        if min == max {
            (min - Duration::hours(1), max + Duration::hours(1))
        } else {
            (min, max)
        }
    }

    fn temperature_range(&self) -> (f64, f64) {
        // ---
        let (min, max) = self
            .temperature
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), (_, t)| {
                (min.min(*t), max.max(*t))
            });
        let padding = if (max - min).abs() > 1e-6 {
            (max - min) * 0.1
        } else {
            1.0
        };
        (min - padding, max + padding)
    }
}

/// Render the chart, or report that there is not enough data for it.
pub fn render(rows: &[DashboardRow]) -> Result<Chart, Box<dyn Error>> {
    // ---
    let series = Series::from_rows(rows);
    if series.temperature.is_empty() || series.humidity.is_empty() {
        return Ok(Chart::InsufficientData);
    }

    let mut svg = String::new();
    draw(&mut svg, &series)?;
    Ok(Chart::Svg(svg))
}

fn draw(svg: &mut String, series: &Series) -> Result<(), Box<dyn Error>> {
    // ---
    let (start, end) = series.time_range();
    let (t_min, t_max) = series.temperature_range();

    let root = SVGBackend::with_string(svg, (WIDTH, HEIGHT)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("6-day temperature and humidity history", ("sans-serif", 18))
        .margin(12)
        .x_label_area_size(48)
        .y_label_area_size(56)
        .right_y_label_area_size(56)
        .build_cartesian_2d(RangedDateTime::from(start..end), t_min..t_max)?
        .set_secondary_coord(RangedDateTime::from(start..end), 0f64..100f64);

    chart
        .configure_mesh()
        .x_desc("Reading time")
        .y_desc("Temperature (°C)")
        .x_labels(8)
        .x_label_formatter(&|dt: &NaiveDateTime| dt.format("%d/%m %H:%M").to_string())
        .light_line_style(BLACK.mix(0.1))
        .draw()?;

    chart
        .configure_secondary_axes()
        .y_desc("Humidity (%)")
        .draw()?;

    chart
        .draw_series(LineSeries::new(series.temperature.iter().copied(), BLUE))?
        .label("Temperature (°C)")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLUE));
    chart.draw_series(
        series
            .temperature
            .iter()
            .map(|&point| Circle::new(point, 3, BLUE.filled())),
    )?;

    if !series.alerts.is_empty() {
        chart
            .draw_series(
                series
                    .alerts
                    .iter()
                    .map(|&point| Circle::new(point, 6, RED.filled())),
            )?
            .label("Temperature alert")
            .legend(|(x, y)| Circle::new((x + 10, y), 4, RED.filled()));
    }

    chart
        .draw_secondary_series(LineSeries::new(series.humidity.iter().copied(), GREEN))?
        .label("Humidity (%)")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], GREEN));
    chart.draw_secondary_series(
        series
            .humidity
            .iter()
            .map(|&point| Circle::new(point, 3, GREEN.filled())),
    )?;

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperLeft)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    root.present()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use crate::models::{HUMIDITY_SENSOR_ID, TEMPERATURE_SENSOR_ID};
    use chrono::NaiveDate;

    fn at(day: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, day)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn row(sensor_id: i64, ts: NaiveDateTime, value: Option<f64>, status: &str) -> DashboardRow {
        DashboardRow {
            timestamp: ts,
            sensor_id,
            sensor_name: format!("sensor {sensor_id}"),
            value,
            unit: String::new(),
            status: Some(status.to_string()),
        }
    }

    #[test]
    fn test_series_split_and_sorted() {
        // ---
        let rows = vec![
            row(TEMPERATURE_SENSOR_ID, at(2, 10), Some(31.0), "Elevated"),
            row(HUMIDITY_SENSOR_ID, at(2, 10), Some(40.0), "Sol"),
            row(TEMPERATURE_SENSOR_ID, at(1, 10), Some(20.0), "Normal"),
            row(HUMIDITY_SENSOR_ID, at(1, 10), None, "Nublado"),
        ];

        let series = Series::from_rows(&rows);
        assert_eq!(series.temperature, vec![(at(1, 10), 20.0), (at(2, 10), 31.0)]);
        assert_eq!(series.humidity, vec![(at(2, 10), 40.0)]);
        assert_eq!(series.alerts, vec![(at(2, 10), 31.0)]);
    }

    #[test]
    fn test_insufficient_data() {
        // ---
        let rows = vec![row(TEMPERATURE_SENSOR_ID, at(1, 10), Some(20.0), "Normal")];
        assert_eq!(render(&rows).unwrap(), Chart::InsufficientData);
        assert_eq!(render(&[]).unwrap(), Chart::InsufficientData);
    }

    #[test]
    fn test_renders_svg() {
        // ---
        let rows = vec![
            row(TEMPERATURE_SENSOR_ID, at(1, 10), Some(20.0), "Normal"),
            row(TEMPERATURE_SENSOR_ID, at(1, 12), Some(32.5), "Elevated"),
            row(HUMIDITY_SENSOR_ID, at(1, 10), Some(70.0), "Nublado"),
            row(HUMIDITY_SENSOR_ID, at(1, 12), Some(55.0), "Sol"),
        ];

        match render(&rows).unwrap() {
            Chart::Svg(svg) => {
                assert!(svg.contains("<svg"));
                assert!(svg.contains("Humidity (%)"));
            }
            other => panic!("expected svg, got {other:?}"),
        }
    }

    #[test]
    fn test_single_point_range_is_padded() {
        // ---
        let rows = vec![
            row(TEMPERATURE_SENSOR_ID, at(1, 10), Some(20.0), "Normal"),
            row(HUMIDITY_SENSOR_ID, at(1, 10), Some(70.0), "Nublado"),
        ];
        let series = Series::from_rows(&rows);
        assert_eq!(series.time_range(), (at(1, 9), at(1, 11)));
        assert_eq!(series.temperature_range(), (19.0, 21.0));
        assert!(matches!(render(&rows).unwrap(), Chart::Svg(_)));
    }
}
