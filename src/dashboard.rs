//! HTML dashboard: latest-value cards, trend chart and the raw table.
//!
//! Rendering is a pure function of the rows and the clock, so the page can
//! be produced and checked without a running server. It never fails: an
//! empty store, missing values or a chart error each degrade to a notice.

use chrono::NaiveDateTime;

use crate::chart::{self, Chart};
use crate::models::DashboardRow;

// ---

pub const NO_DATA: &str =
    "No data yet. The collector has to run for at least one interval before readings show up.";
pub const INSUFFICIENT_DATA: &str =
    "Insufficient data for the trend chart. Both temperature and humidity need at least one reading.";

/// Value shown on a summary card.
#[derive(Debug, Clone, PartialEq)]
pub struct Card {
    pub title: &'static str,
    pub display: String,
    pub caption: String,
}

/// Latest temperature and humidity cards, when rows for them exist.
///
/// Rows arrive newest first, so the first row per sensor is the latest.
pub fn summary_cards(rows: &[DashboardRow]) -> Vec<Card> {
    // ---
    let latest_temp = rows.iter().find(|r| r.is_temperature());
    let latest_hum = rows.iter().find(|r| r.is_humidity());

    let mut cards = Vec::new();
    if let Some(row) = latest_temp {
        cards.push(Card {
            title: "Current temperature",
            display: format_value(row.value, 1, &row.unit),
            caption: row.status.clone().unwrap_or_default(),
        });
    }
    if let Some(row) = latest_hum {
        cards.push(Card {
            title: "Current humidity",
            display: format_value(row.value, 0, &row.unit),
            caption: row.status.clone().unwrap_or_default(),
        });
    }
    cards
}

fn format_value(value: Option<f64>, decimals: usize, unit: &str) -> String {
    match value {
        Some(v) => format!("{v:.decimals$} {unit}"),
        None => format!("N/A {unit}"),
    }
}

/// Render the whole page for `rows` as of `now`.
pub fn render_page(location: &str, rows: &[DashboardRow], now: NaiveDateTime) -> String {
    // ---
    let mut html = String::with_capacity(16 * 1024);
    let location = escape_html(location);

    html.push_str(&format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta http-equiv="refresh" content="60">
<title>Weather monitoring: {location}</title>
<style>
body {{ font-family: sans-serif; margin: 2rem; }}
.cards {{ display: flex; gap: 2rem; }}
.card {{ border: 1px solid #ccc; border-radius: 6px; padding: 1rem 1.5rem; min-width: 14rem; }}
.card .value {{ font-size: 2rem; }}
.notice {{ background: #fff4d6; border-left: 4px solid #e0a800; padding: .75rem 1rem; }}
.error {{ background: #fde2e2; border-left: 4px solid #d33; padding: .75rem 1rem; }}
table {{ border-collapse: collapse; }}
td, th {{ border: 1px solid #ddd; padding: .25rem .75rem; }}
</style>
</head>
<body>
<h1>Weather monitoring: {location}</h1>
<p>6-day history, data via HG Brasil API.</p>
<p>Last updated: {updated}</p>
"#,
        updated = now.format("%d/%m/%Y %H:%M:%S"),
    ));

    if rows.is_empty() {
        html.push_str(&format!("<p class=\"notice\">{NO_DATA}</p>\n</body>\n</html>\n"));
        return html;
    }

    html.push_str("<h2>Key indicators</h2>\n<div class=\"cards\">\n");
    for card in summary_cards(rows) {
        html.push_str(&format!(
            "<div class=\"card\"><div>{}</div><div class=\"value\">{}</div><div>{}</div></div>\n",
            card.title,
            escape_html(&card.display),
            escape_html(&card.caption),
        ));
    }
    html.push_str("</div>\n");

    html.push_str("<h2>Temperature and humidity trend</h2>\n");
    html.push_str(&chart_section(rows));

    html.push_str("<h2>Raw data</h2>\n<table>\n");
    html.push_str("<tr><th>Timestamp</th><th>Sensor</th><th>Value</th><th>Unit</th><th>Status</th></tr>\n");
    for row in rows {
        let value = row
            .value
            .map(|v| v.to_string())
            .unwrap_or_else(|| "N/A".to_string());
        html.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            row.timestamp.format("%d/%m/%Y %H:%M:%S"),
            escape_html(&row.sensor_name),
            value,
            escape_html(&row.unit),
            escape_html(row.status.as_deref().unwrap_or("")),
        ));
    }
    html.push_str("</table>\n</body>\n</html>\n");
    html
}

fn chart_section(rows: &[DashboardRow]) -> String {
    // ---
    match chart::render(rows) {
        Ok(Chart::Svg(svg)) => format!("<div class=\"chart\">{svg}</div>\n"),
        Ok(Chart::InsufficientData) => format!("<p class=\"notice\">{INSUFFICIENT_DATA}</p>\n"),
        Err(e) => {
            tracing::error!("Chart rendering failed: {}", e);
            format!(
                "<p class=\"error\">The chart could not be rendered: {}</p>\n",
                escape_html(&e.to_string())
            )
        }
    }
}

/// Escape text for use inside HTML element content and attributes.
pub fn escape_html(raw: &str) -> String {
    // ---
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
