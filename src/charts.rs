//! Pure derivation of renderable chart primitives from a report's visuals
//! payload. Every function is total: missing or empty input produces an
//! empty/neutral result, never an error.

use crate::model::{PlayerProfile, RegionRow, Report, ShareRow, Visuals, YearValue};

/// Fixed rendering palette; rows take `index % PALETTE.len()`.
pub const PALETTE: [&str; 6] =
    ["#0f766e", "#0369a1", "#1d4ed8", "#7c3aed", "#b45309", "#0e7490"];

pub fn color_at(index: usize) -> &'static str {
    PALETTE[index % PALETTE.len()]
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesPoint {
    pub year: i32,
    pub value: f64,
}

/// Merge historical and forecast series for the trend line.
///
/// Concatenation then filter: historical points keep their values and order
/// and win year collisions; forecast years not already present are appended
/// in their source order. No re-sort by year happens here.
pub fn merge_series(historical: &[YearValue], forecast: &[YearValue]) -> Vec<SeriesPoint> {
    let mut merged: Vec<SeriesPoint> = historical
        .iter()
        .map(|p| SeriesPoint { year: p.year, value: p.market_size_usd_billion })
        .collect();
    for point in forecast {
        if !historical.iter().any(|h| h.year == point.year) {
            merged.push(SeriesPoint { year: point.year, value: point.market_size_usd_billion });
        }
    }
    merged
}

/// Plotting rectangle for the line chart.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlotFrame {
    pub width: f64,
    pub height: f64,
    pub padding: f64,
}

impl Default for PlotFrame {
    fn default() -> Self {
        Self { width: 720.0, height: 280.0, padding: 40.0 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlotPoint {
    pub x: f64,
    pub y: f64,
    pub year: i32,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LineChart {
    pub frame: PlotFrame,
    pub points: Vec<PlotPoint>,
}

/// Map a merged series onto frame coordinates by linear interpolation.
///
/// The value axis spans min(0, min(values)) .. max(1, max(values)) with a
/// floor of 1 on the span, so zero-variance and single-point series still
/// plot. An empty series yields no chart.
pub fn line_chart(series: &[SeriesPoint], frame: PlotFrame) -> Option<LineChart> {
    if series.is_empty() {
        return None;
    }

    let max_value = series.iter().map(|p| p.value).fold(1.0_f64, f64::max);
    let min_value = series.iter().map(|p| p.value).fold(0.0_f64, f64::min);
    let span = (max_value - min_value).max(1.0);

    let inner_width = frame.width - frame.padding * 2.0;
    let inner_height = frame.height - frame.padding * 2.0;
    let step_denom = series.len().saturating_sub(1).max(1) as f64;

    let points = series
        .iter()
        .enumerate()
        .map(|(idx, p)| PlotPoint {
            x: frame.padding + idx as f64 * inner_width / step_denom,
            y: frame.height - frame.padding - (p.value - min_value) / span * inner_height,
            year: p.year,
            value: p.value,
        })
        .collect();

    Some(LineChart { frame, points })
}

/// One horizontal bar. The width is `share_percent` applied directly as a
/// percentage of the container; totals are not renormalized to 100.
#[derive(Debug, Clone, PartialEq)]
pub struct BarRow {
    pub label: String,
    pub share_percent: f64,
    pub color: &'static str,
}

pub fn share_bars(rows: &[ShareRow]) -> Vec<BarRow> {
    rows.iter()
        .enumerate()
        .map(|(idx, row)| BarRow {
            label: row.label.clone(),
            share_percent: row.share_percent,
            color: color_at(idx),
        })
        .collect()
}

/// One donut arc spanning [start_percent, end_percent] of the circle.
#[derive(Debug, Clone, PartialEq)]
pub struct DonutSegment {
    pub label: String,
    pub share_percent: f64,
    pub start_percent: f64,
    pub end_percent: f64,
    pub color: &'static str,
}

/// Cumulative arc boundaries in input order. A total above 100 extends past
/// the full circle; it is not clamped or renormalized.
pub fn donut_segments(rows: &[ShareRow]) -> Vec<DonutSegment> {
    let mut start = 0.0;
    rows.iter()
        .enumerate()
        .map(|(idx, row)| {
            let end = start + row.share_percent;
            let segment = DonutSegment {
                label: row.label.clone(),
                share_percent: row.share_percent,
                start_percent: start,
                end_percent: end,
                color: color_at(idx),
            };
            start = end;
            segment
        })
        .collect()
}

/// Regional rows reduced to label/share pairs for bar rendering.
pub fn regional_shares(rows: &[RegionRow]) -> Vec<ShareRow> {
    rows.iter()
        .map(|r| ShareRow { label: r.region.clone(), share_percent: r.share_percent })
        .collect()
}

/// Regional commentary lines: "Region (share%): summary".
pub fn regional_commentary(rows: &[RegionRow]) -> Vec<String> {
    rows.iter()
        .map(|r| format!("{} ({}%): {}", r.region, r.share_percent, r.summary))
        .collect()
}

/// Player profile lines: "Company: profile".
pub fn profile_lines(profiles: &[PlayerProfile]) -> Vec<String> {
    profiles.iter().map(|p| format!("{}: {}", p.company, p.profile)).collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct BulletPanel {
    pub title: &'static str,
    pub items: Vec<String>,
}

/// Flatten the textual visuals into ordered bullet panels. Absent or empty
/// sequences produce no panel at all rather than placeholder text.
pub fn bullet_panels(visuals: &Visuals) -> Vec<BulletPanel> {
    let mut panels = Vec::new();
    if let Some(dynamics) = &visuals.market_dynamics {
        for (title, items) in [
            ("Market Trends", &dynamics.trends),
            ("Market Drivers", &dynamics.drivers),
            ("Market Barriers", &dynamics.barriers),
        ] {
            if !items.is_empty() {
                panels.push(BulletPanel { title, items: items.clone() });
            }
        }
    }
    if let Some(items) = &visuals.regulatory_overview {
        if !items.is_empty() {
            panels.push(BulletPanel { title: "Regulatory Overview", items: items.clone() });
        }
    }
    panels
}

/// One headline stat card above the charts.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricCard {
    pub label: &'static str,
    pub value: String,
}

/// The three headline cards: market size, growth rate, source count.
/// Absent fields display as zero, matching the backend's progressive fill.
pub fn headline_metrics(report: &Report) -> [MetricCard; 3] {
    let visuals = report.visuals();
    let market_size =
        visuals.and_then(|v| v.current_market_size_usd_billion).unwrap_or(0.0);
    let cagr = visuals.and_then(|v| v.cagr_percent).unwrap_or(0.0);
    [
        MetricCard { label: "Current Market Size", value: format!("USD {}B", market_size) },
        MetricCard { label: "Growth Rate", value: format!("{}% CAGR", cagr) },
        MetricCard { label: "Research Sources", value: report.source_count().to_string() },
    ]
}
