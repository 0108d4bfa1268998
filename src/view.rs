//! The two observable screens: the live report roster and the report detail
//! with its derived charts. Each view owns its own polling controller; no
//! state is shared between concurrently open views.

use std::time::Duration;

use chrono::{DateTime, NaiveDateTime};

use crate::charts::{
    bullet_panels, donut_segments, headline_metrics, line_chart, merge_series, profile_lines,
    regional_commentary, regional_shares, share_bars, BarRow, BulletPanel, DonutSegment,
    LineChart, MetricCard, PlotFrame,
};
use crate::client::{ApiError, SharedApi};
use crate::model::{RegenAck, Report, ReportStatus, Section};
use crate::poller::{PollSnapshot, PollTarget, PollingController};
use crate::regen::SectionRegenerator;

/// Badge text per status. The match is exhaustive on purpose: a new status
/// variant must be handled at every display site before this compiles.
pub fn status_badge(status: ReportStatus) -> &'static str {
    match status {
        ReportStatus::Queued => "queued",
        ReportStatus::Running => "running",
        ReportStatus::Complete => "complete",
        ReportStatus::Failed => "failed",
    }
}

/// Lenient display formatting for the backend's created_at strings; anything
/// unparseable is shown raw rather than dropped.
pub fn format_created(raw: &str) -> String {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt.format("%Y-%m-%d %H:%M").to_string();
    }
    for pattern in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, pattern) {
            return dt.format("%Y-%m-%d %H:%M").to_string();
        }
    }
    raw.to_string()
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListRow {
    pub id: i64,
    pub industry: String,
    pub geography: String,
    pub status: ReportStatus,
    pub status_badge: &'static str,
    pub progress: String,
    pub created: String,
}

fn list_row(report: &Report) -> ListRow {
    ListRow {
        id: report.id,
        industry: report.industry.clone(),
        geography: report.geography.clone(),
        status: report.status,
        status_badge: status_badge(report.status),
        progress: report.progress_message.clone(),
        created: format_created(&report.created_at),
    }
}

/// Roster screen with live status, bound to the "all reports" target.
pub struct ReportListView {
    poller: PollingController,
}

impl ReportListView {
    pub fn new(api: SharedApi, interval: Duration) -> Self {
        Self { poller: PollingController::new(api, interval) }
    }

    pub fn open(&mut self) {
        self.poller.start(PollTarget::AllReports);
    }

    pub fn close(&mut self) {
        self.poller.stop();
    }

    pub fn ticks(&self) -> u64 {
        self.poller.ticks()
    }

    /// Rows from the latest roster snapshot; empty until the first tick lands.
    pub fn rows(&self) -> Vec<ListRow> {
        match self.poller.latest() {
            Some(PollSnapshot::Roster(reports)) => reports.iter().map(list_row).collect(),
            _ => Vec::new(),
        }
    }
}

/// Everything the detail screen renders, derived in one pure pass.
#[derive(Debug, Clone)]
pub struct DetailScreen {
    pub title: String,
    pub subtitle: String,
    pub status: ReportStatus,
    pub status_line: String,
    pub metrics: [MetricCard; 3],
    pub trend: Option<LineChart>,
    pub type_bars: Vec<BarRow>,
    pub player_donut: Vec<DonutSegment>,
    pub regional_bars: Vec<BarRow>,
    pub regional_commentary: Vec<String>,
    pub panels: Vec<BulletPanel>,
    pub player_profiles: Vec<String>,
    pub narrative: String,
}

/// Pure derivation from report to screen. Absent visuals sub-fields come out
/// as absent charts/panels, never as errors.
pub fn derive_detail(report: &Report) -> DetailScreen {
    let visuals = report.visuals();

    let historical = visuals
        .and_then(|v| v.historical_market_size.as_deref())
        .unwrap_or(&[]);
    let forecast = visuals.and_then(|v| v.forecast_table.as_deref()).unwrap_or(&[]);
    let merged = merge_series(historical, forecast);

    let type_rows = visuals.and_then(|v| v.type_breakup.as_deref()).unwrap_or(&[]);
    let player_rows = visuals.and_then(|v| v.player_market_share.as_deref()).unwrap_or(&[]);
    let regions = visuals.and_then(|v| v.regional_overview.as_deref()).unwrap_or(&[]);
    let profiles = visuals.and_then(|v| v.key_player_profiles.as_deref()).unwrap_or(&[]);

    let narrative = if report.markdown_content.is_empty() {
        "Report not ready yet.".to_string()
    } else {
        report.markdown_content.clone()
    };

    DetailScreen {
        title: format!("{} Report", report.industry),
        subtitle: format!(
            "{} | {} | {}",
            report.geography,
            report.time_horizon,
            report.depth.as_str()
        ),
        status: report.status,
        status_line: format!(
            "Status: {} ({})",
            status_badge(report.status),
            report.progress_message
        ),
        metrics: headline_metrics(report),
        trend: line_chart(&merged, PlotFrame::default()),
        type_bars: share_bars(type_rows),
        player_donut: donut_segments(player_rows),
        regional_bars: share_bars(&regional_shares(regions)),
        regional_commentary: regional_commentary(regions),
        panels: visuals.map(bullet_panels).unwrap_or_default(),
        player_profiles: profile_lines(profiles),
        narrative,
    }
}

/// Detail screen bound to one report id, with the regenerate control.
pub struct ReportDetailView {
    report_id: i64,
    poller: PollingController,
    regen: SectionRegenerator,
    selected: Section,
}

impl ReportDetailView {
    pub fn new(api: SharedApi, interval: Duration, report_id: i64) -> Self {
        Self {
            report_id,
            poller: PollingController::new(api.clone(), interval),
            regen: SectionRegenerator::new(api),
            selected: Section::ExecutiveSummary,
        }
    }

    pub fn open(&mut self) {
        self.poller.start(PollTarget::Report(self.report_id));
    }

    pub fn close(&mut self) {
        self.poller.stop();
    }

    pub fn report_id(&self) -> i64 {
        self.report_id
    }

    pub fn ticks(&self) -> u64 {
        self.poller.ticks()
    }

    pub fn select_section(&mut self, section: Section) {
        self.selected = section;
    }

    pub fn selected_section(&self) -> Section {
        self.selected
    }

    /// The regenerate control should be disabled while this is true.
    pub fn regenerating(&self) -> bool {
        self.regen.is_busy()
    }

    pub fn screen(&self) -> Option<DetailScreen> {
        match self.poller.latest() {
            Some(PollSnapshot::Single(report)) => Some(derive_detail(&report)),
            _ => None,
        }
    }

    /// Regenerate the selected section, then force one immediate re-fetch.
    /// Stale content stays on screen until that re-fetch lands.
    pub async fn regenerate_selected(&self) -> Result<RegenAck, ApiError> {
        self.regen.regenerate(&self.poller, self.report_id, self.selected).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        MarketDynamics, PlayerProfile, RegionRow, ReportDepth, ReportMetadata, ShareRow,
        Visuals, YearValue,
    };

    fn base_report(id: i64) -> Report {
        Report {
            id,
            industry: "AI in Healthcare".to_string(),
            geography: "Global".to_string(),
            time_horizon: "2024-2030".to_string(),
            depth: ReportDepth::InvestorGrade,
            include_financial_forecast: true,
            include_competitive_landscape: true,
            status: ReportStatus::Running,
            progress_message: "Composing report".to_string(),
            markdown_content: String::new(),
            metadata_json: None,
            created_at: "2026-01-15T09:30:00".to_string(),
        }
    }

    fn rich_report(id: i64) -> Report {
        let mut report = base_report(id);
        report.status = ReportStatus::Complete;
        report.progress_message = "Done".to_string();
        report.markdown_content = "# Executive Summary\nStrong growth.".to_string();
        report.metadata_json = Some(ReportMetadata {
            source_count: 12,
            visuals: Some(Visuals {
                current_market_size_usd_billion: Some(45.2),
                cagr_percent: Some(11.8),
                historical_market_size: Some(vec![
                    YearValue { year: 2022, market_size_usd_billion: 32.0 },
                    YearValue { year: 2023, market_size_usd_billion: 38.0 },
                ]),
                forecast_table: Some(vec![
                    YearValue { year: 2023, market_size_usd_billion: 99.0 },
                    YearValue { year: 2024, market_size_usd_billion: 45.2 },
                ]),
                type_breakup: Some(vec![ShareRow {
                    label: "Software".to_string(),
                    share_percent: 55.0,
                }]),
                player_market_share: Some(vec![
                    ShareRow { label: "Acme".to_string(), share_percent: 60.0 },
                    ShareRow { label: "Globex".to_string(), share_percent: 60.0 },
                ]),
                regional_overview: Some(vec![RegionRow {
                    region: "APAC".to_string(),
                    share_percent: 31.0,
                    summary: "Fastest growing".to_string(),
                }]),
                market_dynamics: Some(MarketDynamics {
                    trends: vec!["Edge inference".to_string()],
                    drivers: vec!["Cost pressure".to_string()],
                    barriers: vec![],
                }),
                regulatory_overview: Some(vec!["FDA clearance pathways".to_string()]),
                key_player_profiles: Some(vec![PlayerProfile {
                    company: "Acme".to_string(),
                    profile: "Market leader".to_string(),
                }]),
            }),
        });
        report
    }

    // ==========================================================================
    // Display helpers
    // ==========================================================================

    #[test]
    fn test_status_badges_exhaustive() {
        assert_eq!(status_badge(ReportStatus::Queued), "queued");
        assert_eq!(status_badge(ReportStatus::Running), "running");
        assert_eq!(status_badge(ReportStatus::Complete), "complete");
        assert_eq!(status_badge(ReportStatus::Failed), "failed");
    }

    #[test]
    fn test_format_created_variants() {
        assert_eq!(format_created("2026-01-15T09:30:00"), "2026-01-15 09:30");
        assert_eq!(format_created("2026-01-15T09:30:00.123456"), "2026-01-15 09:30");
        assert_eq!(format_created("2026-01-15T09:30:00+00:00"), "2026-01-15 09:30");
        // Unparseable stays raw.
        assert_eq!(format_created("yesterday"), "yesterday");
    }

    #[test]
    fn test_list_row_projection() {
        let row = list_row(&base_report(3));
        assert_eq!(row.id, 3);
        assert_eq!(row.status_badge, "running");
        assert_eq!(row.progress, "Composing report");
        assert_eq!(row.created, "2026-01-15 09:30");
    }

    // ==========================================================================
    // Detail screen derivation
    // ==========================================================================

    #[test]
    fn test_derive_detail_full_report() {
        let screen = derive_detail(&rich_report(7));

        assert_eq!(screen.title, "AI in Healthcare Report");
        assert_eq!(screen.subtitle, "Global | 2024-2030 | Investor-grade");
        assert_eq!(screen.status_line, "Status: complete (Done)");

        assert_eq!(screen.metrics[0].value, "USD 45.2B");
        assert_eq!(screen.metrics[1].value, "11.8% CAGR");
        assert_eq!(screen.metrics[2].value, "12");

        // Historical wins the 2023 collision; 2024 appended from forecast.
        let trend = screen.trend.unwrap();
        let years: Vec<i32> = trend.points.iter().map(|p| p.year).collect();
        assert_eq!(years, vec![2022, 2023, 2024]);
        assert_eq!(trend.points[1].value, 38.0);

        assert_eq!(screen.type_bars.len(), 1);
        assert_eq!(screen.player_donut[1].end_percent, 120.0);
        assert_eq!(screen.regional_bars[0].label, "APAC");
        assert_eq!(screen.regional_commentary[0], "APAC (31%): Fastest growing");

        let titles: Vec<&str> = screen.panels.iter().map(|p| p.title).collect();
        assert_eq!(titles, vec!["Market Trends", "Market Drivers", "Regulatory Overview"]);

        assert_eq!(screen.player_profiles, vec!["Acme: Market leader".to_string()]);
        assert!(screen.narrative.starts_with("# Executive Summary"));
    }

    #[test]
    fn test_derive_detail_without_visuals() {
        // A queued report with no metadata renders a bare screen: no chart,
        // no panels, placeholder narrative, zeroed metrics.
        let screen = derive_detail(&base_report(1));

        assert!(screen.trend.is_none());
        assert!(screen.type_bars.is_empty());
        assert!(screen.player_donut.is_empty());
        assert!(screen.regional_bars.is_empty());
        assert!(screen.panels.is_empty());
        assert!(screen.player_profiles.is_empty());
        assert_eq!(screen.narrative, "Report not ready yet.");
        assert_eq!(screen.metrics[0].value, "USD 0B");
        assert_eq!(screen.metrics[1].value, "0% CAGR");
        assert_eq!(screen.metrics[2].value, "0");
    }

    #[test]
    fn test_section_selection_defaults_and_updates() {
        let api: SharedApi = std::sync::Arc::new(NullApi);
        let mut view = ReportDetailView::new(api, Duration::from_secs(5), 4);
        assert_eq!(view.selected_section(), Section::ExecutiveSummary);
        view.select_section(Section::RisksAndSensitivity);
        assert_eq!(view.selected_section(), Section::RisksAndSensitivity);
        assert!(!view.regenerating());
    }

    struct NullApi;

    #[async_trait::async_trait]
    impl crate::client::ReportApi for NullApi {
        async fn list_reports(&self) -> Result<Vec<Report>, ApiError> {
            Ok(Vec::new())
        }
        async fn get_report(&self, _id: i64) -> Result<Report, ApiError> {
            Err(ApiError::Transport("null".to_string()))
        }
        async fn report_status(
            &self,
            _id: i64,
        ) -> Result<crate::model::StatusProbe, ApiError> {
            Err(ApiError::Transport("null".to_string()))
        }
        async fn create_report(
            &self,
            _draft: &crate::model::ReportDraft,
        ) -> Result<crate::model::CreatedAck, ApiError> {
            Err(ApiError::Transport("null".to_string()))
        }
        async fn regenerate_section(
            &self,
            _id: i64,
            _section: Section,
        ) -> Result<RegenAck, ApiError> {
            Err(ApiError::Transport("null".to_string()))
        }
        async fn download_pdf(&self, _id: i64) -> Result<Vec<u8>, ApiError> {
            Err(ApiError::Transport("null".to_string()))
        }
    }
}
