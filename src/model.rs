use serde::{Deserialize, Serialize};

/// Generation depth requested at report creation. Fixed by the backend schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportDepth {
    Basic,
    Professional,
    #[serde(rename = "Investor-grade")]
    InvestorGrade,
}

impl ReportDepth {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportDepth::Basic => "Basic",
            ReportDepth::Professional => "Professional",
            ReportDepth::InvestorGrade => "Investor-grade",
        }
    }
}

/// Server-side generation lifecycle. Mutated only by the backend; this client
/// observes it and never writes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportStatus {
    Queued,
    Running,
    Complete,
    Failed,
}

impl ReportStatus {
    pub fn is_terminal(&self) -> bool {
        match self {
            ReportStatus::Queued | ReportStatus::Running => false,
            ReportStatus::Complete | ReportStatus::Failed => true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct YearValue {
    pub year: i32,
    pub market_size_usd_billion: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShareRow {
    pub label: String,
    pub share_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionRow {
    pub region: String,
    pub share_percent: f64,
    #[serde(default)]
    pub summary: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketDynamics {
    #[serde(default)]
    pub trends: Vec<String>,
    #[serde(default)]
    pub drivers: Vec<String>,
    #[serde(default)]
    pub barriers: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerProfile {
    pub company: String,
    #[serde(default)]
    pub profile: String,
}

/// Structured visualization payload. Every field is independently absent until
/// the backend computes it; absence is a displayable state, never an error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Visuals {
    #[serde(default)]
    pub current_market_size_usd_billion: Option<f64>,
    #[serde(default)]
    pub cagr_percent: Option<f64>,
    #[serde(default)]
    pub historical_market_size: Option<Vec<YearValue>>,
    #[serde(default)]
    pub forecast_table: Option<Vec<YearValue>>,
    #[serde(default)]
    pub type_breakup: Option<Vec<ShareRow>>,
    #[serde(default)]
    pub player_market_share: Option<Vec<ShareRow>>,
    #[serde(default)]
    pub regional_overview: Option<Vec<RegionRow>>,
    #[serde(default)]
    pub market_dynamics: Option<MarketDynamics>,
    #[serde(default)]
    pub regulatory_overview: Option<Vec<String>>,
    #[serde(default)]
    pub key_player_profiles: Option<Vec<PlayerProfile>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportMetadata {
    #[serde(default)]
    pub source_count: u64,
    #[serde(default)]
    pub visuals: Option<Visuals>,
}

/// One generated research report as the backend serves it. Read-only here
/// except for triggering section regeneration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub id: i64,
    pub industry: String,
    pub geography: String,
    pub time_horizon: String,
    pub depth: ReportDepth,
    #[serde(default)]
    pub include_financial_forecast: bool,
    #[serde(default)]
    pub include_competitive_landscape: bool,
    pub status: ReportStatus,
    #[serde(default)]
    pub progress_message: String,
    #[serde(default)]
    pub markdown_content: String,
    #[serde(default)]
    pub metadata_json: Option<ReportMetadata>,
    #[serde(default)]
    pub created_at: String,
}

impl Report {
    pub fn visuals(&self) -> Option<&Visuals> {
        self.metadata_json.as_ref().and_then(|m| m.visuals.as_ref())
    }

    pub fn source_count(&self) -> u64 {
        self.metadata_json.as_ref().map(|m| m.source_count).unwrap_or(0)
    }
}

/// Narrative subdivisions eligible for independent regeneration. Wire names
/// are fixed; the backend is authoritative beyond this presentation set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    ExecutiveSummary,
    MarketOverview,
    CompetitiveLandscape,
    FinancialForecastTable,
    RisksAndSensitivity,
}

impl Section {
    pub const ALL: [Section; 5] = [
        Section::ExecutiveSummary,
        Section::MarketOverview,
        Section::CompetitiveLandscape,
        Section::FinancialForecastTable,
        Section::RisksAndSensitivity,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Section::ExecutiveSummary => "Executive Summary",
            Section::MarketOverview => "Market Overview",
            Section::CompetitiveLandscape => "Competitive Landscape",
            Section::FinancialForecastTable => "Financial Forecast Table (5-year)",
            Section::RisksAndSensitivity => "Risks & Sensitivity",
        }
    }

    pub fn parse(name: &str) -> Option<Section> {
        Section::ALL.iter().copied().find(|s| s.as_str().eq_ignore_ascii_case(name.trim()))
    }
}

/// Creation payload. Validation mirrors the backend schema so bad drafts are
/// rejected before any request is sent.
#[derive(Debug, Clone, Serialize)]
pub struct ReportDraft {
    pub industry: String,
    pub geography: String,
    pub time_horizon: String,
    pub depth: ReportDepth,
    pub include_financial_forecast: bool,
    pub include_competitive_landscape: bool,
}

impl ReportDraft {
    /// Backend minimums: industry/geography >= 2 chars, time_horizon >= 3.
    pub fn validate(&self) -> Result<(), String> {
        if self.industry.trim().chars().count() < 2 {
            return Err("industry must be at least 2 characters".to_string());
        }
        if self.geography.trim().chars().count() < 2 {
            return Err("geography must be at least 2 characters".to_string());
        }
        if self.time_horizon.trim().chars().count() < 3 {
            return Err("time_horizon must be at least 3 characters".to_string());
        }
        Ok(())
    }
}

impl Default for ReportDraft {
    fn default() -> Self {
        Self {
            industry: "AI in Healthcare".to_string(),
            geography: "Global".to_string(),
            time_horizon: "2024-2030".to_string(),
            depth: ReportDepth::Professional,
            include_financial_forecast: true,
            include_competitive_landscape: true,
        }
    }
}

/// Reduced body returned by POST /reports.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatedAck {
    pub id: i64,
    pub status: ReportStatus,
}

/// Reduced body returned by POST /reports/{id}/regenerate-section.
#[derive(Debug, Clone, Deserialize)]
pub struct RegenAck {
    pub id: i64,
    pub status: ReportStatus,
    #[serde(default)]
    pub message: String,
}

/// Reduced body returned by GET /reports/{id}/status.
#[derive(Debug, Clone, Deserialize)]
pub struct StatusProbe {
    pub id: i64,
    pub status: ReportStatus,
    #[serde(default)]
    pub message: String,
}
