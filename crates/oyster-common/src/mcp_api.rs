use advice_report::view::AdviceCard;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// The four farm inputs shared by prediction and export tools.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct FarmParams {
    /// Water salinity in parts per thousand (ppt).
    pub salinity: f64,
    /// Farming technique code: 1 = raft, 2 = stake, 3 = both raft and stake.
    pub farming_technique: i64,
    /// Number of typhoons during the production period.
    pub typhoon_count: u32,
    /// Number of floods during the production period.
    pub flood_count: u32,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct PredictProductionParams {
    #[serde(flatten)]
    pub farm: FarmParams,
    /// Skip the advisory model and return the prediction only (default: false).
    pub skip_advice: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ClassifyAdviceParams {
    /// Raw advisory text as returned by a language model.
    pub advice_text: String,
    /// Drop conversational preamble before the first heading (default: true).
    pub extract: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ExportReportParams {
    #[serde(flatten)]
    pub farm: FarmParams,
    /// Advisory text to include in the report.
    pub advice_text: String,
    /// Export format: "pdf" (default), "text" or "cards".
    pub format: Option<String>,
    /// Drop conversational preamble before the first heading (default: true).
    pub extract: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PredictionResponse {
    /// Predicted production in metric tons, never negative.
    pub prediction: f64,
    /// Prediction formatted to two decimals.
    pub prediction_display: String,
    pub technique_name: String,
    pub cards: Vec<AdviceCard>,
    pub plain_text: String,
    /// Set when the advisory model could not be reached; the prediction is still valid.
    pub advisor_error: Option<String>,
    /// Whether the advice came from the cache.
    pub cached: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ClassifyAdviceResponse {
    /// Category keys in the order they were first seen.
    pub categories: Vec<String>,
    pub item_count: usize,
    pub cards: Vec<AdviceCard>,
    pub plain_text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ExportReportResponse {
    /// Absolute path of the written file.
    pub path: String,
    pub file_name: String,
    pub media_type: String,
    pub bytes: usize,
    /// Page count for paginated formats.
    pub page_count: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CategoryInfo {
    pub key: String,
    pub icon: String,
    pub title: String,
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CategoryListResponse {
    pub categories: Vec<CategoryInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct HealthResponse {
    pub status: String,
    pub advisor_configured: bool,
    pub redis_available: bool,
}
