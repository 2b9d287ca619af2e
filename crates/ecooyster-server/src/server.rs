use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Local;
use rmcp::{
    Json, ServerHandler,
    handler::server::router::tool::ToolRouter,
    handler::server::wrapper::Parameters,
    model::*,
    tool, tool_handler, tool_router,
};
use tracing::{info, warn};

use crate::cache::AdviceCache;
use crate::config::Config;
use crate::error::AppError;
use crate::prompt::advice_messages;
use advice_report::classifier::{classify, ClassifiedAdvice};
use advice_report::error::ReportError;
use advice_report::extract::extract_recommendations;
use advice_report::plain_text::to_plain_text;
use advice_report::prediction::{predict, FarmInputs, NumericResult};
use advice_report::registry::CategoryRegistry;
use advice_report::report::ReportInput;
use advice_report::surface::{Export, ExportFormat};
use advice_report::view::render_cards;
use oyster_common::advisor::AdvisorClient;
use oyster_common::mcp_api::{
    CategoryInfo, CategoryListResponse, ClassifyAdviceParams, ClassifyAdviceResponse,
    ExportReportParams, ExportReportResponse, FarmParams, HealthResponse,
    PredictProductionParams, PredictionResponse,
};

static STAGING_SEQ: AtomicU64 = AtomicU64::new(0);

#[derive(Clone)]
pub struct EcoOysterServer {
    advisor: Arc<AdvisorClient>,
    cache: Arc<AdviceCache>,
    output_dir: PathBuf,
    tool_router: ToolRouter<EcoOysterServer>,
}

impl EcoOysterServer {
    pub fn new(advisor: Arc<AdvisorClient>, cache: Arc<AdviceCache>, config: &Config) -> Self {
        Self {
            advisor,
            cache,
            output_dir: config.output_dir.clone(),
            tool_router: Self::tool_router(),
        }
    }

    /// Advisory text for `result`, from the cache when possible.
    ///
    /// Returns the text and whether it was a cache hit.
    async fn fetch_advice(&self, result: &NumericResult) -> Result<(String, bool), AppError> {
        let model = &self.advisor.config().model;
        if let Some(text) = self.cache.get_advice(model, &result.inputs).await {
            return Ok((text, true));
        }

        let text = self.advisor.complete(&advice_messages(result)).await?;
        self.cache.set_advice(model, &result.inputs, &text).await;
        Ok((text, false))
    }
}

#[tool_router]
impl EcoOysterServer {
    #[tool(description = "Predict oyster production (metric tons) from salinity, farming technique, typhoon and flood counts, and return categorized AI recommendations.")]
    async fn predict_production(
        &self,
        Parameters(params): Parameters<PredictProductionParams>,
    ) -> Result<Json<PredictionResponse>, String> {
        let inputs = farm_inputs(&params.farm).map_err(|e| e.to_string())?;
        let result = predict(inputs);
        info!(
            prediction = result.value(),
            technique = %inputs.technique,
            "prediction computed"
        );

        let (raw, advisor_error, cached) = if params.skip_advice.unwrap_or(false) {
            (String::new(), None, false)
        } else {
            match self.fetch_advice(&result).await {
                Ok((text, cached)) => (text, None, cached),
                Err(e) => {
                    warn!(error = %e, "advisory request failed, returning prediction only");
                    (String::new(), Some(e.to_string()), false)
                }
            }
        };

        let advice = classify_text(&raw, true);

        Ok(Json(PredictionResponse {
            prediction: result.value(),
            prediction_display: result.display_value(),
            technique_name: inputs.technique.name().to_string(),
            cards: render_cards(&advice),
            plain_text: to_plain_text(&advice),
            advisor_error,
            cached,
        }))
    }

    #[tool(description = "Classify free-form advisory text into categories and return display cards plus clipboard text.")]
    async fn classify_advice(
        &self,
        Parameters(params): Parameters<ClassifyAdviceParams>,
    ) -> Result<Json<ClassifyAdviceResponse>, String> {
        let advice = classify_text(&params.advice_text, params.extract.unwrap_or(true));

        Ok(Json(ClassifyAdviceResponse {
            categories: advice.keys().map(str::to_string).collect(),
            item_count: advice.item_count(),
            cards: render_cards(&advice),
            plain_text: to_plain_text(&advice),
        }))
    }

    #[tool(description = "Export a prediction report with the given advice as 'pdf' (default), 'text' or 'cards' into the report output directory.")]
    async fn export_report(
        &self,
        Parameters(params): Parameters<ExportReportParams>,
    ) -> Result<Json<ExportReportResponse>, String> {
        let format: ExportFormat = params.format.as_deref().unwrap_or("pdf").parse()?;
        let inputs = farm_inputs(&params.farm).map_err(|e| e.to_string())?;
        let result = predict(inputs);
        let advice = classify_text(&params.advice_text, params.extract.unwrap_or(true));
        let input = ReportInput {
            result: &result,
            advice: &advice,
            generated_at: Local::now().naive_local(),
        };

        let (path, export) = export_to_dir(&self.output_dir, format, &input)
            .map_err(|e| format!("export failed: {e}"))?;
        info!(
            path = %path.display(),
            bytes = export.bytes.len(),
            pages = ?export.page_count,
            "report exported"
        );

        Ok(Json(ExportReportResponse {
            path: path.display().to_string(),
            file_name: export.file_name,
            media_type: export.media_type.to_string(),
            bytes: export.bytes.len(),
            page_count: export.page_count,
        }))
    }

    #[tool(description = "List the built-in advice categories with their icons, titles and keywords.")]
    async fn list_categories(&self) -> Result<Json<CategoryListResponse>, String> {
        let categories = CategoryRegistry::builtins()
            .iter()
            .map(|c| CategoryInfo {
                key: c.key.to_string(),
                icon: c.icon.to_string(),
                title: c.title.to_string(),
                keywords: c.keywords.iter().map(|k| k.to_string()).collect(),
            })
            .collect();

        Ok(Json(CategoryListResponse { categories }))
    }

    #[tool(description = "Report server health: advisor configuration and Redis availability.")]
    async fn health_check(&self) -> Result<Json<HealthResponse>, String> {
        Ok(Json(HealthResponse {
            status: "healthy".to_string(),
            advisor_configured: self.advisor.config().api_key.is_some(),
            redis_available: self.cache.is_available().await,
        }))
    }
}

/// Classify advice text, optionally trimming model preamble first.
fn classify_text(text: &str, extract: bool) -> ClassifiedAdvice {
    if extract {
        classify(&extract_recommendations(text))
    } else {
        classify(text)
    }
}

fn farm_inputs(params: &FarmParams) -> Result<FarmInputs, AppError> {
    Ok(FarmInputs::new(
        params.salinity,
        params.farming_technique,
        params.typhoon_count,
        params.flood_count,
    )?)
}

/// Render `input` as `format` and move the file into `dir` in one step.
fn export_to_dir(
    dir: &Path,
    format: ExportFormat,
    input: &ReportInput<'_>,
) -> Result<(PathBuf, Export), AppError> {
    let export = format.surface().export(input)?;
    let path = write_atomically(dir, &export.file_name, &export.bytes).map_err(ReportError::from)?;
    Ok((path, export))
}

fn write_atomically(dir: &Path, file_name: &str, bytes: &[u8]) -> std::io::Result<PathBuf> {
    commit_staged(dir, file_name, |staging| std::fs::write(staging, bytes))
}

/// Run `write` against a hidden sibling, then rename it over the target.
///
/// Readers never see a partial file, and a failed write or rename leaves no
/// staging file behind.
fn commit_staged(
    dir: &Path,
    file_name: &str,
    write: impl FnOnce(&Path) -> std::io::Result<()>,
) -> std::io::Result<PathBuf> {
    let target = dir.join(file_name);
    let seq = STAGING_SEQ.fetch_add(1, Ordering::Relaxed);
    let staging = dir.join(format!(".{file_name}.{}-{seq}.partial", std::process::id()));

    if let Err(e) = write(&staging).and_then(|()| std::fs::rename(&staging, &target)) {
        let _ = std::fs::remove_file(&staging);
        return Err(e);
    }
    Ok(target)
}

#[tool_handler]
impl ServerHandler for EcoOysterServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2025_06_18,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "ecooyster".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                title: None,
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "EcoOyster MCP server. Use predict_production to estimate oyster production and \
                 get categorized recommendations, classify_advice to structure existing advice \
                 text, export_report to write a PDF, text or JSON report, list_categories to see \
                 the advice categories, and health_check to inspect dependencies."
                    .to_string(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const ADVICE: &str = "Sure, here you go.\n**Salinity Management**\n- Keep salinity near 20 ppt\n### Production Timing\n1. Harvest before the rainy season";

    #[test]
    fn tools_publish_output_schemas() {
        let tools = EcoOysterServer::tool_router().list_all();
        for name in [
            "predict_production",
            "classify_advice",
            "export_report",
            "list_categories",
            "health_check",
        ] {
            let tool = tools
                .iter()
                .find(|t| t.name == name)
                .unwrap_or_else(|| panic!("missing tool: {name}"));
            assert!(
                tool.output_schema.is_some(),
                "tool {name} should publish output_schema"
            );
        }
    }

    #[test]
    fn farm_inputs_rejects_unknown_technique() {
        let params = FarmParams {
            salinity: 20.0,
            farming_technique: 4,
            typhoon_count: 0,
            flood_count: 0,
        };
        let err = farm_inputs(&params).unwrap_err();
        assert!(matches!(err, AppError::Prediction(_)));
    }

    #[test]
    fn export_writes_pdf_and_leaves_no_staging_files() {
        let dir = tempfile::tempdir().unwrap();
        let result = predict(FarmInputs::new(22.5, 1, 2, 1).unwrap());
        let advice = classify(&extract_recommendations(ADVICE));
        let input = ReportInput {
            result: &result,
            advice: &advice,
            generated_at: NaiveDate::from_ymd_opt(2026, 10, 17)
                .and_then(|d| d.and_hms_opt(9, 30, 0))
                .unwrap(),
        };

        let (path, export) = export_to_dir(dir.path(), ExportFormat::Pdf, &input).unwrap();
        assert_eq!(path, dir.path().join("EcoOyster_Report_2026-10-17.pdf"));
        assert_eq!(export.page_count, Some(1));
        assert_eq!(std::fs::read(&path).unwrap(), export.bytes);

        let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn failed_export_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let result = predict(FarmInputs::new(22.5, 1, 0, 0).unwrap());
        let advice = classify(&format!("- {}", "w".repeat(20_000)));
        let input = ReportInput {
            result: &result,
            advice: &advice,
            generated_at: Local::now().naive_local(),
        };

        let err = export_to_dir(dir.path(), ExportFormat::Pdf, &input).unwrap_err();
        assert!(matches!(err, AppError::Report(ReportError::LayoutOverflow { .. })));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn interrupted_write_leaves_no_staging_file() {
        use std::io::Write;

        let dir = tempfile::tempdir().unwrap();
        let err = commit_staged(dir.path(), "report.pdf", |staging| {
            let mut file = std::fs::File::create(staging)?;
            file.write_all(b"%PDF-1.4\n half")?;
            Err(std::io::Error::other("no space left on device"))
        })
        .unwrap_err();

        assert_eq!(err.to_string(), "no space left on device");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn export_classification_honours_extract_flag() {
        let raw = "Here is a long friendly preamble sentence.\n**Salinity Management**\n– Keep salinity between 15 and 25 ppt\n· Dilute with river water at high tide";

        let extracted = classify_text(raw, true);
        assert_eq!(extracted.keys().collect::<Vec<_>>(), ["salinity"]);
        assert_eq!(extracted.item_count(), 2);

        let verbatim = classify_text(raw, false);
        assert_eq!(verbatim.keys().collect::<Vec<_>>(), ["general", "salinity"]);
        assert_eq!(verbatim.item_count(), 3);
    }

    #[test]
    fn rewriting_replaces_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        write_atomically(dir.path(), "report.txt", b"first").unwrap();
        let path = write_atomically(dir.path(), "report.txt", b"second").unwrap();
        assert_eq!(std::fs::read(path).unwrap(), b"second");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
