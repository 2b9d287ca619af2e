use advice_report::error::{PredictionError, ReportError};
use oyster_common::advisor::AdvisorError;
use oyster_common::error::CommonError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(String),

    #[error(transparent)]
    Common(#[from] CommonError),

    #[error("report error: {0}")]
    Report(#[from] ReportError),

    #[error("invalid input: {0}")]
    Prediction(#[from] PredictionError),

    #[error("advisor error: {0}")]
    Advisor(#[from] AdvisorError),
}
