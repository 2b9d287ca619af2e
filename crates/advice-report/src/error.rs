/// Errors raised while building or serializing a report.
///
/// Classification itself never fails; malformed advice text degrades into the
/// "general" category instead.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("advice item {item} wraps to {lines} lines, but a page holds at most {max_lines}")]
    LayoutOverflow {
        item: usize,
        lines: usize,
        max_lines: usize,
    },

    #[error("serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ReportError {
    /// Export failures can be retried without re-classifying; layout overflow cannot.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, ReportError::LayoutOverflow { .. })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PredictionError {
    #[error("unknown farming technique code: {0} (expected 1, 2, or 3)")]
    UnknownTechnique(i64),

    #[error("salinity must be a finite number, got {0}")]
    InvalidSalinity(f64),
}
