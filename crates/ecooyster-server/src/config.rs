use std::path::PathBuf;

use crate::error::AppError;

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Redis connection URL (e.g. "redis://127.0.0.1:6379"). `None` disables caching.
    pub redis_url: Option<String>,
    /// Directory that `export_report` writes into.
    pub output_dir: PathBuf,
}

impl Config {
    /// Optional:
    /// - `REDIS_URL`: Redis connection string
    /// - `REPORT_OUTPUT_DIR`: export directory, created if missing (default: system temp dir)
    ///
    /// Advisor settings are read separately by `AdvisorConfig::from_env`.
    pub fn from_env() -> Result<Self, AppError> {
        let output_dir = std::env::var_os("REPORT_OUTPUT_DIR")
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(std::env::temp_dir);

        Self::new(std::env::var("REDIS_URL").ok(), output_dir)
    }

    pub fn new(redis_url: Option<String>, output_dir: PathBuf) -> Result<Self, AppError> {
        std::fs::create_dir_all(&output_dir).map_err(|e| {
            AppError::Config(format!(
                "cannot create report output directory {}: {e}",
                output_dir.display()
            ))
        })?;
        if !output_dir.is_dir() {
            return Err(AppError::Config(format!(
                "report output path is not a directory: {}",
                output_dir.display()
            )));
        }

        Ok(Self {
            redis_url,
            output_dir,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_missing_output_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let nested = tmp.path().join("reports").join("2026");
        let config = Config::new(None, nested.clone()).unwrap();
        assert!(nested.is_dir());
        assert_eq!(config.output_dir, nested);
    }

    #[test]
    fn rejects_file_as_output_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("not-a-dir");
        std::fs::write(&file, b"x").unwrap();
        let err = Config::new(None, file).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }
}
