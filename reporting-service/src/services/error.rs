use service_core::error::AppError;
use thiserror::Error;

/// Failures of a single report run.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ReportError {
    #[error("Invalid reporting month '{0}': expected a month name from September to August")]
    InvalidMonth(String),

    #[error("Invalid fiscal year: {0}")]
    InvalidFiscalYear(i32),

    #[error("Failed to fetch spreadsheet data: {0}")]
    DataFetch(String),

    #[error("Unexpected spreadsheet layout: {0}")]
    Parse(String),
}

impl ReportError {
    /// Stable label used in logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ReportError::InvalidMonth(_) => "invalid_month",
            ReportError::InvalidFiscalYear(_) => "invalid_fiscal_year",
            ReportError::DataFetch(_) => "data_fetch_error",
            ReportError::Parse(_) => "parse_error",
        }
    }

    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ReportError::InvalidMonth(_) | ReportError::InvalidFiscalYear(_)
        )
    }
}

impl From<ReportError> for AppError {
    fn from(err: ReportError) -> Self {
        match err {
            ReportError::InvalidMonth(_) | ReportError::InvalidFiscalYear(_) => {
                AppError::BadRequest(anyhow::anyhow!(err.to_string()))
            }
            ReportError::DataFetch(_) => AppError::BadGateway(err.to_string()),
            ReportError::Parse(_) => AppError::InternalError(anyhow::anyhow!(err.to_string())),
        }
    }
}
