use serde::Deserialize;

pub const DEFAULT_ACTION_TYPE: &str = "run_monthly_report";

fn default_action_type() -> String {
    DEFAULT_ACTION_TYPE.to_string()
}

/// Body of `POST /run-report`.
#[derive(Debug, Clone, Deserialize)]
pub struct ReportRequest {
    /// English month name, `September` through `August`.
    pub reporting_month: String,
    /// Accepted for compatibility; has no effect.
    #[serde(default = "default_action_type")]
    pub action_type: String,
    /// Overrides the configured fiscal year.
    #[serde(default)]
    pub fiscal_year: Option<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optional_fields_default() {
        let req: ReportRequest = serde_json::from_str(r#"{"reporting_month": "March"}"#).unwrap();
        assert_eq!(req.reporting_month, "March");
        assert_eq!(req.action_type, DEFAULT_ACTION_TYPE);
        assert_eq!(req.fiscal_year, None);
    }

    #[test]
    fn reporting_month_is_required() {
        assert!(serde_json::from_str::<ReportRequest>(r#"{"fiscal_year": 2025}"#).is_err());
    }
}
