//! Configuration module for reporting-service.

use crate::models::category::AccountCategories;
use crate::models::rows::ActualsLayout;
use crate::services::google_auth::ServiceAccountKey;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;
use std::str::FromStr;

pub const FISCAL_YEAR_PLACEHOLDER: &str = "{fiscal_year}";

#[derive(Debug, Clone)]
pub struct ReportingConfig {
    pub common: core_config::Config,
    pub google: GoogleConfig,
    pub report: ReportSettings,
    pub categories: AccountCategories,
    pub cors: CorsConfig,
}

#[derive(Debug, Clone)]
pub struct GoogleConfig {
    pub service_account: ServiceAccountKey,
    /// Skips the Drive lookup when set.
    pub spreadsheet_id: Option<String>,
    pub spreadsheet_name: String,
    pub sheets_api_base: String,
    pub drive_api_base: String,
    pub http_timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportSettings {
    /// Budget tab name; `{fiscal_year}` is replaced by the requested year.
    pub budget_tab: String,
    pub actuals_tab: String,
    pub actuals_layout: ActualsLayout,
    /// Used when a request does not name a fiscal year.
    pub fiscal_year: i32,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            budget_tab: "FY{fiscal_year}Budget".to_string(),
            actuals_tab: "AccountTransactions".to_string(),
            actuals_layout: ActualsLayout::default(),
            fiscal_year: 2025,
        }
    }
}

impl ReportSettings {
    pub fn budget_tab_for(&self, fiscal_year: i32) -> String {
        self.budget_tab
            .replace(FISCAL_YEAR_PLACEHOLDER, &fiscal_year.to_string())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CorsConfig {
    /// Empty means any origin.
    pub allowed_origins: Vec<String>,
}

impl ReportingConfig {
    pub fn load() -> Result<Self, AppError> {
        // Load common config (handles .env and APP__ prefix)
        let common = core_config::Config::load()?;

        let is_prod = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string()) == "prod";
        let defaults = ReportSettings::default();

        let service_account_json = get_env("GOOGLE_SERVICE_ACCOUNT", None, is_prod)?;
        let service_account = ServiceAccountKey::from_json(&service_account_json).map_err(|e| {
            AppError::ConfigError(anyhow::anyhow!(
                "GOOGLE_SERVICE_ACCOUNT is not a valid service account key: {}",
                e
            ))
        })?;

        let fiscal_year_default = defaults.fiscal_year.to_string();
        let header_row_default = defaults.actuals_layout.header_row.to_string();

        Ok(Self {
            common,
            google: GoogleConfig {
                service_account,
                spreadsheet_id: optional_env("SHEETS_SPREADSHEET_ID"),
                spreadsheet_name: get_env(
                    "SHEETS_SPREADSHEET_NAME",
                    Some("BRFC Financial Reporting Analysis"),
                    is_prod,
                )?,
                sheets_api_base: get_env(
                    "SHEETS_API_BASE",
                    Some("https://sheets.googleapis.com/v4"),
                    is_prod,
                )?,
                drive_api_base: get_env(
                    "DRIVE_API_BASE",
                    Some("https://www.googleapis.com/drive/v3"),
                    is_prod,
                )?,
                http_timeout_secs: parse_env(
                    "HTTP_TIMEOUT_SECS",
                    &get_env("HTTP_TIMEOUT_SECS", Some("30"), is_prod)?,
                )?,
            },
            report: ReportSettings {
                budget_tab: get_env("BUDGET_TAB", Some(defaults.budget_tab.as_str()), is_prod)?,
                actuals_tab: get_env("ACTUALS_TAB", Some(defaults.actuals_tab.as_str()), is_prod)?,
                actuals_layout: ActualsLayout {
                    header_row: parse_env(
                        "ACTUALS_HEADER_ROW",
                        &get_env("ACTUALS_HEADER_ROW", Some(header_row_default.as_str()), is_prod)?,
                    )?,
                    day_first: parse_bool(
                        "ACTUALS_DAY_FIRST",
                        &get_env("ACTUALS_DAY_FIRST", Some("false"), is_prod)?,
                    )?,
                },
                fiscal_year: parse_env(
                    "REPORT_FISCAL_YEAR",
                    &get_env("REPORT_FISCAL_YEAR", Some(fiscal_year_default.as_str()), is_prod)?,
                )?,
            },
            categories: load_categories(optional_env("ACCOUNT_CATEGORIES_FILE"))?,
            cors: CorsConfig {
                allowed_origins: optional_env("CORS_ALLOWED_ORIGINS")
                    .map(|raw| parse_origins(&raw))
                    .unwrap_or_default(),
            },
        })
    }
}

/// Shipped lists unless a file is named; a named file must pass validation.
fn load_categories(path: Option<String>) -> Result<AccountCategories, AppError> {
    let Some(path) = path else {
        return Ok(AccountCategories::default());
    };

    let categories = AccountCategories::from_file(&path)?;
    categories.validate().map_err(|e| {
        AppError::ConfigError(anyhow::anyhow!("Invalid account categories in {}: {}", path, e))
    })?;

    tracing::info!(path = %path, "Loaded account categories from file");
    Ok(categories)
}

pub fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}

fn optional_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|val| !val.trim().is_empty())
}

fn parse_env<T>(key: &str, raw: &str) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e: T::Err| {
        AppError::ConfigError(anyhow::anyhow!("{} has an invalid value '{}': {}", key, raw, e))
    })
}

fn parse_bool(key: &str, raw: &str) -> Result<bool, AppError> {
    match raw.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(AppError::ConfigError(anyhow::anyhow!(
            "{} must be true or false, got '{}'",
            key,
            raw
        ))),
    }
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(format!(
                    "{} is required in production but not set",
                    key
                ))))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(format!(
                    "{} is required but not set",
                    key
                ))))
            }
        }
    }
}
