#![allow(dead_code)]

use async_trait::async_trait;
use axum::Router;
use reporting_service::config::{CorsConfig, GoogleConfig, ReportSettings, ReportingConfig};
use reporting_service::models::AccountCategories;
use reporting_service::services::google_auth::ServiceAccountKey;
use reporting_service::services::{ReportError, ReportService, SheetRows, SheetSource};
use reporting_service::startup::{build_router, Application};
use reporting_service::AppState;
use serde_json::{json, Value};
use service_core::config::Config as CoreConfig;
use std::collections::HashMap;
use std::sync::Arc;

pub const TEST_PRIVATE_KEY: &str = include_str!("../fixtures/service_account_key.pem");
pub const BUDGET_TAB: &str = "FY2025Budget";
pub const ACTUALS_TAB: &str = "AccountTransactions";

const MONTHS: [&str; 12] = [
    "September", "October", "November", "December", "January", "February", "March", "April",
    "May", "June", "July", "August",
];

/// In-memory spreadsheet keyed by tab name.
pub struct StaticSheets {
    tabs: HashMap<String, SheetRows>,
    failure: Option<ReportError>,
}

impl StaticSheets {
    pub fn new() -> Self {
        Self {
            tabs: HashMap::new(),
            failure: None,
        }
    }

    pub fn with_tab(mut self, name: &str, rows: SheetRows) -> Self {
        self.tabs.insert(name.to_string(), rows);
        self
    }

    pub fn failing(error: ReportError) -> Self {
        Self {
            tabs: HashMap::new(),
            failure: Some(error),
        }
    }

    /// Budget and actuals tabs holding the reference data set.
    pub fn reference() -> Self {
        Self::new()
            .with_tab(BUDGET_TAB, budget_grid())
            .with_tab(ACTUALS_TAB, actuals_grid())
    }
}

#[async_trait]
impl SheetSource for StaticSheets {
    async fn fetch_tabs(&self, tabs: &[&str]) -> Result<Vec<SheetRows>, ReportError> {
        if let Some(err) = &self.failure {
            return Err(err.clone());
        }
        tabs.iter()
            .map(|tab| {
                self.tabs.get(*tab).cloned().ok_or_else(|| {
                    ReportError::DataFetch(format!("Unable to parse range: '{}'", tab))
                })
            })
            .collect()
    }
}

fn monthly_row(account: &str, per_month: &str) -> Vec<Value> {
    let mut row = vec![json!(account)];
    row.extend(MONTHS.iter().map(|_| json!(per_month)));
    row
}

/// Twelve equal months per account, so a YTD is `per_month * elapsed`.
///
/// Through March (7 months): income 700, cost of goods 140, driver 35,
/// other income 70 and operating expense 350.
pub fn budget_grid() -> SheetRows {
    let mut header = vec![json!("Account")];
    header.extend(MONTHS.iter().map(|m| json!(m)));
    header.push(json!("Total"));

    vec![
        header,
        monthly_row("Clubhouse Sales", "100"),
        monthly_row("Cost of Clubhouse Sales", "20"),
        monthly_row("Bank Card Fees", "5"),
        monthly_row("Rental Income", "10"),
        monthly_row("Wages", "50"),
        vec![],
    ]
}

/// Ledger export with three preamble rows before the header.
///
/// Through March FY2025: income 1000, cost of goods -200, driver -50, other
/// income 30 and operating expense -100.
pub fn actuals_grid() -> SheetRows {
    vec![
        vec![json!("Account Transactions")],
        vec![json!("BRFC")],
        vec![json!("September 2024 - August 2025")],
        vec![
            json!("Date"),
            json!("Source"),
            json!("Account Name"),
            json!("Description"),
            json!("Net"),
        ],
        vec![json!("2024-10-01"), json!("Till"), json!("Clubhouse Sales"), json!(""), json!("1,000.00")],
        vec![json!("11/01/2024"), json!("Bill"), json!("Cost of Clubhouse Sales"), json!(""), json!("(200.00)")],
        vec![json!("01 Dec 2024"), json!("Bank"), json!("Bank Card Fees"), json!(""), json!("-50")],
        vec![json!(45658), json!("Till"), json!("Kit Sales"), json!(""), json!("30")],
        vec![json!("2025-02-01"), json!("Bill"), json!(" Insurance "), json!(""), json!("(100)")],
        vec![json!("2025-04-01"), json!("Till"), json!("Clubhouse Sales"), json!(""), json!("9,999")],
        vec![json!("2024-08-31"), json!("Till"), json!("Clubhouse Sales"), json!(""), json!("9,999")],
        vec![json!("Total"), json!(""), json!(""), json!(""), json!("680")],
    ]
}

pub fn service_account_json(token_uri: &str) -> String {
    json!({
        "type": "service_account",
        "client_email": "reports@brfc-test.iam.gserviceaccount.com",
        "private_key": TEST_PRIVATE_KEY,
        "private_key_id": "test-key-id",
        "token_uri": token_uri,
    })
    .to_string()
}

/// Configuration for tests: random port, Google endpoints under `google_base`.
pub fn test_config(google_base: &str) -> ReportingConfig {
    let service_account =
        ServiceAccountKey::from_json(&service_account_json(&format!("{}/token", google_base)))
            .expect("Failed to parse test service account");

    ReportingConfig {
        common: CoreConfig {
            port: 0,
            log_level: "debug".to_string(),
            otlp_endpoint: None,
        },
        google: GoogleConfig {
            service_account,
            spreadsheet_id: None,
            spreadsheet_name: "BRFC Financial Reporting Analysis".to_string(),
            sheets_api_base: google_base.to_string(),
            drive_api_base: format!("{}/drive/v3", google_base),
            http_timeout_secs: 5,
        },
        report: ReportSettings::default(),
        categories: AccountCategories::default(),
        cors: CorsConfig::default(),
    }
}

pub fn router_with(source: StaticSheets) -> Router {
    let reports = ReportService::new(
        Arc::new(source),
        AccountCategories::default(),
        ReportSettings::default(),
    );
    build_router(AppState { reports }, &CorsConfig::default())
}

pub struct TestApp {
    pub address: String,
    pub port: u16,
}

impl TestApp {
    pub async fn spawn_with(config: ReportingConfig, source: Option<StaticSheets>) -> Self {
        let app = match source {
            Some(source) => Application::build_with_source(config, Arc::new(source)).await,
            None => Application::build(config).await,
        }
        .expect("Failed to build test application");

        let port = app.port();
        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Wait for the server by polling the health endpoint
        let client = reqwest::Client::new();
        let health_url = format!("http://127.0.0.1:{}/health", port);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        }

        TestApp {
            address: format!("http://127.0.0.1:{}", port),
            port,
        }
    }

    pub async fn spawn(source: StaticSheets) -> Self {
        Self::spawn_with(test_config("http://127.0.0.1:9"), Some(source)).await
    }
}
