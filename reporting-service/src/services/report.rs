//! One report run: resolve the period, read both tabs, aggregate.

use std::sync::Arc;

use super::error::ReportError;
use super::sheets::SheetSource;
use crate::config::ReportSettings;
use crate::models::category::AccountCategories;
use crate::models::fiscal::ReportingPeriod;
use crate::models::kpi::{CategoryTotals, KpiReport};
use crate::models::rows::{parse_actuals, parse_budget};

#[derive(Clone)]
pub struct ReportService {
    source: Arc<dyn SheetSource>,
    categories: Arc<AccountCategories>,
    settings: ReportSettings,
}

impl ReportService {
    pub fn new(
        source: Arc<dyn SheetSource>,
        categories: AccountCategories,
        settings: ReportSettings,
    ) -> Self {
        Self {
            source,
            categories: Arc::new(categories),
            settings,
        }
    }

    /// Builds the KPI report for `reporting_month` of `fiscal_year`, or of
    /// the configured default year when none is given.
    ///
    /// The month is validated before any spreadsheet traffic.
    pub async fn run(
        &self,
        reporting_month: &str,
        fiscal_year: Option<i32>,
    ) -> Result<KpiReport, ReportError> {
        let fiscal_year = fiscal_year.unwrap_or(self.settings.fiscal_year);
        let period = ReportingPeriod::resolve(reporting_month, fiscal_year)?;

        let budget_tab = self.settings.budget_tab_for(fiscal_year);
        let actuals_tab = self.settings.actuals_tab.as_str();
        let mut grids = self
            .source
            .fetch_tabs(&[budget_tab.as_str(), actuals_tab])
            .await?
            .into_iter();
        let (Some(budget_grid), Some(actuals_grid)) = (grids.next(), grids.next()) else {
            return Err(ReportError::DataFetch(
                "Spreadsheet source returned fewer tabs than requested".to_string(),
            ));
        };

        let budget = parse_budget(&budget_grid, &period)?;
        let actuals = parse_actuals(&actuals_grid, self.settings.actuals_layout)?;

        let actual_totals = CategoryTotals::from_actuals(&actuals, &period, &self.categories);
        let budget_totals = CategoryTotals::from_budget(&budget, &self.categories);

        tracing::info!(
            reporting_month = %period.reporting_month,
            fiscal_year,
            cutoff = %period.cutoff_date,
            budget_rows = budget.len(),
            actuals_rows = actuals.len(),
            "Computed KPI report"
        );

        Ok(KpiReport::from_totals(
            period.reporting_month,
            &actual_totals,
            &budget_totals,
        ))
    }
}
