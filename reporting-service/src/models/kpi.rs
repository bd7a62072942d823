//! KPI aggregation over categorized budget and actuals rows.

use serde::{Deserialize, Serialize};

use super::category::{AccountCategories, AccountCategory};
use super::fiscal::ReportingPeriod;
use super::rows::{ActualsRow, BudgetRow};

/// Actual vs budget figure for one KPI.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct KpiValue {
    pub actual: f64,
    pub budget: f64,
}

/// Response payload of `POST /run-report`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KpiReport {
    pub reporting_month: String,
    pub total_income: KpiValue,
    pub gp_cost: KpiValue,
    pub driver_costs: KpiValue,
    pub operating_expenses: KpiValue,
    pub bottom_line: KpiValue,
}

/// Per-category sums for one side of the report.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CategoryTotals {
    pub income: f64,
    pub cost_of_goods: f64,
    pub driver_costs: f64,
    pub other_income: f64,
    pub operating_expense: f64,
}

impl CategoryTotals {
    fn add(&mut self, category: AccountCategory, amount: f64) {
        let slot = match category {
            AccountCategory::Income => &mut self.income,
            AccountCategory::CostOfGoods => &mut self.cost_of_goods,
            AccountCategory::DriverCost => &mut self.driver_costs,
            AccountCategory::OtherIncome => &mut self.other_income,
            AccountCategory::OperatingExpense => &mut self.operating_expense,
        };
        *slot += amount;
    }

    /// Sums `Net` of transactions inside the period window. Missing amounts
    /// count as zero; rows outside the window are ignored.
    pub fn from_actuals(
        rows: &[ActualsRow],
        period: &ReportingPeriod,
        categories: &AccountCategories,
    ) -> Self {
        let mut totals = Self::default();
        for row in rows.iter().filter(|row| period.contains(row.date)) {
            totals.add(
                categories.classify(&row.account_name),
                row.net.unwrap_or(0.0),
            );
        }
        totals
    }

    /// Sums the YTD column of every budget row.
    pub fn from_budget(rows: &[BudgetRow], categories: &AccountCategories) -> Self {
        let mut totals = Self::default();
        for row in rows {
            totals.add(categories.classify(&row.account), row.ytd);
        }
        totals
    }

    /// Everything outside income, cost of goods and driver costs.
    pub fn non_direct(&self) -> f64 {
        self.other_income + self.operating_expense
    }
}

/// Operating expenses on the actuals side: the non-direct pool net of
/// other income.
pub fn actual_operating_expenses(totals: &CategoryTotals) -> f64 {
    totals.non_direct() - totals.other_income
}

/// Operating expenses on the budget side: the sign-flipped non-direct pool.
/// Other income is not netted out here, unlike the actuals side.
pub fn budget_operating_expenses(totals: &CategoryTotals) -> f64 {
    -1.0 * totals.non_direct()
}

fn bottom_line(income: f64, gp_cost: f64, driver_costs: f64, operating_expenses: f64) -> f64 {
    income - gp_cost - driver_costs - operating_expenses
}

impl KpiReport {
    pub fn from_totals(
        reporting_month: impl Into<String>,
        actual: &CategoryTotals,
        budget: &CategoryTotals,
    ) -> Self {
        let actual_opex = actual_operating_expenses(actual);
        let budget_opex = budget_operating_expenses(budget);

        Self {
            reporting_month: reporting_month.into(),
            total_income: KpiValue {
                actual: actual.income,
                budget: budget.income,
            },
            gp_cost: KpiValue {
                actual: actual.cost_of_goods,
                budget: budget.cost_of_goods,
            },
            driver_costs: KpiValue {
                actual: actual.driver_costs,
                budget: budget.driver_costs,
            },
            operating_expenses: KpiValue {
                actual: actual_opex,
                budget: budget_opex,
            },
            bottom_line: KpiValue {
                actual: bottom_line(
                    actual.income,
                    actual.cost_of_goods,
                    actual.driver_costs,
                    actual_opex,
                ),
                budget: bottom_line(
                    budget.income,
                    budget.cost_of_goods,
                    budget.driver_costs,
                    budget_opex,
                ),
            },
        }
    }
}
