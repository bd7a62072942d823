//! Budget and actuals rows materialized from raw sheet values.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};
use serde_json::Value;
use std::collections::BTreeMap;

use super::amount::{normalize_amount, sum_present};
use super::fiscal::{ReportingPeriod, FISCAL_MONTHS};
use crate::services::error::ReportError;

pub const BUDGET_ACCOUNT_COLUMN: &str = "Account";
pub const ACTUALS_DATE_COLUMN: &str = "Date";
pub const ACTUALS_ACCOUNT_COLUMN: &str = "Account Name";
pub const ACTUALS_NET_COLUMN: &str = "Net";

/// One budget line: an account with its monthly amounts for the fiscal year.
#[derive(Debug, Clone, PartialEq)]
pub struct BudgetRow {
    pub account: String,
    /// Month columns present in the sheet, keyed by month name.
    pub months: BTreeMap<&'static str, Option<f64>>,
    /// Sum of the elapsed months, missing cells counted as zero.
    pub ytd: f64,
}

/// One ledger transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct ActualsRow {
    pub date: NaiveDate,
    pub account_name: String,
    pub net: Option<f64>,
}

/// Where the actuals header sits and how ambiguous dates are read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActualsLayout {
    /// Zero-based index of the header row; rows above it are skipped.
    pub header_row: usize,
    /// Read `03/04/2025` as 3 April rather than March 4.
    pub day_first: bool,
}

impl Default for ActualsLayout {
    fn default() -> Self {
        Self {
            header_row: 3,
            day_first: false,
        }
    }
}

/// Renders a cell as text the way the sheet displays it.
pub fn cell_text(cell: &Value) -> String {
    match cell {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn is_blank_row(row: &[Value]) -> bool {
    row.iter().all(|cell| cell_text(cell).trim().is_empty())
}

fn column_index(header: &[Value], name: &str) -> Option<usize> {
    header.iter().position(|cell| cell_text(cell).trim() == name)
}

fn require_column(header: &[Value], name: &str, table: &str) -> Result<usize, ReportError> {
    column_index(header, name).ok_or_else(|| {
        ReportError::Parse(format!("{} sheet has no '{}' column", table, name))
    })
}

/// Cells past the end of a row are blank; the Sheets API trims trailing
/// empty cells.
fn cell_at(row: &[Value], idx: usize) -> &Value {
    row.get(idx).unwrap_or(&Value::Null)
}

/// Parses the budget table: header on the first row, then one row per account.
pub fn parse_budget(
    rows: &[Vec<Value>],
    period: &ReportingPeriod,
) -> Result<Vec<BudgetRow>, ReportError> {
    let (header, body) = rows
        .split_first()
        .ok_or_else(|| ReportError::Parse("Budget sheet is empty".to_string()))?;

    let account_idx = require_column(header, BUDGET_ACCOUNT_COLUMN, "Budget")?;
    let month_columns: Vec<(&'static str, usize)> = FISCAL_MONTHS
        .iter()
        .filter_map(|month| column_index(header, month).map(|idx| (*month, idx)))
        .collect();

    for month in &period.elapsed_months {
        if !month_columns.iter().any(|(name, _)| name == month) {
            return Err(ReportError::Parse(format!(
                "Budget sheet has no '{}' column",
                month
            )));
        }
    }

    let budget = body
        .iter()
        .filter(|row| !is_blank_row(row))
        .map(|row| {
            let months: BTreeMap<&'static str, Option<f64>> = month_columns
                .iter()
                .map(|(name, idx)| (*name, normalize_amount(cell_at(row, *idx))))
                .collect();
            let ytd = sum_present(
                period
                    .elapsed_months
                    .iter()
                    .map(|month| months.get(month).copied().flatten()),
            );

            BudgetRow {
                account: cell_text(cell_at(row, account_idx)).trim().to_string(),
                months,
                ytd,
            }
        })
        .collect();

    Ok(budget)
}

/// Parses the transaction ledger. Rows whose date cannot be read are dropped.
pub fn parse_actuals(
    rows: &[Vec<Value>],
    layout: ActualsLayout,
) -> Result<Vec<ActualsRow>, ReportError> {
    let header = rows.get(layout.header_row).ok_or_else(|| {
        ReportError::Parse(format!(
            "Actuals sheet has {} rows; expected a header at row {}",
            rows.len(),
            layout.header_row.saturating_add(1)
        ))
    })?;

    let date_idx = require_column(header, ACTUALS_DATE_COLUMN, "Actuals")?;
    let account_idx = require_column(header, ACTUALS_ACCOUNT_COLUMN, "Actuals")?;
    let net_idx = require_column(header, ACTUALS_NET_COLUMN, "Actuals")?;

    let body = &rows[layout.header_row + 1..];
    let day_first = infer_day_first(body.iter().map(|row| cell_at(row, date_idx)))
        .unwrap_or(layout.day_first);
    let actuals: Vec<ActualsRow> = body
        .iter()
        .filter_map(|row| {
            let date = parse_date(cell_at(row, date_idx), day_first)?;
            Some(ActualsRow {
                date,
                account_name: cell_text(cell_at(row, account_idx)).trim().to_string(),
                net: normalize_amount(cell_at(row, net_idx)),
            })
        })
        .collect();

    let dropped = body.len() - actuals.len();
    if dropped > 0 {
        tracing::debug!(dropped, "Skipped actuals rows without a readable date");
    }

    Ok(actuals)
}

const ISO_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];
const MONTH_FIRST_FORMATS: &[&str] = &["%m/%d/%Y", "%m-%d-%Y", "%m/%d/%y"];
const DAY_FIRST_FORMATS: &[&str] = &["%d/%m/%Y", "%d-%m-%Y", "%d.%m.%Y", "%d/%m/%y"];
const NAMED_MONTH_FORMATS: &[&str] = &[
    "%d %b %Y",
    "%d %B %Y",
    "%b %d, %Y",
    "%B %d, %Y",
    "%d-%b-%Y",
    "%d-%b-%y",
];
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
];
const MONTH_FIRST_DATETIME_FORMATS: &[&str] = &["%m/%d/%Y %H:%M:%S"];
const DAY_FIRST_DATETIME_FORMATS: &[&str] = &["%d/%m/%Y %H:%M:%S"];

/// Largest serial the sheet date system can express (9999-12-31).
const MAX_SERIAL_DAY: f64 = 2_958_465.0;

/// Picks the day/month order for a whole date column from its first
/// unambiguous numeric date, such as `13/09/2024` (day-first) or
/// `09/13/2024` (month-first). `None` when every value reads both ways.
pub fn infer_day_first<'a>(cells: impl IntoIterator<Item = &'a Value>) -> Option<bool> {
    cells.into_iter().find_map(|cell| match cell {
        Value::String(s) => numeric_order(s.trim()),
        _ => None,
    })
}

fn numeric_order(text: &str) -> Option<bool> {
    let date_part = text.split_whitespace().next()?;
    let mut parts = date_part.split(['/', '-', '.']);
    let (first, second) = (parts.next()?, parts.next()?);
    parts.next()?;
    if first.len() > 2 || second.len() > 2 {
        return None;
    }

    let first: u32 = first.parse().ok()?;
    let second: u32 = second.parse().ok()?;
    match (first > 12, second > 12) {
        (true, false) => Some(true),
        (false, true) => Some(false),
        _ => None,
    }
}

/// Reads a ledger date cell.
///
/// Numeric cells are spreadsheet serial days counted from 1899-12-30. Text
/// is tried as ISO, then the numeric layout selected by `day_first`, then
/// named-month layouts. A numeric date that only reads in the other order
/// is rejected so one column never mixes orders.
pub fn parse_date(cell: &Value, day_first: bool) -> Option<NaiveDate> {
    match cell {
        Value::Number(n) => n.as_f64().and_then(serial_to_date),
        Value::String(s) => parse_date_text(s.trim(), day_first),
        _ => None,
    }
}

fn parse_date_text(text: &str, day_first: bool) -> Option<NaiveDate> {
    if text.is_empty() {
        return None;
    }

    let (numeric, numeric_datetime) = if day_first {
        (DAY_FIRST_FORMATS, DAY_FIRST_DATETIME_FORMATS)
    } else {
        (MONTH_FIRST_FORMATS, MONTH_FIRST_DATETIME_FORMATS)
    };

    let date_match = [ISO_FORMATS, numeric, NAMED_MONTH_FORMATS]
        .into_iter()
        .flatten()
        .filter_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
        .find(|date| date.year() >= 1000);
    if date_match.is_some() {
        return date_match;
    }

    [DATETIME_FORMATS, numeric_datetime]
        .into_iter()
        .flatten()
        .filter_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .map(|dt| dt.date())
        .find(|date| date.year() >= 1000)
}

fn serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 1.0 || serial > MAX_SERIAL_DAY {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    epoch.checked_add_signed(Duration::days(serial.floor() as i64))
}
