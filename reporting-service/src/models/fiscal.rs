//! Fiscal calendar: month ordering, year-to-date window and cutoff dates.
//!
//! A fiscal year runs from September 1 to August 31 and is labelled by the
//! calendar year it ends in, so FY2025 covers 2024-09-01..=2025-08-31.

use chrono::NaiveDate;

use crate::services::error::ReportError;

/// Month names in fiscal order, as they appear in the budget sheet header.
pub const FISCAL_MONTHS: [&str; 12] = [
    "September",
    "October",
    "November",
    "December",
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
];

/// Calendar month (1-based) the fiscal year opens with.
pub const FISCAL_START_MONTH: u32 = 9;

/// The resolved window for one report run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportingPeriod {
    pub reporting_month: String,
    pub fiscal_year: i32,
    /// Fiscal months from September through `reporting_month`, inclusive.
    pub elapsed_months: Vec<&'static str>,
    pub fiscal_start: NaiveDate,
    /// Last calendar day of `reporting_month`.
    pub cutoff_date: NaiveDate,
}

impl ReportingPeriod {
    pub fn resolve(reporting_month: &str, fiscal_year: i32) -> Result<Self, ReportError> {
        let position = fiscal_position(reporting_month)
            .ok_or_else(|| ReportError::InvalidMonth(reporting_month.to_string()))?;

        let invalid_year = || ReportError::InvalidFiscalYear(fiscal_year);
        let (year, month) = calendar_month(fiscal_year, position).ok_or_else(invalid_year)?;
        let cutoff_date = last_day_of_month(year, month).ok_or_else(invalid_year)?;
        let fiscal_start = fiscal_year
            .checked_sub(1)
            .and_then(|year| NaiveDate::from_ymd_opt(year, FISCAL_START_MONTH, 1))
            .ok_or_else(invalid_year)?;

        Ok(Self {
            reporting_month: reporting_month.to_string(),
            fiscal_year,
            elapsed_months: FISCAL_MONTHS[..=position].to_vec(),
            fiscal_start,
            cutoff_date,
        })
    }

    /// Whether `date` falls inside fiscal start..=cutoff.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.fiscal_start <= date && date <= self.cutoff_date
    }
}

/// Zero-based position of `month` in the fiscal cycle. Case-sensitive.
pub fn fiscal_position(month: &str) -> Option<usize> {
    FISCAL_MONTHS.iter().position(|m| *m == month)
}

/// Maps a fiscal position to its (calendar year, calendar month).
fn calendar_month(fiscal_year: i32, position: usize) -> Option<(i32, u32)> {
    let month = (FISCAL_START_MONTH - 1 + position as u32) % 12 + 1;
    let year = if month >= FISCAL_START_MONTH {
        fiscal_year.checked_sub(1)?
    } else {
        fiscal_year
    };
    Some((year, month))
}

/// Last calendar day of `month` (1-12) in `year`.
pub fn last_day_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    if !(1..=12).contains(&month) {
        return None;
    }
    let (next_year, next_month) = if month == 12 {
        (year.checked_add(1)?, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)?.pred_opt()
}
