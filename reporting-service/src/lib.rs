//! Reporting Service - monthly KPI report from the budget and transaction sheets.

pub mod config;
pub mod dtos;
pub mod handlers;
pub mod models;
pub mod services;
pub mod startup;

use services::ReportService;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub reports: ReportService,
}
