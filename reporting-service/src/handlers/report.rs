use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use service_core::error::AppError;

use crate::dtos::ReportRequest;
use crate::models::KpiReport;
use crate::services::record_report;
use crate::AppState;

/// `POST /run-report`: computes the KPI report for one month.
pub async fn run_report(
    State(state): State<AppState>,
    payload: Result<Json<ReportRequest>, JsonRejection>,
) -> Result<Json<KpiReport>, AppError> {
    let Json(request) = payload.map_err(|rejection| {
        tracing::warn!(error = %rejection.body_text(), "Rejected report request body");
        record_report("invalid_request");
        AppError::BadRequest(anyhow::anyhow!(rejection.body_text()))
    })?;

    tracing::info!(
        reporting_month = %request.reporting_month,
        fiscal_year = ?request.fiscal_year,
        action_type = %request.action_type,
        "Running monthly report"
    );

    match state
        .reports
        .run(&request.reporting_month, request.fiscal_year)
        .await
    {
        Ok(report) => {
            record_report("success");
            Ok(Json(report))
        }
        Err(err) => {
            record_report(err.kind());
            if err.is_client_error() {
                tracing::warn!(kind = err.kind(), error = %err, "Report request rejected");
            } else {
                tracing::error!(kind = err.kind(), error = %err, "Report run failed");
            }
            Err(err.into())
        }
    }
}
