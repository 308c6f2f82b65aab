//! Report download handlers

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, StatusCode},
    response::Response,
    Extension,
};
use tracing::info;

use crate::auth::AuthUser;
use crate::{AppError, AppState};

fn attachment(content_type: &str, filename: &str, body: Body) -> Result<Response, AppError> {
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", filename),
        )
        .body(body)
        .map_err(AppError::internal)
}

/// GET /api/reports/csv - Download every expense as CSV
pub async fn export_csv(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Response, AppError> {
    let csv = state.db.export_expenses_csv(user.id)?;
    info!(user_id = user.id, "Exported CSV report");
    attachment(
        "text/csv; charset=utf-8",
        "financial_report.csv",
        Body::from(csv),
    )
}

/// GET /api/reports/pdf - Download every expense as a printable PDF
pub async fn export_pdf(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Response, AppError> {
    let pdf = state.db.export_expenses_pdf(user.id)?;
    info!(user_id = user.id, "Exported PDF report");
    attachment("application/pdf", "financial_report.pdf", Body::from(pdf))
}
