//! Insight handlers

use std::sync::Arc;

use axum::{extract::State, Extension, Json};
use chrono::Local;
use serde::Serialize;

use crate::auth::AuthUser;
use crate::{AppError, AppState};
use spendwise_core::insights::{rule_based_insights, FinancialInsights};

#[derive(Debug, Serialize)]
pub struct AiInsightsResponse {
    pub insights: String,
}

/// GET /api/insights - Rule-based recommendation for the current month
pub async fn financial_insights(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<FinancialInsights>, AppError> {
    let insights = rule_based_insights(&state.db, user.id, Local::now().date_naive())?;
    Ok(Json(insights))
}

/// GET /api/ai-insights - Generated commentary, cached per user
///
/// Generator failures surface with the generator's own status when it gave one.
pub async fn ai_insights(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<AiInsightsResponse>, AppError> {
    let result = state.composer.compose(user.id).await?;
    Ok(Json(AiInsightsResponse {
        insights: result.insights,
    }))
}
