//! Budget handlers

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::Local;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::auth::AuthUser;
use crate::{AppError, AppState};
use spendwise_core::budget::{check_alert, BudgetAlert};
use spendwise_core::models::{Budget, PeriodKind};
use spendwise_core::period::resolve_window;

/// Request body for setting a budget
#[derive(Debug, Deserialize)]
pub struct SetBudgetRequest {
    pub amount: Option<Decimal>,
    /// `monthly` (default) or `weekly`
    pub period: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SetBudgetResponse {
    pub message: &'static str,
    pub budget: Budget,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodBudgetResponse {
    pub budget: Decimal,
    pub total_expenses: Decimal,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetAlertResponse {
    pub over_budget: bool,
    pub message: &'static str,
}

impl From<BudgetAlert> for BudgetAlertResponse {
    fn from(alert: BudgetAlert) -> Self {
        Self {
            over_budget: alert.over_budget,
            message: alert.message,
        }
    }
}

/// POST /api/budget/set - Create or replace the caller's budget for a period
pub async fn set_budget(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<SetBudgetRequest>,
) -> Result<Json<SetBudgetResponse>, AppError> {
    let amount = body
        .amount
        .ok_or_else(|| AppError::bad_request("Budget amount is required"))?;

    let period = match body.period.as_deref().map(str::trim) {
        None | Some("") => PeriodKind::default(),
        Some(raw) => raw
            .parse()
            .map_err(|_| AppError::bad_request("Period must be 'monthly' or 'weekly'"))?,
    };

    let budget = state.db.set_budget(user.id, amount, period)?;

    Ok(Json(SetBudgetResponse {
        message: "Budget updated successfully!",
        budget,
    }))
}

/// GET /api/budget/:period - Budget and spend for one period window
pub async fn get_budget(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(period): Path<String>,
) -> Result<Json<PeriodBudgetResponse>, AppError> {
    const NOT_FOUND: &str = "No budget found for this period";

    let period: PeriodKind = period.parse().map_err(|_| AppError::not_found(NOT_FOUND))?;
    let budget = state
        .db
        .get_budget(user.id, period)?
        .ok_or_else(|| AppError::not_found(NOT_FOUND))?;

    let window = resolve_window(period, Local::now().date_naive());
    let total_expenses = state.db.total_spent(user.id, &window)?;

    Ok(Json(PeriodBudgetResponse {
        budget: budget.amount,
        total_expenses,
    }))
}

/// GET /api/budget/alert - Whether spend in the budget's own window exceeds it
///
/// A stored budget is checked over its own period; a user default budget is
/// checked over the current month.
pub async fn budget_alert(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<BudgetAlertResponse>, AppError> {
    let target = match state.db.get_primary_budget(user.id)? {
        Some(budget) => Some((budget.amount, budget.period)),
        None => state
            .db
            .get_user(user.id)?
            .and_then(|u| u.default_budget)
            .map(|amount| (amount, PeriodKind::Monthly)),
    };

    let Some((amount, period)) = target else {
        return Ok(Json(check_alert(None, Decimal::ZERO).into()));
    };

    let window = resolve_window(period, Local::now().date_naive());
    let spent = state.db.total_spent(user.id, &window)?;

    Ok(Json(check_alert(Some(amount), spent).into()))
}
