//! Analytics handlers (chart data)

use std::sync::Arc;

use axum::{extract::State, Extension, Json};
use chrono::Local;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::auth::AuthUser;
use crate::{AppError, AppState};
use spendwise_core::models::{CategoryTotal, DailyTotal};
use spendwise_core::period::PeriodWindow;

/// One point of the monthly spend chart
#[derive(Debug, Serialize)]
pub struct DaySpend {
    /// Day of month
    #[serde(rename = "_id")]
    pub day: u32,
    pub total: Decimal,
}

impl From<DailyTotal> for DaySpend {
    fn from(d: DailyTotal) -> Self {
        Self {
            day: d.day,
            total: d.total,
        }
    }
}

/// One slice of the category chart
#[derive(Debug, Serialize)]
pub struct CategorySlice {
    pub id: String,
    pub name: String,
    pub total: Decimal,
}

impl From<CategoryTotal> for CategorySlice {
    fn from(c: CategoryTotal) -> Self {
        Self {
            id: c.category.as_str().to_string(),
            name: c.category.as_str().to_string(),
            total: c.total,
        }
    }
}

/// GET /api/analytics/monthly-summary - Daily totals for the current month
pub async fn monthly_summary(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<DaySpend>>, AppError> {
    let window = PeriodWindow::current_month(Local::now().date_naive());
    let days = state.db.daily_totals(user.id, &window)?;
    Ok(Json(days.into_iter().map(DaySpend::from).collect()))
}

/// GET /api/analytics/category-breakdown - All-time totals per category, largest first
pub async fn category_breakdown(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<CategorySlice>>, AppError> {
    let breakdown = state.db.category_breakdown(user.id, None)?;
    Ok(Json(breakdown.into_iter().map(CategorySlice::from).collect()))
}
