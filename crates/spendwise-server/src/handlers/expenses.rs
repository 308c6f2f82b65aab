//! Expense handlers

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::auth::AuthUser;
use crate::{AppError, AppState};
use spendwise_core::models::{Category, Expense, ExpenseUpdate, NewExpense};

/// Request body for creating or updating an expense
#[derive(Debug, Default, Deserialize)]
pub struct ExpenseRequest {
    pub amount: Option<Decimal>,
    pub category: Option<String>,
    pub description: Option<String>,
    /// `YYYY-MM-DD`, or an ISO-8601 timestamp whose date part is used
    pub date: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

fn parse_category(raw: &str) -> Result<Category, AppError> {
    raw.parse()
        .map_err(|_| AppError::bad_request("Invalid category"))
}

fn parse_date(raw: &str) -> Result<NaiveDate, AppError> {
    let raw = raw.trim();
    let day = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(day, "%Y-%m-%d")
        .map_err(|_| AppError::bad_request("Invalid date format (use YYYY-MM-DD)"))
}

/// POST /api/expense/add - Record an expense for the caller
pub async fn add_expense(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<ExpenseRequest>,
) -> Result<(StatusCode, Json<Expense>), AppError> {
    let (Some(amount), Some(category)) = (
        body.amount,
        body.category.filter(|c| !c.trim().is_empty()),
    ) else {
        return Err(AppError::bad_request("Amount and category are required"));
    };

    let expense = NewExpense {
        amount,
        category: parse_category(&category)?,
        description: body.description,
        date: body.date.as_deref().map(parse_date).transpose()?,
    };

    let created = state.db.create_expense(user.id, &expense)?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /api/expense - List the caller's expenses, newest first
pub async fn list_expenses(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<Expense>>, AppError> {
    Ok(Json(state.db.list_expenses(user.id)?))
}

/// PUT /api/expense/update/:id - Update an expense the caller owns
pub async fn update_expense(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
    Json(body): Json<ExpenseRequest>,
) -> Result<Json<Expense>, AppError> {
    let update = ExpenseUpdate {
        amount: body.amount,
        category: body.category.as_deref().map(parse_category).transpose()?,
        description: body.description,
        date: body.date.as_deref().map(parse_date).transpose()?,
    };

    Ok(Json(state.db.update_expense(user.id, id, &update)?))
}

/// DELETE /api/expense/delete/:id - Delete an expense the caller owns
pub async fn delete_expense(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>, AppError> {
    state.db.delete_expense(user.id, id)?;
    Ok(Json(MessageResponse {
        message: "Expense deleted successfully",
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_accepts_timestamps() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        assert_eq!(parse_date("2024-03-05").unwrap(), expected);
        assert_eq!(parse_date("2024-03-05T10:30:00.000Z").unwrap(), expected);
        assert!(parse_date("05/03/2024").is_err());
        assert!(parse_date("").is_err());
    }

    #[test]
    fn test_parse_category() {
        assert_eq!(parse_category("rent").unwrap(), Category::Rent);
        assert_eq!(
            parse_category("Groceries").unwrap_err().message(),
            "Invalid category"
        );
    }
}
