//! Rule-based financial insights
//!
//! The same budget evaluation as the AI composer's inputs, reported directly
//! with no generator call.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::budget::{evaluate, resolve_budget_amount};
use crate::db::Database;
use crate::error::Result;
use crate::models::CategoryTotal;
use crate::period::PeriodWindow;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialInsights {
    pub spent_amount: Decimal,
    pub remaining_budget: Decimal,
    pub over_budget: bool,
    pub recommendation: &'static str,
    pub investment_tip: &'static str,
    pub category_wise_spending: Vec<CategoryTotal>,
}

/// Evaluate the calendar month containing `today` for one user
pub fn rule_based_insights(db: &Database, user_id: i64, today: NaiveDate) -> Result<FinancialInsights> {
    let window = PeriodWindow::current_month(today);
    let breakdown = db.category_breakdown(user_id, Some(&window))?;
    let spent: Decimal = breakdown.iter().map(|c| c.total).sum();

    let stored = db.get_primary_budget(user_id)?.map(|b| b.amount);
    let user_default = db.get_user(user_id)?.and_then(|u| u.default_budget);
    let evaluation = evaluate(resolve_budget_amount(stored, user_default), spent);

    Ok(FinancialInsights {
        spent_amount: spent,
        remaining_budget: evaluation.remaining,
        over_budget: evaluation.over_budget,
        recommendation: evaluation.recommendation,
        investment_tip: evaluation.investment_tip,
        category_wise_spending: breakdown,
    })
}
