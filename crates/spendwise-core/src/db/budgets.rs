//! Budget operations

use rusqlite::{params, OptionalExtension, Row};
use rust_decimal::Decimal;
use tracing::debug;

use super::{parse_column, parse_datetime, Database};
use crate::error::{Error, Result};
use crate::models::{from_minor_units, to_minor_units, validate_amount, Budget, PeriodKind};

const BUDGET_COLUMNS: &str = "id, user_id, amount_cents, period, created_at, updated_at";

fn row_to_budget(row: &Row<'_>) -> rusqlite::Result<Budget> {
    let amount_cents: i64 = row.get(2)?;
    let period_str: String = row.get(3)?;
    let created_at_str: String = row.get(4)?;
    let updated_at_str: String = row.get(5)?;
    Ok(Budget {
        id: row.get(0)?,
        user_id: row.get(1)?,
        amount: from_minor_units(amount_cents),
        period: parse_column(3, &period_str)?,
        created_at: parse_datetime(&created_at_str),
        updated_at: parse_datetime(&updated_at_str),
    })
}

impl Database {
    /// Set the budget for a (user, period) pair
    ///
    /// A single conditional write: concurrent calls for the same pair can
    /// never leave two rows behind.
    pub fn set_budget(&self, user_id: i64, amount: Decimal, period: PeriodKind) -> Result<Budget> {
        validate_amount(amount)?;
        let cents = to_minor_units(amount)?;

        let conn = self.conn()?;
        let budget = conn.query_row(
            &format!(
                "INSERT INTO budgets (user_id, amount_cents, period) VALUES (?, ?, ?)
                 ON CONFLICT(user_id, period) DO UPDATE
                 SET amount_cents = excluded.amount_cents, updated_at = CURRENT_TIMESTAMP
                 RETURNING {}",
                BUDGET_COLUMNS
            ),
            params![user_id, cents, period.as_str()],
            row_to_budget,
        )?;

        debug!(user_id, period = %period, amount = %budget.amount, "Budget set");
        Ok(budget)
    }

    /// Get the budget for a specific period
    pub fn get_budget(&self, user_id: i64, period: PeriodKind) -> Result<Option<Budget>> {
        let conn = self.conn()?;
        let budget = conn
            .query_row(
                &format!(
                    "SELECT {} FROM budgets WHERE user_id = ? AND period = ?",
                    BUDGET_COLUMNS
                ),
                params![user_id, period.as_str()],
                row_to_budget,
            )
            .optional()?;
        Ok(budget)
    }

    /// The budget that drives alerts and insights: monthly if set, otherwise weekly
    pub fn get_primary_budget(&self, user_id: i64) -> Result<Option<Budget>> {
        let conn = self.conn()?;
        let budget = conn
            .query_row(
                &format!(
                    "SELECT {} FROM budgets WHERE user_id = ?
                     ORDER BY CASE period WHEN 'monthly' THEN 0 ELSE 1 END
                     LIMIT 1",
                    BUDGET_COLUMNS
                ),
                params![user_id],
                row_to_budget,
            )
            .optional()?;
        Ok(budget)
    }

    /// List every budget a user has, monthly first
    pub fn list_budgets(&self, user_id: i64) -> Result<Vec<Budget>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM budgets WHERE user_id = ?
             ORDER BY CASE period WHEN 'monthly' THEN 0 ELSE 1 END",
            BUDGET_COLUMNS
        ))?;
        let budgets = stmt
            .query_map(params![user_id], row_to_budget)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        if budgets.is_empty() && self.get_user(user_id)?.is_none() {
            return Err(Error::not_found("User not found"));
        }
        Ok(budgets)
    }
}
