//! Expense CRUD
//!
//! Mutations check ownership before writing: an expense may only be changed
//! or removed by the user stored on it.

use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::{debug, warn};

use super::{parse_column, parse_date, parse_datetime, Database};
use crate::error::{Error, Result};
use crate::models::{from_minor_units, to_minor_units, Expense, ExpenseUpdate, NewExpense};

const EXPENSE_COLUMNS: &str =
    "id, user_id, amount_cents, category, description, date, created_at, updated_at";

pub(crate) fn row_to_expense(row: &Row<'_>) -> rusqlite::Result<Expense> {
    let amount_cents: i64 = row.get(2)?;
    let category_str: String = row.get(3)?;
    let date_str: String = row.get(5)?;
    let created_at_str: String = row.get(6)?;
    let updated_at_str: String = row.get(7)?;

    Ok(Expense {
        id: row.get(0)?,
        user_id: row.get(1)?,
        amount: from_minor_units(amount_cents),
        category: parse_column(3, &category_str)?,
        description: row.get(4)?,
        date: parse_date(&date_str)?,
        created_at: parse_datetime(&created_at_str),
        updated_at: parse_datetime(&updated_at_str),
    })
}

fn normalize_description(description: Option<&str>) -> Option<String> {
    description
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_string)
}

/// Look up the owner and fail unless it matches `user_id`
fn check_owner(conn: &Connection, user_id: i64, id: i64) -> Result<()> {
    let owner: Option<i64> = conn
        .query_row(
            "SELECT user_id FROM expenses WHERE id = ?",
            params![id],
            |row| row.get(0),
        )
        .optional()?;

    match owner {
        None => Err(Error::not_found("Expense not found")),
        Some(owner) if owner != user_id => {
            warn!(expense_id = id, user_id, "Rejected expense access by non-owner");
            Err(Error::Forbidden("Unauthorized".to_string()))
        }
        Some(_) => Ok(()),
    }
}

impl Database {
    /// Record a new expense for `user_id`; the date defaults to today
    pub fn create_expense(&self, user_id: i64, expense: &NewExpense) -> Result<Expense> {
        expense.validate()?;

        let date = expense
            .date
            .unwrap_or_else(|| chrono::Local::now().date_naive());
        let cents = to_minor_units(expense.amount)?;

        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO expenses (user_id, amount_cents, category, description, date)
             VALUES (?, ?, ?, ?, ?)",
            params![
                user_id,
                cents,
                expense.category.as_str(),
                normalize_description(expense.description.as_deref()),
                date.to_string(),
            ],
        )?;

        let id = conn.last_insert_rowid();
        debug!(expense_id = id, user_id, "Expense created");
        self.get_expense(id)?
            .ok_or_else(|| Error::not_found("Expense not found after creation"))
    }

    /// Get an expense by ID regardless of owner
    pub fn get_expense(&self, id: i64) -> Result<Option<Expense>> {
        let conn = self.conn()?;
        let expense = conn
            .query_row(
                &format!("SELECT {} FROM expenses WHERE id = ?", EXPENSE_COLUMNS),
                params![id],
                row_to_expense,
            )
            .optional()?;
        Ok(expense)
    }

    /// List a user's expenses, newest first
    pub fn list_expenses(&self, user_id: i64) -> Result<Vec<Expense>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM expenses WHERE user_id = ? ORDER BY date DESC, id DESC",
            EXPENSE_COLUMNS
        ))?;

        let expenses = stmt
            .query_map(params![user_id], row_to_expense)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(expenses)
    }

    /// Update an expense owned by `user_id`
    ///
    /// Returns `NotFound` if the expense does not exist and `Forbidden` if it
    /// belongs to someone else; neither case writes anything.
    pub fn update_expense(&self, user_id: i64, id: i64, update: &ExpenseUpdate) -> Result<Expense> {
        update.validate()?;

        let conn = self.conn()?;
        check_owner(&conn, user_id, id)?;

        let current = self
            .get_expense(id)?
            .ok_or_else(|| Error::not_found("Expense not found"))?;

        let amount = update.amount.unwrap_or(current.amount);
        let category = update.category.unwrap_or(current.category);
        let description = match &update.description {
            Some(d) => normalize_description(Some(d)),
            None => current.description.clone(),
        };
        let date = update.date.unwrap_or(current.date);

        conn.execute(
            "UPDATE expenses
             SET amount_cents = ?, category = ?, description = ?, date = ?, updated_at = CURRENT_TIMESTAMP
             WHERE id = ? AND user_id = ?",
            params![
                to_minor_units(amount)?,
                category.as_str(),
                description,
                date.to_string(),
                id,
                user_id,
            ],
        )?;

        debug!(expense_id = id, user_id, "Expense updated");
        self.get_expense(id)?
            .ok_or_else(|| Error::not_found("Expense not found"))
    }

    /// Delete an expense owned by `user_id`
    pub fn delete_expense(&self, user_id: i64, id: i64) -> Result<()> {
        let conn = self.conn()?;
        check_owner(&conn, user_id, id)?;

        conn.execute(
            "DELETE FROM expenses WHERE id = ? AND user_id = ?",
            params![id, user_id],
        )?;

        debug!(expense_id = id, user_id, "Expense deleted");
        Ok(())
    }
}
