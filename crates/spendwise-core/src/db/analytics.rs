//! Spending aggregation
//!
//! Sums run in SQLite over integer minor units, so they match a linear
//! accumulation of the same rows exactly.

use rusqlite::params;

use super::{parse_column, Database};
use crate::error::Result;
use crate::models::{from_minor_units, Category, CategoryTotal, DailyTotal, SpendingAggregate};
use crate::period::PeriodWindow;

impl Database {
    /// Total and per-category spend for a user within an inclusive window
    pub fn aggregate_spending(&self, user_id: i64, window: &PeriodWindow) -> Result<SpendingAggregate> {
        let by_category = self.category_breakdown(user_id, Some(window))?;

        let mut aggregate = SpendingAggregate::default();
        for item in by_category {
            aggregate.total += item.total;
            aggregate.by_category.insert(item.category, item.total);
        }
        Ok(aggregate)
    }

    /// Total spend for a user within an inclusive window
    pub fn total_spent(&self, user_id: i64, window: &PeriodWindow) -> Result<rust_decimal::Decimal> {
        let conn = self.conn()?;
        let cents: i64 = conn.query_row(
            "SELECT COALESCE(SUM(amount_cents), 0) FROM expenses
             WHERE user_id = ? AND date BETWEEN ? AND ?",
            params![user_id, window.start.to_string(), window.end.to_string()],
            |row| row.get(0),
        )?;
        Ok(from_minor_units(cents))
    }

    /// Spend per category, largest first; all time when `window` is `None`
    ///
    /// Categories without spend are omitted.
    pub fn category_breakdown(
        &self,
        user_id: i64,
        window: Option<&PeriodWindow>,
    ) -> Result<Vec<CategoryTotal>> {
        let conn = self.conn()?;

        let (sql, bounds) = match window {
            Some(w) => (
                "SELECT category, SUM(amount_cents) AS total FROM expenses
                 WHERE user_id = ?1 AND date BETWEEN ?2 AND ?3
                 GROUP BY category HAVING total > 0
                 ORDER BY total DESC, category ASC",
                Some((w.start.to_string(), w.end.to_string())),
            ),
            None => (
                "SELECT category, SUM(amount_cents) AS total FROM expenses
                 WHERE user_id = ?1
                 GROUP BY category HAVING total > 0
                 ORDER BY total DESC, category ASC",
                None,
            ),
        };

        let mut stmt = conn.prepare(sql)?;
        let map_row = |row: &rusqlite::Row<'_>| -> rusqlite::Result<CategoryTotal> {
            let category_str: String = row.get(0)?;
            let cents: i64 = row.get(1)?;
            Ok(CategoryTotal {
                category: parse_column::<Category>(0, &category_str)?,
                total: from_minor_units(cents),
            })
        };

        let totals = match bounds {
            Some((start, end)) => stmt
                .query_map(params![user_id, start, end], map_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?,
            None => stmt
                .query_map(params![user_id], map_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?,
        };

        Ok(totals)
    }

    /// Spend per day of month within a window, ordered by day
    pub fn daily_totals(&self, user_id: i64, window: &PeriodWindow) -> Result<Vec<DailyTotal>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT CAST(strftime('%d', date) AS INTEGER) AS day, SUM(amount_cents)
             FROM expenses
             WHERE user_id = ? AND date BETWEEN ? AND ?
             GROUP BY day
             ORDER BY day ASC",
        )?;

        let totals = stmt
            .query_map(
                params![user_id, window.start.to_string(), window.end.to_string()],
                |row| {
                    let cents: i64 = row.get(1)?;
                    Ok(DailyTotal {
                        day: row.get(0)?,
                        total: from_minor_units(cents),
                    })
                },
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(totals)
    }
}
