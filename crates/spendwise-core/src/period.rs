//! Budget period windows
//!
//! Windows are calendar dates with both bounds inclusive. Every aggregation
//! in the crate uses this one convention.

use chrono::{Datelike, Days, NaiveDate};
use serde::Serialize;

use crate::models::PeriodKind;

/// Length of the rolling weekly window, counted back from today
pub const WEEKLY_LOOKBACK_DAYS: u64 = 7;

/// An inclusive date range `[start, end]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PeriodWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl PeriodWindow {
    /// The calendar month containing `today`
    pub fn current_month(today: NaiveDate) -> Self {
        let start = first_of_month(today.year(), today.month());
        Self {
            start,
            end: last_of_month(start),
        }
    }

    /// The trailing window ending today
    pub fn trailing_week(today: NaiveDate) -> Self {
        Self {
            start: today
                .checked_sub_days(Days::new(WEEKLY_LOOKBACK_DAYS))
                .unwrap_or(NaiveDate::MIN),
            end: today,
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Resolve the active window for a period kind
pub fn resolve_window(kind: PeriodKind, today: NaiveDate) -> PeriodWindow {
    match kind {
        PeriodKind::Monthly => PeriodWindow::current_month(today),
        PeriodKind::Weekly => PeriodWindow::trailing_week(today),
    }
}

fn first_of_month(year: i32, month: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(NaiveDate::MIN)
}

/// Day before the first of the following month
fn last_of_month(first: NaiveDate) -> NaiveDate {
    let (year, month) = if first.month() == 12 {
        (first.year() + 1, 1)
    } else {
        (first.year(), first.month() + 1)
    };
    first_of_month(year, month)
        .pred_opt()
        .unwrap_or(first)
}
