//! Domain models for Spendwise

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Maximum length of an expense description, in characters
pub const MAX_DESCRIPTION_LEN: usize = 255;

/// Largest single amount accepted for an expense or budget
///
/// At 10^11 minor units per row, a user needs tens of millions of rows at the
/// cap before `SUM(amount_cents)` can leave the i64 range.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(1_000_000_000, 0, 0, false, 0);

/// Convert a currency amount to integer minor units (cents/paise)
///
/// Amounts are rounded half away from zero to two decimal places first, so
/// storage and aggregation only ever see whole minor units.
pub fn to_minor_units(amount: Decimal) -> Result<i64> {
    amount
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
        .checked_mul(Decimal::ONE_HUNDRED)
        .and_then(|minor| minor.to_i64())
        .ok_or_else(|| Error::validation(format!("Amount out of range: {}", amount)))
}

/// Convert integer minor units back to a two-place decimal amount
pub fn from_minor_units(minor: i64) -> Decimal {
    Decimal::new(minor, 2)
}

/// A registered user
///
/// The password hash is deliberately absent; see `UserCredentials`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    /// Optional default budget, used when no budget document exists
    pub default_budget: Option<Decimal>,
    pub created_at: DateTime<Utc>,
}

/// A user row together with its password hash (login only)
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user: User,
    pub password_hash: String,
}

/// Fixed expense classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Category {
    Food,
    Transport,
    Shopping,
    Rent,
    Entertainment,
    Bills,
    Health,
    Other,
}

impl Category {
    pub const ALL: [Category; 8] = [
        Self::Food,
        Self::Transport,
        Self::Shopping,
        Self::Rent,
        Self::Entertainment,
        Self::Bills,
        Self::Health,
        Self::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Food => "Food",
            Self::Transport => "Transport",
            Self::Shopping => "Shopping",
            Self::Rent => "Rent",
            Self::Entertainment => "Entertainment",
            Self::Bills => "Bills",
            Self::Health => "Health",
            Self::Other => "Other",
        }
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .copied()
            .ok_or_else(|| format!("Unknown category: {}", s))
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Budget period kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PeriodKind {
    #[default]
    Monthly,
    Weekly,
}

impl PeriodKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Monthly => "monthly",
            Self::Weekly => "weekly",
        }
    }
}

impl std::str::FromStr for PeriodKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "monthly" => Ok(Self::Monthly),
            "weekly" => Ok(Self::Weekly),
            _ => Err(format!("Unknown budget period: {}", s)),
        }
    }
}

impl std::fmt::Display for PeriodKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A spending budget for one period; at most one per (user, period)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Budget {
    pub id: i64,
    pub user_id: i64,
    pub amount: Decimal,
    pub period: PeriodKind,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A recorded expense
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Expense {
    pub id: i64,
    pub user_id: i64,
    pub amount: Decimal,
    pub category: Category,
    pub description: Option<String>,
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating an expense
#[derive(Debug, Clone)]
pub struct NewExpense {
    pub amount: Decimal,
    pub category: Category,
    pub description: Option<String>,
    /// Defaults to today when absent
    pub date: Option<NaiveDate>,
}

impl NewExpense {
    pub fn validate(&self) -> Result<()> {
        validate_amount(self.amount)?;
        validate_description(self.description.as_deref())
    }
}

/// Partial update of an expense; `None` leaves a field unchanged
#[derive(Debug, Clone, Default)]
pub struct ExpenseUpdate {
    pub amount: Option<Decimal>,
    pub category: Option<Category>,
    pub description: Option<String>,
    pub date: Option<NaiveDate>,
}

impl ExpenseUpdate {
    pub fn validate(&self) -> Result<()> {
        if let Some(amount) = self.amount {
            validate_amount(amount)?;
        }
        validate_description(self.description.as_deref())
    }

    pub fn is_empty(&self) -> bool {
        self.amount.is_none()
            && self.category.is_none()
            && self.description.is_none()
            && self.date.is_none()
    }
}

pub(crate) fn validate_amount(amount: Decimal) -> Result<()> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(Error::validation("Amount must not be negative"));
    }
    if amount > MAX_AMOUNT {
        return Err(Error::validation(format!(
            "Amount must be at most {}",
            MAX_AMOUNT
        )));
    }
    Ok(())
}

fn validate_description(description: Option<&str>) -> Result<()> {
    match description {
        Some(d) if d.chars().count() > MAX_DESCRIPTION_LEN => Err(Error::validation(format!(
            "Description must be at most {} characters",
            MAX_DESCRIPTION_LEN
        ))),
        _ => Ok(()),
    }
}

/// Total spent in a single category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryTotal {
    pub category: Category,
    pub total: Decimal,
}

/// Output of the expense aggregator for one user and window
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpendingAggregate {
    pub total: Decimal,
    /// Only categories with spend appear; there is no zero-fill
    pub by_category: BTreeMap<Category, Decimal>,
}

/// Total spent on one day of a month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyTotal {
    pub day: u32,
    pub total: Decimal,
}
