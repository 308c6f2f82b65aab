//! Spendwise Core Library
//!
//! Shared functionality for the Spendwise expense tracker:
//! - Database access and migrations (users, expenses, budgets)
//! - Budget period windows and spending aggregation
//! - Budget evaluation and recommendation tiers
//! - Pluggable text-generation backends (Ollama)
//! - AI and rule-based financial insights
//! - CSV and PDF expense reports
//! - Password hashing

pub mod ai;
pub mod auth;
pub mod budget;
pub mod db;
pub mod error;
pub mod export;
pub mod insights;
pub mod models;
pub mod period;

/// Test utilities including mock Ollama server
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use ai::{AIBackend, AIClient, MockBackend, OllamaBackend};
pub use budget::{check_alert, evaluate, BudgetAlert, BudgetEvaluation, RecommendationTier};
pub use db::Database;
pub use error::{Error, Result};
pub use export::{expenses_to_csv, expenses_to_pdf};
pub use insights::{AiInsights, FinancialInsights, InsightCache, InsightComposer};
pub use models::{
    Budget, Category, CategoryTotal, DailyTotal, Expense, ExpenseUpdate, NewExpense, PeriodKind,
    SpendingAggregate, User,
};
pub use period::{resolve_window, PeriodWindow};
