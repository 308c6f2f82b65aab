//! Financial insights
//!
//! Two separate features share the budget evaluator:
//!
//! - **Composer** - asks the text generator for commentary on the month,
//!   cached per user for an hour
//! - **Rules** - deterministic recommendation and investment tip, no generator
//!
//! ## Usage
//!
//! ```rust,ignore
//! use spendwise_core::insights::InsightComposer;
//!
//! let composer = InsightComposer::new(db.clone(), AIClient::from_env());
//! let result = composer.compose(user_id).await?;
//! ```

pub mod cache;
pub mod composer;
pub mod rules;

pub use cache::{InsightCache, DEFAULT_TTL};
pub use composer::{build_prompt, format_breakdown, AiInsights, InsightComposer, CURRENCY_SYMBOL};
pub use rules::{rule_based_insights, FinancialInsights};
