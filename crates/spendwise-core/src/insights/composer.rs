//! AI insight composer
//!
//! Summarises the current month's spending into a prompt, asks the text
//! generator for commentary and caches the answer per user.

use std::sync::Arc;
use std::time::Instant;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::ai::{AIBackend, AIClient};
use crate::budget::resolve_budget_amount;
use crate::db::Database;
use crate::error::Result;
use crate::models::SpendingAggregate;
use crate::period::PeriodWindow;

use super::cache::InsightCache;

/// Currency symbol used in generated prompts
pub const CURRENCY_SYMBOL: &str = "₹";

/// Shown in the prompt when the month has no expenses
pub const NO_SPENDING_TEXT: &str = "No spending recorded yet.";

/// Generated insight text
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AiInsights {
    pub insights: String,
    /// True when served from the cache without calling the generator
    #[serde(skip)]
    pub cached: bool,
}

/// Format the per-category spend as `Food: ₹120.50, Rent: ₹900.00`
pub fn format_breakdown(aggregate: &SpendingAggregate) -> String {
    if aggregate.by_category.is_empty() {
        return NO_SPENDING_TEXT.to_string();
    }
    aggregate
        .by_category
        .iter()
        .map(|(category, total)| format!("{}: {}{}", category, CURRENCY_SYMBOL, total))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Build the generator prompt for one user's month
pub fn build_prompt(budget: Decimal, aggregate: &SpendingAggregate, remaining: Decimal) -> String {
    format!(
        "You are a financial expert. The user has a budget of {c}{budget}.\n\
         Their total spending is {c}{spent}, categorized as follows: {breakdown}.\n\
         The remaining budget is {c}{remaining}.\n\
         \n\
         Provide:\n\
         1. A brief analysis of their spending pattern.\n\
         2. Two personalized saving tips.\n\
         3. Two investment opportunities that align with their financial situation.",
        c = CURRENCY_SYMBOL,
        budget = budget,
        spent = aggregate.total,
        breakdown = format_breakdown(aggregate),
        remaining = remaining,
    )
}

/// Composes AI insights for a user, consulting the cache first
///
/// Cheap to clone; clones share the cache.
#[derive(Clone)]
pub struct InsightComposer {
    db: Database,
    ai: AIClient,
    cache: Arc<InsightCache>,
}

impl InsightComposer {
    pub fn new(db: Database, ai: AIClient) -> Self {
        Self::with_cache(db, ai, Arc::new(InsightCache::default()))
    }

    pub fn with_cache(db: Database, ai: AIClient, cache: Arc<InsightCache>) -> Self {
        Self { db, ai, cache }
    }

    pub fn cache(&self) -> &InsightCache {
        &self.cache
    }

    pub fn ai(&self) -> &AIClient {
        &self.ai
    }

    /// Compose insights for today's calendar month
    pub async fn compose(&self, user_id: i64) -> Result<AiInsights> {
        self.compose_at(user_id, chrono::Local::now().date_naive(), Instant::now())
            .await
    }

    /// Compose insights as of the given date and cache clock
    ///
    /// A cache hit touches neither the database nor the generator. The
    /// generator is called at most once per miss and failures are not cached.
    pub async fn compose_at(&self, user_id: i64, today: NaiveDate, now: Instant) -> Result<AiInsights> {
        if let Some(insights) = self.cache.get_at(user_id, now) {
            debug!(user_id, "Insight cache hit");
            return Ok(AiInsights {
                insights,
                cached: true,
            });
        }
        debug!(user_id, "Insight cache miss");

        let stored = self.db.get_primary_budget(user_id)?.map(|b| b.amount);
        let user_default = self.db.get_user(user_id)?.and_then(|u| u.default_budget);
        let budget = resolve_budget_amount(stored, user_default).unwrap_or(Decimal::ZERO);

        // The composer always looks at the calendar month, whatever the budget period
        let window = PeriodWindow::current_month(today);
        let aggregate = self.db.aggregate_spending(user_id, &window)?;
        let remaining = budget - aggregate.total;

        let prompt = build_prompt(budget, &aggregate, remaining);
        let insights = match self.ai.generate(&prompt).await {
            Ok(text) => text,
            Err(e) => {
                warn!(user_id, model = %self.ai.model(), error = %e, "Insight generation failed");
                return Err(e);
            }
        };

        self.cache.insert_at(user_id, insights.clone(), now);
        info!(user_id, model = %self.ai.model(), "Generated AI insights");

        Ok(AiInsights {
            insights,
            cached: false,
        })
    }
}
