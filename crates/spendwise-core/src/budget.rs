//! Budget evaluation: remaining budget, overspend flag and recommendation tiers

use rust_decimal::Decimal;
use serde::Serialize;

pub const NO_BUDGET_MESSAGE: &str = "Set a budget to track your expenses effectively.";
pub const OVERSPEND_MESSAGE: &str = "You're exceeding your budget! Cut down non-essentials.";
pub const SAVINGS_MESSAGE: &str = "You have significant savings! Consider investments.";
pub const NEAR_LIMIT_MESSAGE: &str = "You're close to your budget limit. Spend wisely!";
pub const ON_TRACK_MESSAGE: &str = "You're on track!";

pub const INVEST_TIP: &str = "You're saving well! Consider investing in mutual funds or SIPs.";
pub const MONITOR_TIP: &str = "Monitor expenses and ensure savings before investing.";

pub const ALERT_NO_BUDGET: &str = "No budget set.";
pub const ALERT_EXCEEDED: &str = "Budget Exceeded!";
pub const ALERT_WITHIN: &str = "Within Budget";

/// Remaining share of the budget above which savings are suggested
const SAVINGS_SHARE: Decimal = Decimal::from_parts(6, 0, 0, false, 1);
/// Remaining share of the budget below which the near-limit warning fires
const NEAR_LIMIT_SHARE: Decimal = Decimal::from_parts(2, 0, 0, false, 1);
/// Spent share of the budget below which investing is suggested
const INVEST_SHARE: Decimal = Decimal::from_parts(4, 0, 0, false, 1);

/// Recommendation tier, in precedence order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationTier {
    NoBudget,
    Overspent,
    Savings,
    NearLimit,
    OnTrack,
}

impl RecommendationTier {
    pub fn message(&self) -> &'static str {
        match self {
            Self::NoBudget => NO_BUDGET_MESSAGE,
            Self::Overspent => OVERSPEND_MESSAGE,
            Self::Savings => SAVINGS_MESSAGE,
            Self::NearLimit => NEAR_LIMIT_MESSAGE,
            Self::OnTrack => ON_TRACK_MESSAGE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetEvaluation {
    pub remaining: Decimal,
    pub over_budget: bool,
    pub tier: RecommendationTier,
    pub recommendation: &'static str,
    pub investment_tip: &'static str,
}

/// Evaluate spend against an optional budget amount
///
/// An absent budget counts as zero for the arithmetic but always yields the
/// "set a budget" tier and never flags overspend. The investment tip is an
/// independent rule and may disagree with the tier.
pub fn evaluate(budget: Option<Decimal>, spent: Decimal) -> BudgetEvaluation {
    let amount = budget.unwrap_or(Decimal::ZERO);
    let remaining = amount - spent;

    let tier = if budget.is_none() {
        RecommendationTier::NoBudget
    } else if remaining < Decimal::ZERO {
        RecommendationTier::Overspent
    } else if remaining > amount * SAVINGS_SHARE {
        RecommendationTier::Savings
    } else if remaining < amount * NEAR_LIMIT_SHARE {
        RecommendationTier::NearLimit
    } else {
        RecommendationTier::OnTrack
    };

    let investment_tip = if spent < amount * INVEST_SHARE {
        INVEST_TIP
    } else {
        MONITOR_TIP
    };

    BudgetEvaluation {
        remaining,
        over_budget: tier == RecommendationTier::Overspent,
        tier,
        recommendation: tier.message(),
        investment_tip,
    }
}

/// Result of the budget alert check
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetAlert {
    pub over_budget: bool,
    pub message: &'static str,
}

/// Over budget only when spend strictly exceeds the amount
pub fn check_alert(budget: Option<Decimal>, spent: Decimal) -> BudgetAlert {
    match budget {
        None => BudgetAlert {
            over_budget: false,
            message: ALERT_NO_BUDGET,
        },
        Some(amount) if spent > amount => BudgetAlert {
            over_budget: true,
            message: ALERT_EXCEEDED,
        },
        Some(_) => BudgetAlert {
            over_budget: false,
            message: ALERT_WITHIN,
        },
    }
}

/// Pick the budget amount to evaluate against
///
/// A stored budget wins over the user's default budget.
pub fn resolve_budget_amount(stored: Option<Decimal>, user_default: Option<Decimal>) -> Option<Decimal> {
    stored.or(user_default)
}
