//! Insight summary command

use anyhow::Result;
use chrono::Local;
use spendwise_core::db::Database;
use spendwise_core::insights::rule_based_insights;

use super::find_user;

pub fn cmd_insights(db: &Database, email: &str) -> Result<()> {
    let user = find_user(db, email)?;
    let insights = rule_based_insights(db, user.id, Local::now().date_naive())?;

    println!("📊 This month for {}", user.email);
    println!("   ─────────────────────────────");
    println!("   Spent:     ₹{}", insights.spent_amount);
    println!("   Remaining: ₹{}", insights.remaining_budget);
    if insights.over_budget {
        println!("   🚨 Over budget");
    }

    if !insights.category_wise_spending.is_empty() {
        println!();
        for category in &insights.category_wise_spending {
            println!("   {:<14} ₹{}", category.category.as_str(), category.total);
        }
    }

    println!();
    println!("   {}", insights.recommendation);
    println!("   💡 {}", insights.investment_tip);

    Ok(())
}
