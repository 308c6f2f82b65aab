//! Budget commands

use anyhow::{Context, Result};
use chrono::Local;
use rust_decimal::Decimal;
use spendwise_core::budget::check_alert;
use spendwise_core::db::Database;
use spendwise_core::models::PeriodKind;
use spendwise_core::period::resolve_window;

use super::find_user;

pub fn cmd_budget_set(db: &Database, email: &str, amount: Decimal, period: &str) -> Result<()> {
    let period: PeriodKind = period.parse().map_err(|e: String| anyhow::anyhow!(e))?;
    let user = find_user(db, email)?;

    let budget = db
        .set_budget(user.id, amount, period)
        .context("Failed to set budget")?;

    println!(
        "💰 {} budget for {} set to ₹{}",
        budget.period, user.email, budget.amount
    );
    Ok(())
}

pub fn cmd_budget_list(db: &Database, email: &str) -> Result<()> {
    let user = find_user(db, email)?;
    let budgets = db.list_budgets(user.id)?;

    if budgets.is_empty() {
        println!("No budgets set for {}.", user.email);
        if let Some(default) = user.default_budget {
            println!("Default budget: ₹{}", default);
        }
        return Ok(());
    }

    let today = Local::now().date_naive();

    println!("Budgets for {}:", user.email);
    println!("   ─────────────────────────────────────────────");
    for budget in budgets {
        let window = resolve_window(budget.period, today);
        let spent = db.total_spent(user.id, &window)?;
        let alert = check_alert(Some(budget.amount), spent);
        println!(
            "   {:<8} ₹{:>12}   spent ₹{:>12}   {} → {}   {}",
            budget.period.as_str(),
            budget.amount,
            spent,
            window.start,
            window.end,
            alert.message
        );
    }

    Ok(())
}
