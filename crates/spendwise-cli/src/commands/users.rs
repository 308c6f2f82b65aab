//! User commands

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use spendwise_core::auth::hash_password;
use spendwise_core::db::Database;

/// Register a user from the command line
pub fn cmd_users_add(
    db: &Database,
    name: &str,
    email: &str,
    password: &str,
    budget: Option<Decimal>,
) -> Result<()> {
    let hash = hash_password(password).context("Invalid password")?;
    let user = db
        .create_user_with_budget(name, email, &hash, budget)
        .context("Failed to create user")?;

    println!("✅ Registered {} <{}> (id {})", user.name, user.email, user.id);
    if let Some(budget) = user.default_budget {
        println!("   Default budget: ₹{}", budget);
    }
    Ok(())
}
