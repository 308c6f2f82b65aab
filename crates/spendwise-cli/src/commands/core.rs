//! Core command implementations and shared utilities
//!
//! This module contains:
//! - `open_db` - Shared utility to open the database
//! - `find_user` - Resolve a user by email
//! - `cmd_init` - Initialize the database

use std::path::Path;

use anyhow::{Context, Result};
use spendwise_core::db::Database;
use spendwise_core::models::User;

/// Open database with encryption by default, or unencrypted if --no-encrypt
pub fn open_db(db_path: &Path, no_encrypt: bool) -> Result<Database> {
    let path_str = db_path
        .to_str()
        .context("Database path must be valid UTF-8")?;
    tracing::debug!(path = %path_str, encrypted = !no_encrypt, "Opening database");
    if no_encrypt {
        Database::new_unencrypted(path_str).context("Failed to open database (unencrypted)")
    } else {
        Database::new(path_str).context("Failed to open database")
    }
}

/// Look up a user by email, failing with a readable message
pub fn find_user(db: &Database, email: &str) -> Result<User> {
    let user = db
        .get_user_by_email(email)
        .context("Failed to look up user")?;
    if user.is_none() {
        tracing::warn!("No user registered with email '{}'", email);
    }
    user.with_context(|| format!("No user registered with email '{}'", email))
}

pub fn cmd_init(db_path: &Path, no_encrypt: bool) -> Result<()> {
    println!("🔧 Initializing database at {}...", db_path.display());

    // Opening runs the migrations
    open_db(db_path, no_encrypt)?;

    if no_encrypt {
        println!("   ⚠️  Encryption: DISABLED (--no-encrypt)");
    } else {
        println!("   🔒 Encryption: ENABLED");
    }

    println!("✅ Database initialized successfully!");
    println!();
    println!("Next steps:");
    println!("  1. Add a user: spendwise users add --name Asha --email asha@example.com --password ...");
    println!("  2. Start the API: spendwise serve");

    Ok(())
}
