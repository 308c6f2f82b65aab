//! Server command implementation

use std::path::Path;

use anyhow::{Context, Result};

use super::open_db;

pub async fn cmd_serve(db_path: &Path, host: &str, port: u16, no_encrypt: bool) -> Result<()> {
    // Token secrets and limits come from the environment
    let config = spendwise_server::ServerConfig::from_env();
    config
        .validate()
        .context("Set ACCESS_TOKEN_SECRET and REFRESH_TOKEN_SECRET before starting the server")?;

    println!("🚀 Starting Spendwise API server...");
    println!("   Database: {}", db_path.display());
    println!("   Listening: http://{}:{}/api", host, port);
    println!(
        "   🌐 Allowed origins: {} (SPENDWISE_ALLOWED_ORIGINS)",
        config.allowed_origins.join(", ")
    );
    println!(
        "   🤖 AI insights: {} requests per {} minutes per IP (SPENDWISE_AI_RATE_LIMIT)",
        config.ai_rate_limit,
        config.ai_rate_window.as_secs() / 60
    );
    if !config.secure_cookies {
        println!("   ⚠️  Refresh cookies not marked Secure (SPENDWISE_SECURE_COOKIES=false)");
    }
    if no_encrypt {
        println!("   ⚠️  Encryption DISABLED (--no-encrypt)");
    }
    println!();
    println!("   Press Ctrl+C to stop");

    let db = open_db(db_path, no_encrypt)?;

    spendwise_server::serve_with_config(db, host, port, config).await?;

    Ok(())
}
