//! Spendwise CLI - Expense tracker with budgets and AI insights
//!
//! Usage:
//!   spendwise init                              Initialize database
//!   spendwise users add -n Asha -e a@x.io -p …  Register a user
//!   spendwise budget set -e a@x.io -a 20000     Set a monthly budget
//!   spendwise report csv -e a@x.io              Export expenses
//!   spendwise serve --port 5000                 Start web server

mod cli;
mod commands;


use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    match cli.command {
        Commands::Init => commands::cmd_init(&cli.db, cli.no_encrypt),
        Commands::Serve { port, host } => {
            commands::cmd_serve(&cli.db, &host, port, cli.no_encrypt).await
        }
        Commands::Users { action } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            match action {
                UsersAction::Add {
                    name,
                    email,
                    password,
                    budget,
                } => commands::cmd_users_add(&db, &name, &email, &password, budget),
            }
        }
        Commands::Budget { action } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            match action {
                BudgetAction::Set {
                    email,
                    amount,
                    period,
                } => commands::cmd_budget_set(&db, &email, amount, &period),
                BudgetAction::List { email } => commands::cmd_budget_list(&db, &email),
            }
        }
        Commands::Report {
            format,
            email,
            output,
        } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            let output = output.unwrap_or_else(|| {
                format!("financial_report.{}", format.extension()).into()
            });
            commands::cmd_report(&db, &email, format, &output)
        }
        Commands::Insights { email } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            commands::cmd_insights(&db, &email)
        }
    }
}
