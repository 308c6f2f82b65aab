//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use rust_decimal::Decimal;

/// Spendwise - Track expenses against a budget
#[derive(Parser)]
#[command(name = "spendwise")]
#[command(about = "Self-hosted expense tracker with budgets and AI insights", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Database path
    #[arg(long, default_value = "spendwise.db", global = true)]
    pub db: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable database encryption (not recommended for production)
    ///
    /// By default, the database is encrypted using SQLCipher.
    /// Set SPENDWISE_DB_KEY environment variable with your passphrase.
    /// Use --no-encrypt only for development or testing.
    #[arg(long, global = true)]
    pub no_encrypt: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database
    Init,

    /// Start the web server
    ///
    /// Requires ACCESS_TOKEN_SECRET and REFRESH_TOKEN_SECRET.
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "5000")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },

    /// Manage users
    Users {
        #[command(subcommand)]
        action: UsersAction,
    },

    /// Manage budgets
    Budget {
        #[command(subcommand)]
        action: BudgetAction,
    },

    /// Export a user's expenses
    Report {
        /// Report format
        #[arg(value_enum)]
        format: ReportFormat,

        /// Email of the user whose expenses to export
        #[arg(short, long)]
        email: String,

        /// Output file (defaults to financial_report.<format>)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show the rule-based recommendation for the current month
    Insights {
        /// Email of the user
        #[arg(short, long)]
        email: String,
    },
}

#[derive(Subcommand)]
pub enum UsersAction {
    /// Register a new user
    Add {
        /// Display name
        #[arg(short, long)]
        name: String,

        /// Login email
        #[arg(short, long)]
        email: String,

        /// Password (at least 6 characters)
        #[arg(short, long)]
        password: String,

        /// Default budget used until a monthly or weekly budget is set
        #[arg(long)]
        budget: Option<Decimal>,
    },
}

#[derive(Subcommand)]
pub enum BudgetAction {
    /// Set (or replace) a user's budget for a period
    Set {
        /// Email of the user
        #[arg(short, long)]
        email: String,

        /// Budget amount
        #[arg(short, long)]
        amount: Decimal,

        /// Budget period: monthly or weekly
        #[arg(short, long, default_value = "monthly")]
        period: String,
    },

    /// List a user's budgets with spend in each window
    List {
        /// Email of the user
        #[arg(short, long)]
        email: String,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    Csv,
    Pdf,
}

impl ReportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Pdf => "pdf",
        }
    }
}
