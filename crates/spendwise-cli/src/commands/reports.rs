//! Report command implementations

use std::path::Path;

use anyhow::{Context, Result};
use spendwise_core::db::Database;

use super::find_user;
use crate::cli::ReportFormat;

/// Export a user's expenses to `output`
pub fn cmd_report(db: &Database, email: &str, format: ReportFormat, output: &Path) -> Result<()> {
    let user = find_user(db, email)?;

    let bytes = match format {
        ReportFormat::Csv => db
            .export_expenses_csv(user.id)
            .context("Failed to build CSV report")?
            .into_bytes(),
        ReportFormat::Pdf => db
            .export_expenses_pdf(user.id)
            .context("Failed to build PDF report")?,
    };

    std::fs::write(output, &bytes)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    let count = db.list_expenses(user.id)?.len();
    println!(
        "📄 Exported {} expense(s) for {} to {} ({} bytes)",
        count,
        user.email,
        output.display(),
        bytes.len()
    );

    Ok(())
}
