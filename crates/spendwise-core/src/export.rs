//! Expense report export
//!
//! Supports:
//! - CSV with category, amount and date columns
//! - A printable PDF listing with one numbered line per expense

use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfLayerReference};

use crate::db::Database;
use crate::error::{Error, Result};
use crate::models::Expense;

/// Report date format (day/month/year)
pub const REPORT_DATE_FORMAT: &str = "%d/%m/%Y";

pub const CSV_HEADER: [&str; 3] = ["Category", "Amount (₹)", "Date"];

pub const PDF_TITLE: &str = "Financial Report";

// A4 portrait
const PAGE_WIDTH: Mm = Mm(210.0);
const PAGE_HEIGHT: Mm = Mm(297.0);
const MARGIN_MM: f32 = 20.0;
const LINE_HEIGHT_MM: f32 = 7.0;

// Builtin PDF fonts cannot encode the rupee sign
const PDF_CURRENCY: &str = "Rs.";

/// Render expenses as CSV, one row per expense in the given order
pub fn expenses_to_csv(expenses: &[Expense]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(CSV_HEADER)?;

    for expense in expenses {
        writer.write_record([
            expense.category.as_str().to_string(),
            expense.amount.to_string(),
            expense.date.format(REPORT_DATE_FORMAT).to_string(),
        ])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| Error::Io(e.into_error()))?;
    String::from_utf8(bytes).map_err(|e| Error::InvalidRow(e.to_string()))
}

fn pdf_error(e: printpdf::Error) -> Error {
    Error::Pdf(e.to_string())
}

struct PdfWriter<'a> {
    doc: &'a printpdf::PdfDocumentReference,
    layer: PdfLayerReference,
    font: &'a IndirectFontRef,
    bold: &'a IndirectFontRef,
    y: f32,
}

impl PdfWriter<'_> {
    fn line(&mut self, text: &str, size: f32, bold: bool) {
        if self.y < MARGIN_MM {
            let (page, layer) = self.doc.add_page(PAGE_WIDTH, PAGE_HEIGHT, "Layer 1");
            self.layer = self.doc.get_page(page).get_layer(layer);
            self.y = PAGE_HEIGHT.0 - MARGIN_MM;
        }
        let font = if bold { self.bold } else { self.font };
        self.layer
            .use_text(text, size, Mm(MARGIN_MM), Mm(self.y), font);
        self.y -= LINE_HEIGHT_MM * (size / 12.0).max(1.0);
    }
}

/// Render expenses as a paginated A4 PDF
pub fn expenses_to_pdf(expenses: &[Expense]) -> Result<Vec<u8>> {
    let (doc, page, layer) = PdfDocument::new(PDF_TITLE, PAGE_WIDTH, PAGE_HEIGHT, "Layer 1");
    let font = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(pdf_error)?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(pdf_error)?;

    {
        let mut writer = PdfWriter {
            doc: &doc,
            layer: doc.get_page(page).get_layer(layer),
            font: &font,
            bold: &bold,
            y: PAGE_HEIGHT.0 - MARGIN_MM,
        };

        writer.line(PDF_TITLE, 20.0, true);
        writer.line(
            &format!("S.No   Category   Amount ({})   Date", PDF_CURRENCY),
            14.0,
            true,
        );

        if expenses.is_empty() {
            writer.line("No expenses recorded.", 12.0, false);
        }
        for (index, expense) in expenses.iter().enumerate() {
            writer.line(
                &format!(
                    "{}.   {}   {} {}   {}",
                    index + 1,
                    expense.category,
                    PDF_CURRENCY,
                    expense.amount,
                    expense.date.format(REPORT_DATE_FORMAT)
                ),
                12.0,
                false,
            );
        }
    }

    doc.save_to_bytes().map_err(pdf_error)
}

impl Database {
    /// CSV report of every expense a user has, newest first
    pub fn export_expenses_csv(&self, user_id: i64) -> Result<String> {
        expenses_to_csv(&self.list_expenses(user_id)?)
    }

    /// PDF report of every expense a user has, newest first
    pub fn export_expenses_pdf(&self, user_id: i64) -> Result<Vec<u8>> {
        expenses_to_pdf(&self.list_expenses(user_id)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, NewExpense};
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    fn sample(db: &Database) -> i64 {
        let user_id = db.create_user("A", "a@example.com", "h").unwrap().id;
        for (amount, category, day) in [
            (Decimal::new(24999, 2), Category::Food, 5),
            (Decimal::from(1200), Category::Rent, 1),
        ] {
            db.create_expense(
                user_id,
                &NewExpense {
                    amount,
                    category,
                    description: Some("note, with comma".into()),
                    date: NaiveDate::from_ymd_opt(2024, 3, day),
                },
            )
            .unwrap();
        }
        user_id
    }

    #[test]
    fn test_csv_header_and_rows() {
        let db = Database::in_memory().unwrap();
        let user_id = sample(&db);

        let csv = db.export_expenses_csv(user_id).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "Category,Amount (₹),Date");
        assert_eq!(lines[1], "Food,249.99,05/03/2024");
        assert_eq!(lines[2], "Rent,1200.00,01/03/2024");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_csv_empty_has_header_only() {
        let csv = expenses_to_csv(&[]).unwrap();
        assert_eq!(csv.trim_end(), "Category,Amount (₹),Date");
    }

    #[test]
    fn test_csv_is_parseable() {
        let db = Database::in_memory().unwrap();
        let user_id = sample(&db);
        let csv = db.export_expenses_csv(user_id).unwrap();

        let mut reader = csv::Reader::from_reader(csv.as_bytes());
        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[0][0], "Food");
    }

    #[test]
    fn test_pdf_bytes() {
        let db = Database::in_memory().unwrap();
        let user_id = sample(&db);

        let pdf = db.export_expenses_pdf(user_id).unwrap();
        assert!(pdf.starts_with(b"%PDF"));
    }

    #[test]
    fn test_pdf_paginates_long_reports() {
        let db = Database::in_memory().unwrap();
        let user_id = db.create_user("A", "a@example.com", "h").unwrap().id;
        for i in 0..120 {
            db.create_expense(
                user_id,
                &NewExpense {
                    amount: Decimal::from(i),
                    category: Category::Other,
                    description: None,
                    date: NaiveDate::from_ymd_opt(2024, 1, 1),
                },
            )
            .unwrap();
        }

        let short = expenses_to_pdf(&[]).unwrap();
        let long = db.export_expenses_pdf(user_id).unwrap();
        assert!(long.starts_with(b"%PDF"));
        assert!(long.len() > short.len());
    }
}
