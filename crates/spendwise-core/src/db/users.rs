//! User account operations

use rusqlite::{params, OptionalExtension, Row};
use rust_decimal::Decimal;

use super::{parse_datetime, Database};
use crate::error::{Error, Result};
use crate::models::{from_minor_units, to_minor_units, validate_amount, User, UserCredentials};

const USER_COLUMNS: &str = "id, name, email, default_budget_cents, created_at";

fn row_to_user(row: &Row<'_>) -> rusqlite::Result<User> {
    let default_budget: Option<i64> = row.get(3)?;
    let created_at_str: String = row.get(4)?;
    Ok(User {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        default_budget: default_budget.map(from_minor_units),
        created_at: parse_datetime(&created_at_str),
    })
}

fn default_budget_cents(amount: Decimal) -> Result<i64> {
    validate_amount(amount)?;
    to_minor_units(amount)
}

/// Emails are matched case-insensitively by storing them lowercased
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl Database {
    /// Register a new user; the caller supplies an already-hashed password
    pub fn create_user(&self, name: &str, email: &str, password_hash: &str) -> Result<User> {
        self.create_user_with_budget(name, email, password_hash, None)
    }

    /// Register a new user with an optional default budget
    ///
    /// The default budget is what insights and alerts fall back to when the
    /// user has not set a monthly or weekly budget.
    pub fn create_user_with_budget(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
        default_budget: Option<Decimal>,
    ) -> Result<User> {
        let name = name.trim();
        let email = normalize_email(email);
        if name.is_empty() {
            return Err(Error::validation("Name is required"));
        }
        if email.is_empty() || !email.contains('@') {
            return Err(Error::validation("A valid email is required"));
        }
        let default_cents = default_budget.map(default_budget_cents).transpose()?;

        let conn = self.conn()?;
        let inserted = conn.execute(
            "INSERT INTO users (name, email, password_hash, default_budget_cents) VALUES (?, ?, ?, ?)",
            params![name, email, password_hash, default_cents],
        );

        match inserted {
            Ok(_) => {}
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                return Err(Error::Conflict("User already exists".to_string()));
            }
            Err(e) => return Err(e.into()),
        }

        let id = conn.last_insert_rowid();
        self.get_user(id)?
            .ok_or_else(|| Error::not_found("User not found after creation"))
    }

    /// Get a user by ID
    pub fn get_user(&self, id: i64) -> Result<Option<User>> {
        let conn = self.conn()?;
        let user = conn
            .query_row(
                &format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS),
                params![id],
                row_to_user,
            )
            .optional()?;
        Ok(user)
    }

    /// Get a user by email
    pub fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let conn = self.conn()?;
        let user = conn
            .query_row(
                &format!("SELECT {} FROM users WHERE email = ?", USER_COLUMNS),
                params![normalize_email(email)],
                row_to_user,
            )
            .optional()?;
        Ok(user)
    }

    /// Get a user together with the stored password hash (login only)
    pub fn get_user_credentials_by_email(&self, email: &str) -> Result<Option<UserCredentials>> {
        let conn = self.conn()?;
        let creds = conn
            .query_row(
                &format!(
                    "SELECT {}, password_hash FROM users WHERE email = ?",
                    USER_COLUMNS
                ),
                params![normalize_email(email)],
                |row| {
                    Ok(UserCredentials {
                        user: row_to_user(row)?,
                        password_hash: row.get(5)?,
                    })
                },
            )
            .optional()?;
        Ok(creds)
    }
}
