//! HTTP request handlers organized by domain
//!
//! Each submodule contains handlers for a specific API area.

pub mod analytics;
pub mod auth;
pub mod budget;
pub mod expenses;
pub mod insights;
pub mod reports;

// Re-export all handlers for use in router
pub use analytics::*;
pub use auth::*;
pub use budget::*;
pub use expenses::*;
pub use insights::*;
pub use reports::*;
