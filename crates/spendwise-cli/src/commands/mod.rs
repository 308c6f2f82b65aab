//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `budget` - Budget commands (set, list)
//! - `core` - Core commands (init) and shared utilities (open_db, find_user)
//! - `insights` - Rule-based insight summary
//! - `reports` - CSV/PDF expense export
//! - `serve` - Web server command
//! - `users` - User registration

pub mod budget;
pub mod core;
pub mod insights;
pub mod reports;
pub mod serve;
pub mod users;

// Re-export command functions for main.rs
pub use budget::*;
pub use core::*;
pub use insights::*;
pub use reports::*;
pub use serve::*;
pub use users::*;
