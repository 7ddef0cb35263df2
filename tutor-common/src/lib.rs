//! # Tutor Common Library
//!
//! Shared code for the tutoring plan tools including:
//! - Wire models exchanged with the progress-tracking API
//! - Authenticated session and access rules
//! - Configuration loading
//! - JSON data file parsing

pub mod config;
pub mod error;
pub mod models;
pub mod session;

pub use error::{Error, Result};
pub use models::{CatalogBook, CatalogId, Preset, PresetBookRef, PresetId, ProgressItem, StudentId};
pub use session::{AuthSession, Role, Session};
