//! Core types shared by every layer of yaml-include
//!
//! - [`IncludeError`] - Enumerated error types for every failure mode
//! - [`ErrorContext`] - User-friendly error wrapper with suggestions and details
//! - [`user_friendly_error`] - Convert any error to the user-friendly format

pub mod error;

pub use error::{ErrorContext, IncludeError, Result, user_friendly_error};
