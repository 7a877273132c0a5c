//! Core library modules for mediafire-dl
//!
//! This module contains the internal implementation details of the
//! mediafire-dl library.

pub mod api;
pub mod digest;
pub mod error;
pub mod naming;
pub mod resolver;
pub mod scheduler;
pub mod task;
pub mod walker;

// Re-export main types for internal use
pub use api::{ApiClient, ApiConfig};
pub use scheduler::FetchOptions;
pub use walker::{Summary, Walker};
