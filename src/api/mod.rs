//! GymCRM REST backend: client, errors and wire records.

pub mod client;
pub mod error;
pub mod types;

pub use client::{ApiClient, Params};
pub use error::{ApiError, ErrorInfo};
