//! Shared request, response, and configuration types

pub mod environment;
pub mod error;
pub mod extractors;

pub use environment::Environment;
pub use error::{ApiErrorResponse, AppError};
pub use extractors::ValidatedJson;
