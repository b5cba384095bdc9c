//! In-process facade used by the request layer.
//!
//! # Modules
//!
//! - `input` - Draft and line inputs with their validation
//! - `documents` - The `DocumentService` facade
//! - `error` - `ServiceError` and conversions into `AppError`

pub mod documents;
pub mod error;
pub mod input;

pub use documents::DocumentService;
pub use error::ServiceError;
pub use input::{DocumentDetails, DraftInput, LineInput, LinesInput};
