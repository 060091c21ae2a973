//! Command-line entry points.

pub mod credentials;
pub mod ocr;
pub mod schema;
