//! Data model for dynamically-schemaed tables.

pub mod types;

pub use types::{Row, Table};
