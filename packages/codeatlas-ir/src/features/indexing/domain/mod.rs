//! Indexing domain models

pub mod schema;

pub use schema::IndexDocument;
