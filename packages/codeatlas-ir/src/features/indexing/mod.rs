//! Index transformation feature

pub mod domain;
pub mod infrastructure;

pub use domain::IndexDocument;
pub use infrastructure::IndexTransformer;
