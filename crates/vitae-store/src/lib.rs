//! Vitae Store: SQLite persistence for accounts, personal details,
//! CV sections and lookup values.

pub mod schema;
pub mod section;
pub mod sqlite;
pub mod types;

pub use section::{Certification, Education, Employment, Patent, Publication, Section};
pub use sqlite::SqliteStore;
pub use types::*;
