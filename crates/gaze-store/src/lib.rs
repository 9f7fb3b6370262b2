//! Persistence for the gaze gallery: TOML settings, the JSON content
//! catalog, and SQLite dwell statistics plus selection history.

pub mod catalog;
pub mod error;
pub mod schema;
pub mod settings;
pub mod store;

pub use catalog::{Catalog, CatalogIssue};
pub use error::{Result, StoreError};
pub use settings::{Settings, default_base_dir};
pub use store::{CommitRecord, DwellStat, Store};
