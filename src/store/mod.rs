pub mod catalog;
pub mod json_store;
pub mod store_structs;

pub use catalog::CatalogError;
pub use json_store::{JsonStore, StoreError};
pub use store_structs::{ItemRecord, RatingStore, TotalStats};
