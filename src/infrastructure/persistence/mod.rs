//! Pin and photo record persistence.

pub mod schema;
pub mod sqlite_store;

pub use sqlite_store::SqlitePinStore;
