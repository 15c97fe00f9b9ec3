pub mod manager;
pub mod memory;
pub mod query_builder;
pub mod repository;
pub mod store;

pub use manager::{DatabaseError, DatabaseManager};
pub use memory::MemoryStore;
pub use repository::PgStore;
pub use store::{Record, Store, StoreError};
