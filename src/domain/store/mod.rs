//! Store domain - abstraction over the external key-value backend

mod repository;

pub use repository::KeyValueStore;
