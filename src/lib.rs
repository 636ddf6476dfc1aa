pub mod config;
pub mod db;
pub mod error;
pub mod export;
pub mod ingest;
pub mod models;
pub mod mutation;
pub mod search;
pub mod store;
pub mod utils;

pub use error::{ErrorCode, RecordError};
pub use models::{Payload, Record};
pub use store::RecordStore;
