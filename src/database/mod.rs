pub mod dynamo;
pub mod memory;
pub mod models;
pub mod repository;
pub mod store;
pub mod tables;

pub use dynamo::DynamoStore;
pub use memory::{MemoryStore, TableSchema};
pub use repository::Repository;
pub use store::{key_of, Item, KeyValueStore, Page, QueryRequest, ScanRequest, Select, StoreError};
pub use tables::{LookupKind, LookupTables, MemberRepository, SessionRepository};
