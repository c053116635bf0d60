#![forbid(unsafe_code)]

pub mod repository;
pub mod sqlite;

pub use repository::{
    HistoryRepository, InMemoryRepository, NewHistoryRecord, Storage, StorageError,
};
