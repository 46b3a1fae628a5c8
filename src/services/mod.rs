pub mod collection;
pub mod document;
pub mod ingest;
pub mod search;
pub mod storage;
pub mod user;
