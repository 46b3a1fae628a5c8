pub mod postgres;
pub mod types;

#[cfg(test)]
pub mod memory;

pub use postgres::PgChunkStore;
pub use types::{ChunkMatch, ChunkStore};
