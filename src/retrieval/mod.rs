pub mod chunking;
pub mod embeddings;
pub mod extract;
pub mod ranker;
pub mod vector;
