//! RAG 管道：文档 → 分块 → 向量化 → 持久化索引 → 检索 → grounded 生成
//!
//! 索引一次写入、多次读取，落盘于 `<storage_root>/<backend>/<run_id>/`，
//! manifest 最后写入，读到 manifest 即代表索引完整可用。

pub mod answer;
pub mod chunker;
pub mod ingest;
pub mod store;

pub use answer::{answer_question, DONT_KNOW_PREFIX};
pub use chunker::{Chunk, Chunker, Document};
pub use ingest::{ingest_documents, ingest_paths, IndexHandle, IngestOptions};
pub use store::{ScoredChunk, VectorIndex, DEFAULT_TOP_K, FLAT_BACKEND};
