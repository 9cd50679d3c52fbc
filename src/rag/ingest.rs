//! 文档入库：加载 → 分块 → 嵌入 → 建索引 → 落盘
//!
//! 每次调用生成新的 run_id，索引写入 `<storage_root>/<backend>/<run_id>/`，
//! 整体 all-or-nothing：manifest 落盘之前的任何失败都不会留下可读索引。

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::AgentError;
use crate::llm::EmbeddingProvider;
use crate::rag::chunker::{Chunker, Document};
use crate::rag::store::{IndexManifest, VectorIndex, FLAT_BACKEND};

/// 入库选项：后端、存储根目录、分块参数
#[derive(Debug, Clone)]
pub struct IngestOptions {
    pub backend: String,
    pub storage_root: PathBuf,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            backend: FLAT_BACKEND.to_string(),
            storage_root: PathBuf::from("./storage/vectordb"),
            chunk_size: 1000,
            chunk_overlap: 150,
        }
    }
}

/// 入库结果句柄：创建后不可变，之后仅凭 path 寻址
#[derive(Debug, Clone, Serialize)]
pub struct IndexHandle {
    pub backend: String,
    pub path: PathBuf,
    pub run_id: String,
    pub num_chunks: usize,
    pub num_docs: usize,
}

/// 从文件路径入库：逐个读为 UTF-8 文本，来源元数据即路径本身
///
/// 空列表 → Validation；文件缺失 → NotFound。
pub async fn ingest_paths(
    paths: &[String],
    embedder: &dyn EmbeddingProvider,
    opts: &IngestOptions,
) -> Result<IndexHandle, AgentError> {
    if paths.is_empty() {
        return Err(AgentError::Validation(
            "sources must be a non-empty list of file paths".to_string(),
        ));
    }
    let mut docs = Vec::with_capacity(paths.len());
    for p in paths {
        let path = Path::new(p);
        if !path.is_file() {
            return Err(AgentError::NotFound(format!("source not found: {}", p)));
        }
        let text = std::fs::read_to_string(path)
            .map_err(|e| AgentError::Internal(format!("read source '{}': {}", p, e)))?;
        docs.push(Document::new(text, p.clone()));
    }
    ingest_documents(docs, embedder, opts).await
}

/// 从内存文档入库（weather 工具的侧产物走这条路径）
pub async fn ingest_documents(
    docs: Vec<Document>,
    embedder: &dyn EmbeddingProvider,
    opts: &IngestOptions,
) -> Result<IndexHandle, AgentError> {
    if docs.is_empty() {
        return Err(AgentError::Validation(
            "documents must be a non-empty list".to_string(),
        ));
    }
    if opts.backend != FLAT_BACKEND {
        return Err(AgentError::Validation(format!(
            "unknown index backend '{}' (expected '{}')",
            opts.backend, FLAT_BACKEND
        )));
    }

    let chunker = Chunker::new(opts.chunk_size, opts.chunk_overlap);
    let chunks: Vec<_> = docs.iter().flat_map(|d| chunker.split(d)).collect();
    if chunks.is_empty() {
        return Err(AgentError::Validation(
            "documents produced no chunks (all sources empty?)".to_string(),
        ));
    }

    let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
    let vectors = embedder
        .embed_batch(&texts)
        .await
        .map_err(AgentError::Llm)?;
    let dim = vectors.first().map(|v| v.len()).unwrap_or(0);
    if dim == 0 {
        return Err(AgentError::Llm(
            "embedding provider returned empty vectors".to_string(),
        ));
    }

    let run_id = uuid::Uuid::new_v4().simple().to_string();
    let manifest = IndexManifest {
        backend: opts.backend.clone(),
        run_id: run_id.clone(),
        embed_model: embedder.model_id().to_string(),
        dim,
        num_chunks: chunks.len(),
        num_docs: docs.len(),
        created_at: chrono::Utc::now().to_rfc3339(),
    };

    let num_chunks = chunks.len();
    let num_docs = docs.len();
    let pairs = chunks.into_iter().zip(vectors).collect();
    let index = VectorIndex::build(manifest, pairs)?;

    let dir = opts.storage_root.join(&opts.backend).join(&run_id);
    index.persist(&dir)?;

    tracing::info!(
        run_id = %run_id,
        path = %dir.display(),
        num_chunks,
        num_docs,
        "index persisted"
    );

    Ok(IndexHandle {
        backend: opts.backend.clone(),
        path: dir,
        run_id,
        num_chunks,
        num_docs,
    })
}
