//! 向量索引：内存余弦检索 + JSON 落盘
//!
//! 落盘布局：`<dir>/chunks.json`（块文本 + 向量）与 `<dir>/manifest.json`（元数据）。
//! manifest 最后写入：没有可读 manifest 的目录不是合法索引，写入中途失败不会留下半成品。
//! manifest 记录嵌入模型标识，open 时与查询方的模型比对，不一致即拒绝。

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::AgentError;
use crate::llm::EmbeddingProvider;
use crate::rag::chunker::Chunk;

/// 内置的唯一索引后端：内存平铺 + 余弦相似度
pub const FLAT_BACKEND: &str = "flat";

/// 检索条数默认值
pub const DEFAULT_TOP_K: usize = 4;

const MANIFEST_FILE: &str = "manifest.json";
const CHUNKS_FILE: &str = "chunks.json";

/// 索引元数据；embed_model / dim 用于入库与查询一致性校验
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexManifest {
    pub backend: String,
    pub run_id: String,
    pub embed_model: String,
    pub dim: usize,
    pub num_chunks: usize,
    pub num_docs: usize,
    pub created_at: String,
}

/// 落盘的块条目：文本、来源、偏移、向量
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredChunk {
    text: String,
    source: String,
    start_offset: usize,
    vector: Vec<f32>,
}

/// 检索结果：块 + 相似度分数
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    pub score: f32,
}

/// 向量索引：构建后不可变，persist 落盘，open 只读加载
#[derive(Debug)]
pub struct VectorIndex {
    manifest: IndexManifest,
    entries: Vec<StoredChunk>,
}

impl VectorIndex {
    /// 从 (chunk, vector) 对构建；所有向量必须同维
    pub(crate) fn build(
        manifest: IndexManifest,
        pairs: Vec<(Chunk, Vec<f32>)>,
    ) -> Result<Self, AgentError> {
        let dim = manifest.dim;
        let mut entries = Vec::with_capacity(pairs.len());
        for (chunk, vector) in pairs {
            if vector.len() != dim {
                return Err(AgentError::Internal(format!(
                    "embedding dimension mismatch while building index: expected {}, got {}",
                    dim,
                    vector.len()
                )));
            }
            entries.push(StoredChunk {
                text: chunk.text,
                source: chunk.source,
                start_offset: chunk.start_offset,
                vector,
            });
        }
        Ok(Self { manifest, entries })
    }

    pub fn manifest(&self) -> &IndexManifest {
        &self.manifest
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 落盘：chunks.json 先写，manifest.json 最后写
    pub fn persist(&self, dir: &Path) -> Result<(), AgentError> {
        std::fs::create_dir_all(dir)
            .map_err(|e| AgentError::Internal(format!("create index dir: {}", e)))?;
        let chunks = serde_json::to_string(&self.entries)
            .map_err(|e| AgentError::Internal(format!("serialize chunks: {}", e)))?;
        std::fs::write(dir.join(CHUNKS_FILE), chunks)
            .map_err(|e| AgentError::Internal(format!("write chunks: {}", e)))?;
        let manifest = serde_json::to_string_pretty(&self.manifest)
            .map_err(|e| AgentError::Internal(format!("serialize manifest: {}", e)))?;
        std::fs::write(dir.join(MANIFEST_FILE), manifest)
            .map_err(|e| AgentError::Internal(format!("write manifest: {}", e)))?;
        Ok(())
    }

    /// 加载持久化索引并校验嵌入模型一致性
    ///
    /// 路径不存在或缺 manifest → Validation（不是合法索引）；
    /// manifest 的 embed_model 与查询方不一致 → Validation（相似度无意义，硬失败）。
    pub fn open(path: &Path, embed_model: &str) -> Result<Self, AgentError> {
        let manifest_path = path.join(MANIFEST_FILE);
        if !manifest_path.is_file() {
            return Err(AgentError::Validation(format!(
                "'{}' does not resolve to a persisted index (missing manifest)",
                path.display()
            )));
        }
        let manifest: IndexManifest = serde_json::from_str(
            &std::fs::read_to_string(&manifest_path)
                .map_err(|e| AgentError::Internal(format!("read manifest: {}", e)))?,
        )
        .map_err(|e| AgentError::Validation(format!("corrupt index manifest: {}", e)))?;

        if manifest.embed_model != embed_model {
            return Err(AgentError::Validation(format!(
                "index was built with embed model '{}' but query uses '{}'",
                manifest.embed_model, embed_model
            )));
        }

        let entries: Vec<StoredChunk> = serde_json::from_str(
            &std::fs::read_to_string(path.join(CHUNKS_FILE))
                .map_err(|e| AgentError::Internal(format!("read chunks: {}", e)))?,
        )
        .map_err(|e| AgentError::Validation(format!("corrupt index chunks: {}", e)))?;

        Ok(Self { manifest, entries })
    }

    /// 相似度检索：返回 top-k 块（按余弦相似度降序）
    ///
    /// 空查询 → Validation；查询向量与索引维度不一致 → Validation。
    pub async fn search(
        &self,
        query: &str,
        embedder: &dyn EmbeddingProvider,
        k: usize,
    ) -> Result<Vec<ScoredChunk>, AgentError> {
        if query.trim().is_empty() {
            return Err(AgentError::Validation(
                "query text must be non-empty".to_string(),
            ));
        }
        let query_vec = embedder.embed(query).await.map_err(AgentError::Llm)?;
        if query_vec.len() != self.manifest.dim {
            return Err(AgentError::Validation(format!(
                "query embedding dimension {} does not match index dimension {}",
                query_vec.len(),
                self.manifest.dim
            )));
        }

        let mut scored: Vec<(f32, &StoredChunk)> = self
            .entries
            .iter()
            .map(|entry| (cosine_similarity(&query_vec, &entry.vector), entry))
            .collect();
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

        Ok(scored
            .into_iter()
            .take(k)
            .map(|(score, entry)| ScoredChunk {
                chunk: Chunk {
                    text: entry.text.clone(),
                    source: entry.source.clone(),
                    start_offset: entry.start_offset,
                },
                score,
            })
            .collect())
    }
}

/// 余弦相似度；维度不一致或零向量返回 0
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::HashEmbedder;

    fn manifest(dim: usize) -> IndexManifest {
        IndexManifest {
            backend: FLAT_BACKEND.to_string(),
            run_id: "test-run".to_string(),
            embed_model: "hash-bow-64".to_string(),
            dim,
            num_chunks: 0,
            num_docs: 1,
            created_at: "2024-01-01T00:00:00Z".to_string(),
        }
    }

    fn chunk(text: &str) -> Chunk {
        Chunk {
            text: text.to_string(),
            source: "test".to_string(),
            start_offset: 0,
        }
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
    }

    #[tokio::test]
    async fn test_persist_open_search_roundtrip() {
        let embedder = HashEmbedder::new();
        let texts = ["the quick brown fox", "an unrelated passage about storage"];
        let mut pairs = Vec::new();
        for t in texts {
            pairs.push((chunk(t), embedder.embed(t).await.unwrap()));
        }
        let mut m = manifest(64);
        m.num_chunks = pairs.len();
        let index = VectorIndex::build(m, pairs).unwrap();

        let dir = tempfile::tempdir().unwrap();
        index.persist(dir.path()).unwrap();

        let reopened = VectorIndex::open(dir.path(), "hash-bow-64").unwrap();
        assert_eq!(reopened.len(), 2);
        let hits = reopened
            .search("quick brown fox", &embedder, 1)
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].chunk.text, "the quick brown fox");
    }

    #[test]
    fn test_open_rejects_missing_index() {
        let dir = tempfile::tempdir().unwrap();
        let err = VectorIndex::open(&dir.path().join("nope"), "hash-bow-64").unwrap_err();
        assert!(matches!(err, AgentError::Validation(_)));
    }

    #[test]
    fn test_open_rejects_model_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let index = VectorIndex::build(manifest(2), vec![(chunk("x"), vec![1.0, 0.0])]).unwrap();
        index.persist(dir.path()).unwrap();
        let err = VectorIndex::open(dir.path(), "text-embedding-3-small").unwrap_err();
        assert!(matches!(err, AgentError::Validation(_)));
    }

    #[tokio::test]
    async fn test_search_rejects_empty_query() {
        let index = VectorIndex::build(manifest(64), Vec::new()).unwrap();
        let err = index
            .search("  ", &HashEmbedder::new(), 4)
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::Validation(_)));
    }
}
