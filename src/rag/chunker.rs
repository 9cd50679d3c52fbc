//! 文档分块器
//!
//! 递归边界策略：优先在段落（\n\n）断开，其次换行、空格，最后硬切；
//! 按目标块大小切分并在相邻块间保留重叠。大小以字符计，偏移以字节计（UTF-8 安全）。

/// 原始文档：全文 + 来源标识
#[derive(Debug, Clone)]
pub struct Document {
    pub text: String,
    pub source: String,
}

impl Document {
    pub fn new(text: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source: source.into(),
        }
    }
}

/// 检索单元：文档的有界片段
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    pub text: String,
    pub source: String,
    /// 在原文档中的起始位置（字节偏移）
    pub start_offset: usize,
}

/// 分隔符优先级（从高到低），末尾隐含硬切
const SEPARATORS: [&str; 3] = ["\n\n", "\n", " "];

/// 文档分块器：目标块大小 + 相邻块重叠
pub struct Chunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl Chunker {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        // 重叠不得吞掉整个块，否则无法前进
        let chunk_overlap = chunk_overlap.min(chunk_size.saturating_sub(1));
        Self {
            chunk_size: chunk_size.max(1),
            chunk_overlap,
        }
    }

    /// 将文档切为块；空文档返回空 Vec
    pub fn split(&self, doc: &Document) -> Vec<Chunk> {
        let chars: Vec<char> = doc.text.chars().collect();
        let total = chars.len();
        if total == 0 {
            return Vec::new();
        }

        // 每个字符的起始字节偏移，避免重复扫描
        let mut byte_at = Vec::with_capacity(total + 1);
        let mut acc = 0;
        for c in &chars {
            byte_at.push(acc);
            acc += c.len_utf8();
        }
        byte_at.push(acc);

        let mut chunks = Vec::new();
        let mut current = 0;

        while current < total {
            let target_end = (current + self.chunk_size).min(total);
            let mut actual_end = target_end;

            // 非文档末尾时尝试在分隔符处断开
            if target_end < total {
                let window: String = chars[current..target_end].iter().collect();
                for sep in SEPARATORS {
                    if let Some(pos) = window.rfind(sep) {
                        let chars_to_sep = window[..pos].chars().count() + sep.chars().count();
                        if chars_to_sep > 0 {
                            actual_end = current + chars_to_sep;
                            break;
                        }
                    }
                }
            }

            // 至少前进一个字符（窗口内没有任何分隔符时硬切）
            if actual_end <= current {
                actual_end = (current + 1).min(total);
            }

            let chunk_text: String = chars[current..actual_end].iter().collect();
            let trimmed = chunk_text.trim();
            if !trimmed.is_empty() {
                chunks.push(Chunk {
                    text: trimmed.to_string(),
                    source: doc.source.clone(),
                    start_offset: byte_at[current],
                });
            }

            let overlap = self.chunk_overlap.min(actual_end - current);
            let next_start = actual_end - overlap;
            current = if next_start > current {
                next_start
            } else {
                actual_end
            };
        }

        chunks
    }
}
