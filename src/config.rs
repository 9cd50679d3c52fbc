//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `WREN__*` 覆盖（双下划线表示嵌套，
//! 如 `WREN__LLM__MODEL=gpt-4o-mini`）。API Key 只走环境变量
//! （OPENAI_API_KEY / WEATHER_API_KEY），不进配置文件。

use std::path::PathBuf;

use serde::Deserialize;

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    #[serde(default)]
    pub app: AppSection,
    #[serde(default)]
    pub llm: LlmSection,
    #[serde(default)]
    pub embedding: EmbeddingSection,
    #[serde(default)]
    pub weather: WeatherSection,
    #[serde(default)]
    pub index: IndexSection,
    #[serde(default)]
    pub tools: ToolsSection,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            app: AppSection::default(),
            llm: LlmSection::default(),
            embedding: EmbeddingSection::default(),
            weather: WeatherSection::default(),
            index: IndexSection::default(),
            tools: ToolsSection::default(),
        }
    }
}

/// [app] 段：索引存储根目录
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppSection {
    pub storage_root: PathBuf,
}

impl Default for AppSection {
    fn default() -> Self {
        Self {
            storage_root: PathBuf::from("./storage/vectordb"),
        }
    }
}

/// [llm] 段：补全模型与端点
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmSection {
    pub model: String,
    pub base_url: Option<String>,
    /// Agent 规划温度
    pub temperature: f32,
    /// grounded 检索问答温度
    pub answer_temperature: f32,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            base_url: None,
            temperature: 0.0,
            answer_temperature: 0.1,
        }
    }
}

/// [embedding] 段：嵌入模型与端点；入库与查询必须同一模型
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EmbeddingSection {
    pub model: String,
    pub base_url: Option<String>,
}

impl Default for EmbeddingSection {
    fn default() -> Self {
        Self {
            model: "text-embedding-3-small".to_string(),
            base_url: None,
        }
    }
}

/// [weather] 段：预报服务端点与限制
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WeatherSection {
    pub base_url: String,
    pub timeout_secs: u64,
    pub max_days: u32,
}

impl Default for WeatherSection {
    fn default() -> Self {
        Self {
            base_url: "http://api.weatherapi.com/v1".to_string(),
            timeout_secs: 15,
            max_days: 10,
        }
    }
}

/// [index] 段：后端、分块参数、检索条数与可选默认索引
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IndexSection {
    pub backend: String,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub top_k: usize,
    /// retrieval_qa 缺 path 时的回退索引
    pub default_index_path: Option<PathBuf>,
}

impl Default for IndexSection {
    fn default() -> Self {
        Self {
            backend: crate::rag::FLAT_BACKEND.to_string(),
            chunk_size: 1000,
            chunk_overlap: 150,
            top_k: crate::rag::DEFAULT_TOP_K,
            default_index_path: None,
        }
    }
}

/// [tools] 段：单次工具调用超时（秒）
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ToolsSection {
    pub tool_timeout_secs: u64,
}

impl Default for ToolsSection {
    fn default() -> Self {
        Self {
            tool_timeout_secs: 30,
        }
    }
}

/// 加载配置：TOML（可选）+ WREN__ 环境变量覆盖
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder();

    let default_names = ["config/default", "../config/default", "default"];
    for name in default_names {
        let path = format!("{}.toml", name);
        if std::path::Path::new(&path).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(ref path) = config_path {
        if path.exists() {
            builder = builder.add_source(config::File::from(path.clone()).required(false));
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("WREN")
            .separator("__")
            .try_parsing(true),
    );

    let c = builder.build()?;
    c.try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_sane() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.llm.model, "gpt-4o-mini");
        assert_eq!(cfg.embedding.model, "text-embedding-3-small");
        assert_eq!(cfg.index.chunk_size, 1000);
        assert_eq!(cfg.index.chunk_overlap, 150);
        assert_eq!(cfg.index.top_k, 4);
        assert_eq!(cfg.weather.max_days, 10);
    }
}
