//! 工具注册表
//!
//! 所有工具实现 Tool trait（name / description / parameters_schema / execute），
//! 由 ToolRegistry 按名注册与查找。description 与 schema 会原样进入 LLM 的工具目录，
//! 是模型赖以正确构造调用的 API 契约：必须写清哪些字段必填、哪些可空缺（省略或 null）。

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

/// 工具 trait：名称、描述（供 LLM 理解）、参数 schema、异步执行（args 为 JSON）
#[async_trait]
pub trait Tool: Send + Sync {
    /// 工具名称（ReAct 输出 Action 行引用的名字）
    fn name(&self) -> &str;

    /// 工具描述（供 LLM 理解功能与字段契约）
    fn description(&self) -> &str;

    /// 参数 JSON Schema（schemars 生成，供 LLM 产出正确的 Action Input）
    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {},
            "required": []
        })
    }

    /// 执行工具；Ok 为 Observation 文本，Err 由执行器转为 ToolExecutionFailed
    async fn execute(&self, args: Value) -> Result<String, String>;
}

/// 工具注册表：按名称存储 Arc<dyn Tool>
#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, tool: impl Tool + 'static) {
        let name = tool.name().to_string();
        self.tools.insert(name, Arc::new(tool));
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// 工具名列表（排序保证 prompt 稳定）
    pub fn tool_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tools.keys().cloned().collect();
        names.sort();
        names
    }

    /// 渲染 prompt 中的工具目录：每个工具的名称、描述与参数 schema
    pub fn catalog(&self) -> String {
        let mut out = String::new();
        for name in self.tool_names() {
            let tool = &self.tools[&name];
            out.push_str(&format!(
                "- {}: {}\n  Args schema: {}\n",
                name,
                tool.description(),
                tool.parameters_schema()
            ));
        }
        out.trim_end().to_string()
    }
}
