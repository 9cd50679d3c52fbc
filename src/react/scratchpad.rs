//! Scratchpad：单次请求内的 思考/动作/观察 轨迹
//!
//! 每轮循环追加一条记录，渲染后拼回下一轮 prompt；随请求结束丢弃，绝不持久化。

use serde_json::Value;

/// 一轮循环的记录；解析失败的轮次没有 action，只有错误 Observation
#[derive(Debug, Clone)]
pub struct ReactStep {
    pub thought: String,
    pub action: Option<(String, Value)>,
    pub observation: String,
}

/// 当前请求的轨迹
#[derive(Debug, Clone, Default)]
pub struct Scratchpad {
    steps: Vec<ReactStep>,
}

impl Scratchpad {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, step: ReactStep) {
        self.steps.push(step);
    }

    pub fn steps(&self) -> &[ReactStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// 渲染为 prompt 里的 agent_scratchpad 段落
    pub fn render(&self) -> String {
        let mut out = String::new();
        for step in &self.steps {
            if !step.thought.is_empty() {
                out.push_str(&format!("Thought: {}\n", step.thought));
            }
            if let Some((tool, input)) = &step.action {
                out.push_str(&format!("Action: {}\nAction Input: {}\n", tool, input));
            }
            out.push_str(&format!("Observation: {}\n", step.observation));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_render_action_step() {
        let mut pad = Scratchpad::new();
        pad.push(ReactStep {
            thought: "need the weather".to_string(),
            action: Some(("weather_tool".to_string(), json!({"location": "Lahore"}))),
            observation: "Provide number of days".to_string(),
        });
        let rendered = pad.render();
        assert!(rendered.contains("Thought: need the weather"));
        assert!(rendered.contains("Action: weather_tool"));
        assert!(rendered.contains("Observation: Provide number of days"));
    }

    #[test]
    fn test_render_parse_error_step_has_no_action() {
        let mut pad = Scratchpad::new();
        pad.push(ReactStep {
            thought: String::new(),
            action: None,
            observation: "Could not parse".to_string(),
        });
        let rendered = pad.render();
        assert!(!rendered.contains("Action:"));
        assert!(rendered.contains("Observation: Could not parse"));
    }
}
