//! 对话记忆重建
//!
//! 按序扫描 transcript（不含最后一条活跃 user 消息），将相邻的 user → assistant
//! 配成 (user_input, assistant_output) 对。system 消息与配不上对的消息直接丢弃：
//! 连续多条 user 时后者覆盖前者（last wins），落单的 assistant 忽略。
//! 这是有意的「尽力而为」语义，换取对乱序/残缺 transcript 的健壮性。

use crate::memory::{Message, Role};

/// 单次请求的只读对话记忆：有序的 (user, assistant) 对
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    pairs: Vec<(String, String)>,
}

impl MemoryStore {
    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// 渲染为 prompt 中的 chat_history 段落；空记忆返回 "(empty)"
    pub fn render(&self) -> String {
        if self.pairs.is_empty() {
            return "(empty)".to_string();
        }
        let mut out = String::new();
        for (user, assistant) in &self.pairs {
            out.push_str("User: ");
            out.push_str(user);
            out.push('\n');
            out.push_str("Assistant: ");
            out.push_str(assistant);
            out.push('\n');
        }
        out.trim_end().to_string()
    }
}

/// 从历史消息重建 MemoryStore（调用方须已剥离最后一条活跃 user 消息）
pub fn reconstruct(history: &[Message]) -> MemoryStore {
    let mut pairs = Vec::new();
    let mut pending_user: Option<&str> = None;

    for msg in history {
        match msg.role {
            Role::User => {
                // 连续 user：后者覆盖前者
                pending_user = Some(msg.content.as_str());
            }
            Role::Assistant => {
                if let Some(user) = pending_user.take() {
                    pairs.push((user.to_string(), msg.content.clone()));
                }
                // 没有待配对 user 的 assistant 消息直接忽略
            }
            Role::System => {}
        }
    }

    MemoryStore { pairs }
}
