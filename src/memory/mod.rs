//! 记忆层：消息类型与按请求重建的对话记忆
//!
//! 服务端不保存会话：每次请求由客户端提交完整 transcript，
//! reconstruct 将其还原为只读的 MemoryStore，请求结束即丢弃。

pub mod conversation;
pub mod reconstruct;

pub use conversation::{Message, Role};
pub use reconstruct::{reconstruct, MemoryStore};
