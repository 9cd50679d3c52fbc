//! 工具箱：年龄计算、天气查询、检索问答，与注册表 / 执行器

pub mod age;
pub mod executor;
pub mod input;
pub mod registry;
pub mod retrieval;
pub mod weather;

pub use age::AgeCalculatorTool;
pub use executor::ToolExecutor;
pub use registry::{Tool, ToolRegistry};
pub use retrieval::{chained_handoff, RetrievalQaTool};
pub use weather::WeatherTool;
