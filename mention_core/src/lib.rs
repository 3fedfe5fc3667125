//! `mention_core`：纯逻辑层，不做任何 I/O。
//!
//! 设计目标：
//! - **核心可复用**：input、textarea、富文本节点树共用同一套状态机
//! - **分层清晰**：surface -> caret -> context/processor -> filter -> 输出（`UiState` + `Action`）
//! - **宿主无关**：浮层定位与候选渲染交给协作者，引擎只给锚点坐标与开关信号
pub mod caret;
pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod filter;
pub mod key_event;
pub mod layer;
pub mod model;
pub mod processor;
pub mod session;
pub mod surface;
pub mod text;
