//! `mention_dom`：富文本节点树表面。
//!
//! - `node`：节点 arena（槽位复用，id 带代数不复用）
//! - `markup`：片段解析与序列化，选中回调产出的标记由此变成节点
//! - `layout`：行内盒布局，量测量标记的坐标
//! - `surface`：`TreeSurface`，实现 `mention_core::surface::TextSurface`
pub mod layout;
pub mod markup;
pub mod node;
pub mod surface;

pub use node::{Document, NodeKind};
pub use surface::{Position, TreeSurface};
