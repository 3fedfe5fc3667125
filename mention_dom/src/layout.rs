//! `layout`：节点树的行内盒布局，用来量节点的包围矩形。
//!
//! 文本逐格排版（与平面镜像共用 `Typesetter`），块级元素前后换行，
//! `<br>` 强制换行，标记节点是笔位置处的零宽矩形。

use std::collections::HashMap;

use mention_core::{caret::Typesetter, config::SurfaceMetrics, model::NodeId, model::Rect};

use crate::node::{Document, NodeKind};

const BLOCK_TAGS: &[&str] = &[
    "div", "p", "li", "ul", "ol", "blockquote", "pre", "h1", "h2", "h3", "h4", "h5", "h6",
];

#[derive(Debug, Default)]
pub struct InlineLayout {
    rects: HashMap<NodeId, Rect>,
}

impl InlineLayout {
    pub fn compute(doc: &Document, root: NodeId, metrics: &SurfaceMetrics) -> Self {
        let mut layout = Self::default();
        let mut setter = Typesetter::new(metrics);
        layout.visit(doc, root, &mut setter);
        layout
    }

    pub fn rect(&self, id: NodeId) -> Option<Rect> {
        self.rects.get(&id).copied()
    }

    fn visit(&mut self, doc: &Document, id: NodeId, setter: &mut Typesetter<'_>) -> Option<Rect> {
        let rect = match doc.kind(id)? {
            NodeKind::Text(t) => {
                let start = setter.pen();
                t.chars()
                    .map(|ch| setter.place(ch))
                    .reduce(|a, b| a.union(&b))
                    .unwrap_or(start)
            }
            NodeKind::Marker => setter.pen(),
            NodeKind::Element { tag, .. } if tag == "br" => {
                let r = setter.pen();
                setter.break_line();
                r
            }
            NodeKind::Element { tag, .. } => {
                let block = BLOCK_TAGS.contains(&tag.as_str());
                if block && !setter.at_line_start() {
                    setter.break_line();
                }
                let start = setter.pen();
                let mut bounds: Option<Rect> = None;
                for &c in doc.children(id) {
                    if let Some(r) = self.visit(doc, c, setter) {
                        bounds = Some(bounds.map_or(r, |b| b.union(&r)));
                    }
                }
                if block && !setter.at_line_start() {
                    setter.break_line();
                }
                bounds.unwrap_or(start)
            }
        };
        self.rects.insert(id, rect);
        Some(rect)
    }
}

/// 量单个节点的包围矩形。
pub fn bounding_rect(doc: &Document, id: NodeId, metrics: &SurfaceMetrics) -> Option<Rect> {
    InlineLayout::compute(doc, doc.root(), metrics).rect(id)
}
