//! `TreeSurface`：可编辑节点树（contenteditable 一类）的文本表面。
//!
//! 与平面缓冲不同，这里的光标是“节点 + 偏移”，且拆分/合并会让节点身份变化。
//! 选中写回因此分两个阶段：先做结构拼接，再靠临时标记重新找到插入的节点，
//! 而不是相信拼接前拿到的节点引用。

use mention_core::{
    config::SurfaceMetrics,
    model::{AnchorRef, CaretInfo, NodeId},
    surface::{SurfaceKind, TextSurface},
    text::{char_len, rfind_trigger, splice_chars},
};

use crate::{
    layout::bounding_rect,
    markup::{inner_markup, parse_fragment, parse_into},
    node::Document,
};

/// 树上的一个位置（DOM Range 的 collapsed 端点）。
///
/// - `node` 是文本节点：`offset` 为字符偏移
/// - `node` 是元素：`offset` 为子节点下标
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub node: NodeId,
    pub offset: usize,
}

impl Position {
    pub fn new(node: NodeId, offset: usize) -> Self {
        Self { node, offset }
    }
}

#[derive(Debug, Clone)]
pub struct TreeSurface {
    doc: Document,
    selection: Option<Position>,
    /// 程序化插入后待恢复的光标锚点
    pending: Option<Position>,
    metrics: SurfaceMetrics,
}

impl TreeSurface {
    pub fn new(metrics: SurfaceMetrics) -> Self {
        Self {
            doc: Document::new(),
            selection: None,
            pending: None,
            metrics,
        }
    }

    /// 从标记构建；光标放在内容末尾。
    pub fn from_markup(markup: &str, metrics: SurfaceMetrics) -> Self {
        let mut surface = Self::new(metrics);
        let root = surface.doc.root();
        parse_into(&mut surface.doc, root, markup);
        surface.place_caret_at_end();
        surface
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn selection(&self) -> Option<Position> {
        self.selection
    }

    pub fn set_selection(&mut self, pos: Position) {
        if self.doc.is_live(pos.node) {
            self.selection = Some(pos);
        }
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    pub fn place_caret_at_end(&mut self) {
        let total = char_len(&self.read());
        self.move_caret_to(total);
    }

    pub fn to_markup(&self) -> String {
        inner_markup(&self.doc, self.doc.root())
    }

    /// 光标在整个文本内容上的偏移。
    pub fn caret_global(&self) -> Option<usize> {
        let pos = self.selection?;
        let root = self.doc.root();
        let mut before = 0;
        for n in self.doc.descendants(root) {
            if n == pos.node {
                break;
            }
            before += self.doc.text(n).map(char_len).unwrap_or(0);
        }
        if self.doc.is_text(pos.node) {
            return Some(before + pos.offset);
        }
        let inside: usize = self.doc.children(pos.node)[..pos.offset.min(self.doc.children(pos.node).len())]
            .iter()
            .map(|&c| char_len(&self.doc.text_content(c)))
            .sum();
        Some(before + inside)
    }

    /// 全局偏移 -> 文本节点内位置；落在两个节点交界处时取前一个。
    fn resolve(&self, offset: usize) -> Option<Position> {
        let mut start = 0;
        let mut last = None;
        for n in self.doc.text_nodes(self.doc.root()) {
            let len = self.doc.text(n).map(char_len).unwrap_or(0);
            if offset <= start + len {
                return Some(Position::new(n, offset - start));
            }
            start += len;
            last = Some(Position::new(n, len));
        }
        last
    }

    /// 光标前紧邻的兄弟节点（光标在文本开头或元素位置时）。
    fn node_before_caret(&self, pos: Position) -> Option<NodeId> {
        if self.doc.is_text(pos.node) {
            let parent = self.doc.parent(pos.node)?;
            let i = self.doc.index_in_parent(pos.node)?;
            i.checked_sub(1).map(|j| self.doc.children(parent)[j])
        } else {
            pos.offset
                .checked_sub(1)
                .and_then(|j| self.doc.children(pos.node).get(j).copied())
        }
    }

    /// 阶段二：找到带标记的节点，把光标放到它之后，然后去掉标记。
    fn restore_caret_after_marker(&mut self, fallback: NodeId) {
        let Some(marked) = self.doc.find_marked(self.doc.root()) else {
            // 回调没有产出任何节点：光标留在拼接点
            self.selection = Some(Position::new(fallback, 0));
            return;
        };
        self.doc.set_marked(marked, false);
        self.selection = match self.doc.next_sibling(marked) {
            Some(next) if self.doc.is_text(next) => Some(Position::new(next, 0)),
            _ => match (self.doc.parent(marked), self.doc.index_in_parent(marked)) {
                (Some(parent), Some(i)) => Some(Position::new(parent, i + 1)),
                _ => None,
            },
        };
    }
}

impl TextSurface for TreeSurface {
    fn kind(&self) -> SurfaceKind {
        SurfaceKind::Tree
    }

    fn read(&self) -> String {
        self.doc.text_content(self.doc.root())
    }

    fn snapshot(&self) -> String {
        self.to_markup()
    }

    fn anchor_text(&self) -> Option<String> {
        let pos = self.selection?;
        self.doc.text(pos.node).map(str::to_string)
    }

    fn caret_offset(&self) -> Option<usize> {
        let pos = self.selection?;
        self.doc.is_text(pos.node).then_some(pos.offset)
    }

    fn splice(&mut self, start: usize, end: usize, replacement: &str) -> String {
        let total = char_len(&self.read());
        let start = start.min(total);
        let end = end.clamp(start, total);
        let root = self.doc.root();

        let Some(at) = self.resolve(start) else {
            // 还没有任何文本节点
            parse_into(&mut self.doc, root, replacement);
            return self.read();
        };
        // 让 start 成为节点边界：at.node 以 start 结尾
        let Some(tail) = self.doc.split_text(at.node, at.offset) else {
            return self.read();
        };

        // 删掉 [start, end) 内的文本
        let mut emptied = Vec::new();
        let mut pos = 0;
        for n in self.doc.text_nodes(root) {
            let text = self.doc.text(n).unwrap_or_default().to_string();
            let len = char_len(&text);
            let (a, b) = (pos, pos + len);
            pos = b;
            if n == at.node || b <= start || a >= end {
                continue;
            }
            let (lo, hi) = (start.max(a) - a, end.min(b) - a);
            let rest = splice_chars(&text, lo, hi, "");
            if rest.is_empty() {
                emptied.push(n);
            }
            self.doc.set_text(n, rest);
        }
        // 删空的文本节点移除；父元素因此没有任何子节点时一并移除。
        // 只看子节点列表，不看文本：无文本的元素（img、br）属于区间外内容
        for n in emptied {
            let mut top = n;
            while let Some(parent) = self.doc.parent(top) {
                if parent == root || self.doc.children(parent) != [top] {
                    break;
                }
                top = parent;
            }
            if top != tail {
                self.doc.remove(top);
            }
        }

        let mut prev = at.node;
        for n in parse_fragment(&mut self.doc, replacement) {
            self.doc.insert_after(prev, n);
            prev = n;
        }
        if self.doc.text(tail) == Some("") && self.selection.map(|p| p.node) != Some(tail) {
            self.doc.remove(tail);
        }
        if !self.selection.is_some_and(|p| self.doc.is_live(p.node)) {
            self.selection = Some(at);
        }
        self.read()
    }

    fn move_caret_to(&mut self, offset: usize) {
        self.selection = match self.resolve(offset) {
            Some(pos) => Some(pos),
            None => {
                let root = self.doc.root();
                let t = self.doc.create_text("");
                self.doc.append_child(root, t);
                Some(Position::new(t, 0))
            }
        };
    }

    fn insert_text(&mut self, text: &str) {
        if self.selection.is_none() {
            self.place_caret_at_end();
        }
        let Some(pos) = self.selection else {
            return;
        };
        if let Some(current) = self.doc.text(pos.node) {
            let updated = splice_chars(current, pos.offset, pos.offset, text);
            self.doc.set_text(pos.node, updated);
            self.selection = Some(Position::new(pos.node, pos.offset + char_len(text)));
        } else {
            let t = self.doc.create_text(text);
            self.doc.insert_child(pos.node, pos.offset, t);
            self.selection = Some(Position::new(t, char_len(text)));
        }
    }

    fn delete_backward(&mut self) {
        let Some(pos) = self.selection else {
            return;
        };
        if pos.offset > 0 {
            if let Some(current) = self.doc.text(pos.node) {
                let updated = splice_chars(current, pos.offset - 1, pos.offset, "");
                self.doc.set_text(pos.node, updated);
                self.selection = Some(Position::new(pos.node, pos.offset - 1));
                return;
            }
        }
        let Some(before) = self.node_before_caret(pos) else {
            return;
        };
        if let Some(current) = self.doc.text(before) {
            let len = char_len(current);
            let updated = splice_chars(current, len.saturating_sub(1), len, "");
            self.doc.set_text(before, updated);
        } else {
            // 行内元素（例如提及标签）整体删除
            self.doc.remove(before);
            if !self.doc.is_text(pos.node) {
                self.selection = Some(Position::new(pos.node, pos.offset - 1));
            }
        }
    }

    fn insert_trigger(&mut self, trigger: char) -> bool {
        let Some(pos) = self.selection else {
            return false;
        };
        let mut buf = [0u8; 4];
        let trigger_str = trigger.encode_utf8(&mut buf);
        if let Some(current) = self.doc.text(pos.node) {
            let updated = splice_chars(current, pos.offset, pos.offset, trigger_str);
            self.doc.set_text(pos.node, updated);
            self.pending = Some(Position::new(pos.node, pos.offset + 1));
        } else {
            let t = self.doc.create_text(trigger_str.to_string());
            self.doc.insert_child(pos.node, pos.offset, t);
            self.pending = Some(Position::new(t, 1));
        }
        true
    }

    fn sync_caret(&mut self) {
        if let Some(pos) = self.pending.take() {
            self.set_selection(pos);
        }
    }

    fn locate(&mut self, trigger: char) -> Option<CaretInfo> {
        let pos = self.selection?;
        let text = self.doc.text(pos.node)?.to_string();
        let trigger_at = rfind_trigger(&text, pos.offset, trigger)?;

        // 在触发符之后拆开，插入零尺寸标记，量完再删掉并归并回单个文本节点
        self.doc.split_text(pos.node, trigger_at + 1)?;
        let marker = self.doc.create_marker();
        self.doc.insert_after(pos.node, marker);
        let coordinate = bounding_rect(&self.doc, marker, &self.metrics);
        self.doc.remove(marker);
        self.doc.merge_following_text(pos.node);
        self.selection = Some(pos);

        tracing::trace!(node = ?pos.node, trigger_at, caret = pos.offset, ?coordinate, "tree caret located");
        Some(CaretInfo {
            coordinate,
            offset: pos.offset,
            anchor: AnchorRef::Node(pos.node),
        })
    }

    fn apply_selection(&mut self, trigger_offset: usize, caret: &CaretInfo, insert: &str) {
        let AnchorRef::Node(anchor) = caret.anchor else {
            return;
        };
        let Some(len) = self.doc.text(anchor).map(char_len) else {
            tracing::trace!(?anchor, "anchor node gone, selection not applied");
            return;
        };
        if trigger_offset > len {
            return;
        }
        let end = match self.selection {
            Some(p) if p.node == anchor => p.offset,
            _ => caret.offset,
        }
        .clamp(trigger_offset, len);
        if end == trigger_offset {
            // 区间里连触发符都没有：上一次写回之后的重复提交
            return;
        }

        // 阶段一：结构拼接
        let Some(after) = self.doc.split_text(anchor, end) else {
            return;
        };
        if let Some(span) = self.doc.split_text(anchor, trigger_offset) {
            self.doc.remove(span);
        }
        let fragment = parse_fragment(&mut self.doc, insert);
        let mut prev = anchor;
        for &n in &fragment {
            self.doc.insert_after(prev, n);
            prev = n;
        }
        if let Some(&first) = fragment.first() {
            self.doc.set_marked(first, true);
        }
        if self.doc.text(anchor) == Some("") {
            self.doc.remove(anchor);
        }
        self.selection = None;

        // 阶段二：按标记重新定位光标
        self.restore_caret_after_marker(after);
    }
}
