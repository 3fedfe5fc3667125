//! 节点 arena：可编辑富文本的结构树。
//!
//! 约定：
//! - 释放的槽位进入空闲链表复用，槽位代数随之加一；删除后旧 id 失效
//!   （查询返回 None），因此拆分/合并后绝不依赖拆分前拿到的 id 仍指向同一内容
//! - 文本偏移按字符计

use mention_core::{
    model::NodeId,
    text::{char_len, splice_chars},
};

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Element {
        tag: String,
        attrs: Vec<(String, String)>,
    },
    Text(String),
    /// 零尺寸的测量标记（只在一次测量期间存在）
    Marker,
}

#[derive(Debug, Clone)]
struct NodeData {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    /// 选中写回时挂在新插入节点上的临时标记
    marked: bool,
}

#[derive(Debug, Clone)]
struct Slot {
    generation: u32,
    data: Option<NodeData>,
}

/// 节点树。根节点是一个 `div` 元素（可编辑区本身）。
#[derive(Debug, Clone)]
pub struct Document {
    slots: Vec<Slot>,
    free: Vec<usize>,
    root: NodeId,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        let mut doc = Self {
            slots: Vec::new(),
            free: Vec::new(),
            root: NodeId::new(0, 0),
        };
        doc.root = doc.create_element("div", Vec::new());
        doc
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    fn data(&self, id: NodeId) -> Option<&NodeData> {
        self.slots
            .get(id.slot)
            .filter(|s| s.generation == id.generation)
            .and_then(|s| s.data.as_ref())
    }

    fn data_mut(&mut self, id: NodeId) -> Option<&mut NodeData> {
        self.slots
            .get_mut(id.slot)
            .filter(|s| s.generation == id.generation)
            .and_then(|s| s.data.as_mut())
    }

    fn alloc(&mut self, kind: NodeKind) -> NodeId {
        let data = Some(NodeData {
            kind,
            parent: None,
            children: Vec::new(),
            marked: false,
        });
        match self.free.pop() {
            Some(slot) => {
                let s = &mut self.slots[slot];
                s.data = data;
                NodeId::new(slot, s.generation)
            }
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    data,
                });
                NodeId::new(self.slots.len() - 1, 0)
            }
        }
    }

    /// 释放一个槽位：代数加一，旧 id 随即失效。
    fn free_slot(&mut self, id: NodeId) -> Option<NodeData> {
        let slot = self
            .slots
            .get_mut(id.slot)
            .filter(|s| s.generation == id.generation)?;
        let data = slot.data.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.slot);
        Some(data)
    }

    /// arena 已分配的槽位数（含空闲槽位）。
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub fn is_live(&self, id: NodeId) -> bool {
        self.data(id).is_some()
    }

    pub fn kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.data(id).map(|d| &d.kind)
    }

    pub fn is_text(&self, id: NodeId) -> bool {
        matches!(self.kind(id), Some(NodeKind::Text(_)))
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        match self.kind(id) {
            Some(NodeKind::Text(s)) => Some(s),
            _ => None,
        }
    }

    pub fn set_text(&mut self, id: NodeId, text: impl Into<String>) {
        if let Some(NodeData {
            kind: NodeKind::Text(s),
            ..
        }) = self.data_mut(id)
        {
            *s = text.into();
        }
    }

    pub fn tag(&self, id: NodeId) -> Option<&str> {
        match self.kind(id) {
            Some(NodeKind::Element { tag, .. }) => Some(tag),
            _ => None,
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.data(id).and_then(|d| d.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.data(id).map(|d| d.children.as_slice()).unwrap_or(&[])
    }

    pub fn index_in_parent(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|&c| c == id)
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let i = self.index_in_parent(id)?;
        self.children(parent).get(i + 1).copied()
    }

    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.alloc(NodeKind::Text(text.into()))
    }

    pub fn create_element(&mut self, tag: &str, attrs: Vec<(String, String)>) -> NodeId {
        self.alloc(NodeKind::Element {
            tag: tag.to_ascii_lowercase(),
            attrs,
        })
    }

    pub fn create_marker(&mut self) -> NodeId {
        self.alloc(NodeKind::Marker)
    }

    /// 从原父节点摘下（不释放）。
    fn detach(&mut self, id: NodeId) {
        let Some(parent) = self.parent(id) else {
            return;
        };
        if let Some(p) = self.data_mut(parent) {
            p.children.retain(|&c| c != id);
        }
        if let Some(d) = self.data_mut(id) {
            d.parent = None;
        }
    }

    /// 把 `child` 插到 `parent` 的第 `index` 个位置（越界即追加）。
    pub fn insert_child(&mut self, parent: NodeId, index: usize, child: NodeId) {
        if !self.is_live(parent) || !self.is_live(child) {
            return;
        }
        self.detach(child);
        if let Some(p) = self.data_mut(parent) {
            let index = index.min(p.children.len());
            p.children.insert(index, child);
        }
        if let Some(c) = self.data_mut(child) {
            c.parent = Some(parent);
        }
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.insert_child(parent, usize::MAX, child);
    }

    /// 插到 `reference` 之后（同一父节点下）。
    pub fn insert_after(&mut self, reference: NodeId, node: NodeId) {
        let (Some(parent), Some(i)) = (self.parent(reference), self.index_in_parent(reference))
        else {
            return;
        };
        self.insert_child(parent, i + 1, node);
    }

    /// 摘下并释放整棵子树。
    pub fn remove(&mut self, id: NodeId) {
        if id == self.root {
            return;
        }
        self.detach(id);
        let mut stack = vec![id];
        while let Some(n) = stack.pop() {
            if let Some(d) = self.free_slot(n) {
                stack.extend(d.children);
            }
        }
    }

    /// 在 `at` 处拆分文本节点：原节点保留 `[..at)`，新节点承接 `[at..)` 并紧随其后。
    pub fn split_text(&mut self, id: NodeId, at: usize) -> Option<NodeId> {
        let text = self.text(id)?.to_string();
        let at = at.min(char_len(&text));
        let head = splice_chars(&text, at, usize::MAX, "");
        let tail = splice_chars(&text, 0, at, "");
        self.set_text(id, head);
        let tail_id = self.create_text(tail);
        self.insert_after(id, tail_id);
        Some(tail_id)
    }

    /// 把紧随其后的相邻文本节点并回 `id`，使这一段重新成为单个文本节点。
    pub fn merge_following_text(&mut self, id: NodeId) {
        let Some(mut merged) = self.text(id).map(str::to_string) else {
            return;
        };
        while let Some(next) = self.next_sibling(id) {
            let Some(t) = self.text(next) else {
                break;
            };
            merged.push_str(t);
            self.remove(next);
        }
        self.set_text(id, merged);
    }

    pub fn set_marked(&mut self, id: NodeId, on: bool) {
        if let Some(d) = self.data_mut(id) {
            d.marked = on;
        }
    }

    /// 先序查找带临时标记的节点。
    pub fn find_marked(&self, from: NodeId) -> Option<NodeId> {
        self.descendants(from)
            .into_iter()
            .find(|&n| self.data(n).is_some_and(|d| d.marked))
    }

    /// 先序遍历（含 `from` 自身）。
    pub fn descendants(&self, from: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![from];
        while let Some(n) = stack.pop() {
            if !self.is_live(n) {
                continue;
            }
            out.push(n);
            stack.extend(self.children(n).iter().rev());
        }
        out
    }

    /// 文档顺序下的全部文本节点。
    pub fn text_nodes(&self, from: NodeId) -> Vec<NodeId> {
        self.descendants(from)
            .into_iter()
            .filter(|&n| self.is_text(n))
            .collect()
    }

    /// 子树内全部文本拼接。
    pub fn text_content(&self, from: NodeId) -> String {
        self.text_nodes(from)
            .into_iter()
            .filter_map(|n| self.text(n))
            .collect()
    }
}
