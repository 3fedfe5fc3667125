//! `surface`：文本表面适配层。
//!
//! 两种结构差异很大的表面共用同一个能力接口：
//! - `FlatSurface`：单字符串 + 标量光标（本 crate）
//! - `TreeSurface`：节点树 + 选区（`mention_dom`）
//!
//! 具体实现在绑定时选定一次，之后引擎只通过 `TextSurface` 访问。

use crate::{
    caret::locate_flat,
    config::SurfaceMetrics,
    model::CaretInfo,
    text::{char_len, splice_chars},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceKind {
    Flat,
    Tree,
}

/// 文本表面能力接口。所有偏移按字符计。
pub trait TextSurface {
    fn kind(&self) -> SurfaceKind;

    /// 当前完整文本内容（节点树为各文本节点拼接）。
    fn read(&self) -> String;

    /// 给人看的内容快照（节点树输出标记，平面缓冲即原值）。
    fn snapshot(&self) -> String {
        self.read()
    }

    /// 锚点单元的文本。
    fn anchor_text(&self) -> Option<String>;

    /// 光标在锚点文本内的偏移。
    fn caret_offset(&self) -> Option<usize>;

    /// 用 `replacement` 替换 `[start, end)`，区间外内容原样保留；返回新内容。
    fn splice(&mut self, start: usize, end: usize, replacement: &str) -> String;

    /// 把光标放到给定偏移（整个文本内容上的偏移）。
    fn move_caret_to(&mut self, offset: usize);

    /// 宿主输入：在光标处插入纯文本并推进光标。
    fn insert_text(&mut self, text: &str);

    /// 宿主输入：删除光标前一个字符。
    fn delete_backward(&mut self);

    /// 程序化触发：在光标处插入触发符，并记下稳定的光标锚点。
    ///
    /// 宿主的光标记录不会同步更新，直到下一次变更通知回到引擎时
    /// 由 `sync_caret` 按记录的锚点恢复。没有光标时返回 false。
    fn insert_trigger(&mut self, trigger: char) -> bool;

    /// 处理变更通知前调用：若有待恢复的锚点则据此重建光标。
    fn sync_caret(&mut self);

    /// 光标定位：检测光标附近是否有活动的触发序列，并给出坐标。
    fn locate(&mut self, trigger: char) -> Option<CaretInfo>;

    /// 写入选中结果：用 `insert` 替换触发符到光标的区间，并把光标放到插入内容之后。
    fn apply_selection(&mut self, trigger_offset: usize, caret: &CaretInfo, insert: &str);
}

/// 平面缓冲（input/textarea）。
#[derive(Debug, Clone, Default)]
pub struct FlatSurface {
    value: String,
    caret: usize,
    metrics: SurfaceMetrics,
    /// 程序化插入后待恢复的光标
    pending_caret: Option<usize>,
}

impl FlatSurface {
    pub fn new(metrics: SurfaceMetrics) -> Self {
        Self {
            metrics,
            ..Self::default()
        }
    }

    /// 设置初始内容，光标放在末尾。
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self.caret = char_len(&self.value);
        self
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn caret(&self) -> usize {
        self.caret
    }

    /// 宿主整体改写值（例如数据绑定）；光标会被截到新内容范围内。
    pub fn set_value(&mut self, value: impl Into<String>, caret: usize) {
        self.value = value.into();
        self.caret = caret.min(char_len(&self.value));
    }

    pub fn metrics(&self) -> &SurfaceMetrics {
        &self.metrics
    }
}

impl TextSurface for FlatSurface {
    fn kind(&self) -> SurfaceKind {
        SurfaceKind::Flat
    }

    fn read(&self) -> String {
        self.value.clone()
    }

    fn anchor_text(&self) -> Option<String> {
        Some(self.value.clone())
    }

    fn caret_offset(&self) -> Option<usize> {
        Some(self.caret)
    }

    fn splice(&mut self, start: usize, end: usize, replacement: &str) -> String {
        let len = char_len(&self.value);
        let start = start.min(len);
        let end = end.clamp(start, len);
        self.value = splice_chars(&self.value, start, end, replacement);
        // 光标在区间之后：随区间长度变化平移；落在区间内：移到替换内容之后
        self.caret = if self.caret >= end {
            self.caret - (end - start) + char_len(replacement)
        } else if self.caret > start {
            start + char_len(replacement)
        } else {
            self.caret
        };
        self.value.clone()
    }

    fn move_caret_to(&mut self, offset: usize) {
        self.caret = offset.min(char_len(&self.value));
    }

    fn insert_text(&mut self, text: &str) {
        self.value = splice_chars(&self.value, self.caret, self.caret, text);
        self.caret += char_len(text);
    }

    fn delete_backward(&mut self) {
        if self.caret == 0 {
            return;
        }
        self.value = splice_chars(&self.value, self.caret - 1, self.caret, "");
        self.caret -= 1;
    }

    fn insert_trigger(&mut self, trigger: char) -> bool {
        let mut buf = [0u8; 4];
        self.value = splice_chars(&self.value, self.caret, self.caret, trigger.encode_utf8(&mut buf));
        self.pending_caret = Some(self.caret + 1);
        true
    }

    fn sync_caret(&mut self) {
        if let Some(caret) = self.pending_caret.take() {
            self.caret = caret.min(char_len(&self.value));
        }
    }

    fn locate(&mut self, trigger: char) -> Option<CaretInfo> {
        locate_flat(&self.value, self.caret, trigger, &self.metrics)
    }

    fn apply_selection(&mut self, trigger_offset: usize, _caret: &CaretInfo, insert: &str) {
        let end = self.caret.max(trigger_offset);
        self.splice(trigger_offset, end, insert);
        self.move_caret_to(trigger_offset + char_len(insert));
    }
}
