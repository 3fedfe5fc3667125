//! `Context`：processor 链共享的唯一状态容器（会话状态机的内存）。
//!
//! 约定：
//! - `menu_open` 为真时，`trigger_offset` 与 `caret_info` 必然存在
//! - `focused` 要么为 None，要么是 `filtered` 的合法下标
//! - `filtered` 每次整体重算，和候选的 `hidden` 标记始终一致
use crate::{
    filter::{clear_focus, focus_next, focus_prev},
    key_event::Action,
    model::{AnchorRef, CandidateItem, CaretInfo, UiState},
    processor::EngineFacade,
    text::{char_slice, rfind_trigger},
};

/// 会话状态。
#[derive(Debug, Clone, Default)]
pub struct Context {
    pub menu_open: bool,
    /// 锚点文本内活动触发符的下标
    pub trigger_offset: Option<usize>,
    pub caret_info: Option<CaretInfo>,
    /// 触发符与光标之间的文本
    pub keyword: String,
    /// 可见候选在全集中的下标
    pub filtered: Vec<usize>,
    /// 焦点在 `filtered` 中的下标
    pub focused: Option<usize>,
    /// 已被消费的触发符（显式关闭或已提交），在它从原位置消失前不再打开菜单
    pub consumed: Option<(AnchorRef, usize)>,
}

impl Context {
    /// 清空菜单状态（保留 `consumed`）。
    pub fn reset(&mut self, engine: &mut dyn EngineFacade) {
        clear_focus(engine.candidates_mut(), &self.filtered, self.focused);
        let consumed = self.consumed.take();
        *self = Self {
            consumed,
            ..Self::default()
        };
    }

    /// 关闭菜单；原本就关着则不产生动作。
    pub fn close(&mut self, engine: &mut dyn EngineFacade) -> Vec<Action> {
        let was_open = self.menu_open;
        self.reset(engine);
        if was_open {
            tracing::debug!("menu closed");
            vec![Action::CloseMenu]
        } else {
            Vec::new()
        }
    }

    /// 显式关闭（Escape / Alt+Up / 浮层关闭）：当前触发符视为已消费。
    pub fn dismiss(&mut self, engine: &mut dyn EngineFacade) -> Vec<Action> {
        if let (Some(trigger), Some(info)) = (self.trigger_offset, &self.caret_info) {
            self.consumed = Some((info.anchor, trigger));
        }
        self.close(engine)
    }

    /// 文本变更：从头重新检测触发序列并重算候选。
    pub fn refresh(&mut self, engine: &mut dyn EngineFacade) -> Vec<Action> {
        engine.sync_caret();
        let trigger_char = engine.trigger_char();
        let Some(info) = engine.locate() else {
            self.consumed = None;
            return self.close(engine);
        };
        let (Some(text), Some(caret)) = (engine.anchor_text(), engine.caret_offset()) else {
            return self.close(engine);
        };
        let end = (info.offset + 1).min(caret);
        let Some(trigger) = rfind_trigger(&text, end, trigger_char) else {
            self.consumed = None;
            return self.close(engine);
        };
        if self.consumed == Some((info.anchor, trigger)) {
            tracing::trace!(trigger, "trigger already consumed");
            return self.close(engine);
        }
        self.consumed = None;
        let Some(anchor) = info.coordinate else {
            // 几何退化：跳过，等下一次文本变更
            tracing::debug!(trigger, "no caret coordinate, menu not opened");
            return self.close(engine);
        };

        let mut actions = Vec::new();
        let moved = self.trigger_offset != Some(trigger)
            || self.caret_info.as_ref().map(|c| c.anchor) != Some(info.anchor);
        if self.menu_open && moved {
            // 新的触发序列：先关掉旧菜单
            actions.append(&mut self.close(engine));
        }

        let keyword = char_slice(&text, trigger + 1, caret).to_string();
        clear_focus(engine.candidates_mut(), &self.filtered, self.focused);
        self.focused = None;
        let filtered = engine.filter(&keyword);
        tracing::trace!(trigger, %keyword, shown = filtered.len(), "candidates filtered");
        if filtered.is_empty() {
            actions.append(&mut self.close(engine));
            return actions;
        }

        let opening = !self.menu_open;
        self.menu_open = true;
        self.trigger_offset = Some(trigger);
        self.caret_info = Some(info);
        self.keyword = keyword;
        self.filtered = filtered;
        if opening {
            tracing::debug!(trigger, ?anchor, "menu opened");
            actions.push(Action::OpenMenu { anchor });
        }
        actions
    }

    /// 候选全集被替换：菜单打开时按当前关键字重算。
    pub fn refilter(&mut self, engine: &mut dyn EngineFacade) -> Vec<Action> {
        if !self.menu_open {
            return Vec::new();
        }
        // 旧下标指向旧集合，不能再用来清焦点
        self.focused = None;
        self.filtered = engine.filter(&self.keyword);
        if self.filtered.is_empty() {
            return self.close(engine);
        }
        Vec::new()
    }

    pub fn focus_next(&mut self, engine: &mut dyn EngineFacade) {
        self.focused = focus_next(engine.candidates_mut(), &self.filtered, self.focused);
    }

    pub fn focus_prev(&mut self, engine: &mut dyn EngineFacade) {
        self.focused = focus_prev(engine.candidates_mut(), &self.filtered, self.focused);
    }

    /// 当前焦点对应的候选下标；无焦点时取第一个可见候选。
    pub fn focused_or_first(&self) -> Option<usize> {
        self.filtered.get(self.focused.unwrap_or(0)).copied()
    }

    /// 提交候选（下标为全集下标）：写回文本表面并关闭菜单。
    ///
    /// 会话已复位（过期提交）时静默忽略。
    pub fn commit(&mut self, engine: &mut dyn EngineFacade, index: usize) -> Vec<Action> {
        let (Some(trigger), Some(info)) = (self.trigger_offset, self.caret_info.clone()) else {
            tracing::trace!(index, "stale commit ignored");
            return Vec::new();
        };
        let Some(text) = engine.apply_selection(trigger, &info, index) else {
            tracing::warn!(index, "commit for unknown candidate ignored");
            return Vec::new();
        };
        tracing::debug!(index, %text, "candidate committed");
        let mut actions = self.close(engine);
        self.consumed = Some((info.anchor, trigger));
        actions.push(Action::Commit { index, text });
        actions
    }

    /// 生成渲染层只读快照。
    pub fn ui_state(&self, candidates: &[CandidateItem]) -> UiState {
        let items = self
            .filtered
            .iter()
            .filter_map(|&i| candidates.get(i).cloned())
            .collect();
        UiState {
            menu_open: self.menu_open,
            anchor: self.caret_info.as_ref().and_then(|c| c.coordinate),
            trigger_offset: self.trigger_offset,
            keyword: self.keyword.clone(),
            items,
            focused: self.focused,
        }
    }
}
