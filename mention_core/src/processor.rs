//! `processor`：输入事件处理链。
//!
//! 按顺序处理 `InputEvent`，对 `Context` 做状态变更，并可产生 `Action`
//! （打开/关闭菜单、提交候选、阻止按键默认行为）。
//!
//! 当前链路（`Session::new` 默认组装）：
//! - `DismissProcessor`：Escape / Alt+Up / 浮层关闭
//! - `NavigationProcessor`：Up / Down 移动焦点
//! - `CommitProcessor`：Enter / Space / 候选点击提交
//! - `TextChangeProcessor`：文本变更后重新检测触发序列

use crate::{
    context::Context,
    key_event::{Action, InputEvent, Key},
    model::{CandidateItem, CaretInfo},
};

/// 给 processors 的对象安全引擎接口。
pub trait EngineFacade {
    fn trigger_char(&self) -> char;
    fn insert_on_space(&self) -> bool;
    /// 若表面有待恢复的光标锚点，先恢复
    fn sync_caret(&mut self);
    fn locate(&mut self) -> Option<CaretInfo>;
    fn anchor_text(&self) -> Option<String>;
    fn caret_offset(&self) -> Option<usize>;
    /// 过滤候选全集，返回可见下标
    fn filter(&mut self, keyword: &str) -> Vec<usize>;
    fn candidates_mut(&mut self) -> &mut [CandidateItem];
    /// 格式化候选并写回表面，返回插入的文本；候选不存在或未绑定表面时为 None
    fn apply_selection(&mut self, trigger_offset: usize, caret: &CaretInfo, index: usize)
    -> Option<String>;
}

/// Processor 执行结果：是否“消费”了本次事件。
///
/// - `Consume`：本 processor 已处理该事件，后续 processor 不再执行
/// - `Continue`：交给下一个 processor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessStatus {
    Consume,
    Continue,
}

/// Processor：处理输入事件并改变 Context；必要时产生输出动作。
pub trait Processor: Send + Sync {
    fn process(
        &mut self,
        engine: &mut dyn EngineFacade,
        context: &mut Context,
        input_event: &InputEvent,
    ) -> (ProcessStatus, Vec<Action>);
}

fn consumed_key(mut actions: Vec<Action>) -> (ProcessStatus, Vec<Action>) {
    actions.push(Action::PreventDefault);
    (ProcessStatus::Consume, actions)
}

/// 关闭菜单的 processor。
pub struct DismissProcessor;

impl Processor for DismissProcessor {
    fn process(
        &mut self,
        engine: &mut dyn EngineFacade,
        context: &mut Context,
        input_event: &InputEvent,
    ) -> (ProcessStatus, Vec<Action>) {
        if !context.menu_open {
            return (ProcessStatus::Continue, Vec::new());
        }
        match input_event {
            InputEvent::Key(press) if press.key == Key::Escape => {
                consumed_key(context.dismiss(engine))
            }
            InputEvent::Key(press) if press.alt && press.key == Key::Up => {
                consumed_key(context.dismiss(engine))
            }
            InputEvent::Dismissed(reason) => {
                tracing::debug!(?reason, "floating layer dismissed");
                (ProcessStatus::Consume, context.dismiss(engine))
            }
            _ => (ProcessStatus::Continue, Vec::new()),
        }
    }
}

/// 焦点导航的 processor。
pub struct NavigationProcessor;

impl Processor for NavigationProcessor {
    fn process(
        &mut self,
        engine: &mut dyn EngineFacade,
        context: &mut Context,
        input_event: &InputEvent,
    ) -> (ProcessStatus, Vec<Action>) {
        if !context.menu_open {
            return (ProcessStatus::Continue, Vec::new());
        }
        match input_event {
            InputEvent::Key(press) if press.is_plain() && press.key == Key::Down => {
                context.focus_next(engine);
                consumed_key(Vec::new())
            }
            InputEvent::Key(press) if press.is_plain() && press.key == Key::Up => {
                context.focus_prev(engine);
                consumed_key(Vec::new())
            }
            _ => (ProcessStatus::Continue, Vec::new()),
        }
    }
}

/// 提交候选的 processor。
pub struct CommitProcessor;

impl Processor for CommitProcessor {
    fn process(
        &mut self,
        engine: &mut dyn EngineFacade,
        context: &mut Context,
        input_event: &InputEvent,
    ) -> (ProcessStatus, Vec<Action>) {
        match input_event {
            InputEvent::ItemSelected(index) => {
                (ProcessStatus::Consume, context.commit(engine, *index))
            }
            InputEvent::Key(press) if context.menu_open && press.key == Key::Enter => {
                match context.focused_or_first() {
                    Some(index) => consumed_key(context.commit(engine, index)),
                    None => (ProcessStatus::Continue, Vec::new()),
                }
            }
            // 只剩一个候选时，空格直接提交
            InputEvent::Key(press)
                if context.menu_open
                    && press.key == Key::Space
                    && engine.insert_on_space()
                    && context.filtered.len() == 1 =>
            {
                let index = context.filtered[0];
                consumed_key(context.commit(engine, index))
            }
            _ => (ProcessStatus::Continue, Vec::new()),
        }
    }
}

/// 文本变更的 processor。
pub struct TextChangeProcessor;

impl Processor for TextChangeProcessor {
    fn process(
        &mut self,
        engine: &mut dyn EngineFacade,
        context: &mut Context,
        input_event: &InputEvent,
    ) -> (ProcessStatus, Vec<Action>) {
        match input_event {
            InputEvent::TextChanged => (ProcessStatus::Consume, context.refresh(engine)),
            _ => (ProcessStatus::Continue, Vec::new()),
        }
    }
}
