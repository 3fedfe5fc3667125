//! `Session`：对宿主提供的会话对象。
//!
//! `Session` 自身不做业务判断，而是：
//! - 持有 `Engine`（配置、表面、候选）与 `Context`（状态）
//! - 把每个 `InputEvent` 依次交给 processors，直到被消费
//! - 根据输出的 `Action` 挂载/卸载浮层，并管理菜单期间的按键订阅
//! - 最后输出 `UiState` + `Action`

use crate::{
    config::MentionConfig,
    context::Context,
    engine::Engine,
    error::MentionError,
    key_event::{Action, InputEvent},
    layer::{FloatingLayer, MenuScope},
    model::{CandidateItem, UiState},
    processor::{
        CommitProcessor, DismissProcessor, NavigationProcessor, ProcessStatus, Processor,
        TextChangeProcessor,
    },
    surface::TextSurface,
};

/// 提及会话（一个表面绑定的完整生命周期）。
pub struct Session<L: FloatingLayer> {
    engine: Engine,
    ctx: Context,
    processors: Vec<Box<dyn Processor>>,
    layer: L,
    /// 当前打开的菜单（至多一个）
    scope: Option<MenuScope>,
}

impl<L: FloatingLayer> Session<L> {
    /// 创建会话，并组装默认 processors 链。
    pub fn new(config: MentionConfig, layer: L) -> Self {
        Self {
            engine: Engine::new(config),
            ctx: Context::default(),
            processors: vec![
                Box::new(DismissProcessor),
                Box::new(NavigationProcessor),
                Box::new(CommitProcessor),
                Box::new(TextChangeProcessor),
            ],
            layer,
            scope: None,
        }
    }

    /// 绑定文本表面（只能一次）。
    pub fn bind_surface(&mut self, surface: Box<dyn TextSurface>) -> Result<(), MentionError> {
        self.engine.bind_surface(surface)
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn surface(&self) -> Option<&dyn TextSurface> {
        self.engine.surface()
    }

    pub fn surface_mut(&mut self) -> Option<&mut (dyn TextSurface + 'static)> {
        self.engine.surface_mut()
    }

    pub fn layer(&self) -> &L {
        &self.layer
    }

    pub fn candidates(&self) -> &[CandidateItem] {
        self.engine.candidates()
    }

    /// 获取当前 UI 快照（只读）。
    pub fn ui_state(&self) -> UiState {
        self.ctx.ui_state(self.engine.candidates())
    }

    /// 候选全集变化（成员增删/整体替换）。菜单打开时立即重算可见列表。
    pub fn replace_candidates(&mut self, items: Vec<CandidateItem>) -> (UiState, Vec<Action>) {
        self.engine.replace_candidates(items);
        let actions = self.ctx.refilter(&mut self.engine);
        self.sync_layer(&actions);
        (self.ui_state(), actions)
    }

    /// 程序化触发（例如“@ 按钮”）：插入触发符后走与真实输入相同的检测路径。
    pub fn trigger_mention(&mut self) -> Result<(UiState, Vec<Action>), MentionError> {
        let trigger = self.engine.config().trigger_char();
        let surface = self.engine.surface_mut().ok_or(MentionError::NoSurface)?;
        if !surface.insert_trigger(trigger) {
            tracing::debug!("no caret on surface, programmatic trigger skipped");
            return Ok((self.ui_state(), Vec::new()));
        }
        // 内容变更通知回到引擎
        Ok(self.handle(InputEvent::TextChanged))
    }

    /// 处理一个输入事件，返回最新 UI 快照与动作列表。
    pub fn handle(&mut self, ev: InputEvent) -> (UiState, Vec<Action>) {
        // 按键只在菜单打开期间、且命中订阅时才送进来
        let routed = match &ev {
            InputEvent::Key(press) => self.scope.as_ref().is_some_and(|s| s.wants(press)),
            InputEvent::Dismissed(_) => self.scope.is_some(),
            _ => true,
        };
        if !routed {
            return (self.ui_state(), Vec::new());
        }

        let mut actions = Vec::new();
        for p in &mut self.processors {
            let (status, mut a) = p.process(&mut self.engine, &mut self.ctx, &ev);
            actions.append(&mut a);
            if status == ProcessStatus::Consume {
                break;
            }
        }
        self.sync_layer(&actions);
        (self.ui_state(), actions)
    }

    /// 把菜单的打开/关闭落到浮层上。
    fn sync_layer(&mut self, actions: &[Action]) {
        for action in actions {
            match action {
                Action::OpenMenu { anchor } => {
                    if let Some(old) = self.scope.take() {
                        old.close(&mut self.layer);
                    }
                    self.scope = Some(MenuScope::open(&mut self.layer, *anchor));
                }
                Action::CloseMenu => {
                    if let Some(scope) = self.scope.take() {
                        scope.close(&mut self.layer);
                    }
                }
                Action::Commit { .. } | Action::PreventDefault => {}
            }
        }
    }
}

impl<L: FloatingLayer> Drop for Session<L> {
    fn drop(&mut self) {
        if let Some(scope) = self.scope.take() {
            scope.close(&mut self.layer);
        }
    }
}
