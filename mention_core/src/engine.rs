use crate::{
    config::MentionConfig,
    error::MentionError,
    filter::{Filter, KeywordFilter},
    model::{CandidateItem, CaretInfo},
    processor::EngineFacade,
    surface::TextSurface,
};

/// 引擎：持有配置、绑定的文本表面与候选全集。
///
/// 结构上对应流水线：
/// - surface（读写文本/光标）-> caret（定位触发序列）-> filter（收窄候选）-> 选中写回
pub struct Engine {
    config: MentionConfig,
    /// 绑定后不可替换；一个会话只服务一个表面
    surface: Option<Box<dyn TextSurface>>,
    /// 候选全集（调用方所有，引擎只改 focused/hidden）
    candidates: Vec<CandidateItem>,
    filter: KeywordFilter,
}

impl Engine {
    pub fn new(config: MentionConfig) -> Self {
        let filter = KeywordFilter {
            enabled: config.filter_list_items(),
        };
        Self {
            config,
            surface: None,
            candidates: Vec::new(),
            filter,
        }
    }

    pub fn config(&self) -> &MentionConfig {
        &self.config
    }

    /// 绑定文本表面；重复绑定是配置错误。
    pub fn bind_surface(&mut self, surface: Box<dyn TextSurface>) -> Result<(), MentionError> {
        if self.surface.is_some() {
            return Err(MentionError::SurfaceAlreadyBound);
        }
        tracing::debug!(kind = ?surface.kind(), "surface bound");
        self.surface = Some(surface);
        Ok(())
    }

    pub fn surface(&self) -> Option<&dyn TextSurface> {
        self.surface.as_deref()
    }

    pub fn surface_mut(&mut self) -> Option<&mut (dyn TextSurface + 'static)> {
        self.surface.as_deref_mut()
    }

    pub fn candidates(&self) -> &[CandidateItem] {
        &self.candidates
    }

    /// 替换候选全集（成员变化）。旧集合上的标记随之丢弃。
    pub fn replace_candidates(&mut self, items: Vec<CandidateItem>) {
        self.candidates = items;
    }
}

impl EngineFacade for Engine {
    fn trigger_char(&self) -> char {
        self.config.trigger_char()
    }

    fn insert_on_space(&self) -> bool {
        self.config.insert_on_space()
    }

    fn sync_caret(&mut self) {
        if let Some(s) = self.surface.as_deref_mut() {
            s.sync_caret();
        }
    }

    fn locate(&mut self) -> Option<CaretInfo> {
        let trigger = self.config.trigger_char();
        self.surface.as_deref_mut()?.locate(trigger)
    }

    fn anchor_text(&self) -> Option<String> {
        self.surface.as_deref()?.anchor_text()
    }

    fn caret_offset(&self) -> Option<usize> {
        self.surface.as_deref()?.caret_offset()
    }

    fn filter(&mut self, keyword: &str) -> Vec<usize> {
        self.filter.apply(&mut self.candidates, keyword)
    }

    fn candidates_mut(&mut self) -> &mut [CandidateItem] {
        &mut self.candidates
    }

    fn apply_selection(
        &mut self,
        trigger_offset: usize,
        caret: &CaretInfo,
        index: usize,
    ) -> Option<String> {
        let item = self.candidates.get(index)?;
        let text = self.config.format(item);
        let surface = self.surface.as_deref_mut()?;
        surface.apply_selection(trigger_offset, caret, &text);
        Some(text)
    }
}
