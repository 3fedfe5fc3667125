//! 配置：静态类型的配置记录，在构建时校验（而不是使用时）。
//!
//! - `MentionConfig`：引擎真正使用的配置（含回调）
//! - `MentionSettings`：可从 TOML 读取的声明式部分
//! - `SurfaceMetrics`：文本表面的排版度量（镜像测量与节点布局共用）

use std::fmt;

use serde::Deserialize;

use crate::{error::ConfigError, model::CandidateItem};

/// 默认触发符。
pub const DEFAULT_TRIGGER: char = '@';

/// 选中候选后生成要插入的文本/标记。必须是确定性的纯函数。
pub type SelectionCallback = Box<dyn Fn(&CandidateItem) -> String>;

/// 会话配置（绑定一次，会话期内不变）。
pub struct MentionConfig {
    trigger_char: char,
    filter_list_items: bool,
    insert_on_space: bool,
    selection_callback: SelectionCallback,
}

impl MentionConfig {
    pub fn builder() -> MentionConfigBuilder {
        MentionConfigBuilder::default()
    }

    pub fn trigger_char(&self) -> char {
        self.trigger_char
    }

    pub fn filter_list_items(&self) -> bool {
        self.filter_list_items
    }

    pub fn insert_on_space(&self) -> bool {
        self.insert_on_space
    }

    /// 调用选中回调生成插入内容。
    pub fn format(&self, item: &CandidateItem) -> String {
        (self.selection_callback)(item)
    }
}

impl fmt::Debug for MentionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MentionConfig")
            .field("trigger_char", &self.trigger_char)
            .field("filter_list_items", &self.filter_list_items)
            .field("insert_on_space", &self.insert_on_space)
            .finish_non_exhaustive()
    }
}

pub struct MentionConfigBuilder {
    trigger_char: char,
    filter_list_items: bool,
    insert_on_space: bool,
    selection_callback: Option<SelectionCallback>,
}

impl Default for MentionConfigBuilder {
    fn default() -> Self {
        Self {
            trigger_char: DEFAULT_TRIGGER,
            filter_list_items: true,
            insert_on_space: false,
            selection_callback: None,
        }
    }
}

impl MentionConfigBuilder {
    pub fn trigger_char(mut self, ch: char) -> Self {
        self.trigger_char = ch;
        self
    }

    pub fn filter_list_items(mut self, on: bool) -> Self {
        self.filter_list_items = on;
        self
    }

    pub fn insert_on_space(mut self, on: bool) -> Self {
        self.insert_on_space = on;
        self
    }

    pub fn selection_callback<F>(mut self, f: F) -> Self
    where
        F: Fn(&CandidateItem) -> String + 'static,
    {
        self.selection_callback = Some(Box::new(f));
        self
    }

    /// 校验并生成配置；缺回调或触发符非法都是配置错误。
    pub fn build(self) -> Result<MentionConfig, ConfigError> {
        let ch = self.trigger_char;
        if ch.is_whitespace() || ch.is_control() {
            return Err(ConfigError::InvalidTrigger(ch));
        }
        let Some(selection_callback) = self.selection_callback else {
            return Err(ConfigError::MissingCallback);
        };
        Ok(MentionConfig {
            trigger_char: ch,
            filter_list_items: self.filter_list_items,
            insert_on_space: self.insert_on_space,
            selection_callback,
        })
    }
}

/// TOML 中可声明的配置部分（回调只能由代码提供）。
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MentionSettings {
    pub trigger_char: char,
    pub filter_list_items: bool,
    pub insert_on_space: bool,
}

impl Default for MentionSettings {
    fn default() -> Self {
        Self {
            trigger_char: DEFAULT_TRIGGER,
            filter_list_items: true,
            insert_on_space: false,
        }
    }
}

impl MentionSettings {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// 转成 builder，调用方再补上回调。
    pub fn into_builder(self) -> MentionConfigBuilder {
        MentionConfig::builder()
            .trigger_char(self.trigger_char)
            .filter_list_items(self.filter_list_items)
            .insert_on_space(self.insert_on_space)
    }
}

/// 文本表面的排版度量。
///
/// 宿主从真实控件的计算样式中取值；镜像测量与节点布局按它逐格排版。
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SurfaceMetrics {
    /// 控件左上角的屏幕坐标
    pub origin_x: f32,
    pub origin_y: f32,
    /// 控件外框宽度（含 padding）
    pub width: f32,
    pub padding_left: f32,
    pub padding_top: f32,
    /// 单个半角字符的宽度；全角字符按 2 格计
    pub cell_width: f32,
    pub line_height: f32,
    /// textarea / 富文本会折行；单行 input 不折行
    pub wrap: bool,
}

impl Default for SurfaceMetrics {
    fn default() -> Self {
        Self {
            origin_x: 0.0,
            origin_y: 0.0,
            width: 320.0,
            padding_left: 4.0,
            padding_top: 4.0,
            cell_width: 8.0,
            line_height: 16.0,
            wrap: false,
        }
    }
}

impl SurfaceMetrics {
    pub fn content_left(&self) -> f32 {
        self.origin_x + self.padding_left
    }

    pub fn content_top(&self) -> f32 {
        self.origin_y + self.padding_top
    }

    /// 内容区宽度（至少一格）。
    pub fn content_width(&self) -> f32 {
        (self.width - 2.0 * self.padding_left).max(self.cell_width)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_without_callback_fails() {
        let err = MentionConfig::builder().build().unwrap_err();
        assert!(matches!(err, ConfigError::MissingCallback));
    }

    #[test]
    fn whitespace_trigger_is_rejected() {
        let err = MentionConfig::builder()
            .trigger_char(' ')
            .selection_callback(|c| c.keyword.clone())
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidTrigger(' ')));
    }

    #[test]
    fn defaults() {
        let cfg = MentionConfig::builder()
            .selection_callback(|c| format!("@{}", c.keyword))
            .build()
            .unwrap();
        assert_eq!(cfg.trigger_char(), '@');
        assert!(cfg.filter_list_items());
        assert!(!cfg.insert_on_space());
        assert_eq!(cfg.format(&CandidateItem::new("john", "42")), "@john");
    }

    #[test]
    fn settings_from_toml() {
        let s = MentionSettings::from_toml_str("trigger_char = '#'\ninsert_on_space = true\n").unwrap();
        assert_eq!(s.trigger_char, '#');
        assert!(s.filter_list_items);
        assert!(s.insert_on_space);
    }

    #[test]
    fn unknown_settings_key_is_an_error() {
        let err = MentionSettings::from_toml_str("triggerChar = '#'\n").unwrap_err();
        assert!(matches!(err, ConfigError::Settings(_)));
    }
}
