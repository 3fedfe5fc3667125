//! 配置期错误。运行期（每次按键）的“无触发”状态不是错误，不在这里出现。

use thiserror::Error;

/// `MentionConfig` 构建失败。
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("selection callback is required")]
    MissingCallback,

    #[error("invalid trigger character {0:?} (must be a visible, non-whitespace char)")]
    InvalidTrigger(char),

    #[error("failed to parse mention settings: {0}")]
    Settings(#[from] toml::de::Error),
}

/// 会话装配错误：发生在绑定阶段，直接抛给集成方。
#[derive(Debug, Error)]
pub enum MentionError {
    #[error("one mention session can only be associated with a single surface")]
    SurfaceAlreadyBound,

    #[error("no text surface is bound to this mention session")]
    NoSurface,

    #[error(transparent)]
    Config(#[from] ConfigError),
}
