use crate::model::Rect;

/// 逻辑按键。
///
/// 说明：
/// - `Session`/processor 只关心“语义按键”，不关心具体平台键值。
/// - 宿主负责把系统按键转换成这些值。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Escape,
    Up,
    Down,
    Enter,
    Space,
    Backspace,
    /// 其他可打印字符
    Char(char),
}

/// 一次按键（附带修饰键状态）。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyPress {
    pub key: Key,
    pub alt: bool,
    pub ctrl: bool,
    pub shift: bool,
}

impl KeyPress {
    pub fn new(key: Key) -> Self {
        Self {
            key,
            alt: false,
            ctrl: false,
            shift: false,
        }
    }

    pub fn with_alt(mut self) -> Self {
        self.alt = true;
        self
    }

    /// 没有任何修饰键。
    pub fn is_plain(&self) -> bool {
        !self.alt && !self.ctrl && !self.shift
    }
}

impl From<Key> for KeyPress {
    fn from(key: Key) -> Self {
        Self::new(key)
    }
}

/// 浮层关闭的来源（由浮层协作者上报）。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DismissReason {
    /// 点击遮罩（点外关闭）
    Backdrop,
    /// 浮层被宿主卸载
    Detached,
}

/// 输入事件（宿主 -> 引擎）。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    /// 文本表面内容或光标发生变化
    TextChanged,
    /// 按键（在文本变更之前送达）
    Key(KeyPress),
    /// 某个候选发出“被选中”信号（例如点击）；参数为候选全集中的下标
    ItemSelected(usize),
    /// 浮层协作者报告关闭
    Dismissed(DismissReason),
}

/// 引擎输出动作（对宿主/浮层的副作用请求）。
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// 在给定锚点处打开菜单
    OpenMenu { anchor: Rect },
    CloseMenu,
    /// 候选已写入文本表面
    Commit { index: usize, text: String },
    /// 按键已被菜单消费，宿主不应再执行默认行为
    PreventDefault,
}
