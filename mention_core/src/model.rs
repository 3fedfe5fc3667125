/// 屏幕坐标矩形（与宿主布局同一坐标系）。
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// 两个矩形的最小包围盒。
    pub fn union(&self, other: &Rect) -> Rect {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        Rect {
            x,
            y,
            width: self.right().max(other.right()) - x,
            height: self.bottom().max(other.bottom()) - y,
        }
    }
}

/// 节点树中的节点标识（由 `mention_dom` 的 arena 分配）。
///
/// 槽位会被复用，代数不会：节点释放后旧 id 永远不再指向任何节点。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId {
    pub slot: usize,
    pub generation: u32,
}

impl NodeId {
    pub fn new(slot: usize, generation: u32) -> Self {
        Self { slot, generation }
    }
}

/// 光标所在的“承载文本单元”。
///
/// - `Flat`：单字符串缓冲（input/textarea）
/// - `Node`：节点树中的某个文本节点
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnchorRef {
    Flat,
    Node(NodeId),
}

/// 光标信息：每次文本变更重新生成，菜单关闭即丢弃。
///
/// `offset` 是触发符扫描的上界：
/// - 平面缓冲：检测到的触发符下标
/// - 节点树：光标在锚点文本节点内的偏移
#[derive(Debug, Clone, PartialEq)]
pub struct CaretInfo {
    /// 浮层锚点坐标；为 None 表示几何退化（不打开菜单）
    pub coordinate: Option<Rect>,
    pub offset: usize,
    pub anchor: AnchorRef,
}

/// 候选项（由调用方提供，引擎只改 `focused/hidden`）。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateItem {
    /// 参与过滤的关键字
    pub keyword: String,
    /// 调用方的负载（例如用户 id），引擎不解释
    pub payload: String,
    pub focused: bool,
    pub hidden: bool,
}

impl CandidateItem {
    pub fn new(keyword: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            payload: payload.into(),
            focused: false,
            hidden: false,
        }
    }
}

/// 引擎给渲染层的“快照视图”。
///
/// 渲染层只读 `UiState`，不直接读写 `Context`。
#[derive(Debug, Clone, PartialEq)]
pub struct UiState {
    pub menu_open: bool,
    /// 浮层锚点（菜单打开时才有）
    pub anchor: Option<Rect>,
    pub trigger_offset: Option<usize>,
    /// 当前过滤关键字（未 trim）
    pub keyword: String,
    /// 可见候选（按原顺序）
    pub items: Vec<CandidateItem>,
    /// 高亮候选在 `items` 中的下标
    pub focused: Option<usize>,
}
