//! `caret`：平面缓冲（input/textarea）的光标定位。
//!
//! 做法：按控件的排版度量建一个离屏“镜像”，把缓冲文本逐格排进去，
//! 量出触发符后一个字符所在的格子。镜像在返回前即被丢弃。

use unicode_width::UnicodeWidthChar;

use crate::{
    config::SurfaceMetrics,
    model::{AnchorRef, CaretInfo, Rect},
    text::rfind_trigger,
};

/// 逐格排版器：按度量把字符一个个放进内容区。
///
/// 平面镜像与节点树布局共用，保证两种表面的坐标算法一致。
pub struct Typesetter<'a> {
    metrics: &'a SurfaceMetrics,
    x: f32,
    line: usize,
}

impl<'a> Typesetter<'a> {
    pub fn new(metrics: &'a SurfaceMetrics) -> Self {
        Self {
            metrics,
            x: 0.0,
            line: 0,
        }
    }

    /// 放下一个字符并推进笔位置，返回该字符的格子。
    pub fn place(&mut self, ch: char) -> Rect {
        if ch == '\n' {
            let cell = self.pen();
            self.break_line();
            return cell;
        }
        let w = ch.width().unwrap_or(0) as f32 * self.metrics.cell_width;
        if self.metrics.wrap && self.x > 0.0 && self.x + w > self.metrics.content_width() {
            self.break_line();
        }
        let cell = self.cell(w);
        self.x += w;
        cell
    }

    pub fn break_line(&mut self) {
        self.x = 0.0;
        self.line += 1;
    }

    pub fn at_line_start(&self) -> bool {
        self.x == 0.0
    }

    /// 当前笔位置处的零宽格子。
    pub fn pen(&self) -> Rect {
        self.cell(0.0)
    }

    fn cell(&self, width: f32) -> Rect {
        Rect::new(
            self.metrics.content_left() + self.x,
            self.metrics.content_top() + self.line as f32 * self.metrics.line_height,
            width,
            self.metrics.line_height,
        )
    }
}

/// 离屏镜像：与原控件同样的字体格宽、行高、内边距与折行方式。
struct Mirror<'a> {
    metrics: &'a SurfaceMetrics,
    /// 每个字符的格子（与字符一一对应）
    cells: Vec<Rect>,
    /// 文本末尾的笔位置
    end: Rect,
}

impl<'a> Mirror<'a> {
    fn new(metrics: &'a SurfaceMetrics, text: &str) -> Self {
        let mut setter = Typesetter::new(metrics);
        let cells = text.chars().map(|ch| setter.place(ch)).collect();
        Self {
            metrics,
            cells,
            end: setter.pen(),
        }
    }

    /// 第 `index` 个字符的格子；超出文本则是末尾处的零宽格子。
    fn measure(&self, index: usize) -> Rect {
        self.cells.get(index).copied().unwrap_or(self.end)
    }

    /// 把 x 限制在镜像外框内，避免文本溢出时坐标跑出控件。
    fn clamp(&self, mut rect: Rect) -> Rect {
        let left = self.metrics.origin_x;
        let right = self.metrics.origin_x + self.metrics.width;
        rect.x = rect.x.clamp(left, right);
        rect
    }
}

/// 平面缓冲的光标定位。
///
/// - 缓冲为空：None
/// - 光标前没有触发符：None（正常的“未在提及”状态）
/// - 否则返回触发符后一个字符的坐标；`offset` 为触发符下标
pub fn locate_flat(
    value: &str,
    caret: usize,
    trigger: char,
    metrics: &SurfaceMetrics,
) -> Option<CaretInfo> {
    if value.is_empty() {
        return None;
    }
    let trigger_at = rfind_trigger(value, caret, trigger)?;
    let coordinate = {
        let mirror = Mirror::new(metrics, value);
        mirror.clamp(mirror.measure(trigger_at + 1))
    };
    tracing::trace!(trigger_at, caret, ?coordinate, "flat caret located");
    Some(CaretInfo {
        coordinate: Some(coordinate),
        offset: trigger_at,
        anchor: AnchorRef::Flat,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics() -> SurfaceMetrics {
        SurfaceMetrics {
            origin_x: 100.0,
            origin_y: 50.0,
            width: 80.0,
            padding_left: 4.0,
            padding_top: 2.0,
            cell_width: 8.0,
            line_height: 16.0,
            wrap: false,
        }
    }

    #[test]
    fn empty_buffer_is_absent() {
        assert_eq!(locate_flat("", 0, '@', &metrics()), None);
    }

    #[test]
    fn trailing_trigger_offset_is_trigger_index() {
        let info = locate_flat("hello @", 7, '@', &metrics()).unwrap();
        assert_eq!(info.offset, 6);
        assert_eq!(info.anchor, AnchorRef::Flat);
        // 触发符后一格：4 + 7 * 8
        assert_eq!(info.coordinate, Some(Rect::new(160.0, 52.0, 0.0, 16.0)));
    }

    #[test]
    fn overflowing_input_is_clamped_to_box() {
        let info = locate_flat("a very long line of text @x", 27, '@', &metrics()).unwrap();
        assert_eq!(info.coordinate.unwrap().x, 180.0);
    }

    #[test]
    fn textarea_wraps_lines() {
        let m = SurfaceMetrics {
            wrap: true,
            ..metrics()
        };
        // 内容区 72px = 9 格；"abcdefghi" 占满第一行，"@" 在第二行
        let info = locate_flat("abcdefghi@x", 11, '@', &m).unwrap();
        assert_eq!(info.coordinate, Some(Rect::new(112.0, 68.0, 8.0, 16.0)));
    }

    #[test]
    fn newline_starts_a_new_line() {
        let m = SurfaceMetrics {
            wrap: true,
            ..metrics()
        };
        let info = locate_flat("hi\n@", 4, '@', &m).unwrap();
        assert_eq!(info.coordinate, Some(Rect::new(112.0, 68.0, 0.0, 16.0)));
    }

    #[test]
    fn wide_chars_take_two_cells() {
        let info = locate_flat("你好@", 3, '@', &metrics()).unwrap();
        assert_eq!(info.coordinate.unwrap().x, 104.0 + 5.0 * 8.0);
    }

    #[test]
    fn no_trigger_before_caret() {
        assert_eq!(locate_flat("hello @", 5, '@', &metrics()), None);
    }
}
