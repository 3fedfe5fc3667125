//! `filter`：候选过滤与焦点导航。

use crate::model::CandidateItem;

/// Filter：按关键字收窄候选，返回可见候选在全集中的下标（保持原顺序）。
pub trait Filter: Send + Sync {
    fn apply(&self, items: &mut [CandidateItem], keyword: &str) -> Vec<usize>;
}

/// 默认 filter：区分大小写的子串包含匹配。
///
/// 关闭过滤时直接返回全集，不改动 `hidden`。
pub struct KeywordFilter {
    pub enabled: bool,
}

impl Filter for KeywordFilter {
    fn apply(&self, items: &mut [CandidateItem], keyword: &str) -> Vec<usize> {
        if !self.enabled {
            return (0..items.len()).collect();
        }
        let keyword = keyword.trim();
        let mut shown = Vec::new();
        for (i, item) in items.iter_mut().enumerate() {
            item.hidden = !item.keyword.contains(keyword);
            if !item.hidden {
                shown.push(i);
            }
        }
        shown
    }
}

/// 焦点下移（循环）。只切换新旧两项的 `focused` 标记。
///
/// - `filtered`：可见候选在全集中的下标
/// - `focused`：当前焦点在 `filtered` 中的下标
pub fn focus_next(
    items: &mut [CandidateItem],
    filtered: &[usize],
    focused: Option<usize>,
) -> Option<usize> {
    if filtered.is_empty() {
        return focused;
    }
    let next = match focused {
        Some(i) => (i + 1) % filtered.len(),
        None => 0,
    };
    move_focus(items, filtered, focused, next)
}

/// 焦点上移（循环），`focus_next` 的逆操作。
pub fn focus_prev(
    items: &mut [CandidateItem],
    filtered: &[usize],
    focused: Option<usize>,
) -> Option<usize> {
    if filtered.is_empty() {
        return focused;
    }
    let prev = match focused {
        Some(0) | None => filtered.len() - 1,
        Some(i) => i - 1,
    };
    move_focus(items, filtered, focused, prev)
}

/// 清除当前焦点标记。
pub fn clear_focus(items: &mut [CandidateItem], filtered: &[usize], focused: Option<usize>) {
    if let Some(item) = focused
        .and_then(|f| filtered.get(f))
        .and_then(|&i| items.get_mut(i))
    {
        item.focused = false;
    }
}

fn move_focus(
    items: &mut [CandidateItem],
    filtered: &[usize],
    from: Option<usize>,
    to: usize,
) -> Option<usize> {
    clear_focus(items, filtered, from);
    if let Some(item) = items.get_mut(filtered[to]) {
        item.focused = true;
    }
    Some(to)
}
