//! `layer`：浮层协作者接口。
//!
//! 浮层负责真正的屏幕定位、遮罩与点外关闭；引擎只给锚点坐标，
//! 并在菜单打开期间订阅它转发的按键。订阅归 `MenuScope` 所有，
//! 菜单每次关闭都同步退订。

use std::collections::BTreeMap;

use crate::{
    key_event::{Key, KeyPress},
    model::Rect,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LayerHandle(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(pub u64);

/// 浮层需要为菜单转发的按键类别。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyFilter {
    /// Escape / Alt+Up
    Dismiss,
    /// Up / Down / Enter / Space
    Navigation,
}

impl KeyFilter {
    pub fn matches(&self, press: &KeyPress) -> bool {
        match self {
            KeyFilter::Dismiss => {
                press.key == Key::Escape || (press.alt && press.key == Key::Up)
            }
            KeyFilter::Navigation => {
                !press.alt && matches!(press.key, Key::Up | Key::Down | Key::Enter | Key::Space)
            }
        }
    }
}

/// 浮层协作者。
pub trait FloatingLayer {
    /// 在锚点处挂载菜单浮层。
    fn attach(&mut self, anchor: Rect) -> LayerHandle;
    fn detach(&mut self, handle: LayerHandle);
    /// 订阅浮层转发的按键。
    fn subscribe(&mut self, handle: LayerHandle, filter: KeyFilter) -> SubscriptionId;
    fn unsubscribe(&mut self, id: SubscriptionId);
}

/// 一次菜单打开期间持有的浮层资源。
#[derive(Debug)]
pub struct MenuScope {
    handle: LayerHandle,
    subscriptions: Vec<(SubscriptionId, KeyFilter)>,
}

impl MenuScope {
    /// 挂载浮层并订阅菜单需要的按键。
    pub fn open(layer: &mut dyn FloatingLayer, anchor: Rect) -> Self {
        let handle = layer.attach(anchor);
        let subscriptions = [KeyFilter::Dismiss, KeyFilter::Navigation]
            .into_iter()
            .map(|f| (layer.subscribe(handle, f), f))
            .collect();
        Self {
            handle,
            subscriptions,
        }
    }

    /// 本菜单是否订阅了这个按键。
    pub fn wants(&self, press: &KeyPress) -> bool {
        self.subscriptions.iter().any(|(_, f)| f.matches(press))
    }

    /// 退订全部按键并卸载浮层。
    pub fn close(self, layer: &mut dyn FloatingLayer) {
        for (id, _) in self.subscriptions {
            layer.unsubscribe(id);
        }
        layer.detach(self.handle);
    }
}

/// 进程内浮层：只记账，不绘制。CLI 与测试使用。
#[derive(Debug, Default)]
pub struct MemoryLayer {
    next_id: u64,
    attached: BTreeMap<LayerHandle, Rect>,
    subscriptions: BTreeMap<SubscriptionId, (LayerHandle, KeyFilter)>,
    /// 累计挂载次数
    pub attach_count: usize,
}

impl MemoryLayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// 当前挂载的浮层锚点（至多一个）。
    pub fn anchor(&self) -> Option<Rect> {
        self.attached.values().next().copied()
    }

    pub fn is_attached(&self) -> bool {
        !self.attached.is_empty()
    }

    pub fn live_subscriptions(&self) -> usize {
        self.subscriptions.len()
    }

    fn alloc(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

impl FloatingLayer for MemoryLayer {
    fn attach(&mut self, anchor: Rect) -> LayerHandle {
        let handle = LayerHandle(self.alloc());
        self.attached.insert(handle, anchor);
        self.attach_count += 1;
        handle
    }

    fn detach(&mut self, handle: LayerHandle) {
        self.attached.remove(&handle);
    }

    fn subscribe(&mut self, handle: LayerHandle, filter: KeyFilter) -> SubscriptionId {
        let id = SubscriptionId(self.alloc());
        self.subscriptions.insert(id, (handle, filter));
        id
    }

    fn unsubscribe(&mut self, id: SubscriptionId) {
        self.subscriptions.remove(&id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_releases_everything_on_close() {
        let mut layer = MemoryLayer::new();
        let scope = MenuScope::open(&mut layer, Rect::new(1.0, 2.0, 0.0, 16.0));
        assert!(layer.is_attached());
        assert_eq!(layer.live_subscriptions(), 2);
        assert!(scope.wants(&KeyPress::new(Key::Escape)));
        assert!(scope.wants(&KeyPress::new(Key::Up).with_alt()));
        assert!(scope.wants(&KeyPress::new(Key::Enter)));
        assert!(!scope.wants(&KeyPress::new(Key::Char('a'))));
        scope.close(&mut layer);
        assert!(!layer.is_attached());
        assert_eq!(layer.live_subscriptions(), 0);
    }

    #[test]
    fn alt_up_is_dismiss_not_navigation() {
        let alt_up = KeyPress::new(Key::Up).with_alt();
        assert!(KeyFilter::Dismiss.matches(&alt_up));
        assert!(!KeyFilter::Navigation.matches(&alt_up));
    }
}
