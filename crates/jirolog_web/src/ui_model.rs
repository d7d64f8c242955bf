//! UI models and metadata that should be available on both wasm and native.
//!
//! Keeping these out of the wasm-only `web` module allows us to unit-test the
//! tab inventory and toast bookkeeping on the host.

use jirolog::Tab;

pub fn tab_label(tab: Tab) -> &'static str {
    match tab {
        Tab::Community => "みんなの二郎",
        Tab::Add => "追加",
        Tab::My => "自分の二郎",
    }
}

pub fn tab_icon(tab: Tab) -> &'static str {
    match tab {
        Tab::Community => "🍜",
        Tab::Add => "＋",
        Tab::My => "👤",
    }
}

/// Older toasts are dropped once this many are on screen.
pub const MAX_VISIBLE_TOASTS: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub id: u64,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToastQueue {
    next_id: u64,
    items: Vec<Toast>,
}

impl ToastQueue {
    /// Queue a message; the returned id is what [`ToastQueue::dismiss`] takes
    /// when the display timer runs out.
    pub fn push(&mut self, message: impl Into<String>) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.items.push(Toast {
            id,
            message: message.into(),
        });
        if self.items.len() > MAX_VISIBLE_TOASTS {
            let excess = self.items.len() - MAX_VISIBLE_TOASTS;
            self.items.drain(..excess);
        }
        id
    }

    pub fn dismiss(&mut self, id: u64) {
        self.items.retain(|t| t.id != id);
    }

    pub fn items(&self) -> &[Toast] {
        &self.items
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tab_inventory_is_stable() {
        let labels: Vec<&str> = Tab::all().iter().map(|&t| tab_label(t)).collect();
        assert_eq!(labels, vec!["みんなの二郎", "追加", "自分の二郎"]);
        for &tab in Tab::all() {
            assert!(!tab_icon(tab).is_empty());
            assert_eq!(Tab::parse(tab.as_str()), Some(tab));
        }
    }

    #[test]
    fn toasts_dismiss_by_id() {
        let mut q = ToastQueue::default();
        let a = q.push("保存しました");
        let b = q.push("削除しました");
        assert_ne!(a, b);
        q.dismiss(a);
        assert_eq!(q.items().len(), 1);
        assert_eq!(q.items()[0].message, "削除しました");
        // Dismissing twice is harmless.
        q.dismiss(a);
        assert_eq!(q.items().len(), 1);
    }

    #[test]
    fn oldest_toasts_fall_off() {
        let mut q = ToastQueue::default();
        for i in 0..5 {
            q.push(format!("t{i}"));
        }
        let messages: Vec<&str> = q.items().iter().map(|t| t.message.as_str()).collect();
        assert_eq!(messages, vec!["t2", "t3", "t4"]);
    }
}
