//! Change listeners - ドキュメントの commit 通知
//!
//! # 設計原則
//! - 登録は明示的（`subscribe` が `ListenerHandle` を返す）
//! - commit の直後に同期的に、登録順で呼ばれる
//! - `ListenerHandle` を drop するか `unsubscribe` すると解除される

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError, Weak};

use crate::domain::TodoItem;

/// 変更の発生元
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeOrigin {
    /// ローカル編集（add / toggle）
    Local,
    Undo,
    Redo,
}

/// commit ごとにリスナーへ渡される内容
///
/// `snapshot` はドキュメント全体。差分ではなく毎回フルで送る前提です。
#[derive(Debug, Clone)]
pub struct DocumentChange {
    pub origin: ChangeOrigin,
    pub snapshot: Vec<u8>,
    pub items: Vec<TodoItem>,
}

type Listener = Arc<dyn Fn(&DocumentChange) + Send + Sync>;

#[derive(Default)]
struct Slots {
    next_id: u64,
    listeners: BTreeMap<u64, Listener>,
}

/// リスナーの登録簿
#[derive(Default)]
pub(crate) struct ListenerRegistry {
    slots: Arc<Mutex<Slots>>,
}

impl ListenerRegistry {
    pub(crate) fn register<F>(&self, listener: F) -> ListenerHandle
    where
        F: Fn(&DocumentChange) + Send + Sync + 'static,
    {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        let id = slots.next_id;
        slots.next_id += 1;
        slots.listeners.insert(id, Arc::new(listener));
        ListenerHandle {
            id,
            slots: Arc::downgrade(&self.slots),
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .listeners
            .is_empty()
    }

    /// 登録順に呼び出す
    ///
    /// ロックはコピーを取った時点で外すので、コールバック内から解除しても
    /// デッドロックしない。
    pub(crate) fn notify(&self, change: &DocumentChange) {
        let listeners: Vec<Listener> = self
            .slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .listeners
            .values()
            .cloned()
            .collect();
        for listener in listeners {
            listener(change);
        }
    }
}

/// 登録解除ハンドル
#[must_use = "dropping the handle unsubscribes the listener"]
pub struct ListenerHandle {
    id: u64,
    slots: Weak<Mutex<Slots>>,
}

impl ListenerHandle {
    /// 明示的に解除する（drop と同じ）
    pub fn unsubscribe(self) {}
}

impl Drop for ListenerHandle {
    fn drop(&mut self) {
        if let Some(slots) = self.slots.upgrade() {
            slots
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .listeners
                .remove(&self.id);
        }
    }
}

impl std::fmt::Debug for ListenerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerHandle").field("id", &self.id).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn change() -> DocumentChange {
        DocumentChange {
            origin: ChangeOrigin::Local,
            snapshot: Vec::new(),
            items: Vec::new(),
        }
    }

    #[test]
    fn listeners_run_in_registration_order() {
        let registry = ListenerRegistry::default();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let _a = registry.register({
            let seen = seen.clone();
            move |_| seen.lock().unwrap().push("a")
        });
        let _b = registry.register({
            let seen = seen.clone();
            move |_| seen.lock().unwrap().push("b")
        });

        registry.notify(&change());
        assert_eq!(*seen.lock().unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn dropping_the_handle_unsubscribes() {
        let registry = ListenerRegistry::default();
        let calls = Arc::new(AtomicUsize::new(0));

        let handle = registry.register({
            let calls = calls.clone();
            move |_| {
                calls.fetch_add(1, Ordering::SeqCst);
            }
        });
        registry.notify(&change());
        handle.unsubscribe();
        registry.notify(&change());

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(registry.is_empty());
    }

    #[test]
    fn handle_outliving_registry_is_harmless() {
        let registry = ListenerRegistry::default();
        let handle = registry.register(|_| {});
        drop(registry);
        drop(handle);
    }
}
