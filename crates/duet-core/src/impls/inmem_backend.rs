//! InMemoryBackend - 開発用の workspaces テーブル + realtime フィード
//!
//! # 学習ポイント
//! - 1 つの Mutex の下で「行の更新」と「購読者への配信」を行う（更新順 = 配信順）
//! - 購読解除は受信側の drop で検知し、送信失敗した購読者を除去する
//! - テスト用に書き込み失敗を注入できる

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, mpsc};
use tracing::debug;

use crate::domain::{
    DomainEvent, UserId, WorkspaceId, WorkspaceLookup, WorkspacePatch, WorkspaceRecord,
};
use crate::ports::{RealtimeChannel, RealtimeFeed, StoreError, WorkspaceStore};

#[derive(Default)]
struct BackendState {
    /// 行（id → record）
    rows: HashMap<WorkspaceId, WorkspaceRecord>,

    /// 作成順（list_for_user の順序）
    order: Vec<WorkspaceId>,

    /// 行ごとの購読者
    subscribers: HashMap<WorkspaceId, Vec<mpsc::UnboundedSender<DomainEvent>>>,

    /// true の間は insert / update が失敗する
    fail_writes: bool,

    /// 成功した update の回数
    updates: usize,
}

impl BackendState {
    fn publish(&mut self, record: &WorkspaceRecord) {
        let Some(senders) = self.subscribers.get_mut(&record.id) else {
            return;
        };
        senders.retain(|tx| {
            tx.send(DomainEvent::WorkspaceUpdated {
                record: record.clone(),
            })
            .is_ok()
        });
        if senders.is_empty() {
            self.subscribers.remove(&record.id);
        }
    }
}

/// InMemoryBackend は WorkspaceStore と RealtimeFeed の開発用実装
///
/// # 使用例
/// ```ignore
/// let backend = Arc::new(InMemoryBackend::new());
/// let mut channel = backend.subscribe(&id).await?;
/// backend.update(&id, WorkspacePatch::timer_value(3)).await?;
/// let event = channel.recv().await;
/// ```
#[derive(Clone, Default)]
pub struct InMemoryBackend {
    state: Arc<Mutex<BackendState>>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// 書き込み失敗の注入（テスト用）
    pub async fn set_fail_writes(&self, fail: bool) {
        self.state.lock().await.fail_writes = fail;
    }

    /// 行をそのまま取得（テスト・デモ用）
    pub async fn get(&self, id: &WorkspaceId) -> Option<WorkspaceRecord> {
        self.state.lock().await.rows.get(id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.state.lock().await.rows.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn update_count(&self) -> usize {
        self.state.lock().await.updates
    }

    /// まだ受信側が生きている購読者の数
    pub async fn subscriber_count(&self, id: &WorkspaceId) -> usize {
        self.state
            .lock()
            .await
            .subscribers
            .get(id)
            .map(|senders| senders.iter().filter(|tx| !tx.is_closed()).count())
            .unwrap_or(0)
    }
}

#[async_trait]
impl WorkspaceStore for InMemoryBackend {
    async fn fetch(&self, id: &WorkspaceId) -> Result<WorkspaceLookup, StoreError> {
        Ok(self.state.lock().await.rows.get(id).cloned().into())
    }

    async fn list_for_user(&self, user_id: &UserId) -> Result<Vec<WorkspaceRecord>, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .order
            .iter()
            .filter_map(|id| state.rows.get(id))
            .filter(|record| &record.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn insert(&self, record: WorkspaceRecord) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        if state.fail_writes {
            return Err(StoreError::Backend("injected write failure".to_string()));
        }
        if state.rows.contains_key(&record.id) {
            return Err(StoreError::AlreadyExists(record.id));
        }
        debug!(workspace_id = %record.id, user_id = %record.user_id, "workspace inserted");
        state.order.push(record.id.clone());
        state.rows.insert(record.id.clone(), record);
        Ok(())
    }

    async fn update(&self, id: &WorkspaceId, patch: WorkspacePatch) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        if state.fail_writes {
            return Err(StoreError::Backend("injected write failure".to_string()));
        }
        let record = match state.rows.get_mut(id) {
            Some(record) => {
                record.apply(&patch);
                record.clone()
            }
            None => return Err(StoreError::NotFound(id.clone())),
        };
        state.updates += 1;
        state.publish(&record);
        Ok(())
    }
}

#[async_trait]
impl RealtimeFeed for InMemoryBackend {
    async fn subscribe(&self, id: &WorkspaceId) -> Result<RealtimeChannel, StoreError> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.state
            .lock()
            .await
            .subscribers
            .entry(id.clone())
            .or_default()
            .push(tx);
        debug!(workspace_id = %id, "realtime channel subscribed");
        Ok(RealtimeChannel::new(id.clone(), rx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TimerFields;

    fn record(id: &str, user: &str) -> WorkspaceRecord {
        WorkspaceRecord::new(WorkspaceId::new(id), UserId::new(user), "My Workspace")
    }

    #[tokio::test]
    async fn insert_then_fetch() {
        let backend = InMemoryBackend::new();
        backend.insert(record("ws_1", "user_1")).await.unwrap();

        let found = backend.fetch(&WorkspaceId::new("ws_1")).await.unwrap();
        assert_eq!(found, WorkspaceLookup::Found(record("ws_1", "user_1")));

        let missing = backend.fetch(&WorkspaceId::new("ws_2")).await.unwrap();
        assert_eq!(missing, WorkspaceLookup::NotFound);
    }

    #[tokio::test]
    async fn duplicate_insert_is_rejected() {
        let backend = InMemoryBackend::new();
        backend.insert(record("ws_1", "user_1")).await.unwrap();

        let err = backend.insert(record("ws_1", "user_1")).await.unwrap_err();
        assert_eq!(err, StoreError::AlreadyExists(WorkspaceId::new("ws_1")));
    }

    #[tokio::test]
    async fn list_for_user_keeps_creation_order() {
        let backend = InMemoryBackend::new();
        backend.insert(record("ws_b", "user_1")).await.unwrap();
        backend.insert(record("ws_x", "user_2")).await.unwrap();
        backend.insert(record("ws_a", "user_1")).await.unwrap();

        let ids: Vec<String> = backend
            .list_for_user(&UserId::new("user_1"))
            .await
            .unwrap()
            .into_iter()
            .map(|record| record.id.to_string())
            .collect();
        assert_eq!(ids, vec!["ws_b", "ws_a"]);
    }

    #[tokio::test]
    async fn update_missing_row_is_not_found() {
        let backend = InMemoryBackend::new();
        let err = backend
            .update(&WorkspaceId::new("ws_1"), WorkspacePatch::timer_value(1))
            .await
            .unwrap_err();
        assert_eq!(err, StoreError::NotFound(WorkspaceId::new("ws_1")));
    }

    #[tokio::test]
    async fn update_is_pushed_to_subscribers_of_that_row_only() {
        let backend = InMemoryBackend::new();
        backend.insert(record("ws_1", "user_1")).await.unwrap();
        backend.insert(record("ws_2", "user_1")).await.unwrap();
        let mut one = backend.subscribe(&WorkspaceId::new("ws_1")).await.unwrap();
        let mut two = backend.subscribe(&WorkspaceId::new("ws_2")).await.unwrap();

        let fields = TimerFields {
            duration: 10,
            remaining: 3,
            running: false,
        };
        backend
            .update(&WorkspaceId::new("ws_1"), WorkspacePatch::timer(fields))
            .await
            .unwrap();

        let DomainEvent::WorkspaceUpdated { record } = one.recv().await.unwrap();
        assert_eq!(record.timer_fields(1500), fields);
        assert_eq!(two.try_recv(), None);
    }

    #[tokio::test]
    async fn dropped_channels_are_pruned() {
        let backend = InMemoryBackend::new();
        backend.insert(record("ws_1", "user_1")).await.unwrap();
        let id = WorkspaceId::new("ws_1");

        let channel = backend.subscribe(&id).await.unwrap();
        assert_eq!(backend.subscriber_count(&id).await, 1);

        channel.unsubscribe();
        assert_eq!(backend.subscriber_count(&id).await, 0);

        backend.update(&id, WorkspacePatch::timer_value(1)).await.unwrap();
        assert!(backend.state.lock().await.subscribers.get(&id).is_none());
    }

    #[tokio::test]
    async fn injected_failures_leave_rows_untouched() {
        let backend = InMemoryBackend::new();
        backend.insert(record("ws_1", "user_1")).await.unwrap();
        backend.set_fail_writes(true).await;

        let id = WorkspaceId::new("ws_1");
        assert!(matches!(
            backend.update(&id, WorkspacePatch::data("\\x00")).await,
            Err(StoreError::Backend(_))
        ));
        assert_eq!(backend.get(&id).await.unwrap().data, "");
        assert_eq!(backend.update_count().await, 0);
    }
}
