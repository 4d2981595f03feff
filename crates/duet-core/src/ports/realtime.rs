//! RealtimeFeed port - 行単位の変更プッシュ
//!
//! 1 つの workspace 行の UPDATE イベントだけを購読します。
//! `RealtimeChannel` を drop すると購読解除になります。

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::workspace_store::StoreError;
use crate::domain::{DomainEvent, WorkspaceId};

/// RealtimeFeed は workspace 行の変更を配信
#[async_trait]
pub trait RealtimeFeed: Send + Sync {
    async fn subscribe(&self, id: &WorkspaceId) -> Result<RealtimeChannel, StoreError>;
}

/// 1 つの workspace 行に対する購読
///
/// 受信側を閉じると送信側（フィード実装）は次の配信で購読者を除去します。
#[derive(Debug)]
pub struct RealtimeChannel {
    workspace_id: WorkspaceId,
    rx: mpsc::UnboundedReceiver<DomainEvent>,
}

impl RealtimeChannel {
    pub fn new(workspace_id: WorkspaceId, rx: mpsc::UnboundedReceiver<DomainEvent>) -> Self {
        Self { workspace_id, rx }
    }

    /// 何も届かないチャンネル（購読に失敗したときの代用）
    pub fn detached(workspace_id: WorkspaceId) -> Self {
        let (_tx, rx) = mpsc::unbounded_channel();
        Self::new(workspace_id, rx)
    }

    pub fn workspace_id(&self) -> &WorkspaceId {
        &self.workspace_id
    }

    /// 次のイベント。フィードが閉じたら `None`
    pub async fn recv(&mut self) -> Option<DomainEvent> {
        self.rx.recv().await
    }

    pub fn try_recv(&mut self) -> Option<DomainEvent> {
        self.rx.try_recv().ok()
    }

    /// 明示的な購読解除（drop と同じ）
    pub fn unsubscribe(mut self) {
        self.rx.close();
    }
}
