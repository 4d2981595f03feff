//! Events - realtime チャンネルから届くドメインイベント

use super::ids::WorkspaceId;
use super::workspace::WorkspaceRecord;

/// DomainEvent はバックエンドで発生した変更通知
///
/// 現状は workspace 行の UPDATE のみ。`record` は更新後の行そのもの（verbatim）。
#[derive(Debug, Clone, PartialEq)]
pub enum DomainEvent {
    WorkspaceUpdated { record: WorkspaceRecord },
}

impl DomainEvent {
    pub fn workspace_id(&self) -> &WorkspaceId {
        match self {
            DomainEvent::WorkspaceUpdated { record } => &record.id,
        }
    }
}
