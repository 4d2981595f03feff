//! WorkspaceStore port - バックエンドの workspaces テーブル
//!
//! 1 行 = 1 workspace（ドキュメントの hex スナップショット + タイマーの 3 カラム）。
//!
//! # 実装
//! - **InMemoryBackend**: 開発・テスト用（`impls::inmem_backend`）

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{UserId, WorkspaceId, WorkspaceLookup, WorkspacePatch, WorkspaceRecord};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("workspace {0} not found")]
    NotFound(WorkspaceId),

    #[error("workspace {0} already exists")]
    AlreadyExists(WorkspaceId),

    #[error("backend request failed: {0}")]
    Backend(String),
}

/// WorkspaceStore は workspace 行の正本（source of truth）
///
/// # 設計原則
/// - 書き込みは `id` をキーにした部分更新（`WorkspacePatch` の `Some` のカラムだけ）
/// - 「存在しない」はエラーではなく `WorkspaceLookup::NotFound`
#[async_trait]
pub trait WorkspaceStore: Send + Sync {
    async fn fetch(&self, id: &WorkspaceId) -> Result<WorkspaceLookup, StoreError>;

    /// ユーザーが所有する workspace（作成順）
    async fn list_for_user(&self, user_id: &UserId) -> Result<Vec<WorkspaceRecord>, StoreError>;

    async fn insert(&self, record: WorkspaceRecord) -> Result<(), StoreError>;

    async fn update(&self, id: &WorkspaceId, patch: WorkspacePatch) -> Result<(), StoreError>;
}
