//! IdGenerator port - ID 生成の抽象化
//!
//! workspace / user / todo の ID はどのクライアントで生成しても衝突しない必要があります。
//! テスト容易性のために trait として抽象化しています。
//!
//! # 実装
//! - **UlidGenerator**: ULID ベース

use crate::domain::ids::{TodoId, UserId, WorkspaceId};
use crate::ports::Clock;
use ulid::Ulid;

/// IdGenerator は分散環境で使える ID を生成
///
/// # Thread Safety
/// - `Send + Sync` を要求（永続化タスクや auth 実装からも使う）
pub trait IdGenerator: Send + Sync {
    fn workspace_id(&self) -> WorkspaceId;

    fn user_id(&self) -> UserId;

    fn todo_id(&self) -> TodoId;
}

/// UlidGenerator は ULID ベースの ID 生成器
///
/// Clock を使って現在時刻ベースの ULID を生成します。
/// テスト時は FixedClock でタイムスタンプ部分を固定できます。
pub struct UlidGenerator<C> {
    clock: C,
}

impl<C: Clock> UlidGenerator<C> {
    pub fn new(clock: C) -> Self {
        Self { clock }
    }

    fn next_ulid(&self) -> Ulid {
        let timestamp_ms = self.clock.now().timestamp_millis() as u64;
        Ulid::from_parts(timestamp_ms, rand::random())
    }
}

impl<C: Clock> IdGenerator for UlidGenerator<C> {
    fn workspace_id(&self) -> WorkspaceId {
        WorkspaceId::from_ulid(self.next_ulid())
    }

    fn user_id(&self) -> UserId {
        UserId::from_ulid(self.next_ulid())
    }

    fn todo_id(&self) -> TodoId {
        TodoId::from_ulid(self.next_ulid())
    }
}
