//! Workspace loader - セッション開始時にどの workspace を開くか決める
//!
//! # ルール
//! 1. 現在の workspace id が指定されていれば、その行を直接取りに行く（なければ NotFound）
//! 2. 指定がなければ、ユーザーが所有する最初の workspace
//! 3. 1 つもなければ空の workspace を 1 つ作る（ユーザーごとに 1 回だけ）

use tracing::{info, warn};

use super::session::SessionContext;
use crate::domain::{WorkspaceId, WorkspaceLookup, WorkspaceRecord};
use crate::ports::{IdGenerator, WorkspaceStore};

/// workspace を 1 つ決める
///
/// 読み込みの失敗は NotFound として扱う。作成の失敗はログに残し、
/// 作った行はローカルでそのまま使う。
pub async fn load_workspace(
    store: &dyn WorkspaceStore,
    ids: &dyn IdGenerator,
    session: &SessionContext,
    current: Option<&WorkspaceId>,
    default_name: &str,
) -> WorkspaceLookup {
    if let Some(id) = current {
        return match store.fetch(id).await {
            Ok(lookup) => lookup,
            Err(err) => {
                warn!(workspace_id = %id, error = %err, "failed to fetch workspace");
                WorkspaceLookup::NotFound
            }
        };
    }

    let user_id = session.user_id();
    let existing = match store.list_for_user(user_id).await {
        Ok(records) => records,
        Err(err) => {
            warn!(user_id = %user_id, error = %err, "failed to list workspaces");
            return WorkspaceLookup::NotFound;
        }
    };
    if let Some(first) = existing.into_iter().next() {
        return WorkspaceLookup::Found(first);
    }

    let record = WorkspaceRecord::new(ids.workspace_id(), user_id.clone(), default_name);
    match store.insert(record.clone()).await {
        Ok(()) => info!(workspace_id = %record.id, user_id = %user_id, "workspace created"),
        Err(err) => warn!(workspace_id = %record.id, error = %err, "failed to create workspace"),
    }
    WorkspaceLookup::Found(record)
}
