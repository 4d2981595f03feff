//! Persister - workspace 行への書き込み（fire-and-forget）
//!
//! # 設計原則
//! - 呼び出し側は書き込みを待たない（`persist` は同期関数でキューに積むだけ）
//! - 書き込みは 1 つの writer タスクが順番に実行する（投げた順 = 反映順）
//! - 失敗はログとカウンタに残すだけで、呼び出し側には返さない（リトライなし）
//!
//! # フロー
//! 1. `persist(id, patch)` → mpsc キューへ
//! 2. writer タスクが `WorkspaceStore::update()` を実行
//! 3. 結果を `PersistStats` に記録

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::domain::{WorkspaceId, WorkspacePatch};
use crate::observability::{PersistCounts, PersistStats};
use crate::ports::WorkspaceStore;

enum WriteCommand {
    Update {
        id: WorkspaceId,
        patch: WorkspacePatch,
    },
    /// ここまでに積まれた書き込みが終わったら通知
    Flush(oneshot::Sender<()>),
}

/// Persister は書き込みキューの送信側
///
/// clone しても同じ writer タスクを共有します。全ての clone が drop されると
/// writer タスクは残りを書き終えてから終了します。
#[derive(Clone)]
pub struct Persister {
    tx: mpsc::UnboundedSender<WriteCommand>,
    stats: Arc<PersistStats>,
}

impl Persister {
    /// writer タスクを起動（tokio ランタイム上で呼ぶこと）
    pub fn spawn(store: Arc<dyn WorkspaceStore>, stats: Arc<PersistStats>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let _join: JoinHandle<()> = tokio::spawn(writer_loop(store, Arc::clone(&stats), rx));
        Self { tx, stats }
    }

    /// 書き込みを積む。結果は待たない
    pub fn persist(&self, id: &WorkspaceId, patch: WorkspacePatch) {
        if patch.is_empty() {
            return;
        }
        let command = WriteCommand::Update {
            id: id.clone(),
            patch,
        };
        if self.tx.send(command).is_err() {
            warn!(workspace_id = %id, "writer stopped; dropping write");
            self.stats.record_dropped();
        }
    }

    /// ここまでに積んだ書き込みの完了を待つ（テスト・終了処理用）
    pub async fn flush(&self) {
        let (done_tx, done_rx) = oneshot::channel();
        if self.tx.send(WriteCommand::Flush(done_tx)).is_err() {
            return;
        }
        // writer が落ちていても待ち続けない
        let _ = done_rx.await;
    }

    pub fn stats(&self) -> PersistCounts {
        self.stats.counts()
    }
}

async fn writer_loop(
    store: Arc<dyn WorkspaceStore>,
    stats: Arc<PersistStats>,
    mut rx: mpsc::UnboundedReceiver<WriteCommand>,
) {
    while let Some(command) = rx.recv().await {
        match command {
            WriteCommand::Update { id, patch } => match store.update(&id, patch).await {
                Ok(()) => {
                    debug!(workspace_id = %id, "workspace row updated");
                    stats.record_success();
                }
                Err(err) => {
                    // ローカル状態が正。次の変更でまた全体を送る
                    warn!(workspace_id = %id, error = %err, "failed to persist workspace update");
                    stats.record_failure();
                }
            },
            WriteCommand::Flush(done) => {
                let _ = done.send(());
            }
        }
    }
    debug!("writer stopped");
}
