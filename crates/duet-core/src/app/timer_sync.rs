//! TimerSync - タイマーの状態機械と workspace 行のタイマーカラムをつなぐ
//!
//! # 設計原則
//! - タイマーはドキュメントを通らず、3 つのスカラーカラムとして同期する
//! - ローカル遷移は即座に反映し、返ってきた patch を `Persister` に積む
//! - リモートの更新は 3 フィールドをそのまま上書き（last-writer-wins）

use tracing::{debug, trace};

use super::persister::Persister;
use crate::domain::{DomainEvent, Timer, TimerEdit, TimerFields, WorkspaceId, WorkspaceRecord};

pub struct TimerSync {
    workspace_id: WorkspaceId,
    timer: Timer,
    persister: Persister,
    default_secs: u32,
}

impl TimerSync {
    /// workspace 行のタイマーカラムから復元（null はデフォルト値）
    pub fn open(record: &WorkspaceRecord, persister: Persister, default_secs: u32) -> Self {
        Self {
            workspace_id: record.id.clone(),
            timer: Timer::from_fields(record.timer_fields(default_secs)),
            persister,
            default_secs,
        }
    }

    pub fn workspace_id(&self) -> &WorkspaceId {
        &self.workspace_id
    }

    pub fn timer(&self) -> &Timer {
        &self.timer
    }

    pub fn fields(&self) -> TimerFields {
        self.timer.fields()
    }

    pub fn is_running(&self) -> bool {
        self.timer.is_running()
    }

    /// 開始。すでに動いていれば何もしない
    pub fn start(&mut self) -> bool {
        match self.timer.start() {
            Some(patch) => {
                debug!(workspace_id = %self.workspace_id, remaining = self.timer.remaining(), "timer started");
                self.persister.persist(&self.workspace_id, patch);
                true
            }
            None => false,
        }
    }

    /// 一時停止。止まっていれば何もしない
    pub fn pause(&mut self) -> bool {
        match self.timer.pause() {
            Some(patch) => {
                debug!(workspace_id = %self.workspace_id, remaining = self.timer.remaining(), "timer paused");
                self.persister.persist(&self.workspace_id, patch);
                true
            }
            None => false,
        }
    }

    pub fn reset(&mut self) {
        let patch = self.timer.reset();
        debug!(workspace_id = %self.workspace_id, "timer reset");
        self.persister.persist(&self.workspace_id, patch);
    }

    /// 1 秒分進める（動いているときだけ）
    pub fn tick(&mut self) -> bool {
        match self.timer.tick() {
            Some(patch) => {
                trace!(workspace_id = %self.workspace_id, remaining = self.timer.remaining(), "tick");
                self.persister.persist(&self.workspace_id, patch);
                true
            }
            None => false,
        }
    }

    pub fn set_duration(&mut self, minutes: u32, seconds: u32) {
        let patch = self.timer.set_duration(minutes, seconds);
        debug!(workspace_id = %self.workspace_id, duration = self.timer.duration(), "timer length changed");
        self.persister.persist(&self.workspace_id, patch);
    }

    /// インライン編集の確定
    pub fn commit_edit(&mut self, edit: &TimerEdit) {
        let patch = edit.commit(&mut self.timer);
        self.persister.persist(&self.workspace_id, patch);
    }

    /// realtime で届いた行を反映。別の workspace の行なら無視
    pub fn apply_remote(&mut self, event: &DomainEvent) -> bool {
        if event.workspace_id() != &self.workspace_id {
            return false;
        }
        let DomainEvent::WorkspaceUpdated { record } = event;
        let fields = record.timer_fields(self.default_secs);
        self.timer.overwrite(fields);
        debug!(
            workspace_id = %self.workspace_id,
            remaining = fields.remaining,
            running = fields.running,
            "timer overwritten by remote update"
        );
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::domain::{UserId, WorkspacePatch};
    use crate::impls::InMemoryBackend;
    use crate::observability::PersistStats;
    use crate::ports::WorkspaceStore;

    async fn setup() -> (Arc<InMemoryBackend>, TimerSync) {
        let backend = Arc::new(InMemoryBackend::new());
        let record = WorkspaceRecord::new(
            WorkspaceId::new("ws_1"),
            UserId::new("user_1"),
            "My Workspace",
        );
        backend.insert(record.clone()).await.unwrap();
        let persister = Persister::spawn(backend.clone(), Arc::new(PersistStats::default()));
        (backend, TimerSync::open(&record, persister, 1500))
    }

    async fn stored(backend: &InMemoryBackend, sync: &TimerSync) -> WorkspaceRecord {
        sync.persister.flush().await;
        backend.get(sync.workspace_id()).await.unwrap()
    }

    #[tokio::test]
    async fn null_columns_use_defaults() {
        let (_backend, sync) = setup().await;
        assert_eq!(
            sync.fields(),
            TimerFields {
                duration: 1500,
                remaining: 1500,
                running: false
            }
        );
    }

    #[tokio::test]
    async fn start_persists_all_three_columns() {
        let (backend, mut sync) = setup().await;
        assert!(sync.start());
        assert!(!sync.start());

        let row = stored(&backend, &sync).await;
        assert_eq!(row.timer_running, Some(true));
        assert_eq!(row.timer_value, Some(1500));
        assert_eq!(row.timer_duration, Some(1500));
        assert_eq!(backend.update_count().await, 1);
    }

    #[tokio::test]
    async fn tick_persists_remaining_only() {
        let (backend, mut sync) = setup().await;
        assert!(!sync.tick());

        sync.start();
        assert!(sync.tick());
        let row = stored(&backend, &sync).await;
        assert_eq!(row.timer_value, Some(1499));
        assert_eq!(row.timer_running, Some(true));
    }

    #[tokio::test]
    async fn edit_commit_sets_length() {
        let (backend, mut sync) = setup().await;
        let mut edit = TimerEdit::from_duration(sync.timer().duration());
        edit.set_minutes_input("1");
        edit.set_seconds_input("75");
        sync.commit_edit(&edit);

        assert_eq!(sync.fields().duration, 119);
        let row = stored(&backend, &sync).await;
        assert_eq!(row.timer_duration, Some(119));
        assert_eq!(row.timer_value, Some(119));
        assert_eq!(row.timer_running, None);
    }

    #[tokio::test]
    async fn remote_update_overwrites_verbatim() {
        let (_backend, mut sync) = setup().await;
        sync.start();

        let mut record = WorkspaceRecord::new(
            WorkspaceId::new("ws_1"),
            UserId::new("user_2"),
            "My Workspace",
        );
        record.apply(&WorkspacePatch::timer(TimerFields {
            duration: 600,
            remaining: 42,
            running: false,
        }));
        assert!(sync.apply_remote(&DomainEvent::WorkspaceUpdated { record }));
        assert_eq!(
            sync.fields(),
            TimerFields {
                duration: 600,
                remaining: 42,
                running: false
            }
        );
    }

    #[tokio::test]
    async fn remote_update_for_other_workspace_is_ignored() {
        let (_backend, mut sync) = setup().await;
        let record = WorkspaceRecord::new(
            WorkspaceId::new("ws_other"),
            UserId::new("user_1"),
            "Other",
        );
        assert!(!sync.apply_remote(&DomainEvent::WorkspaceUpdated { record }));
        assert_eq!(sync.fields().remaining, 1500);
    }
}
