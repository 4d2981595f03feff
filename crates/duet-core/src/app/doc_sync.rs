//! DocumentSync - todo ドキュメントと workspace 行の `data` カラムをつなぐ
//!
//! # フロー
//! 1. 開くとき: `data` を hex デコードして新しいドキュメントを作る
//! 2. ローカル編集: 1 操作 = 1 commit
//! 3. commit 通知（undo/redo 含む）: スナップショット全体を hex にして `data` へ書く
//!
//! 書き込みは `Persister` に積むだけなので、編集はすぐにローカルへ反映されます。

use std::sync::Arc;

use tracing::debug;

use super::persister::Persister;
use crate::codec;
use crate::document::{HistoryAction, KeyChord, ListenerHandle, TodoDocument};
use crate::domain::{TodoId, TodoItem, WorkspaceId, WorkspacePatch, WorkspaceRecord};
use crate::error::DuetError;
use crate::ports::IdGenerator;

pub struct DocumentSync {
    workspace_id: WorkspaceId,
    document: TodoDocument,
    ids: Arc<dyn IdGenerator>,
    _persist: ListenerHandle,
}

impl DocumentSync {
    /// workspace 行からドキュメントを組み立て、永続化リスナーを登録
    pub fn open(
        record: &WorkspaceRecord,
        ids: Arc<dyn IdGenerator>,
        persister: Persister,
        undo_steps: usize,
    ) -> Self {
        let document = TodoDocument::load(&record.data, undo_steps);
        let workspace_id = record.id.clone();
        let persist = document.subscribe({
            let workspace_id = workspace_id.clone();
            move |change| {
                let encoded = codec::encode(&change.snapshot);
                persister.persist(&workspace_id, WorkspacePatch::data(encoded));
            }
        });
        debug!(workspace_id = %workspace_id, items = document.len(), "document opened");
        Self {
            workspace_id,
            document,
            ids,
            _persist: persist,
        }
    }

    pub fn workspace_id(&self) -> &WorkspaceId {
        &self.workspace_id
    }

    /// 末尾に追加。空文字列は無視（`Ok(None)`）、それ以外は入力どおりに保存
    pub fn add_todo(&mut self, text: &str) -> Result<Option<TodoItem>, DuetError> {
        if text.is_empty() {
            return Ok(None);
        }
        let item = TodoItem::new(self.ids.todo_id(), text);
        Ok(Some(self.document.add(item)?))
    }

    pub fn toggle_todo(&mut self, id: &TodoId) -> Result<Option<TodoItem>, DuetError> {
        Ok(self.document.toggle(id)?)
    }

    pub fn undo(&mut self) -> Result<bool, DuetError> {
        Ok(self.document.undo()?)
    }

    pub fn redo(&mut self) -> Result<bool, DuetError> {
        Ok(self.document.redo()?)
    }

    pub fn apply_history(&mut self, action: HistoryAction) -> Result<bool, DuetError> {
        Ok(self.document.apply_history(action)?)
    }

    pub fn apply_chord(&mut self, chord: &KeyChord) -> Result<Option<bool>, DuetError> {
        Ok(self.document.apply_chord(chord)?)
    }

    pub fn can_undo(&self) -> bool {
        self.document.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.document.can_redo()
    }

    pub fn items(&self) -> Vec<TodoItem> {
        self.document.items()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::UserId;
    use crate::impls::InMemoryBackend;
    use crate::observability::PersistStats;
    use crate::ports::{SystemClock, UlidGenerator, WorkspaceStore};

    struct Fixture {
        backend: Arc<InMemoryBackend>,
        persister: Persister,
        ids: Arc<dyn IdGenerator>,
        record: WorkspaceRecord,
    }

    async fn fixture() -> Fixture {
        let backend = Arc::new(InMemoryBackend::new());
        let record = WorkspaceRecord::new(
            WorkspaceId::new("ws_1"),
            UserId::new("user_1"),
            "My Workspace",
        );
        backend.insert(record.clone()).await.unwrap();
        let persister = Persister::spawn(backend.clone(), Arc::new(PersistStats::default()));
        Fixture {
            backend,
            persister,
            ids: Arc::new(UlidGenerator::new(SystemClock)),
            record,
        }
    }

    impl Fixture {
        fn open(&self, record: &WorkspaceRecord) -> DocumentSync {
            DocumentSync::open(record, self.ids.clone(), self.persister.clone(), 100)
        }

        async fn stored(&self) -> WorkspaceRecord {
            self.persister.flush().await;
            self.backend.get(&self.record.id).await.unwrap()
        }
    }

    #[tokio::test]
    async fn add_persists_full_snapshot() {
        let fx = fixture().await;
        let mut sync = fx.open(&fx.record);

        let item = sync.add_todo("Test Loro").unwrap().unwrap();
        assert!(item.id.as_str().starts_with("todo_"));
        assert!(!item.completed);

        let stored = fx.stored().await;
        assert!(stored.data.starts_with("\\x"));
        let reloaded = fx.open(&stored);
        assert_eq!(reloaded.items(), vec![item]);
    }

    #[tokio::test]
    async fn empty_text_is_ignored() {
        let fx = fixture().await;
        let mut sync = fx.open(&fx.record);

        assert_eq!(sync.add_todo("").unwrap(), None);
        assert!(sync.items().is_empty());
        assert_eq!(fx.stored().await.data, "");
    }

    #[tokio::test]
    async fn text_is_stored_as_typed() {
        let fx = fixture().await;
        let mut sync = fx.open(&fx.record);

        let padded = sync.add_todo("  buy milk ").unwrap().unwrap();
        let blank = sync.add_todo("   ").unwrap().unwrap();
        assert_eq!(padded.text, "  buy milk ");
        assert_eq!(blank.text, "   ");

        let stored = fx.stored().await;
        let texts: Vec<String> = fx.open(&stored).items().into_iter().map(|i| i.text).collect();
        assert_eq!(texts, vec!["  buy milk ", "   "]);
    }

    #[tokio::test]
    async fn undo_and_redo_are_persisted_too() {
        let fx = fixture().await;
        let mut sync = fx.open(&fx.record);
        sync.add_todo("A").unwrap();
        sync.add_todo("B").unwrap();

        assert!(sync.apply_history(HistoryAction::Undo).unwrap());
        let stored = fx.stored().await;
        let texts: Vec<String> = fx.open(&stored).items().into_iter().map(|i| i.text).collect();
        assert_eq!(texts, vec!["A"]);

        assert_eq!(sync.apply_chord(&KeyChord::new("z").ctrl().shift()).unwrap(), Some(true));
        let stored = fx.stored().await;
        assert_eq!(fx.open(&stored).items().len(), 2);
        assert_eq!(fx.backend.update_count().await, 4);
    }

    #[tokio::test]
    async fn toggle_persists_flag() {
        let fx = fixture().await;
        let mut sync = fx.open(&fx.record);
        let item = sync.add_todo("A").unwrap().unwrap();

        sync.toggle_todo(&item.id).unwrap();
        let stored = fx.stored().await;
        assert!(fx.open(&stored).items()[0].completed);
    }

    #[tokio::test]
    async fn edits_survive_failed_writes_locally() {
        let fx = fixture().await;
        fx.backend.set_fail_writes(true).await;
        let mut sync = fx.open(&fx.record);

        sync.add_todo("offline").unwrap();
        fx.persister.flush().await;

        assert_eq!(sync.items().len(), 1);
        assert_eq!(fx.persister.stats().failed, 1);
    }
}
