//! TodoDocument - `loro` ドキュメント上の todo リスト
//!
//! # 学習ポイント
//! - CRDT 本体は `loro` に任せ、このモジュールは「todo リストとしての操作」だけを提供
//! - 1 操作 = 1 commit = 1 undo ステップ
//! - commit の直後にリスナーへ同期通知（永続化はリスナー側の責務）

use std::collections::HashMap;
use std::fmt;

use loro::{ExportMode, LoroDoc, LoroList, LoroValue, ToJson, UndoManager};
use thiserror::Error;
use tracing::{debug, warn};

use super::history::{HistoryAction, KeyChord};
use super::listeners::{ChangeOrigin, DocumentChange, ListenerHandle, ListenerRegistry};
use crate::codec;
use crate::domain::{TodoId, TodoItem};

/// todo を格納するリストコンテナの名前
pub const TODOS_LIST: &str = "todos";

/// undo 履歴の上限
pub const MAX_UNDO_STEPS: usize = 100;

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("crdt operation failed: {0}")]
    Crdt(String),

    #[error("snapshot export failed: {0}")]
    Export(String),

    #[error("snapshot import failed: {0}")]
    Import(String),
}

/// todo リストを持つ協調編集ドキュメント
///
/// # 不変条件
/// - `snapshot()` → `from_snapshot()` で id / text / completed / 順序が保存される
/// - undo はローカル編集のみが対象（スナップショットから読み込んだ内容は戻せない）
pub struct TodoDocument {
    doc: LoroDoc,
    undo: UndoManager,
    listeners: ListenerRegistry,
}

impl TodoDocument {
    /// 空のドキュメント
    pub fn new() -> Self {
        Self::with_undo_steps(MAX_UNDO_STEPS)
    }

    pub fn with_undo_steps(undo_steps: usize) -> Self {
        Self::wrap(LoroDoc::new(), undo_steps)
    }

    /// スナップショットから復元（厳密版）
    ///
    /// 空のバイト列は「ドキュメントなし」として空のドキュメントを返します。
    pub fn from_snapshot(bytes: &[u8], undo_steps: usize) -> Result<Self, DocumentError> {
        let doc = LoroDoc::new();
        if !bytes.is_empty() {
            doc.import(bytes)
                .map_err(|e| DocumentError::Import(e.to_string()))?;
        }
        Ok(Self::wrap(doc, undo_steps))
    }

    /// `data` カラムの値から復元（寛容版）
    ///
    /// hex として壊れている・CRDT として読めない場合は空のドキュメントにフォールバック。
    pub fn load(stored: &str, undo_steps: usize) -> Self {
        let bytes = codec::decode(stored);
        match Self::from_snapshot(&bytes, undo_steps) {
            Ok(document) => document,
            Err(err) => {
                warn!(error = %err, "stored document is corrupt; starting a new one");
                Self::with_undo_steps(undo_steps)
            }
        }
    }

    fn wrap(doc: LoroDoc, undo_steps: usize) -> Self {
        // UndoManager は生成以降のローカル commit だけを記録する
        let mut undo = UndoManager::new(&doc);
        undo.set_max_undo_steps(undo_steps);
        undo.set_merge_interval(0);
        Self {
            doc,
            undo,
            listeners: ListenerRegistry::default(),
        }
    }

    fn todos(&self) -> LoroList {
        self.doc.get_list(TODOS_LIST)
    }

    /// ドキュメント全体のスナップショット
    pub fn snapshot(&self) -> Result<Vec<u8>, DocumentError> {
        self.doc
            .export(ExportMode::Snapshot)
            .map_err(|e| DocumentError::Export(e.to_string()))
    }

    /// 現在の todo（リスト順）
    ///
    /// 形の合わない要素は読み飛ばします。
    pub fn items(&self) -> Vec<TodoItem> {
        self.entries()
            .into_iter()
            .filter_map(|value| match serde_json::from_value(value) {
                Ok(item) => Some(item),
                Err(err) => {
                    warn!(error = %err, "skipping malformed todo entry");
                    None
                }
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.todos().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn entries(&self) -> Vec<serde_json::Value> {
        match self.todos().get_deep_value().to_json_value() {
            serde_json::Value::Array(values) => values,
            _ => Vec::new(),
        }
    }

    /// id でリスト上の位置を探す
    fn position(&self, id: &TodoId) -> Option<(usize, TodoItem)> {
        self.entries()
            .into_iter()
            .enumerate()
            .find_map(|(index, value)| {
                serde_json::from_value::<TodoItem>(value)
                    .ok()
                    .filter(|item| &item.id == id)
                    .map(|item| (index, item))
            })
    }

    /// 末尾に追加して commit
    pub fn add(&mut self, item: TodoItem) -> Result<TodoItem, DocumentError> {
        self.todos()
            .push(item_value(&item))
            .map_err(|e| DocumentError::Crdt(e.to_string()))?;
        self.commit(ChangeOrigin::Local)?;
        Ok(item)
    }

    /// completed を反転して commit
    ///
    /// リストは位置指定の置き換えしかできないので、同じ位置に削除→挿入します。
    /// id が見つからなければ何もしない（`Ok(None)`）。
    pub fn toggle(&mut self, id: &TodoId) -> Result<Option<TodoItem>, DocumentError> {
        let Some((index, item)) = self.position(id) else {
            debug!(todo_id = %id, "toggle ignored; no such todo");
            return Ok(None);
        };
        let toggled = item.toggled();
        let todos = self.todos();
        todos
            .delete(index, 1)
            .map_err(|e| DocumentError::Crdt(e.to_string()))?;
        todos
            .insert(index, item_value(&toggled))
            .map_err(|e| DocumentError::Crdt(e.to_string()))?;
        self.commit(ChangeOrigin::Local)?;
        Ok(Some(toggled))
    }

    /// 直近のローカル commit を取り消す。戻せたら `true`
    pub fn undo(&mut self) -> Result<bool, DocumentError> {
        let changed = self
            .undo
            .undo()
            .map_err(|e| DocumentError::Crdt(e.to_string()))?;
        if changed {
            self.commit(ChangeOrigin::Undo)?;
        }
        Ok(changed)
    }

    /// 直近の undo をやり直す。やり直せたら `true`
    pub fn redo(&mut self) -> Result<bool, DocumentError> {
        let changed = self
            .undo
            .redo()
            .map_err(|e| DocumentError::Crdt(e.to_string()))?;
        if changed {
            self.commit(ChangeOrigin::Redo)?;
        }
        Ok(changed)
    }

    pub fn can_undo(&self) -> bool {
        self.undo.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.undo.can_redo()
    }

    /// ボタンとショートカットの共通入口
    pub fn apply_history(&mut self, action: HistoryAction) -> Result<bool, DocumentError> {
        match action {
            HistoryAction::Undo => self.undo(),
            HistoryAction::Redo => self.redo(),
        }
    }

    /// キー入力を履歴操作として処理する。対象外のキーなら `Ok(None)`
    pub fn apply_chord(&mut self, chord: &KeyChord) -> Result<Option<bool>, DocumentError> {
        match chord.history_action() {
            Some(action) => self.apply_history(action).map(Some),
            None => Ok(None),
        }
    }

    /// commit ごとの通知を受け取るリスナーを登録
    pub fn subscribe<F>(&self, listener: F) -> ListenerHandle
    where
        F: Fn(&DocumentChange) + Send + Sync + 'static,
    {
        self.listeners.register(listener)
    }

    fn commit(&self, origin: ChangeOrigin) -> Result<(), DocumentError> {
        self.doc.commit();
        if self.listeners.is_empty() {
            return Ok(());
        }
        let change = DocumentChange {
            origin,
            snapshot: self.snapshot()?,
            items: self.items(),
        };
        self.listeners.notify(&change);
        Ok(())
    }
}

impl Default for TodoDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TodoDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TodoDocument")
            .field("items", &self.len())
            .field("can_undo", &self.can_undo())
            .field("can_redo", &self.can_redo())
            .finish()
    }
}

/// todo を CRDT のプレーンな値（map）に変換
fn item_value(item: &TodoItem) -> LoroValue {
    let mut map: HashMap<String, LoroValue> = HashMap::new();
    map.insert("id".to_string(), LoroValue::from(item.id.as_str().to_string()));
    map.insert("text".to_string(), LoroValue::from(item.text.clone()));
    map.insert("completed".to_string(), LoroValue::from(item.completed));
    LoroValue::from(map)
}
