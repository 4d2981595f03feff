//! Document - 協調編集ドキュメント（todo リスト）
//!
//! # 主要コンポーネント
//! - **TodoDocument**: `loro` ドキュメントのラッパー（add / toggle / undo / redo / snapshot）
//! - **listeners**: commit 通知の登録と解除
//! - **history**: undo/redo のトリガー（ボタン・キーボード）

pub mod history;
pub mod listeners;
pub mod todo_doc;

pub use self::history::{HistoryAction, KeyChord};
pub use self::listeners::{ChangeOrigin, DocumentChange, ListenerHandle};
pub use self::todo_doc::{DocumentError, MAX_UNDO_STEPS, TODOS_LIST, TodoDocument};
