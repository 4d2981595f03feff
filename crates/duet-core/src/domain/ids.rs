//! Domain identifiers (strongly-typed IDs).
//!
//! # 不透明な文字列 ID + Phantom Type
//! Workspace / User / Todo の ID はバックエンドや他クライアントが採番することもあるため、
//! 中身は不透明な文字列として保持します。
//! 自分で採番する場合は `IdGenerator` が `{prefix}{ULID}` 形式の値を作ります。
//!
//! ## Phantom Type パターン
//! `Id<T>` で共通実装を提供しつつ、`T` はマーカー型としてだけ使います。
//! WorkspaceId と TodoId を取り違えるとコンパイルエラーになります。

use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;
use ulid::Ulid;

/// IdMarker は各 ID 型のマーカー trait
///
/// 採番時に使うプレフィックス（"ws_", "user_", "todo_"）を提供します。
pub trait IdMarker: Send + Sync + 'static {
    fn prefix() -> &'static str;
}

/// ジェネリック ID 型
///
/// serde では中身の文字列そのものとして読み書きします（永続化カラムと互換）。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Id<T: IdMarker> {
    value: String,
    #[serde(skip)]
    _marker: PhantomData<T>,
}

impl<T: IdMarker> Id<T> {
    /// 既存の値（バックエンドから来たものなど）をそのまま ID として扱う
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            _marker: PhantomData,
        }
    }

    /// ULID からプレフィックス付きの ID を作成
    pub fn from_ulid(ulid: Ulid) -> Self {
        Self::new(format!("{}{}", T::prefix(), ulid))
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }
}

impl<T: IdMarker> From<&str> for Id<T> {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl<T: IdMarker> From<String> for Id<T> {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl<T: IdMarker> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

// ========================================
// マーカー型の定義
// ========================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Workspace {}

impl IdMarker for Workspace {
    fn prefix() -> &'static str {
        "ws_"
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum User {}

impl IdMarker for User {
    fn prefix() -> &'static str {
        "user_"
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Todo {}

impl IdMarker for Todo {
    fn prefix() -> &'static str {
        "todo_"
    }
}

/// Identifier of a workspace record (the row that holds document + timer).
pub type WorkspaceId = Id<Workspace>;

/// Stable identity of a signed-in (possibly anonymous) user.
pub type UserId = Id<User>;

/// Identity of a single todo item inside the document.
pub type TodoId = Id<Todo>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ulid_ids_carry_their_prefix() {
        let ulid = Ulid::new();

        let ws = WorkspaceId::from_ulid(ulid);
        let todo = TodoId::from_ulid(ulid);

        assert_eq!(ws.to_string(), format!("ws_{ulid}"));
        assert_eq!(todo.to_string(), format!("todo_{ulid}"));

        // let _: WorkspaceId = todo; // <- does not compile
    }

    #[test]
    fn foreign_ids_are_kept_verbatim() {
        let id = WorkspaceId::new("8f0c6d1e-3b7a-4d8e-9c2f-1a2b3c4d5e6f");
        assert_eq!(id.as_str(), "8f0c6d1e-3b7a-4d8e-9c2f-1a2b3c4d5e6f");
    }

    #[test]
    fn ids_serialize_as_plain_strings() {
        let id = UserId::new("user_abc");

        let serialized = serde_json::to_string(&id).unwrap();
        assert_eq!(serialized, "\"user_abc\"");

        let deserialized: UserId = serde_json::from_str(&serialized).unwrap();
        assert_eq!(deserialized, id);
    }
}
