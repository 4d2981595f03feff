//! Impls - 実装（開発用・テスト用）
//!
//! このモジュールには ports の実装を含めます。
//!
//! # 含まれる実装
//! - **InMemoryBackend**: workspaces テーブル + realtime フィード
//! - **InMemoryAuth**: 匿名サインインとワンタイムコード認証
//!
//! 本番用のホスト型バックエンドは同じ ports を実装する別クレートに置く想定です。

pub mod inmem_auth;
pub mod inmem_backend;

// 主要な型を再エクスポート
pub use self::inmem_auth::InMemoryAuth;
pub use self::inmem_backend::InMemoryBackend;
