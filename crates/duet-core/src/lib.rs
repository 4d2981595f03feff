//! duet-core
//!
//! Core building blocks for a shared todo list + countdown timer.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, todo, workspace, timer, state, events）
//! - **codec**: スナップショット ⇔ `\x` 付き hex テキスト
//! - **document**: `loro` 上の todo リスト、undo/redo、変更リスナー
//! - **ports**: 抽象化レイヤー（WorkspaceStore, RealtimeFeed, AuthService, Clock, IdGenerator）
//! - **impls**: 実装（InMemoryBackend, InMemoryAuth など開発用）
//! - **app**: アプリケーションロジック（builder, persister, doc_sync, timer_loop, workspace, session）
//! - **config / error / observability**: 設定、エラー型、書き込みの集計

pub mod app;
pub mod codec;
pub mod config;
pub mod document;
pub mod domain;
pub mod error;
pub mod impls;
pub mod observability;
pub mod ports;

pub use self::config::DuetConfig;
pub use self::error::DuetError;
