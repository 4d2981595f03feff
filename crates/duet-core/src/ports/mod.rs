//! Ports - 抽象化レイヤー
//!
//! Hexagonal Architecture の「ポート」。
//! バックエンド（テーブル・realtime・認証）はすべて不透明な協調者として trait で隠蔽します。
//!
//! # 設計原則
//! - workspaces テーブルが source of truth（正本）
//! - realtime は行の UPDATE を新しい値ごと配信するだけ
//! - 認証は安定した UserId を渡すだけ

pub mod auth;
pub mod clock;
pub mod id_generator;
pub mod realtime;
pub mod workspace_store;

pub use self::auth::{AuthError, AuthService, UserIdentity};
pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::id_generator::{IdGenerator, UlidGenerator};
pub use self::realtime::{RealtimeChannel, RealtimeFeed};
pub use self::workspace_store::{StoreError, WorkspaceStore};
