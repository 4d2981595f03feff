//! App - アプリケーション層
//!
//! このモジュールは、ports を組み合わせてアプリケーションロジックを実装します。
//!
//! # 主要コンポーネント
//! - **AppBuilder**: アプリケーションの構築とワイヤリング
//! - **Persister**: workspace 行への fire-and-forget 書き込み
//! - **DocumentSync**: todo ドキュメント ⇔ `data` カラム
//! - **TimerSync / TimerHandle**: タイマー ⇔ タイマーカラム + realtime
//! - **WorkspaceSession**: 開いている workspace（切り替え・再読み込み）
//! - **SessionContext / AuthFlow**: 現在のユーザーと本人確認フロー

pub mod builder;
pub mod doc_sync;
pub mod loader;
pub mod persister;
pub mod session;
pub mod timer_loop;
pub mod timer_sync;
pub mod workspace;

// 主要な型を再エクスポート
pub use self::builder::{App, AppBuilder, BuildError};
pub use self::doc_sync::DocumentSync;
pub use self::loader::load_workspace;
pub use self::persister::Persister;
pub use self::session::{
    AuthFlow, AuthStep, SEND_FAILED_MESSAGE, SessionContext, VERIFY_FAILED_MESSAGE,
};
pub use self::timer_loop::TimerHandle;
pub use self::timer_sync::TimerSync;
pub use self::workspace::WorkspaceSession;
