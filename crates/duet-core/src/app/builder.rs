//! AppBuilder - アプリケーションの構築とワイヤリング
//!
//! # 学習ポイント
//! - Builder パターンの実装
//! - 起動時検証（Fail-fast 設計）: ports が揃っていなければ build() で止める
//! - 書き込みキュー（Persister）は App ごとに 1 つ

use std::sync::Arc;

use super::persister::Persister;
use super::session::SessionContext;
use super::workspace::{SessionPorts, WorkspaceSession};
use crate::config::DuetConfig;
use crate::domain::WorkspaceId;
use crate::error::DuetError;
use crate::observability::{PersistCounts, PersistStats};
use crate::ports::{AuthService, IdGenerator, RealtimeFeed, WorkspaceStore};

/// AppBuilder は ports を受け取って App を構築
///
/// # 使用例
/// ```ignore
/// let backend = Arc::new(InMemoryBackend::new());
/// let app = AppBuilder::new()
///     .store(backend.clone())
///     .feed(backend)
///     .auth(Arc::new(InMemoryAuth::new(ids.clone())))
///     .ids(ids)
///     .build()?;
/// ```
#[derive(Default)]
pub struct AppBuilder {
    store: Option<Arc<dyn WorkspaceStore>>,
    feed: Option<Arc<dyn RealtimeFeed>>,
    auth: Option<Arc<dyn AuthService>>,
    ids: Option<Arc<dyn IdGenerator>>,
    config: DuetConfig,
}

/// BuildError はアプリケーション構築時のエラー
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("Missing port: {0}. Provide it on the AppBuilder before build().")]
    MissingPort(&'static str),
}

impl AppBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store(mut self, store: Arc<dyn WorkspaceStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn feed(mut self, feed: Arc<dyn RealtimeFeed>) -> Self {
        self.feed = Some(feed);
        self
    }

    pub fn auth(mut self, auth: Arc<dyn AuthService>) -> Self {
        self.auth = Some(auth);
        self
    }

    pub fn ids(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = Some(ids);
        self
    }

    pub fn config(mut self, config: DuetConfig) -> Self {
        self.config = config;
        self
    }

    /// App を生成
    ///
    /// writer タスクを起動するので tokio ランタイム上で呼ぶこと。
    pub fn build(self) -> Result<App, BuildError> {
        let store = self.store.ok_or(BuildError::MissingPort("store"))?;
        let feed = self.feed.ok_or(BuildError::MissingPort("feed"))?;
        let auth = self.auth.ok_or(BuildError::MissingPort("auth"))?;
        let ids = self.ids.ok_or(BuildError::MissingPort("ids"))?;

        let stats = Arc::new(PersistStats::default());
        let persister = Persister::spawn(Arc::clone(&store), stats);
        Ok(App {
            ports: SessionPorts {
                store,
                feed,
                ids,
                persister,
                config: self.config,
            },
            auth,
        })
    }
}

/// App は 1 クライアント分のアプリケーション
pub struct App {
    ports: SessionPorts,
    auth: Arc<dyn AuthService>,
}

impl App {
    /// 既存セッションを再利用し、なければ匿名でサインイン
    pub async fn sign_in(&self) -> Result<SessionContext, DuetError> {
        Ok(SessionContext::establish(self.auth.as_ref()).await?)
    }

    /// workspace を開く（`current` が `None` なら最初の workspace、なければ作成）
    pub async fn open_workspace(
        &self,
        session: SessionContext,
        current: Option<&WorkspaceId>,
    ) -> Result<WorkspaceSession, DuetError> {
        WorkspaceSession::open(self.ports.clone(), session, current).await
    }

    pub fn auth(&self) -> &dyn AuthService {
        self.auth.as_ref()
    }

    pub fn config(&self) -> &DuetConfig {
        &self.ports.config
    }

    pub fn persist_stats(&self) -> PersistCounts {
        self.ports.persister.stats()
    }

    /// 積まれている書き込みを待つ
    pub async fn flush(&self) {
        self.ports.persister.flush().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::impls::{InMemoryAuth, InMemoryBackend};
    use crate::ports::{SystemClock, UlidGenerator};

    fn ids() -> Arc<dyn IdGenerator> {
        Arc::new(UlidGenerator::new(SystemClock))
    }

    #[tokio::test]
    async fn test_build_success() {
        let backend = Arc::new(InMemoryBackend::new());
        let app = AppBuilder::new()
            .store(backend.clone())
            .feed(backend)
            .auth(Arc::new(InMemoryAuth::new(ids())))
            .ids(ids())
            .build();
        assert!(app.is_ok());
    }

    #[tokio::test]
    async fn test_build_missing_port() {
        let backend = Arc::new(InMemoryBackend::new());
        let app = AppBuilder::new()
            .store(backend.clone())
            .auth(Arc::new(InMemoryAuth::new(ids())))
            .ids(ids())
            .build();
        assert!(matches!(app, Err(BuildError::MissingPort("feed"))));
    }

    #[tokio::test]
    async fn test_sign_in_then_open() {
        let backend = Arc::new(InMemoryBackend::new());
        let app = AppBuilder::new()
            .store(backend.clone())
            .feed(backend.clone())
            .auth(Arc::new(InMemoryAuth::new(ids())))
            .ids(ids())
            .build()
            .unwrap();

        let session = app.sign_in().await.unwrap();
        let ws = app.open_workspace(session, None).await.unwrap();
        assert_eq!(backend.len().await, 1);
        assert_eq!(app.persist_stats(), PersistCounts::default());
        ws.close().await;
    }
}
