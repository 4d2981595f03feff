//! WorkspaceSession - 開いている 1 つの workspace
//!
//! todo ドキュメント（`DocumentSync`）とタイマー（`TimerHandle`）をまとめて持ちます。
//!
//! # 切り替えの順序
//! 1. 新しい行を読む（見つからなければ何も変えずにエラー）
//! 2. 古いタイマーループを止める（= 古い realtime チャンネルの購読解除）
//! 3. 新しいチャンネルを購読し、ドキュメントを一から作り直す

use std::sync::Arc;

use tracing::{info, warn};

use super::doc_sync::DocumentSync;
use super::loader::load_workspace;
use super::persister::Persister;
use super::session::SessionContext;
use super::timer_loop::TimerHandle;
use super::timer_sync::TimerSync;
use crate::config::DuetConfig;
use crate::domain::{WorkspaceId, WorkspaceRecord};
use crate::error::DuetError;
use crate::ports::{IdGenerator, RealtimeChannel, RealtimeFeed, WorkspaceStore};

/// WorkspaceSession が使う ports 一式
#[derive(Clone)]
pub(crate) struct SessionPorts {
    pub(crate) store: Arc<dyn WorkspaceStore>,
    pub(crate) feed: Arc<dyn RealtimeFeed>,
    pub(crate) ids: Arc<dyn IdGenerator>,
    pub(crate) persister: Persister,
    pub(crate) config: DuetConfig,
}

pub struct WorkspaceSession {
    ports: SessionPorts,
    session: SessionContext,
    name: String,
    documents: DocumentSync,
    timer: TimerHandle,
}

impl WorkspaceSession {
    /// 最初の workspace を決めて開く
    pub(crate) async fn open(
        ports: SessionPorts,
        session: SessionContext,
        current: Option<&WorkspaceId>,
    ) -> Result<Self, DuetError> {
        let record = Self::lookup(&ports, &session, current).await?;
        let (documents, timer) = Self::attach(&ports, &record).await;
        info!(workspace_id = %record.id, user_id = %session.user_id(), "workspace opened");
        Ok(Self {
            ports,
            session,
            name: record.name,
            documents,
            timer,
        })
    }

    async fn lookup(
        ports: &SessionPorts,
        session: &SessionContext,
        current: Option<&WorkspaceId>,
    ) -> Result<WorkspaceRecord, DuetError> {
        let lookup = load_workspace(
            ports.store.as_ref(),
            ports.ids.as_ref(),
            session,
            current,
            &ports.config.workspace_name,
        )
        .await;
        lookup.into_record().ok_or_else(|| match current {
            Some(id) => DuetError::WorkspaceNotFound(id.clone()),
            None => DuetError::NoWorkspace(session.user_id().clone()),
        })
    }

    async fn attach(
        ports: &SessionPorts,
        record: &WorkspaceRecord,
    ) -> (DocumentSync, TimerHandle) {
        let documents = DocumentSync::open(
            record,
            Arc::clone(&ports.ids),
            ports.persister.clone(),
            ports.config.undo_steps,
        );
        let timer = TimerSync::open(
            record,
            ports.persister.clone(),
            ports.config.timer_default_secs,
        );
        let channel = match ports.feed.subscribe(&record.id).await {
            Ok(channel) => channel,
            Err(err) => {
                // タイマーはローカルだけで動かす
                warn!(workspace_id = %record.id, error = %err, "realtime subscribe failed");
                RealtimeChannel::detached(record.id.clone())
            }
        };
        let timer = TimerHandle::spawn(timer, channel, ports.config.tick);
        (documents, timer)
    }

    /// 別の workspace に切り替える。見つからなければ今の workspace のまま
    pub async fn switch_to(&mut self, id: &WorkspaceId) -> Result<(), DuetError> {
        let record = Self::lookup(&self.ports, &self.session, Some(id)).await?;
        self.timer.stop().await;
        let (documents, timer) = Self::attach(&self.ports, &record).await;
        info!(
            from = %self.documents.workspace_id(),
            to = %record.id,
            "workspace switched"
        );
        self.documents = documents;
        self.timer = timer;
        self.name = record.name;
        Ok(())
    }

    /// 今の workspace を行から読み直す
    pub async fn reload(&mut self) -> Result<(), DuetError> {
        let id = self.workspace_id().clone();
        self.switch_to(&id).await
    }

    pub fn workspace_id(&self) -> &WorkspaceId {
        self.documents.workspace_id()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    /// 本人確認後などにセッションを差し替える（workspace はそのまま）
    pub fn set_session(&mut self, session: SessionContext) {
        self.session = session;
    }

    pub fn documents(&self) -> &DocumentSync {
        &self.documents
    }

    pub fn documents_mut(&mut self) -> &mut DocumentSync {
        &mut self.documents
    }

    pub fn timer(&self) -> &TimerHandle {
        &self.timer
    }

    /// 積まれている書き込みを待つ
    pub async fn flush(&self) {
        self.ports.persister.flush().await;
    }

    /// タイマーを止め、書き込みを流し切る
    pub async fn close(mut self) {
        self.timer.stop().await;
        self.ports.persister.flush().await;
    }
}
