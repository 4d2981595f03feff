//! AuthService port - セッションと本人確認
//!
//! 匿名ユーザーとして開始し、メールのワンタイムコード（送信 → 検証の 2 段階）で
//! 本人確認済みユーザーへ移行します。アダプタ側が必要とするのは安定した `UserId` だけです。

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::UserId;

/// 認証済み（匿名を含む）ユーザー
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub id: UserId,
    pub email: Option<String>,
    pub is_anonymous: bool,
}

impl UserIdentity {
    pub fn anonymous(id: UserId) -> Self {
        Self {
            id,
            email: None,
            is_anonymous: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("an email address is required")]
    MissingEmail,

    #[error("no code was requested for {0}")]
    NoPendingCode(String),

    #[error("the one-time code does not match")]
    InvalidCode,

    #[error("auth backend failed: {0}")]
    Backend(String),
}

#[async_trait]
pub trait AuthService: Send + Sync {
    /// 既存のセッション（なければ `None`）
    async fn current_session(&self) -> Result<Option<UserIdentity>, AuthError>;

    async fn sign_in_anonymously(&self) -> Result<UserIdentity, AuthError>;

    /// ワンタイムコードをメールで送る
    async fn send_code(&self, email: &str) -> Result<(), AuthError>;

    /// コードを検証し、現在のセッションを本人確認済みにする
    async fn verify_code(&self, email: &str, code: &str) -> Result<UserIdentity, AuthError>;

    async fn sign_out(&self) -> Result<(), AuthError>;
}
