//! Session - 誰として操作しているか + 本人確認フロー
//!
//! # 設計原則
//! - セッションは `SessionContext` として明示的に受け渡す（グローバルに引かない）
//! - 認証 UI の状態（Collapsed → Email → Code）は `AuthFlow` が持つ
//! - ユーザーに見せるエラーは短い固定文言だけ

use tracing::{info, warn};

use crate::domain::UserId;
use crate::ports::{AuthError, AuthService, UserIdentity};

/// 送信失敗時の表示文言
pub const SEND_FAILED_MESSAGE: &str = "Failed to send code.";

/// 検証失敗時の表示文言
pub const VERIFY_FAILED_MESSAGE: &str = "Invalid code.";

/// 現在のユーザー
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    identity: UserIdentity,
}

impl SessionContext {
    pub fn new(identity: UserIdentity) -> Self {
        Self { identity }
    }

    /// 既存セッションを再利用し、なければ匿名でサインイン
    pub async fn establish(auth: &dyn AuthService) -> Result<Self, AuthError> {
        let identity = match auth.current_session().await? {
            Some(identity) => identity,
            None => auth.sign_in_anonymously().await?,
        };
        info!(user_id = %identity.id, anonymous = identity.is_anonymous, "session established");
        Ok(Self::new(identity))
    }

    pub fn user_id(&self) -> &UserId {
        &self.identity.id
    }

    pub fn email(&self) -> Option<&str> {
        self.identity.email.as_deref()
    }

    pub fn is_anonymous(&self) -> bool {
        self.identity.is_anonymous
    }

    pub fn identity(&self) -> &UserIdentity {
        &self.identity
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthStep {
    /// 「ログイン」ボタンだけ
    #[default]
    Collapsed,
    /// メールアドレス入力
    Email,
    /// ワンタイムコード入力
    Code,
}

/// 本人確認フローの状態
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthFlow {
    step: AuthStep,
    email: String,
    code: String,
    sending: bool,
    error: Option<String>,
}

impl AuthFlow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(&self) -> AuthStep {
        self.step
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    /// リクエスト中（ボタンを無効化する）
    pub fn is_sending(&self) -> bool {
        self.sending
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Collapsed → Email
    pub fn open(&mut self) {
        if self.step == AuthStep::Collapsed {
            self.step = AuthStep::Email;
        }
    }

    pub fn set_email(&mut self, email: impl Into<String>) {
        self.email = email.into();
    }

    pub fn set_code(&mut self, code: impl Into<String>) {
        self.code = code.into();
    }

    pub fn can_send(&self) -> bool {
        !self.sending && !self.email.trim().is_empty()
    }

    pub fn can_verify(&self) -> bool {
        !self.sending && !self.code.trim().is_empty()
    }

    /// コードを送る。成功すると Code へ進む
    pub async fn send_code(&mut self, auth: &dyn AuthService) -> bool {
        self.sending = true;
        self.error = None;
        let result = auth.send_code(&self.email).await;
        self.sending = false;
        match result {
            Ok(()) => {
                self.step = AuthStep::Code;
                true
            }
            Err(err) => {
                warn!(error = %err, "sending one-time code failed");
                self.error = Some(SEND_FAILED_MESSAGE.to_string());
                false
            }
        }
    }

    /// コードを検証。成功すると新しい `SessionContext` を返し、フローは Collapsed に戻る
    pub async fn verify(&mut self, auth: &dyn AuthService) -> Option<SessionContext> {
        self.sending = true;
        self.error = None;
        let result = auth.verify_code(&self.email, &self.code).await;
        self.sending = false;
        match result {
            Ok(identity) => {
                *self = Self::default();
                Some(SessionContext::new(identity))
            }
            Err(err) => {
                warn!(error = %err, "verifying one-time code failed");
                self.error = Some(VERIFY_FAILED_MESSAGE.to_string());
                None
            }
        }
    }

    /// サインアウトしてフローを初期化。呼び出し側はセッションを破棄する
    pub async fn logout(&mut self, auth: &dyn AuthService) -> Result<(), AuthError> {
        *self = Self::default();
        auth.sign_out().await
    }
}
