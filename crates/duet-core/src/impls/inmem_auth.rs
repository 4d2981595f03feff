//! InMemoryAuth - 開発用の認証サービス
//!
//! # 挙動
//! - 匿名サインインで新しい UserId を採番
//! - ワンタイムコードはメモリ上に保持（デモ・テストでは `issued_code` で取り出す）
//! - 匿名セッションでコード検証に成功すると、同じ UserId のまま本人確認済みに昇格
//!   （workspace の所有者が変わらない）
//! - すでに登録済みのメールなら、そのアカウントに切り替わる

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use rand::Rng;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::ports::{AuthError, AuthService, IdGenerator, UserIdentity};

#[derive(Default)]
struct AuthState {
    current: Option<UserIdentity>,
    /// email → 発行済みコード
    pending: HashMap<String, String>,
    /// email → 本人確認済みアカウント
    accounts: HashMap<String, UserIdentity>,
    fail_send: bool,
}

pub struct InMemoryAuth {
    state: Mutex<AuthState>,
    ids: Arc<dyn IdGenerator>,
}

impl InMemoryAuth {
    pub fn new(ids: Arc<dyn IdGenerator>) -> Self {
        Self {
            state: Mutex::new(AuthState::default()),
            ids,
        }
    }

    /// 既存セッションを持った状態で開始（「前回のログインが残っている」ケース）
    pub async fn with_session(self, identity: UserIdentity) -> Self {
        {
            let mut state = self.state.lock().await;
            if let Some(email) = &identity.email {
                state.accounts.insert(email.clone(), identity.clone());
            }
            state.current = Some(identity);
        }
        self
    }

    /// 最後に発行されたコード（メールの代わり）
    pub async fn issued_code(&self, email: &str) -> Option<String> {
        self.state.lock().await.pending.get(email).cloned()
    }

    /// コード送信の失敗を注入（テスト用）
    pub async fn set_fail_send(&self, fail: bool) {
        self.state.lock().await.fail_send = fail;
    }
}

fn generate_code() -> String {
    format!("{:06}", rand::thread_rng().gen_range(0..1_000_000))
}

#[async_trait]
impl AuthService for InMemoryAuth {
    async fn current_session(&self) -> Result<Option<UserIdentity>, AuthError> {
        Ok(self.state.lock().await.current.clone())
    }

    async fn sign_in_anonymously(&self) -> Result<UserIdentity, AuthError> {
        let identity = UserIdentity::anonymous(self.ids.user_id());
        self.state.lock().await.current = Some(identity.clone());
        debug!(user_id = %identity.id, "signed in anonymously");
        Ok(identity)
    }

    async fn send_code(&self, email: &str) -> Result<(), AuthError> {
        let email = email.trim();
        if email.is_empty() {
            return Err(AuthError::MissingEmail);
        }
        let mut state = self.state.lock().await;
        if state.fail_send {
            return Err(AuthError::Backend("mail delivery failed".to_string()));
        }
        state.pending.insert(email.to_string(), generate_code());
        info!(email, "one-time code issued");
        Ok(())
    }

    async fn verify_code(&self, email: &str, code: &str) -> Result<UserIdentity, AuthError> {
        let email = email.trim();
        let mut state = self.state.lock().await;
        let expected = state
            .pending
            .get(email)
            .ok_or_else(|| AuthError::NoPendingCode(email.to_string()))?;
        if expected != code.trim() {
            return Err(AuthError::InvalidCode);
        }
        state.pending.remove(email);

        let identity = match state.accounts.get(email) {
            Some(existing) => existing.clone(),
            None => {
                let id = match &state.current {
                    Some(current) if current.is_anonymous => current.id.clone(),
                    _ => self.ids.user_id(),
                };
                UserIdentity {
                    id,
                    email: Some(email.to_string()),
                    is_anonymous: false,
                }
            }
        };
        state.accounts.insert(email.to_string(), identity.clone());
        state.current = Some(identity.clone());
        info!(user_id = %identity.id, "email verified");
        Ok(identity)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        self.state.lock().await.current = None;
        Ok(())
    }
}
