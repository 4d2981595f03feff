//! DuetConfig - 実行時設定
//!
//! デフォルト値を環境変数で上書きします（`.env` の読み込みは CLI 側）。
//!
//! | 変数 | デフォルト |
//! |---|---|
//! | `DUET_WORKSPACE_NAME` | `My Workspace` |
//! | `DUET_TIMER_DEFAULT_SECS` | `1500` |
//! | `DUET_UNDO_STEPS` | `100` |
//! | `DUET_TICK_MS` | `1000` |

use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::document::MAX_UNDO_STEPS;
use crate::domain::DEFAULT_TIMER_SECS;

pub const DEFAULT_WORKSPACE_NAME: &str = "My Workspace";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{key} is not a valid number: {value:?}")]
    InvalidNumber { key: &'static str, value: String },

    #[error("{key} must be greater than zero")]
    Zero { key: &'static str },

    #[error("{key} must not be blank")]
    Blank { key: &'static str },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuetConfig {
    /// 初回ロード時に作る workspace の名前
    pub workspace_name: String,

    /// タイマーのカラムが null のときの長さ（秒）
    pub timer_default_secs: u32,

    /// undo 履歴の上限
    pub undo_steps: usize,

    /// タイマーの tick 間隔
    pub tick: Duration,
}

impl Default for DuetConfig {
    fn default() -> Self {
        Self {
            workspace_name: DEFAULT_WORKSPACE_NAME.to_string(),
            timer_default_secs: DEFAULT_TIMER_SECS,
            undo_steps: MAX_UNDO_STEPS,
            tick: Duration::from_secs(1),
        }
    }
}

impl DuetConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// `lookup` で値を引いて組み立てる（テストでは HashMap を渡す）
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(name) = lookup("DUET_WORKSPACE_NAME") {
            let name = name.trim();
            if name.is_empty() {
                return Err(ConfigError::Blank {
                    key: "DUET_WORKSPACE_NAME",
                });
            }
            config.workspace_name = name.to_string();
        }
        if let Some(secs) = parse::<u32, _>(&lookup, "DUET_TIMER_DEFAULT_SECS")? {
            config.timer_default_secs = secs;
        }
        if let Some(steps) = parse::<usize, _>(&lookup, "DUET_UNDO_STEPS")? {
            config.undo_steps = steps;
        }
        if let Some(ms) = parse::<u64, _>(&lookup, "DUET_TICK_MS")? {
            config.tick = Duration::from_millis(ms);
        }
        Ok(config)
    }
}

/// 未設定なら `None`、0 や数値でない値はエラー
fn parse<T, F>(lookup: &F, key: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr + PartialEq + Default,
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(key) else {
        return Ok(None);
    };
    let value: T = raw.trim().parse().map_err(|_| ConfigError::InvalidNumber {
        key,
        value: raw.clone(),
    })?;
    if value == T::default() {
        return Err(ConfigError::Zero { key });
    }
    Ok(Some(value))
}
