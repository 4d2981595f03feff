//! State - タイマーの状態

use serde::{Deserialize, Serialize};

/// TimerState はカウントダウンタイマーの状態
///
/// # 状態遷移
/// - stopped → running（start）
/// - running → stopped（pause / reset / remaining が 0 に到達）
/// - any → stopped（reset）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerState {
    #[default]
    Stopped,
    Running,
}

impl TimerState {
    pub fn from_running(running: bool) -> Self {
        if running {
            TimerState::Running
        } else {
            TimerState::Stopped
        }
    }

    pub fn is_running(self) -> bool {
        matches!(self, TimerState::Running)
    }
}
