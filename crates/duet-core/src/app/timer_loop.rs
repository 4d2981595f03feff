//! TimerLoop - タイマーを所有する 1 本のタスク
//!
//! # 設計原則
//! - タイマーの状態は 1 つのタスクだけが触る（ロック不要）
//! - `select!` で 3 つの入力を待つ
//!   - tick 用の interval（動いている間だけ）
//!   - realtime チャンネル（リモートの上書き）
//!   - コマンド（start / pause / reset / 長さ変更 / スナップショット）
//! - 停止すると realtime チャンネルを drop する（= 購読解除）

use std::time::Duration;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, warn};

use super::timer_sync::TimerSync;
use crate::domain::{TimerEdit, TimerFields, WorkspaceId};
use crate::ports::RealtimeChannel;

enum TimerCommand {
    Start,
    Pause,
    Reset,
    SetDuration { minutes: u32, seconds: u32 },
    Edit(TimerEdit),
    Snapshot(oneshot::Sender<TimerFields>),
}

/// TimerLoop への送信口
///
/// - `shutdown()` でタスクを止めて終了を待つ
/// - drop しただけでもタスクは止まる
pub struct TimerHandle {
    workspace_id: WorkspaceId,
    commands: mpsc::UnboundedSender<TimerCommand>,
    shutdown_tx: watch::Sender<bool>,
    join: Option<JoinHandle<()>>,
}

impl TimerHandle {
    /// タスクを起動
    pub fn spawn(sync: TimerSync, channel: RealtimeChannel, tick: Duration) -> Self {
        let workspace_id = sync.workspace_id().clone();
        let (commands, command_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let join = tokio::spawn(timer_loop(sync, channel, tick, command_rx, shutdown_rx));

        Self {
            workspace_id,
            commands,
            shutdown_tx,
            join: Some(join),
        }
    }

    pub fn workspace_id(&self) -> &WorkspaceId {
        &self.workspace_id
    }

    pub fn start(&self) {
        self.send(TimerCommand::Start);
    }

    pub fn pause(&self) {
        self.send(TimerCommand::Pause);
    }

    pub fn reset(&self) {
        self.send(TimerCommand::Reset);
    }

    pub fn set_duration(&self, minutes: u32, seconds: u32) {
        self.send(TimerCommand::SetDuration { minutes, seconds });
    }

    pub fn commit_edit(&self, edit: TimerEdit) {
        self.send(TimerCommand::Edit(edit));
    }

    /// 現在の値。タスクが止まっていたら `None`
    pub async fn snapshot(&self) -> Option<TimerFields> {
        let (tx, rx) = oneshot::channel();
        self.commands.send(TimerCommand::Snapshot(tx)).ok()?;
        rx.await.ok()
    }

    /// 停止して終了を待つ（2 回目以降は何もしない）
    pub async fn stop(&mut self) {
        // ignore send error: the loop may already be gone
        let _ = self.shutdown_tx.send(true);
        let Some(join) = self.join.take() else {
            return;
        };
        if let Err(err) = join.await {
            warn!(workspace_id = %self.workspace_id, error = %err, "timer loop ended abnormally");
        }
    }

    pub async fn shutdown(mut self) {
        self.stop().await;
    }

    fn send(&self, command: TimerCommand) {
        if self.commands.send(command).is_err() {
            warn!(workspace_id = %self.workspace_id, "timer loop is not running");
        }
    }
}

async fn timer_loop(
    mut sync: TimerSync,
    mut channel: RealtimeChannel,
    tick: Duration,
    mut commands: mpsc::UnboundedReceiver<TimerCommand>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let mut interval = time::interval_at(Instant::now() + tick, tick);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut channel_open = true;

    debug!(workspace_id = %sync.workspace_id(), "timer loop started");
    loop {
        let was_running = sync.is_running();

        tokio::select! {
            changed = shutdown_rx.changed() => {
                // sender が drop された場合も停止
                if changed.is_err() || *shutdown_rx.borrow() {
                    break;
                }
            }
            command = commands.recv() => {
                let Some(command) = command else {
                    break;
                };
                match command {
                    TimerCommand::Start => {
                        sync.start();
                    }
                    TimerCommand::Pause => {
                        sync.pause();
                    }
                    TimerCommand::Reset => sync.reset(),
                    TimerCommand::SetDuration { minutes, seconds } => {
                        sync.set_duration(minutes, seconds)
                    }
                    TimerCommand::Edit(edit) => sync.commit_edit(&edit),
                    TimerCommand::Snapshot(reply) => {
                        let _ = reply.send(sync.fields());
                    }
                }
            }
            event = channel.recv(), if channel_open => match event {
                Some(event) => {
                    sync.apply_remote(&event);
                }
                None => {
                    debug!(workspace_id = %sync.workspace_id(), "realtime channel closed");
                    channel_open = false;
                }
            },
            _ = interval.tick(), if sync.is_running() => {
                sync.tick();
            }
        }

        // 止まっていた → 動き出した: 次の tick はちょうど 1 周期後
        if !was_running && sync.is_running() {
            interval.reset();
        }
    }

    channel.unsubscribe();
    debug!(workspace_id = %sync.workspace_id(), "timer loop stopped");
}
