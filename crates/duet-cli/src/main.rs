//! duet - 2 つのクライアントで 1 つの workspace を共有するデモ
//!
//! 標準入力から 1 行ずつコマンドを読み、ローカル側のクライアントを操作します。
//! `peer` でもう一方のクライアントから見た状態を表示します。

use std::error::Error;
use std::sync::Arc;

use duet_core::DuetConfig;
use duet_core::app::{App, AppBuilder, AuthFlow, WorkspaceSession};
use duet_core::document::{HistoryAction, KeyChord};
use duet_core::domain::{TimerEdit, TimerFields, WorkspaceId, format_clock};
use duet_core::impls::{InMemoryAuth, InMemoryBackend};
use duet_core::ports::{IdGenerator, SystemClock, UlidGenerator};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const HELP: &str = "\
commands:
  add <text>          add a todo
  toggle <n>          toggle the n-th todo (1-based)
  undo | redo         history
  key <chord>         e.g. key ctrl+z, key cmd+shift+z, key ctrl+y
  list                show todos
  start | pause | reset
  duration <m> <s>    set timer length
  timer               show timer
  peer                show what the other client sees
  reload              re-read the workspace row
  switch <id>         open another workspace
  link <email>        request a one-time code
  code <code>         verify the code
  logout              sign out
  whoami              show the current user
  status              JSON summary
  help | quit";

struct Client {
    app: App,
    auth: Arc<InMemoryAuth>,
    workspace: WorkspaceSession,
}

async fn connect(
    backend: &Arc<InMemoryBackend>,
    config: &DuetConfig,
    current: Option<&WorkspaceId>,
) -> Result<Client, Box<dyn Error>> {
    let ids: Arc<dyn IdGenerator> = Arc::new(UlidGenerator::new(SystemClock));
    let auth = Arc::new(InMemoryAuth::new(Arc::clone(&ids)));
    let app = AppBuilder::new()
        .store(backend.clone())
        .feed(backend.clone())
        .auth(auth.clone())
        .ids(ids)
        .config(config.clone())
        .build()?;
    let session = app.sign_in().await?;
    let workspace = app.open_workspace(session, current).await?;
    Ok(Client {
        app,
        auth,
        workspace,
    })
}

fn print_todos(workspace: &WorkspaceSession) {
    let items = workspace.documents().items();
    if items.is_empty() {
        println!("(no todos)");
    }
    for (n, item) in items.iter().enumerate() {
        let mark = if item.completed { "x" } else { " " };
        println!("{:>3}. [{mark}] {}", n + 1, item.text);
    }
}

fn print_timer(fields: Option<TimerFields>) {
    match fields {
        Some(fields) => println!(
            "{} / {} {:>3.0}% ({})",
            format_clock(fields.remaining),
            format_clock(fields.duration),
            fields.progress() * 100.0,
            if fields.running { "running" } else { "stopped" }
        ),
        None => println!("(timer not running)"),
    }
}

fn history(workspace: &mut WorkspaceSession, action: HistoryAction) {
    match workspace.documents_mut().apply_history(action) {
        Ok(true) => print_todos(workspace),
        Ok(false) => println!("nothing to {action:?}"),
        Err(err) => warn!(error = %err, "history failed"),
    }
}

async fn handle(
    line: &str,
    local: &mut Client,
    peer: &mut Client,
    flow: &mut AuthFlow,
) -> bool {
    let (command, rest) = match line.split_once(' ') {
        Some((command, rest)) => (command, rest.trim()),
        None => (line, ""),
    };
    let workspace = &mut local.workspace;

    match command {
        "" => {}
        "help" => println!("{HELP}"),
        "quit" | "exit" => return false,
        "add" => match workspace.documents_mut().add_todo(rest) {
            Ok(Some(item)) => println!("added {}", item.id),
            Ok(None) => println!("nothing to add"),
            Err(err) => warn!(error = %err, "add failed"),
        },
        "toggle" => {
            let items = workspace.documents().items();
            let picked = rest
                .parse::<usize>()
                .ok()
                .and_then(|n| n.checked_sub(1))
                .and_then(|index| items.get(index));
            match picked {
                Some(item) => match workspace.documents_mut().toggle_todo(&item.id) {
                    Ok(_) => print_todos(workspace),
                    Err(err) => warn!(error = %err, "toggle failed"),
                },
                None => println!("no such todo: {rest}"),
            }
        }
        "undo" => history(workspace, HistoryAction::Undo),
        "redo" => history(workspace, HistoryAction::Redo),
        "key" => match KeyChord::parse(rest) {
            Some(chord) => match chord.history_action() {
                Some(action) => history(workspace, action),
                None => println!("{rest} is not bound"),
            },
            None => println!("cannot read chord: {rest}"),
        },
        "list" => print_todos(workspace),
        "start" => workspace.timer().start(),
        "pause" => workspace.timer().pause(),
        "reset" => workspace.timer().reset(),
        "duration" => {
            let current = workspace.timer().snapshot().await;
            let duration = current.map(|fields| fields.duration).unwrap_or_default();
            let mut edit = TimerEdit::from_duration(duration);
            let mut parts = rest.split_whitespace();
            edit.set_minutes_input(parts.next().unwrap_or("0"));
            edit.set_seconds_input(parts.next().unwrap_or("0"));
            workspace.timer().commit_edit(edit);
            print_timer(workspace.timer().snapshot().await);
        }
        "timer" => print_timer(workspace.timer().snapshot().await),
        "peer" => {
            if let Err(err) = peer.workspace.reload().await {
                warn!(error = %err, "peer reload failed");
            }
            println!("peer sees workspace {}", peer.workspace.workspace_id());
            print_todos(&peer.workspace);
            print_timer(peer.workspace.timer().snapshot().await);
        }
        "reload" => match workspace.reload().await {
            Ok(()) => print_todos(workspace),
            Err(err) => warn!(error = %err, "reload failed"),
        },
        "switch" => match workspace.switch_to(&WorkspaceId::new(rest)).await {
            Ok(()) => println!("now on {} ({})", workspace.workspace_id(), workspace.name()),
            Err(err) => println!("{err}"),
        },
        "link" => {
            flow.open();
            flow.set_email(rest);
            if !flow.can_send() {
                println!("usage: link <email>");
            } else if flow.send_code(local.app.auth()).await {
                // メールの代わりに表示する
                if let Some(code) = local.auth.issued_code(rest).await {
                    println!("code sent (demo code: {code})");
                }
            } else if let Some(message) = flow.error() {
                println!("{message}");
            }
        }
        "code" => {
            flow.set_code(rest);
            if !flow.can_verify() {
                println!("usage: code <code>");
                return true;
            }
            match flow.verify(local.app.auth()).await {
                Some(session) => {
                    println!("signed in as {}", session.email().unwrap_or("?"));
                    workspace.set_session(session);
                }
                None => println!("{}", flow.error().unwrap_or("Invalid code.")),
            }
        }
        "logout" => {
            if let Err(err) = flow.logout(local.app.auth()).await {
                warn!(error = %err, "sign out failed");
            }
            // 次のセッションは新しい匿名ユーザー
            match local.app.sign_in().await {
                Ok(session) => {
                    println!("signed out; now {}", session.user_id());
                    workspace.set_session(session);
                }
                Err(err) => warn!(error = %err, "anonymous sign-in failed"),
            }
        }
        "whoami" => {
            let session = workspace.session();
            let label = match session.email() {
                Some(email) => email,
                None if session.is_anonymous() => "(anonymous)",
                None => "",
            };
            println!("{} {label}", session.user_id());
        }
        "status" => {
            let status = serde_json::json!({
                "workspace_id": workspace.workspace_id().to_string(),
                "name": workspace.name(),
                "todos": workspace.documents().items(),
                "timer": workspace.timer().snapshot().await,
                "can_undo": workspace.documents().can_undo(),
                "can_redo": workspace.documents().can_redo(),
                "writes": local.app.persist_stats(),
            });
            println!("{status:#}");
        }
        other => println!("unknown command: {other} (try help)"),
    }
    true
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "duet_core=info,duet_cli=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = DuetConfig::from_env()?;
    let backend = Arc::new(InMemoryBackend::new());

    let mut local = connect(&backend, &config, None).await?;
    let shared = local.workspace.workspace_id().clone();
    let mut peer = connect(&backend, &config, Some(&shared)).await?;
    info!(workspace_id = %shared, "two clients connected");
    println!("workspace {shared} ({})", local.workspace.name());
    println!("{HELP}");

    let mut flow = AuthFlow::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if !handle(line.trim(), &mut local, &mut peer, &mut flow).await {
            break;
        }
    }

    local.workspace.close().await;
    peer.workspace.close().await;
    info!(writes = ?local.app.persist_stats(), "bye");
    Ok(())
}
