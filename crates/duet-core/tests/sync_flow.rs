//! Two clients sharing one workspace through the in-memory backend.

use std::sync::Arc;
use std::time::Duration;

use duet_core::app::{App, AppBuilder, AuthFlow, SessionContext, WorkspaceSession};
use duet_core::config::DuetConfig;
use duet_core::document::KeyChord;
use duet_core::domain::{TimerFields, WorkspaceId};
use duet_core::impls::{InMemoryAuth, InMemoryBackend};
use duet_core::ports::{IdGenerator, SystemClock, UlidGenerator, WorkspaceStore};
use tokio::time;

fn ids() -> Arc<dyn IdGenerator> {
    Arc::new(UlidGenerator::new(SystemClock))
}

fn client(backend: &Arc<InMemoryBackend>) -> (App, Arc<InMemoryAuth>) {
    let auth = Arc::new(InMemoryAuth::new(ids()));
    let app = AppBuilder::new()
        .store(backend.clone())
        .feed(backend.clone())
        .auth(auth.clone())
        .ids(ids())
        .config(DuetConfig::default())
        .build()
        .unwrap();
    (app, auth)
}

async fn open(app: &App, current: Option<&WorkspaceId>) -> WorkspaceSession {
    let session = app.sign_in().await.unwrap();
    app.open_workspace(session, current).await.unwrap()
}

fn texts(ws: &WorkspaceSession) -> Vec<String> {
    ws.documents().items().into_iter().map(|item| item.text).collect()
}

#[tokio::test]
async fn todos_reach_the_other_client_through_the_row() {
    let backend = Arc::new(InMemoryBackend::new());
    let (app_a, _) = client(&backend);
    let (app_b, _) = client(&backend);

    let mut a = open(&app_a, None).await;
    let shared = a.workspace_id().clone();
    let mut b = open(&app_b, Some(&shared)).await;

    a.documents_mut().add_todo("write tests").unwrap();
    let second = a.documents_mut().add_todo("ship it").unwrap().unwrap();
    a.documents_mut().toggle_todo(&second.id).unwrap();
    a.flush().await;

    b.reload().await.unwrap();
    assert_eq!(texts(&b), vec!["write tests", "ship it"]);
    assert!(b.documents().items()[1].completed);

    // B の undo は B のローカル編集だけが対象
    assert!(!b.documents_mut().undo().unwrap());

    a.documents_mut().apply_chord(&KeyChord::new("z").ctrl()).unwrap();
    a.flush().await;
    b.reload().await.unwrap();
    assert!(!b.documents().items()[1].completed);

    a.close().await;
    b.close().await;
}

#[tokio::test]
async fn timer_changes_are_pushed_to_the_other_client() {
    let backend = Arc::new(InMemoryBackend::new());
    let (app_a, _) = client(&backend);
    let (app_b, _) = client(&backend);

    let a = open(&app_a, None).await;
    let b = open(&app_b, Some(a.workspace_id())).await;

    a.timer().set_duration(10, 0);
    a.timer().start();
    a.timer().snapshot().await;
    a.flush().await;
    time::sleep(Duration::from_millis(20)).await;

    let fields = b.timer().snapshot().await.unwrap();
    assert_eq!(fields.duration, 600);
    assert!(fields.running);

    a.timer().pause();
    a.timer().snapshot().await;
    a.flush().await;
    time::sleep(Duration::from_millis(20)).await;

    let a_fields = a.timer().snapshot().await.unwrap();
    let b_fields = b.timer().snapshot().await.unwrap();
    assert!(!b_fields.running);
    assert_eq!(b_fields.remaining, a_fields.remaining);

    a.close().await;
    b.close().await;
}

#[tokio::test]
async fn second_load_reuses_the_created_workspace() {
    let backend = Arc::new(InMemoryBackend::new());
    let (app, _) = client(&backend);

    let first = open(&app, None).await;
    let id = first.workspace_id().clone();
    first.close().await;

    let second = open(&app, None).await;
    assert_eq!(second.workspace_id(), &id);
    assert_eq!(backend.len().await, 1);
    second.close().await;
}

#[tokio::test]
async fn failed_writes_are_counted_and_local_state_kept() {
    let backend = Arc::new(InMemoryBackend::new());
    let (app, _) = client(&backend);
    let mut ws = open(&app, None).await;

    backend.set_fail_writes(true).await;
    ws.documents_mut().add_todo("offline edit").unwrap();
    ws.timer().reset();
    ws.timer().snapshot().await;
    ws.flush().await;

    assert_eq!(texts(&ws), vec!["offline edit"]);
    assert_eq!(app.persist_stats().failed, 2);
    let row = backend.fetch(ws.workspace_id()).await.unwrap().into_record().unwrap();
    assert_eq!(row.data, "");
    ws.close().await;
}

#[tokio::test]
async fn verified_user_keeps_their_workspace() {
    let backend = Arc::new(InMemoryBackend::new());
    let (app, auth) = client(&backend);
    let mut ws = open(&app, None).await;
    let before = ws.workspace_id().clone();

    let mut flow = AuthFlow::new();
    flow.open();
    flow.set_email("a@example.com");
    assert!(flow.send_code(app.auth()).await);
    flow.set_code(auth.issued_code("a@example.com").await.unwrap());
    let verified: SessionContext = flow.verify(app.auth()).await.unwrap();
    ws.set_session(verified.clone());
    ws.close().await;

    let again = app.open_workspace(verified, None).await.unwrap();
    assert_eq!(again.workspace_id(), &before);
    assert_eq!(again.session().email(), Some("a@example.com"));
    again.close().await;
}

#[tokio::test]
async fn switching_workspaces_moves_the_timer_subscription() {
    let backend = Arc::new(InMemoryBackend::new());
    let (app_a, _) = client(&backend);
    let (app_b, _) = client(&backend);

    let a = open(&app_a, None).await;
    let mut b = open(&app_b, None).await;
    let b_own = b.workspace_id().clone();
    b.switch_to(a.workspace_id()).await.unwrap();
    assert_eq!(backend.subscriber_count(&b_own).await, 0);

    a.timer().set_duration(1, 30);
    a.timer().snapshot().await;
    a.flush().await;
    time::sleep(Duration::from_millis(20)).await;

    assert_eq!(
        b.timer().snapshot().await.unwrap(),
        TimerFields {
            duration: 90,
            remaining: 90,
            running: false
        }
    );
    a.close().await;
    b.close().await;
}
