//! Two consoles sharing one store file, as two processes on one machine
//! would.
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use steward_application::ports::{Clock, Transport, TransportError};
use steward_application::{Console, SessionConfig};
use steward_domain::auth::encode_unsigned;
use steward_domain::{ApiRequest, ApiResponse, SessionEndReason, SessionEvent};
use steward_infrastructure::{FileKeyValueStore, SystemClock};
use tempfile::tempdir;
use tokio::sync::broadcast;

/// Backend that knows nothing.
struct NotFound;

#[async_trait]
impl Transport for NotFound {
    async fn execute(&self, _request: &ApiRequest) -> Result<ApiResponse, TransportError> {
        Ok(ApiResponse::new(404, Vec::new()))
    }
}

async fn console_over(path: &std::path::Path) -> (Console, tokio::task::JoinHandle<()>) {
    let store = FileKeyValueStore::open(path).await.unwrap();
    let watcher = store.spawn_watcher(Duration::from_millis(20));
    let console = Console::new(
        Arc::new(NotFound),
        Arc::new(store),
        Arc::new(SystemClock::new()),
        SessionConfig::default(),
    );
    console.start().await.unwrap();
    (console, watcher)
}

async fn wait_for<F: Fn(&SessionEvent) -> bool>(
    events: &mut broadcast::Receiver<SessionEvent>,
    wanted: F,
) -> SessionEvent {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let event = events.recv().await.unwrap();
            if wanted(&event) {
                return event;
            }
        }
    })
    .await
    .expect("event not observed")
}

#[tokio::test]
async fn login_and_logout_propagate_between_processes() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("store.json");
    let (first, first_watcher) = console_over(&path).await;
    let (second, second_watcher) = console_over(&path).await;
    let mut events = second.session().subscribe();

    let token = encode_unsigned("user@example.com", SystemClock::new().epoch_seconds() + 3600);
    first.login_with_token(&token).await.unwrap();

    let started = wait_for(&mut events, |e| matches!(e, SessionEvent::Started { .. })).await;
    assert_eq!(
        started,
        SessionEvent::Started {
            subject: "user@example.com".to_string()
        }
    );
    assert!(second.session().is_authenticated());

    assert!(first.logout().await);
    let ended = wait_for(&mut events, |e| matches!(e, SessionEvent::Ended { .. })).await;
    assert_eq!(
        ended,
        SessionEvent::Ended {
            reason: SessionEndReason::Explicit
        }
    );
    assert!(!second.session().is_authenticated());

    first.shutdown();
    second.shutdown();
    first_watcher.abort();
    second_watcher.abort();
}

#[tokio::test]
async fn restart_restores_the_stored_session() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("store.json");
    let token = encode_unsigned("admin@example.com", SystemClock::new().epoch_seconds() + 600);
    {
        let (console, watcher) = console_over(&path).await;
        console.login_with_token(&token).await.unwrap();
        console.shutdown();
        watcher.abort();
    }

    let (console, watcher) = console_over(&path).await;

    assert_eq!(
        console.session().state().subject(),
        Some("admin@example.com")
    );
    console.shutdown();
    watcher.abort();
}

#[tokio::test]
async fn expired_stored_token_is_discarded_on_start() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("store.json");
    let expired = encode_unsigned("user@example.com", SystemClock::new().epoch_seconds() - 10);
    std::fs::write(&path, format!("{{\"token\": \"{expired}\"}}\n")).unwrap();

    let (console, watcher) = console_over(&path).await;

    assert!(!console.session().is_authenticated());
    let contents = std::fs::read_to_string(&path).unwrap();
    assert!(!contents.contains("token"));
    console.shutdown();
    watcher.abort();
}
