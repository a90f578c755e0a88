use std::sync::Arc;

use admin_views::{FormVariant, RedirectForm, RefreshTarget, SessionsView, SubmitOutcome};
use async_trait::async_trait;
use axum::{
    body::Bytes,
    extract::State,
    http::{Method, StatusCode, Uri},
    Json, Router,
};
use client_core::{ClientOptions, ConsoleApi, HttpConsoleClient};
use serde_json::{json, Value};
use shared::{domain::SessionKey, protocol::CurrentUser};
use tokio::{net::TcpListener, sync::Mutex};

type Recorded = Arc<Mutex<Vec<(Method, String, Option<Value>)>>>;

async fn record(
    State(requests): State<Recorded>,
    method: Method,
    uri: Uri,
    body: Bytes,
) -> (StatusCode, Json<Value>) {
    let path = uri.path().to_string();
    requests
        .lock()
        .await
        .push((method.clone(), path.clone(), serde_json::from_slice(&body).ok()));

    match (method, path.as_str()) {
        (Method::GET, "/_api/v1/redirects") => (
            StatusCode::OK,
            Json(json!([{"rowKey": "101", "redirectTo": "https://live.example.com/101"}])),
        ),
        (Method::GET, "/data/sessions") => (
            StatusCode::OK,
            Json(json!([{"sessions": [
                {"id": "101", "title": "Keynote", "speakers": [{"name": "Ada"}], "startsAt": "2026-05-01T09:00:00"},
                {"id": "102", "title": "Workshop", "speakers": []}
            ]}])),
        ),
        (Method::GET, _) => (StatusCode::NOT_FOUND, Json(Value::Null)),
        _ => (StatusCode::OK, Json(Value::Null)),
    }
}

async fn spawn_backend() -> (String, Recorded) {
    let requests: Recorded = Arc::default();
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let app = Router::new().fallback(record).with_state(requests.clone());
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (format!("http://{addr}"), requests)
}

fn client(server_url: &str) -> Arc<dyn ConsoleApi> {
    let mut options = ClientOptions::new(server_url);
    options.access_token = Some("token".into());
    Arc::new(HttpConsoleClient::new(options).expect("client"))
}

#[derive(Default)]
struct CountingParent {
    refreshes: usize,
}

#[async_trait]
impl RefreshTarget for CountingParent {
    async fn refresh(&mut self) {
        self.refreshes += 1;
    }
}

#[tokio::test]
async fn add_redirect_posts_once_then_refreshes_and_closes() {
    let (server_url, requests) = spawn_backend().await;
    let mut form = RedirectForm::new(client(&server_url), FormVariant::Redirect, None);
    form.set_redirect_to("https://example.com/live");
    assert!(form.can_submit());

    let mut parent = CountingParent::default();
    assert_eq!(form.submit(&mut parent).await, SubmitOutcome::Saved);

    let recorded = requests.lock().await;
    assert_eq!(recorded.len(), 1);
    let (method, path, body) = &recorded[0];
    assert_eq!(*method, Method::POST);
    assert_eq!(path, "/_api/v1/redirect");
    assert_eq!(
        body.as_ref(),
        Some(&json!({"redirectTo": "https://example.com/live", "videoLink": ""}))
    );
    assert_eq!(parent.refreshes, 1);
    assert!(!form.is_open());
}

#[tokio::test]
async fn opening_unknown_session_switches_to_create_with_key() {
    let (server_url, requests) = spawn_backend().await;
    let mut form = RedirectForm::new(
        client(&server_url),
        FormVariant::SessionRedirect,
        Some(SessionKey::from("102")),
    );
    form.load().await;
    assert!(!form.is_edit_mode());
    assert!(!form.has_error());

    form.set_redirect_to("https://example.com/102");
    form.submit(&mut CountingParent::default()).await;

    let recorded = requests.lock().await;
    let post = recorded
        .iter()
        .find(|(method, _, _)| *method == Method::POST)
        .expect("post");
    assert_eq!(post.2.as_ref().and_then(|b| b.get("rowKey")), Some(&json!("102")));
}

#[tokio::test]
async fn sessions_view_bulk_delete_reloads_once() {
    let (server_url, requests) = spawn_backend().await;
    let admin = CurrentUser {
        login_name: Some("ops@example.com".into()),
        display_name: None,
        permissions: vec!["/Session/Administrator".into()],
    };
    let mut view = SessionsView::new(client(&server_url), Some(admin));
    view.reload().await;

    let rows = view.rows();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].redirect_to(), Some("https://live.example.com/101"));
    assert_eq!(rows[1].redirect_to(), None);

    view.selection_mut()
        .select_all([SessionKey::from("101"), SessionKey::from("102")]);
    view.delete_selected().await;

    let recorded = requests.lock().await;
    let deletes = recorded
        .iter()
        .filter(|(method, _, _)| *method == Method::DELETE)
        .count();
    let list_calls = recorded
        .iter()
        .filter(|(_, path, _)| path == "/_api/v1/redirects")
        .count();
    assert_eq!(deletes, 2);
    assert_eq!(list_calls, 2);
}
