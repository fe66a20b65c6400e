use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::Router;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use record_poster::config::{USER_ID, records_url};
use record_poster::{Client, Record, RecordPoster, RestErrorKind};
use serde::Serialize;
use tokio::net::TcpListener;

#[derive(Serialize)]
struct CreatedRecord<'a> {
    id: &'static str,
    #[serde(flatten)]
    record: &'a Record,
}

#[derive(Clone, Default)]
struct AppState {
    received: Arc<Mutex<Vec<(String, Option<String>, Bytes)>>>,
    redirect_hits: Arc<AtomicUsize>,
}

fn client() -> Client {
    Client::new().expect("http client should build")
}

#[tokio::test]
async fn e2e_created_record_is_echoed() {
    let server = TestServer::start().await;
    let poster = RecordPoster::with_client(client(), server.records_url(USER_ID));

    let mut out = Vec::new();
    let outcome = poster
        .run(&mut out)
        .await
        .expect("record should be created");

    assert_eq!(outcome.status, 201);
    assert!(!outcome.is_error);
    let report = String::from_utf8(out).expect("utf-8 report");
    let mut lines = report.lines();
    assert_eq!(lines.next(), Some("201"));
    assert_eq!(lines.next(), Some("false"));
    let echoed: Record = sonic_rs::from_str(lines.next().expect("body line"))
        .expect("echoed body should decode as a record");
    assert_eq!(echoed, Record::sample());
    assert_eq!(lines.next(), None);

    let received = server.state.received.lock().expect("state lock");
    assert_eq!(received.len(), 1);
    let (user_id, content_type, body) = &received[0];
    assert_eq!(user_id, USER_ID);
    assert_eq!(content_type.as_deref(), Some("application/json"));
    assert_eq!(
        body.as_ref(),
        sonic_rs::to_vec(&Record::sample())
            .expect("record should serialize")
            .as_slice()
    );
}

#[tokio::test]
async fn e2e_unknown_user_reports_not_found() {
    let server = TestServer::start().await;
    let poster = RecordPoster::with_client(client(), server.records_url("missing-user"));

    let mut out = Vec::new();
    poster
        .run(&mut out)
        .await
        .expect("404 is reported, not raised");
    assert_eq!(out, b"404\ntrue\n");
}

#[tokio::test]
async fn e2e_server_error_html_body_is_ignored() {
    let server = TestServer::start().await;
    let poster = RecordPoster::with_client(client(), server.records_url("explode"));

    let mut out = Vec::new();
    poster
        .run(&mut out)
        .await
        .expect("500 is reported, not raised");
    assert_eq!(out, b"500\ntrue\n");
}

#[tokio::test]
async fn e2e_connection_refused_fails_without_output() {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind probe listener");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);

    let poster = RecordPoster::with_client(
        client(),
        records_url(&format!("http://{addr}"), USER_ID),
    );

    let mut out = Vec::new();
    let err = poster
        .run(&mut out)
        .await
        .expect_err("closed port should refuse the connection");
    assert_eq!(err.kind(), RestErrorKind::Connect);
    assert!(out.is_empty());
}

#[tokio::test]
async fn e2e_redirect_is_reported_not_followed() {
    let server = TestServer::start().await;
    let poster = RecordPoster::with_client(client(), server.records_url("moved"));

    let mut out = Vec::new();
    poster
        .run(&mut out)
        .await
        .expect("303 is reported, not followed");
    assert_eq!(out, b"303\nfalse\n{\"location\":\"/elsewhere\"}\n");
    assert_eq!(server.state.redirect_hits.load(Ordering::SeqCst), 0);
    assert_eq!(server.state.received.lock().expect("state lock").len(), 1);
}

struct TestServer {
    base_url: String,
    state: AppState,
    task: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn start() -> Self {
        let state = AppState::default();
        let app = Router::new()
            .route("/api/v1/users/{user_id}/records", post(create_record))
            .route("/elsewhere", get(redirect_target))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test listener");
        let addr = listener.local_addr().expect("local addr");
        let base_url = format!("http://{}", addr);

        let task = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            base_url,
            state,
            task,
        }
    }

    fn records_url(&self, user_id: &str) -> String {
        records_url(&self.base_url, user_id)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn create_record(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    state
        .received
        .lock()
        .expect("state lock")
        .push((user_id.clone(), content_type, body.clone()));

    match user_id.as_str() {
        USER_ID => {
            let Ok(record) = sonic_rs::from_slice::<Record>(&body) else {
                return (StatusCode::BAD_REQUEST, "invalid record").into_response();
            };
            let created = CreatedRecord {
                id: "rec_1",
                record: &record,
            };
            let created = sonic_rs::to_string(&created).expect("created record to json");
            (StatusCode::CREATED, created).into_response()
        }
        "moved" => (
            StatusCode::SEE_OTHER,
            [(header::LOCATION, "/elsewhere")],
            r#"{"location":"/elsewhere"}"#,
        )
            .into_response(),
        "explode" => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "<html><body>boom</body></html>",
        )
            .into_response(),
        _ => (StatusCode::NOT_FOUND, "Not Found").into_response(),
    }
}

async fn redirect_target(State(state): State<AppState>) -> (StatusCode, &'static str) {
    state.redirect_hits.fetch_add(1, Ordering::SeqCst);
    (StatusCode::OK, r#"{"id":"elsewhere"}"#)
}
