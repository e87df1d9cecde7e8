//! Integration tests for the Daytona client against an in-process fake of the Daytona API.

use std::{
    collections::HashMap,
    net::SocketAddr,
    sync::{Arc, Mutex},
    time::Duration,
};

use axum::{
    extract::{Multipart, Path, Query, Request, State},
    http::{header::AUTHORIZATION, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use base64::{prelude::BASE64_STANDARD, Engine};
use nextbox_core::{
    config::{ProviderConfig, ProvisionPlan},
    management::{provision, WEB_APP_SOURCE},
    provider::{DaytonaProvider, ExecuteRequest, SandboxProvider},
    NextboxError,
};
use serde_json::{json, Value};

//--------------------------------------------------------------------------------------------------
// Fake Daytona API
//--------------------------------------------------------------------------------------------------

const API_KEY: &str = "test-key";

#[derive(Default)]
struct FakeDaytona {
    /// Remaining state lookups before a sandbox reports `started`.
    pending_polls: HashMap<String, u32>,
    failed: HashMap<String, bool>,
    public: HashMap<String, bool>,
    files: HashMap<(String, String), Vec<u8>>,
    commands: Vec<(String, Option<String>)>,
    sessions: Vec<String>,
    session_commands: Vec<(String, String, bool)>,
}

type Shared = Arc<Mutex<FakeDaytona>>;

async fn require_auth(req: Request, next: Next) -> Response {
    let expected = format!("Bearer {}", API_KEY);
    match req.headers().get(AUTHORIZATION) {
        Some(value) if value == expected.as_str() => next.run(req).await,
        _ => (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "message": "Unauthorized", "statusCode": 401 })),
        )
            .into_response(),
    }
}

async fn create_sandbox(State(state): State<Shared>, Json(body): Json<Value>) -> Json<Value> {
    let id = uuid::Uuid::new_v4().to_string();
    let dockerfile = body["buildInfo"]["dockerfileContent"]
        .as_str()
        .unwrap_or_default()
        .to_string();
    assert_eq!(body["cpu"], 2);
    assert_eq!(body["memory"], 4);
    assert_eq!(body["disk"], 8);
    assert_eq!(body["autoStopInterval"], 0);

    let mut state = state.lock().unwrap();
    state.pending_polls.insert(id.clone(), 2);
    state
        .failed
        .insert(id.clone(), dockerfile.contains("broken"));

    Json(json!({ "id": id, "state": "pending_build" }))
}

async fn get_sandbox(State(state): State<Shared>, Path(id): Path<String>) -> Response {
    let mut state = state.lock().unwrap();
    let failed = state.failed.get(&id).copied().unwrap_or(false);
    let Some(remaining) = state.pending_polls.get_mut(&id) else {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({ "message": format!("Sandbox {} not found", id) })),
        )
            .into_response();
    };

    if failed {
        return Json(json!({ "id": id, "state": "build_failed", "errorReason": "image not found" }))
            .into_response();
    }

    let sandbox_state = if *remaining == 0 {
        "started"
    } else {
        *remaining -= 1;
        "starting"
    };
    Json(json!({ "id": id, "state": sandbox_state, "public": false })).into_response()
}

async fn set_public(
    State(state): State<Shared>,
    Path((id, flag)): Path<(String, bool)>,
) -> StatusCode {
    state.lock().unwrap().public.insert(id, flag);
    StatusCode::OK
}

async fn execute(
    State(state): State<Shared>,
    Path(_id): Path<String>,
    Json(body): Json<Value>,
) -> Json<Value> {
    let wrapped = body["command"].as_str().unwrap_or_default();
    let encoded = wrapped
        .strip_prefix("sh -c \"echo '")
        .and_then(|rest| rest.strip_suffix("' | base64 -d | sh\""))
        .expect("command is base64-wrapped");
    let command = String::from_utf8(BASE64_STANDARD.decode(encoded).unwrap()).unwrap();
    let cwd = body["cwd"].as_str().map(str::to_string);

    state.lock().unwrap().commands.push((command, cwd));
    Json(json!({ "exitCode": 0, "result": "" }))
}

async fn upload(
    State(state): State<Shared>,
    Path(id): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    mut multipart: Multipart,
) -> StatusCode {
    let path = query.get("path").cloned().unwrap_or_default();
    while let Some(field) = multipart.next_field().await.unwrap() {
        if field.name() == Some("file") {
            let data = field.bytes().await.unwrap();
            state
                .lock()
                .unwrap()
                .files
                .insert((id.clone(), path.clone()), data.to_vec());
        }
    }
    StatusCode::OK
}

async fn download(
    State(state): State<Shared>,
    Path(id): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let path = query.get("path").cloned().unwrap_or_default();
    match state.lock().unwrap().files.get(&(id, path)) {
        Some(data) => data.clone().into_response(),
        None => (StatusCode::NOT_FOUND, Json(json!({ "message": "file not found" }))).into_response(),
    }
}

async fn create_session(
    State(state): State<Shared>,
    Path(_id): Path<String>,
    Json(body): Json<Value>,
) -> StatusCode {
    let session = body["sessionId"].as_str().unwrap_or_default().to_string();
    state.lock().unwrap().sessions.push(session);
    StatusCode::CREATED
}

async fn session_exec(
    State(state): State<Shared>,
    Path((_id, session)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> Json<Value> {
    let command = body["command"].as_str().unwrap_or_default().to_string();
    let run_async = body["runAsync"].as_bool().unwrap_or(false);
    state
        .lock()
        .unwrap()
        .session_commands
        .push((session, command, run_async));
    Json(json!({ "cmdId": "cmd-42" }))
}

async fn preview_url(Path((id, port)): Path<(String, u16)>) -> Json<Value> {
    Json(json!({ "url": format!("https:/{}-{}.proxy.test", port, id), "token": "preview-token" }))
}

async fn spawn_fake_daytona() -> (SocketAddr, Shared) {
    let state: Shared = Arc::default();
    let app = Router::new()
        .route("/sandbox", post(create_sandbox))
        .route("/sandbox/{id}", get(get_sandbox))
        .route("/sandbox/{id}/public/{flag}", post(set_public))
        .route("/sandbox/{id}/ports/{port}/preview-url", get(preview_url))
        .route("/toolbox/{id}/toolbox/process/execute", post(execute))
        .route("/toolbox/{id}/toolbox/process/session", post(create_session))
        .route(
            "/toolbox/{id}/toolbox/process/session/{session}/exec",
            post(session_exec),
        )
        .route("/toolbox/{id}/toolbox/files/upload", post(upload))
        .route("/toolbox/{id}/toolbox/files/download", get(download))
        .layer(middleware::from_fn(require_auth))
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (addr, state)
}

fn daytona(addr: SocketAddr, api_key: &str) -> DaytonaProvider {
    let config = ProviderConfig::new(api_key, &format!("http://{}", addr)).unwrap();
    DaytonaProvider::new(config)
        .unwrap()
        .with_state_poll_interval(Duration::from_millis(10))
}

fn fast_plan() -> ProvisionPlan {
    ProvisionPlan::builder()
        .start_timeout(Duration::from_secs(5))
        .readiness_timeout(Duration::from_secs(5))
        .readiness_poll_interval(Duration::from_millis(10))
        .build()
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

#[test_log::test(tokio::test)]
async fn test_provision_against_daytona_api() {
    let (addr, state) = spawn_fake_daytona().await;
    let provider = daytona(addr, API_KEY);
    let plan = fast_plan();

    let result = provision(&provider, &plan).await.unwrap();

    assert!(!result.sandbox_id.is_empty());
    assert_eq!(
        result.frontend_url,
        format!("https://3000-{}.proxy.test", result.sandbox_id)
    );

    let state = state.lock().unwrap();
    assert_eq!(state.public.get(&result.sandbox_id), Some(&true));
    assert_eq!(
        state.commands[0],
        ("mkdir -p /root/web_app".to_string(), Some("/root".to_string()))
    );
    assert!(state.commands[1].0.starts_with("yes \"\" | npx -y create-next-app@latest ."));
    assert_eq!(state.commands[2].0, "npx --yes shadcn@latest init -d");
    assert!(state.commands[3].0.starts_with("node -e"));
    assert_eq!(state.sessions, vec!["node-dev".to_string()]);
    assert_eq!(
        state.session_commands,
        vec![(
            "node-dev".to_string(),
            "cd /root/web_app && npm run dev".to_string(),
            true
        )]
    );
}

#[tokio::test]
async fn test_injected_page_reads_back_byte_for_byte() {
    let (addr, _state) = spawn_fake_daytona().await;
    let provider = daytona(addr, API_KEY);
    let plan = fast_plan();

    let result = provision(&provider, &plan).await.unwrap();
    let page = provider
        .download_file(&result.sandbox_id, &plan.page_file_path())
        .await
        .unwrap();

    assert_eq!(&page[..], WEB_APP_SOURCE.as_bytes());
}

#[tokio::test]
async fn test_invalid_key_surfaces_provider_message() {
    let (addr, state) = spawn_fake_daytona().await;
    let provider = daytona(addr, "wrong-key");

    let err = provision(&provider, &fast_plan()).await.unwrap_err();

    match err {
        NextboxError::ProviderResponse { status, message } => {
            assert_eq!(status, 401);
            assert_eq!(message, "Unauthorized");
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(state.lock().unwrap().pending_polls.is_empty());
}

#[tokio::test]
async fn test_failed_build_is_reported() {
    let (addr, _state) = spawn_fake_daytona().await;
    let provider = daytona(addr, API_KEY);
    let plan = ProvisionPlan::builder()
        .image("broken:latest")
        .start_timeout(Duration::from_secs(5))
        .build();

    let err = provision(&provider, &plan).await.unwrap_err();

    match err {
        NextboxError::SandboxStartFailed { state, reason, .. } => {
            assert_eq!(state, "build_failed");
            assert_eq!(reason, "image not found");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_execute_preserves_shell_syntax() {
    let (addr, state) = spawn_fake_daytona().await;
    let provider = daytona(addr, API_KEY);

    let command = "cat > /tmp/x << 'EOF'\n'quoted' \"double\" | $HOME\nEOF";
    let response = provider
        .execute_command("any", &ExecuteRequest::new(command).cwd("/tmp"))
        .await
        .unwrap();

    assert_eq!(response.exit_code, 0);
    assert_eq!(state.lock().unwrap().commands[0].0, command);
}

#[tokio::test]
async fn test_concurrent_provisions_get_distinct_ids() {
    let (addr, _state) = spawn_fake_daytona().await;
    let provider = Arc::new(daytona(addr, API_KEY));
    let plan = Arc::new(fast_plan());

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let provider = provider.clone();
            let plan = plan.clone();
            tokio::spawn(async move { provision(provider.as_ref(), &plan).await })
        })
        .collect();

    let mut ids = Vec::new();
    for handle in handles {
        ids.push(handle.await.unwrap().unwrap().sandbox_id);
    }
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 4);
}
