//! In-process mock of the task backend: REST under `/api/v1` plus the
//! notification WebSocket. Every handler counts its hits.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    extract::{
        ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade},
        Path, Query, State,
    },
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::sync::broadcast;
use uuid::Uuid;

use taskboard::{ApiClient, Identity, Session, StaticIdentity};

pub const TOKEN: &str = "test-token";
pub const TIMESTAMP: &str = "2025-01-05T15:04:00Z";

#[derive(Debug, Clone)]
pub enum ServerCmd {
    /// Send a text frame on every open socket.
    Push(String),
    /// Close with a proper close frame.
    Close,
    /// Drop the connection without a close frame.
    Drop,
}

pub struct MockState {
    pub requests: AtomicUsize,
    pub project_gets: AtomicUsize,
    pub task_puts: AtomicUsize,
    pub user_creates: AtomicUsize,
    pub user_me: AtomicUsize,
    pub mark_reads: AtomicUsize,
    pub ws_connects: AtomicUsize,
    pub ws_open: AtomicUsize,
    pub ws_attempts: AtomicUsize,

    pub fail_user_create: AtomicBool,
    pub fail_task_update: AtomicBool,
    pub create_had_auth: AtomicBool,
    /// Never answer the WebSocket upgrade.
    pub stall_ws: AtomicBool,
    /// Answer the WebSocket upgrade with 503.
    pub refuse_ws: AtomicBool,

    pub last_task_body: Mutex<Option<Value>>,
    pub ws_token: Mutex<Option<String>>,
    pub tasks: Mutex<Vec<Value>>,
    pub notifications: Mutex<Vec<Value>>,
    pub ws_commands: broadcast::Sender<ServerCmd>,
    pub user_id: Uuid,
}

impl MockState {
    fn hit(&self) {
        self.requests.fetch_add(1, Ordering::SeqCst);
    }

    pub fn count(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

pub struct Backend {
    pub addr: SocketAddr,
    pub state: Arc<MockState>,
}

impl Backend {
    pub async fn start() -> Backend {
        let (ws_commands, _) = broadcast::channel(16);
        let state = Arc::new(MockState {
            requests: AtomicUsize::new(0),
            project_gets: AtomicUsize::new(0),
            task_puts: AtomicUsize::new(0),
            user_creates: AtomicUsize::new(0),
            user_me: AtomicUsize::new(0),
            mark_reads: AtomicUsize::new(0),
            ws_connects: AtomicUsize::new(0),
            ws_open: AtomicUsize::new(0),
            ws_attempts: AtomicUsize::new(0),
            fail_user_create: AtomicBool::new(false),
            fail_task_update: AtomicBool::new(false),
            create_had_auth: AtomicBool::new(false),
            stall_ws: AtomicBool::new(false),
            refuse_ws: AtomicBool::new(false),
            last_task_body: Mutex::new(None),
            ws_token: Mutex::new(None),
            tasks: Mutex::new(Vec::new()),
            notifications: Mutex::new(Vec::new()),
            ws_commands,
            user_id: Uuid::new_v4(),
        });

        let app = Router::new()
            .route("/api/v1/projects/:project_id", get(get_project))
            .route("/api/v1/projects/:project_id/tasks", post(create_task))
            .route(
                "/api/v1/projects/:project_id/tasks/:task_id",
                get(get_task).put(update_task),
            )
            .route("/api/v1/users/create", post(create_user))
            .route("/api/v1/users/me", get(current_user))
            .route("/api/v1/notifications", get(list_notifications))
            .route("/api/v1/notifications/:id/read", put(mark_read))
            .route("/api/v1/notifications/ws", get(ws_upgrade))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Backend { addr, state }
    }

    pub fn base(&self) -> String {
        format!("http://{}/api/v1", self.addr)
    }

    /// Client signed in with a static token.
    pub fn client(&self) -> ApiClient {
        ApiClient::with_base(&self.base(), signed_in_session()).unwrap()
    }

    pub fn requests(&self) -> usize {
        MockState::count(&self.state.requests)
    }

    pub fn send(&self, cmd: ServerCmd) {
        let _ = self.state.ws_commands.send(cmd);
    }
}

pub fn identity() -> Identity {
    Identity {
        uid: "uid-1".into(),
        display_name: Some("Ada Lovelace".into()),
        email: Some("ada@example.com".into()),
    }
}

pub fn signed_in_session() -> Session {
    Session::signed_in(identity(), Arc::new(StaticIdentity::new(TOKEN)))
}

/// Poll until `cond` holds; panics after two seconds.
pub async fn eventually(what: &str, cond: impl Fn() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while !cond() {
        if tokio::time::Instant::now() > deadline {
            panic!("timed out waiting for {what}");
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

pub fn notification_json(id: &str, status: &str) -> Value {
    json!({
        "id": id,
        "type": "task_assigned",
        "content": format!("notification {id}"),
        "status": status,
        "projectId": Uuid::nil(),
        "taskId": Uuid::from_bytes([7; 16]),
        "createdAt": TIMESTAMP,
    })
}

// ── Handlers ───────────────────────────────────────────────────

fn user_json(id: Uuid) -> Value {
    json!({
        "id": id,
        "firebaseUID": "uid-1",
        "name": "Ada Lovelace",
        "email": "ada@example.com",
    })
}

async fn get_project(
    State(st): State<Arc<MockState>>,
    Path(project_id): Path<Uuid>,
) -> Json<Value> {
    st.hit();
    st.project_gets.fetch_add(1, Ordering::SeqCst);
    let tasks = st.tasks.lock().unwrap().clone();
    let completed = tasks.iter().filter(|t| t["status"] == "completed").count();
    Json(json!({
        "id": project_id,
        "name": "Apollo",
        "key": "APO",
        "description": "Moonshot",
        "createdBy": user_json(st.user_id),
        "invitations": [],
        "projectMembers": [{
            "id": Uuid::from_u128(1),
            "userId": st.user_id,
            "name": "Ada Lovelace",
            "email": "ada@example.com",
            "role": "owner",
        }],
        "tasksCompleted": completed,
        "totalTasks": tasks.len(),
        "activeTasksAssignedToUserCount": 0,
        "tasks": tasks,
        "createdAt": TIMESTAMP,
        "updatedAt": TIMESTAMP,
    }))
}

async fn create_task(
    State(st): State<Arc<MockState>>,
    Path(project_id): Path<Uuid>,
    Json(body): Json<Value>,
) -> Response {
    st.hit();
    *st.last_task_body.lock().unwrap() = Some(body.clone());
    let mut tasks = st.tasks.lock().unwrap();
    let task = json!({
        "id": Uuid::new_v4(),
        "projectId": project_id,
        "taskNumber": tasks.len() + 1,
        "title": body["title"],
        "description": body.get("description").cloned().unwrap_or(Value::Null),
        "status": body["status"],
        "priority": body["priority"],
        "assignedTo": null,
        "dueDate": body["dueDate"],
        "createdAt": TIMESTAMP,
        "updatedAt": TIMESTAMP,
    });
    tasks.push(task.clone());
    (
        StatusCode::CREATED,
        Json(json!({ "message": "Task created", "task": task })),
    )
        .into_response()
}

async fn get_task(
    State(st): State<Arc<MockState>>,
    Path((_project_id, task_id)): Path<(Uuid, Uuid)>,
) -> Response {
    st.hit();
    let tasks = st.tasks.lock().unwrap();
    match tasks.iter().find(|t| t["id"] == json!(task_id)) {
        Some(task) => Json(task.clone()).into_response(),
        None => (StatusCode::NOT_FOUND, Json(json!({ "error": "not found" }))).into_response(),
    }
}

async fn update_task(
    State(st): State<Arc<MockState>>,
    Path((_project_id, task_id)): Path<(Uuid, Uuid)>,
    Json(body): Json<Value>,
) -> Response {
    st.hit();
    st.task_puts.fetch_add(1, Ordering::SeqCst);
    if st.fail_task_update.load(Ordering::SeqCst) {
        return (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response();
    }
    let mut tasks = st.tasks.lock().unwrap();
    let Some(task) = tasks.iter_mut().find(|t| t["id"] == json!(task_id)) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    for key in ["title", "status", "priority", "dueDate"] {
        task[key] = body[key].clone();
    }
    Json(json!({ "message": "Task updated", "task": task.clone() })).into_response()
}

async fn create_user(State(st): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    st.hit();
    st.user_creates.fetch_add(1, Ordering::SeqCst);
    st.create_had_auth
        .store(headers.contains_key("authorization"), Ordering::SeqCst);
    if st.fail_user_create.load(Ordering::SeqCst) {
        return (StatusCode::INTERNAL_SERVER_ERROR, "db down").into_response();
    }
    (StatusCode::CREATED, Json(user_json(st.user_id))).into_response()
}

async fn current_user(State(st): State<Arc<MockState>>) -> Json<Value> {
    st.hit();
    st.user_me.fetch_add(1, Ordering::SeqCst);
    Json(user_json(st.user_id))
}

async fn list_notifications(State(st): State<Arc<MockState>>) -> Json<Value> {
    st.hit();
    Json(Value::Array(st.notifications.lock().unwrap().clone()))
}

async fn mark_read(State(st): State<Arc<MockState>>, Path(_id): Path<String>) -> Json<Value> {
    st.hit();
    st.mark_reads.fetch_add(1, Ordering::SeqCst);
    Json(json!({}))
}

async fn ws_upgrade(
    State(st): State<Arc<MockState>>,
    Query(query): Query<HashMap<String, String>>,
    ws: WebSocketUpgrade,
) -> Response {
    st.hit();
    st.ws_attempts.fetch_add(1, Ordering::SeqCst);
    *st.ws_token.lock().unwrap() = query.get("token").cloned();
    if st.stall_ws.load(Ordering::SeqCst) {
        std::future::pending::<()>().await;
    }
    if st.refuse_ws.load(Ordering::SeqCst) {
        return StatusCode::SERVICE_UNAVAILABLE.into_response();
    }
    ws.on_upgrade(move |socket| ws_session(socket, st))
}

async fn ws_session(socket: WebSocket, st: Arc<MockState>) {
    let mut commands = st.ws_commands.subscribe();
    st.ws_connects.fetch_add(1, Ordering::SeqCst);
    st.ws_open.fetch_add(1, Ordering::SeqCst);

    let (mut sender, mut receiver) = socket.split();
    loop {
        tokio::select! {
            cmd = commands.recv() => match cmd {
                Ok(ServerCmd::Push(text)) => {
                    if sender.send(Message::Text(text)).await.is_err() {
                        break;
                    }
                }
                Ok(ServerCmd::Close) => {
                    let frame = CloseFrame { code: 1000, reason: "done".into() };
                    let _ = sender.send(Message::Close(Some(frame))).await;
                    break;
                }
                Ok(ServerCmd::Drop) | Err(_) => break,
            },
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }

    st.ws_open.fetch_sub(1, Ordering::SeqCst);
}
