#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use reqwest::StatusCode;
use serde_json::{Value, json};
use tokio::sync::oneshot;

use taskdeck::api::{ApiGateway, Method};
use taskdeck::error::ClientError;
use taskdeck::models::{Category, Identity, Priority, Task, TaskStatus, UserProfile};
use taskdeck::notify::NoticeBuffer;
use taskdeck::session::Session;
use taskdeck::AppContext;

#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
    pub query: Vec<(String, String)>,
}

impl Recorded {
    pub fn query(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

struct Gate {
    method: Method,
    path: String,
    release: oneshot::Receiver<()>,
    /// Answer from the state at arrival time instead of at release time.
    answer_first: bool,
}

#[derive(Default)]
pub struct ServerState {
    pub categories: Vec<Category>,
    pub tasks: Vec<Task>,
    pub users: Vec<(UserProfile, String)>,
    pub next_id: i64,
}

impl ServerState {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// In-memory stand-in for the REST API. Holds real state so a reload after a
/// failed mutation returns what the "server" actually has.
#[derive(Default)]
pub struct FakeApi {
    pub state: Mutex<ServerState>,
    calls: Mutex<Vec<Recorded>>,
    failures: Mutex<Vec<(Method, String, u16, String)>>,
    gates: Mutex<Vec<Gate>>,
    in_flight: AtomicUsize,
}

pub fn fixed_time() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 12, 20)
        .and_then(|d| d.and_hms_opt(9, 0, 0))
        .expect("valid fixed time")
}

impl FakeApi {
    pub fn new() -> Arc<Self> {
        let api = Self::default();
        api.state.lock().unwrap().next_id = 100;
        Arc::new(api)
    }

    pub fn with_category(&self, id: i64, name: &str) -> &Self {
        self.state.lock().unwrap().categories.push(Category {
            id,
            name: name.to_string(),
        });
        self
    }

    pub fn with_task(&self, id: i64, category_id: i64, title: &str) -> &Self {
        self.state.lock().unwrap().tasks.push(Task {
            id,
            category_id: Some(category_id),
            title: title.to_string(),
            description: None,
            priority: Priority::Medium,
            status: TaskStatus::Pending,
            deadline: Some(fixed_time() + chrono::Duration::days(3)),
            created_at: Some(fixed_time()),
            updated_at: Some(fixed_time()),
        });
        self
    }

    pub fn with_user(&self, id: i64, username: &str, email: &str, password: &str) -> &Self {
        self.state.lock().unwrap().users.push((
            UserProfile {
                id,
                username: username.to_string(),
                email: email.to_string(),
            },
            password.to_string(),
        ));
        self
    }

    /// The next call to exactly `method path` fails with `status`.
    pub fn fail_next(&self, method: Method, path: &str, status: u16, body: &str) {
        self.failures
            .lock()
            .unwrap()
            .push((method, path.to_string(), status, body.to_string()));
    }

    /// The next call to `method path` waits until the returned sender fires
    /// (or is dropped) before it is handled.
    pub fn hold_next(&self, method: Method, path: &str) -> oneshot::Sender<()> {
        self.gate(method, path, false)
    }

    /// Like [`FakeApi::hold_next`], but the response is built from the state
    /// the call saw on arrival, the way a slow network delivers stale data.
    pub fn delay_response(&self, method: Method, path: &str) -> oneshot::Sender<()> {
        self.gate(method, path, true)
    }

    fn gate(&self, method: Method, path: &str, answer_first: bool) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().unwrap().push(Gate {
            method,
            path: path.to_string(),
            release: rx,
            answer_first,
        });
        tx
    }

    pub fn calls(&self) -> Vec<Recorded> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, method: Method, path: &str) -> Vec<Recorded> {
        self.calls()
            .into_iter()
            .filter(|c| c.method == method && c.path == path)
            .collect()
    }

    pub fn category_names(&self) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .categories
            .iter()
            .map(|c| c.name.clone())
            .collect()
    }

    pub fn task_ids(&self) -> Vec<i64> {
        self.state.lock().unwrap().tasks.iter().map(|t| t.id).collect()
    }

    fn take_gate(&self, method: Method, path: &str) -> Option<Gate> {
        let mut gates = self.gates.lock().unwrap();
        let pos = gates
            .iter()
            .position(|g| g.method == method && g.path == path)?;
        Some(gates.remove(pos))
    }

    fn respond(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        query: &HashMap<String, String>,
    ) -> Result<Value, ClientError> {
        match self.take_failure(method, path) {
            Some(err) => Err(err),
            None => self.handle(method, path, body, query),
        }
    }

    fn take_failure(&self, method: Method, path: &str) -> Option<ClientError> {
        let mut failures = self.failures.lock().unwrap();
        let pos = failures
            .iter()
            .position(|(m, p, _, _)| *m == method && p == path)?;
        let (_, _, status, body) = failures.remove(pos);
        let status = StatusCode::from_u16(status).expect("valid status code");
        Some(ClientError::from_status(status, body))
    }

    fn handle(&self, method: Method, path: &str, body: Option<Value>, query: &HashMap<String, String>) -> Result<Value, ClientError> {
        let mut state = self.state.lock().unwrap();
        let segments: Vec<&str> = path.trim_start_matches('/').split('/').collect();

        match (method, segments.as_slice()) {
            (Method::Get, ["api", "categories"]) => Ok(serde_json::to_value(&state.categories)?),
            (Method::Post, ["api", "categories"]) => {
                let name = body_str(&body, "category");
                if state
                    .categories
                    .iter()
                    .any(|c| c.name.eq_ignore_ascii_case(&name))
                {
                    return Ok(json!({ "code": 409, "message": "Category already exists" }));
                }
                let id = state.next_id();
                state.categories.push(Category { id, name });
                Ok(json!({ "code": 201, "message": "Category created" }))
            }
            (Method::Put, ["api", "categories", id]) => {
                let id = parse_id(id)?;
                let name = body_str(&body, "category");
                let category = state
                    .categories
                    .iter_mut()
                    .find(|c| c.id == id)
                    .ok_or_else(not_found)?;
                category.name = name;
                Ok(serde_json::to_value(category.clone())?)
            }
            (Method::Delete, ["api", "categories", id]) => {
                let id = parse_id(id)?;
                let before = state.categories.len();
                state.categories.retain(|c| c.id != id);
                if state.categories.len() == before {
                    return Err(not_found());
                }
                Ok(Value::Null)
            }
            (Method::Get, ["api", "tasks"]) => {
                let category_id: i64 = query
                    .get("categoryId")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or_default();
                let tasks: Vec<&Task> = state
                    .tasks
                    .iter()
                    .filter(|t| t.category_id == Some(category_id))
                    .collect();
                Ok(serde_json::to_value(tasks)?)
            }
            (Method::Get, ["api", "tasks", "filterbydate"]) => {
                let start = query_date(query, "startDate");
                let end = query_date(query, "endDate");
                let tasks: Vec<&Task> = state
                    .tasks
                    .iter()
                    .filter(|t| {
                        t.deadline
                            .map(|d| d.date() >= start && d.date() <= end)
                            .unwrap_or(false)
                    })
                    .collect();
                Ok(serde_json::to_value(tasks)?)
            }
            (Method::Post, ["api", "tasks"]) => {
                let id = state.next_id();
                let task = task_from_body(id, body)?;
                state.tasks.push(task.clone());
                Ok(serde_json::to_value(task)?)
            }
            (Method::Put, ["api", "tasks", id]) => {
                let id = parse_id(id)?;
                let task = task_from_body(id, body)?;
                let slot = state
                    .tasks
                    .iter_mut()
                    .find(|t| t.id == id)
                    .ok_or_else(not_found)?;
                *slot = task.clone();
                Ok(serde_json::to_value(task)?)
            }
            (Method::Delete, ["api", "tasks", id]) => {
                let id = parse_id(id)?;
                let before = state.tasks.len();
                state.tasks.retain(|t| t.id != id);
                if state.tasks.len() == before {
                    return Err(not_found());
                }
                Ok(Value::Null)
            }
            (Method::Post, ["api", "users", "login"]) => {
                let username = body_str(&body, "username");
                let password = body_str(&body, "password");
                let ok = state
                    .users
                    .iter()
                    .any(|(u, p)| u.username == username && *p == password);
                if ok {
                    Ok(json!({ "status": "ok", "message": "Login success" }))
                } else {
                    Ok(json!({ "status": "error", "message": "Invalid username or password" }))
                }
            }
            (Method::Post, ["api", "users", "signup"]) => {
                let username = body_str(&body, "username");
                if state.users.iter().any(|(u, _)| u.username == username) {
                    return Ok(json!({
                        "status": "error",
                        "message": "Username already taken",
                        "errors": ["username"]
                    }));
                }
                let id = state.next_id();
                let email = body_str(&body, "email");
                let password = body_str(&body, "password");
                state.users.push((UserProfile { id, username, email }, password));
                Ok(json!({ "status": "ok", "message": "Account created", "errors": [] }))
            }
            (Method::Get, ["api", "users", "find"]) => {
                let param = query.get("param").cloned().unwrap_or_default();
                let user = state
                    .users
                    .iter()
                    .find(|(u, _)| u.username == param || u.email == param)
                    .map(|(u, _)| u.clone())
                    .ok_or_else(not_found)?;
                Ok(json!({ "content": user }))
            }
            (Method::Put, ["api", "users", "update"]) => {
                let email = query.get("email").cloned().unwrap_or_default();
                let (user, password) = state
                    .users
                    .iter_mut()
                    .find(|(u, _)| u.email == email)
                    .ok_or_else(not_found)?;
                if let Some(username) = body_opt(&body, "username") {
                    user.username = username;
                }
                if let Some(new_email) = body_opt(&body, "email") {
                    user.email = new_email;
                }
                if let Some(new_password) = body_opt(&body, "password") {
                    *password = new_password;
                }
                Ok(json!({ "content": user.clone() }))
            }
            _ => Err(not_found()),
        }
    }
}

#[async_trait]
impl ApiGateway for FakeApi {
    async fn call(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        query: &[(&str, String)],
    ) -> Result<Value, ClientError> {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        self.calls.lock().unwrap().push(Recorded {
            method,
            path: path.to_string(),
            body: body.clone(),
            query: query
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        });

        let query: HashMap<String, String> = query
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        let result = match self.take_gate(method, path) {
            Some(gate) if gate.answer_first => {
                let early = self.respond(method, path, body, &query);
                let _ = gate.release.await;
                early
            }
            Some(gate) => {
                let _ = gate.release.await;
                self.respond(method, path, body, &query)
            }
            None => self.respond(method, path, body, &query),
        };
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }

    fn is_pending(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }
}

fn not_found() -> ClientError {
    ClientError::from_status(StatusCode::NOT_FOUND, "not found".to_string())
}

fn parse_id(raw: &str) -> Result<i64, ClientError> {
    raw.parse()
        .map_err(|_| ClientError::from_status(StatusCode::BAD_REQUEST, "bad id".to_string()))
}

fn body_str(body: &Option<Value>, key: &str) -> String {
    body_opt(body, key).unwrap_or_default()
}

fn body_opt(body: &Option<Value>, key: &str) -> Option<String> {
    body.as_ref()
        .and_then(|b| b.get(key))
        .and_then(|v| v.as_str())
        .map(str::to_string)
}

fn query_date(query: &HashMap<String, String>, key: &str) -> NaiveDate {
    query
        .get(key)
        .and_then(|v| NaiveDate::parse_from_str(v, "%Y-%m-%d").ok())
        .unwrap_or_default()
}

fn task_from_body(id: i64, body: Option<Value>) -> Result<Task, ClientError> {
    let mut body = body.unwrap_or(Value::Null);
    body["id"] = json!(id);
    body["createdAt"] = json!("2024-12-20T09:00:00");
    body["updatedAt"] = json!("2024-12-20T09:00:00");
    Ok(serde_json::from_value(body)?)
}

pub struct Harness {
    pub api: Arc<FakeApi>,
    pub ctx: AppContext,
    pub notices: Arc<NoticeBuffer>,
}

/// Context wired to `api` with `identity` already signed in.
pub fn signed_in(api: Arc<FakeApi>, identity: Identity) -> Harness {
    let session = Arc::new(Session::in_memory());
    session.sign_in(identity).expect("sign in");
    harness_with(api, session)
}

pub fn signed_out(api: Arc<FakeApi>) -> Harness {
    harness_with(api, Arc::new(Session::in_memory()))
}

fn harness_with(api: Arc<FakeApi>, session: Arc<Session>) -> Harness {
    let notices = Arc::new(NoticeBuffer::new());
    let ctx = AppContext::new(api.clone(), session, notices.clone());
    Harness { api, ctx, notices }
}

pub fn alice() -> Identity {
    Identity {
        id: 7,
        username: "alice".to_string(),
    }
}
