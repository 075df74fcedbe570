//! In-process mock of the FretesJá API plus a client harness over it.
//!
//! The mock binds an ephemeral localhost port and speaks the real wire
//! envelopes, tracking per-endpoint hit counts so tests can assert how
//! many times the client actually called each route. The server task is
//! aborted when the handle drops.

#![allow(dead_code)]

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use fretesja_client::api::client::ApiClient;
use fretesja_client::api::common::{ApiResponse, ErrorEnvelope, PaginatedResponse, Pagination};
use fretesja_client::auth::interceptor::AuthHttp;
use fretesja_client::auth::models::{
    AuthResponse, CurrentUser, LoginRequest, RefreshTokenRequest, UserRole,
};
use fretesja_client::auth::service::AuthService;
use fretesja_client::routing::Navigator;
use fretesja_client::session::{
    ACCESS_TOKEN_KEY, CURRENT_USER_KEY, MemoryStorage, REFRESH_TOKEN_KEY, SessionStorage,
    SessionStore,
};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

pub const TEST_EMAIL: &str = "ana@fretesja.com.br";
pub const TEST_PASSWORD: &str = "Forte123!";

/// Per-endpoint request counters.
#[derive(Default)]
pub struct Hits {
    pub login: AtomicUsize,
    pub refresh: AtomicUsize,
    pub logout: AtomicUsize,
    pub forgot: AtomicUsize,
    pub reset: AtomicUsize,
    pub fretes: AtomicUsize,
    pub always_401: AtomicUsize,
    pub upload: AtomicUsize,
}

pub struct MockState {
    pub hits: Hits,
    access: Mutex<String>,
    refresh: Mutex<String>,
    refresh_delay: Duration,
    rotations: AtomicUsize,
    pub logout_auth: Mutex<Option<String>>,
}

impl MockState {
    /// The access token the server currently accepts.
    pub fn current_access(&self) -> String {
        self.access.lock().unwrap().clone()
    }

    /// The refresh token the server currently accepts.
    pub fn current_refresh(&self) -> String {
        self.refresh.lock().unwrap().clone()
    }
}

/// Running mock API. Dropping it stops the server.
pub struct MockApi {
    pub addr: SocketAddr,
    pub state: Arc<MockState>,
    handle: JoinHandle<()>,
}

impl MockApi {
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn refresh_hits(&self) -> usize {
        self.state.hits.refresh.load(Ordering::SeqCst)
    }

    pub fn fretes_hits(&self) -> usize {
        self.state.hits.fretes.load(Ordering::SeqCst)
    }

    pub fn login_hits(&self) -> usize {
        self.state.hits.login.load(Ordering::SeqCst)
    }

    pub fn logout_hits(&self) -> usize {
        self.state.hits.logout.load(Ordering::SeqCst)
    }

    pub fn always_401_hits(&self) -> usize {
        self.state.hits.always_401.load(Ordering::SeqCst)
    }

    pub fn forgot_hits(&self) -> usize {
        self.state.hits.forgot.load(Ordering::SeqCst)
    }

    pub fn reset_hits(&self) -> usize {
        self.state.hits.reset.load(Ordering::SeqCst)
    }

    pub fn upload_hits(&self) -> usize {
        self.state.hits.upload.load(Ordering::SeqCst)
    }

    /// Bearer the revocation endpoint saw, if it was called.
    pub fn logout_bearer(&self) -> Option<String> {
        self.state.logout_auth.lock().unwrap().clone()
    }
}

impl Drop for MockApi {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Starts the mock API on an ephemeral port, accepting the given token
/// pair. The refresh endpoint holds its response for `refresh_delay`
/// before rotating, which is how concurrency tests keep an episode open.
pub async fn spawn_mock_api(
    valid_access: &str,
    valid_refresh: &str,
    refresh_delay: Duration,
) -> MockApi {
    // First caller wins; later calls are no-ops.
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let state = Arc::new(MockState {
        hits: Hits::default(),
        access: Mutex::new(valid_access.to_string()),
        refresh: Mutex::new(valid_refresh.to_string()),
        refresh_delay,
        rotations: AtomicUsize::new(0),
        logout_auth: Mutex::new(None),
    });

    let app = Router::new()
        .route("/auth/login", post(login))
        .route("/auth/refresh-token", post(refresh_token))
        .route("/auth/logout", post(logout))
        .route("/auth/forgot-password", post(forgot_password))
        .route("/auth/reset-password", post(reset_password))
        .route("/fretes", get(fretes))
        .route("/sempre-401", get(always_401))
        .route("/eco-auth", get(echo_auth))
        .route("/upload", post(upload))
        .with_state(state.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        // Accept loop runs until the handle is aborted.
        if let Err(err) = axum::serve(listener, app).await {
            eprintln!("mock api task error: {err:?}");
        }
    });

    MockApi {
        addr,
        state,
        handle,
    }
}

pub fn test_user() -> CurrentUser {
    CurrentUser {
        id: "u1".into(),
        email: TEST_EMAIL.into(),
        role: UserRole::Carrier,
        name: "Ana".into(),
    }
}

fn bearer(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::to_string)
}

fn authorized(state: &MockState, headers: &HeaderMap) -> bool {
    bearer(headers).is_some_and(|token| token == state.current_access())
}

fn expired() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(ErrorEnvelope::new("token_expired", "Token expirado")),
    )
        .into_response()
}

async fn login(
    State(state): State<Arc<MockState>>,
    Json(body): Json<LoginRequest>,
) -> Response {
    state.hits.login.fetch_add(1, Ordering::SeqCst);
    if body.email != TEST_EMAIL || body.password != TEST_PASSWORD {
        return (
            StatusCode::UNAUTHORIZED,
            Json(ErrorEnvelope::new(
                "invalid_credentials",
                "E-mail ou senha inválidos",
            )),
        )
            .into_response();
    }

    let auth = AuthResponse {
        access_token: state.current_access(),
        refresh_token: state.current_refresh(),
        expires_in: 900,
        user: test_user(),
    };
    (
        StatusCode::OK,
        Json(ApiResponse::success(auth, "Login realizado")),
    )
        .into_response()
}

async fn refresh_token(
    State(state): State<Arc<MockState>>,
    Json(body): Json<RefreshTokenRequest>,
) -> Response {
    state.hits.refresh.fetch_add(1, Ordering::SeqCst);
    tokio::time::sleep(state.refresh_delay).await;

    if body.refresh_token != state.current_refresh() {
        return (
            StatusCode::UNAUTHORIZED,
            Json(ErrorEnvelope::new("invalid_refresh_token", "Sessão expirada")),
        )
            .into_response();
    }

    let n = state.rotations.fetch_add(1, Ordering::SeqCst) + 2;
    let rotated = AuthResponse {
        access_token: format!("acc-{n}"),
        refresh_token: format!("ref-{n}"),
        expires_in: 900,
        user: test_user(),
    };
    *state.access.lock().unwrap() = rotated.access_token.clone();
    *state.refresh.lock().unwrap() = rotated.refresh_token.clone();

    (
        StatusCode::OK,
        Json(ApiResponse::success(rotated, "Token renovado")),
    )
        .into_response()
}

async fn logout(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    state.hits.logout.fetch_add(1, Ordering::SeqCst);
    *state.logout_auth.lock().unwrap() = bearer(&headers);
    (
        StatusCode::OK,
        Json(ApiResponse::success(serde_json::Value::Null, "Sessão encerrada")),
    )
        .into_response()
}

async fn forgot_password(State(state): State<Arc<MockState>>) -> Response {
    state.hits.forgot.fetch_add(1, Ordering::SeqCst);
    (
        StatusCode::OK,
        Json(ApiResponse::success(
            serde_json::Value::Null,
            "E-mail de recuperação enviado",
        )),
    )
        .into_response()
}

async fn reset_password(State(state): State<Arc<MockState>>) -> Response {
    state.hits.reset.fetch_add(1, Ordering::SeqCst);
    (
        StatusCode::OK,
        Json(ApiResponse::success(
            serde_json::Value::Null,
            "Senha redefinida",
        )),
    )
        .into_response()
}

async fn fretes(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    state.hits.fretes.fetch_add(1, Ordering::SeqCst);
    if !authorized(&state, &headers) {
        return expired();
    }

    let data = vec![
        serde_json::json!({"id": "f1", "origem": "Campinas", "destino": "Santos"}),
        serde_json::json!({"id": "f2", "origem": "Curitiba", "destino": "Itajaí"}),
    ];
    (
        StatusCode::OK,
        Json(PaginatedResponse::new(data, Pagination::new(1, 10, 2))),
    )
        .into_response()
}

async fn always_401(State(state): State<Arc<MockState>>) -> Response {
    state.hits.always_401.fetch_add(1, Ordering::SeqCst);
    expired()
}

async fn echo_auth(headers: HeaderMap) -> Response {
    let auth = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    (StatusCode::OK, Json(ApiResponse::ok(auth))).into_response()
}

async fn upload(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    state.hits.upload.fetch_add(1, Ordering::SeqCst);
    if !authorized(&state, &headers) {
        return expired();
    }
    (
        StatusCode::OK,
        Json(ApiResponse::success(
            serde_json::json!({"stored": true}),
            "Arquivo recebido",
        )),
    )
        .into_response()
}

/// Client wired against the mock, with the navigation stream observable.
pub struct Harness {
    pub api: ApiClient,
    pub auth: AuthService,
    pub session: SessionStore,
    pub navigation: mpsc::UnboundedReceiver<String>,
}

pub fn connect(mock: &MockApi, storage: impl SessionStorage + 'static) -> Harness {
    let session = SessionStore::open(storage);
    let (navigator, navigation) = Navigator::channel();
    let transport = AuthHttp::new(
        reqwest::Client::new(),
        mock.base_url(),
        session.clone(),
        navigator.clone(),
    );
    let api = ApiClient::new(transport);
    let auth = AuthService::new(api.clone(), session.clone(), navigator);
    Harness {
        api,
        auth,
        session,
        navigation,
    }
}

/// Memory storage pre-seeded with tokens and, when any is present, a user.
pub fn storage_with(access: Option<&str>, refresh: Option<&str>) -> MemoryStorage {
    let mut storage = MemoryStorage::new();
    if let Some(token) = access {
        storage.set(ACCESS_TOKEN_KEY, token).unwrap();
    }
    if let Some(token) = refresh {
        storage.set(REFRESH_TOKEN_KEY, token).unwrap();
    }
    if access.is_some() || refresh.is_some() {
        let user = serde_json::to_string(&test_user()).unwrap();
        storage.set(CURRENT_USER_KEY, &user).unwrap();
    }
    storage
}

/// Polls `predicate` until it holds or the deadline passes.
pub async fn wait_until(deadline: Duration, mut predicate: impl FnMut() -> bool) -> bool {
    let start = tokio::time::Instant::now();
    while start.elapsed() < deadline {
        if predicate() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    predicate()
}
