// In-process mock of the storefront backend plus a ready-wired client for each test.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Multipart, Path, Query, Request, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};

use storefront_client::frameworks::config::{Config, FileConfig};
use storefront_client::interface_adapters::navigator::RecordingNavigator;
use storefront_client::interface_adapters::storage::InMemoryTokenStorage;
use storefront_client::{AppState, build_state_with_storage};

pub const VALID_TOKEN: &str = "abc123";
pub const LOGIN_EMAIL: &str = "a@b.com";
pub const LOGIN_PASSWORD: &str = "x";
pub const SLOW_LOGIN_EMAIL: &str = "slow@b.com";
pub const SLOW_TOKEN: &str = "t1";
pub const FAST_LOGIN_EMAIL: &str = "fast@b.com";
pub const FAST_TOKEN: &str = "t2";
pub const SLOW_LOGIN_DELAY: Duration = Duration::from_millis(300);

// What the mock saw for one request.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub path: String,
    pub authorization: Option<String>,
    pub content_type: Option<String>,
    pub idempotency_key: Option<String>,
}

#[derive(Default)]
struct MockState {
    requests: Mutex<Vec<Recorded>>,
    orders_by_key: Mutex<HashMap<String, String>>,
    payment_polls: Mutex<HashMap<String, u32>>,
    uploads: Mutex<Vec<Value>>,
}

pub struct MockBackend {
    pub base_url: String,
    state: Arc<MockState>,
}

impl MockBackend {
    pub fn requests(&self) -> Vec<Recorded> {
        self.state.requests.lock().expect("requests mutex poisoned").clone()
    }

    pub fn requests_to(&self, path: &str) -> Vec<Recorded> {
        self.requests()
            .into_iter()
            .filter(|request| request.path == path)
            .collect()
    }

    pub fn uploads(&self) -> Vec<Value> {
        self.state.uploads.lock().expect("uploads mutex poisoned").clone()
    }
}

// Bind the mock to an ephemeral port and serve it for the rest of the test.
pub async fn spawn_backend() -> MockBackend {
    let state = Arc::new(MockState::default());
    let app = Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/auth/register", post(register))
        .route("/api/auth/profile", get(profile))
        .route("/api/products", get(list_products))
        .route("/api/products/{id}", get(product))
        .route("/api/cart", get(cart))
        .route("/api/orders", post(create_order))
        .route("/api/payments/initiate", post(initiate_payment))
        .route("/api/payments/{order_id}", get(payment_status))
        .route("/api/custom-files/upload", post(upload))
        .route(
            "/api/echo",
            get(echo_empty)
                .put(echo_body)
                .patch(echo_body)
                .delete(echo_empty),
        )
        .route("/api/broken", get(broken))
        .route("/api/teapot", get(teapot))
        .route("/api/explode", get(explode))
        .route("/api/empty", get(empty))
        .layer(middleware::from_fn_with_state(state.clone(), record))
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral test port");
    let addr = listener.local_addr().expect("get local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("mock backend failed");
    });

    MockBackend {
        base_url: format!("http://{addr}/api"),
        state,
    }
}

// A base URL where nothing is listening.
pub async fn unreachable_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral test port");
    let addr = listener.local_addr().expect("get local addr");
    drop(listener);
    format!("http://{addr}/api")
}

pub struct TestClient {
    pub state: AppState,
    pub navigator: Arc<RecordingNavigator>,
}

// Client wired like the CLI, but with in-memory storage and a recording navigator.
pub fn client(base_url: &str) -> TestClient {
    let config = Config::from_sources(FileConfig::default(), |key| match key {
        "STOREFRONT_API_URL" => Some(base_url.to_string()),
        _ => None,
    })
    .expect("expected test config");
    let navigator = Arc::new(RecordingNavigator::new());
    let state = build_state_with_storage(
        &config,
        Arc::new(InMemoryTokenStorage::new()),
        navigator.clone(),
    )
    .expect("expected client to build");

    TestClient { state, navigator }
}

async fn record(State(state): State<Arc<MockState>>, request: Request, next: Next) -> Response {
    // Built in its own scope: the borrow of the request must end before the await.
    let recorded = {
        let header_value = |name: &str| {
            request
                .headers()
                .get(name)
                .and_then(|value| value.to_str().ok())
                .map(str::to_string)
        };
        Recorded {
            method: request.method().to_string(),
            path: request.uri().path().trim_start_matches("/api").to_string(),
            authorization: header_value(header::AUTHORIZATION.as_str()),
            content_type: header_value(header::CONTENT_TYPE.as_str()),
            idempotency_key: header_value("idempotency-key"),
        }
    };
    state
        .requests
        .lock()
        .expect("requests mutex poisoned")
        .push(recorded);

    next.run(request).await
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "message": message }))).into_response()
}

fn is_authorized(headers: &HeaderMap) -> bool {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        == Some(format!("Bearer {VALID_TOKEN}").as_str())
}

fn user() -> Value {
    json!({ "_id": "u-1", "email": LOGIN_EMAIL, "name": "Ada", "role": "customer" })
}

// SLOW_LOGIN_EMAIL answers late with SLOW_TOKEN and FAST_LOGIN_EMAIL answers at once with
// FAST_TOKEN, so tests can tell which of two overlapping sign-ins wrote last.
async fn login(Json(body): Json<Value>) -> Response {
    if body["password"] != LOGIN_PASSWORD {
        return error(StatusCode::UNAUTHORIZED, "Invalid email or password");
    }
    let token = match body["email"].as_str() {
        Some(LOGIN_EMAIL) => VALID_TOKEN,
        Some(SLOW_LOGIN_EMAIL) => {
            tokio::time::sleep(SLOW_LOGIN_DELAY).await;
            SLOW_TOKEN
        }
        Some(FAST_LOGIN_EMAIL) => FAST_TOKEN,
        _ => return error(StatusCode::UNAUTHORIZED, "Invalid email or password"),
    };
    Json(json!({ "token": token, "user": user() })).into_response()
}

async fn register(Json(body): Json<Value>) -> Response {
    if body["email"] == "taken@b.com" {
        return error(StatusCode::CONFLICT, "Email already registered");
    }
    (
        StatusCode::CREATED,
        Json(json!({ "token": VALID_TOKEN, "user": user() })),
    )
        .into_response()
}

async fn profile(headers: HeaderMap) -> Response {
    if !is_authorized(&headers) {
        return error(StatusCode::UNAUTHORIZED, "Not authorized, token failed");
    }
    Json(user()).into_response()
}

async fn list_products(Query(query): Query<HashMap<String, String>>) -> Response {
    let products = vec![
        json!({ "_id": "p-1", "name": "Vase", "price": 12.5, "category": "home" }),
        json!({ "_id": "p-2", "name": "Gear", "price": 3.0, "category": "parts" }),
        json!({ "_id": "p-3", "name": "Lamp", "price": 30.0, "category": "home" }),
    ];
    let filtered: Vec<Value> = match query.get("category") {
        Some(category) => products
            .into_iter()
            .filter(|product| product["category"] == category.as_str())
            .collect(),
        None => products,
    };
    Json(json!({ "products": filtered })).into_response()
}

async fn product(Path(id): Path<String>) -> Response {
    if id == "p-1" {
        return Json(json!({ "_id": "p-1", "name": "Vase", "price": 12.5 })).into_response();
    }
    error(StatusCode::NOT_FOUND, "Product not found")
}

async fn cart(headers: HeaderMap) -> Response {
    if !is_authorized(&headers) {
        return error(StatusCode::UNAUTHORIZED, "Not authorized, no token");
    }
    Json(json!({
        "items": [{ "productId": "p-1", "name": "Vase", "price": 12.5, "quantity": 2 }],
        "subtotal": 25.0,
        "shipping": 5.0,
        "total": 30.0
    }))
    .into_response()
}

// Honors idempotency: the same key always maps to the same order.
async fn create_order(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !is_authorized(&headers) {
        return error(StatusCode::UNAUTHORIZED, "Not authorized, no token");
    }
    let Some(key) = headers
        .get("idempotency-key")
        .and_then(|value| value.to_str().ok())
    else {
        return error(StatusCode::BAD_REQUEST, "Idempotency-Key header is required");
    };
    if body["shippingAddress"]["fullName"].is_null() {
        return error(StatusCode::BAD_REQUEST, "Shipping address is required");
    }

    let mut orders = state.orders_by_key.lock().expect("orders mutex poisoned");
    let next_id = format!("order-{}", orders.len() + 1);
    let order_id = orders.entry(key.to_string()).or_insert(next_id).clone();
    (
        StatusCode::CREATED,
        Json(json!({ "orderId": order_id, "status": "pending", "total": 30.0 })),
    )
        .into_response()
}

async fn initiate_payment(headers: HeaderMap, Json(body): Json<Value>) -> Response {
    if !is_authorized(&headers) {
        return error(StatusCode::UNAUTHORIZED, "Not authorized, no token");
    }
    let Some(order_id) = body["orderId"].as_str() else {
        return error(StatusCode::BAD_REQUEST, "orderId is required");
    };
    Json(json!({ "paymentUrl": format!("https://pay.example/checkout/{order_id}") }))
        .into_response()
}

// First poll is pending, later polls are completed; "order-failed" always fails.
async fn payment_status(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Path(order_id): Path<String>,
) -> Response {
    if !is_authorized(&headers) {
        return error(StatusCode::UNAUTHORIZED, "Not authorized, no token");
    }
    if order_id == "order-failed" {
        return Json(json!({ "orderId": order_id, "status": "failed" })).into_response();
    }
    let mut polls = state.payment_polls.lock().expect("polls mutex poisoned");
    let count = polls.entry(order_id.clone()).or_insert(0);
    *count += 1;
    let status = if *count == 1 { "pending" } else { "completed" };
    Json(json!({ "orderId": order_id, "status": status })).into_response()
}

async fn upload(State(state): State<Arc<MockState>>, mut multipart: Multipart) -> Response {
    let mut fields = serde_json::Map::new();
    let mut files = Vec::new();
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let Ok(bytes) = field.bytes().await else {
            return error(StatusCode::BAD_REQUEST, "unreadable multipart field");
        };
        match file_name {
            Some(file_name) if name == "files" => {
                files.push(json!({ "fileName": file_name, "size": bytes.len() }));
            }
            _ => {
                fields.insert(name, Value::String(String::from_utf8_lossy(&bytes).into_owned()));
            }
        }
    }

    let received = json!({ "fields": fields, "files": files });
    state
        .uploads
        .lock()
        .expect("uploads mutex poisoned")
        .push(received.clone());
    Json(json!({ "message": "Files received", "received": received })).into_response()
}

async fn echo_body(headers: HeaderMap, Json(body): Json<Value>) -> Response {
    if !is_authorized(&headers) {
        return error(StatusCode::UNAUTHORIZED, "Not authorized, no token");
    }
    Json(json!({ "body": body })).into_response()
}

async fn echo_empty(headers: HeaderMap) -> Response {
    if !is_authorized(&headers) {
        return error(StatusCode::UNAUTHORIZED, "Not authorized, no token");
    }
    Json(json!({ "ok": true })).into_response()
}

async fn broken() -> Response {
    (StatusCode::OK, "<html>not json</html>").into_response()
}

async fn teapot() -> Response {
    StatusCode::IM_A_TEAPOT.into_response()
}

async fn explode() -> Response {
    error(StatusCode::INTERNAL_SERVER_ERROR, "database exploded")
}

async fn empty() -> Response {
    StatusCode::NO_CONTENT.into_response()
}
