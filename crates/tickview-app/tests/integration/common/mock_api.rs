//! Mock REST collaborator for integration tests.
//!
//! Serves the endpoints a session consumes under `/api`, with switches for
//! failing polls and pausing trading, and counters for requests received.

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Token the mock accepts.
pub const VALID_TOKEN: &str = "valid-token";

type ApiResult = Result<Json<Value>, (StatusCode, Json<Value>)>;

#[derive(Default)]
struct ApiState {
    prices: Mutex<Value>,
    fail_polls: AtomicBool,
    trading_paused: AtomicBool,
    poll_count: AtomicUsize,
    trade_count: AtomicUsize,
    portfolio_count: AtomicUsize,
}

pub struct MockApi {
    addr: SocketAddr,
    state: Arc<ApiState>,
    server: JoinHandle<()>,
}

impl MockApi {
    pub async fn start(prices: Value) -> Self {
        let state = Arc::new(ApiState {
            prices: Mutex::new(prices),
            ..Default::default()
        });

        let app = Router::new()
            .route("/api/instruments/prices", get(prices_handler))
            .route("/api/portfolio", get(portfolio_handler))
            .route("/api/trade/{side}", post(trade_handler))
            .route("/api/candles/{symbol}", get(candles_handler))
            .route("/api/system", get(system_handler))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            state,
            server,
        }
    }

    /// Base URL to configure as `api_url`.
    pub fn url(&self) -> String {
        format!("http://{}/api", self.addr)
    }

    pub fn set_prices(&self, prices: Value) {
        *self.state.prices.lock().unwrap() = prices;
    }

    pub fn fail_polls(&self, fail: bool) {
        self.state.fail_polls.store(fail, Ordering::SeqCst);
    }

    pub fn pause_trading(&self, paused: bool) {
        self.state.trading_paused.store(paused, Ordering::SeqCst);
    }

    pub fn poll_count(&self) -> usize {
        self.state.poll_count.load(Ordering::SeqCst)
    }

    pub fn trade_count(&self) -> usize {
        self.state.trade_count.load(Ordering::SeqCst)
    }

    pub fn portfolio_count(&self) -> usize {
        self.state.portfolio_count.load(Ordering::SeqCst)
    }
}

impl Drop for MockApi {
    fn drop(&mut self) {
        self.server.abort();
    }
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == format!("Bearer {VALID_TOKEN}"))
}

fn unauthorized() -> (StatusCode, Json<Value>) {
    (StatusCode::UNAUTHORIZED, Json(json!({"error": "Unauthorized"})))
}

async fn prices_handler(State(state): State<Arc<ApiState>>) -> ApiResult {
    state.poll_count.fetch_add(1, Ordering::SeqCst);
    if state.fail_polls.load(Ordering::SeqCst) {
        return Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": "database unavailable"})),
        ));
    }
    Ok(Json(state.prices.lock().unwrap().clone()))
}

async fn portfolio_handler(State(state): State<Arc<ApiState>>, headers: HeaderMap) -> ApiResult {
    if !authorized(&headers) {
        return Err(unauthorized());
    }
    state.portfolio_count.fetch_add(1, Ordering::SeqCst);
    let bought = state.trade_count.load(Ordering::SeqCst);
    Ok(Json(json!({
        "virtual_cash": 1000,
        "positions": [
            {"symbol": "AAPL", "quantity": 10 + bought, "average_price": 150, "current_price": 150},
            {"symbol": "MSFT", "quantity": 1, "average_price": "400.5"}
        ],
        "status": "APPROVED"
    })))
}

async fn trade_handler(
    State(state): State<Arc<ApiState>>,
    Path(side): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> ApiResult {
    if !authorized(&headers) {
        return Err(unauthorized());
    }
    if state.trading_paused.load(Ordering::SeqCst) {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "Trading is paused"})),
        ));
    }
    if side != "buy" && side != "sell" {
        return Err((StatusCode::NOT_FOUND, Json(json!({}))));
    }
    let Some(quantity) = body["quantity"].as_f64() else {
        return Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({"error": "quantity must be a number"})),
        ));
    };
    if quantity > 100.0 {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "Insufficient funds"})),
        ));
    }
    state.trade_count.fetch_add(1, Ordering::SeqCst);
    Ok(Json(json!({"ok": true, "side": side, "symbol": body["symbol"]})))
}

async fn candles_handler(Path(symbol): Path<String>) -> Json<Value> {
    Json(json!([
        {"time": 1_700_000_000, "open": 1, "high": 3, "low": 0.5, "close": 2, "symbol": symbol},
        {"time": 1_700_000_060, "open": 2, "high": 2, "low": 1, "close": 1}
    ]))
}

async fn system_handler(State(state): State<Arc<ApiState>>) -> Json<Value> {
    Json(json!({"trading_enabled": !state.trading_paused.load(Ordering::SeqCst)}))
}
