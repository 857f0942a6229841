//! HTTP surface of the mock exchange.
//!
//! Provides:
//! - `/api/v3/time`, `/api/v3/ticker/price`, `POST /api/v3/order` - scripted failures
//! - `/api/v3/exchangeInfo`, `/api/v3/account` - always succeed
//! - `/health` - uptime and a read-only snapshot of the attempt counters
//!
//! Anything else gets a 404 in the exchange's error shape.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    Json, Router,
    extract::{Query, State},
    http::{StatusCode, Uri},
    response::IntoResponse,
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use faultline_common::{Endpoint, FaultInjector, RequestContext};

/// Error code returned for unknown routes.
const UNKNOWN_ENDPOINT_CODE: i32 = -1100;

/// Shared state for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    /// Dispatches to the endpoint policies.
    pub injector: FaultInjector,
    /// Server version.
    pub version: &'static str,
    /// Server start time.
    pub started_at: Instant,
    /// Server PID.
    pub pid: u32,
}

#[derive(Debug, Default, Deserialize)]
struct SymbolQuery {
    symbol: Option<String>,
}

/// Create the router for the mock exchange.
pub fn create_router(state: HttpState) -> Router {
    Router::new()
        .route(Endpoint::ServerTime.path(), get(server_time_handler))
        .route(Endpoint::ExchangeInfo.path(), get(exchange_info_handler))
        .route(Endpoint::TickerPrice.path(), get(ticker_price_handler))
        .route(Endpoint::Account.path(), get(account_handler))
        .route(Endpoint::PlaceOrder.path(), post(place_order_handler))
        .route("/health", get(health_handler))
        .fallback(not_found_handler)
        .with_state(Arc::new(state))
}

fn serve(
    state: &HttpState,
    endpoint: Endpoint,
    ctx: RequestContext,
) -> (StatusCode, Json<serde_json::Value>) {
    let served = state.injector.handle(endpoint, &ctx);
    let status = StatusCode::from_u16(served.response.status)
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(served.response.body))
}

async fn server_time_handler(State(state): State<Arc<HttpState>>) -> impl IntoResponse {
    serve(&state, Endpoint::ServerTime, RequestContext::now())
}

async fn exchange_info_handler(
    State(state): State<Arc<HttpState>>,
    Query(query): Query<SymbolQuery>,
) -> impl IntoResponse {
    let ctx = RequestContext::now().with_symbol(query.symbol);
    serve(&state, Endpoint::ExchangeInfo, ctx)
}

async fn ticker_price_handler(
    State(state): State<Arc<HttpState>>,
    Query(query): Query<SymbolQuery>,
) -> impl IntoResponse {
    let ctx = RequestContext::now().with_symbol(query.symbol);
    serve(&state, Endpoint::TickerPrice, ctx)
}

async fn account_handler(State(state): State<Arc<HttpState>>) -> impl IntoResponse {
    serve(&state, Endpoint::Account, RequestContext::now())
}

async fn place_order_handler(State(state): State<Arc<HttpState>>) -> impl IntoResponse {
    serve(&state, Endpoint::PlaceOrder, RequestContext::now())
}

/// Handler for `/health`. Does not advance any counter.
async fn health_handler(State(state): State<Arc<HttpState>>) -> impl IntoResponse {
    let uptime_secs = state.started_at.elapsed().as_secs();

    Json(json!({
        "status": "healthy",
        "version": state.version,
        "pid": state.pid,
        "uptime_seconds": uptime_secs,
        "attempts": state.injector.counters().snapshot(),
    }))
}

async fn not_found_handler(uri: Uri) -> impl IntoResponse {
    debug!(path = %uri.path(), "unknown endpoint");
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "code": UNKNOWN_ENDPOINT_CODE,
            "msg": format!("Unknown endpoint: {}", uri.path()),
        })),
    )
}

/// Bind `addr` and serve until `shutdown` resolves.
///
/// Returns the bound address (useful with port 0) and the server task.
pub async fn start_server<F>(
    addr: SocketAddr,
    state: HttpState,
    shutdown: F,
) -> std::io::Result<(SocketAddr, tokio::task::JoinHandle<Result<(), std::io::Error>>)>
where
    F: Future<Output = ()> + Send + 'static,
{
    let router = create_router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let local_addr = listener.local_addr()?;

    info!("Mock exchange listening on http://{}", local_addr);

    let handle = tokio::spawn(async move {
        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await
    });
    Ok((local_addr, handle))
}
