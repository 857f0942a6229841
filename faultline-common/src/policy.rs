//! Scripted endpoint policies for the fault-injection exchange API.
//!
//! Each policy is a pure function of the attempt number (1-indexed, the
//! counter value *after* the increment) and the request context. The same
//! inputs always produce the same response; the only state lives in
//! [`crate::injector::AttemptCounters`].
//!
//! | Endpoint       | Failure                  | Reset attempt | Cycle |
//! |----------------|--------------------------|---------------|-------|
//! | server time    | 503 on attempts 1-3      | 4 (200)       | 4     |
//! | ticker price   | 429 on attempt 4         | 4 (the 429)   | 4     |
//! | place order    | 418 on attempts 1-4      | 5 (200)       | 5     |
//! | exchange info  | never                    | -             | -     |
//! | account        | never                    | -             | -     |

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Symbol used when a request does not name one.
pub const DEFAULT_SYMBOL: &str = "BTCUSDT";

/// Order id returned by every successful order placement.
pub const FIXED_ORDER_ID: u64 = 1_234_567;

/// Price quoted by the ticker endpoint.
pub const TICKER_PRICE: &str = "60000.00";

/// Exchange error code attached to rate-limit and ban responses.
pub const TOO_MANY_REQUESTS_CODE: i64 = -1003;

const SERVER_TIME_CYCLE: u32 = 4;
const TICKER_CYCLE: u32 = 4;
const PLACE_ORDER_CYCLE: u32 = 5;

/// An endpoint exposed by the fault-injection service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Endpoint {
    /// `GET /api/v3/time` - transient unavailability.
    #[serde(rename = "time")]
    ServerTime,
    /// `GET /api/v3/exchangeInfo` - always succeeds.
    ExchangeInfo,
    /// `GET /api/v3/ticker/price` - periodic rate limiting.
    #[serde(rename = "ticker")]
    TickerPrice,
    /// `GET /api/v3/account` - always succeeds.
    Account,
    /// `POST /api/v3/order` - temporary IP ban.
    PlaceOrder,
}

impl Endpoint {
    /// Every endpoint, in routing order.
    pub const ALL: [Endpoint; 5] = [
        Endpoint::ServerTime,
        Endpoint::ExchangeInfo,
        Endpoint::TickerPrice,
        Endpoint::Account,
        Endpoint::PlaceOrder,
    ];

    /// Endpoints that own an attempt counter.
    pub const SCRIPTED: [Endpoint; 3] = [
        Endpoint::ServerTime,
        Endpoint::TickerPrice,
        Endpoint::PlaceOrder,
    ];

    /// Stable identifier used in logs and the health snapshot.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ServerTime => "time",
            Self::ExchangeInfo => "exchange_info",
            Self::TickerPrice => "ticker",
            Self::Account => "account",
            Self::PlaceOrder => "place_order",
        }
    }

    /// HTTP path the endpoint is served on.
    pub fn path(self) -> &'static str {
        match self {
            Self::ServerTime => "/api/v3/time",
            Self::ExchangeInfo => "/api/v3/exchangeInfo",
            Self::TickerPrice => "/api/v3/ticker/price",
            Self::Account => "/api/v3/account",
            Self::PlaceOrder => "/api/v3/order",
        }
    }

    /// Length of the scripted failure cycle, or `None` for stateless endpoints.
    pub fn cycle_len(self) -> Option<u32> {
        match self {
            Self::ServerTime => Some(SERVER_TIME_CYCLE),
            Self::TickerPrice => Some(TICKER_CYCLE),
            Self::PlaceOrder => Some(PLACE_ORDER_CYCLE),
            Self::ExchangeInfo | Self::Account => None,
        }
    }

    /// Whether calls to this endpoint advance an attempt counter.
    pub fn is_scripted(self) -> bool {
        self.cycle_len().is_some()
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Values a response body may depend on besides the attempt number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    /// Wall-clock time of the request in epoch milliseconds.
    pub now_ms: i64,
    /// Symbol named by the request, if any.
    pub symbol: Option<String>,
}

impl RequestContext {
    /// Context stamped with the current wall-clock time.
    pub fn now() -> Self {
        Self {
            now_ms: chrono::Utc::now().timestamp_millis(),
            symbol: None,
        }
    }

    /// Attach the requested symbol.
    pub fn with_symbol(mut self, symbol: Option<String>) -> Self {
        self.symbol = symbol.filter(|s| !s.is_empty());
        self
    }

    fn symbol(&self) -> &str {
        self.symbol.as_deref().unwrap_or(DEFAULT_SYMBOL)
    }
}

/// Response chosen by a policy.
#[derive(Debug, Clone, PartialEq)]
pub struct PolicyResponse {
    /// HTTP status code.
    pub status: u16,
    /// JSON body.
    pub body: Value,
    /// Whether serving this response resets the endpoint's counter.
    pub resets_counter: bool,
}

impl PolicyResponse {
    fn ok(body: Value) -> Self {
        Self {
            status: 200,
            body,
            resets_counter: false,
        }
    }

    fn with_status(status: u16, body: Value) -> Self {
        Self {
            status,
            body,
            resets_counter: false,
        }
    }

    fn resetting(mut self) -> Self {
        self.resets_counter = true;
        self
    }

    /// True for 2xx responses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Evaluate the policy of `endpoint` for a 1-indexed `attempt`.
///
/// Stateless endpoints ignore `attempt`.
pub fn evaluate(endpoint: Endpoint, attempt: u32, ctx: &RequestContext) -> PolicyResponse {
    match endpoint {
        Endpoint::ServerTime => server_time(attempt, ctx),
        Endpoint::ExchangeInfo => exchange_info(ctx),
        Endpoint::TickerPrice => ticker_price(attempt, ctx),
        Endpoint::Account => account(),
        Endpoint::PlaceOrder => place_order(attempt, ctx),
    }
}

fn server_time(attempt: u32, ctx: &RequestContext) -> PolicyResponse {
    if attempt < SERVER_TIME_CYCLE {
        return PolicyResponse::with_status(503, json!({ "msg": "Server Busy" }));
    }
    PolicyResponse::ok(json!({ "serverTime": ctx.now_ms })).resetting()
}

fn ticker_price(attempt: u32, ctx: &RequestContext) -> PolicyResponse {
    // The failure sits on the cycle boundary, not at the start.
    if attempt >= TICKER_CYCLE {
        return PolicyResponse::with_status(
            429,
            json!({ "code": TOO_MANY_REQUESTS_CODE, "msg": "Too many requests" }),
        )
        .resetting();
    }
    PolicyResponse::ok(json!({ "symbol": ctx.symbol(), "price": TICKER_PRICE }))
}

fn place_order(attempt: u32, ctx: &RequestContext) -> PolicyResponse {
    if attempt < PLACE_ORDER_CYCLE {
        return PolicyResponse::with_status(
            418,
            json!({ "code": TOO_MANY_REQUESTS_CODE, "msg": "IP Banned" }),
        );
    }
    PolicyResponse::ok(json!({
        "symbol": DEFAULT_SYMBOL,
        "orderId": FIXED_ORDER_ID,
        "clientOrderId": "",
        "transactTime": ctx.now_ms,
        "price": "55000.00",
        "origQty": "0.1",
        "executedQty": "0.0",
        "status": "NEW",
    }))
    .resetting()
}

fn exchange_info(ctx: &RequestContext) -> PolicyResponse {
    PolicyResponse::ok(json!({
        "symbols": [{
            "symbol": ctx.symbol(),
            "status": "TRADING",
            "baseAsset": "BTC",
            "quoteAsset": "USDT",
            "filters": [
                {
                    "filterType": "PRICE_FILTER",
                    "minPrice": "0.01",
                    "maxPrice": "100000.00",
                    "tickSize": "0.01",
                },
                {
                    "filterType": "LOT_SIZE",
                    "minQty": "0.0001",
                    "maxQty": "100.00",
                    "stepSize": "0.0001",
                },
                {
                    "filterType": "MIN_NOTIONAL",
                    "minNotional": "10.00",
                },
                {
                    "filterType": "PERCENT_PRICE_BY_SIDE",
                    "bidMultiplierUp": "1.2",
                    "bidMultiplierDown": "0.8",
                    "askMultiplierUp": "1.2",
                    "askMultiplierDown": "0.8",
                    "avgPriceMins": 5,
                },
            ],
        }],
    }))
}

fn account() -> PolicyResponse {
    PolicyResponse::ok(json!({
        "balances": [
            { "asset": "BTC", "free": "1.50000000", "locked": "0.00000000" },
            { "asset": "USDT", "free": "10000.00000000", "locked": "500.00000000" },
        ],
    }))
}
