use crate::common::{RunningServer, init_test_logging};

#[test]
fn test_scripted_sequences_over_http() {
    init_test_logging();
    crate::test_log!("TEST START: test_scripted_sequences_over_http");

    let server = RunningServer::start();

    let time: Vec<u16> = (0..5).map(|_| server.get("/api/v3/time").0).collect();
    assert_eq!(time, vec![503, 503, 503, 200, 503]);

    let ticker: Vec<u16> = (0..5)
        .map(|_| server.get("/api/v3/ticker/price?symbol=BTCUSDT").0)
        .collect();
    assert_eq!(ticker, vec![200, 200, 200, 429, 200]);

    let orders: Vec<(u16, serde_json::Value)> =
        (0..6).map(|_| server.post("/api/v3/order")).collect();
    let codes: Vec<u16> = orders.iter().map(|(s, _)| *s).collect();
    assert_eq!(codes, vec![418, 418, 418, 418, 200, 418]);
    assert_eq!(orders[4].1["orderId"], 1_234_567);

    crate::test_log!("TEST PASS: test_scripted_sequences_over_http");
}

#[test]
fn test_health_and_unknown_routes() {
    init_test_logging();

    let server = RunningServer::start();
    server.get("/api/v3/time");

    let (status, health) = server.get("/health");
    assert_eq!(status, 200);
    assert_eq!(health["status"], "healthy");
    assert_eq!(health["attempts"]["time"], 1);

    let (status, body) = server.get("/api/v3/klines");
    assert_eq!(status, 404);
    assert_eq!(body["code"], -1100);

    let (_, after) = server.get("/health");
    assert_eq!(after["attempts"], health["attempts"]);
}

#[test]
fn test_stateless_endpoints_over_http() {
    init_test_logging();

    let server = RunningServer::start();
    for _ in 0..6 {
        let (status, account) = server.get("/api/v3/account");
        assert_eq!(status, 200);
        assert_eq!(account["balances"][1]["asset"], "USDT");

        let (status, info) = server.get("/api/v3/exchangeInfo");
        assert_eq!(status, 200);
        assert_eq!(info["symbols"][0]["symbol"], "BTCUSDT");
    }
}
