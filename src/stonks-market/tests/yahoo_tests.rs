use pretty_assertions::assert_eq;
use stonks_market::{MarketError, Quote, QuoteBackend, YahooBackend};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn symbols(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn test_quote_requests_all_symbols_in_one_call() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v7/finance/quote"))
        .and(query_param("symbols", "DOCN,AAPL"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "quoteResponse": {
                "result": [
                    {
                        "symbol": "DOCN",
                        "shortName": "DigitalOcean",
                        "regularMarketPrice": 38.5,
                        "regularMarketChange": 1.5,
                        "regularMarketChangePercent": 4.05
                    },
                    {
                        "symbol": "AAPL",
                        "shortName": "Apple Inc.",
                        "longName": "Apple Inc.",
                        "regularMarketPrice": 190.12,
                        "regularMarketChange": 0.0,
                        "regularMarketChangePercent": 0.0
                    }
                ],
                "error": null
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let backend = YahooBackend::with_base_url(server.uri()).unwrap();
    let quotes = backend.quote(&symbols(&["DOCN", "AAPL"])).await.unwrap();

    assert_eq!(
        quotes,
        vec![
            Quote {
                symbol: "DOCN".to_string(),
                short_name: "DigitalOcean".to_string(),
                long_name: None,
                price: 38.5,
                change: 1.5,
                change_percent: 4.05,
            },
            Quote {
                symbol: "AAPL".to_string(),
                short_name: "Apple Inc.".to_string(),
                long_name: Some("Apple Inc.".to_string()),
                price: 190.12,
                change: 0.0,
                change_percent: 0.0,
            },
        ]
    );
}

#[tokio::test]
async fn test_quote_empty_symbols_skips_request() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let backend = YahooBackend::with_base_url(server.uri()).unwrap();
    assert!(backend.quote(&[]).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_quote_non_success_status() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v7/finance/quote"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Unauthorized"))
        .mount(&server)
        .await;

    let backend = YahooBackend::with_base_url(server.uri()).unwrap();
    let err = backend.quote(&symbols(&["DOCN"])).await.unwrap_err();

    match err {
        MarketError::Status { status, body } => {
            assert_eq!(status, 401);
            assert_eq!(body, "Unauthorized");
        }
        other => panic!("Expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_quote_undecodable_body() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v7/finance/quote"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>nope</html>"))
        .mount(&server)
        .await;

    let backend = YahooBackend::with_base_url(server.uri()).unwrap();
    let err = backend.quote(&symbols(&["DOCN"])).await.unwrap_err();
    assert!(matches!(err, MarketError::InvalidResponse(_)));
}
