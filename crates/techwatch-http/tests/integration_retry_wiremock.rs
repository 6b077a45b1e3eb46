//! Integration tests for the shared client/retry stack against a mock HTTP
//! server, covering the failure modes scraper plugins actually hit against
//! upstream APIs: transient 503s that recover, a 429 that widens the backoff,
//! and a 404 that must not be retried.

use std::sync::atomic::{AtomicU32, Ordering};

use techwatch_http::{HttpClientConfig, HttpError, create_client, with_retry};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn retries_past_transient_server_errors_then_succeeds() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/item/1.json"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/item/1.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": 1})))
        .mount(&mock_server)
        .await;

    let client = create_client(&HttpClientConfig::default()).unwrap();
    let url = format!("{}/item/1.json", mock_server.uri());

    let body = with_retry(3, || {
        let client = client.clone();
        let url = url.clone();
        async move {
            client
                .get(&url)
                .send()
                .await
                .map_err(HttpError::from)?
                .error_for_status()
                .map_err(HttpError::from)
        }
    })
    .await
    .unwrap();

    assert_eq!(body.status(), 200);
}

#[tokio::test]
async fn does_not_retry_a_404() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/item/missing.json"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let client = create_client(&HttpClientConfig::default()).unwrap();
    let url = format!("{}/item/missing.json", mock_server.uri());
    let attempts = AtomicU32::new(0);

    let result = with_retry(3, || {
        attempts.fetch_add(1, Ordering::SeqCst);
        let client = client.clone();
        let url = url.clone();
        async move {
            client
                .get(&url)
                .send()
                .await
                .map_err(HttpError::from)?
                .error_for_status()
                .map_err(HttpError::from)
        }
    })
    .await;

    assert!(result.is_err());
    assert_eq!(attempts.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn exhausts_retries_against_a_persistently_rate_limited_endpoint() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/topstories.json"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&mock_server)
        .await;

    let client = create_client(&HttpClientConfig::default()).unwrap();
    let url = format!("{}/topstories.json", mock_server.uri());
    let attempts = AtomicU32::new(0);

    let result = with_retry(2, || {
        attempts.fetch_add(1, Ordering::SeqCst);
        let client = client.clone();
        let url = url.clone();
        async move {
            client
                .get(&url)
                .send()
                .await
                .map_err(HttpError::from)?
                .error_for_status()
                .map_err(HttpError::from)
        }
    })
    .await;

    assert!(result.is_err());
    assert_eq!(attempts.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn successful_response_round_trips_json_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/topstories.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vec![1, 2, 3]))
        .mount(&mock_server)
        .await;

    let client = create_client(&HttpClientConfig::default()).unwrap();
    let url = format!("{}/topstories.json", mock_server.uri());

    let ids: Vec<i64> = with_retry(1, || {
        let client = client.clone();
        let url = url.clone();
        async move {
            client
                .get(&url)
                .send()
                .await
                .map_err(HttpError::from)?
                .error_for_status()
                .map_err(HttpError::from)
        }
    })
    .await
    .unwrap()
    .json()
    .await
    .unwrap();

    assert_eq!(ids, vec![1, 2, 3]);
}
