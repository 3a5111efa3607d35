use std::sync::{Arc, Mutex};

use casabonita_proxy::logicware::auth::{
    ApiKeyCredentials, AuthError, Clock, TokenManager, TokenState,
};
use chrono::{DateTime, Duration, Utc};
use httpmock::prelude::*;
use serde_json::json;

#[derive(Clone)]
struct FakeClock(Arc<Mutex<DateTime<Utc>>>);

impl FakeClock {
    fn new() -> Self {
        Self(Arc::new(Mutex::new(Utc::now())))
    }

    fn now(&self) -> DateTime<Utc> {
        *self.0.lock().unwrap()
    }

    fn advance(&self, by: Duration) {
        *self.0.lock().unwrap() += by;
    }
}

impl Clock for FakeClock {
    fn now(&self) -> DateTime<Utc> {
        FakeClock::now(self)
    }
}

fn credentials(server: &MockServer) -> ApiKeyCredentials {
    ApiKeyCredentials {
        client: reqwest::Client::new(),
        base_url: server.base_url(),
        api_key: "test-key".into(),
        subdomain: "casabonita".into(),
    }
}

#[tokio::test]
async fn cache_hit_skips_the_token_endpoint() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/auth/external/token")
                .header("x-api-key", "test-key")
                .header("x-subdomain", "casabonita");
            then.status(200)
                .json_body(json!({"succeeded": true, "data": {"accessToken": "tok-1"}}));
        })
        .await;
    let manager = TokenManager::new(credentials(&server));

    let first = manager.get_token().await.unwrap();
    let second = manager.get_token().await.unwrap();

    assert_eq!(first.access_token, "tok-1");
    assert_eq!(second.access_token, "tok-1");
    mock.assert_hits_async(1).await;
}

#[tokio::test]
async fn expiry_is_now_plus_55_minutes() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/auth/external/token");
            then.status(200)
                .json_body(json!({"succeeded": true, "data": {"accessToken": "tok-1"}}));
        })
        .await;
    let clock = FakeClock::new();
    let manager = TokenManager::with_clock(credentials(&server), clock.clone());

    let record = manager.get_token().await.unwrap();

    assert_eq!(record.expires_at, clock.now() + Duration::minutes(55));
}

#[tokio::test]
async fn expired_token_triggers_a_refresh() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/auth/external/token");
            then.status(200)
                .json_body(json!({"succeeded": true, "data": {"accessToken": "tok-1"}}));
        })
        .await;
    let clock = FakeClock::new();
    let manager = TokenManager::with_clock(credentials(&server), clock.clone());

    manager.get_token().await.unwrap();
    clock.advance(Duration::minutes(56));
    manager.get_token().await.unwrap();

    mock.assert_hits_async(2).await;
}

#[tokio::test]
async fn failed_refresh_leaves_the_cache_unchanged() {
    let server = MockServer::start_async().await;
    let ok_mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/auth/external/token");
            then.status(200)
                .json_body(json!({"succeeded": true, "data": {"accessToken": "tok-1"}}));
        })
        .await;
    let clock = FakeClock::new();
    let manager = TokenManager::with_clock(credentials(&server), clock.clone());

    manager.get_token().await.unwrap();
    let before = manager.status().await;
    assert_eq!(before.state, TokenState::Valid);

    clock.advance(Duration::minutes(56));
    ok_mock.delete_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/auth/external/token");
            then.status(500).json_body(json!({"succeeded": false}));
        })
        .await;

    let err = manager.get_token().await.unwrap_err();
    assert!(matches!(err, AuthError::Server { status_code: 500 }));

    let after = manager.status().await;
    assert_eq!(after.state, TokenState::Expired);
    assert_eq!(after.expires_at, before.expires_at);
}

#[tokio::test]
async fn missing_access_token_is_a_malformed_response() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/auth/external/token");
            then.status(200).json_body(json!({"succeeded": false}));
        })
        .await;
    let manager = TokenManager::new(credentials(&server));

    let err = manager.get_token().await.unwrap_err();

    assert!(matches!(err, AuthError::MalformedResponse));
    assert!(manager.status().await.expires_at.is_none());
}

#[tokio::test]
async fn get_token_future_can_cross_task_boundaries() {
    fn assert_send<F: std::future::Future + Send>(future: F) -> F {
        future
    }

    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/auth/external/token");
            then.status(200)
                .json_body(json!({"succeeded": true, "data": {"accessToken": "tok-1"}}));
        })
        .await;
    let manager = TokenManager::new(credentials(&server));

    let record = assert_send(manager.get_token()).await.unwrap();

    assert_eq!(record.access_token, "tok-1");
}

#[tokio::test]
async fn concurrent_misses_authenticate_once() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/auth/external/token");
            then.status(200)
                .delay(std::time::Duration::from_millis(200))
                .json_body(json!({"succeeded": true, "data": {"accessToken": "tok-1"}}));
        })
        .await;
    let manager = Arc::new(TokenManager::new(credentials(&server)));

    let first = tokio::spawn({
        let manager = Arc::clone(&manager);
        async move { manager.get_token().await }
    });
    let second = tokio::spawn({
        let manager = Arc::clone(&manager);
        async move { manager.get_token().await }
    });
    let (first, second) = (first.await.unwrap().unwrap(), second.await.unwrap().unwrap());

    assert_eq!(first.access_token, "tok-1");
    assert_eq!(second.access_token, "tok-1");
    mock.assert_hits_async(1).await;
}
