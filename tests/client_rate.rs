use grabber::config::Config;
use grabber::http::{FetchError, RedditClient};
use httpmock::{Method::GET, MockServer};

// High fallback rpm keeps the first (uncalibrated) pacing pause negligible.
fn test_config(base_url: &str) -> Config {
    Config {
        token: "t".to_string(),
        api_url: base_url.to_string(),
        user_agent: "grabber-tests".to_string(),
        timeout_secs: 5,
        safe_margin: 0.8,
        min_rps_threshold: 1.0,
        fallback_max_rpm: 6000,
    }
}

fn listing_body() -> serde_json::Value {
    serde_json::json!({
        "kind": "Listing",
        "data": {
            "after": "t3_abc",
            "children": [
                {"kind": "t3", "data": {
                    "id": "abc", "title": "a picture", "author": "someone",
                    "subreddit": "pics", "permalink": "/r/pics/comments/abc/",
                    "url": "https://i.example/a.jpg", "score": 10,
                    "created_utc": 1700000000.0,
                    "over_18": false, "is_self": false, "is_video": false
                }}
            ]
        }
    })
}

#[tokio::test]
async fn listing_headers_calibrate_the_limiter() {
    let server = MockServer::start_async().await;
    let _m = server
        .mock_async(|when, then| {
            when.method(GET).path("/r/pics/new");
            then.status(200)
                .header("x-ratelimit-used", "1")
                .header("x-ratelimit-remaining", "599")
                .header("x-ratelimit-reset", "600")
                .json_body(listing_body());
        })
        .await;

    let mut client = RedditClient::new(test_config(&server.base_url())).unwrap();
    let page = client.listing_page("pics", "new", None, 25).await.unwrap();
    assert_eq!(page.posts.len(), 1);
    assert_eq!(page.after.as_deref(), Some("t3_abc"));
    assert_eq!(page.posts[0].media_url(), Some("https://i.example/a.jpg"));

    let snap = client.rate_snapshot();
    assert_eq!(snap.used, Some(1));
    assert_eq!(snap.remaining, Some(599));
    assert_eq!(snap.reset_seconds, Some(600));
    assert_eq!(snap.missing_header_count, 0);
    assert!(snap.last_header_time.is_some());
}

#[tokio::test]
async fn responses_without_quota_headers_bump_the_streak() {
    let server = MockServer::start_async().await;
    let _m = server
        .mock_async(|when, then| {
            when.method(GET).path("/r/pics/new");
            then.status(200).json_body(listing_body());
        })
        .await;

    let mut client = RedditClient::new(test_config(&server.base_url())).unwrap();
    client.listing_page("pics", "new", None, 25).await.unwrap();
    client.listing_page("pics", "new", None, 25).await.unwrap();

    let snap = client.rate_snapshot();
    assert_eq!(snap.missing_header_count, 2);
    assert_eq!(snap.remaining, None);
}

#[tokio::test]
async fn rate_limited_responses_are_retried_then_surfaced() {
    let server = MockServer::start_async().await;
    let m = server
        .mock_async(|when, then| {
            when.method(GET).path("/r/pics/new");
            then.status(429)
                .header("retry-after", "0")
                .header("x-ratelimit-used", "600")
                .header("x-ratelimit-remaining", "300")
                .header("x-ratelimit-reset", "100")
                .body("slow down");
        })
        .await;

    let mut client = RedditClient::new(test_config(&server.base_url())).unwrap();
    let err = client.listing_page("pics", "new", None, 25).await.unwrap_err();
    match err {
        FetchError::Status { status, body } => {
            assert_eq!(status.as_u16(), 429);
            assert_eq!(body, "slow down");
        }
        other => panic!("unexpected error: {:?}", other),
    }
    // Initial attempt plus five retries.
    assert_eq!(m.hits_async().await, 6);
}

#[tokio::test]
async fn client_errors_are_not_retried() {
    let server = MockServer::start_async().await;
    let m = server
        .mock_async(|when, then| {
            when.method(GET).path("/r/doesnotexist/new");
            then.status(404).body("not found");
        })
        .await;

    let mut client = RedditClient::new(test_config(&server.base_url())).unwrap();
    let err = client
        .listing_page("doesnotexist", "new", None, 25)
        .await
        .unwrap_err();
    match err {
        FetchError::Status { status, .. } => assert_eq!(status.as_u16(), 404),
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(m.hits_async().await, 1);
}

#[tokio::test]
async fn malformed_listing_payload_is_a_decode_error() {
    let server = MockServer::start_async().await;
    let _m = server
        .mock_async(|when, then| {
            when.method(GET).path("/r/pics/new");
            then.status(200).body("<html>not json</html>");
        })
        .await;

    let mut client = RedditClient::new(test_config(&server.base_url())).unwrap();
    let err = client.listing_page("pics", "new", None, 25).await.unwrap_err();
    assert!(matches!(err, FetchError::Decode(_)), "got {:?}", err);
}
