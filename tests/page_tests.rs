mod common;

use axum::http::{header, StatusCode};
use common::TestApp;

#[tokio::test]
async fn test_public_pages() {
    let app = TestApp::new().await;
    app.group("Cats", "cats").await;
    app.user("leo").await;

    for url in ["/", "/group/cats/", "/leo/", "/about/author/", "/about/tech/"] {
        let response = app.get(url, None).await;
        assert_eq!(response.status, StatusCode::OK, "{}", url);
        assert!(response
            .headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .starts_with("text/html"));
    }
}

#[tokio::test]
async fn test_health_check() {
    let app = TestApp::new().await;
    let response = app.get(rainbow_posts::routes::HEALTH_PATH, None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, "Rainbow-Posts is running!");
}

#[tokio::test]
async fn test_profile_named_like_health_is_reachable() {
    let app = TestApp::new().await;
    let health = app.user("health").await;
    let post = app.post(&health, "checking in", None).await;

    let response = app.get("/health/", None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("checking in"));
    assert_eq!(
        app.get(&format!("/health/{}/", post.id), None).await.status,
        StatusCode::OK
    );
}

#[tokio::test]
async fn test_unknown_page_renders_404_template() {
    let app = TestApp::new().await;
    let response = app.get("/no/such/page/here/", None).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert!(response.body.contains("Page not found"));
    assert!(response.body.contains("/no/such/page/here/"));
}

#[tokio::test]
async fn test_header_reflects_login_state() {
    let app = TestApp::new().await;

    let anonymous = app.get("/about/tech/", None).await;
    assert!(anonymous.body.contains("Log in"));
    assert!(!anonymous.body.contains("href=\"/new/\""));

    let signed_in = app.get("/about/tech/", Some("leo")).await;
    assert!(signed_in.body.contains("Signed in as"));
    assert!(signed_in.body.contains("href=\"/new/\""));
}

#[tokio::test]
async fn test_index_cache_is_per_viewer() {
    let app = TestApp::new().await;

    let anonymous = app.get("/", None).await;
    let signed_in = app.get("/", Some("leo")).await;
    assert!(anonymous.body.contains("Log in"));
    assert!(signed_in.body.contains("Signed in as"));
}

#[tokio::test]
async fn test_invalid_token_is_treated_as_anonymous() {
    let app = TestApp::new().await;
    let request = axum::http::Request::builder()
        .uri("/new/")
        .header(header::AUTHORIZATION, "Bearer not-a-token")
        .body(axum::body::Body::empty())
        .unwrap();

    let response = app.send(request).await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn test_bearer_token_authenticates() {
    let app = TestApp::new().await;
    let token = app.state.auth_service.issue_token("leo", Some("Leo")).unwrap();
    let request = axum::http::Request::builder()
        .uri("/new/")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(axum::body::Body::empty())
        .unwrap();

    let response = app.send(request).await;
    assert_eq!(response.status, StatusCode::OK);
    let leo = app.state.user_service.get_by_username("leo").await.unwrap();
    assert_eq!(leo.shown_name(), "Leo");
}
