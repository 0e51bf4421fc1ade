//! End-to-end tests against a running gate.

use axum::http::StatusCode;

mod common;

use common::{client, production_policy, start_gate};

#[tokio::test]
async fn test_plain_http_is_redirected_permanently() {
    let gate = start_gate(production_policy()).await;

    let res = client()
        .get(gate.url("/account?tab=keys"))
        .header("host", "ssl.example.com")
        .send()
        .await
        .expect("gate unreachable");

    assert_eq!(res.status(), StatusCode::MOVED_PERMANENTLY);
    assert_eq!(
        res.headers()["location"],
        "https://ssl.example.com/account?tab=keys"
    );
    assert!(res.headers().get("strict-transport-security").is_none());
}

#[tokio::test]
async fn test_temporary_redirect() {
    let mut policy = production_policy();
    policy.ssl_temporary_redirect = true;
    let gate = start_gate(policy).await;

    let res = client()
        .get(gate.url("/"))
        .header("host", "ssl.example.com")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(res.headers()["location"], "https://ssl.example.com/");
}

#[tokio::test]
async fn test_unknown_host_is_forbidden() {
    let gate = start_gate(production_policy()).await;

    let res = client()
        .get(gate.url("/"))
        .header("host", "evil.example.com")
        .header("x-forwarded-proto", "https")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    assert_eq!(res.text().await.unwrap(), "Host not allowed");
}

#[tokio::test]
async fn test_forwarded_https_gets_security_headers() {
    let gate = start_gate(production_policy()).await;

    let res = client()
        .get(gate.url("/hello"))
        .header("host", "internal:8080")
        .header("x-forwarded-hosts", "ssl.example.com")
        .header("x-forwarded-proto", "https")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let headers = res.headers();
    assert_eq!(
        headers["strict-transport-security"],
        "max-age=315360000; includeSubdomains; preload"
    );
    assert_eq!(headers["x-frame-options"], "SAMEORIGIN");
    assert_eq!(headers["x-content-type-options"], "nosniff");
    assert_eq!(
        headers["x-xss-protection"],
        "1; report=https://example.com/xss-report"
    );
    assert_eq!(headers["content-security-policy"], "default-src 'self'");
    assert_eq!(headers["referrer-policy"], "same-origin");
    assert!(headers.contains_key("x-request-id"));

    assert_eq!(res.text().await.unwrap(), "GET /hello\n");
}

#[tokio::test]
async fn test_development_mode_passes_plain_http() {
    let mut policy = production_policy();
    policy.is_development = true;
    policy.force_sts_header = true;
    let gate = start_gate(policy).await;

    let res = client()
        .get(gate.url("/"))
        .header("host", "localhost:3000")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.headers().get("strict-transport-security").is_none());
    assert_eq!(res.headers()["x-frame-options"], "SAMEORIGIN");
}

#[tokio::test]
async fn test_policy_update_applies_to_next_request() {
    let gate = start_gate(production_policy()).await;
    let client = client();

    let res = client
        .get(gate.url("/"))
        .header("host", "ssl.example.com")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::MOVED_PERMANENTLY);

    let mut relaxed = (*gate.stage.current()).clone();
    relaxed.ssl_redirect = false;
    gate.stage.update(relaxed);

    let res = client
        .get(gate.url("/"))
        .header("host", "ssl.example.com")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["x-frame-options"], "SAMEORIGIN");
}
