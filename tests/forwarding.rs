//! Forwarding behaviour through the full router.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use download_proxy::HttpServer;

mod common;

use common::{body_string, config, get, send, ScriptedUpstream};

#[tokio::test]
async fn test_host_only_targets_root() {
    let upstream = ScriptedUpstream::respond(200, &[], "ok");
    let server = HttpServer::with_upstream(config(false), upstream.clone());

    let res = send(&server, get("/example.com")).await;

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(upstream.last().url, "https://example.com/");
}

#[tokio::test]
async fn test_path_and_query_forwarded() {
    let upstream = ScriptedUpstream::respond(200, &[], "ok");
    let server = HttpServer::with_upstream(config(false), upstream.clone());

    send(&server, get("/example.com/a/b?x=1")).await;

    assert_eq!(upstream.last().url, "https://example.com/a/b?x=1");
}

#[tokio::test]
async fn test_passthrough_mode_keeps_sr_params() {
    let upstream = ScriptedUpstream::respond(200, &[], "foo");
    let server = HttpServer::with_upstream(config(false), upstream.clone());

    let res = send(&server, get("/example.com/page?__sr=foo:bar&y=2")).await;

    assert_eq!(upstream.last().url, "https://example.com/page?__sr=foo:bar&y=2");
    assert_eq!(body_string(res).await, "foo");
}

#[tokio::test]
async fn test_dotless_host_rejected() {
    let upstream = ScriptedUpstream::respond(200, &[], "ok");
    let server = HttpServer::with_upstream(config(false), upstream.clone());

    let res = send(&server, get("/localhost/file")).await;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_string(res).await, "Invalid domain format");
    assert!(upstream.seen().is_empty());
}

#[tokio::test]
async fn test_root_path_rejected() {
    let upstream = ScriptedUpstream::respond(200, &[], "ok");
    let server = HttpServer::with_upstream(config(false), upstream.clone());

    let res = send(&server, get("/")).await;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_string(res).await,
        "Invalid path. Use format: /domain.com/path/to/file"
    );
    assert!(upstream.seen().is_empty());
}

#[tokio::test]
async fn test_response_forced_to_download() {
    let upstream = ScriptedUpstream::respond(
        200,
        &[
            ("content-type", "text/html; charset=utf-8"),
            ("content-security-policy", "default-src 'self'"),
            ("x-frame-options", "SAMEORIGIN"),
            ("cache-control", "max-age=60"),
        ],
        "<html></html>",
    );
    let server = HttpServer::with_upstream(config(false), upstream);

    let res = send(&server, get("/example.com/a/b/report.pdf")).await;
    let headers = res.headers();

    assert_eq!(headers.get("content-type").unwrap(), "application/octet-stream");
    assert_eq!(headers.get("x-content-type-options").unwrap(), "nosniff");
    assert_eq!(
        headers.get("content-disposition").unwrap(),
        "attachment; filename=\"report.pdf\""
    );
    assert!(!headers.contains_key("content-security-policy"));
    assert!(!headers.contains_key("x-frame-options"));
    assert_eq!(headers.get("cache-control").unwrap(), "max-age=60");
    assert_eq!(body_string(res).await, "<html></html>");
}

#[tokio::test]
async fn test_root_target_downloads_as_default_name() {
    let upstream = ScriptedUpstream::respond(200, &[], "index");
    let server = HttpServer::with_upstream(config(false), upstream);

    let res = send(&server, get("/example.com/")).await;

    assert_eq!(
        res.headers().get("content-disposition").unwrap(),
        "attachment; filename=\"download\""
    );
}

#[tokio::test]
async fn test_upstream_error_status_passes_through() {
    let upstream = ScriptedUpstream::respond(503, &[("retry-after", "5")], "busy");
    let server = HttpServer::with_upstream(config(false), upstream);

    let res = send(&server, get("/example.com/file.zip")).await;

    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(res.headers().get("retry-after").unwrap(), "5");
    assert_eq!(
        res.headers().get("content-type").unwrap(),
        "application/octet-stream"
    );
    assert_eq!(body_string(res).await, "busy");
}

#[tokio::test]
async fn test_transport_failure_is_bad_gateway() {
    let upstream = ScriptedUpstream::failing();
    let server = HttpServer::with_upstream(config(false), upstream.clone());

    let res = send(&server, get("/example.com/file.zip")).await;

    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(body_string(res).await, "Upstream request failed");
    assert_eq!(upstream.seen().len(), 1);
}

#[tokio::test]
async fn test_inbound_headers_filtered() {
    let upstream = ScriptedUpstream::respond(200, &[], "ok");
    let server = HttpServer::with_upstream(config(false), upstream.clone());

    let req = Request::builder()
        .uri("/example.com/private/data.json")
        .header("host", "proxy.example.net")
        .header("cf-connecting-ip", "198.51.100.7")
        .header("cf-ipcountry", "DE")
        .header("cf-ray", "8a1b2c3d")
        .header("cf-visitor", "{\"scheme\":\"https\"}")
        .header("x-forwarded-proto", "https")
        .header("x-real-ip", "198.51.100.7")
        .header("cookie", "session=abc")
        .header("authorization", "Bearer secret")
        .header("accept", "application/json")
        .body(Body::empty())
        .unwrap();
    send(&server, req).await;

    let seen = upstream.last();
    for stripped in [
        "host",
        "cf-connecting-ip",
        "cf-ipcountry",
        "cf-ray",
        "cf-visitor",
        "x-forwarded-proto",
        "x-real-ip",
    ] {
        assert!(!seen.headers.contains_key(stripped), "{stripped} was forwarded");
    }
    assert_eq!(seen.headers.get("cookie").unwrap(), "session=abc");
    assert_eq!(seen.headers.get("authorization").unwrap(), "Bearer secret");
    assert_eq!(seen.headers.get("accept").unwrap(), "application/json");
}

#[tokio::test]
async fn test_custom_strip_list() {
    let upstream = ScriptedUpstream::respond(200, &[], "ok");
    let mut cfg = config(false);
    cfg.forwarding.strip_request_headers = vec!["x-internal-token".into()];
    let server = HttpServer::with_upstream(cfg, upstream.clone());

    let req = Request::builder()
        .uri("/example.com/")
        .header("x-internal-token", "t")
        .header("x-real-ip", "198.51.100.7")
        .body(Body::empty())
        .unwrap();
    send(&server, req).await;

    let seen = upstream.last();
    assert!(!seen.headers.contains_key("x-internal-token"));
    assert_eq!(seen.headers.get("x-real-ip").unwrap(), "198.51.100.7");
}

#[tokio::test]
async fn test_method_and_body_forwarded() {
    let upstream = ScriptedUpstream::respond(201, &[], "created");
    let server = HttpServer::with_upstream(config(false), upstream.clone());

    let req = Request::builder()
        .method("POST")
        .uri("/api.example.com/v1/items")
        .header("content-type", "application/json")
        .body(Body::from("{\"name\":\"x\"}"))
        .unwrap();
    let res = send(&server, req).await;

    assert_eq!(res.status(), StatusCode::CREATED);
    let seen = upstream.last();
    assert_eq!(seen.method, "POST");
    assert!(seen.has_body);
    assert_eq!(seen.headers.get("content-type").unwrap(), "application/json");
}

#[tokio::test]
async fn test_empty_get_sent_without_body() {
    let upstream = ScriptedUpstream::respond(200, &[], "ok");
    let server = HttpServer::with_upstream(config(false), upstream.clone());

    send(&server, get("/example.com/a")).await;

    assert!(!upstream.last().has_body);
}

#[tokio::test]
async fn test_request_id_echoed() {
    let upstream = ScriptedUpstream::respond(200, &[], "ok");
    let server = HttpServer::with_upstream(config(false), upstream.clone());

    let req = Request::builder()
        .uri("/example.com/a")
        .header("x-request-id", "req-42")
        .body(Body::empty())
        .unwrap();
    let res = send(&server, req).await;
    assert_eq!(res.headers().get("x-request-id").unwrap(), "req-42");

    let res = send(&server, get("/example.com/a")).await;
    assert!(res.headers().contains_key("x-request-id"));
}
