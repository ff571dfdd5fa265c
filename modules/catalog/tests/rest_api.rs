//! Black-box tests over the assembled router: wire shapes, error bodies,
//! cookie round trip. Service semantics are covered by the in-crate
//! suites; this exercises the HTTP boundary.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use http::{Request, StatusCode, header};
use sea_orm::{ConnectOptions, Database};
use sea_orm_migration::MigratorTrait;
use serde_json::{Value, json};
use tower::ServiceExt;
use trellis_catalog::api::rest::routes;
use trellis_catalog::{Catalog, CatalogConfig, Migrator};
use trellis_session::{CookieSettings, SessionKeys, SessionLayerState};

async fn test_app() -> Router {
    let mut opts = ConnectOptions::new("sqlite::memory:");
    opts.max_connections(1).min_connections(1);
    let db = Database::connect(opts).await.expect("connect");
    Migrator::up(&db, None).await.expect("migrate");

    let catalog = Arc::new(Catalog::new(db, CatalogConfig::default()));
    let session = SessionLayerState {
        keys: SessionKeys::new(b"test-secret", 3600),
        cookies: CookieSettings {
            name: "trellis_session".to_owned(),
            secure: false,
        },
    };
    routes::router(catalog, session)
}

fn admin_cookie() -> String {
    let keys = SessionKeys::new(b"test-secret", 3600);
    let token = keys
        .sign("u-admin", "admin", vec!["admins".to_owned()])
        .unwrap();
    format!("trellis_session={token}")
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(req).await.expect("request failed");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json body")
    };
    (status, body)
}

fn post_json(uri: &str, cookie: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_create_and_fetch_block() {
    let app = test_app().await;
    let cookie = admin_cookie();

    let (status, body) = send(
        &app,
        post_json(
            "/blocks",
            Some(&cookie),
            json!({
                "id": "b1",
                "strings": [{"attributeId": "title", "languageId": "en", "value": "Shop"}],
                "counters": [{"attributeId": "price", "count": 5.0}],
                "permissions": [{"method": "READ"}],
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["id"], "b1");
    assert_eq!(body["attributes"]["strings"][0]["value"], "Shop");
    assert_eq!(body["attributes"]["counters"][0]["count"], 5.0);
    assert_eq!(body["attributes"]["descriptions"], json!([]));

    // Public READ entry makes it visible without a session.
    let (status, body) = send(&app, get("/blocks/b1", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], "b1");
}

#[tokio::test]
async fn test_list_returns_data_and_count() {
    let app = test_app().await;
    let cookie = admin_cookie();

    for id in ["b1", "b2", "b3"] {
        let (status, _) = send(
            &app,
            post_json(
                "/blocks",
                Some(&cookie),
                json!({"id": id, "permissions": [{"method": "READ"}]}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = send(&app, get("/blocks?limit=2&offset=1", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 3);
    let ids: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["b2", "b3"]);
}

#[tokio::test]
async fn test_write_without_session_is_forbidden() {
    let app = test_app().await;

    let (status, body) = send(&app, post_json("/blocks", None, json!({"id": "b1"}))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["statusCode"], 403);
    assert_eq!(body["error"], "Forbidden");
    assert_eq!(body["details"]["entity"], "Block");
    assert_eq!(body["details"]["method"], "WRITE");
}

#[tokio::test]
async fn test_missing_resource_error_shape() {
    let app = test_app().await;

    let (status, body) = send(&app, get("/blocks/ghost", None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["statusCode"], 404);
    assert_eq!(body["message"], "Block with id ghost not found");
    assert_eq!(body["details"]["id"], "ghost");
}

#[tokio::test]
async fn test_malformed_filter_is_bad_request() {
    let app = test_app().await;

    let (status, body) = send(
        &app,
        get(
            "/blocks?counter%5B0%5D%5Battr%5D=price&counter%5B0%5D%5Bmin%5D=cheap",
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"]["field"], "counter[0][min]");
}

#[tokio::test]
async fn test_register_login_and_use_session() {
    let app = test_app().await;

    let (status, _) = send(
        &app,
        post_json(
            "/auth/register",
            None,
            json!({"login": "alice", "password": "correct-horse"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    // Missing password is rejected before storage.
    let (status, body) = send(
        &app,
        post_json("/auth/register", None, json!({"login": "bob"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"]["field"], "password");

    // Login sets the session cookie.
    let response = app
        .clone()
        .oneshot(post_json(
            "/auth/login",
            None,
            json!({"login": "alice", "password": "correct-horse"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .expect("session cookie")
        .to_str()
        .unwrap()
        .to_owned();
    assert!(cookie.starts_with("trellis_session="));

    // Bad credentials are a 403 without detail.
    let (status, _) = send(
        &app,
        post_json(
            "/auth/login",
            None,
            json!({"login": "alice", "password": "wrong"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_delete_returns_no_content() {
    let app = test_app().await;
    let cookie = admin_cookie();

    send(
        &app,
        post_json(
            "/blocks",
            Some(&cookie),
            json!({"id": "b1", "permissions": [{"method": "READ"}]}),
        ),
    )
    .await;

    let request = Request::builder()
        .method("DELETE")
        .uri("/blocks/b1")
        .header(header::COOKIE, &cookie)
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let (status, _) = send(&app, get("/blocks/b1", None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_put_with_omitted_kind_deletes_rows() {
    let app = test_app().await;
    let cookie = admin_cookie();

    send(
        &app,
        post_json(
            "/blocks",
            Some(&cookie),
            json!({
                "id": "b1",
                "counters": [{"attributeId": "price", "count": 5.0}],
                "permissions": [{"method": "READ"}],
            }),
        ),
    )
    .await;

    let request = Request::builder()
        .method("PUT")
        .uri("/blocks/b1")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::COOKIE, &cookie)
        .body(Body::from(
            json!({"permissions": [{"method": "READ"}]}).to_string(),
        ))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let (_, body) = send(&app, get("/blocks/b1", None)).await;
    assert_eq!(body["attributes"]["counters"], json!([]));
}
