use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use std::sync::Arc;
use tower::ServiceExt;
use vmapi::config::Config;
use vmapi::state::SharedState;

async fn spawn_app() -> Router {
    let mut config = Config::default();
    config.general.database_url = "sqlite::memory:".to_string();
    config.security.secret_key = "api-test-secret".to_string();
    config.security.argon2_memory_cost_kib = 1024;
    config.security.argon2_time_cost = 1;

    let shared = SharedState::new(config)
        .await
        .expect("Failed to create shared state");
    vmapi::cli::seed_accounts(shared.auth_service.as_ref())
        .await
        .expect("Failed to seed accounts");

    let state = vmapi::api::create_app_state(Arc::new(shared), None);
    vmapi::api::router(state)
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

async fn login(app: &Router, username: &str, password: &str) -> String {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/login")
                .header(header::CONTENT_TYPE, mime::APPLICATION_WWW_FORM_URLENCODED.as_ref())
                .body(Body::from(format!("username={username}&password={password}")))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["token_type"], "bearer");
    body["access_token"].as_str().unwrap().to_string()
}

fn authed(method: &str, uri: &str, token: &str, body: Option<serde_json::Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"));

    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, mime::APPLICATION_JSON.as_ref())
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn user_id(app: &Router, token: &str) -> i64 {
    let response = app
        .clone()
        .oneshot(authed("GET", "/api/v1/users/me", token, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await["data"]["id"].as_i64().unwrap()
}

#[tokio::test]
async fn test_root_and_health_are_public() {
    let app = spawn_app().await;

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/v1/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["status"], "ok");
}

#[tokio::test]
async fn test_auth_failures_are_uniform() {
    let app = spawn_app().await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/v1/records")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(response.headers()[header::WWW_AUTHENTICATE], "Bearer");

    let response = app
        .clone()
        .oneshot(authed("GET", "/api/v1/records", "not.a.token", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let garbage = body_json(response).await;

    let mut bodies = Vec::new();
    for form in [
        "username=nobody@example.com&password=admin123",
        "username=admin&password=wrong-password",
    ] {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/login")
                    .header(
                        header::CONTENT_TYPE,
                        mime::APPLICATION_WWW_FORM_URLENCODED.as_ref(),
                    )
                    .body(Body::from(form))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        bodies.push(body_json(response).await);
    }

    assert_eq!(bodies[0], bodies[1]);
    assert_eq!(bodies[0], garbage);
}

#[tokio::test]
async fn test_records_crud() {
    let app = spawn_app().await;
    let admin = login(&app, "admin@example.com", "admin123").await;
    let user1 = login(&app, "user1", "user123").await;
    let user1_id = user_id(&app, &user1).await;

    let response = app
        .clone()
        .oneshot(authed(
            "POST",
            "/api/v1/records",
            &admin,
            Some(serde_json::json!({
                "name": "db-01",
                "cores": 4,
                "ram": 8,
                "disk": 100,
                "os": "linux",
                "owner_id": user1_id,
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = body_json(response).await;
    assert_eq!(created["data"]["status"], "stopped");
    assert_eq!(created["data"]["owner_id"], user1_id);
    let id = created["data"]["id"].as_i64().unwrap();

    let response = app
        .clone()
        .oneshot(authed(
            "PUT",
            &format!("/api/v1/records/{id}"),
            &user1,
            Some(serde_json::json!({ "ram": 16, "status": "running" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let updated = body_json(response).await;
    assert_eq!(updated["data"]["ram"], 16);
    assert_eq!(updated["data"]["status"], "running");
    assert_eq!(updated["data"]["cores"], 4);
    assert_eq!(updated["data"]["disk"], 100);

    let response = app
        .clone()
        .oneshot(authed(
            "GET",
            &format!("/api/v1/virtual-machines/{id}"),
            &user1,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["ram"], 16);

    let response = app
        .clone()
        .oneshot(authed(
            "DELETE",
            &format!("/api/v1/records/{id}"),
            &user1,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["id"], id);

    let response = app
        .clone()
        .oneshot(authed(
            "GET",
            &format!("/api/v1/records/{id}"),
            &admin,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_record_permissions() {
    let app = spawn_app().await;
    let admin = login(&app, "admin", "admin123").await;
    let user1 = login(&app, "user1", "user123").await;
    let user2 = login(&app, "user2", "user123").await;
    let user1_id = user_id(&app, &user1).await;

    let vm = serde_json::json!({
        "name": "build-box",
        "cores": 2,
        "ram": 4,
        "disk": 50,
        "os": "debian",
        "owner_id": user1_id,
    });

    let response = app
        .clone()
        .oneshot(authed("POST", "/api/v1/records", &user1, Some(vm.clone())))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .clone()
        .oneshot(authed("POST", "/api/v1/records", &admin, Some(vm)))
        .await
        .unwrap();
    let id = body_json(response).await["data"]["id"].as_i64().unwrap();

    let response = app
        .clone()
        .oneshot(authed(
            "GET",
            &format!("/api/v1/records/{id}"),
            &user2,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = body_json(response).await;
    assert!(body.get("data").is_none());

    let response = app
        .clone()
        .oneshot(authed(
            "DELETE",
            &format!("/api/v1/records/{id}"),
            &user2,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .clone()
        .oneshot(authed("GET", "/api/v1/records", &user2, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"], serde_json::json!([]));

    let response = app
        .clone()
        .oneshot(authed("GET", "/api/v1/records", &admin, None))
        .await
        .unwrap();
    assert_eq!(
        body_json(response).await["data"].as_array().unwrap().len(),
        1
    );
}

#[tokio::test]
async fn test_record_validation() {
    let app = spawn_app().await;
    let admin = login(&app, "admin", "admin123").await;

    let response = app
        .clone()
        .oneshot(authed(
            "POST",
            "/api/v1/records",
            &admin,
            Some(serde_json::json!({
                "name": "",
                "cores": 0,
                "ram": 8,
                "disk": 100,
                "os": "linux",
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(response).await;
    let fields: Vec<&str> = body["details"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["name", "cores"]);

    let response = app
        .clone()
        .oneshot(authed("GET", "/api/v1/records?limit=0", &admin, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let response = app
        .clone()
        .oneshot(authed("GET", "/api/v1/records/0", &admin, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_malformed_input_uses_error_envelope() {
    let app = spawn_app().await;
    let admin = login(&app, "admin", "admin123").await;

    let cases = [
        authed("GET", "/api/v1/records?skip=-1", &admin, None),
        authed("GET", "/api/v1/records/abc", &admin, None),
        authed(
            "POST",
            "/api/v1/records",
            &admin,
            Some(serde_json::json!({ "name": "web-01", "ram": 8, "disk": 100, "os": "linux" })),
        ),
        authed("GET", "/api/v1/admin/users?limit=lots", &admin, None),
    ];

    for request in cases {
        let uri = request.uri().to_string();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY, "{uri}");

        let body = body_json(response).await;
        assert_eq!(body["success"], false, "{uri}");
        assert!(body["error"].is_string(), "{uri}");
        assert!(!body["details"].as_array().unwrap().is_empty(), "{uri}");
    }

    let response = app
        .clone()
        .oneshot(authed(
            "POST",
            "/api/v1/records",
            &admin,
            Some(serde_json::json!({ "name": "web-01", "ram": 8, "disk": 100, "os": "linux" })),
        ))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["details"][0]["field"], "cores");

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/login")
                .header(header::CONTENT_TYPE, mime::APPLICATION_WWW_FORM_URLENCODED.as_ref())
                .body(Body::from("username=admin"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body_json(response).await["success"], false);
}

#[tokio::test]
async fn test_register_and_profile() {
    let app = spawn_app().await;

    let register = |email: &str, username: &str| {
        Request::builder()
            .method("POST")
            .uri("/api/v1/users")
            .header(header::CONTENT_TYPE, mime::APPLICATION_JSON.as_ref())
            .body(Body::from(
                serde_json::json!({
                    "email": email,
                    "username": username,
                    "password": "carol-pass",
                })
                .to_string(),
            ))
            .unwrap()
    };

    let response = app
        .clone()
        .oneshot(register("carol@example.com", "carol"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["data"]["role"], "client");
    assert_eq!(body["data"]["is_superuser"], false);
    assert!(body["data"].get("password_hash").is_none());

    let response = app
        .clone()
        .oneshot(register("carol@example.com", "carol2"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let carol = login(&app, "carol", "carol-pass").await;
    let response = app
        .clone()
        .oneshot(authed(
            "PUT",
            "/api/v1/users/me",
            &carol,
            Some(serde_json::json!({ "username": "caroline" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["username"], "caroline");

    let response = app
        .clone()
        .oneshot(authed("GET", "/api/v1/admin/users", &carol, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let admin = login(&app, "admin", "admin123").await;
    let response = app
        .clone()
        .oneshot(authed("GET", "/api/v1/admin/users", &admin, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await["data"].as_array().unwrap().len(),
        4
    );

    let carol_id = user_id(&app, &carol).await;
    let response = app
        .clone()
        .oneshot(authed(
            "PUT",
            &format!("/api/v1/admin/users/{carol_id}/active"),
            &admin,
            Some(serde_json::json!({ "is_active": false })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["is_active"], false);

    let response = app
        .clone()
        .oneshot(authed("GET", "/api/v1/users/me", &carol, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .clone()
        .oneshot(authed(
            "GET",
            &format!("/api/v1/admin/users/{carol_id}"),
            &admin,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["username"], "caroline");
}
