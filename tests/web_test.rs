use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use jsonwebtoken::{encode, EncodingKey, Header};
use mockito::Matcher;
use serde_json::{json, Value};
use smartmeter_portal::api::ApiClient;
use smartmeter_portal::session::Claims;
use smartmeter_portal::{create_app, AppState};
use tower::ServiceExt;

fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

fn mint(role_id: i64, exp: i64) -> String {
    let claims = Claims {
        user_id: 5,
        username: "jane@example.com".to_string(),
        role_id,
        exp,
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(b"k")).expect("token encodes")
}

fn app(api_url: &str) -> Router {
    create_app(AppState {
        api: ApiClient::new(api_url, None),
        cookie_secure: false,
        cors_allowed_origins: Vec::new(),
    })
}

fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::COOKIE, format!("token={}", token));
    }
    builder.body(Body::empty()).unwrap()
}

fn post_json(uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::COOKIE, format!("token={}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json body")
}

fn location(response: &axum::response::Response) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

fn set_cookie(response: &axum::response::Response) -> Option<&str> {
    response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
}

#[tokio::test]
async fn test_public_pages_render_without_token() {
    let app = app("http://127.0.0.1:9");
    for path in ["/", "/about", "/login", "/signup"] {
        let response = app.clone().oneshot(get(path, None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK, "{}", path);
        let body = json_body(response).await;
        assert_eq!(body["nav"]["show_login"], true);
    }
}

#[tokio::test]
async fn test_dashboard_without_token_redirects_to_login() {
    let response = app("http://127.0.0.1:9")
        .oneshot(get("/userDashboard", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");
    assert!(set_cookie(&response).is_none());
}

#[tokio::test]
async fn test_user_on_admin_dashboard_is_sent_home() {
    let token = mint(1, now() + 3600);
    let response = app("http://127.0.0.1:9")
        .oneshot(get("/adminDashboard", Some(&token)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");
}

#[tokio::test]
async fn test_expired_token_is_cleared_on_gated_page() {
    let token = mint(99, now() - 10);
    let response = app("http://127.0.0.1:9")
        .oneshot(get("/userDashboard", Some(&token)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");
    let cookie = set_cookie(&response).expect("removal cookie");
    assert!(cookie.starts_with("token=;"));
    assert!(cookie.contains("Max-Age=0"));
}

#[tokio::test]
async fn test_admin_reaches_both_dashboards() {
    let token = mint(99, now() + 3600);
    let app = app("http://127.0.0.1:9");

    let response = app
        .clone()
        .oneshot(get("/adminDashboard", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["page"], "adminDashboard");
    assert_eq!(body["nav"]["dashboard_link"], "/adminDashboard");
    assert_eq!(body["nav"]["show_logout"], true);
    assert!(body["sections"]
        .as_array()
        .unwrap()
        .iter()
        .any(|s| s == "Add Meters"));

    let response = app
        .oneshot(get("/userDashboard", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_expired_admin_still_gets_admin_link_on_public_page() {
    let token = mint(99, now() - 10);
    let response = app("http://127.0.0.1:9")
        .oneshot(get("/", Some(&token)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(set_cookie(&response).is_none());
    let body = json_body(response).await;
    assert_eq!(body["nav"]["dashboard_link"], "/adminDashboard");
}

#[tokio::test]
async fn test_login_sets_cookie_and_lands_admin_on_admin_dashboard() {
    let token = mint(99, now() + 3600);
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/api/auth/login")
        .match_body(Matcher::Json(json!({"username": "admin", "password": "pw"})))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({"token": token}).to_string())
        .create_async()
        .await;

    let response = app(&server.url())
        .oneshot(post_json(
            "/login",
            None,
            json!({"username": "admin", "password": "pw"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let cookie = set_cookie(&response).expect("token cookie").to_string();
    assert_eq!(
        cookie,
        format!("token={}; Path=/; HttpOnly; SameSite=Strict", token)
    );
    let body = json_body(response).await;
    assert_eq!(body["redirect"], "/adminDashboard");
    assert_eq!(body["message"], "Login successful");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_login_requires_both_fields() {
    let response = app("http://127.0.0.1:9")
        .oneshot(post_json("/login", None, json!({"username": "jane"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = json_body(response).await;
    assert_eq!(body["error"], "Email and password are required");
}

#[tokio::test]
async fn test_rejected_login_reports_api_message() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/api/auth/login")
        .with_status(401)
        .with_header("content-type", "application/json")
        .with_body(r#"{"error": "Invalid username or password"}"#)
        .create_async()
        .await;

    let response = app(&server.url())
        .oneshot(post_json(
            "/login",
            None,
            json!({"username": "jane", "password": "nope"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(set_cookie(&response).is_none());
    let body = json_body(response).await;
    assert_eq!(body["error"], "Invalid username or password");
}

#[tokio::test]
async fn test_unreachable_backend_is_bad_gateway() {
    let response = app("http://127.0.0.1:9")
        .oneshot(post_json(
            "/login",
            None,
            json!({"username": "jane", "password": "pw"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_signup_validation_stops_at_phone_rule() {
    let response = app("http://127.0.0.1:9")
        .oneshot(post_json(
            "/signup",
            None,
            json!({
                "email": "jane@example.com",
                "password": "Passw0rd!",
                "confirmPassword": "Passw0rd!",
                "firstName": "Jane",
                "lastName": "Doe",
                "phone": "555-123-4567",
                "address": "1 Main St",
                "city": "Springfield",
                "zipCode": "12345"
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = json_body(response).await;
    assert!(body["errors"]["phone"].is_string());
}

#[tokio::test]
async fn test_signup_forwards_email_as_username() {
    let token = mint(1, now() + 3600);
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/api/auth/signup")
        .match_body(Matcher::PartialJson(json!({
            "username": "jane@example.com",
            "email": "jane@example.com",
            "firstName": "Jane",
            "zipCode": "12345-6789"
        })))
        .with_status(201)
        .with_header("content-type", "application/json")
        .with_body(json!({"token": token, "message": "Welcome aboard"}).to_string())
        .create_async()
        .await;

    let response = app(&server.url())
        .oneshot(post_json(
            "/signup",
            None,
            json!({
                "email": " jane@example.com ",
                "password": "Passw0rd!",
                "confirmPassword": "Passw0rd!",
                "firstName": "Jane",
                "lastName": "Doe",
                "phone": "5",
                "address": "1 Main St",
                "city": "Springfield",
                "zipCode": "12345-6789"
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(set_cookie(&response).is_some());
    let body = json_body(response).await;
    assert_eq!(body["redirect"], "/userDashboard");
    assert_eq!(body["message"], "Welcome aboard");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_signup_conflict_keeps_backend_status() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/api/auth/signup")
        .with_status(400)
        .with_header("content-type", "application/json")
        .with_body(r#"{"error": "Username already exists"}"#)
        .create_async()
        .await;

    let response = app(&server.url())
        .oneshot(post_json(
            "/signup",
            None,
            json!({
                "email": "jane@example.com",
                "password": "Passw0rd!",
                "confirmPassword": "Passw0rd!",
                "firstName": "Jane",
                "lastName": "Doe",
                "phone": "5",
                "address": "1 Main St",
                "city": "Springfield",
                "zipCode": "12345"
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(set_cookie(&response).is_none());
    let body = json_body(response).await;
    assert_eq!(body["error"], "Username already exists");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_login_backend_failure_keeps_backend_status() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/api/auth/login")
        .with_status(500)
        .with_header("content-type", "application/json")
        .with_body(r#"{"error": "database unavailable"}"#)
        .create_async()
        .await;

    let response = app(&server.url())
        .oneshot(post_json(
            "/login",
            None,
            json!({"username": "jane", "password": "pw"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(response).await;
    assert_eq!(body["error"], "database unavailable");
}

#[tokio::test]
async fn test_logout_clears_cookie_and_goes_home() {
    let token = mint(1, now() + 3600);
    let response = app("http://127.0.0.1:9")
        .oneshot(post_json("/logout", Some(&token), json!({})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");
    assert!(set_cookie(&response).unwrap().contains("Max-Age=0"));
}

#[tokio::test]
async fn test_profile_update_validates_only_modified_fields() {
    let token = mint(1, now() + 3600);
    let response = app("http://127.0.0.1:9")
        .oneshot(post_json(
            "/userDashboard/profile",
            Some(&token),
            json!({
                "user": {"first_name": "J4ne", "city": "A", "zip_code": "1234"},
                "modified": ["city", "zip_code"]
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = json_body(response).await;
    assert_eq!(
        body["errors"]["city"],
        "City name must be at least 2 characters long."
    );
    assert_eq!(body["errors"]["zip_code"], "Invalid zip code format.");
    assert!(body["errors"].get("first_name").is_none());
}

#[tokio::test]
async fn test_profile_update_forwards_to_api_with_raw_token() {
    let token = mint(1, now() + 3600);
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/api/user/update_user")
        .match_header("authorization", token.as_str())
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({"userID": 5, "first_name": "Jane", "city": "Springfield", "zip_code": "12345"})
                .to_string(),
        )
        .create_async()
        .await;

    let response = app(&server.url())
        .oneshot(post_json(
            "/userDashboard/profile",
            Some(&token),
            json!({
                "user": {"first_name": "Jane", "city": "Springfield", "zip_code": "12345"},
                "modified": ["city"]
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["userID"], 5);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_consumption_below_minimum_is_rejected() {
    let token = mint(1, now() + 3600);
    let response = app("http://127.0.0.1:9")
        .oneshot(post_json(
            "/userDashboard/consumption",
            Some(&token),
            json!({"meter_id": 3, "consumption_kwh": 0.0}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = json_body(response).await;
    assert_eq!(body["error"], "Consumption must be greater than 0");
}

#[tokio::test]
async fn test_admin_adds_meter() {
    let token = mint(99, now() + 3600);
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/api/meters/add_meter")
        .match_body(Matcher::Json(json!({"meter_id": "MTR-42", "owner_id": 5})))
        .with_status(201)
        .create_async()
        .await;

    let response = app(&server.url())
        .oneshot(post_json(
            "/adminDashboard/meters",
            Some(&token),
            json!({"meter_id": " MTR-42 ", "owner_id": 5}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["message"], "Meter added successfully");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_user_cannot_reach_admin_sections() {
    let token = mint(1, now() + 3600);
    let response = app("http://127.0.0.1:9")
        .oneshot(post_json(
            "/adminDashboard/meters",
            Some(&token),
            json!({"meter_id": "MTR-42", "owner_id": 5}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");
}

#[tokio::test]
async fn test_user_lists_consumption() {
    let token = mint(1, now() + 3600);
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/api/consumption/get_data")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"[{"id": 1, "meter_id": 2, "timestamp": "2024-01-01T00:00:00",
                 "modify_timestamp": null, "consumption_kwh": 12.5}]"#,
        )
        .create_async()
        .await;

    let response = app(&server.url())
        .oneshot(get("/userDashboard/consumption", Some(&token)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body[0]["consumption_kwh"], 12.5);
}
