mod support;

use axum::http::{Method, StatusCode};
use serde_json::{Value, json};
use support::TestApp;

fn registration(app: &TestApp, nim: &str, phone: &str) -> Value {
    json!({
        "nim": nim,
        "name": "Siti Rahma",
        "email": format!("{nim}@mail.test"),
        "password": "rahasia123",
        "phone_number": phone,
        "enrollment_year": 2016,
        "graduation_year": 2020,
        "verification_file_url": "/storage/verification/ijazah.pdf",
        "role_id": app.refs.admin_role.id,
        "province_id": app.refs.province.id,
        "city_id": app.refs.city.id,
        "faculty_id": app.refs.faculty.id,
        "major_id": app.refs.major.id,
    })
}

#[tokio::test]
async fn register_login_me_logout_round() {
    let app = TestApp::new();

    let (status, body) = app
        .send(
            Method::POST,
            "/api/v1/auth/register",
            None,
            Some(registration(&app, "30001", "081234567890")),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "Registrasi berhasil");
    // A client cannot pick its own role at registration.
    assert_eq!(body["data"]["role"], "Alumni");
    assert_eq!(body["data"]["verification_status"], "PENDING");
    assert!(body["data"].get("password").is_none());
    assert!(body["data"].get("password_hash").is_none());

    let (status, body) = app
        .send(
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(json!({ "nim": "30001", "password": "rahasia123" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["token_type"], "Bearer");
    let token = body["data"]["access_token"]
        .as_str()
        .expect("access token")
        .to_string();
    assert!(token.starts_with("alm_"));

    let (status, body) = app
        .send(Method::GET, "/api/v1/auth/me", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["nim"], "30001");
    assert_eq!(body["data"]["city"], "Bandung");

    let (status, _) = app
        .send(Method::POST, "/api/v1/auth/logout", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.tokens.len().await, 0);

    let (status, body) = app
        .send(Method::GET, "/api/v1/auth/me", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Token tidak valid atau sudah kedaluwarsa");
}

#[tokio::test]
async fn wrong_password_and_unknown_nim_fail_alike() {
    let app = TestApp::new();
    app.alumni("30002").await;

    let (wrong_status, wrong_body) = app
        .send(
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(json!({ "nim": "30002", "password": "salah-total" })),
        )
        .await;
    let (unknown_status, unknown_body) = app
        .send(
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(json!({ "nim": "99999", "password": "salah-total" })),
        )
        .await;

    assert_eq!(wrong_status, StatusCode::BAD_REQUEST);
    assert_eq!(wrong_status, unknown_status);
    assert_eq!(wrong_body, unknown_body);
    assert_eq!(wrong_body["errors"]["nim"][0], "NIM atau password salah");
}

#[tokio::test]
async fn duplicate_nim_is_a_field_conflict() {
    let app = TestApp::new();
    let first = registration(&app, "30003", "081200000001");
    let (status, _) = app
        .send(Method::POST, "/api/v1/auth/register", None, Some(first))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let mut second = registration(&app, "30003", "081200000002");
    second["email"] = json!("lain@mail.test");
    let (status, body) = app
        .send(Method::POST, "/api/v1/auth/register", None, Some(second))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["errors"]["nim"][0], "NIM sudah terdaftar");
}

#[tokio::test]
async fn city_outside_province_is_rejected_on_registration() {
    let app = TestApp::new();
    let mut payload = registration(&app, "30004", "081200000003");
    payload["city_id"] = json!(app.refs.other_city.id);

    let (status, body) = app
        .send(Method::POST, "/api/v1/auth/register", None, Some(payload))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["errors"]["city_id"][0],
        "Kota tidak sesuai dengan provinsi yang dipilih"
    );
}

#[tokio::test]
async fn writes_without_a_token_are_unauthenticated() {
    let app = TestApp::new();
    let (status, body) = app
        .send(
            Method::POST,
            "/api/forums",
            None,
            Some(json!({ "title": "Halo", "content": "Halo semua alumni" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Anda harus login terlebih dahulu");
    assert_eq!(app.forums.len().await, 0);
}

#[tokio::test]
async fn forum_lifecycle_over_http() {
    let app = TestApp::new();
    app.alumni("30005").await;
    let token = app.token("30005", "rahasia-alumni").await;

    let (status, body) = app
        .send(
            Method::POST,
            "/api/forums",
            Some(&token),
            Some(json!({ "title": "ab", "content": "" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["errors"]["title"].is_array());
    assert!(body["errors"]["content"].is_array());

    let (status, body) = app
        .send(
            Method::POST,
            "/api/forums",
            Some(&token),
            Some(json!({
                "title": "Info Lowongan",
                "content": "Ada lowongan di kantor saya, silakan kirim CV",
                "posted_by_id": uuid::Uuid::new_v4(),
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = body["data"]["id"].as_str().expect("forum id").to_string();

    let (status, body) = app.send(Method::GET, "/api/forums", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().map(Vec::len), Some(1));
    assert_eq!(body["meta"]["total"], 1);
    assert_eq!(body["meta"]["limit"], 10);
    assert_eq!(body["meta"]["total_pages"], 1);

    let (status, body) = app
        .send(Method::POST, &format!("/api/forums/{id}/like"), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["is_liked"], true);

    let (status, body) = app
        .send(Method::GET, &format!("/api/forums/{id}"), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["is_liked"], true);
    assert_eq!(body["data"]["forum"]["title"], "Info Lowongan");

    let (status, body) = app
        .send(Method::GET, &format!("/api/forums/{id}"), Some("alm_bogus_token"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["is_liked"], false);

    let (status, body) = app
        .send(Method::DELETE, &format!("/api/forums/{id}"), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"].is_null());

    let (status, body) = app
        .send(Method::GET, &format!("/api/forums/{id}"), None, None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Forum tidak ditemukan");
}

#[tokio::test]
async fn list_parameters_are_validated() {
    let app = TestApp::new();

    let (status, body) = app
        .send(Method::GET, "/api/products?limit=500", None, None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["errors"]["limit"].is_array());

    let (status, body) = app
        .send(Method::GET, "/api/forums?sort_by=password", None, None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["errors"]["sort_by"].is_array());

    let (status, body) = app
        .send(Method::GET, "/api/news?start_date=kemarin", None, None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["errors"]["start_date"].is_array());
}

#[tokio::test]
async fn user_directory_pages_with_per_page_and_hides_admins() {
    let app = TestApp::new();
    app.admin().await;
    app.alumni("30006").await;
    app.alumni("30007").await;
    let token = app.token("30006", "rahasia-alumni").await;

    let (status, _) = app.send(Method::GET, "/api/users", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app
        .send(Method::GET, "/api/users?per_page=1", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["meta"]["per_page"], 1);
    assert_eq!(body["meta"]["total"], 2);
    assert_eq!(body["meta"]["total_pages"], 2);
    assert!(body["meta"].get("limit").is_none());
}

#[tokio::test]
async fn reference_data_is_public() {
    let app = TestApp::new();
    let (status, body) = app
        .send(
            Method::GET,
            &format!("/api/reference/provinces/{}/cities", app.refs.province.id),
            None,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["name"], "Bandung");
    assert_eq!(body["data"].as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn unknown_routes_and_malformed_ids_are_not_found() {
    let app = TestApp::new();

    let (status, body) = app.send(Method::GET, "/api/tidak-ada", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["message"].is_string());

    let (status, _) = app
        .send(Method::GET, "/api/jobs/bukan-uuid", None, None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn health_probe_reports_no_content() {
    let app = TestApp::new();
    let (status, body) = app.send(Method::GET, "/_health/db", None, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_null());
}
