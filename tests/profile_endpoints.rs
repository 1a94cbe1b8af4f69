use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use serde_json::{Value, json};
use tower::ServiceExt;

use instacard_backend::features::profile::{ProfileStorage, create_profile_router};

async fn setup() -> (Router, ProfileStorage) {
    let path = std::env::temp_dir().join(format!(
        "instacard-profile-test-{}.db",
        uuid::Uuid::new_v4().simple()
    ));
    let storage = ProfileStorage::connect_sqlite(path.to_str().expect("utf8 path"), true)
        .await
        .expect("connect sqlite");
    storage.init_schema().await.expect("init schema");
    let app = create_profile_router::<ProfileStorage>().with_state(storage.clone());
    (app, storage)
}

async fn stored_delete_code(storage: &ProfileStorage, id: i64) -> Option<String> {
    sqlx::query_scalar::<_, String>("SELECT delete_code FROM profiles WHERE id = ?")
        .bind(id)
        .fetch_optional(&storage.pool)
        .await
        .expect("query delete_code")
}

async fn count_username(storage: &ProfileStorage, username: &str) -> i64 {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM profiles WHERE username = ?")
        .bind(username)
        .fetch_one(&storage.pool)
        .await
        .expect("count username")
}

async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(v) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(v.to_string())
        }
        None => Body::empty(),
    };
    let resp = app
        .clone()
        .oneshot(builder.body(body).expect("build request"))
        .await
        .expect("call app");
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("read body");
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

async fn create(app: &Router, body: Value) -> i64 {
    let (status, json) = call(app, "POST", "/profiles", Some(body)).await;
    assert_eq!(status, StatusCode::CREATED, "create failed: {json}");
    json["id"].as_i64().expect("id")
}

#[tokio::test]
async fn create_then_get_roundtrips_fields() {
    let (app, storage) = setup().await;
    let (status, created) = call(
        &app,
        "POST",
        "/profiles",
        Some(json!({
            "username": "alice",
            "bio": "UI designer",
            "profession": "Designer",
            "hourlyRate": 35.5,
            "photo": "https://cdn.example/alice.png",
            "delete_code": "secret-1"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["message"], "Profile created successfully");
    assert_eq!(created["delete_code"], "secret-1");
    let id = created["id"].as_i64().expect("id");

    let (status, profile) = call(&app, "GET", &format!("/profiles/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["username"], "alice");
    assert_eq!(profile["profession"], "Designer");
    assert_eq!(profile["hourly_rate"], 35.5);
    assert_eq!(profile["photo"], "https://cdn.example/alice.png");
    assert_eq!(profile["is_public"], true);
    assert!(profile.get("delete_code").is_none());

    assert_eq!(
        stored_delete_code(&storage, id).await,
        Some("secret-1".to_string())
    );
}

#[tokio::test]
async fn delete_code_is_generated_when_missing() {
    let (app, storage) = setup().await;
    let (status, created) = call(&app, "POST", "/profiles", Some(json!({"username": "bob", "bio": "hi"}))).await;
    assert_eq!(status, StatusCode::CREATED);
    let code = created["delete_code"].as_str().expect("delete_code").to_string();
    assert!(uuid::Uuid::parse_str(&code).is_ok());

    let id = created["id"].as_i64().expect("id");
    assert_eq!(stored_delete_code(&storage, id).await, Some(code));
}

#[tokio::test]
async fn create_requires_username_and_bio() {
    let (app, _) = setup().await;
    let (status, json) = call(
        &app,
        "POST",
        "/profiles",
        Some(json!({"username": "  ", "bio": "x"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json, json!({"error": "Username and bio are required"}));

    let (status, json) = call(&app, "POST", "/profiles", Some(json!({"username": "x"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Username and bio are required");
}

#[tokio::test]
async fn duplicate_username_is_a_conflict() {
    let (app, _) = setup().await;
    create(&app, json!({"username": "henry", "bio": "first"})).await;

    let (status, json) = call(
        &app,
        "POST",
        "/profiles",
        Some(json!({"username": "henry", "bio": "second"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json, json!({"error": "Username already exists"}));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_creates_with_same_username_keep_one_row() {
    let (app, storage) = setup().await;

    let tasks: Vec<_> = (0..16)
        .map(|_| {
            let app = app.clone();
            tokio::spawn(async move {
                call(
                    &app,
                    "POST",
                    "/profiles",
                    Some(json!({"username": "same", "bio": "b"})),
                )
                .await
            })
        })
        .collect();

    let mut created = 0;
    for task in tasks {
        let (status, json) = task.await.expect("join create");
        if status == StatusCode::CREATED {
            created += 1;
        } else {
            assert_eq!(status, StatusCode::CONFLICT, "unexpected response: {json}");
            assert_eq!(json, json!({"error": "Username already exists"}));
        }
    }
    assert_eq!(created, 1);
    assert_eq!(count_username(&storage, "same").await, 1);
}

#[tokio::test]
async fn renaming_to_taken_username_is_a_conflict() {
    let (app, storage) = setup().await;
    create(&app, json!({"username": "x1", "bio": "first"})).await;
    let second = create(&app, json!({"username": "x2", "bio": "second"})).await;

    let (status, json) = call(
        &app,
        "PUT",
        &format!("/profiles/{second}"),
        Some(json!({"username": "x1"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json, json!({"error": "Username already exists"}));
    assert_eq!(count_username(&storage, "x1").await, 1);

    let (_, profile) = call(&app, "GET", &format!("/profiles/{second}"), None).await;
    assert_eq!(profile["username"], "x2");

    // 保持原名不算冲突
    let (status, _) = call(
        &app,
        "PUT",
        &format!("/profiles/{second}"),
        Some(json!({"username": "x2", "bio": "renamed bio"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn empty_update_on_existing_profile_succeeds() {
    let (app, _) = setup().await;
    let id = create(&app, json!({"username": "ivy", "bio": "hi"})).await;

    let (status, json) = call(&app, "PUT", &format!("/profiles/{id}"), Some(json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "Profile updated successfully");

    let (status, _) = call(&app, "PUT", "/profiles/9999", Some(json!({}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn malformed_json_is_rejected_with_error_body() {
    let (app, _) = setup().await;
    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/profiles")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{not json"))
                .expect("build request"),
        )
        .await
        .expect("call app");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let bytes = to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("read body");
    let json: Value = serde_json::from_slice(&bytes).expect("parse json");
    assert_eq!(json, json!({"error": "Invalid JSON body"}));
}

#[tokio::test]
async fn missing_and_non_numeric_ids_return_404() {
    let (app, _) = setup().await;
    for uri in ["/profiles/9999", "/profiles/abc"] {
        let (status, json) = call(&app, "GET", uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
        assert_eq!(json, json!({"error": "Profile not found"}));
    }
    let (status, _) = call(&app, "PUT", "/profiles/9999", Some(json!({"bio": "x"}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = call(&app, "DELETE", "/profiles/9999", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn update_changes_only_given_fields_and_null_clears() {
    let (app, _) = setup().await;
    let id = create(
        &app,
        json!({"username": "carol", "bio": "old bio", "skills": "Rust", "github": "carol-gh"}),
    )
    .await;

    let (status, json) = call(
        &app,
        "PUT",
        &format!("/profiles/{id}"),
        Some(json!({"bio": "new bio", "github": null})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "Profile updated successfully");

    let (_, profile) = call(&app, "GET", &format!("/profiles/{id}"), None).await;
    assert_eq!(profile["bio"], "new bio");
    assert_eq!(profile["skills"], "Rust");
    assert_eq!(profile["github"], Value::Null);
    assert_eq!(profile["username"], "carol");
}

#[tokio::test]
async fn delete_removes_profile() {
    let (app, _) = setup().await;
    let id = create(&app, json!({"username": "dave", "bio": "hi"})).await;

    let (status, json) = call(&app, "DELETE", &format!("/profiles/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "Profile deleted successfully");

    let (status, _) = call(&app, "GET", &format!("/profiles/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn list_hides_private_profiles_and_filters() {
    let (app, _) = setup().await;
    create(&app, json!({"username": "erin", "bio": "Designer", "profession": "Designer", "skills": "Figma", "hourly_rate": 20.0})).await;
    create(&app, json!({"username": "frank", "profession": "Developer", "bio": "Rust 100% fan", "hourly_rate": 50.0})).await;
    create(&app, json!({"username": "grace", "bio": "hidden", "profession": "Designer", "is_public": false})).await;

    let (status, all) = call(&app, "GET", "/profiles", None).await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = all
        .as_array()
        .expect("array")
        .iter()
        .filter_map(|p| p["username"].as_str())
        .collect();
    assert_eq!(names, vec!["frank", "erin"]);

    let (_, designers) = call(&app, "GET", "/profiles?profession=Designer", None).await;
    assert_eq!(designers.as_array().expect("array").len(), 1);
    assert_eq!(designers[0]["username"], "erin");

    let (_, search) = call(&app, "GET", "/profiles?search=figma", None).await;
    assert_eq!(search.as_array().expect("array").len(), 1);
    assert_eq!(search[0]["username"], "erin");

    // ASCII 字母不区分大小写
    let (_, upper) = call(&app, "GET", "/profiles?search=FIGMA", None).await;
    assert_eq!(upper.as_array().expect("array").len(), 1);

    // % 按字面匹配
    let (_, literal) = call(&app, "GET", "/profiles?search=100%25", None).await;
    assert_eq!(literal.as_array().expect("array").len(), 1);
    assert_eq!(literal[0]["username"], "frank");

    let (_, by_rate) = call(&app, "GET", "/profiles?sort=rate-low", None).await;
    assert_eq!(by_rate[0]["username"], "erin");
    let (_, by_rate) = call(&app, "GET", "/profiles?sort=rate-high", None).await;
    assert_eq!(by_rate[0]["username"], "frank");
    let (_, oldest) = call(&app, "GET", "/profiles?sort=oldest", None).await;
    assert_eq!(oldest[0]["username"], "erin");
}
