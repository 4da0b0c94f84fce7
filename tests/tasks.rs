use actix_web::{test, web, App};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use taskboard::auth::{
    hash_password, AuthMiddleware, AuthService, InMemoryRefreshStore, JwtResponse, RefreshStore,
    TokenCodec, TokenIssuer,
};
use taskboard::models::{Role, User};
use taskboard::routes;
use taskboard::storage::{InMemoryTaskStore, InMemoryUserStore, TaskStore, UserStore};

// base64 of "integration-test-signing-key-01234567"
const SECRET: &str = "aW50ZWdyYXRpb24tdGVzdC1zaWduaW5nLWtleS0wMTIzNDU2Nw==";

struct TestContext {
    users: Arc<dyn UserStore>,
    tasks: Arc<dyn TaskStore>,
    auth: web::Data<AuthService>,
    codec: Arc<TokenCodec>,
}

/// Seeds one admin and three regular users so tests can exercise every
/// corner of the access decision: admin, owner, executor and stranger.
async fn bootstrap() -> TestContext {
    let codec = Arc::new(TokenCodec::from_base64_secret(SECRET).unwrap());
    let users: Arc<dyn UserStore> = Arc::new(InMemoryUserStore::new());
    let tasks: Arc<dyn TaskStore> = Arc::new(InMemoryTaskStore::new());
    let refresh: Arc<dyn RefreshStore> = Arc::new(InMemoryRefreshStore::new());
    let issuer = TokenIssuer::new(codec.clone(), 3600, 86400);
    let auth = web::Data::new(AuthService::new(users.clone(), issuer, refresh));

    for (username, roles) in [
        ("admin", vec![Role::Admin]),
        ("alice", vec![Role::User]),
        ("bob", vec![Role::User]),
        ("carol", vec![Role::User]),
    ] {
        users
            .save(User {
                id: Uuid::new_v4(),
                username: username.to_string(),
                password_hash: hash_password("pw123").unwrap(),
                roles: roles.into_iter().collect(),
            })
            .await
            .unwrap();
    }

    TestContext {
        users,
        tasks,
        auth,
        codec,
    }
}

async fn token_for(
    app: &impl actix_web::dev::Service<
        actix_http::Request,
        Response = actix_web::dev::ServiceResponse<impl actix_web::body::MessageBody>,
        Error = actix_web::Error,
    >,
    username: &str,
) -> String {
    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "username": username, "password": "pw123" }))
        .to_request();
    let resp = test::call_service(app, req).await;
    assert!(
        resp.status().is_success(),
        "login for '{}' failed with {}",
        username,
        resp.status()
    );
    let pair: JwtResponse = test::read_body_json(resp).await;
    pair.token
}

fn bearer(token: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {}", token))
}

fn task_json(title: &str, executor: &str) -> serde_json::Value {
    json!({
        "title": title,
        "description": "something to do",
        "status": "PENDING",
        "priority": "NORMAL",
        "executor": executor
    })
}

macro_rules! init_app {
    ($ctx:expr) => {
        test::init_service(
            App::new()
                .app_data($ctx.auth.clone())
                .app_data(web::Data::from($ctx.users.clone()))
                .app_data(web::Data::from($ctx.tasks.clone()))
                .service(routes::health::health)
                .service(
                    web::scope("/api")
                        .wrap(AuthMiddleware::new($ctx.codec.clone()))
                        .configure(routes::config),
                ),
        )
        .await
    };
}

/// Creates a task as admin and returns its id.
async fn create_task(
    app: &impl actix_web::dev::Service<
        actix_http::Request,
        Response = actix_web::dev::ServiceResponse<impl actix_web::body::MessageBody>,
        Error = actix_web::Error,
    >,
    admin_token: &str,
    title: &str,
    executor: &str,
) -> Uuid {
    let req = test::TestRequest::post()
        .uri("/api/tasks")
        .insert_header(bearer(admin_token))
        .set_json(task_json(title, executor))
        .to_request();
    let resp = test::call_service(app, req).await;
    assert_eq!(resp.status(), 201);
    let body: serde_json::Value = test::read_body_json(resp).await;
    body["id"].as_str().unwrap().parse().unwrap()
}

#[actix_rt::test]
async fn test_create_task_is_admin_only() {
    let ctx = bootstrap().await;
    let app = init_app!(ctx);
    let admin = token_for(&app, "admin").await;
    let alice = token_for(&app, "alice").await;

    let req = test::TestRequest::post()
        .uri("/api/tasks")
        .insert_header(bearer(&alice))
        .set_json(task_json("Refill the coffee", "bob"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 403);

    let req = test::TestRequest::post()
        .uri("/api/tasks")
        .insert_header(bearer(&admin))
        .set_json(task_json("Refill the coffee", "bob"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 201);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["author"], "admin");
    assert_eq!(body["executor"], "bob");
    assert_eq!(body["status"], "PENDING");
}

#[actix_rt::test]
async fn test_create_task_rejects_bad_enum_and_unknown_executor() {
    let ctx = bootstrap().await;
    let app = init_app!(ctx);
    let admin = token_for(&app, "admin").await;

    let mut payload = task_json("Bad status", "bob");
    payload["status"] = json!("OPEN");
    let req = test::TestRequest::post()
        .uri("/api/tasks")
        .insert_header(bearer(&admin))
        .set_json(payload)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert!(body["message"].as_str().unwrap().contains("status"));

    let req = test::TestRequest::post()
        .uri("/api/tasks")
        .insert_header(bearer(&admin))
        .set_json(task_json("No such executor", "mallory"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);
}

#[actix_rt::test]
async fn test_read_task_owner_or_admin() {
    let ctx = bootstrap().await;
    let app = init_app!(ctx);
    let admin = token_for(&app, "admin").await;
    let id = create_task(&app, &admin, "Review the release", "bob").await;

    // Admin authored it, so admin reads it both as owner and as admin.
    let req = test::TestRequest::get()
        .uri(&format!("/api/tasks/{}", id))
        .insert_header(bearer(&admin))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    // Being the executor grants nothing on the read path.
    let bob = token_for(&app, "bob").await;
    let req = test::TestRequest::get()
        .uri(&format!("/api/tasks/{}", id))
        .insert_header(bearer(&bob))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 403);

    let req = test::TestRequest::get()
        .uri(&format!("/api/tasks/{}", Uuid::new_v4()))
        .insert_header(bearer(&admin))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);
}

#[actix_rt::test]
async fn test_update_task_field_permissions() {
    let ctx = bootstrap().await;
    // Seed a task owned by alice, so the owner path is distinct from admin.
    let id = Uuid::new_v4();
    ctx.tasks
        .insert(taskboard::models::Task {
            id,
            title: "Write the docs".to_string(),
            description: "User guide".to_string(),
            status: taskboard::models::Status::Pending,
            priority: taskboard::models::Priority::Low,
            comments: vec![],
            author: "alice".to_string(),
            executor: "bob".to_string(),
        })
        .await
        .unwrap();
    let app = init_app!(ctx);

    // Owner update: status and comments land, priority and executor are
    // silently kept as they were.
    let alice = token_for(&app, "alice").await;
    let req = test::TestRequest::put()
        .uri(&format!("/api/tasks/{}", id))
        .insert_header(bearer(&alice))
        .set_json(json!({
            "title": "Write the docs",
            "description": "User guide",
            "status": "IN_PROGRESS",
            "priority": "HIGH",
            "comments": ["started"],
            "executor": "carol"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "IN_PROGRESS");
    assert_eq!(body["comments"], json!(["started"]));
    assert_eq!(body["priority"], "LOW");
    assert_eq!(body["executor"], "bob");

    // Admin update changes every updatable field.
    let admin = token_for(&app, "admin").await;
    let req = test::TestRequest::put()
        .uri(&format!("/api/tasks/{}", id))
        .insert_header(bearer(&admin))
        .set_json(json!({
            "title": "Write the docs",
            "description": "User guide",
            "status": "DONE",
            "priority": "HIGH",
            "comments": ["started", "done"],
            "executor": "carol"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "DONE");
    assert_eq!(body["priority"], "HIGH");
    assert_eq!(body["executor"], "carol");

    // A caller who is neither owner nor admin is refused outright.
    let bob = token_for(&app, "bob").await;
    let req = test::TestRequest::put()
        .uri(&format!("/api/tasks/{}", id))
        .insert_header(bearer(&bob))
        .set_json(task_json("Write the docs", "bob"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 403);
}

#[actix_rt::test]
async fn test_admin_update_requires_existing_executor() {
    let ctx = bootstrap().await;
    let app = init_app!(ctx);
    let admin = token_for(&app, "admin").await;
    let id = create_task(&app, &admin, "Rotate the keys", "bob").await;

    let req = test::TestRequest::put()
        .uri(&format!("/api/tasks/{}", id))
        .insert_header(bearer(&admin))
        .set_json(task_json("Rotate the keys", "mallory"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);
}

#[actix_rt::test]
async fn test_delete_task_admin_only() {
    let ctx = bootstrap().await;
    let app = init_app!(ctx);
    let admin = token_for(&app, "admin").await;
    let alice = token_for(&app, "alice").await;
    let id = create_task(&app, &admin, "Throw this away", "bob").await;

    let req = test::TestRequest::delete()
        .uri(&format!("/api/tasks/{}", id))
        .insert_header(bearer(&alice))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 403);

    let req = test::TestRequest::delete()
        .uri(&format!("/api/tasks/{}", id))
        .insert_header(bearer(&admin))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 204);

    // Deleting again is a miss.
    let req = test::TestRequest::delete()
        .uri(&format!("/api/tasks/{}", id))
        .insert_header(bearer(&admin))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);
}

#[actix_rt::test]
async fn test_comment_permissions() {
    let ctx = bootstrap().await;
    let id = Uuid::new_v4();
    ctx.tasks
        .insert(taskboard::models::Task {
            id,
            title: "Plan the offsite".to_string(),
            description: "Q4".to_string(),
            status: taskboard::models::Status::Pending,
            priority: taskboard::models::Priority::Normal,
            comments: vec![],
            author: "alice".to_string(),
            executor: "bob".to_string(),
        })
        .await
        .unwrap();
    let tasks = ctx.tasks.clone();
    let app = init_app!(ctx);
    let alice = token_for(&app, "alice").await;

    // Owner appends.
    let req = test::TestRequest::post()
        .uri(&format!("/api/tasks/{}/comments", id))
        .insert_header(bearer(&alice))
        .set_json(json!({ "comment": "booked the venue" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["comments"], json!(["booked the venue"]));

    // A stranger is refused and nothing is written.
    let carol = token_for(&app, "carol").await;
    let req = test::TestRequest::post()
        .uri(&format!("/api/tasks/{}/comments", id))
        .insert_header(bearer(&carol))
        .set_json(json!({ "comment": "drive-by" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 403);
    let stored = tasks.find_by_id(id).await.unwrap().unwrap();
    assert_eq!(stored.comments, vec!["booked the venue".to_string()]);

    // Admin reads the comment list.
    let admin = token_for(&app, "admin").await;
    let req = test::TestRequest::get()
        .uri(&format!("/api/tasks/{}/comments", id))
        .insert_header(bearer(&admin))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["comments"], json!(["booked the venue"]));

    // Empty comments fail validation.
    let req = test::TestRequest::post()
        .uri(&format!("/api/tasks/{}/comments", id))
        .insert_header(bearer(&alice))
        .set_json(json!({ "comment": "" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 422);
}

#[actix_rt::test]
async fn test_listings_filters_and_pagination() {
    let ctx = bootstrap().await;
    let app = init_app!(ctx);
    let admin = token_for(&app, "admin").await;

    create_task(&app, &admin, "Alpha", "alice").await;
    create_task(&app, &admin, "Beta", "bob").await;
    let gamma = create_task(&app, &admin, "Gamma", "bob").await;

    // Mark one task DONE so the status filter has something to separate.
    let req = test::TestRequest::put()
        .uri(&format!("/api/tasks/{}", gamma))
        .insert_header(bearer(&admin))
        .set_json(json!({
            "title": "Gamma",
            "description": "something to do",
            "status": "DONE",
            "priority": "NORMAL",
            "executor": "bob"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    // Authored listing sees all three, sorted by title.
    let req = test::TestRequest::get()
        .uri("/api/tasks/my")
        .insert_header(bearer(&admin))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = test::read_body_json(resp).await;
    let titles: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["Alpha", "Beta", "Gamma"]);

    // Status filter.
    let req = test::TestRequest::get()
        .uri("/api/tasks/my?status=DONE")
        .insert_header(bearer(&admin))
        .to_request();
    let resp = test::call_service(&app, req).await;
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["title"], "Gamma");

    // Executor filter narrows to bob's two.
    let req = test::TestRequest::get()
        .uri("/api/tasks/my?executor=bob")
        .insert_header(bearer(&admin))
        .to_request();
    let resp = test::call_service(&app, req).await;
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body.as_array().unwrap().len(), 2);

    // Pagination: one per page, second page holds the middle title.
    let req = test::TestRequest::get()
        .uri("/api/tasks/my?page=1&size=1")
        .insert_header(bearer(&admin))
        .to_request();
    let resp = test::call_service(&app, req).await;
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["title"], "Beta");

    // An extreme page number is an empty page, not a server error.
    let req = test::TestRequest::get()
        .uri("/api/tasks/my?page=9223372036854775807&size=100")
        .insert_header(bearer(&admin))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert!(body.as_array().unwrap().is_empty());

    // Assigned listing is scoped to the caller as executor.
    let bob = token_for(&app, "bob").await;
    let req = test::TestRequest::get()
        .uri("/api/tasks/assigned")
        .insert_header(bearer(&bob))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body.as_array().unwrap().len(), 2);

    let alice = token_for(&app, "alice").await;
    let req = test::TestRequest::get()
        .uri("/api/tasks/assigned")
        .insert_header(bearer(&alice))
        .to_request();
    let resp = test::call_service(&app, req).await;
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["title"], "Alpha");

    // An unknown filter value is rejected up front.
    let req = test::TestRequest::get()
        .uri("/api/tasks/my?status=OPEN")
        .insert_header(bearer(&admin))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
}
