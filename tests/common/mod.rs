#![allow(dead_code)]

use std::sync::Arc;

use actix_http::Request;
use actix_web::body::MessageBody;
use actix_web::cookie::Cookie;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::StatusCode;
use actix_web::{test, web, App};
use serde_json::{json, Value};
use taskdesk::auth::AccessGate;
use taskdesk::models::{PublicUser, Task, TaskStatus};
use taskdesk::routes::{self, health};
use taskdesk::store::PgStore;
use taskdesk::{AppState, Config};

pub const JWT_SECRET: &str = "integration-test-secret";

pub fn test_config() -> Config {
    Config::from_lookup(|key| match key {
        "JWT_SECRET" => Some(JWT_SECRET.to_string()),
        "BCRYPT_COST" => Some("4".to_string()),
        _ => None,
    })
    .expect("test config")
}

/// The full application (gate, health probe and `/api` routes) over a fresh
/// in-memory store.
pub async fn init_app() -> impl Service<
    Request,
    Response = ServiceResponse<impl MessageBody>,
    Error = actix_web::Error,
> {
    init_app_with(AppState::in_memory(&test_config())).await
}

pub async fn init_app_with(
    state: AppState,
) -> impl Service<Request, Response = ServiceResponse<impl MessageBody>, Error = actix_web::Error> {
    let tokens = state.tokens.clone();
    test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .wrap(AccessGate::new(tokens))
            .service(health::health)
            .service(web::scope("/api").configure(routes::config)),
    )
    .await
}

pub fn session_cookie<B>(resp: &ServiceResponse<B>) -> Option<Cookie<'static>> {
    resp.response()
        .cookies()
        .find(|c| c.name() == "token")
        .map(|c| c.into_owned())
}

/// Registers a user and returns it together with its session cookie.
pub async fn register_user(
    app: &impl Service<Request, Response = ServiceResponse<impl MessageBody>, Error = actix_web::Error>,
    email: &str,
    password: &str,
    name: &str,
) -> (PublicUser, Cookie<'static>) {
    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(json!({ "email": email, "password": password, "name": name }))
        .to_request();
    let resp = test::call_service(app, req).await;
    assert!(
        resp.status().is_success(),
        "registration of {} failed with {}",
        email,
        resp.status()
    );

    let cookie = session_cookie(&resp).expect("register sets the session cookie");
    let body: serde_json::Value = test::read_body_json(resp).await;
    let user: PublicUser = serde_json::from_value(body["user"].clone()).expect("user in body");
    (user, cookie)
}

/// A migrated `PgStore` on `DATABASE_URL`, or `None` when no database is
/// configured.
pub async fn pg_store() -> Option<PgStore> {
    dotenv::dotenv().ok();
    let Some(database_url) = std::env::var("DATABASE_URL")
        .ok()
        .filter(|url| !url.is_empty())
    else {
        log::warn!("DATABASE_URL not set, skipping Postgres test");
        return None;
    };

    let store = PgStore::connect(&database_url)
        .await
        .expect("Failed to connect to test DB");
    store.migrate().await.expect("Failed to apply migrations");
    Some(store)
}

pub fn pg_state(store: PgStore) -> AppState {
    AppState::new(&test_config(), Arc::new(store.clone()), Arc::new(store))
}

/// Email that has not been used by any earlier run against the same database.
pub fn unique_email(prefix: &str) -> String {
    format!("{}-{}@x.com", prefix, uuid::Uuid::new_v4())
}

pub async fn create_task(
    app: &impl Service<Request, Response = ServiceResponse<impl MessageBody>, Error = actix_web::Error>,
    cookie: &Cookie<'static>,
    title: &str,
    description: &str,
) -> Task {
    let req = test::TestRequest::post()
        .uri("/api/tasks")
        .cookie(cookie.clone())
        .set_json(json!({ "title": title, "description": description }))
        .to_request();
    let resp = test::call_service(app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    serde_json::from_value(body["task"].clone()).expect("task in body")
}

pub async fn list_tasks(
    app: &impl Service<Request, Response = ServiceResponse<impl MessageBody>, Error = actix_web::Error>,
    cookie: &Cookie<'static>,
    query: &str,
) -> (Vec<Task>, Value) {
    let req = test::TestRequest::get()
        .uri(&format!("/api/tasks{}", query))
        .cookie(cookie.clone())
        .to_request();
    let resp = test::call_service(app, req).await;
    assert_eq!(resp.status(), StatusCode::OK, "query: {}", query);
    let body: Value = test::read_body_json(resp).await;
    let tasks = serde_json::from_value(body["tasks"].clone()).expect("tasks in body");
    (tasks, body["pagination"].clone())
}

pub async fn set_status(
    app: &impl Service<Request, Response = ServiceResponse<impl MessageBody>, Error = actix_web::Error>,
    cookie: &Cookie<'static>,
    task: &Task,
    status: TaskStatus,
) -> Task {
    let req = test::TestRequest::put()
        .uri(&format!("/api/tasks/{}", task.id))
        .cookie(cookie.clone())
        .set_json(json!({ "status": status }))
        .to_request();
    let resp = test::call_service(app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    serde_json::from_value(body["task"].clone()).expect("task in body")
}
