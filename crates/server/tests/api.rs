use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode},
};
use http_body_util::BodyExt;
use sea_orm::Database;
use serde_json::{Value, json};
use tower::ServiceExt;

use engine::Engine;
use migration::MigratorTrait;
use server::ServerState;

async fn app() -> Router {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder().database(db).build().await.unwrap();
    server::router(ServerState {
        engine: Arc::new(engine),
    })
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => request
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn create_root(app: &Router, name: &str) -> i64 {
    let (status, body) = send(app, Method::POST, "/category", Some(json!({ "name": name }))).await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_i64().unwrap()
}

async fn create_child(app: &Router, parent: i64, name: &str) -> i64 {
    let (status, body) = send(
        app,
        Method::POST,
        &format!("/category-child/{parent}"),
        Some(json!({ "name": name })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["parent_id"], json!(parent));
    body["id"].as_i64().unwrap()
}

async fn add_expense(app: &Router, category: i64, count: i64, cents: i64, date: &str) -> Value {
    let (status, body) = send(
        app,
        Method::POST,
        "/expense",
        Some(json!({
            "category_id": category,
            "count": count,
            "unit_price_minor": cents,
            "local_date": date,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body
}

#[tokio::test]
async fn petrol_scenario_over_http() {
    let app = app().await;
    let auto = create_root(&app, "Auto").await;
    let petrol = create_child(&app, auto, "Petrol").await;

    let expense = add_expense(&app, petrol, 2, 100_00, "2020-05-05").await;
    assert_eq!(expense["total_price_minor"], json!(200_00));

    let (status, found) = send(
        &app,
        Method::GET,
        &format!("/expense-certain?startDate=2020-05-01&finishDate=2020-05-31&categoryId={auto}&sortBy=localDate"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(found, json!([expense]));

    let (status, chart) = send(
        &app,
        Method::GET,
        &format!("/expense-bar-data?dateFrom=2020-05-01&dateTo=2020-05-31&categoryId={auto}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        chart,
        json!({ "no_subcategory": 0.0, "totals": { "Petrol": 200.0 } })
    );

    let (status, chart) = send(
        &app,
        Method::GET,
        "/expense-bar-data?dateFrom=2020-05-01&dateTo=2020-05-31",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(chart, json!({ "no_subcategory": null, "totals": { "Auto": 200.0 } }));
}

#[tokio::test]
async fn category_listing_and_free_categories() {
    let app = app().await;
    let food = create_root(&app, "Food").await;
    let auto = create_root(&app, "Auto").await;
    let petrol = create_child(&app, auto, "Petrol").await;
    create_child(&app, auto, "Oil").await;
    add_expense(&app, petrol, 1, 10_00, "2020-05-05").await;

    let (status, roots) = send(&app, Method::GET, "/category", None).await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = roots
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["Auto", "Food"]);

    let (_, free) = send(&app, Method::GET, "/free-category", None).await;
    assert_eq!(free, json!([{ "id": food, "name": "Food", "parent_id": null }]));

    let (_, free_children) =
        send(&app, Method::GET, &format!("/free-category-child/{auto}"), None).await;
    assert_eq!(free_children.as_array().unwrap().len(), 1);
    assert_eq!(free_children[0]["name"], json!("Oil"));

    let (status, children) =
        send(&app, Method::GET, &format!("/category-child/{auto}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(children.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn category_errors_map_to_status_codes() {
    let app = app().await;
    let auto = create_root(&app, "Auto").await;
    let petrol = create_child(&app, auto, "Petrol").await;

    let (status, body) =
        send(&app, Method::POST, "/category", Some(json!({ "name": "Auto" }))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].is_string());

    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/category-child/{petrol}"),
        Some(json!({ "name": "Diesel" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, Method::GET, "/category-child/999", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    add_expense(&app, petrol, 1, 1_00, "2020-05-05").await;
    let (status, _) = send(&app, Method::DELETE, &format!("/category/{auto}"), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn delete_root_category_cascades() {
    let app = app().await;
    let auto = create_root(&app, "Auto").await;
    create_child(&app, auto, "Petrol").await;

    let (status, body) = send(&app, Method::DELETE, &format!("/category/{auto}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);

    let (_, roots) = send(&app, Method::GET, "/category", None).await;
    assert_eq!(roots, json!([]));
}

#[tokio::test]
async fn expense_crud_round_trip() {
    let app = app().await;
    let food = create_root(&app, "Food").await;
    let expense = add_expense(&app, food, 3, 2_50, "2020-05-07").await;
    let id = expense["id"].as_i64().unwrap();

    let (status, fetched) = send(&app, Method::GET, &format!("/expense/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, expense);

    let (status, updated) = send(
        &app,
        Method::PATCH,
        &format!("/expense/{id}"),
        Some(json!({ "note": "x" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["note"], json!("x"));
    assert_eq!(updated["count"], json!(3));
    assert_eq!(updated["total_price_minor"], json!(7_50));
    assert_eq!(updated["local_date"], json!("2020-05-07"));

    let (status, updated) = send(
        &app,
        Method::PATCH,
        &format!("/expense/{id}"),
        Some(json!({ "count": 2, "local_date": "2020-05-08" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["count"], json!(3));
    assert_eq!(updated["total_price_minor"], json!(7_50));
    assert_eq!(updated["local_date"], json!("2020-05-08"));

    let (status, _) = send(&app, Method::PATCH, &format!("/expense/{id}"), Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, Method::DELETE, &format!("/expense/{id}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send(&app, Method::GET, &format!("/expense/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn malformed_query_parameters_are_bad_requests() {
    let app = app().await;

    for uri in [
        "/expense-certain?startDate=05/01/2020&finishDate=2020-05-31&sortBy=id",
        "/expense-certain?startDate=2020-05-01&finishDate=2020-05-31&priceFrom=lots&sortBy=id",
        "/expense-certain?startDate=2020-05-01&finishDate=2020-05-31&sortBy=colour",
        "/expense-certain?startDate=2020-05-01&finishDate=2020-05-31&categoryId=x&sortBy=id",
        "/expense-bar-data?dateFrom=2020-05-01&dateTo=tomorrow",
    ] {
        let (status, body) = send(&app, Method::GET, uri, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert!(body["error"].is_string(), "{uri}");
    }

    let (status, _) = send(
        &app,
        Method::GET,
        "/expense-certain?startDate=2020-05-01&finishDate=2020-05-31&categoryId=42&sortBy=id",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn malformed_dates_read_the_same_on_every_endpoint() {
    let app = app().await;

    let (status, certain) = send(
        &app,
        Method::GET,
        "/expense-certain?startDate=2020-05-01&finishDate=tomorrow&sortBy=id",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, bar) = send(
        &app,
        Method::GET,
        "/expense-bar-data?dateFrom=2020-05-01&dateTo=tomorrow",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(bar, certain);

    let (status, _) = send(
        &app,
        Method::GET,
        "/expense-bar-data?dateFrom=2020-05-01&dateTo=2020-05-31&categoryId=",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn query_combines_price_and_note_filters() {
    let app = app().await;
    let food = create_root(&app, "Food").await;
    let (_, milk) = send(
        &app,
        Method::POST,
        "/expense",
        Some(json!({
            "category_id": food,
            "unit_price_minor": 1_20,
            "local_date": "2020-05-02",
            "note": "Молоко",
        })),
    )
    .await;
    add_expense(&app, food, 1, 50_00, "2020-05-02").await;

    let (status, found) = send(
        &app,
        Method::GET,
        "/expense-certain?startDate=2020-05-01&finishDate=2020-05-31&priceFrom=1&priceTo=2,00&note=%D0%BC%D0%BE%D0%BB&sortBy=totalPrice,desc",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(found, json!([milk]));
    assert_eq!(milk["count"], json!(1));
}

#[tokio::test]
async fn spawned_server_answers_over_tcp() {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder().database(db).build().await.unwrap();

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = server::spawn_with_listener(engine, listener).unwrap();

    let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
    stream
        .write_all(b"GET /category HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
        .await
        .unwrap();
    let mut response = String::new();
    stream.read_to_string(&mut response).await.unwrap();

    assert!(response.starts_with("HTTP/1.1 200"), "{response}");
    assert!(response.ends_with("[]"), "{response}");
}
