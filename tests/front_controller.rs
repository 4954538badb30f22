//! End-to-end tests for the front controller over a real socket.

mod common;

use reqwest::{header, StatusCode};
use serde_json::Value;

use route_resolver::config::Environment;
use route_resolver::http::{X_PATH_INFO, X_REQUEST_ID, X_SCRIPT_NAME};

use common::{spawn_server, test_routes};

#[tokio::test]
async fn test_home_route() {
    let server = spawn_server(test_routes(), Environment::Production).await;

    let response = reqwest::get(server.url("/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "ok");

    assert!(server.cache_file().exists());
    server.stop().await;
}

#[tokio::test]
async fn test_placeholders_reach_the_handler() {
    let server = spawn_server(test_routes(), Environment::Production).await;

    let body: Value = reqwest::get(server.url("/server/engines/InnoDB/Status"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["handler"], "echo");
    assert_eq!(body["params"]["engine"], "InnoDB");
    assert_eq!(body["params"]["page"], "Status");

    server.stop().await;
}

#[tokio::test]
async fn test_not_found() {
    let server = spawn_server(test_routes(), Environment::Production).await;

    let response = reqwest::get(server.url("/users/abc")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        response.text().await.unwrap(),
        "Error 404! The page /users/abc was not found."
    );

    server.stop().await;
}

#[tokio::test]
async fn test_method_not_allowed() {
    let server = spawn_server(test_routes(), Environment::Production).await;
    let client = reqwest::Client::new();

    let response = client.get(server.url("/sql")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(response.headers()[header::ALLOW], "POST");
    assert_eq!(
        response.text().await.unwrap(),
        "Error 405! Request method not allowed."
    );

    server.stop().await;
}

#[tokio::test]
async fn test_head_falls_back_to_get() {
    let server = spawn_server(test_routes(), Environment::Development).await;
    let client = reqwest::Client::new();

    let response = client.head(server.url("/users/7")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(!server.cache_file().exists());

    server.stop().await;
}

#[tokio::test]
async fn test_route_query_parameter_selects_route() {
    let server = spawn_server(test_routes(), Environment::Production).await;

    let body: Value = reqwest::get(server.url("/index.php?route=/users/12&db=test"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["route"], "/users/12");
    assert_eq!(body["self_path"], "/index.php");
    assert_eq!(body["params"]["id"], "12");

    server.stop().await;
}

#[tokio::test]
async fn test_route_form_parameter_selects_route() {
    let server = spawn_server(test_routes(), Environment::Production).await;
    let client = reqwest::Client::new();

    let response = client
        .post(server.url("/index.php"))
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body("route=%2Fsql&sql_query=SELECT+1")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["route"], "/sql");

    server.stop().await;
}

#[tokio::test]
async fn test_forwarded_script_name_is_normalized() {
    let server = spawn_server(test_routes(), Environment::Production).await;
    let client = reqwest::Client::new();

    let body: Value = client
        .get(server.url("/app/index.php"))
        .header(X_SCRIPT_NAME, "/app/./index.php/; cookieinj=value/")
        .header(X_PATH_INFO, "/; cookieinj=value/")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["self_path"], "/app/index.php");
    assert_eq!(body["route"], "/app/index.php");

    server.stop().await;
}

#[tokio::test]
async fn test_request_id_is_propagated() {
    let server = spawn_server(test_routes(), Environment::Production).await;
    let client = reqwest::Client::new();

    let response = client
        .get(server.url("/users/1"))
        .header(X_REQUEST_ID, "req-123")
        .send()
        .await
        .unwrap();
    assert_eq!(response.headers()[X_REQUEST_ID.as_str()], "req-123");
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["request_id"], "req-123");

    let generated = reqwest::get(server.url("/")).await.unwrap();
    assert!(generated.headers().contains_key(X_REQUEST_ID.as_str()));

    server.stop().await;
}

#[tokio::test]
async fn test_routes_listing() {
    let server = spawn_server(test_routes(), Environment::Production).await;

    let body: Value = reqwest::get(server.url("/routes"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let routes = body["routes"].as_array().unwrap();
    assert_eq!(routes.len(), test_routes().len());
    assert_eq!(routes[3]["pattern"], "/sql");

    server.stop().await;
}
