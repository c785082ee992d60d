#![allow(clippy::unwrap_used, reason = "test code")]

use crate::{IspClient, IspConfig, IspError, IspTool, TicketRequest};
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn setup() -> (MockServer, IspClient) {
    let server = MockServer::start().await;
    let client = IspClient::new(IspConfig::default().with_base_url(server.uri())).unwrap();
    (server, client)
}

fn user_body(conn_status: &str) -> serde_json::Value {
    json!({
        "details": {
            "id": 10854,
            "name": "Rahim",
            "subscription_status": "active",
            "status": "active",
            "conn_status": conn_status,
            "will_expire": "2026-11-01"
        },
        "payment_pending": 0
    })
}

#[tokio::test]
async fn test_get_user_found() {
    let (server, client) = setup().await;
    Mock::given(method("GET"))
        .and(path("/users/10854"))
        .respond_with(ResponseTemplate::new(200).set_body_json(user_body("conn")))
        .mount(&server)
        .await;

    let user = client.get_user("10854").await.unwrap().unwrap();
    assert_eq!(user.name.as_deref(), Some("Rahim"));
    assert_eq!(user.will_expire.as_deref(), Some("2026-11-01"));
}

#[tokio::test]
async fn test_get_user_not_found() {
    let (server, client) = setup().await;
    Mock::given(method("GET"))
        .and(path("/users/1"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    assert!(client.get_user("1").await.unwrap().is_none());
    let err = client.check_internet_status("1").await.unwrap_err();
    assert!(matches!(err, IspError::UserNotFound(_)));
}

#[tokio::test]
async fn test_server_error_is_reported() {
    let (server, client) = setup().await;
    Mock::given(method("GET"))
        .and(path("/users/2"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = client.get_user("2").await.unwrap_err();
    assert!(matches!(err, IspError::HttpStatus { code: 500, .. }));
}

#[tokio::test]
async fn test_connectivity_tool_reports_restart() {
    let (server, client) = setup().await;
    Mock::given(method("GET"))
        .and(path("/users/10854"))
        .respond_with(ResponseTemplate::new(200).set_body_json(user_body("disconn")))
        .mount(&server)
        .await;

    let result = client.run_tool(IspTool::CheckConnectivity, &json!({"user_id": "10854"})).await;
    assert_eq!(result["status"], "success");
    assert_eq!(result["issues"][0], "Internet connection is disconn");
    assert_eq!(result["recommendations"].as_array().map(Vec::len), Some(2));
}

#[tokio::test]
async fn test_packages_query_parameters() {
    let (server, client) = setup().await;
    Mock::given(method("GET"))
        .and(path("/subscription_index"))
        .and(query_param("role", "user"))
        .and(query_param("user_id", "10854"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "details": {"name": "Rahim", "package_id": 1},
            "packages": [
                {"id": 1, "package_name": "Basic", "bandwidth": "10 Mbps", "price": "500", "pricing_type": "monthly", "status": "active", "visibility": "active"}
            ]
        })))
        .mount(&server)
        .await;

    let overview = client.get_subscription_packages("10854").await.unwrap();
    assert_eq!(overview.current_package.name, "Basic");
    assert!(overview.available_packages.is_empty());
}

#[tokio::test]
async fn test_movie_servers_without_success_status() {
    let (server, client) = setup().await;
    Mock::given(method("GET"))
        .and(path("/movieservers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "failed"})))
        .mount(&server)
        .await;

    let result = client.run_tool(IspTool::ViewMovieServers, &json!({"user_id": "5"})).await;
    assert_eq!(result, json!({"status": "error", "message": "No servers found"}));
}

#[tokio::test]
async fn test_create_ticket_sends_attributed_message() {
    let (server, client) = setup().await;
    Mock::given(method("POST"))
        .and(path("/create_ticket"))
        .and(query_param("user_id", "10854"))
        .and(query_param("priority", "high"))
        .and(query_param(
            "message",
            "Ticket created by AI Assistant for User 10854.\n\nUser Issue: router keeps dropping",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_string("OK"))
        .expect(1)
        .mount(&server)
        .await;

    let ticket = TicketRequest {
        user_id: "10854".to_owned(),
        subject: "Connection drops".to_owned(),
        category: "technical".to_owned(),
        priority: "high".to_owned(),
        message: "router keeps dropping".to_owned(),
    };
    let result = client.create_ticket(&ticket).await.unwrap();
    assert_eq!(result["status"], "success");
}

#[tokio::test]
async fn test_tool_missing_argument() {
    let (_server, client) = setup().await;
    let result = client.run_tool(IspTool::SearchUser, &json!({})).await;
    assert_eq!(result["status"], "error");
    assert_eq!(result["message"], "Error: missing required argument: user_id");
}
