//! Integration tests for the health endpoint

mod common;

#[tokio::test]
async fn health_check_works() {
    let app = common::spawn_app();

    let response = reqwest::Client::new()
        .get(&format!("{}/health_check", app.address))
        .send()
        .await
        .expect("Failed to execute request");

    assert!(response.status().is_success());
    assert_eq!(response.text().await.unwrap(), "OK");
}

#[tokio::test]
async fn unknown_route_returns_404() {
    let app = common::spawn_app();

    let response = reqwest::Client::new()
        .get(&format!("{}/nowhere", app.address))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(404, response.status().as_u16());
}
