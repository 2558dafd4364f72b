//! Server liveness and readiness.

use reqwest::StatusCode;

use recetario_integration_tests::{base_url, client};

#[tokio::test]
#[ignore = "Requires a running server and database"]
async fn test_health() {
    let resp = client()
        .get(format!("{}/health", base_url()))
        .send()
        .await
        .expect("Failed to reach server");

    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "Requires a running server and database"]
async fn test_readiness_checks_database() {
    let resp = client()
        .get(format!("{}/health/ready", base_url()))
        .send()
        .await
        .expect("Failed to reach server");

    assert_eq!(resp.status(), StatusCode::OK);
}
