//! Registration, login and the login redirect for protected pages.

use reqwest::StatusCode;

use recetario_integration_tests::{
    base_url, client, manual_redirect_client, register, unique_email,
};

#[tokio::test]
#[ignore = "Requires a running server and database"]
async fn test_register_then_account_page() {
    let client = client();
    let email = unique_email("register");
    register(&client, &email, "Integration Cook").await;

    let resp = client
        .get(format!("{}/account", base_url()))
        .send()
        .await
        .expect("Failed to load account page");

    assert_eq!(resp.status(), StatusCode::OK);
    let body = resp.text().await.expect("Failed to read body");
    assert!(body.contains("Integration Cook"), "profile name missing");
}

#[tokio::test]
#[ignore = "Requires a running server and database"]
async fn test_login_with_wrong_password_is_rejected() {
    let setup = client();
    let email = unique_email("badlogin");
    register(&setup, &email, "Bad Login").await;

    // Fresh client: no session from registration.
    let client = manual_redirect_client();
    let resp = client
        .post(format!("{}/auth/login", base_url()))
        .form(&[("email", email.as_str()), ("password", "not the password")])
        .send()
        .await
        .expect("Failed to send login");

    assert!(resp.status().is_redirection());
    let location = resp
        .headers()
        .get("location")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    assert!(location.contains("error=credentials"), "got {location}");
}

#[tokio::test]
#[ignore = "Requires a running server and database"]
async fn test_protected_page_redirects_to_login_with_next() {
    let client = manual_redirect_client();
    let resp = client
        .get(format!("{}/recipes/new", base_url()))
        .send()
        .await
        .expect("Failed to reach server");

    assert!(resp.status().is_redirection());
    let location = resp
        .headers()
        .get("location")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    assert!(location.starts_with("/auth/login"), "got {location}");
    assert!(location.contains("next="), "got {location}");
}

#[tokio::test]
#[ignore = "Requires a running server and database"]
async fn test_fragment_request_gets_401_not_redirect() {
    let client = manual_redirect_client();
    let resp = client
        .post(format!("{}/recipes/1/like", base_url()))
        .header("hx-request", "true")
        .send()
        .await
        .expect("Failed to reach server");

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "Requires a running server and database"]
async fn test_logout_drops_session() {
    let client = client();
    let email = unique_email("logout");
    register(&client, &email, "Logout Test").await;

    client
        .post(format!("{}/auth/logout", base_url()))
        .send()
        .await
        .expect("Failed to log out");

    // The client follows redirects, so a logged-out /account fetch
    // lands on the login page.
    let resp = client
        .get(format!("{}/account", base_url()))
        .send()
        .await
        .expect("Failed to load account page");

    assert!(
        resp.url().path().starts_with("/auth/login"),
        "still logged in: {}",
        resp.url()
    );
}
