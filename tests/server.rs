//! End-to-end over a real TCP listener.

use reqwest::redirect::Policy;
use reqwest::StatusCode;

use pengoe::http::X_REQUEST_ID;

mod common;

fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(Policy::none())
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_sign_in_and_post_over_http() {
    let (addr, app) = common::spawn_server(common::TestApp::new()).await;
    let base = format!("http://{}", addr);
    let client = client();

    let response = client
        .post(format!("{}/signin", base))
        .form(&[("user_id", "21")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert!(response.headers().contains_key(X_REQUEST_ID));
    let cookie = response.headers()["set-cookie"]
        .to_str()
        .unwrap()
        .split(';')
        .next()
        .unwrap()
        .to_string();

    let dashboard: serde_json::Value = client
        .get(format!("{}/dashboard/", base))
        .header("cookie", &cookie)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let csrf = dashboard["csrf"].as_str().unwrap().to_string();

    let response = client
        .post(format!("{}/account", base))
        .header("cookie", &cookie)
        .form(&[("csrf", csrf.as_str()), ("name", "Savings")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    assert_eq!(app.store.len().unwrap(), 1);
}

#[tokio::test]
async fn test_routing_failures_over_http() {
    let (addr, _app) = common::spawn_server(common::TestApp::new()).await;
    let client = client();

    let response = client
        .get(format!("http://{}/signout", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);

    let response = client
        .put(format!("http://{}/signout", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = client
        .get(format!("http://{}/static/site.css", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text().await.unwrap(), "body { margin: 0 }");
}
