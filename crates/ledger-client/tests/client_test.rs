//! Ledger client integration tests against a mock HTTP backend

use ledger_client::{
    ActivateSubscriptionRequest, AddCreditsRequest, ClientConfig, ClientError, LedgerClient,
    UpdateContactViews,
};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> LedgerClient {
    LedgerClient::new(ClientConfig {
        base_url: server.uri(),
        api_key: Some("test-key".to_string()),
        timeout_secs: 5,
    })
    .unwrap()
}

#[tokio::test]
async fn test_get_contact_views() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/contact-views/user-1"))
        .and(header("authorization", "Bearer test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "contactViews": 2,
            "viewedContacts": ["a", "b"],
            "hasUnlimitedContacts": false,
            "contactCredits": 14
        })))
        .expect(1)
        .mount(&server)
        .await;

    let views = client_for(&server)
        .get_contact_views("user-1")
        .await
        .unwrap()
        .expect("record present");

    assert_eq!(views.contact_views, 2);
    assert_eq!(views.viewed_contacts, vec!["a", "b"]);
    assert_eq!(views.contact_credits, 14);
}

#[tokio::test]
async fn test_get_contact_views_not_found_is_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/contact-views/new-user"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let views = client_for(&server).get_contact_views("new-user").await.unwrap();
    assert!(views.is_none());
}

#[tokio::test]
async fn test_get_contact_views_malformed_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/contact-views/user-1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .get_contact_views("user-1")
        .await
        .unwrap_err();
    assert!(err.is_malformed(), "unexpected error: {err}");
}

#[tokio::test]
async fn test_put_contact_views_sends_whole_record() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/contact-views/user-1"))
        .and(body_json(json!({
            "contactViews": 2,
            "viewedContacts": ["a", "b"]
        })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    client_for(&server)
        .put_contact_views(
            "user-1",
            &UpdateContactViews {
                contact_views: 2,
                viewed_contacts: vec!["a".to_string(), "b".to_string()],
            },
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn test_put_contact_views_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/contact-views/user-1"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .put_contact_views(
            "user-1",
            &UpdateContactViews {
                contact_views: 0,
                viewed_contacts: vec![],
            },
        )
        .await
        .unwrap_err();

    match err {
        ClientError::Server { status, message } => {
            assert_eq!(status, 503);
            assert_eq!(message, "maintenance");
        }
        other => panic!("expected server error, got {other}"),
    }
}

#[tokio::test]
async fn test_add_credits() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/contact-credits/add"))
        .and(body_json(json!({
            "userId": "user-1",
            "credits": 7,
            "amount": 700,
            "currency": "USD"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "contactViews": 3,
            "contactCredits": 14
        })))
        .expect(1)
        .mount(&server)
        .await;

    let balance = client_for(&server)
        .add_credits(&AddCreditsRequest {
            user_id: "user-1".to_string(),
            credits: 7,
            amount: 700,
            currency: "USD".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(balance.contact_views, 3);
    assert_eq!(balance.contact_credits, 14);
}

#[tokio::test]
async fn test_activate_subscription_empty_body_is_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/subscription/activate"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let activation = client_for(&server)
        .activate_subscription(&ActivateSubscriptionRequest {
            user_id: "user-1".to_string(),
            plan: "unlimited-contacts".to_string(),
            duration: "monthly".to_string(),
        })
        .await
        .unwrap();

    assert!(activation.success);
}

#[tokio::test]
async fn test_activate_subscription_reported_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/subscription/activate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "message": "card declined"
        })))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .activate_subscription(&ActivateSubscriptionRequest {
            user_id: "user-1".to_string(),
            plan: "unlimited-contacts".to_string(),
            duration: "monthly".to_string(),
        })
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::Rejected(ref m) if m == "card declined"));
}

#[tokio::test]
async fn test_unreachable_backend_is_transport_error() {
    let client = LedgerClient::new(ClientConfig {
        base_url: "http://127.0.0.1:1".to_string(),
        api_key: None,
        timeout_secs: 2,
    })
    .unwrap();

    let err = client.get_contact_views("user-1").await.unwrap_err();
    assert!(matches!(err, ClientError::Http(_)));
    assert!(!err.is_malformed());
}
