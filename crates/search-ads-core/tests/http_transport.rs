//! HTTP transport tests against a local mock server.

use mockito::{Matcher, Server, ServerGuard};
use search_ads_core::api::transport::{CredentialContext, HttpTransport, Transport, TransportError};
use search_ads_core::{Connection, SearchAds, SearchAdsError};
use serde_json::json;

fn transport(server: &ServerGuard) -> HttpTransport {
    HttpTransport::new(&format!("{}/api", server.url()))
        .unwrap()
        .without_client_certificate()
}

#[test]
fn test_get_sends_org_header_and_parses_json() {
    let mut server = Server::new();
    let mock = server
        .mock("GET", "/api/v1/campaigns")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("limit".into(), "5".into()),
            Matcher::UrlEncoded("offset".into(), "0".into()),
        ]))
        .match_header("authorization", "orgId=42")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"data": [{"id": 1, "name": "Promo"}]}"#)
        .create();

    let transport = transport(&server);
    let response = transport
        .get(
            &CredentialContext::default(),
            "v1/campaigns?limit=5&offset=0",
            Some("42"),
        )
        .unwrap();

    mock.assert();
    assert_eq!(response["data"][0]["name"], "Promo");
}

#[test]
fn test_put_sends_json_body() {
    let mut server = Server::new();
    let mock = server
        .mock("PUT", "/api/v1/campaigns/7")
        .match_body(Matcher::Json(json!({"status": "PAUSED"})))
        .with_status(200)
        .with_body(r#"{"data": {"id": 7}}"#)
        .create();

    let transport = transport(&server);
    transport
        .put(
            &CredentialContext::default(),
            "v1/campaigns/7",
            &json!({"status": "PAUSED"}),
            None,
        )
        .unwrap();
    mock.assert();
}

#[test]
fn test_error_status_keeps_body() {
    let mut server = Server::new();
    server
        .mock("POST", "/api/v1/campaigns")
        .with_status(400)
        .with_body(r#"{"error": {"errors": [{"message": "bad budget"}]}}"#)
        .create();

    let transport = transport(&server);
    let result = transport.post(&CredentialContext::default(), "v1/campaigns", &json!({}), None);
    match result {
        Err(TransportError::Status { status, body }) => {
            assert_eq!(status, 400);
            assert!(body.contains("bad budget"));
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

#[test]
fn test_empty_body_is_null() {
    let mut server = Server::new();
    server.mock("PUT", "/api/v1/x").with_status(204).create();

    let transport = transport(&server);
    let response = transport
        .put(&CredentialContext::default(), "v1/x", &json!({}), None)
        .unwrap();
    assert!(response.is_null());
}

#[test]
fn test_non_json_body_is_a_decode_error() {
    let mut server = Server::new();
    server
        .mock("GET", "/api/v1/acls")
        .with_status(200)
        .with_body("<html>maintenance</html>")
        .create();

    let transport = transport(&server);
    let result = transport.get(&CredentialContext::default(), "v1/acls", None);
    assert!(matches!(result, Err(TransportError::Decode { .. })));
}

#[test]
fn test_rejected_write_through_connection() {
    let mut server = Server::new();
    server
        .mock("PUT", "/api/v1/campaigns/7")
        .with_status(400)
        .with_body(r#"{"error": "INVALID"}"#)
        .create();

    let transport = transport(&server);
    let connection = Connection::new(&transport, CredentialContext::default());
    match connection.put("campaigns/7", &json!({})) {
        Err(SearchAdsError::RemoteWrite { endpoint, response }) => {
            assert_eq!(endpoint, "v1/campaigns/7");
            assert!(response.contains("INVALID"));
        }
        other => panic!("expected remote write error, got {other:?}"),
    }
}

#[test]
fn test_client_connects_over_http() {
    let mut server = Server::new();
    let acls = server
        .mock("GET", "/api/v1/acls")
        .with_status(200)
        .with_body(r#"{"data": [{"orgName": "Acme", "orgId": 314}]}"#)
        .create();
    let campaigns = server
        .mock("GET", "/api/v1/campaigns")
        .match_query(Matcher::Any)
        .match_header("authorization", "orgId=314")
        .with_status(200)
        .with_body(r#"{"data": []}"#)
        .create();

    let transport = transport(&server);
    let client = SearchAds::connect(
        Connection::new(&transport, CredentialContext::default()),
        "Acme",
    )
    .unwrap();
    assert!(client.get_campaigns(100).unwrap().is_empty());

    acls.assert();
    campaigns.assert();
}

#[test]
fn test_missing_certificate_fails_before_sending() {
    let server = Server::new();
    let transport = HttpTransport::new(&format!("{}/api", server.url())).unwrap();
    let result = transport.get(
        &CredentialContext::from_paths("/nonexistent/cert.pem", "/nonexistent/key.pem"),
        "v1/acls",
        None,
    );
    assert!(matches!(result, Err(TransportError::Credentials(_))));
}
