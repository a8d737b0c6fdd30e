//! HTTP provisioning client tests
//!
//! wiremock stands in for the device backend so request shape and response
//! parsing can be checked without a real device.

use device_provisioning::{
    ApiError, DeviceIdentifier, HttpProvisioningApi, PasswordConfirmationValidator,
    ProvisioningApi, ProvisioningResponse, ValidatedPassword,
};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn validated(pin: &str) -> ValidatedPassword {
    let mut validator = PasswordConfirmationValidator::default();
    validator.set_primary(pin);
    validator.set_confirmation(pin);
    validator.validated_password().expect("test PIN should validate")
}

fn client_for(server: &MockServer, timeout: Duration) -> HttpProvisioningApi {
    HttpProvisioningApi::new(&format!("{}/api/", server.uri()), timeout).unwrap()
}

#[tokio::test]
async fn test_posts_password_and_parses_structured_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/devices/device-1/set-password"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({"password": "1234"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "code": "e_device_locked",
            "errorMessage": "locked"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, Duration::from_secs(5));
    let response = client
        .set_password(&DeviceIdentifier::from("device-1"), &validated("1234"))
        .await
        .unwrap();

    assert_eq!(response, ProvisioningResponse::rejected(Some("e_device_locked"), "locked"));
}

#[tokio::test]
async fn test_parses_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/devices/device-2/set-password"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, Duration::from_secs(5));
    let response = client
        .set_password(&DeviceIdentifier::from("device-2"), &validated("0000"))
        .await
        .unwrap();

    assert!(response.success);
    assert!(response.code.is_none());
}

#[tokio::test]
async fn test_error_status_with_json_body_is_still_structured() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "success": false,
            "errorMessage": "internal"
        })))
        .mount(&server)
        .await;

    let client = client_for(&server, Duration::from_secs(5));
    let response = client
        .set_password(&DeviceIdentifier::from("device-3"), &validated("1234"))
        .await
        .unwrap();

    assert!(!response.success);
    assert_eq!(response.error_message.as_deref(), Some("internal"));
}

#[tokio::test]
async fn test_unparsable_body_is_malformed_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
        .mount(&server)
        .await;

    let client = client_for(&server, Duration::from_secs(5));
    let err = client
        .set_password(&DeviceIdentifier::from("device-4"), &validated("1234"))
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::MalformedResponse { status: 200, .. }));
}

#[tokio::test]
async fn test_body_without_success_flag_is_malformed_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(502).set_body_json(json!({"errorMessage": "bad gateway"})))
        .mount(&server)
        .await;

    let client = client_for(&server, Duration::from_secs(5));
    let err = client
        .set_password(&DeviceIdentifier::from("device-5"), &validated("1234"))
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::MalformedResponse { status: 502, .. }));
}

#[tokio::test]
async fn test_timeout_is_request_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"success": true}))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let client = client_for(&server, Duration::from_millis(100));
    let err = client
        .set_password(&DeviceIdentifier::from("device-6"), &validated("1234"))
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::Request { .. }));
}
