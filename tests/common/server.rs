//! Mock remote service

use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Start a mock server whose login endpoint answers with `login_status`
pub async fn start_service(login_status: u16) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .and(body_string_contains("custname=test_username"))
        .respond_with(
            ResponseTemplate::new(login_status).insert_header("Set-Cookie", "sid=s3cr3t; Path=/"),
        )
        .mount(&server)
        .await;
    server
}

/// Serve `body` with `status` for `http_method` requests to `route`, expecting `calls` requests
pub async fn serve(
    server: &MockServer,
    http_method: &str,
    route: &str,
    status: u16,
    body: Vec<u8>,
    calls: u64,
) {
    Mock::given(method(http_method))
        .and(path(route))
        .respond_with(ResponseTemplate::new(status).set_body_bytes(body))
        .expect(calls)
        .mount(server)
        .await;
}
