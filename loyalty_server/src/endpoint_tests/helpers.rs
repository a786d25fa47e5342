use std::time::Duration;

use actix_web::{
    http::{header::HeaderMap, StatusCode},
    test,
    test::TestRequest,
    web,
    web::ServiceConfig,
    App,
};
use log::debug;
use tokio_util::sync::CancellationToken;

use crate::{auth::TokenIssuer, config::AuthConfig};

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl TestResponse {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).unwrap_or_else(|e| panic!("Body is not JSON ({e}): {}", self.body))
    }
}

// Creates a test `AuthConfig` for issuing tokens. DO NOT re-use this secret anywhere.
pub fn get_auth_config() -> AuthConfig {
    AuthConfig::new("endpoint-tests-only-9f3c1a7e5b2d", Duration::from_secs(3600), 4)
}

pub fn issue_token(login: &str) -> String {
    TokenIssuer::new(&get_auth_config()).issue_token(login).expect("Failed to issue token")
}

pub fn bearer(login: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {}", issue_token(login)))
}

/// Runs a single request against an app holding the test token issuer plus whatever `configure` adds.
pub async fn call<F>(req: TestRequest, configure: F) -> TestResponse
where F: FnOnce(&mut ServiceConfig) {
    let config = get_auth_config();
    let app = App::new()
        .app_data(web::Data::new(TokenIssuer::new(&config)))
        .app_data(web::Data::new(config))
        .app_data(web::Data::new(CancellationToken::new()))
        .configure(configure);
    let service = test::init_service(app).await;
    debug!("Making request");
    let res = test::call_service(&service, req.to_request()).await;
    let status = res.status();
    let headers = res.headers().clone();
    let body = String::from_utf8_lossy(&test::read_body(res).await).into_owned();
    TestResponse { status, headers, body }
}
