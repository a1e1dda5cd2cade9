// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! NodeBB forum REST client.
//!
//! One [`ForumClient`] is built at startup from [`AppConfig`] and shared by
//! every handler. Calls are never retried; each failure is reported once,
//! tagged by [`ForumError`] so handlers can map it to a status without
//! guessing.

use std::time::Duration;

use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, COOKIE, SET_COOKIE},
    Client, Method, StatusCode,
};
use serde_json::Value;
use tracing::{error, info, warn};
use url::Url;

use crate::config::AppConfig;

/// Header carrying the anti-forgery token, inbound and upstream.
pub const CSRF_HEADER: &str = "x-csrf-token";

#[derive(Debug, thiserror::Error)]
pub enum ForumError {
    /// The forum answered with a non-2xx status.
    #[error("forum returned {status}")]
    Status { status: StatusCode, body: Value },

    /// No response was received (connect failure, timeout, reset).
    #[error("forum unreachable: {0}")]
    Unreachable(String),

    #[error("forum response was invalid: {0}")]
    InvalidResponse(String),

    #[error("forum request could not be built: {0}")]
    Request(String),
}

impl ForumError {
    /// HTTP status the gateway answers with for this failure.
    ///
    /// Upstream statuses pass through unchanged.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ForumError::Status { status, .. } => *status,
            ForumError::Unreachable(_) => StatusCode::GATEWAY_TIMEOUT,
            ForumError::InvalidResponse(_) | ForumError::Request(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn from_transport(method: &Method, path: &str, err: reqwest::Error) -> Self {
        if err.is_builder() {
            ForumError::Request(format!("{method} {path}: {err}"))
        } else if err.is_decode() {
            ForumError::InvalidResponse(format!("{method} {path}: {err}"))
        } else {
            ForumError::Unreachable(format!("{method} {path}: {err}"))
        }
    }
}

/// Headers forwarded to the forum on behalf of a caller.
///
/// Built fresh for every inbound request. Session values are kept as the
/// exact [`HeaderValue`]s received so they reach the forum byte-for-byte.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ForwardedHeaders(HeaderMap);

impl ForwardedHeaders {
    /// Session credentials: the raw `Cookie` header plus the CSRF token.
    pub fn session(cookie: HeaderValue, csrf_token: HeaderValue) -> Self {
        let mut headers = HeaderMap::with_capacity(2);
        headers.insert(COOKIE, cookie);
        headers.insert(CSRF_HEADER, csrf_token);
        Self(headers)
    }

    /// Privileged service-to-service credentials.
    pub fn service(bearer_token: &str) -> Result<Self, ForumError> {
        let mut value = HeaderValue::from_str(&format!("Bearer {bearer_token}"))
            .map_err(|_| ForumError::Request("bearer token is not a valid header value".into()))?;
        value.set_sensitive(true);

        let mut headers = HeaderMap::with_capacity(1);
        headers.insert(AUTHORIZATION, value);
        Ok(Self(headers))
    }

    /// No credentials at all (anonymous calls).
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn cookie(&self) -> Option<&HeaderValue> {
        self.0.get(COOKIE)
    }

    pub fn csrf_token(&self) -> Option<&HeaderValue> {
        self.0.get(CSRF_HEADER)
    }

    pub fn as_map(&self) -> &HeaderMap {
        &self.0
    }
}

/// A single call to the forum.
pub struct ForumRequest<'a> {
    pub method: Method,
    pub path: &'a str,
    pub headers: &'a ForwardedHeaders,
    /// Raw query string (without the leading `?`).
    pub query: Option<&'a str>,
    pub body: Option<&'a Value>,
}

impl<'a> ForumRequest<'a> {
    pub fn new(method: Method, path: &'a str, headers: &'a ForwardedHeaders) -> Self {
        Self {
            method,
            path,
            headers,
            query: None,
            body: None,
        }
    }

    pub fn query(mut self, query: &'a str) -> Self {
        self.query = Some(query);
        self
    }

    pub fn json(mut self, body: &'a Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// A received forum response.
#[derive(Debug, Clone)]
pub struct ForumResponse {
    pub status: StatusCode,
    /// Every `Set-Cookie` header, in order.
    pub set_cookies: Vec<String>,
    /// JSON body; `Null` when empty, a JSON string when not JSON.
    pub body: Value,
}

#[derive(Debug, Clone)]
pub struct ForumClient {
    base_url: Url,
    http: Client,
}

impl ForumClient {
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self, ForumError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ForumError::Request(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { base_url, http })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, ForumError> {
        Self::new(config.forum_base_url.clone(), config.forum_timeout)
    }

    pub async fn get(
        &self,
        path: &str,
        headers: &ForwardedHeaders,
    ) -> Result<ForumResponse, ForumError> {
        self.send(ForumRequest::new(Method::GET, path, headers)).await
    }

    pub async fn post(
        &self,
        path: &str,
        headers: &ForwardedHeaders,
        body: &Value,
    ) -> Result<ForumResponse, ForumError> {
        self.send(ForumRequest::new(Method::POST, path, headers).json(body))
            .await
    }

    pub async fn put(
        &self,
        path: &str,
        headers: &ForwardedHeaders,
        body: &Value,
    ) -> Result<ForumResponse, ForumError> {
        self.send(ForumRequest::new(Method::PUT, path, headers).json(body))
            .await
    }

    pub async fn patch(
        &self,
        path: &str,
        headers: &ForwardedHeaders,
        body: &Value,
    ) -> Result<ForumResponse, ForumError> {
        self.send(ForumRequest::new(Method::PATCH, path, headers).json(body))
            .await
    }

    /// Perform a call and fail with [`ForumError::Status`] on non-2xx.
    pub async fn send(&self, request: ForumRequest<'_>) -> Result<ForumResponse, ForumError> {
        let method = request.method.clone();
        let path = request.path.to_string();
        let response = self.send_raw(request).await?;

        if !response.status.is_success() {
            warn!(
                method = %method,
                path = %path,
                status = response.status.as_u16(),
                body = %response.body,
                "forum returned an error"
            );
            return Err(ForumError::Status {
                status: response.status,
                body: response.body,
            });
        }

        Ok(response)
    }

    /// Perform a call and return whatever the forum answered.
    pub async fn send_raw(&self, request: ForumRequest<'_>) -> Result<ForumResponse, ForumError> {
        let ForumRequest {
            method,
            path,
            headers,
            query,
            body,
        } = request;

        let mut url = self.endpoint(path);
        if let Some(query) = query.filter(|q| !q.is_empty()) {
            url.push('?');
            url.push_str(query);
        }

        let mut builder = self
            .http
            .request(method.clone(), url)
            .headers(headers.as_map().clone());
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| {
            let err = ForumError::from_transport(&method, path, e);
            error!(method = %method, path = %path, error = %err, "forum call failed");
            err
        })?;

        let status = response.status();
        info!(method = %method, path = %path, status = status.as_u16(), "forum call");

        let set_cookies = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .map(str::to_string)
            .collect();

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ForumError::from_transport(&method, path, e))?;

        Ok(ForumResponse {
            status,
            set_cookies,
            body: decode_body(&bytes),
        })
    }

    /// Anonymous `GET /api/config`, used by readiness probes.
    pub async fn probe(&self) -> Result<(), ForumError> {
        self.get("/api/config", &ForwardedHeaders::anonymous())
            .await
            .map(|_| ())
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

fn decode_body(bytes: &[u8]) -> Value {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Value::Null;
    }
    serde_json::from_slice(bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> ForumClient {
        ForumClient::new(Url::parse(&server.uri()).unwrap(), Duration::from_secs(5)).unwrap()
    }

    fn session_headers() -> ForwardedHeaders {
        ForwardedHeaders::session(
            HeaderValue::from_static("express.sid=s%3Aabc.def; theme=dark"),
            HeaderValue::from_static("csrf-123"),
        )
    }

    #[tokio::test]
    async fn get_forwards_session_headers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/notifications"))
            .and(header("x-csrf-token", "csrf-123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"notifications": []})))
            .expect(1)
            .mount(&server)
            .await;

        let response = client_for(&server)
            .get("/api/notifications", &session_headers())
            .await
            .unwrap();

        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body, json!({"notifications": []}));

        let received = server.received_requests().await.unwrap();
        assert_eq!(
            received[0].headers.get("cookie").unwrap().as_bytes(),
            b"express.sid=s%3Aabc.def; theme=dark"
        );
    }

    #[tokio::test]
    async fn non_success_status_is_surfaced_with_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/user/uid/42"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({"error": "no-user"})))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .get("/api/user/uid/42", &session_headers())
            .await
            .unwrap_err();

        match err {
            ForumError::Status { status, body } => {
                assert_eq!(status, StatusCode::NOT_FOUND);
                assert_eq!(body, json!({"error": "no-user"}));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn send_raw_does_not_fail_on_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v3/utilities/login"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({
                "status": {"code": "forbidden", "message": "bad credentials"}
            })))
            .mount(&server)
            .await;

        let headers = session_headers();
        let body = json!({"username": "alice", "password": "wrong"});
        let response = client_for(&server)
            .send_raw(ForumRequest::new(Method::POST, "/api/v3/utilities/login", &headers).json(&body))
            .await
            .unwrap();

        assert_eq!(response.status, StatusCode::FORBIDDEN);
        assert_eq!(response.body["status"]["code"], "forbidden");
    }

    #[tokio::test]
    async fn put_and_patch_send_json_bodies() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/api/v3/users/1/settings"))
            .and(body_json(json!({"settings": {"dailyDigestFreq": "off"}})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": {"code": "ok"}})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("PATCH"))
            .and(path("/api/v3/chats/7"))
            .and(body_json(json!({"name": "renamed"})))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let headers = session_headers();
        client
            .put(
                "/api/v3/users/1/settings",
                &headers,
                &json!({"settings": {"dailyDigestFreq": "off"}}),
            )
            .await
            .unwrap();
        let patched = client
            .patch("/api/v3/chats/7", &headers, &json!({"name": "renamed"}))
            .await
            .unwrap();
        assert_eq!(patched.body, Value::Null);
    }

    #[tokio::test]
    async fn query_string_is_appended_to_unslashed_path() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/recent"))
            .and(query_param("page", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"topics": []})))
            .expect(1)
            .mount(&server)
            .await;

        let headers = session_headers();
        let response = client_for(&server)
            .send(ForumRequest::new(Method::GET, "api/recent", &headers).query("page=2"))
            .await
            .unwrap();
        assert_eq!(response.body, json!({"topics": []}));
    }

    #[tokio::test]
    async fn collects_every_set_cookie_header() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/config"))
            .respond_with(
                ResponseTemplate::new(200)
                    .append_header("set-cookie", "express.sid=s%3A1; Path=/; HttpOnly")
                    .append_header("set-cookie", "theme=dark; Path=/")
                    .set_body_json(json!({"csrf_token": "t"})),
            )
            .mount(&server)
            .await;

        let response = client_for(&server)
            .get("/api/config", &ForwardedHeaders::anonymous())
            .await
            .unwrap();

        assert_eq!(
            response.set_cookies,
            vec!["express.sid=s%3A1; Path=/; HttpOnly", "theme=dark; Path=/"]
        );
    }

    #[tokio::test]
    async fn connection_failure_is_unreachable() {
        // Nothing listens on port 9 of the loopback interface.
        let client = ForumClient::new(
            Url::parse("http://127.0.0.1:9").unwrap(),
            Duration::from_secs(2),
        )
        .unwrap();

        let err = client
            .get("/api/config", &ForwardedHeaders::anonymous())
            .await
            .unwrap_err();
        assert!(matches!(err, ForumError::Unreachable(_)));
        assert_eq!(err.status_code(), StatusCode::GATEWAY_TIMEOUT);
    }

    #[tokio::test]
    async fn slow_forum_hits_the_deadline() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/config"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
            .mount(&server)
            .await;

        let client =
            ForumClient::new(Url::parse(&server.uri()).unwrap(), Duration::from_millis(200)).unwrap();
        let err = client.probe().await.unwrap_err();
        assert!(matches!(err, ForumError::Unreachable(_)));
    }

    #[test]
    fn endpoint_joins_base_url_with_prefix() {
        let client = ForumClient::new(
            Url::parse("http://forum.internal/community/").unwrap(),
            Duration::from_secs(1),
        )
        .unwrap();
        assert_eq!(
            client.endpoint("/api/config"),
            "http://forum.internal/community/api/config"
        );
        assert_eq!(
            client.endpoint("api/config"),
            "http://forum.internal/community/api/config"
        );
    }

    #[test]
    fn status_code_mapping() {
        let passthrough = ForumError::Status {
            status: StatusCode::IM_A_TEAPOT,
            body: Value::Null,
        };
        assert_eq!(passthrough.status_code(), StatusCode::IM_A_TEAPOT);
        assert_eq!(
            ForumError::InvalidResponse("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ForumError::Request("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn service_headers_carry_bearer_token() {
        let headers = ForwardedHeaders::service("master").unwrap();
        assert_eq!(
            headers.as_map().get(AUTHORIZATION).unwrap(),
            "Bearer master"
        );
        assert!(headers.cookie().is_none());
        assert!(headers.csrf_token().is_none());
    }

    #[test]
    fn decode_body_handles_empty_and_text() {
        assert_eq!(decode_body(b""), Value::Null);
        assert_eq!(decode_body(b"  \n"), Value::Null);
        assert_eq!(decode_body(b"{\"a\":1}"), json!({"a": 1}));
        assert_eq!(decode_body(b"Not Found"), json!("Not Found"));
    }
}
