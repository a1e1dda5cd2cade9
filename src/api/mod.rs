// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    http::{header, HeaderName, HeaderValue, Method},
    middleware::from_fn_with_state,
    routing::{any, get, post},
    Router,
};
use tower_http::{
    cors::{AllowHeaders, AllowMethods, CorsLayer, ExposeHeaders},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::middleware::require_session,
    config::AppConfig,
    models::{
        DuplicateUserBody, FieldError, LoginRequest, LoginResponse, LoginUser,
        NotificationCountResponse, SignUpRequest, ValidationErrorBody,
    },
    providers::{Uid, CSRF_HEADER},
    state::AppState,
};

pub mod health;
pub mod proxy;
pub mod user;
pub mod validation;

pub fn router(state: AppState) -> Router {
    let session_routes = Router::new()
        .route("/", get(user::get_profile))
        .route("/admin", get(user::get_admin_profile))
        .route("/notifications", get(user::notification_count))
        .route_layer(from_fn_with_state(state.clone(), require_session));

    let user_routes = Router::new()
        .route("/sign-up", post(user::sign_up))
        .route("/login", post(user::login))
        .merge(session_routes);

    let forum_routes = Router::new()
        .route("/{*path}", any(proxy::forward))
        .route_layer(from_fn_with_state(state.clone(), require_session));

    let v1_routes = Router::new()
        .nest("/user", user_routes)
        .nest("/forum", forum_routes);

    let health_routes = Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness));

    let cors = cors_layer(&state.config);

    Router::new()
        .nest("/v1", v1_routes)
        .merge(health_routes)
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}

/// Explicit origins with credentials when configured, permissive otherwise.
fn cors_layer(config: &AppConfig) -> CorsLayer {
    if config.frontend_origins.is_empty() {
        return CorsLayer::permissive();
    }

    let allowed_origins: Vec<HeaderValue> = config
        .frontend_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();
    let csrf = HeaderName::from_static(CSRF_HEADER);

    CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods(AllowMethods::list([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ]))
        .allow_headers(AllowHeaders::list([
            header::CONTENT_TYPE,
            header::ACCEPT,
            csrf.clone(),
        ]))
        .expose_headers(ExposeHeaders::list([csrf]))
        .allow_credentials(true)
}

#[derive(OpenApi)]
#[openapi(
    paths(
        user::sign_up,
        user::login,
        user::get_profile,
        user::get_admin_profile,
        user::notification_count,
        proxy::forward,
        health::health,
        health::liveness,
        health::readiness
    ),
    components(
        schemas(
            SignUpRequest,
            LoginRequest,
            LoginResponse,
            LoginUser,
            Uid,
            NotificationCountResponse,
            FieldError,
            ValidationErrorBody,
            DuplicateUserBody,
            health::ReadyResponse,
            health::HealthChecks,
            health::HealthResponse
        )
    ),
    tags(
        (name = "User", description = "Sign-up, login and forum session routes"),
        (name = "Forum", description = "Pass-through to the forum API"),
        (name = "Health", description = "Liveness and readiness probes")
    )
)]
struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    fn state() -> AppState {
        AppState::in_memory(AppConfig::for_forum("http://forum.invalid").unwrap()).unwrap()
    }

    #[tokio::test]
    async fn router_builds_with_all_routes() {
        let app = router(state());
        // Ensure the router can be converted into a service without panicking.
        let _ = app.into_make_service();
    }

    #[tokio::test]
    async fn openapi_document_lists_user_routes() {
        let response = router(state())
            .oneshot(
                Request::get("/api-doc/openapi.json")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let doc: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        for path in ["/v1/user/login", "/v1/user/sign-up", "/v1/user/notifications"] {
            assert!(doc["paths"].get(path).is_some(), "{path} missing");
        }
    }

    #[test]
    fn openapi_document_describes_forum_passthrough() {
        let doc = serde_json::to_value(ApiDoc::openapi()).unwrap();
        let forward = &doc["paths"]["/v1/forum/{path}"]["get"];
        assert_eq!(forward["tags"][0], "Forum");
        assert!(forward["requestBody"]["content"]
            .get("application/json")
            .is_some());
    }

    #[tokio::test]
    async fn responses_carry_request_id() {
        let response = router(state())
            .oneshot(Request::get("/health/live").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn configured_origins_allow_credentials() {
        let mut config = AppConfig::for_forum("http://forum.invalid").unwrap();
        config.frontend_origins = vec!["https://app.example.com".to_string()];
        let app = router(AppState::in_memory(config).unwrap());

        let response = app
            .oneshot(
                Request::get("/health/live")
                    .header("origin", "https://app.example.com")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(
            response.headers()["access-control-allow-origin"],
            "https://app.example.com"
        );
        assert_eq!(response.headers()["access-control-allow-credentials"], "true");
    }
}
