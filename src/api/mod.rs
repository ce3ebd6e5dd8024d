// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{routing::get, Router};
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    error::{ApiError, ErrorDocument, ErrorObject, ErrorSource},
    models::{
        CreateLoginItemRequest, LoginItemApi, LoginItemAttributes, LoginItemDocument,
        LoginItemInput, LoginItemListDocument, LoginItemResource, NewLoginItemResource,
        UpdateLoginItemRequest,
    },
    state::AppState,
};

pub mod health;
pub mod logins;

/// Path of the generated OpenAPI document.
pub const OPENAPI_PATH: &str = "/api/v1.0/openapi.json";

pub fn router(state: AppState) -> Router {
    let v1_routes = Router::new()
        .route(
            "/logins",
            get(logins::list_login_items).post(logins::create_login_item),
        )
        .route(
            "/logins/{id}",
            get(logins::get_login_item)
                .patch(logins::update_login_item)
                .delete(logins::delete_login_item),
        );

    let health_routes = Router::new()
        .route("/live", get(health::liveness))
        .route("/ready", get(health::readiness));

    Router::new()
        .nest("/api/v1.0", v1_routes)
        .nest("/health", health_routes)
        .fallback(|| async { ApiError::not_found() })
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url(OPENAPI_PATH, ApiDoc::openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id()),
        )
        .layer(CorsLayer::permissive())
}

/// Registers the bearer token scheme referenced by the login endpoints.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        logins::list_login_items,
        logins::create_login_item,
        logins::get_login_item,
        logins::update_login_item,
        logins::delete_login_item,
        health::liveness,
        health::readiness
    ),
    components(
        schemas(
            LoginItemApi,
            LoginItemAttributes,
            LoginItemDocument,
            LoginItemListDocument,
            LoginItemInput,
            CreateLoginItemRequest,
            NewLoginItemResource,
            UpdateLoginItemRequest,
            LoginItemResource,
            ErrorDocument,
            ErrorObject,
            ErrorSource,
            health::HealthResponse,
            health::ReadyResponse,
            health::HealthChecks
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Logins", description = "Encrypted login item management"),
        (name = "Health", description = "Liveness and readiness probes")
    )
)]
struct ApiDoc;
