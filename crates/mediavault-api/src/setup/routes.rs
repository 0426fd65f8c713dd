//! Router construction: routes, auth, CORS, tracing, and body limits.

use anyhow::Result;
use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, Method};
use axum::routing::{delete, get, post, put};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use mediavault_core::Config;

use crate::api_doc::ApiDoc;
use crate::auth::{auth_middleware, AuthState};
use crate::handlers;
use crate::state::AppState;

pub fn build_router(state: Arc<AppState>, config: &Config) -> Result<Router> {
    let auth_state = Arc::new(AuthState::new(&config.jwt_secret));

    let api_routes = Router::new()
        .route("/videos", post(handlers::video_upload::upload_video))
        .route("/videos", get(handlers::video::list_videos))
        .route("/videos/{id}", get(handlers::video::get_video))
        .route("/videos/{id}", delete(handlers::video::delete_video))
        .route(
            "/videos/{id}/thumbnail",
            post(handlers::thumbnail::regenerate_thumbnail),
        )
        .route(
            "/videos/{id}/thumbnail",
            get(handlers::thumbnail::get_thumbnail),
        )
        .route(
            "/videos/{id}/thumbnail/upload",
            post(handlers::thumbnail::upload_thumbnail),
        )
        .route("/files", post(handlers::file_upload::upload_file))
        .route("/files", get(handlers::file_upload::list_files))
        .route("/files/{id}", put(handlers::file_upload::rename_file))
        .route("/files/{id}", delete(handlers::file_upload::delete_file))
        .route(
            "/files/{id}/download",
            get(handlers::file_stream::download_file),
        )
        .route(
            "/files/stream/{id}",
            get(handlers::file_stream::stream_file),
        )
        .route_layer(axum::middleware::from_fn_with_state(
            auth_state,
            auth_middleware,
        ));

    let app = Router::new()
        .route("/health", get(handlers::health::health))
        .route(
            "/api/openapi.json",
            get(|| async { axum::Json(ApiDoc::openapi()) }),
        )
        .nest("/api/v0", api_routes)
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(config.max_upload_size_bytes))
        .layer(setup_cors(config)?)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    Ok(app)
}

fn setup_cors(config: &Config) -> Result<CorsLayer> {
    let methods = [
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::DELETE,
        Method::OPTIONS,
    ];
    let cors = if config.cors_origins.contains(&"*".to_string()) {
        tracing::warn!("CORS configured to allow all origins");
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(Any)
    } else {
        let origins = config
            .cors_origins
            .iter()
            .map(|o| o.parse::<HeaderValue>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| anyhow::anyhow!("Invalid CORS origin: {}", e))?;
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(methods)
            .allow_headers(Any)
    };
    Ok(cors)
}
