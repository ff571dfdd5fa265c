//! Router assembly. Every entity type gets the same five routes; the
//! session middleware decodes the cookie before any handler runs.

use std::sync::Arc;

use axum::routing::{get, post};
use axum::{Extension, Router, middleware};
use trellis_session::{SessionLayerState, session_middleware};

use crate::domain::service::Catalog;

use super::handlers;

pub fn router(catalog: Arc<Catalog>, session: SessionLayerState) -> Router {
    Router::new()
        .route(
            "/blocks",
            get(handlers::list_blocks).post(handlers::create_block),
        )
        .route(
            "/blocks/{id}",
            get(handlers::get_block)
                .put(handlers::update_block)
                .delete(handlers::delete_block),
        )
        .route(
            "/elements",
            get(handlers::list_elements).post(handlers::create_element),
        )
        .route(
            "/elements/{id}",
            get(handlers::get_element)
                .put(handlers::update_element)
                .delete(handlers::delete_element),
        )
        .route(
            "/sections",
            get(handlers::list_sections).post(handlers::create_section),
        )
        .route(
            "/sections/{id}",
            get(handlers::get_section)
                .put(handlers::update_section)
                .delete(handlers::delete_section),
        )
        .route(
            "/points",
            get(handlers::list_points).post(handlers::create_point),
        )
        .route(
            "/points/{id}",
            get(handlers::get_point)
                .put(handlers::update_point)
                .delete(handlers::delete_point),
        )
        .route(
            "/users",
            get(handlers::list_users).post(handlers::create_user),
        )
        .route(
            "/users/{id}",
            get(handlers::get_user)
                .put(handlers::update_user)
                .delete(handlers::delete_user),
        )
        .route(
            "/groups",
            get(handlers::list_groups).post(handlers::create_group),
        )
        .route(
            "/groups/{id}",
            get(handlers::get_group)
                .put(handlers::update_group)
                .delete(handlers::delete_group),
        )
        .route(
            "/files",
            get(handlers::list_files).post(handlers::create_file),
        )
        .route(
            "/files/{id}",
            get(handlers::get_file)
                .put(handlers::update_file)
                .delete(handlers::delete_file),
        )
        .route("/auth/register", post(handlers::register))
        .route("/auth/login", post(handlers::login))
        .route("/auth/logout", post(handlers::logout))
        .layer(middleware::from_fn_with_state(
            session.clone(),
            session_middleware,
        ))
        .layer(Extension(catalog))
        .layer(Extension(session))
}
