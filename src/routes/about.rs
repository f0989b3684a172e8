use crate::{
    error::Result,
    routes::{page_context, render},
    state::AppState,
    utils::middleware::OptionalAuth,
};
use axum::{extract::State, response::Html, routing::get, Router};
use serde_json::json;
use std::sync::Arc;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/about/author/", get(about_author))
        .route("/about/tech/", get(about_tech))
}

async fn about_author(
    State(state): State<Arc<AppState>>,
    OptionalAuth(user): OptionalAuth,
) -> Result<Html<String>> {
    let context = page_context(&state, user.as_ref(), "About the author", json!({}));
    render(&state, "about/author", &context)
}

async fn about_tech(
    State(state): State<Arc<AppState>>,
    OptionalAuth(user): OptionalAuth,
) -> Result<Html<String>> {
    let context = page_context(&state, user.as_ref(), "Technologies", json!({}));
    render(&state, "about/tech", &context)
}
