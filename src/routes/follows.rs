use crate::{
    error::Result,
    routes::{page_context, profile_url, render},
    services::PostFilter,
    state::{AppState, Listing},
    utils::{
        middleware::RequireAuth,
        pagination::PageQuery,
    },
};
use axum::{
    extract::{Path, Query, State},
    response::{Html, Redirect},
    routing::get,
    Router,
};
use serde_json::json;
use std::sync::Arc;
use tracing::debug;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/follow/", get(follow_index))
        .route("/:username/follow/", get(profile_follow))
        .route("/:username/unfollow/", get(profile_unfollow))
}

/// 关注的作者发布的帖子
/// GET /follow/
async fn follow_index(
    State(state): State<Arc<AppState>>,
    RequireAuth(user): RequireAuth,
    Query(query): Query<PageQuery>,
) -> Result<Html<String>> {
    let page = state
        .post_service
        .list_posts(
            PostFilter::FollowedBy(user.id),
            state.paginator(Listing::Follow),
            query.page.as_deref(),
        )
        .await?;

    let context = page_context(
        &state,
        Some(&user),
        "Posts of the authors you follow",
        json!({ "page": page }),
    );
    render(&state, "posts/follow", &context)
}

/// 关注作者
/// GET /:username/follow/
async fn profile_follow(
    State(state): State<Arc<AppState>>,
    RequireAuth(user): RequireAuth,
    Path(username): Path<String>,
) -> Result<Redirect> {
    let author = state.user_service.get_by_username(&username).await?;

    if user.id == author.id {
        debug!("User {} tried to follow themselves", user.username);
    } else {
        state.follow_service.follow(user.id, author.id).await?;
    }

    Ok(Redirect::to(&profile_url(&author.username)))
}

/// 取消关注
/// GET /:username/unfollow/
async fn profile_unfollow(
    State(state): State<Arc<AppState>>,
    RequireAuth(user): RequireAuth,
    Path(username): Path<String>,
) -> Result<Redirect> {
    let author = state.user_service.get_by_username(&username).await?;
    state.follow_service.unfollow(user.id, author.id).await?;

    Ok(Redirect::to(&profile_url(&author.username)))
}
