use crate::{
    error::Result,
    models::comment::{CommentForm, CommentSubmission},
    routes::{parse_post_id, post_url},
    state::AppState,
    utils::middleware::RequireAuth,
};
use axum::{
    extract::{Path, State},
    response::Redirect,
    routing::post,
    Form, Router,
};
use std::sync::Arc;
use tracing::debug;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/:username/:post_id/comment/", post(add_comment))
}

/// 添加评论；无论表单是否有效都回到帖子详情
/// POST /:username/:post_id/comment/
async fn add_comment(
    State(state): State<Arc<AppState>>,
    RequireAuth(user): RequireAuth,
    Path((username, post_id)): Path<(String, String)>,
    Form(submission): Form<CommentSubmission>,
) -> Result<Redirect> {
    let post_id = parse_post_id(&post_id)?;
    let author = state.user_service.get_by_username(&username).await?;
    let post = state.post_service.get_author_post(author.id, post_id).await?;

    match CommentForm::from_submission(&submission) {
        Ok(form) => {
            state.comment_service.add_comment(post.id, user.id, form).await?;
        }
        Err(errors) => {
            debug!("Discarding invalid comment on post {}: {}", post.id, errors);
        }
    }

    Ok(Redirect::to(&post_url(&author.username, post.id)))
}
