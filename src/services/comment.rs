use crate::{
    error::Result,
    models::comment::{Comment, CommentForm, CommentWithAuthor},
    services::Database,
};
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Clone)]
pub struct CommentService {
    db: Arc<Database>,
}

impl CommentService {
    pub async fn new(db: Arc<Database>) -> Result<Self> {
        Ok(Self { db })
    }

    /// 添加评论；帖子和作者由调用方根据路由和当前用户确定
    pub async fn add_comment(&self, post_id: i64, author_id: i64, form: CommentForm) -> Result<Comment> {
        debug!("Adding comment to post {} by user {}", post_id, author_id);

        let comment = sqlx::query_as::<_, Comment>(
            "INSERT INTO comments (post_id, author_id, text, created) VALUES (?, ?, ?, ?) \
             RETURNING id, post_id, author_id, text, created",
        )
        .bind(post_id)
        .bind(author_id)
        .bind(&form.text)
        .bind(Utc::now())
        .fetch_one(&self.db.pool)
        .await?;

        info!("Comment {} created on post {}", comment.id, post_id);
        Ok(comment)
    }

    /// 帖子下的评论，最新的在前
    pub async fn list_for_post(&self, post_id: i64) -> Result<Vec<CommentWithAuthor>> {
        let comments = sqlx::query_as::<_, CommentWithAuthor>(
            "SELECT c.id, c.post_id, c.text, c.created, c.author_id, \
             u.username AS author_username, u.display_name AS author_display_name \
             FROM comments c JOIN users u ON u.id = c.author_id \
             WHERE c.post_id = ? ORDER BY c.created DESC, c.id DESC",
        )
        .bind(post_id)
        .fetch_all(&self.db.pool)
        .await?;
        Ok(comments)
    }
}
