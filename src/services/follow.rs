use crate::{
    error::Result,
    models::follow::FollowStats,
    services::Database,
};
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Clone)]
pub struct FollowService {
    db: Arc<Database>,
}

impl FollowService {
    pub async fn new(db: Arc<Database>) -> Result<Self> {
        Ok(Self { db })
    }

    /// 关注作者；已关注或关注自己时什么也不做，返回是否新建了关注
    pub async fn follow(&self, user_id: i64, author_id: i64) -> Result<bool> {
        debug!("User {} following user {}", user_id, author_id);

        // 防止自己关注自己
        if user_id == author_id {
            return Ok(false);
        }

        let created = sqlx::query(
            "INSERT INTO follows (user_id, author_id) VALUES (?, ?) \
             ON CONFLICT (user_id, author_id) DO NOTHING",
        )
        .bind(user_id)
        .bind(author_id)
        .execute(&self.db.pool)
        .await?
        .rows_affected()
            > 0;

        if created {
            info!("User {} followed user {}", user_id, author_id);
        }
        Ok(created)
    }

    /// 取消关注；不存在的关注关系不算错误
    pub async fn unfollow(&self, user_id: i64, author_id: i64) -> Result<bool> {
        debug!("User {} unfollowing user {}", user_id, author_id);

        let removed = sqlx::query("DELETE FROM follows WHERE user_id = ? AND author_id = ?")
            .bind(user_id)
            .bind(author_id)
            .execute(&self.db.pool)
            .await?
            .rows_affected()
            > 0;

        if removed {
            info!("User {} unfollowed user {}", user_id, author_id);
        }
        Ok(removed)
    }

    pub async fn is_following(&self, user_id: i64, author_id: i64) -> Result<bool> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM follows WHERE user_id = ? AND author_id = ?",
        )
        .bind(user_id)
        .bind(author_id)
        .fetch_one(&self.db.pool)
        .await?;

        Ok(count > 0)
    }

    pub async fn get_follow_stats(&self, author_id: i64, viewer_id: Option<i64>) -> Result<FollowStats> {
        debug!("Getting follow stats for user: {}", author_id);

        let followers_count = self
            .db
            .count("SELECT COUNT(*) FROM follows WHERE author_id = ?", Some(author_id))
            .await?;
        let following_count = self
            .db
            .count("SELECT COUNT(*) FROM follows WHERE user_id = ?", Some(author_id))
            .await?;

        let is_following = match viewer_id {
            Some(viewer) if viewer != author_id => self.is_following(viewer, author_id).await?,
            _ => false,
        };

        Ok(FollowStats {
            followers_count,
            following_count,
            is_following,
        })
    }
}
