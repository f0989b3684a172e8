use crate::{
    error::{AppError, Result},
    models::user::User,
    services::Database,
};
use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;
use tracing::{debug, info};

/// 用户名只允许字母、数字和 `.@+-_`，保证不会与站点自身的路径冲突
static VALID_USERNAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[\w.@+-]{1,150}$").unwrap());

/// 用户服务：维护认证系统用户在本地的映射
#[derive(Clone)]
pub struct UserService {
    db: Arc<Database>,
}

impl UserService {
    /// 创建新的用户服务实例
    pub async fn new(db: Arc<Database>) -> Result<Self> {
        Ok(Self { db })
    }

    /// 获取或创建用户；认证通过的身份第一次出现时落库
    pub async fn ensure_user(&self, username: &str, display_name: Option<&str>) -> Result<User> {
        if !VALID_USERNAME.is_match(username) {
            return Err(AppError::Authentication(format!("Invalid username: {:?}", username)));
        }

        let inserted = sqlx::query(
            "INSERT INTO users (username, display_name, created_at) VALUES (?, ?, ?) \
             ON CONFLICT (username) DO NOTHING",
        )
        .bind(username)
        .bind(display_name)
        .bind(Utc::now())
        .execute(&self.db.pool)
        .await?
        .rows_affected();

        if inserted > 0 {
            info!("Registered local user record for {}", username);
        }

        self.find_by_username(username)
            .await?
            .ok_or_else(|| AppError::internal("User vanished right after insert"))
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, display_name, created_at FROM users WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(&self.db.pool)
        .await?;
        Ok(user)
    }

    /// 按用户名查找，不存在时返回 404
    pub async fn get_by_username(&self, username: &str) -> Result<User> {
        debug!("Resolving user by username: {}", username);
        self.find_by_username(username)
            .await?
            .ok_or_else(|| AppError::not_found("User"))
    }

    /// 删除用户，其帖子、评论和关注关系随之级联删除
    pub async fn delete_user(&self, user_id: i64) -> Result<()> {
        let deleted = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(user_id)
            .execute(&self.db.pool)
            .await?
            .rows_affected();

        if deleted == 0 {
            return Err(AppError::not_found("User"));
        }

        info!("Deleted user {}", user_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    async fn service() -> UserService {
        let db = Database::new(&Config::default()).await.unwrap();
        db.migrate().await.unwrap();
        UserService::new(Arc::new(db)).await.unwrap()
    }

    #[tokio::test]
    async fn test_ensure_user_rejects_invalid_usernames() {
        let users = service().await;
        let too_long = "x".repeat(151);
        for username in ["", "~", "a b", "leo/1", too_long.as_str()] {
            assert!(matches!(
                users.ensure_user(username, None).await,
                Err(AppError::Authentication(_))
            ));
        }
        assert!(users.ensure_user("leo.t@x+y-z_1", None).await.is_ok());
    }

    #[tokio::test]
    async fn test_ensure_user_is_idempotent() {
        let users = service().await;
        let first = users.ensure_user("leo", Some("Leo")).await.unwrap();
        let second = users.ensure_user("leo", None).await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(second.display_name.as_deref(), Some("Leo"));
    }

    #[tokio::test]
    async fn test_unknown_username_is_not_found() {
        let users = service().await;
        let err = users.get_by_username("ghost").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_delete_user() {
        let users = service().await;
        let user = users.ensure_user("leo", None).await.unwrap();
        users.delete_user(user.id).await.unwrap();
        assert!(users.find_by_username("leo").await.unwrap().is_none());
        assert!(matches!(users.delete_user(user.id).await, Err(AppError::NotFound(_))));
    }
}
