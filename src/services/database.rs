use crate::config::Config;
use crate::error::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use tracing::{debug, error, info};

/// 数据库服务
#[derive(Clone)]
pub struct Database {
    pub pool: SqlitePool,
}

impl Database {
    /// 创建新的数据库实例
    pub async fn new(config: &Config) -> Result<Self> {
        info!("Initializing database connection to {}", config.database_url);

        let options = SqliteConnectOptions::from_str(&config.database_url)?
            .create_if_missing(true)
            .foreign_keys(true);

        // 内存库每个连接都是独立的数据库，只能保留一个连接
        let max_connections = if config.is_in_memory_database() {
            1
        } else {
            config.database_max_connections.max(1)
        };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .min_connections(if config.is_in_memory_database() { 1 } else { 0 })
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        Ok(Self { pool })
    }

    /// 验证数据库连接
    pub async fn verify_connection(&self) -> Result<()> {
        match sqlx::query("SELECT 1").execute(&self.pool).await {
            Ok(_) => {
                info!("Database connection verified successfully");
                Ok(())
            }
            Err(e) => {
                error!("Failed to verify database connection: {}", e);
                Err(e.into())
            }
        }
    }

    /// 执行内嵌的迁移脚本
    pub async fn migrate(&self) -> Result<()> {
        debug!("Running database migrations");
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        info!("Database migrations applied");
        Ok(())
    }

    /// 统计查询结果条数
    pub async fn count(&self, sql: &str, bind: Option<i64>) -> Result<i64> {
        let mut query = sqlx::query_scalar::<_, i64>(sql);
        if let Some(value) = bind {
            query = query.bind(value);
        }
        Ok(query.fetch_one(&self.pool).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_database_connection() {
        let config = Config::default();
        let db = Database::new(&config).await.unwrap();
        assert!(db.verify_connection().await.is_ok());
    }

    #[tokio::test]
    async fn test_migrations_create_schema() {
        let db = Database::new(&Config::default()).await.unwrap();
        db.migrate().await.unwrap();

        let tables = db
            .count(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' \
                 AND name IN ('users', 'communities', 'posts', 'comments', 'follows')",
                None,
            )
            .await
            .unwrap();
        assert_eq!(tables, 5);
    }

    #[tokio::test]
    async fn test_in_memory_pool_keeps_state_between_queries() {
        let db = Database::new(&Config::default()).await.unwrap();
        db.migrate().await.unwrap();

        sqlx::query("INSERT INTO users (username, created_at) VALUES ('leo', '2024-01-01')")
            .execute(&db.pool)
            .await
            .unwrap();

        let users = db.count("SELECT COUNT(*) FROM users", None).await.unwrap();
        assert_eq!(users, 1);
    }
}
