use crate::{
    error::{AppError, Result},
    models::group::{CreateGroupRequest, Group},
    services::Database,
    utils::{slug::generate_slug, validation::FormErrors},
};
use std::sync::Arc;
use tracing::{debug, info};
use validator::Validate;

#[derive(Clone)]
pub struct GroupService {
    db: Arc<Database>,
}

impl GroupService {
    pub async fn new(db: Arc<Database>) -> Result<Self> {
        Ok(Self { db })
    }

    /// 创建社区；未提供 slug 时由标题生成
    pub async fn create_group(&self, mut request: CreateGroupRequest) -> Result<Group> {
        request.title = request.title.trim().to_string();
        if request.slug.trim().is_empty() {
            request.slug = generate_slug(&request.title);
        }
        request.validate()?;

        let result = sqlx::query_as::<_, Group>(
            "INSERT INTO communities (title, slug, description) VALUES (?, ?, ?) \
             RETURNING id, title, slug, description",
        )
        .bind(&request.title)
        .bind(&request.slug)
        .bind(&request.description)
        .fetch_one(&self.db.pool)
        .await;

        match result {
            Ok(group) => {
                info!("Created group {} ({})", group.title, group.slug);
                Ok(group)
            }
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                let field = if e.message().contains("slug") { "slug" } else { "title" };
                Err(FormErrors::single(field, format!("Group with this {} already exists.", field)).into())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// 按 slug 查找社区，不存在时返回 404
    pub async fn get_by_slug(&self, slug: &str) -> Result<Group> {
        debug!("Resolving group by slug: {}", slug);
        sqlx::query_as::<_, Group>(
            "SELECT id, title, slug, description FROM communities WHERE slug = ?",
        )
        .bind(slug)
        .fetch_optional(&self.db.pool)
        .await?
        .ok_or_else(|| AppError::not_found("Group"))
    }

    pub async fn exists(&self, group_id: i64) -> Result<bool> {
        let count = self
            .db
            .count("SELECT COUNT(*) FROM communities WHERE id = ?", Some(group_id))
            .await?;
        Ok(count > 0)
    }

    /// 表单下拉框使用的社区列表
    pub async fn list_groups(&self) -> Result<Vec<Group>> {
        let groups = sqlx::query_as::<_, Group>(
            "SELECT id, title, slug, description FROM communities ORDER BY title",
        )
        .fetch_all(&self.db.pool)
        .await?;
        Ok(groups)
    }

    /// 删除社区；帖子保留，只清空其社区引用
    pub async fn delete_group(&self, group_id: i64) -> Result<()> {
        let deleted = sqlx::query("DELETE FROM communities WHERE id = ?")
            .bind(group_id)
            .execute(&self.db.pool)
            .await?
            .rows_affected();

        if deleted == 0 {
            return Err(AppError::not_found("Group"));
        }

        info!("Deleted group {}", group_id);
        Ok(())
    }
}
