use crate::{
    error::{AppError, Result},
    models::post::{Post, PostForm, PostView, INVALID_GROUP_CHOICE},
    services::{Database, GroupService, MediaService},
    utils::{
        image::ImageInfo,
        pagination::{Page, Paginator},
        validation::FormErrors,
    },
};
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info};

/// 帖子列表与详情共用的查询
const POST_VIEW_SELECT: &str = "SELECT p.id, p.text, p.pub_date, p.image, p.author_id, \
     u.username AS author_username, u.display_name AS author_display_name, \
     p.group_id, g.title AS group_title, g.slug AS group_slug, \
     (SELECT COUNT(*) FROM comments c WHERE c.post_id = p.id) AS comment_count \
     FROM posts p \
     JOIN users u ON u.id = p.author_id \
     LEFT JOIN communities g ON g.id = p.group_id";

const POST_COLUMNS: &str = "id, text, pub_date, author_id, group_id, image";

/// 帖子列表的筛选范围
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostFilter {
    All,
    Group(i64),
    Author(i64),
    /// 该用户关注的作者发布的帖子
    FollowedBy(i64),
}

impl PostFilter {
    fn where_clause(&self) -> (&'static str, Option<i64>) {
        match *self {
            PostFilter::All => ("", None),
            PostFilter::Group(id) => (" WHERE p.group_id = ?", Some(id)),
            PostFilter::Author(id) => (" WHERE p.author_id = ?", Some(id)),
            PostFilter::FollowedBy(id) => (
                " WHERE p.author_id IN (SELECT f.author_id FROM follows f WHERE f.user_id = ?)",
                Some(id),
            ),
        }
    }
}

#[derive(Clone)]
pub struct PostService {
    db: Arc<Database>,
    groups: GroupService,
    media: MediaService,
}

impl PostService {
    pub async fn new(db: Arc<Database>, groups: GroupService, media: MediaService) -> Result<Self> {
        Ok(Self { db, groups, media })
    }

    /// 按发布时间倒序分页列出帖子
    pub async fn list_posts(
        &self,
        filter: PostFilter,
        paginator: Paginator,
        requested_page: Option<&str>,
    ) -> Result<Page<PostView>> {
        let (clause, bind) = filter.where_clause();

        let count = self
            .db
            .count(&format!("SELECT COUNT(*) FROM posts p{}", clause), bind)
            .await?;
        let window = paginator.window(requested_page, count.max(0) as usize);
        debug!(
            "Listing posts {:?}: page {}/{} ({} total)",
            filter, window.number, window.num_pages, window.count
        );

        let sql = format!(
            "{}{} ORDER BY p.pub_date DESC, p.id DESC LIMIT ? OFFSET ?",
            POST_VIEW_SELECT, clause
        );
        let mut query = sqlx::query_as::<_, PostView>(&sql);
        if let Some(value) = bind {
            query = query.bind(value);
        }
        let posts = query
            .bind(window.limit() as i64)
            .bind(window.offset() as i64)
            .fetch_all(&self.db.pool)
            .await?;

        Ok(Page::from_window(posts, window))
    }

    /// 帖子详情；只按 id 查找
    pub async fn get_post_view(&self, post_id: i64) -> Result<PostView> {
        sqlx::query_as::<_, PostView>(&format!("{} WHERE p.id = ?", POST_VIEW_SELECT))
            .bind(post_id)
            .fetch_optional(&self.db.pool)
            .await?
            .ok_or_else(|| AppError::not_found("Post"))
    }

    /// 按作者和 id 查找帖子，编辑和评论时使用
    pub async fn get_author_post(&self, author_id: i64, post_id: i64) -> Result<Post> {
        sqlx::query_as::<_, Post>(&format!(
            "SELECT {} FROM posts WHERE id = ? AND author_id = ?",
            POST_COLUMNS
        ))
        .bind(post_id)
        .bind(author_id)
        .fetch_optional(&self.db.pool)
        .await?
        .ok_or_else(|| AppError::not_found("Post"))
    }

    pub async fn count_by_author(&self, author_id: i64) -> Result<i64> {
        self.db
            .count("SELECT COUNT(*) FROM posts WHERE author_id = ?", Some(author_id))
            .await
    }

    /// 创建帖子；作者取自当前登录用户
    pub async fn create_post(&self, author_id: i64, form: PostForm) -> Result<Post> {
        let image_info = self.check_references(&form).await?;

        let image = match (&form.image, image_info) {
            (Some(upload), Some(info)) => Some(self.media.store(upload, &info).await?),
            _ => None,
        };

        let post = sqlx::query_as::<_, Post>(&format!(
            "INSERT INTO posts (text, pub_date, author_id, group_id, image) \
             VALUES (?, ?, ?, ?, ?) RETURNING {}",
            POST_COLUMNS
        ))
        .bind(&form.text)
        .bind(Utc::now())
        .bind(author_id)
        .bind(form.group_id)
        .bind(&image)
        .fetch_one(&self.db.pool)
        .await?;

        info!("Created post {} by user {}", post.id, author_id);
        Ok(post)
    }

    /// 更新正文、社区和图片；发布时间保持不变
    pub async fn update_post(&self, post: &Post, form: PostForm) -> Result<Post> {
        let image_info = self.check_references(&form).await?;

        let image = match (&form.image, image_info) {
            (Some(upload), Some(info)) => Some(self.media.store(upload, &info).await?),
            _ if form.clear_image => None,
            _ => post.image.clone(),
        };

        let updated = sqlx::query_as::<_, Post>(&format!(
            "UPDATE posts SET text = ?, group_id = ?, image = ? WHERE id = ? RETURNING {}",
            POST_COLUMNS
        ))
        .bind(&form.text)
        .bind(form.group_id)
        .bind(&image)
        .bind(post.id)
        .fetch_one(&self.db.pool)
        .await?;

        if let Some(old) = post.image.as_deref() {
            if image.as_deref() != Some(old) {
                self.media.remove(old).await;
            }
        }

        info!("Updated post {}", post.id);
        Ok(updated)
    }

    /// 校验需要查库或读文件的字段：社区是否存在、图片是否有效
    async fn check_references(&self, form: &PostForm) -> Result<Option<ImageInfo>> {
        let mut errors = FormErrors::new();

        if let Some(group_id) = form.group_id {
            if !self.groups.exists(group_id).await? {
                errors.add("group", INVALID_GROUP_CHOICE);
            }
        }

        let image_info = match &form.image {
            Some(upload) => match self.media.validate(upload) {
                Ok(info) => Some(info),
                Err(image_errors) => {
                    errors.merge(image_errors);
                    None
                }
            },
            None => None,
        };

        errors.into_result()?;
        Ok(image_info)
    }
}
