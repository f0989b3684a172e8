use crate::{
    config::Config,
    error::Result,
    services::{
        auth::AuthService,
        comment::CommentService,
        database::Database,
        follow::FollowService,
        group::GroupService,
        media::MediaService,
        post::PostService,
        template::TemplateService,
        user::UserService,
    },
    utils::{cache::PageCache, pagination::Paginator},
};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// 应用程序的共享状态
/// 包含所有服务和配置的引用
#[derive(Clone)]
pub struct AppState {
    /// 应用配置
    pub config: Config,

    /// 数据库连接
    pub db: Arc<Database>,

    /// 认证服务
    pub auth_service: AuthService,

    /// 用户服务
    pub user_service: UserService,

    /// 社区服务
    pub group_service: GroupService,

    /// 帖子服务
    pub post_service: PostService,

    /// 评论服务
    pub comment_service: CommentService,

    /// 关注服务
    pub follow_service: FollowService,

    /// 媒体服务
    pub media_service: MediaService,

    /// 页面模板
    pub template_service: TemplateService,

    /// 首页缓存
    pub page_cache: PageCache,
}

/// 需要分页的列表页
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Listing {
    Index,
    Group,
    Profile,
    Follow,
}

impl AppState {
    /// 连接数据库、执行迁移并初始化所有服务
    pub async fn build(config: Config) -> Result<Self> {
        let db = Database::new(&config).await?;
        db.verify_connection().await?;
        db.migrate().await?;
        let db = Arc::new(db);

        let auth_service = AuthService::new(&config).await?;
        let media_service = MediaService::new(&config).await?;
        let user_service = UserService::new(db.clone()).await?;
        let group_service = GroupService::new(db.clone()).await?;
        let post_service = PostService::new(db.clone(), group_service.clone(), media_service.clone()).await?;
        let comment_service = CommentService::new(db.clone()).await?;
        let follow_service = FollowService::new(db.clone()).await?;
        let template_service = TemplateService::new()?;
        let page_cache = PageCache::new(Duration::from_secs(config.index_cache_ttl));

        info!("Application state initialized");

        Ok(Self {
            config,
            db,
            auth_service,
            user_service,
            group_service,
            post_service,
            comment_service,
            follow_service,
            media_service,
            template_service,
            page_cache,
        })
    }

    /// 获取列表页的分页器
    pub fn paginator(&self, listing: Listing) -> Paginator {
        match listing {
            Listing::Index | Listing::Follow => Paginator::new(self.config.default_posts_per_page),
            Listing::Group | Listing::Profile => {
                Paginator::new(self.config.default_group_posts_per_page)
            }
        }
    }
}
