pub mod auth;
pub mod comment;
pub mod database;
pub mod follow;
pub mod group;
pub mod media;
pub mod post;
pub mod template;
pub mod user;

// 重新导出常用类型
pub use auth::AuthService;
pub use comment::CommentService;
pub use database::Database;
pub use follow::FollowService;
pub use group::GroupService;
pub use media::MediaService;
pub use post::{PostFilter, PostService};
pub use template::TemplateService;
pub use user::UserService;
