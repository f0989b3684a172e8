pub mod about;
pub mod comments;
pub mod follows;
pub mod posts;

use crate::{
    error::{AppError, Result},
    models::user::User,
    state::AppState,
    utils::middleware::{
        auth_middleware, error_page_middleware, panic_response, request_logging_middleware,
    },
};
use axum::{
    extract::DefaultBodyLimit,
    middleware,
    response::Html,
    routing::get,
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::{catch_panic::CatchPanicLayer, services::ServeDir};

/// 健康检查路径；`~` 不会出现在用户名中
pub const HEALTH_PATH: &str = "/~/health";

/// 构建完整的应用路由
pub fn app_router(state: Arc<AppState>) -> Router {
    let media_url = match state.config.media_url.trim_end_matches('/') {
        "" => "/media".to_string(),
        url => url.to_string(),
    };

    let routes = Router::new()
        .route(HEALTH_PATH, get(health_check))
        .merge(posts::router())
        .merge(comments::router())
        .merge(follows::router())
        .merge(about::router())
        .nest_service(&media_url, ServeDir::new(&state.config.media_root))
        .fallback(not_found);

    with_page_layers(routes, state.clone()).with_state(state)
}

/// 页面路由共用的中间件栈，由内到外：请求体上限、panic 兜底、错误页、认证、日志
fn with_page_layers(
    routes: Router<Arc<AppState>>,
    state: Arc<AppState>,
) -> Router<Arc<AppState>> {
    // 留出表单其他字段的空间
    let body_limit = state.config.max_upload_size + 64 * 1024;

    routes
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(middleware::from_fn_with_state(state.clone(), error_page_middleware))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .layer(middleware::from_fn(request_logging_middleware))
}

async fn health_check() -> &'static str {
    "Rainbow-Posts is running!"
}

async fn not_found() -> AppError {
    AppError::not_found("Page")
}

/// 所有页面共用的模板上下文，`extra` 中的键会覆盖默认值
pub(crate) fn page_context(state: &AppState, user: Option<&User>, title: &str, extra: Value) -> Value {
    let mut context = json!({
        "title": title,
        "user": user,
        "media_url": state.config.media_url.trim_end_matches('/'),
    });

    if let (Some(base), Value::Object(extra)) = (context.as_object_mut(), extra) {
        base.extend(extra);
    }
    context
}

pub(crate) fn render(state: &AppState, template: &str, context: &Value) -> Result<Html<String>> {
    Ok(Html(state.template_service.render(template, context)?))
}

/// 路由中的帖子 id；非数字按不存在处理
pub(crate) fn parse_post_id(raw: &str) -> Result<i64> {
    raw.parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| AppError::not_found("Post"))
}

pub(crate) fn profile_url(username: &str) -> String {
    format!("/{}/", urlencoding::encode(username))
}

pub(crate) fn post_url(username: &str, post_id: i64) -> String {
    format!("/{}/{}/", urlencoding::encode(username), post_id)
}
