use crate::{
    error::{AppError, ErrorPage},
    models::{
        media::UploadedImage,
        post::PostSubmission,
        user::User,
    },
    state::AppState,
};
use async_trait::async_trait;
use axum::{
    body::Body,
    extract::{FromRequest, FromRequestParts, Multipart, State},
    headers::{authorization::Bearer, Authorization, Cookie, HeaderMapExt},
    http::{header, request::Parts, HeaderMap, Request, StatusCode},
    middleware::Next,
    response::{Html, IntoResponse, Response},
    Form,
};
use serde_json::json;
use std::{any::Any, sync::Arc};
use tracing::{debug, error, info, warn};

/// 认证中间件：校验令牌，并把本地用户放进请求扩展
pub async fn auth_middleware(
    State(app_state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next<Body>,
) -> Response {
    let token = session_token(request.headers(), app_state.auth_service.session_cookie_name());

    if let Some(token) = token {
        match app_state.auth_service.verify_jwt(&token) {
            Ok(claims) => {
                match app_state
                    .user_service
                    .ensure_user(&claims.sub, claims.name.as_deref())
                    .await
                {
                    Ok(user) => {
                        debug!("Authenticated user: {} ({})", user.username, user.id);
                        request.extensions_mut().insert(user);
                    }
                    Err(e) => {
                        // 不返回错误，让请求继续处理（作为未认证请求）
                        warn!("Failed to materialize user {}: {}", claims.sub, e);
                    }
                }
            }
            Err(e) => {
                debug!("JWT verification failed: {}", e);
            }
        }
    }

    next.run(request).await
}

/// 从 Authorization 头或会话 Cookie 中取出令牌
fn session_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    if let Some(Authorization(bearer)) = headers.typed_get::<Authorization<Bearer>>() {
        return Some(bearer.token().to_string());
    }

    headers
        .typed_get::<Cookie>()
        .and_then(|cookie| cookie.get(cookie_name).map(str::to_string))
}

/// 错误页中间件：把带有 `ErrorPage` 标记的响应渲染为 HTML 页面
pub async fn error_page_middleware(
    State(app_state): State<Arc<AppState>>,
    request: Request<Body>,
    next: Next<Body>,
) -> Response {
    let path = request.uri().path().to_string();
    let user = request.extensions().get::<User>().cloned();

    let response = next.run(request).await;

    let status = match response.extensions().get::<ErrorPage>() {
        Some(ErrorPage(status)) => *status,
        None => return response,
    };

    let (template, title) = if status == StatusCode::NOT_FOUND {
        ("misc/404", "Page not found")
    } else if status.is_server_error() {
        ("misc/500", "Server error")
    } else {
        return response;
    };

    let context = json!({
        "title": title,
        "path": path,
        "user": user,
    });

    match app_state.template_service.render(template, &context) {
        Ok(body) => (status, Html(body)).into_response(),
        Err(e) => {
            warn!("Failed to render error page {}: {}", template, e);
            response
        }
    }
}

/// handler panic 时的响应：带上 `ErrorPage` 标记，由错误页中间件渲染 500 页面
pub fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    error!("Handler panicked: {}", detail);
    AppError::internal("Handler panicked").into_response()
}

/// 请求日志中间件
pub async fn request_logging_middleware(request: Request<Body>, next: Next<Body>) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();

    let start_time = std::time::Instant::now();

    debug!("Incoming request: {} {}", method, uri);

    let response = next.run(request).await;

    let elapsed = start_time.elapsed();
    let status = response.status();

    info!(
        "Request completed: {} {} {} - {}ms",
        method,
        uri,
        status.as_u16(),
        elapsed.as_millis()
    );

    response
}

/// 可选的当前用户
pub struct OptionalAuth(pub Option<User>);

#[async_trait]
impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(OptionalAuth(parts.extensions.get::<User>().cloned()))
    }
}

/// 必须登录；未登录时跳转到登录页
pub struct RequireAuth(pub User);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for RequireAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        match parts.extensions.get::<User>() {
            Some(user) => Ok(RequireAuth(user.clone())),
            None => {
                let next = parts
                    .uri
                    .path_and_query()
                    .map(|pq| pq.as_str())
                    .unwrap_or("/");
                debug!("Anonymous access to {}, redirecting to login", next);
                Err(AppError::login_required(&state.config.login_url, next))
            }
        }
    }
}

/// 帖子表单：同时支持 multipart（带图片）和 urlencoded 提交
pub struct PostSubmissionForm(pub PostSubmission);

#[async_trait]
impl<S> FromRequest<S, Body> for PostSubmissionForm
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(request: Request<Body>, state: &S) -> Result<Self, Self::Rejection> {
        let is_multipart = request
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.starts_with("multipart/form-data"))
            .unwrap_or(false);

        if !is_multipart {
            let Form(submission) = Form::<PostSubmission>::from_request(request, state)
                .await
                .map_err(|e| AppError::bad_request(&e.to_string()))?;
            return Ok(PostSubmissionForm(submission));
        }

        let mut multipart = Multipart::from_request(request, state)
            .await
            .map_err(|e| AppError::bad_request(&e.to_string()))?;

        let mut submission = PostSubmission::default();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::bad_request(&e.to_string()))?
        {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "image" => {
                    let file_name = field.file_name().unwrap_or_default().to_string();
                    let content_type = field.content_type().map(str::to_string);
                    let data = field
                        .bytes()
                        .await
                        .map_err(|e| AppError::bad_request(&e.to_string()))?;
                    // 没有选择文件时浏览器仍会提交一个空字段
                    if !data.is_empty() || !file_name.is_empty() {
                        submission.image = Some(UploadedImage::new(file_name, content_type, data));
                    }
                }
                "text" | "group" | "image-clear" => {
                    let value = field
                        .text()
                        .await
                        .map_err(|e| AppError::bad_request(&e.to_string()))?;
                    match name.as_str() {
                        "text" => submission.text = value,
                        "group" => submission.group = Some(value),
                        _ => submission.image_clear = Some(value),
                    }
                }
                other => debug!("Ignoring unexpected form field: {}", other),
            }
        }

        Ok(PostSubmissionForm(submission))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_panic_response_is_marked_for_error_page() {
        let response = panic_response(Box::new("boom"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            response.extensions().get::<ErrorPage>(),
            Some(&ErrorPage(StatusCode::INTERNAL_SERVER_ERROR))
        );
    }

    #[test]
    fn test_session_token_from_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; rainbow_session=abc.def.ghi"),
        );
        assert_eq!(
            session_token(&headers, "rainbow_session").as_deref(),
            Some("abc.def.ghi")
        );
        assert_eq!(session_token(&headers, "other"), None);
    }

    #[test]
    fn test_bearer_header_wins_over_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer from-header"));
        headers.insert(header::COOKIE, HeaderValue::from_static("rainbow_session=from-cookie"));
        assert_eq!(
            session_token(&headers, "rainbow_session").as_deref(),
            Some("from-header")
        );
    }

    #[test]
    fn test_no_credentials() {
        assert_eq!(session_token(&HeaderMap::new(), "rainbow_session"), None);
    }
}
