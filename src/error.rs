use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Redirect, Response},
};
use thiserror::Error;

use crate::utils::validation::FormErrors;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Authentication required, redirecting to {location}")]
    AuthenticationRequired { location: String },

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Form error: {0}")]
    Form(FormErrors),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Template error: {0}")]
    Template(#[from] handlebars::TemplateError),

    #[error("Render error: {0}")]
    Render(#[from] handlebars::RenderError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
}

/// 错误页标记，由错误页中间件渲染为 HTML
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorPage(pub StatusCode);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::AuthenticationRequired { location } => {
                return Redirect::to(location).into_response();
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::Migration(e) => {
                tracing::error!("Migration error: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::Authentication(msg) => {
                tracing::debug!("Authentication error: {}", msg);
                StatusCode::UNAUTHORIZED
            }
            AppError::Form(_) | AppError::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::NotFound(msg) => {
                tracing::debug!("Not found: {}", msg);
                StatusCode::NOT_FOUND
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::Template(e) => {
                tracing::error!("Template error: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::Render(e) => {
                tracing::error!("Render error: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::Io(e) => {
                tracing::error!("IO error: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::Jwt(e) => {
                tracing::debug!("JWT error: {}", e);
                StatusCode::UNAUTHORIZED
            }
        };

        let body = status.canonical_reason().unwrap_or("Error").to_string();
        let mut response = (
            status,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            body,
        )
            .into_response();
        response.extensions_mut().insert(ErrorPage(status));
        response
    }
}

// 便利函数，用于创建常见错误
impl AppError {
    pub fn not_found(resource: &str) -> Self {
        Self::NotFound(format!("{} not found", resource))
    }

    pub fn bad_request(msg: &str) -> Self {
        Self::BadRequest(msg.to_string())
    }

    pub fn internal(msg: &str) -> Self {
        Self::Internal(msg.to_string())
    }

    /// 未登录时跳转到登录页，并通过 `next` 带回原始地址
    pub fn login_required(login_url: &str, next: &str) -> Self {
        Self::AuthenticationRequired {
            location: format!(
                "{}?next={}",
                login_url,
                urlencoding::encode(next).replace("%2F", "/")
            ),
        }
    }
}

// 从其他错误类型转换
impl From<FormErrors> for AppError {
    fn from(errors: FormErrors) -> Self {
        AppError::Form(errors)
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Form(errors.into())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_is_tagged_for_error_page() {
        let response = AppError::not_found("Group").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            response.extensions().get::<ErrorPage>(),
            Some(&ErrorPage(StatusCode::NOT_FOUND))
        );
    }

    #[test]
    fn test_login_required_encodes_query_of_next() {
        let error = AppError::login_required("/auth/login/", "/follow/?page=2");
        match error {
            AppError::AuthenticationRequired { location } => {
                assert_eq!(location, "/auth/login/?next=/follow/%3Fpage%3D2");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_internal_errors_map_to_500() {
        let response = AppError::internal("boom").into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_login_required_redirects_with_next() {
        let response = AppError::login_required("/auth/login/", "/new/").into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "/auth/login/?next=/new/"
        );
        assert!(response.extensions().get::<ErrorPage>().is_none());
    }
}
