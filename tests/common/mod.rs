#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use rainbow_posts::{
    app_router,
    models::{
        group::{CreateGroupRequest, Group},
        post::{Post, PostForm},
        user::User,
    },
    AppState, Config,
};
use std::{path::PathBuf, sync::Arc};
use tower::ServiceExt;

pub const SMALL_GIF: &[u8] = &[
    0x47, 0x49, 0x46, 0x38, 0x39, 0x61, 0x02, 0x00, 0x01, 0x00, 0x80, 0x00, 0x00, 0x00, 0x00, 0x00,
    0xFF, 0xFF, 0xFF, 0x21, 0xF9, 0x04, 0x00, 0x00, 0x00, 0x00, 0x00, 0x2C, 0x00, 0x00, 0x00, 0x00,
    0x02, 0x00, 0x01, 0x00, 0x00, 0x02, 0x02, 0x0C, 0x0A, 0x00, 0x3B,
];

pub const BOUNDARY: &str = "----rainbow-posts-test-boundary";

pub struct TestApp {
    pub state: Arc<AppState>,
    pub router: Router,
    pub media_root: PathBuf,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl TestResponse {
    pub fn location(&self) -> Option<&str> {
        self.headers
            .get(header::LOCATION)
            .and_then(|value| value.to_str().ok())
    }

    /// 页面中渲染出的帖子卡片数量
    pub fn post_cards(&self) -> usize {
        self.body.matches("<article class=\"post\"").count()
    }
}

impl TestApp {
    pub async fn new() -> Self {
        let media_root =
            std::env::temp_dir().join(format!("rainbow-posts-test-{}", uuid::Uuid::new_v4()));
        let config = Config {
            media_root: media_root.to_string_lossy().into_owned(),
            ..Config::default()
        };

        let state = Arc::new(AppState::build(config).await.expect("state"));
        let router = app_router(state.clone());

        Self {
            state,
            router,
            media_root,
        }
    }

    pub async fn user(&self, username: &str) -> User {
        self.state
            .user_service
            .ensure_user(username, None)
            .await
            .expect("user")
    }

    pub async fn group(&self, title: &str, slug: &str) -> Group {
        self.state
            .group_service
            .create_group(CreateGroupRequest {
                title: title.to_string(),
                slug: slug.to_string(),
                description: Some(format!("Description of {}", title)),
            })
            .await
            .expect("group")
    }

    pub async fn post(&self, author: &User, text: &str, group: Option<&Group>) -> Post {
        self.state
            .post_service
            .create_post(
                author.id,
                PostForm {
                    text: text.to_string(),
                    group_id: group.map(|g| g.id),
                    image: None,
                    clear_image: false,
                },
            )
            .await
            .expect("post")
    }

    fn session_cookie(&self, username: &str) -> String {
        let token = self
            .state
            .auth_service
            .issue_token(username, None)
            .expect("token");
        format!("{}={}", self.state.config.session_cookie_name, token)
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.expect("response");
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = hyper::body::to_bytes(response.into_body())
            .await
            .expect("body");

        TestResponse {
            status,
            headers,
            body: String::from_utf8_lossy(&bytes).into_owned(),
        }
    }

    fn request(&self, method: Method, uri: &str, as_user: Option<&str>) -> axum::http::request::Builder {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(username) = as_user {
            builder = builder.header(header::COOKIE, self.session_cookie(username));
        }
        builder
    }

    pub async fn get(&self, uri: &str, as_user: Option<&str>) -> TestResponse {
        let request = self
            .request(Method::GET, uri, as_user)
            .body(Body::empty())
            .expect("request");
        self.send(request).await
    }

    pub async fn post_form(&self, uri: &str, fields: &[(&str, &str)], as_user: Option<&str>) -> TestResponse {
        let body = fields
            .iter()
            .map(|(key, value)| format!("{}={}", urlencoding::encode(key), urlencoding::encode(value)))
            .collect::<Vec<_>>()
            .join("&");

        let request = self
            .request(Method::POST, uri, as_user)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .expect("request");
        self.send(request).await
    }

    pub async fn post_multipart(
        &self,
        uri: &str,
        fields: &[(&str, &str)],
        file: Option<(&str, &str, &[u8])>,
        as_user: Option<&str>,
    ) -> TestResponse {
        let request = self
            .request(Method::POST, uri, as_user)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(multipart_body(fields, file)))
            .expect("request");
        self.send(request).await
    }

    pub async fn count(&self, sql: &str) -> i64 {
        self.state.db.count(sql, None).await.expect("count")
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.media_root);
    }
}

/// 拼出 multipart 请求体；`file` 为 (文件名, 类型, 内容)
pub fn multipart_body(fields: &[(&str, &str)], file: Option<(&str, &str, &[u8])>) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                BOUNDARY, name, value
            )
            .as_bytes(),
        );
    }
    if let Some((file_name, content_type, data)) = file {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                BOUNDARY, file_name, content_type
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}
