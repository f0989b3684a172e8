use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::utils::validation::FormErrors;

pub const COMMENT_TEXT_REQUIRED: &str = "Please enter the text of your comment";

/// 评论输入框的行数
pub const COMMENT_TEXTAREA_ROWS: u32 = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Comment {
    pub id: i64,
    pub post_id: i64,
    pub author_id: i64,
    pub text: String,
    pub created: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CommentWithAuthor {
    pub id: i64,
    pub post_id: i64,
    pub text: String,
    pub created: DateTime<Utc>,
    pub author_id: i64,
    pub author_username: String,
    pub author_display_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommentSubmission {
    #[serde(default)]
    pub text: String,
}

/// 评论表单只接收正文；帖子和作者由服务端填写
#[derive(Debug, Clone, Validate)]
pub struct CommentForm {
    #[validate(length(min = 1, message = "Please enter the text of your comment"))]
    pub text: String,
}

impl CommentForm {
    pub fn from_submission(submission: &CommentSubmission) -> Result<Self, FormErrors> {
        let form = CommentForm {
            text: submission.text.trim().to_string(),
        };
        form.validate()?;
        Ok(form)
    }
}
