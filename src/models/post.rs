use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use validator::Validate;

use crate::models::media::UploadedImage;
use crate::utils::validation::{parse_choice, FormErrors};

pub const POST_TEXT_REQUIRED: &str = "Please enter the text of your post";
pub const INVALID_GROUP_CHOICE: &str =
    "Select a valid choice. That choice is not one of the available choices.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Post {
    pub id: i64,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    pub author_id: i64,
    pub group_id: Option<i64>,
    pub image: Option<String>,
}

impl fmt::Display for Post {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let preview: String = self.text.chars().take(15).collect();
        f.write_str(&preview)
    }
}

/// 列表和详情页使用的帖子（带作者与社区信息）
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PostView {
    pub id: i64,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    pub image: Option<String>,
    pub author_id: i64,
    pub author_username: String,
    pub author_display_name: Option<String>,
    pub group_id: Option<i64>,
    pub group_title: Option<String>,
    pub group_slug: Option<String>,
    pub comment_count: i64,
}

/// 新建/编辑帖子时提交的原始字段
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostSubmission {
    #[serde(default)]
    pub text: String,
    pub group: Option<String>,
    #[serde(rename = "image-clear")]
    pub image_clear: Option<String>,
    #[serde(skip)]
    pub image: Option<UploadedImage>,
}

/// 通过基础校验的帖子表单；作者永远取自当前登录用户
#[derive(Debug, Clone, Validate)]
pub struct PostForm {
    #[validate(length(min = 1, message = "Please enter the text of your post"))]
    pub text: String,
    pub group_id: Option<i64>,
    pub image: Option<UploadedImage>,
    pub clear_image: bool,
}

impl PostForm {
    pub fn from_submission(submission: &PostSubmission) -> Result<Self, FormErrors> {
        let mut errors = FormErrors::new();

        let group_id = match parse_choice(submission.group.as_deref()) {
            Ok(group_id) => group_id,
            Err(_) => {
                errors.add("group", INVALID_GROUP_CHOICE);
                None
            }
        };

        let form = PostForm {
            text: submission.text.trim().to_string(),
            group_id,
            image: submission.image.clone(),
            clear_image: matches!(
                submission.image_clear.as_deref(),
                Some("on") | Some("true") | Some("1")
            ),
        };

        if let Err(validation) = form.validate() {
            errors.merge(validation.into());
        }

        errors.into_result().map(|_| form)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submission(text: &str, group: Option<&str>) -> PostSubmission {
        PostSubmission {
            text: text.to_string(),
            group: group.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn test_post_displays_first_fifteen_chars() {
        let post = Post {
            id: 1,
            text: "Тестовый текст публикации".to_string(),
            pub_date: Utc::now(),
            author_id: 1,
            group_id: None,
            image: None,
        };
        assert_eq!(post.to_string(), "Тестовый текст ");
    }

    #[test]
    fn test_empty_text_is_rejected_with_message() {
        for text in ["", "   \n"] {
            let errors = PostForm::from_submission(&submission(text, None)).unwrap_err();
            assert_eq!(errors.get("text"), Some(&[POST_TEXT_REQUIRED.to_string()][..]));
        }
    }

    #[test]
    fn test_valid_submission_is_trimmed() {
        let form = PostForm::from_submission(&submission("  hello  ", Some("3"))).unwrap();
        assert_eq!(form.text, "hello");
        assert_eq!(form.group_id, Some(3));
        assert!(!form.clear_image);
    }

    #[test]
    fn test_empty_group_means_no_group() {
        let form = PostForm::from_submission(&submission("hello", Some(""))).unwrap();
        assert_eq!(form.group_id, None);
    }

    #[test]
    fn test_garbage_group_is_rejected() {
        let errors = PostForm::from_submission(&submission("hello", Some("cats"))).unwrap_err();
        assert_eq!(errors.get("group"), Some(&[INVALID_GROUP_CHOICE.to_string()][..]));
        assert!(errors.get("text").is_none());
    }

    #[test]
    fn test_image_clear_flag() {
        let mut raw = submission("hello", None);
        raw.image_clear = Some("on".to_string());
        assert!(PostForm::from_submission(&raw).unwrap().clear_image);
    }
}
