use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use validator::{Validate, ValidationError};

/// 社区：帖子可以选择归属的分组
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Group {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub description: Option<String>,
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.title)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateGroupRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,

    #[validate(length(min = 1, max = 100), custom = "validate_group_slug")]
    pub slug: String,

    pub description: Option<String>,
}

fn validate_group_slug(slug: &str) -> Result<(), ValidationError> {
    if crate::utils::slug::is_valid_slug(slug) {
        Ok(())
    } else {
        let mut error = ValidationError::new("slug");
        error.message = Some(
            "Enter a valid slug consisting of letters, numbers, underscores or hyphens.".into(),
        );
        Err(error)
    }
}
