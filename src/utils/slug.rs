use once_cell::sync::Lazy;
use regex::Regex;

static DISALLOWED_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9\-_]").unwrap());
static REPEATED_HYPHENS: Lazy<Regex> = Lazy::new(|| Regex::new(r"-+").unwrap());
static VALID_SLUG: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-zA-Z0-9_]+(-[a-zA-Z0-9_]+)*$").unwrap());

/// 社区 slug 的最大长度
pub const MAX_SLUG_LENGTH: usize = 100;

/// 从社区标题生成 URL 友好的 slug
pub fn generate_slug(title: &str) -> String {
    let lowered = title.trim().to_lowercase().replace(char::is_whitespace, "-");
    let cleaned = DISALLOWED_CHARS.replace_all(&lowered, "");
    let mut slug = REPEATED_HYPHENS
        .replace_all(&cleaned, "-")
        .trim_matches('-')
        .to_string();

    if slug.len() > MAX_SLUG_LENGTH {
        slug.truncate(MAX_SLUG_LENGTH);
        // 尽量不在单词中间截断
        if let Some(last_hyphen) = slug.rfind('-') {
            if last_hyphen > MAX_SLUG_LENGTH / 2 {
                slug.truncate(last_hyphen);
            }
        }
        slug = slug.trim_end_matches('-').to_string();
    }

    if slug.is_empty() {
        slug = "untitled".to_string();
    }

    slug
}

/// 验证 slug 格式是否正确
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty() && slug.len() <= MAX_SLUG_LENGTH && VALID_SLUG.is_match(slug)
}
