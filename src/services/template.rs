use crate::error::Result;
use chrono::DateTime;
use handlebars::{handlebars_helper, Handlebars};
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

/// 编译进二进制的模板：(名称, 内容)
const TEMPLATES: &[(&str, &str)] = &[
    ("header", include_str!("../../templates/partials/header.hbs")),
    ("footer", include_str!("../../templates/partials/footer.hbs")),
    ("paginator", include_str!("../../templates/partials/paginator.hbs")),
    ("post_card", include_str!("../../templates/partials/post_card.hbs")),
    ("post_form", include_str!("../../templates/partials/post_form.hbs")),
    ("posts/index", include_str!("../../templates/posts/index.hbs")),
    ("posts/group", include_str!("../../templates/posts/group.hbs")),
    ("posts/profile", include_str!("../../templates/posts/profile.hbs")),
    ("posts/post", include_str!("../../templates/posts/post.hbs")),
    ("posts/new", include_str!("../../templates/posts/new.hbs")),
    ("posts/follow", include_str!("../../templates/posts/follow.hbs")),
    ("misc/404", include_str!("../../templates/misc/404.hbs")),
    ("misc/500", include_str!("../../templates/misc/500.hbs")),
    ("about/author", include_str!("../../templates/about/author.hbs")),
    ("about/tech", include_str!("../../templates/about/tech.hbs")),
];

// 把 RFC 3339 时间格式化为页面展示用的日期
handlebars_helper!(date: |value: str| {
    DateTime::parse_from_rfc3339(value)
        .map(|d| d.format("%d %b %Y %H:%M").to_string())
        .unwrap_or_else(|_| value.to_string())
});

// 链接中的用户名等路径片段
handlebars_helper!(urlencode: |value: str| urlencoding::encode(value).into_owned());

/// 页面渲染服务
#[derive(Clone)]
pub struct TemplateService {
    registry: Arc<Handlebars<'static>>,
}

impl TemplateService {
    pub fn new() -> Result<Self> {
        let mut registry = Handlebars::new();
        registry.register_helper("date", Box::new(date));
        registry.register_helper("urlencode", Box::new(urlencode));

        for (name, source) in TEMPLATES {
            registry.register_template_string(name, source)?;
        }
        debug!("Registered {} templates", TEMPLATES.len());

        Ok(Self {
            registry: Arc::new(registry),
        })
    }

    pub fn render<T: Serialize>(&self, name: &str, context: &T) -> Result<String> {
        Ok(self.registry.render(name, context)?)
    }

    pub fn has_template(&self, name: &str) -> bool {
        self.registry.has_template(name)
    }
}
