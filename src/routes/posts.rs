use crate::{
    error::{AppError, Result},
    models::{
        comment::COMMENT_TEXTAREA_ROWS,
        post::{Post, PostForm, PostSubmission},
        user::User,
    },
    routes::{page_context, parse_post_id, post_url, render},
    services::PostFilter,
    state::{AppState, Listing},
    utils::{
        cache::index_page_key,
        middleware::{OptionalAuth, PostSubmissionForm, RequireAuth},
        pagination::PageQuery,
        validation::FormErrors,
    },
};
use axum::{
    extract::{Path, Query, State},
    http::Uri,
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
    Router,
};
use serde_json::json;
use std::sync::Arc;
use tracing::debug;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(index))
        .route("/group/:slug/", get(group_posts))
        .route("/new/", get(new_post_form).post(create_post))
        .route("/:username/", get(profile))
        .route("/:username/:post_id/", get(post_view))
        .route("/:username/:post_id/edit/", get(post_edit_form).post(update_post))
}

/// 首页：所有帖子，结果按地址和访问者缓存
/// GET /
async fn index(
    State(state): State<Arc<AppState>>,
    OptionalAuth(user): OptionalAuth,
    uri: Uri,
    Query(query): Query<PageQuery>,
) -> Result<Html<String>> {
    let path_and_query = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");
    let key = index_page_key(user.as_ref().map(|u| u.username.as_str()), path_and_query);

    if let Some(html) = state.page_cache.get(&key) {
        debug!("Serving index page from cache: {}", key);
        return Ok(Html(html));
    }

    let page = state
        .post_service
        .list_posts(
            PostFilter::All,
            state.paginator(Listing::Index),
            query.page.as_deref(),
        )
        .await?;

    let context = page_context(
        &state,
        user.as_ref(),
        "Latest updates on the site",
        json!({ "page": page }),
    );
    let Html(html) = render(&state, "posts/index", &context)?;

    state.page_cache.set(key, html.clone());
    Ok(Html(html))
}

/// 社区帖子列表
/// GET /group/:slug/
async fn group_posts(
    State(state): State<Arc<AppState>>,
    OptionalAuth(user): OptionalAuth,
    Path(slug): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Html<String>> {
    let group = state.group_service.get_by_slug(&slug).await?;

    let page = state
        .post_service
        .list_posts(
            PostFilter::Group(group.id),
            state.paginator(Listing::Group),
            query.page.as_deref(),
        )
        .await?;

    let title = format!("Posts of the group {}", group);
    let context = page_context(
        &state,
        user.as_ref(),
        &title,
        json!({ "group": group, "page": page }),
    );
    render(&state, "posts/group", &context)
}

/// 用户主页
/// GET /:username/
async fn profile(
    State(state): State<Arc<AppState>>,
    OptionalAuth(user): OptionalAuth,
    Path(username): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Html<String>> {
    let author = state.user_service.get_by_username(&username).await?;

    let page = state
        .post_service
        .list_posts(
            PostFilter::Author(author.id),
            state.paginator(Listing::Profile),
            query.page.as_deref(),
        )
        .await?;

    let stats = state
        .follow_service
        .get_follow_stats(author.id, user.as_ref().map(|u| u.id))
        .await?;
    let can_follow = user.as_ref().map(|u| u.id != author.id).unwrap_or(false);

    let title = format!("Profile of {}", author.shown_name());
    let context = page_context(
        &state,
        user.as_ref(),
        &title,
        json!({
            "author": author,
            "author_name": author.shown_name(),
            "post_count": page.count,
            "page": page,
            "following": stats.is_following,
            "followers_count": stats.followers_count,
            "following_count": stats.following_count,
            "can_follow": can_follow,
        }),
    );
    render(&state, "posts/profile", &context)
}

/// 帖子详情
/// GET /:username/:post_id/
async fn post_view(
    State(state): State<Arc<AppState>>,
    OptionalAuth(user): OptionalAuth,
    Path((username, post_id)): Path<(String, String)>,
) -> Result<Html<String>> {
    let post_id = parse_post_id(&post_id)?;
    let author = state.user_service.get_by_username(&username).await?;
    let post = state.post_service.get_post_view(post_id).await?;
    let comments = state.comment_service.list_for_post(post.id).await?;
    let post_count = state.post_service.count_by_author(author.id).await?;

    let can_edit = user.as_ref().map(|u| u.id == post.author_id).unwrap_or(false);
    let preview: String = post.text.chars().take(30).collect();

    let context = page_context(
        &state,
        user.as_ref(),
        &preview,
        json!({
            "author": author,
            "author_name": author.shown_name(),
            "post_count": post_count,
            "post": post,
            "comments": comments,
            "comment_form": { "rows": COMMENT_TEXTAREA_ROWS, "text": "" },
            "can_edit": can_edit,
        }),
    );
    render(&state, "posts/post", &context)
}

/// 新建帖子页面
/// GET /new/
async fn new_post_form(
    State(state): State<Arc<AppState>>,
    RequireAuth(user): RequireAuth,
) -> Result<Html<String>> {
    render_post_form(&state, &user, &PostSubmission::default(), &FormErrors::new(), None).await
}

/// 提交新帖子
/// POST /new/
async fn create_post(
    State(state): State<Arc<AppState>>,
    RequireAuth(user): RequireAuth,
    PostSubmissionForm(submission): PostSubmissionForm,
) -> Result<Response> {
    let outcome = match PostForm::from_submission(&submission) {
        Ok(form) => state.post_service.create_post(user.id, form).await,
        Err(errors) => Err(errors.into()),
    };

    match outcome {
        Ok(_) => Ok(Redirect::to("/").into_response()),
        Err(AppError::Form(errors)) => {
            debug!("Rejected new post from {}: {}", user.username, errors);
            Ok(render_post_form(&state, &user, &submission, &errors, None)
                .await?
                .into_response())
        }
        Err(e) => Err(e),
    }
}

/// 编辑帖子页面；非作者直接回到帖子详情
/// GET /:username/:post_id/edit/
async fn post_edit_form(
    State(state): State<Arc<AppState>>,
    RequireAuth(user): RequireAuth,
    Path((username, post_id)): Path<(String, String)>,
) -> Result<Response> {
    let post_id = parse_post_id(&post_id)?;
    let author = state.user_service.get_by_username(&username).await?;
    if user.id != author.id {
        return Ok(Redirect::to(&post_url(&author.username, post_id)).into_response());
    }

    let post = state.post_service.get_author_post(author.id, post_id).await?;
    let values = PostSubmission {
        text: post.text.clone(),
        group: post.group_id.map(|id| id.to_string()),
        ..Default::default()
    };

    Ok(render_post_form(&state, &user, &values, &FormErrors::new(), Some(&post))
        .await?
        .into_response())
}

/// 提交帖子修改
/// POST /:username/:post_id/edit/
async fn update_post(
    State(state): State<Arc<AppState>>,
    RequireAuth(user): RequireAuth,
    Path((username, post_id)): Path<(String, String)>,
    PostSubmissionForm(submission): PostSubmissionForm,
) -> Result<Response> {
    let post_id = parse_post_id(&post_id)?;
    let author = state.user_service.get_by_username(&username).await?;
    let detail_url = post_url(&author.username, post_id);
    if user.id != author.id {
        debug!("User {} may not edit post {}", user.username, post_id);
        return Ok(Redirect::to(&detail_url).into_response());
    }

    let post = state.post_service.get_author_post(author.id, post_id).await?;
    let outcome = match PostForm::from_submission(&submission) {
        Ok(form) => state.post_service.update_post(&post, form).await,
        Err(errors) => Err(errors.into()),
    };

    match outcome {
        Ok(_) => Ok(Redirect::to(&detail_url).into_response()),
        Err(AppError::Form(errors)) => Ok(render_post_form(
            &state,
            &user,
            &submission,
            &errors,
            Some(&post),
        )
        .await?
        .into_response()),
        Err(e) => Err(e),
    }
}

/// 渲染新建/编辑共用的帖子表单
async fn render_post_form(
    state: &AppState,
    user: &User,
    values: &PostSubmission,
    errors: &FormErrors,
    post: Option<&Post>,
) -> Result<Html<String>> {
    let selected = values.group.as_deref().map(str::trim).unwrap_or_default();
    let groups = state
        .group_service
        .list_groups()
        .await?
        .into_iter()
        .map(|group| {
            json!({
                "id": group.id,
                "title": group.title,
                "selected": group.id.to_string() == selected,
            })
        })
        .collect::<Vec<_>>();

    let (title, action) = match post {
        Some(post) => (
            "Edit post",
            format!("{}edit/", post_url(&user.username, post.id)),
        ),
        None => ("New post", "/new/".to_string()),
    };

    let context = page_context(
        state,
        Some(user),
        title,
        json!({
            "is_edit": post.is_some(),
            "action": action,
            "post": post,
            "groups": groups,
            "form": {
                "text": values.text,
                "errors": errors,
            },
        }),
    );
    render(state, "posts/new", &context)
}
