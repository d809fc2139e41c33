use actix_web::{web, HttpResponse};
use std::collections::HashMap;
use validator::Validate;

use super::{AppState, AuthUser, OptionalUser};
use crate::error::ApiError;
use crate::models::{
    CreateForumTopicRequest, CreatePostRequest, CreateReplyRequest, ForumTopic, PaginationQuery,
    PostLikeResponse, PostReply, PostView, ReplyView, SuccessResponse, TopicWithCount,
};
use crate::services::PostWithCounts;

const DEFAULT_PAGE: i64 = 20;
const DEFAULT_TOPIC_ICON: &str = "message-circle";

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/feed", web::get().to(feed))
        .service(
            web::scope("/posts")
                .route("", web::post().to(create_feed_post))
                .route("/user/{user_id}", web::get().to(user_posts))
                .route("/{id}/like", web::post().to(toggle_like))
                .route("/{id}/replies", web::post().to(create_reply))
                .route("/{id}/replies", web::get().to(list_replies)),
        )
        .service(
            web::scope("/forums")
                .route("", web::get().to(list_topics))
                .route("", web::post().to(create_topic))
                .route("/topics", web::get().to(list_topics))
                .route("/posts/{id}", web::delete().to(delete_post))
                .route("/{topic_id}/posts", web::get().to(topic_posts))
                .route("/{topic_id}/posts", web::post().to(create_topic_post)),
        );
}

/// Attach authors (unless anonymous), topics and the viewer's like state
pub(crate) async fn post_views(
    state: &AppState,
    posts: Vec<PostWithCounts>,
    viewer_id: Option<&str>,
) -> Result<Vec<PostView>, ApiError> {
    let post_ids: Vec<i64> = posts.iter().map(|p| p.post.id).collect();
    let mut topic_ids: Vec<i64> = posts.iter().map(|p| p.post.topic_id).collect();
    topic_ids.sort_unstable();
    topic_ids.dedup();

    let authors = state
        .summaries(
            posts
                .iter()
                .filter(|p| !p.post.is_anonymous)
                .filter_map(|p| p.post.author_id.clone()),
        )
        .await?;
    let topics: HashMap<i64, ForumTopic> = state
        .postgres
        .topics_by_ids(&topic_ids)
        .await?
        .into_iter()
        .map(|t| (t.id, t))
        .collect();
    let liked = match viewer_id {
        Some(viewer) => state.postgres.liked_post_ids(viewer, &post_ids).await?,
        None => Default::default(),
    };

    Ok(posts
        .into_iter()
        .map(|PostWithCounts { post, replies_count }| {
            let author = if post.is_anonymous {
                None
            } else {
                post.author_id.as_ref().and_then(|id| authors.get(id).cloned())
            };
            PostView {
                id: post.id,
                topic_id: post.topic_id,
                is_liked: liked.contains(&post.id),
                topic: topics.get(&post.topic_id).cloned(),
                title: post.title,
                content: post.content,
                is_anonymous: post.is_anonymous,
                is_pinned: post.is_pinned,
                likes_count: post.likes_count,
                replies_count,
                created_at: post.created_at,
                updated_at: post.updated_at,
                author,
            }
        })
        .collect())
}

async fn reply_views(state: &AppState, replies: Vec<PostReply>) -> Result<Vec<ReplyView>, ApiError> {
    let authors = state
        .summaries(
            replies
                .iter()
                .filter(|r| !r.is_anonymous)
                .filter_map(|r| r.author_id.clone()),
        )
        .await?;

    Ok(replies
        .into_iter()
        .map(|reply| ReplyView {
            author: reply.author_id.as_ref().and_then(|id| authors.get(id).cloned()),
            id: reply.id,
            post_id: reply.post_id,
            content: reply.content,
            is_anonymous: reply.is_anonymous,
            created_at: reply.created_at,
        })
        .collect())
}

/// Create a post in `topic_id` and render it for its author
async fn publish(
    state: &AppState,
    auth: &AuthUser,
    topic_id: i64,
    req: &CreatePostRequest,
) -> Result<HttpResponse, ApiError> {
    let post = state
        .postgres
        .create_post(topic_id, auth.id(), req.title.trim(), req.content.trim(), req.is_anonymous)
        .await?;

    tracing::info!("Post {} created in topic {}", post.id, topic_id);

    let mut views = post_views(
        state,
        vec![PostWithCounts { post, replies_count: 0 }],
        Some(auth.id()),
    )
    .await?;
    match views.pop() {
        Some(view) => Ok(HttpResponse::Created().json(view)),
        None => Err(ApiError::Internal("Created post could not be rendered".to_string())),
    }
}

/// GET /api/feed
async fn feed(
    state: web::Data<AppState>,
    viewer: OptionalUser,
    query: web::Query<PaginationQuery>,
) -> Result<HttpResponse, ApiError> {
    query.validate()?;
    let posts = state
        .postgres
        .feed_posts(query.limit_or(DEFAULT_PAGE), query.offset())
        .await?;
    Ok(HttpResponse::Ok().json(post_views(&state, posts, viewer.id()).await?))
}

/// POST /api/posts
async fn create_feed_post(
    state: web::Data<AppState>,
    auth: AuthUser,
    req: web::Json<CreatePostRequest>,
) -> Result<HttpResponse, ApiError> {
    req.validate()?;
    let topic = state.postgres.general_feed_topic().await?;
    publish(&state, &auth, topic.id, &req).await
}

/// GET /api/posts/user/{user_id}
async fn user_posts(
    state: web::Data<AppState>,
    viewer: OptionalUser,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let posts = state.postgres.user_posts(&path).await?;
    Ok(HttpResponse::Ok().json(post_views(&state, posts, viewer.id()).await?))
}

/// POST /api/posts/{id}/like
async fn toggle_like(
    state: web::Data<AppState>,
    auth: AuthUser,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let post = state
        .postgres
        .get_post(path.into_inner())
        .await?
        .ok_or_else(|| ApiError::not_found("Post not found"))?;

    let (is_liked, likes_count) = state.postgres.toggle_post_like(post.id, auth.id()).await?;
    Ok(HttpResponse::Ok().json(PostLikeResponse { is_liked, likes_count }))
}

/// POST /api/posts/{id}/replies
async fn create_reply(
    state: web::Data<AppState>,
    auth: AuthUser,
    path: web::Path<i64>,
    req: web::Json<CreateReplyRequest>,
) -> Result<HttpResponse, ApiError> {
    req.validate()?;
    let post = state
        .postgres
        .get_post(path.into_inner())
        .await?
        .ok_or_else(|| ApiError::not_found("Post not found"))?;

    let reply = state
        .postgres
        .create_reply(post.id, auth.id(), req.content.trim(), req.is_anonymous)
        .await?;

    let mut views = reply_views(&state, vec![reply]).await?;
    match views.pop() {
        Some(view) => Ok(HttpResponse::Created().json(view)),
        None => Err(ApiError::Internal("Created reply could not be rendered".to_string())),
    }
}

/// GET /api/posts/{id}/replies
async fn list_replies(
    state: web::Data<AppState>,
    path: web::Path<i64>,
    query: web::Query<PaginationQuery>,
) -> Result<HttpResponse, ApiError> {
    query.validate()?;
    let post = state
        .postgres
        .get_post(path.into_inner())
        .await?
        .ok_or_else(|| ApiError::not_found("Post not found"))?;

    let replies = state
        .postgres
        .list_replies(post.id, query.limit_or(50), query.offset())
        .await?;
    Ok(HttpResponse::Ok().json(reply_views(&state, replies).await?))
}

/// GET /api/forums and /api/forums/topics
async fn list_topics(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let topics: Vec<TopicWithCount> = state
        .postgres
        .list_topics()
        .await?
        .into_iter()
        .map(|t| TopicWithCount { topic: t.topic, post_count: t.post_count })
        .collect();
    Ok(HttpResponse::Ok().json(topics))
}

/// POST /api/forums
async fn create_topic(
    state: web::Data<AppState>,
    _auth: AuthUser,
    req: web::Json<CreateForumTopicRequest>,
) -> Result<HttpResponse, ApiError> {
    req.validate()?;
    let icon = req
        .icon
        .as_deref()
        .map(str::trim)
        .filter(|i| !i.is_empty())
        .unwrap_or(DEFAULT_TOPIC_ICON);

    let topic = state
        .postgres
        .create_topic(req.name.trim(), req.description.trim(), icon)
        .await?;
    Ok(HttpResponse::Created().json(topic))
}

/// GET /api/forums/{topic_id}/posts
async fn topic_posts(
    state: web::Data<AppState>,
    viewer: OptionalUser,
    path: web::Path<i64>,
    query: web::Query<PaginationQuery>,
) -> Result<HttpResponse, ApiError> {
    query.validate()?;
    let topic = state
        .postgres
        .get_topic(path.into_inner())
        .await?
        .ok_or_else(|| ApiError::not_found("Topic not found"))?;

    let posts = state
        .postgres
        .topic_posts(topic.id, query.limit_or(DEFAULT_PAGE), query.offset())
        .await?;
    Ok(HttpResponse::Ok().json(post_views(&state, posts, viewer.id()).await?))
}

/// POST /api/forums/{topic_id}/posts
async fn create_topic_post(
    state: web::Data<AppState>,
    auth: AuthUser,
    path: web::Path<i64>,
    req: web::Json<CreatePostRequest>,
) -> Result<HttpResponse, ApiError> {
    req.validate()?;
    let topic = state
        .postgres
        .get_topic(path.into_inner())
        .await?
        .ok_or_else(|| ApiError::not_found("Topic not found"))?;
    publish(&state, &auth, topic.id, &req).await
}

/// DELETE /api/forums/posts/{id}
///
/// Soft delete; the post stays restorable from the author's vault.
async fn delete_post(
    state: web::Data<AppState>,
    auth: AuthUser,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let post_id = path.into_inner();
    let post = state
        .postgres
        .get_post(post_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Post not found"))?;

    if post.author_id.as_deref() != Some(auth.id()) {
        return Err(ApiError::forbidden("Only the author can delete this post"));
    }

    state.postgres.soft_delete_post(post.id, auth.id()).await?;
    Ok(HttpResponse::Ok().json(SuccessResponse::ok()))
}
