/**
 * Admin Routes
 * Content management for the site owner. Every handler requires an admin bearer token.
 */
use axum::{
    extract::{DefaultBodyLimit, Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::admin::{load_tab, AdminTab, TabView};
use crate::content::{Entity, MessagePage, PageRequest};
use crate::db::models::{
    Experience, Message, Profile, ProfileRecord, Project, Record, Skill, SkillCategory, SocialLink,
};
use crate::error::{ApiError, ApiResult};
use crate::routes::auth::AdminSession;
use crate::routes::{upload, SuccessResponse};
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ReorderRequest {
    pub ids: Vec<Uuid>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct CategoryOrderRequest {
    pub names: Vec<String>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryUpdateResponse {
    pub categories: Vec<SkillCategory>,
    /// Skills moved to the new name
    pub moved_skills: u64,
}

/// `?page=&page_size=`; paging applies once either is present
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<usize>,
    pub page_size: Option<usize>,
}

impl PageQuery {
    fn into_request(self) -> Option<PageRequest> {
        if self.page.is_none() && self.page_size.is_none() {
            return None;
        }
        let defaults = PageRequest::default();
        Some(PageRequest {
            page: self.page.unwrap_or(defaults.page),
            page_size: self.page_size.unwrap_or(defaults.page_size),
        })
    }
}

// ============================================================================
// Collections
// ============================================================================

/// `?q=` narrows the list by the entity's searchable fields
pub async fn list_records<E: Entity>(
    _session: AdminSession,
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Json<Vec<Record<E>>>> {
    let collection = state.content.collection::<E>();
    let records = match query.q {
        Some(q) => collection.search(&q).await?,
        None => collection.list().await?,
    };
    Ok(Json(records))
}

pub async fn create_record<E: Entity>(
    _session: AdminSession,
    State(state): State<AppState>,
    Json(data): Json<E>,
) -> ApiResult<(StatusCode, Json<Record<E>>)> {
    let saved = state.content.collection::<E>().save(None, data).await?;
    Ok((StatusCode::CREATED, Json(saved)))
}

/// Full-document replace
pub async fn update_record<E: Entity>(
    _session: AdminSession,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(data): Json<E>,
) -> ApiResult<Json<Record<E>>> {
    Ok(Json(state.content.collection::<E>().save(Some(id), data).await?))
}

pub async fn delete_record<E: Entity>(
    _session: AdminSession,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<SuccessResponse>> {
    state.content.collection::<E>().delete(id).await?;
    Ok(Json(SuccessResponse { success: true }))
}

/// Persists the full order and answers with the collection as stored
pub async fn reorder_records<E: Entity>(
    _session: AdminSession,
    State(state): State<AppState>,
    Json(payload): Json<ReorderRequest>,
) -> ApiResult<Json<Vec<Record<E>>>> {
    Ok(Json(
        state.content.collection::<E>().reorder(&payload.ids).await?,
    ))
}

// ============================================================================
// Profile & categories
// ============================================================================

pub async fn get_profile(
    _session: AdminSession,
    State(state): State<AppState>,
) -> ApiResult<Json<ProfileRecord>> {
    Ok(Json(state.content.profile().await?))
}

pub async fn put_profile(
    _session: AdminSession,
    State(state): State<AppState>,
    Json(profile): Json<Profile>,
) -> ApiResult<Json<ProfileRecord>> {
    Ok(Json(state.content.save_profile(profile).await?))
}

pub async fn create_category(
    _session: AdminSession,
    State(state): State<AppState>,
    Json(category): Json<SkillCategory>,
) -> ApiResult<(StatusCode, Json<Vec<SkillCategory>>)> {
    let categories = state.content.add_category(category).await?;
    Ok((StatusCode::CREATED, Json(categories)))
}

pub async fn update_category(
    _session: AdminSession,
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(category): Json<SkillCategory>,
) -> ApiResult<Json<CategoryUpdateResponse>> {
    let (categories, moved_skills) = state.content.update_category(&name, category).await?;
    Ok(Json(CategoryUpdateResponse {
        categories,
        moved_skills,
    }))
}

/// Skills of the removed category are kept as they are
pub async fn delete_category(
    _session: AdminSession,
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<Json<Vec<SkillCategory>>> {
    Ok(Json(state.content.remove_category(&name).await?))
}

pub async fn reorder_categories(
    _session: AdminSession,
    State(state): State<AppState>,
    Json(payload): Json<CategoryOrderRequest>,
) -> ApiResult<Json<Vec<SkillCategory>>> {
    Ok(Json(state.content.reorder_categories(&payload.names).await?))
}

// ============================================================================
// Messages
// ============================================================================

pub async fn list_messages(
    _session: AdminSession,
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<MessagePage>> {
    Ok(Json(state.content.list_messages(query.into_request()).await?))
}

pub async fn mark_message_read(
    _session: AdminSession,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Record<Message>>> {
    Ok(Json(state.content.mark_read(id).await?))
}

pub async fn mark_message_unread(
    _session: AdminSession,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Record<Message>>> {
    Ok(Json(state.content.mark_unread(id).await?))
}

pub async fn delete_message(
    _session: AdminSession,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<SuccessResponse>> {
    state.content.delete_message(id).await?;
    Ok(Json(SuccessResponse { success: true }))
}

// ============================================================================
// Tabs
// ============================================================================

/// GET /api/admin/tabs/{tab} - the data one console tab shows
pub async fn get_tab(
    _session: AdminSession,
    State(state): State<AppState>,
    Path(tab): Path<String>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<TabView>> {
    let tab: AdminTab = tab.parse().map_err(ApiError::NotFound)?;
    Ok(Json(
        load_tab(&state.content, tab, query.into_request()).await?,
    ))
}

// ============================================================================
// Router
// ============================================================================

fn entity_routes<E: Entity>(router: Router<AppState>, path: &str) -> Router<AppState> {
    router
        .route(path, get(list_records::<E>).post(create_record::<E>))
        .route(
            &format!("{}/{{id}}", path),
            put(update_record::<E>).delete(delete_record::<E>),
        )
        .route(&format!("{}/reorder", path), post(reorder_records::<E>))
}

/// Routes mounted under `/api/admin`
pub fn router() -> Router<AppState> {
    let router = Router::new()
        .route("/tabs/{tab}", get(get_tab))
        .route("/profile", get(get_profile).put(put_profile))
        .route("/categories", post(create_category))
        .route("/categories/reorder", post(reorder_categories))
        .route(
            "/categories/{name}",
            put(update_category).delete(delete_category),
        )
        .route("/messages", get(list_messages))
        .route("/messages/{id}", delete(delete_message))
        .route("/messages/{id}/read", post(mark_message_read))
        .route("/messages/{id}/unread", post(mark_message_unread))
        .route(
            "/uploads/{bucket}",
            post(upload::upload_file)
                .layer(DefaultBodyLimit::max(upload::MAX_DOCUMENT_SIZE + 64 * 1024)),
        )
        .route("/uploads/{bucket}/{filename}", delete(upload::delete_file));

    let router = entity_routes::<Project>(router, "/projects");
    let router = entity_routes::<Experience>(router, "/experience");
    let router = entity_routes::<Skill>(router, "/skills");
    entity_routes::<SocialLink>(router, "/socials")
}
