/**
 * Public Routes
 * Read-only portfolio content plus the contact form
 */
use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::content::Entity;
use crate::db::models::{Message, Profile, Record, SocialLink};
use crate::error::ApiResult;
use crate::site::SiteSnapshot;
use crate::AppState;

#[derive(Debug, Deserialize, Serialize)]
pub struct ContactRequest {
    pub name: String,
    pub email: String,
    #[serde(alias = "message")]
    pub content: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ContactResponse {
    pub success: bool,
    pub id: Uuid,
}

/// GET /api/site - everything the public pages render, in one read
pub async fn get_site(State(state): State<AppState>) -> ApiResult<Json<SiteSnapshot>> {
    Ok(Json(SiteSnapshot::load(&state.content).await?))
}

/// GET /api/profile
pub async fn get_profile(State(state): State<AppState>) -> ApiResult<Json<Profile>> {
    Ok(Json(state.content.profile().await?.profile))
}

/// GET /api/{projects,experience,skills}
pub async fn list_public<E: Entity>(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<Record<E>>>> {
    Ok(Json(state.content.collection::<E>().list().await?))
}

/// GET /api/socials - active links only
pub async fn list_socials(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<Record<SocialLink>>>> {
    let socials = state
        .content
        .collection::<SocialLink>()
        .list()
        .await?
        .into_iter()
        .filter(|s| s.data.is_active)
        .collect();
    Ok(Json(socials))
}

/// POST /api/contact
pub async fn submit_contact(
    State(state): State<AppState>,
    Json(payload): Json<ContactRequest>,
) -> ApiResult<(StatusCode, Json<ContactResponse>)> {
    let saved = state
        .content
        .submit_message(Message {
            name: payload.name,
            email: payload.email,
            content: payload.content,
            is_read: false,
        })
        .await?;

    tracing::info!(id = %saved.id, "Contact message received");

    Ok((
        StatusCode::CREATED,
        Json(ContactResponse {
            success: true,
            id: saved.id,
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::db::models::Project;
    use axum::body::Body;
    use axum::http::Request;
    use axum::routing::{get, post};
    use axum::Router;
    use tower::ServiceExt;

    fn router(state: AppState) -> Router {
        Router::new()
            .route("/api/projects", get(list_public::<Project>))
            .route("/api/socials", get(list_socials))
            .route("/api/contact", post(submit_contact))
            .with_state(state)
    }

    fn state() -> AppState {
        AppState::in_memory(AppConfig::for_tests("owner@example.com", "x"))
    }

    async fn send(app: Router, req: Request<Body>) -> (StatusCode, serde_json::Value) {
        let res = app.oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn contact(body: serde_json::Value) -> Request<Body> {
        Request::post("/api/contact")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_contact_creates_unread_message() {
        let state = state();
        let (status, body) = send(
            router(state.clone()),
            contact(serde_json::json!({
                "name": "Alice",
                "email": "a@example.com",
                "content": "Hi"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["success"], true);

        let inbox = state.content.list_messages(None).await.unwrap();
        assert_eq!(inbox.total, 1);
        assert!(!inbox.items[0].data.is_read);
    }

    #[tokio::test]
    async fn test_contact_rejects_bad_email() {
        let (status, body) = send(
            router(state()),
            contact(serde_json::json!({
                "name": "Alice",
                "email": "nope",
                "content": "Hi"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid email format");
    }

    #[tokio::test]
    async fn test_socials_hide_inactive_links() {
        let state = state();
        let socials = state.content.collection::<SocialLink>();
        for (platform, active) in [("GitHub", true), ("MySpace", false)] {
            socials
                .save(
                    None,
                    SocialLink {
                        platform: platform.to_string(),
                        url: format!("https://{}.example", platform.to_lowercase()),
                        is_active: active,
                        ..Default::default()
                    },
                )
                .await
                .unwrap();
        }

        let (status, body) = send(
            router(state),
            Request::get("/api/socials").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let list = body.as_array().unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0]["platform"], "GitHub");
    }

    #[tokio::test]
    async fn test_projects_list_empty_store() {
        let (status, body) = send(
            router(state()),
            Request::get("/api/projects").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.as_array().unwrap().is_empty());
    }
}
