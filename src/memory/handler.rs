//! HTTP handlers for the memory corpus
//!
//! - GET    /api/v1/memories          : list, or search with `?q=` (`&fuzzy=true`)
//! - POST   /api/v1/memories          : create a record
//! - PATCH  /api/v1/memories/:id      : partial update
//! - DELETE /api/v1/memories/:id      : remove a record

use super::record::{Importance, MemoryCategory, MemoryPatch, MemoryRecordBuilder};
use super::store::MemoryStore;
use crate::api::error_response;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, patch},
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

/// Shared state for memory handlers
#[derive(Clone)]
pub struct MemoryState {
    pub store: Arc<dyn MemoryStore>,
}

/// Create the memory CRUD router
pub fn memory_router(state: MemoryState) -> Router {
    Router::new()
        .route("/api/v1/memories", get(list_memories).post(create_memory))
        .route(
            "/api/v1/memories/:id",
            patch(update_memory).delete(delete_memory),
        )
        .with_state(state)
}

/// Query params for listing memories
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub q: Option<String>,
    #[serde(default)]
    pub fuzzy: bool,
}

/// Request body for creating a memory
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMemoryRequest {
    pub content: String,
    pub category: MemoryCategory,
    #[serde(default)]
    pub importance: Option<Importance>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub related_files: Vec<String>,
    #[serde(default)]
    pub confidence: Option<f32>,
    #[serde(default)]
    pub id: Option<String>,
}

/// GET /api/v1/memories
async fn list_memories(State(state): State<MemoryState>, Query(query): Query<ListQuery>) -> Response {
    let result = match query.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        Some(q) if query.fuzzy => state.store.fuzzy_search(q).await,
        Some(q) => state.store.search(q).await,
        None => state.store.load_all().await,
    };
    match result {
        Ok(records) => Json(records).into_response(),
        Err(e) => error_response(e),
    }
}

/// POST /api/v1/memories
async fn create_memory(
    State(state): State<MemoryState>,
    Json(request): Json<CreateMemoryRequest>,
) -> Response {
    let mut builder = MemoryRecordBuilder::new(request.category)
        .content(request.content)
        .importance(request.importance.unwrap_or(Importance::Medium))
        .tags(request.tags);
    for path in request.related_files {
        builder = builder.related_file(path);
    }
    if let Some(confidence) = request.confidence {
        builder = builder.confidence(confidence);
    }
    if let Some(id) = request.id {
        builder = builder.id(id);
    }

    let record = match builder.build() {
        Ok(record) => record,
        Err(e) => return error_response(e),
    };
    match state.store.add(record.clone()).await {
        Ok(()) => {
            tracing::info!(id = %record.id, category = %record.category, "Memory created");
            (StatusCode::CREATED, Json(record)).into_response()
        }
        Err(e) => error_response(e),
    }
}

/// PATCH /api/v1/memories/:id
async fn update_memory(
    State(state): State<MemoryState>,
    Path(id): Path<String>,
    Json(patch): Json<MemoryPatch>,
) -> Response {
    match state.store.update(&id, patch).await {
        Ok(record) => Json(record).into_response(),
        Err(e) => error_response(e),
    }
}

/// DELETE /api/v1/memories/:id
async fn delete_memory(State(state): State<MemoryState>, Path(id): Path<String>) -> Response {
    match state.store.delete(&id).await {
        Ok(record) => {
            tracing::info!(id = %record.id, "Memory deleted");
            Json(record).into_response()
        }
        Err(e) => error_response(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::store::{InMemoryStore, JsonFileStore};
    use crate::memory::MemoryRecord;
    use axum::body::Body;
    use axum::http::Request;
    use tempfile::TempDir;
    use tower::ServiceExt;

    fn seed() -> Vec<MemoryRecord> {
        vec![
            MemoryRecordBuilder::new(MemoryCategory::Architecture)
                .id("m1")
                .content("Never use panic in handlers")
                .importance(Importance::Critical)
                .tag("go")
                .build()
                .unwrap(),
            MemoryRecordBuilder::new(MemoryCategory::CodeStyle)
                .id("m2")
                .content("Functions use camelCase")
                .build()
                .unwrap(),
        ]
    }

    fn make_app() -> Router {
        let store: Arc<dyn MemoryStore> = Arc::new(InMemoryStore::with_records(seed()));
        memory_router(MemoryState { store })
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let body = axum::body::to_bytes(response.into_body(), 1024 * 64)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    fn json_request(method: &str, uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_list_memories() {
        let resp = make_app()
            .oneshot(Request::builder().uri("/api/v1/memories").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json.as_array().unwrap().len(), 2);
        assert_eq!(json[0]["importance"], "critical");
    }

    #[tokio::test]
    async fn test_search_memories() {
        let resp = make_app()
            .oneshot(
                Request::builder()
                    .uri("/api/v1/memories?q=PANIC")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let json = body_json(resp).await;
        let arr = json.as_array().unwrap();
        assert_eq!(arr.len(), 1);
        assert_eq!(arr[0]["id"], "m1");
    }

    #[tokio::test]
    async fn test_create_memory() {
        let app = make_app();
        let resp = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/v1/memories",
                r#"{"content":"Orders over 10000 need approval","category":"business-rule","importance":"critical","tags":["orders","orders"],"relatedFiles":["src/orders.ts"]}"#,
            ))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::CREATED);
        let json = body_json(resp).await;
        assert_eq!(json["category"], "business-rule");
        assert_eq!(json["tags"].as_array().unwrap().len(), 1);
        assert_eq!(json["relatedFiles"][0], "src/orders.ts");
        assert!(!json["id"].as_str().unwrap().is_empty());

        let resp = app
            .oneshot(Request::builder().uri("/api/v1/memories").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(body_json(resp).await.as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_create_memory_rejects_empty_content() {
        let resp = make_app()
            .oneshot(json_request(
                "POST",
                "/api/v1/memories",
                r#"{"content":"  ","category":"other"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let json = body_json(resp).await;
        assert_eq!(json["error"]["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn test_create_duplicate_id_conflicts() {
        let resp = make_app()
            .oneshot(json_request(
                "POST",
                "/api/v1/memories",
                r#"{"id":"m1","content":"again","category":"other"}"#,
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_update_memory() {
        let resp = make_app()
            .oneshot(json_request(
                "PATCH",
                "/api/v1/memories/m2",
                r#"{"importance":"high"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["importance"], "high");
        assert_eq!(json["content"], "Functions use camelCase");
    }

    #[tokio::test]
    async fn test_update_missing_memory() {
        let resp = make_app()
            .oneshot(json_request("PATCH", "/api/v1/memories/nope", r#"{}"#))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(resp).await["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_delete_memory_persists() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("memories.json");
        let store = JsonFileStore::open(&path).await.unwrap();
        for record in seed() {
            store.add(record).await.unwrap();
        }
        let app = memory_router(MemoryState {
            store: Arc::new(store),
        });

        let resp = app
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/api/v1/memories/m1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let reopened = JsonFileStore::open(&path).await.unwrap();
        let ids: Vec<String> = reopened.load_all().await.unwrap().into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["m2"]);
    }
}
