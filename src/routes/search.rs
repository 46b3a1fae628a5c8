use actix_web::{web, HttpResponse};
use std::sync::Arc;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::{AuthMiddleware, AuthUser};
use crate::models::role::Permission;
use crate::models::search::SearchRequest;
use crate::retrieval::ranker::{SimilarityRanker, TracingObserver};
use crate::services::search::SearchService;
use crate::AppState;

pub fn create_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("")
            .wrap(AuthMiddleware)
            .route(web::post().to(search)),
    );
}

async fn search(
    state: web::Data<AppState>,
    auth_user: AuthUser,
    payload: web::Json<SearchRequest>,
) -> AppResult<HttpResponse> {
    auth_user.require(Permission::DocRead)?;

    if payload.query.trim().is_empty() {
        return Err(AppError::BadRequest("Query must not be empty".to_string()));
    }

    let service = SearchService::new(
        state.chunks.clone(),
        state.embeddings.clone(),
        SimilarityRanker::new(Arc::new(TracingObserver)),
        state.config.embedding_slot.clone(),
    );

    let response = service.search(&payload).await?;

    Ok(HttpResponse::Ok().json(response))
}
