use actix_web::{web, HttpResponse};
use tracing::warn;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::{AuthMiddleware, AuthUser};
use crate::models::collection::{CreateCollectionRequest, UpdateCollectionRequest};
use crate::models::document::DocumentResponse;
use crate::models::role::Permission;
use crate::services::collection::CollectionService;
use crate::services::document::DocumentService;
use crate::utils::text::normalize_collection_name;
use crate::AppState;

pub fn create_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("")
            .wrap(AuthMiddleware)
            .route(web::get().to(list_collections))
            .route(web::post().to(create_collection)),
    )
    .service(
        web::resource("/{collection_id}")
            .wrap(AuthMiddleware)
            .route(web::get().to(get_collection))
            .route(web::put().to(update_collection))
            .route(web::delete().to(delete_collection)),
    )
    .service(
        web::resource("/{collection_id}/documents")
            .wrap(AuthMiddleware)
            .route(web::get().to(list_collection_documents)),
    );
}

async fn create_collection(
    state: web::Data<AppState>,
    auth_user: AuthUser,
    payload: web::Json<CreateCollectionRequest>,
) -> AppResult<HttpResponse> {
    auth_user.require(Permission::CollectionWrite)?;
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let collection_service = CollectionService::new(&state.db);
    let name = normalize_collection_name(&payload.name);

    if collection_service
        .get_collection_by_name_and_user(&name, auth_user.user.user_id)
        .await?
        .is_some()
    {
        return Err(AppError::BadRequest(format!(
            "You already have a collection named '{}'",
            name
        )));
    }

    let collection = collection_service
        .create_collection(auth_user.user.user_id, &name, payload.description.as_deref())
        .await?;

    // Bucket creation is best-effort; the collection row is the source of
    // truth and the outcome is recorded on it.
    let bucket_state = match state.storage.ensure_bucket(&collection.bucket_name()).await {
        Ok(bucket_state) => bucket_state.as_str().to_string(),
        Err(e) => {
            warn!(
                collection_id = collection.collection_id,
                "Bucket creation failed: {}", e
            );
            "error".to_string()
        }
    };
    collection_service
        .set_bucket_state(collection.collection_id, &bucket_state)
        .await?;

    let collection = collection_service
        .get_collection_by_id(collection.collection_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Collection not found".to_string()))?;

    tracing::info!(
        collection_id = collection.collection_id,
        name = %collection.name,
        bucket_state = %bucket_state,
        "Collection created"
    );

    Ok(HttpResponse::Created().json(collection))
}

async fn list_collections(
    state: web::Data<AppState>,
    auth_user: AuthUser,
) -> AppResult<HttpResponse> {
    auth_user.require(Permission::CollectionRead)?;

    let collections = CollectionService::new(&state.db).get_all_collections().await?;

    Ok(HttpResponse::Ok().json(collections))
}

async fn get_collection(
    state: web::Data<AppState>,
    auth_user: AuthUser,
    path: web::Path<i32>,
) -> AppResult<HttpResponse> {
    auth_user.require(Permission::CollectionRead)?;

    let collection = CollectionService::new(&state.db)
        .get_collection_by_id(path.into_inner())
        .await?
        .ok_or_else(|| AppError::NotFound("Collection not found".to_string()))?;

    Ok(HttpResponse::Ok().json(collection))
}

async fn update_collection(
    state: web::Data<AppState>,
    auth_user: AuthUser,
    path: web::Path<i32>,
    payload: web::Json<UpdateCollectionRequest>,
) -> AppResult<HttpResponse> {
    auth_user.require(Permission::CollectionWrite)?;

    let collection_service = CollectionService::new(&state.db);
    let collection_id = path.into_inner();

    let existing = collection_service
        .get_collection_by_id(collection_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Collection not found".to_string()))?;

    let new_name = payload.name.as_deref().map(normalize_collection_name);

    if let Some(name) = &new_name {
        if *name != existing.name {
            if collection_service
                .get_collection_by_name_and_user(name, existing.user_id)
                .await?
                .is_some()
            {
                return Err(AppError::BadRequest(format!(
                    "A collection named '{}' already exists",
                    name
                )));
            }
        }
    }

    let collection = collection_service
        .update_collection(collection_id, new_name.as_deref(), payload.description.as_deref())
        .await?;

    // Keep the bucket name in line with the collection name, best-effort
    if collection.name != existing.name {
        if let Err(e) = state
            .storage
            .rename_bucket(&existing.bucket_name(), &collection.bucket_name())
            .await
        {
            warn!(collection_id, "Bucket rename failed: {}", e);
            collection_service.set_bucket_state(collection_id, "error").await?;
        }
    }

    Ok(HttpResponse::Ok().json(collection))
}

async fn delete_collection(
    state: web::Data<AppState>,
    auth_user: AuthUser,
    path: web::Path<i32>,
) -> AppResult<HttpResponse> {
    auth_user.require(Permission::CollectionDelete)?;

    let collection_service = CollectionService::new(&state.db);
    let collection_id = path.into_inner();

    let collection = collection_service
        .get_collection_by_id(collection_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Collection not found".to_string()))?;

    // The raw files must be gone before the rows; a failure here aborts the
    // delete so the catalog never points at orphaned state.
    match state.storage.remove_bucket(&collection.bucket_name()).await {
        Ok(()) => {}
        Err(e) if collection.bucket_state.as_deref() == Some("error") => {
            // The bucket never existed; nothing to clean up.
            warn!(collection_id, "Skipping bucket removal: {}", e);
        }
        Err(e) => return Err(e),
    }

    collection_service.delete_collection(collection_id).await?;

    tracing::info!(collection_id, name = %collection.name, "Collection deleted");

    Ok(HttpResponse::NoContent().finish())
}

async fn list_collection_documents(
    state: web::Data<AppState>,
    auth_user: AuthUser,
    path: web::Path<i32>,
) -> AppResult<HttpResponse> {
    auth_user.require(Permission::DocRead)?;

    let collection_id = path.into_inner();
    let collection = CollectionService::new(&state.db)
        .get_collection_by_id(collection_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Collection not found".to_string()))?;

    let documents = DocumentService::new(&state.db)
        .get_documents_by_collection(collection_id)
        .await?;
    let responses: Vec<DocumentResponse> = documents
        .into_iter()
        .map(|d| DocumentResponse::from_document(d, collection.name.clone()))
        .collect();

    Ok(HttpResponse::Ok().json(responses))
}
