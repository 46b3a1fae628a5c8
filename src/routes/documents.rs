use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use futures_util::StreamExt;
use tracing::warn;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::{AuthMiddleware, AuthUser};
use crate::models::document::DocumentResponse;
use crate::models::role::Permission;
use crate::services::collection::CollectionService;
use crate::services::document::DocumentService;
use crate::services::ingest::IngestionService;
use crate::utils::text::normalize_filename;
use crate::AppState;

pub fn create_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("")
            .wrap(AuthMiddleware)
            .route(web::get().to(list_documents)),
    )
    .service(
        web::resource("/upload/{collection_id}")
            .wrap(AuthMiddleware)
            .route(web::post().to(upload_document)),
    )
    .service(
        web::resource("/{document_id}")
            .wrap(AuthMiddleware)
            .route(web::get().to(get_document))
            .route(web::delete().to(delete_document)),
    )
    .service(
        web::resource("/{document_id}/chunks")
            .wrap(AuthMiddleware)
            .route(web::get().to(list_document_chunks)),
    );
}

/// Reads the `file` field and the optional `title` text field of a multipart
/// upload, rejecting payloads over the configured limit while they stream in.
async fn read_upload(
    payload: &mut Multipart,
    max_size: usize,
) -> AppResult<(String, Option<String>, Vec<u8>)> {
    let mut filename: Option<String> = None;
    let mut title: Option<String> = None;
    let mut file_data: Option<Vec<u8>> = None;

    while let Some(item) = payload.next().await {
        let mut field =
            item.map_err(|e| AppError::BadRequest(format!("Multipart error: {}", e)))?;
        let content_disposition = field.content_disposition();
        let field_name = content_disposition
            .as_ref()
            .and_then(|cd| cd.get_name())
            .unwrap_or("");

        if field_name == "file" {
            filename = content_disposition
                .as_ref()
                .and_then(|cd| cd.get_filename())
                .map(|s| s.to_string());

            let mut data = Vec::new();
            while let Some(chunk) = field.next().await {
                let chunk =
                    chunk.map_err(|e| AppError::BadRequest(format!("Chunk error: {}", e)))?;
                if data.len() + chunk.len() > max_size {
                    return Err(AppError::PayloadTooLarge(format!(
                        "File exceeds the {} byte upload limit",
                        max_size
                    )));
                }
                data.extend_from_slice(&chunk);
            }
            file_data = Some(data);
        } else if field_name == "title" {
            let mut data = Vec::new();
            while let Some(chunk) = field.next().await {
                let chunk =
                    chunk.map_err(|e| AppError::BadRequest(format!("Chunk error: {}", e)))?;
                data.extend_from_slice(&chunk);
            }
            title = Some(
                String::from_utf8(data)
                    .map_err(|_| AppError::BadRequest("Title must be valid UTF-8".to_string()))?,
            );
        }
    }

    let filename =
        filename.ok_or_else(|| AppError::BadRequest("Missing file field".to_string()))?;
    let file_data =
        file_data.ok_or_else(|| AppError::BadRequest("Missing file field".to_string()))?;

    Ok((filename, title, file_data))
}

async fn upload_document(
    state: web::Data<AppState>,
    auth_user: AuthUser,
    path: web::Path<i32>,
    mut payload: Multipart,
) -> AppResult<HttpResponse> {
    auth_user.require(Permission::DocWrite)?;

    let collection_id = path.into_inner();
    let collection = CollectionService::new(&state.db)
        .get_collection_by_id(collection_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Collection not found".to_string()))?;

    let (filename, title, bytes) = read_upload(&mut payload, state.config.max_upload_size).await?;
    // The display title defaults to the original filename
    let title = title.unwrap_or_else(|| filename.clone());

    if DocumentService::new(&state.db)
        .find_by_stored_name(collection_id, &normalize_filename(&filename))
        .await?
        .is_some()
    {
        return Err(AppError::BadRequest(format!(
            "A document named '{}' already exists in this collection",
            filename
        )));
    }

    let ingestion = IngestionService::new(
        state.chunks.clone(),
        state.embeddings.clone(),
        state.storage.clone(),
        state.config.max_upload_size,
        state.config.max_chunk_words,
        state.config.embedding_slot.clone(),
    );

    let response = ingestion
        .ingest(&collection, &filename, &title, &bytes, &auth_user.user.username)
        .await?;

    Ok(HttpResponse::Created().json(response))
}

async fn list_documents(state: web::Data<AppState>, auth_user: AuthUser) -> AppResult<HttpResponse> {
    auth_user.require(Permission::DocRead)?;

    let collection_service = CollectionService::new(&state.db);
    let documents = DocumentService::new(&state.db).get_all_documents().await?;

    let mut responses = Vec::with_capacity(documents.len());
    for document in documents {
        let collection_name = collection_service
            .get_collection_by_id(document.collection_id)
            .await?
            .map(|c| c.name)
            .unwrap_or_default();
        responses.push(DocumentResponse::from_document(document, collection_name));
    }

    Ok(HttpResponse::Ok().json(responses))
}

async fn get_document(
    state: web::Data<AppState>,
    auth_user: AuthUser,
    path: web::Path<i32>,
) -> AppResult<HttpResponse> {
    auth_user.require(Permission::DocRead)?;

    let document = DocumentService::new(&state.db)
        .get_document_by_id(path.into_inner())
        .await?
        .ok_or_else(|| AppError::NotFound("Document not found".to_string()))?;

    let collection_name = CollectionService::new(&state.db)
        .get_collection_by_id(document.collection_id)
        .await?
        .map(|c| c.name)
        .unwrap_or_default();

    Ok(HttpResponse::Ok().json(DocumentResponse::from_document(document, collection_name)))
}

async fn list_document_chunks(
    state: web::Data<AppState>,
    auth_user: AuthUser,
    path: web::Path<i32>,
) -> AppResult<HttpResponse> {
    auth_user.require(Permission::DocRead)?;

    let document_service = DocumentService::new(&state.db);
    let document_id = path.into_inner();

    if document_service.get_document_by_id(document_id).await?.is_none() {
        return Err(AppError::NotFound("Document not found".to_string()));
    }

    let chunks = document_service.get_chunks_by_document(document_id).await?;

    Ok(HttpResponse::Ok().json(chunks))
}

async fn delete_document(
    state: web::Data<AppState>,
    auth_user: AuthUser,
    path: web::Path<i32>,
) -> AppResult<HttpResponse> {
    auth_user.require(Permission::DocDelete)?;

    let document_service = DocumentService::new(&state.db);
    let document_id = path.into_inner();

    let document = document_service
        .get_document_by_id(document_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Document not found".to_string()))?;

    // Best-effort removal of the raw file; the catalog rows are authoritative
    if let Some((bucket, object)) = parse_storage_uri(&document.storage_uri) {
        if let Err(e) = state.storage.remove_object(bucket, object).await {
            warn!(document_id, "Failed to remove stored object: {}", e);
        }
    }

    state.chunks.delete_document_chunks(document_id).await?;
    document_service.delete_document(document_id).await?;

    tracing::info!(document_id, stored_name = %document.stored_name, "Document deleted");

    Ok(HttpResponse::NoContent().finish())
}

/// Splits `/{bucket}/{object}` into its two components.
fn parse_storage_uri(uri: &str) -> Option<(&str, &str)> {
    uri.strip_prefix('/')?.split_once('/')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_uri_splits_into_bucket_and_object() {
        assert_eq!(
            parse_storage_uri("/collection-1-demo/a.txt"),
            Some(("collection-1-demo", "a.txt"))
        );
        assert_eq!(parse_storage_uri("no-leading-slash"), None);
    }
}
