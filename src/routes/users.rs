use actix_web::{web, HttpResponse};
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::{AuthMiddleware, AuthUser};
use crate::models::role::Permission;
use crate::models::user::{CreateUserRequest, UpdateUserRequest, UserResponse};
use crate::services::user::UserService;
use crate::utils::password::hash_password;
use crate::AppState;

pub fn create_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("")
            .wrap(AuthMiddleware)
            .route(web::get().to(list_users))
            .route(web::post().to(create_user)),
    )
    .service(
        web::resource("/{user_id}")
            .wrap(AuthMiddleware)
            .route(web::get().to(get_user))
            .route(web::put().to(update_user))
            .route(web::delete().to(delete_user)),
    );
}

pub fn role_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("")
            .wrap(AuthMiddleware)
            .route(web::get().to(list_roles)),
    );
}

async fn create_user(
    state: web::Data<AppState>,
    auth_user: AuthUser,
    payload: web::Json<CreateUserRequest>,
) -> AppResult<HttpResponse> {
    auth_user.require(Permission::UserWrite)?;
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let user_service = UserService::new(&state.db);

    if user_service
        .get_user_by_username(&payload.username)
        .await?
        .is_some()
    {
        return Err(AppError::BadRequest("Username already taken".to_string()));
    }

    if user_service.get_role_by_id(payload.role_id).await?.is_none() {
        return Err(AppError::BadRequest(format!(
            "Role {} does not exist",
            payload.role_id
        )));
    }

    let password_hash = hash_password(&payload.password)?;
    let user = user_service
        .create_user(&payload.username, &password_hash, &payload.email, payload.role_id)
        .await?;

    tracing::info!(user_id = user.user_id, username = %user.username, "User created");

    Ok(HttpResponse::Created().json(UserResponse::from(user)))
}

async fn list_users(state: web::Data<AppState>, auth_user: AuthUser) -> AppResult<HttpResponse> {
    auth_user.require(Permission::UserRead)?;

    let users = UserService::new(&state.db).get_all_users().await?;
    let responses: Vec<UserResponse> = users.into_iter().map(UserResponse::from).collect();

    Ok(HttpResponse::Ok().json(responses))
}

async fn get_user(
    state: web::Data<AppState>,
    auth_user: AuthUser,
    path: web::Path<i32>,
) -> AppResult<HttpResponse> {
    auth_user.require(Permission::UserRead)?;

    let user = UserService::new(&state.db)
        .get_user_by_id(path.into_inner())
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(HttpResponse::Ok().json(UserResponse::from(user)))
}

async fn update_user(
    state: web::Data<AppState>,
    auth_user: AuthUser,
    path: web::Path<i32>,
    payload: web::Json<UpdateUserRequest>,
) -> AppResult<HttpResponse> {
    auth_user.require(Permission::UserWrite)?;

    let user_service = UserService::new(&state.db);
    let user_id = path.into_inner();

    if let Some(role_id) = payload.role_id {
        if user_service.get_role_by_id(role_id).await?.is_none() {
            return Err(AppError::BadRequest(format!("Role {} does not exist", role_id)));
        }
    }

    let password_hash = match &payload.password {
        Some(password) => Some(hash_password(password)?),
        None => None,
    };

    let user = user_service
        .update_user(
            user_id,
            payload.username.as_deref(),
            password_hash.as_deref(),
            payload.email.as_deref(),
            payload.role_id,
        )
        .await?;

    Ok(HttpResponse::Ok().json(UserResponse::from(user)))
}

async fn delete_user(
    state: web::Data<AppState>,
    auth_user: AuthUser,
    path: web::Path<i32>,
) -> AppResult<HttpResponse> {
    auth_user.require(Permission::UserDelete)?;

    let user_id = path.into_inner();
    if user_id == auth_user.user.user_id {
        return Err(AppError::BadRequest(
            "You cannot delete your own account".to_string(),
        ));
    }

    UserService::new(&state.db).delete_user(user_id).await?;

    Ok(HttpResponse::NoContent().finish())
}

async fn list_roles(state: web::Data<AppState>, auth_user: AuthUser) -> AppResult<HttpResponse> {
    auth_user.require(Permission::UserRead)?;

    let roles = UserService::new(&state.db).get_role_summaries().await?;

    Ok(HttpResponse::Ok().json(roles))
}
