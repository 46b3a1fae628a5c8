use actix_web::{web, HttpResponse};

use crate::error::{AppError, AppResult};
use crate::models::auth::{TokenForm, TokenResponse};
use crate::services::user::UserService;
use crate::utils::auth::create_jwt;
use crate::utils::password::verify_password;
use crate::AppState;

pub fn create_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/token", web::post().to(issue_token));
}

/// Password login. Returns a bearer token together with the caller's role
/// so clients can adapt their UI without a second round trip.
async fn issue_token(
    state: web::Data<AppState>,
    form: web::Form<TokenForm>,
) -> AppResult<HttpResponse> {
    let user_service = UserService::new(&state.db);

    let user = user_service
        .get_user_by_username(&form.username)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    if !verify_password(&form.password, &user.password_hash)? {
        return Err(AppError::InvalidCredentials);
    }

    let role = user_service
        .get_role_by_id(user.role_id)
        .await?
        .ok_or_else(|| AppError::InternalServerError("Role not found for user".to_string()))?;

    let token = create_jwt(user.user_id, &state.config.jwt_secret, &state.config.token_expiry)?;

    tracing::info!(user_id = user.user_id, username = %user.username, "Token issued");

    Ok(HttpResponse::Ok().json(TokenResponse {
        user_id: user.user_id,
        username: user.username,
        access_token: token,
        token_type: "bearer".to_string(),
        expires_in: state.config.token_expiry.clone(),
        role: role.into(),
    }))
}
