use crate::error::AppError;
use crate::models::role::Permission;
use crate::models::User;
use crate::services::user::UserService;
use crate::utils::auth::verify_jwt;
use crate::AppState;
use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    error::Error as ActixError,
    http::header,
    web, HttpMessage,
};
use futures_util::future::{ready, LocalBoxFuture, Ready};
use std::collections::HashSet;
use std::rc::Rc;

/// Authenticated principal, resolved once per request by [`AuthMiddleware`]
/// and handed to handlers through request extensions.
#[derive(Clone)]
pub struct AuthUser {
    pub user: User,
    pub permissions: HashSet<Permission>,
}

impl AuthUser {
    /// Capability check for a handler. Missing permission means 403 with a
    /// human-readable description of what was required.
    pub fn require(&self, permission: Permission) -> Result<(), AppError> {
        if self.permissions.contains(&permission) {
            Ok(())
        } else {
            Err(AppError::Forbidden(format!(
                "You are not allowed to {}",
                permission.describe()
            )))
        }
    }
}

impl std::ops::Deref for AuthUser {
    type Target = User;

    fn deref(&self) -> &Self::Target {
        &self.user
    }
}

// Extractor for AuthUser from request extensions
impl actix_web::FromRequest for AuthUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &actix_web::HttpRequest, _: &mut actix_web::dev::Payload) -> Self::Future {
        let result = req
            .extensions()
            .get::<AuthUser>()
            .cloned()
            .ok_or_else(|| AppError::Unauthorized("Not authenticated".to_string()));

        ready(result)
    }
}

// Auth middleware factory
pub struct AuthMiddleware;

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = ActixError> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = ActixError;
    type InitError = ();
    type Transform = AuthMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService {
            service: Rc::new(service),
        }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = ActixError> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = ActixError;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();

        Box::pin(async move {
            let state = req
                .app_data::<web::Data<AppState>>()
                .ok_or_else(|| AppError::InternalServerError("App state not found".to_string()))?;

            // Bearer header first, cookie as a fallback
            let token = req
                .headers()
                .get(header::AUTHORIZATION)
                .and_then(|h| h.to_str().ok())
                .and_then(|s| s.strip_prefix("Bearer "))
                .map(|s| s.to_string())
                .or_else(|| req.cookie("token").map(|c| c.value().to_string()))
                .ok_or_else(|| AppError::Unauthorized("Missing authorization token".to_string()))?;

            let claims = verify_jwt(&token, &state.config.jwt_secret).map_err(|e| {
                tracing::debug!("JWT verification failed: {:?}", e);
                AppError::Unauthorized("Invalid or expired token".to_string())
            })?;

            if let Some(exp) = claims.exp {
                let now = chrono::Utc::now().timestamp();
                if now > exp {
                    return Err(AppError::Unauthorized("Token expired".to_string()).into());
                }
            }

            let user_id: i32 = claims
                .sub
                .parse()
                .map_err(|_| AppError::Unauthorized("Invalid token subject".to_string()))?;

            let user_service = UserService::new(&state.db);
            let user = user_service
                .get_user_by_id(user_id)
                .await?
                .ok_or_else(|| AppError::Unauthorized("User not found".to_string()))?;

            let permissions = match user_service.get_role_by_id(user.role_id).await? {
                Some(role) => role.permission_set(),
                None => HashSet::new(),
            };

            req.extensions_mut().insert(AuthUser { user, permissions });

            let res = service.call(req).await?;
            Ok(res)
        })
    }
}
