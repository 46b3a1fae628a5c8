use serde::{Deserialize, Serialize};

use crate::models::role::RoleResponse;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct TokenForm {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub user_id: i32,
    pub username: String,
    pub access_token: String,
    pub token_type: String,
    pub expires_in: String,
    pub role: RoleResponse,
}
