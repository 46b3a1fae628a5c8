use crate::db::Database;
use crate::error::{AppError, AppResult};
use crate::models::role::{Role, RoleSummary};
use crate::models::user::User;

pub struct UserService<'a> {
    db: &'a Database,
}

impl<'a> UserService<'a> {
    pub fn new(db: &'a Database) -> Self {
        UserService { db }
    }

    pub async fn create_user(
        &self,
        username: &str,
        password_hash: &str,
        email: &str,
        role_id: i32,
    ) -> AppResult<User> {
        let user: User = sqlx::query_as(
            r#"
            INSERT INTO users (username, password_hash, email, role_id)
            VALUES ($1, $2, $3, $4)
            RETURNING user_id, username, password_hash, email, role_id, created_at
            "#,
        )
        .bind(username)
        .bind(password_hash)
        .bind(email)
        .bind(role_id)
        .fetch_one(&self.db.pool)
        .await?;

        Ok(user)
    }

    pub async fn get_user_by_id(&self, user_id: i32) -> AppResult<Option<User>> {
        let result = sqlx::query_as::<_, User>(
            r#"
            SELECT user_id, username, password_hash, email, role_id, created_at
            FROM users
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.db.pool)
        .await?;

        Ok(result)
    }

    pub async fn get_user_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let result = sqlx::query_as::<_, User>(
            r#"
            SELECT user_id, username, password_hash, email, role_id, created_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.db.pool)
        .await?;

        Ok(result)
    }

    pub async fn get_all_users(&self) -> AppResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT user_id, username, password_hash, email, role_id, created_at
            FROM users
            ORDER BY user_id
            "#,
        )
        .fetch_all(&self.db.pool)
        .await?;

        Ok(users)
    }

    pub async fn update_user(
        &self,
        user_id: i32,
        username: Option<&str>,
        password_hash: Option<&str>,
        email: Option<&str>,
        role_id: Option<i32>,
    ) -> AppResult<User> {
        let existing = self
            .get_user_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        let user: User = sqlx::query_as(
            r#"
            UPDATE users
            SET username = $1, password_hash = $2, email = $3, role_id = $4
            WHERE user_id = $5
            RETURNING user_id, username, password_hash, email, role_id, created_at
            "#,
        )
        .bind(username.unwrap_or(&existing.username))
        .bind(password_hash.unwrap_or(&existing.password_hash))
        .bind(email.unwrap_or(&existing.email))
        .bind(role_id.unwrap_or(existing.role_id))
        .bind(user_id)
        .fetch_one(&self.db.pool)
        .await?;

        Ok(user)
    }

    pub async fn delete_user(&self, user_id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM users WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.db.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("User not found".to_string()));
        }

        Ok(())
    }

    pub async fn get_role_by_id(&self, role_id: i32) -> AppResult<Option<Role>> {
        let result = sqlx::query_as::<_, Role>(
            r#"
            SELECT role_id, role_name, description, permissions
            FROM roles
            WHERE role_id = $1
            "#,
        )
        .bind(role_id)
        .fetch_optional(&self.db.pool)
        .await?;

        Ok(result)
    }

    pub async fn get_role_by_name(&self, role_name: &str) -> AppResult<Option<Role>> {
        let result = sqlx::query_as::<_, Role>(
            r#"
            SELECT role_id, role_name, description, permissions
            FROM roles
            WHERE role_name = $1
            "#,
        )
        .bind(role_name)
        .fetch_optional(&self.db.pool)
        .await?;

        Ok(result)
    }

    pub async fn get_role_summaries(&self) -> AppResult<Vec<RoleSummary>> {
        let roles = sqlx::query_as::<_, RoleSummary>(
            r#"
            SELECT role_id, role_name, description
            FROM roles
            ORDER BY role_id
            "#,
        )
        .fetch_all(&self.db.pool)
        .await?;

        Ok(roles)
    }
}
