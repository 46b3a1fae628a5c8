use crate::db::Database;
use crate::error::{AppError, AppResult};
use crate::models::collection::Collection;

pub struct CollectionService<'a> {
    db: &'a Database,
}

impl<'a> CollectionService<'a> {
    pub fn new(db: &'a Database) -> Self {
        CollectionService { db }
    }

    fn map_unique_violation(e: sqlx::Error, name: &str) -> AppError {
        if let Some(db_err) = e.as_database_error() {
            if db_err.code().as_deref() == Some("23505") {
                return AppError::BadRequest(format!(
                    "A collection named '{}' already exists",
                    name
                ));
            }
        }
        AppError::Database(e)
    }

    pub async fn create_collection(
        &self,
        user_id: i32,
        normalized_name: &str,
        description: Option<&str>,
    ) -> AppResult<Collection> {
        let collection: Collection = sqlx::query_as(
            r#"
            INSERT INTO collections (user_id, name, description)
            VALUES ($1, $2, $3)
            RETURNING collection_id, user_id, name, description, bucket_state, created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(normalized_name)
        .bind(description)
        .fetch_one(&self.db.pool)
        .await
        .map_err(|e| Self::map_unique_violation(e, normalized_name))?;

        Ok(collection)
    }

    pub async fn get_collection_by_id(&self, collection_id: i32) -> AppResult<Option<Collection>> {
        let result = sqlx::query_as::<_, Collection>(
            r#"
            SELECT collection_id, user_id, name, description, bucket_state, created_at, updated_at
            FROM collections
            WHERE collection_id = $1
            "#,
        )
        .bind(collection_id)
        .fetch_optional(&self.db.pool)
        .await?;

        Ok(result)
    }

    pub async fn get_collection_by_name_and_user(
        &self,
        name: &str,
        user_id: i32,
    ) -> AppResult<Option<Collection>> {
        let result = sqlx::query_as::<_, Collection>(
            r#"
            SELECT collection_id, user_id, name, description, bucket_state, created_at, updated_at
            FROM collections
            WHERE name = $1 AND user_id = $2
            "#,
        )
        .bind(name)
        .bind(user_id)
        .fetch_optional(&self.db.pool)
        .await?;

        Ok(result)
    }

    pub async fn get_all_collections(&self) -> AppResult<Vec<Collection>> {
        let collections = sqlx::query_as::<_, Collection>(
            r#"
            SELECT collection_id, user_id, name, description, bucket_state, created_at, updated_at
            FROM collections
            ORDER BY collection_id
            "#,
        )
        .fetch_all(&self.db.pool)
        .await?;

        Ok(collections)
    }

    pub async fn update_collection(
        &self,
        collection_id: i32,
        name: Option<&str>,
        description: Option<&str>,
    ) -> AppResult<Collection> {
        let existing = self
            .get_collection_by_id(collection_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Collection not found".to_string()))?;

        let new_name = name.unwrap_or(&existing.name);
        let collection: Collection = sqlx::query_as(
            r#"
            UPDATE collections
            SET name = $1, description = $2, updated_at = now()
            WHERE collection_id = $3
            RETURNING collection_id, user_id, name, description, bucket_state, created_at, updated_at
            "#,
        )
        .bind(new_name)
        .bind(description.or(existing.description.as_deref()))
        .bind(collection_id)
        .fetch_one(&self.db.pool)
        .await
        .map_err(|e| Self::map_unique_violation(e, new_name))?;

        Ok(collection)
    }

    /// Records the best-effort bucket side channel; intentionally not part of
    /// any transaction with the collection row itself.
    pub async fn set_bucket_state(&self, collection_id: i32, state: &str) -> AppResult<()> {
        sqlx::query("UPDATE collections SET bucket_state = $1 WHERE collection_id = $2")
            .bind(state)
            .bind(collection_id)
            .execute(&self.db.pool)
            .await?;

        Ok(())
    }

    /// Deletes the collection row; documents and chunks cascade.
    pub async fn delete_collection(&self, collection_id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM collections WHERE collection_id = $1")
            .bind(collection_id)
            .execute(&self.db.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Collection not found".to_string()));
        }

        Ok(())
    }
}
