use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::child::Child;
use crate::utils::errors::AppError;

#[async_trait]
pub trait ChildStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Child>, AppError>;
}

pub struct ChildRepository {
    pool: PgPool,
}

impl ChildRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ChildStore for ChildRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Child>, AppError> {
        let child = sqlx::query_as::<_, Child>("SELECT * FROM children WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(child)
    }
}
