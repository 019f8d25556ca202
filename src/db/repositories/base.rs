//! CRUD shared by every record kind.

use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, DatabaseConnection, EntityName, EntityTrait,
    IntoActiveModel, PrimaryKeyTrait,
};
use std::marker::PhantomData;

/// Read and delete operations parameterized by a `SeaORM` entity.
///
/// Create and update need per-kind input types, so they live on the
/// entity-specific repositories that wrap this one.
pub struct CrudRepository<E: EntityTrait> {
    conn: DatabaseConnection,
    _entity: PhantomData<E>,
}

impl<E: EntityTrait> CrudRepository<E> {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self {
            conn,
            _entity: PhantomData,
        }
    }

    /// Point lookup by primary key. A miss is `Ok(None)`, never an error.
    pub async fn get<K>(&self, id: K) -> Result<Option<E::Model>>
    where
        K: Into<<E::PrimaryKey as PrimaryKeyTrait>::ValueType>,
    {
        E::find_by_id(id)
            .one(&self.conn)
            .await
            .with_context(|| format!("Failed to query {}", E::default().table_name()))
    }

    /// Every row, in storage order.
    pub async fn list_all(&self) -> Result<Vec<E::Model>> {
        E::find()
            .all(&self.conn)
            .await
            .with_context(|| format!("Failed to list {}", E::default().table_name()))
    }

    /// Removes the row and hands back its prior state.
    pub async fn delete<A>(&self, model: E::Model) -> Result<E::Model>
    where
        E::Model: IntoActiveModel<A>,
        A: ActiveModelTrait<Entity = E> + ActiveModelBehavior + Send,
    {
        model
            .clone()
            .into_active_model()
            .delete(&self.conn)
            .await
            .with_context(|| format!("Failed to delete from {}", E::default().table_name()))?;

        Ok(model)
    }
}
