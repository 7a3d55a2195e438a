use chrono::NaiveDateTime;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::{schema::resource_providers, DbConnection};

/// Table that holds the resource providers.
/// The name is guaranteed to be unique, as is the external UUID.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = resource_providers)]
pub struct ResourceProvider {
    /// The ID of the provider as stored in the database. For the external
    /// identity, use `uuid`.
    pub id: i64,
    pub uuid: Uuid,
    pub name: String,
    /// Bumped on every inventory mutation. Consumed by the allocation
    /// writer for optimistic concurrency, never read by the engine.
    pub generation: i32,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl ResourceProvider {
    pub async fn create<'a>(
        conn: &mut DbConnection<'a>,
        name: String,
        uuid: Uuid,
    ) -> Result<Self, diesel::result::Error> {
        let provider = diesel::insert_into(resource_providers::table)
            .values((
                resource_providers::name.eq(name),
                resource_providers::uuid.eq(uuid),
                resource_providers::generation.eq(0),
            ))
            .returning(ResourceProvider::as_select())
            .get_result(conn)
            .await?;

        Ok(provider)
    }

    pub async fn get_by_ids<'a>(
        conn: &mut DbConnection<'a>,
        ids: Vec<i64>,
    ) -> Result<Vec<Self>, diesel::result::Error> {
        resource_providers::table
            .filter(resource_providers::id.eq_any(ids))
            .load::<Self>(conn)
            .await
    }

    /// Increment the generation counter. Every inventory mutation goes
    /// through this so concurrent writers can detect a stale view.
    pub async fn bump_generation<'a>(
        conn: &mut DbConnection<'a>,
        id: i64,
    ) -> Result<(), diesel::result::Error> {
        diesel::update(resource_providers::table.find(id))
            .set(resource_providers::generation.eq(resource_providers::generation + 1))
            .execute(conn)
            .await?;
        Ok(())
    }
}
