use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::{
    models::provider::ResourceProvider,
    schema::{aggregates, provider_aggregates},
    DbConnection,
};

/// An opaque UUID label grouping providers into reachability sets.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = aggregates)]
pub struct Aggregate {
    pub id: i64,
    pub uuid: Uuid,
}

/// Association table between providers and aggregates.
#[derive(Debug, Queryable, Insertable, Associations)]
#[diesel(table_name = provider_aggregates)]
#[diesel(belongs_to(ResourceProvider, foreign_key = resource_provider_id))]
#[diesel(belongs_to(Aggregate, foreign_key = aggregate_id))]
pub struct ProviderAggregate {
    pub resource_provider_id: i64,
    pub aggregate_id: i64,
}

impl Aggregate {
    /// Insert the aggregate row for `uuid` if absent and return it either way.
    pub async fn ensure<'a>(
        conn: &mut DbConnection<'a>,
        uuid: Uuid,
    ) -> Result<Self, diesel::result::Error> {
        diesel::insert_into(aggregates::table)
            .values(aggregates::uuid.eq(uuid))
            .on_conflict(aggregates::uuid)
            .do_nothing()
            .execute(conn)
            .await?;

        aggregates::table
            .filter(aggregates::uuid.eq(uuid))
            .select(Aggregate::as_select())
            .first(conn)
            .await
    }
}

impl ProviderAggregate {
    /// Replace the provider's aggregate memberships with `aggregate_ids`.
    pub async fn replace_for_provider<'a>(
        conn: &mut DbConnection<'a>,
        resource_provider_id: i64,
        aggregate_ids: Vec<i64>,
    ) -> Result<(), diesel::result::Error> {
        diesel::delete(provider_aggregates::table)
            .filter(provider_aggregates::resource_provider_id.eq(resource_provider_id))
            .execute(conn)
            .await?;

        diesel::insert_into(provider_aggregates::table)
            .values(
                aggregate_ids
                    .into_iter()
                    .map(|aggregate_id| {
                        (
                            provider_aggregates::resource_provider_id.eq(resource_provider_id),
                            provider_aggregates::aggregate_id.eq(aggregate_id),
                        )
                    })
                    .collect::<Vec<_>>(),
            )
            .execute(conn)
            .await?;
        Ok(())
    }

    /// Aggregate UUIDs per provider, for the given providers.
    pub async fn uuids_for_providers<'a>(
        conn: &mut DbConnection<'a>,
        provider_ids: Vec<i64>,
    ) -> Result<Vec<(i64, Uuid)>, diesel::result::Error> {
        provider_aggregates::table
            .inner_join(aggregates::table)
            .filter(provider_aggregates::resource_provider_id.eq_any(provider_ids))
            .select((provider_aggregates::resource_provider_id, aggregates::uuid))
            .load::<(i64, Uuid)>(conn)
            .await
    }
}
