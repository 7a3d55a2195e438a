use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::{
    models::provider::ResourceProvider,
    schema::{provider_traits, traits},
    DbConnection,
};

/// A qualitative capability attached to providers by name.
/// Standard names are synced from the catalog at store initialization;
/// custom names carry the `CUSTOM_` prefix and are registered on demand.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = traits)]
pub struct Trait {
    pub id: i32,
    pub name: String,
}

/// Association table between providers and traits.
#[derive(Debug, Queryable, Insertable, Associations)]
#[diesel(table_name = provider_traits)]
#[diesel(belongs_to(ResourceProvider, foreign_key = resource_provider_id))]
#[diesel(belongs_to(Trait, foreign_key = trait_id))]
pub struct ProviderTrait {
    pub resource_provider_id: i64,
    pub trait_id: i32,
}

impl Trait {
    /// Insert the name if it is not present yet and return the stable row.
    /// Existing names keep their id forever.
    pub async fn ensure<'a>(
        conn: &mut DbConnection<'a>,
        name: String,
    ) -> Result<Self, diesel::result::Error> {
        diesel::insert_into(traits::table)
            .values(traits::name.eq(&name))
            .on_conflict(traits::name)
            .do_nothing()
            .execute(conn)
            .await?;

        traits::table
            .filter(traits::name.eq(name))
            .first(conn)
            .await
    }

    pub async fn get_by_names<'a>(
        conn: &mut DbConnection<'a>,
        names: Vec<String>,
    ) -> Result<Vec<Self>, diesel::result::Error> {
        traits::table
            .filter(traits::name.eq_any(names))
            .load::<Self>(conn)
            .await
    }

    pub async fn get_by_ids<'a>(
        conn: &mut DbConnection<'a>,
        ids: Vec<i32>,
    ) -> Result<Vec<Self>, diesel::result::Error> {
        traits::table
            .filter(traits::id.eq_any(ids))
            .load::<Self>(conn)
            .await
    }
}

impl ProviderTrait {
    /// Replace the provider's trait set with `trait_ids`.
    pub async fn replace_for_provider<'a>(
        conn: &mut DbConnection<'a>,
        resource_provider_id: i64,
        trait_ids: Vec<i32>,
    ) -> Result<(), diesel::result::Error> {
        diesel::delete(provider_traits::table)
            .filter(provider_traits::resource_provider_id.eq(resource_provider_id))
            .execute(conn)
            .await?;

        diesel::insert_into(provider_traits::table)
            .values(
                trait_ids
                    .into_iter()
                    .map(|trait_id| {
                        (
                            provider_traits::resource_provider_id.eq(resource_provider_id),
                            provider_traits::trait_id.eq(trait_id),
                        )
                    })
                    .collect::<Vec<_>>(),
            )
            .execute(conn)
            .await?;
        Ok(())
    }

    pub async fn get_for_providers<'a>(
        conn: &mut DbConnection<'a>,
        provider_ids: Vec<i64>,
    ) -> Result<Vec<(i64, i32)>, diesel::result::Error> {
        provider_traits::table
            .filter(provider_traits::resource_provider_id.eq_any(provider_ids))
            .select((
                provider_traits::resource_provider_id,
                provider_traits::trait_id,
            ))
            .load::<(i64, i32)>(conn)
            .await
    }

    /// Ids of every provider holding the given trait.
    pub async fn providers_with<'a>(
        conn: &mut DbConnection<'a>,
        trait_id: i32,
    ) -> Result<Vec<i64>, diesel::result::Error> {
        provider_traits::table
            .filter(provider_traits::trait_id.eq(trait_id))
            .select(provider_traits::resource_provider_id)
            .load::<i64>(conn)
            .await
    }
}
