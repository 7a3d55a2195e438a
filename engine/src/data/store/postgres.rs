//! PostgreSQL store implementation.
//!
//! Production implementation of [`PlacementOps`] using diesel-async on a
//! [`SmartPool`]. Query logic lives on the `placement-db` models; this
//! module shapes the results into the maps the engine consumes.

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use uuid::Uuid;

#[cfg(test)]
use super::{InventoryParams, PlacementOpsMut};
#[cfg(test)]
use crate::data::store::error::RepositoryError;
#[cfg(test)]
use placement_db::models::Aggregate;
use placement_db::models::{
    Allocation, Inventory, ProviderAggregate, ProviderTrait, ResourceClass, ResourceProvider,
    Trait,
};

use crate::catalog;
use crate::data::store::{error::RepositoryResult, pool::SmartPool, PlacementOps};

/// PostgreSQL store implementation.
pub struct Repository {
    pool: SmartPool,
}

impl Repository {
    /// Connect to the store and sync the standard trait catalog into it.
    /// Standard trait names keep their ids across restarts; syncing is
    /// insert-if-absent only.
    pub async fn new(database_url: &str) -> RepositoryResult<Self> {
        let repository = Self {
            pool: SmartPool::new(database_url).await?,
        };
        repository.sync_standard_traits().await?;
        Ok(repository)
    }

    async fn sync_standard_traits(&self) -> RepositoryResult<()> {
        let mut conn = self.pool.get().await?;
        for name in catalog::STANDARD_TRAITS {
            Trait::ensure(&mut conn, (*name).to_string()).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl PlacementOps for Repository {
    async fn get_providers(&self, provider_ids: &[i64]) -> RepositoryResult<Vec<ResourceProvider>> {
        let mut conn = self.pool.get().await?;
        ResourceProvider::get_by_ids(&mut conn, provider_ids.to_vec())
            .await
            .map_err(Into::into)
    }

    async fn list_inventories(&self, class_ids: &[i32]) -> RepositoryResult<Vec<Inventory>> {
        let mut conn = self.pool.get().await?;
        Inventory::get_by_classes(&mut conn, class_ids.to_vec())
            .await
            .map_err(Into::into)
    }

    async fn list_usages(
        &self,
        provider_ids: &[i64],
        class_ids: &[i32],
    ) -> RepositoryResult<HashMap<(i64, i32), i64>> {
        let mut conn = self.pool.get().await?;
        let rows =
            Allocation::sum_usages(&mut conn, provider_ids.to_vec(), class_ids.to_vec()).await?;

        Ok(rows
            .into_iter()
            .map(|(provider_id, class_id, used)| ((provider_id, class_id), used))
            .collect())
    }

    async fn list_traits_of(
        &self,
        provider_ids: &[i64],
    ) -> RepositoryResult<HashMap<i64, BTreeSet<i32>>> {
        let mut conn = self.pool.get().await?;
        let rows = ProviderTrait::get_for_providers(&mut conn, provider_ids.to_vec()).await?;

        let mut traits: HashMap<i64, BTreeSet<i32>> = HashMap::new();
        for (provider_id, trait_id) in rows {
            traits.entry(provider_id).or_default().insert(trait_id);
        }
        Ok(traits)
    }

    async fn trait_names(&self, trait_ids: &[i32]) -> RepositoryResult<HashMap<i32, String>> {
        let mut conn = self.pool.get().await?;
        let rows = Trait::get_by_ids(&mut conn, trait_ids.to_vec()).await?;
        Ok(rows.into_iter().map(|t| (t.id, t.name)).collect())
    }

    async fn list_aggregates_of(
        &self,
        provider_ids: &[i64],
    ) -> RepositoryResult<HashMap<i64, BTreeSet<Uuid>>> {
        let mut conn = self.pool.get().await?;
        let rows =
            ProviderAggregate::uuids_for_providers(&mut conn, provider_ids.to_vec()).await?;

        let mut aggregates: HashMap<i64, BTreeSet<Uuid>> = HashMap::new();
        for (provider_id, uuid) in rows {
            aggregates.entry(provider_id).or_default().insert(uuid);
        }
        Ok(aggregates)
    }

    async fn providers_with_trait(&self, trait_id: i32) -> RepositoryResult<BTreeSet<i64>> {
        let mut conn = self.pool.get().await?;
        let ids = ProviderTrait::providers_with(&mut conn, trait_id).await?;
        Ok(ids.into_iter().collect())
    }

    async fn resolve_trait_names(
        &self,
        names: &[String],
    ) -> RepositoryResult<HashMap<String, i32>> {
        let mut conn = self.pool.get().await?;
        let rows = Trait::get_by_names(&mut conn, names.to_vec()).await?;
        Ok(rows.into_iter().map(|t| (t.name, t.id)).collect())
    }

    async fn resolve_class_names(
        &self,
        names: &[String],
    ) -> RepositoryResult<HashMap<String, i32>> {
        let mut resolved = HashMap::new();
        let mut custom = Vec::new();
        for name in names {
            if let Some(id) = catalog::standard_class_id(name) {
                resolved.insert(name.clone(), id);
            } else if catalog::is_custom_name(name) {
                custom.push(name.clone());
            }
            // Anything else cannot resolve; leave it absent.
        }

        if !custom.is_empty() {
            let mut conn = self.pool.get().await?;
            let rows = ResourceClass::get_by_names(&mut conn, custom).await?;
            for row in rows {
                resolved.insert(
                    row.name,
                    catalog::CUSTOM_RESOURCE_CLASS_ID_OFFSET + row.id,
                );
            }
        }

        Ok(resolved)
    }
}

#[cfg(test)]
#[async_trait]
impl PlacementOpsMut for Repository {
    async fn create_provider(
        &self,
        name: &str,
        uuid: Uuid,
    ) -> RepositoryResult<ResourceProvider> {
        let mut conn = self.pool.get().await?;
        ResourceProvider::create(&mut conn, name.to_string(), uuid)
            .await
            .map_err(Into::into)
    }

    async fn upsert_inventory(
        &self,
        provider_id: i64,
        class_id: i32,
        params: InventoryParams,
    ) -> RepositoryResult<Inventory> {
        let mut conn = self.pool.get().await?;
        Inventory::upsert(
            &mut conn,
            provider_id,
            class_id,
            params.total,
            params.reserved,
            params.min_unit,
            params.max_unit,
            params.step_size,
            params.allocation_ratio,
        )
        .await
        .map_err(Into::into)
    }

    async fn create_allocation(
        &self,
        provider_id: i64,
        consumer_id: Uuid,
        class_id: i32,
        used: i64,
    ) -> RepositoryResult<()> {
        let mut conn = self.pool.get().await?;
        Allocation::create(&mut conn, provider_id, consumer_id, class_id, used).await?;
        Ok(())
    }

    async fn set_traits(&self, provider_id: i64, names: &[&str]) -> RepositoryResult<()> {
        let mut conn = self.pool.get().await?;
        let mut trait_ids = Vec::with_capacity(names.len());
        for name in names {
            let t = Trait::ensure(&mut conn, (*name).to_string()).await?;
            trait_ids.push(t.id);
        }
        ProviderTrait::replace_for_provider(&mut conn, provider_id, trait_ids)
            .await
            .map_err(Into::into)
    }

    async fn set_aggregates(&self, provider_id: i64, aggregates: &[Uuid]) -> RepositoryResult<()> {
        let mut conn = self.pool.get().await?;
        let mut aggregate_ids = Vec::with_capacity(aggregates.len());
        for uuid in aggregates {
            let aggregate = Aggregate::ensure(&mut conn, *uuid).await?;
            aggregate_ids.push(aggregate.id);
        }
        ProviderAggregate::replace_for_provider(&mut conn, provider_id, aggregate_ids)
            .await
            .map_err(Into::into)
    }

    async fn create_resource_class(&self, name: &str) -> RepositoryResult<i32> {
        if !catalog::is_custom_name(name) {
            return Err(RepositoryError::invalid_input(format!(
                "custom resource class must be prefixed with {}: {}",
                catalog::CUSTOM_PREFIX,
                name
            )));
        }
        let mut conn = self.pool.get().await?;
        let class = ResourceClass::create(&mut conn, name.to_string()).await?;
        Ok(catalog::CUSTOM_RESOURCE_CLASS_ID_OFFSET + class.id)
    }

    async fn ensure_trait(&self, name: &str) -> RepositoryResult<i32> {
        if !catalog::STANDARD_TRAITS.contains(&name) && !catalog::is_custom_name(name) {
            return Err(RepositoryError::invalid_input(format!(
                "custom trait must be prefixed with {}: {}",
                catalog::CUSTOM_PREFIX,
                name
            )));
        }
        let mut conn = self.pool.get().await?;
        let t = Trait::ensure(&mut conn, name.to_string()).await?;
        Ok(t.id)
    }
}
