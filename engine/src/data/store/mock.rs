//! In-memory store implementation for unit testing.
//!
//! Mimics the PostgreSQL repository without a database connection. The
//! standard trait catalog is seeded at construction, exactly like the
//! production store syncs it at startup.

use std::{
    collections::{BTreeSet, HashMap},
    sync::{
        atomic::{AtomicI64, Ordering},
        Arc,
    },
};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use placement_db::models::{Allocation, Inventory, ResourceProvider};

use crate::catalog;
use crate::data::store::{
    error::{RepositoryError, RepositoryResult},
    InventoryParams, PlacementOps, PlacementOpsMut,
};

#[derive(Default)]
struct State {
    providers: HashMap<i64, ResourceProvider>,
    inventories: HashMap<(i64, i32), Inventory>,
    allocations: Vec<Allocation>,
    /// Trait name -> id. Seeded with the standard catalog.
    trait_ids: HashMap<String, i32>,
    next_trait_id: i32,
    provider_traits: HashMap<i64, BTreeSet<i32>>,
    provider_aggregates: HashMap<i64, BTreeSet<Uuid>>,
    /// Custom class name -> id (offset already applied).
    custom_classes: HashMap<String, i32>,
    next_class_row: i32,
}

/// Mock store implementation using in-memory maps.
pub struct MockRepository {
    state: Arc<RwLock<State>>,
    next_id: Arc<AtomicI64>,
}

impl MockRepository {
    pub fn new() -> Self {
        let mut state = State::default();
        for name in catalog::STANDARD_TRAITS {
            state.next_trait_id += 1;
            state.trait_ids.insert((*name).to_string(), state.next_trait_id);
        }

        Self {
            state: Arc::new(RwLock::new(state)),
            next_id: Arc::new(AtomicI64::new(1)),
        }
    }

    fn next_id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }
}

impl Default for MockRepository {
    fn default() -> Self {
        Self::new()
    }
}

fn ensure_trait_id(state: &mut State, name: &str) -> RepositoryResult<i32> {
    if let Some(id) = state.trait_ids.get(name) {
        return Ok(*id);
    }
    if !catalog::is_custom_name(name) {
        return Err(RepositoryError::invalid_input(format!(
            "custom trait must be prefixed with {}: {}",
            catalog::CUSTOM_PREFIX,
            name
        )));
    }
    state.next_trait_id += 1;
    state.trait_ids.insert(name.to_string(), state.next_trait_id);
    Ok(state.next_trait_id)
}

#[async_trait]
impl PlacementOps for MockRepository {
    async fn get_providers(&self, provider_ids: &[i64]) -> RepositoryResult<Vec<ResourceProvider>> {
        let state = self.state.read().await;
        let mut providers: Vec<ResourceProvider> = provider_ids
            .iter()
            .filter_map(|id| state.providers.get(id).cloned())
            .collect();
        providers.sort_by_key(|p| p.id);
        Ok(providers)
    }

    async fn list_inventories(&self, class_ids: &[i32]) -> RepositoryResult<Vec<Inventory>> {
        let state = self.state.read().await;
        let mut tiles: Vec<Inventory> = state
            .inventories
            .values()
            .filter(|inv| class_ids.contains(&inv.resource_class_id))
            .cloned()
            .collect();
        tiles.sort_by_key(|inv| inv.id);
        Ok(tiles)
    }

    async fn list_usages(
        &self,
        provider_ids: &[i64],
        class_ids: &[i32],
    ) -> RepositoryResult<HashMap<(i64, i32), i64>> {
        let state = self.state.read().await;
        let mut usages: HashMap<(i64, i32), i64> = HashMap::new();
        for allocation in &state.allocations {
            if provider_ids.contains(&allocation.resource_provider_id)
                && class_ids.contains(&allocation.resource_class_id)
            {
                *usages
                    .entry((
                        allocation.resource_provider_id,
                        allocation.resource_class_id,
                    ))
                    .or_default() += allocation.used;
            }
        }
        Ok(usages)
    }

    async fn list_traits_of(
        &self,
        provider_ids: &[i64],
    ) -> RepositoryResult<HashMap<i64, BTreeSet<i32>>> {
        let state = self.state.read().await;
        Ok(provider_ids
            .iter()
            .filter_map(|id| {
                state
                    .provider_traits
                    .get(id)
                    .map(|traits| (*id, traits.clone()))
            })
            .collect())
    }

    async fn trait_names(&self, trait_ids: &[i32]) -> RepositoryResult<HashMap<i32, String>> {
        let state = self.state.read().await;
        Ok(state
            .trait_ids
            .iter()
            .filter(|(_, id)| trait_ids.contains(id))
            .map(|(name, id)| (*id, name.clone()))
            .collect())
    }

    async fn list_aggregates_of(
        &self,
        provider_ids: &[i64],
    ) -> RepositoryResult<HashMap<i64, BTreeSet<Uuid>>> {
        let state = self.state.read().await;
        Ok(provider_ids
            .iter()
            .filter_map(|id| {
                state
                    .provider_aggregates
                    .get(id)
                    .map(|aggs| (*id, aggs.clone()))
            })
            .collect())
    }

    async fn providers_with_trait(&self, trait_id: i32) -> RepositoryResult<BTreeSet<i64>> {
        let state = self.state.read().await;
        Ok(state
            .provider_traits
            .iter()
            .filter(|(_, traits)| traits.contains(&trait_id))
            .map(|(provider_id, _)| *provider_id)
            .collect())
    }

    async fn resolve_trait_names(
        &self,
        names: &[String],
    ) -> RepositoryResult<HashMap<String, i32>> {
        let state = self.state.read().await;
        Ok(names
            .iter()
            .filter_map(|name| state.trait_ids.get(name).map(|id| (name.clone(), *id)))
            .collect())
    }

    async fn resolve_class_names(
        &self,
        names: &[String],
    ) -> RepositoryResult<HashMap<String, i32>> {
        let state = self.state.read().await;
        Ok(names
            .iter()
            .filter_map(|name| {
                catalog::standard_class_id(name)
                    .or_else(|| state.custom_classes.get(name).copied())
                    .map(|id| (name.clone(), id))
            })
            .collect())
    }
}

#[async_trait]
impl PlacementOpsMut for MockRepository {
    async fn create_provider(
        &self,
        name: &str,
        uuid: Uuid,
    ) -> RepositoryResult<ResourceProvider> {
        let id = self.next_id();
        let now = Utc::now().naive_utc();
        let provider = ResourceProvider {
            id,
            uuid,
            name: name.to_string(),
            generation: 0,
            created_at: now,
            updated_at: now,
        };

        let mut state = self.state.write().await;
        if state.providers.values().any(|p| p.name == name || p.uuid == uuid) {
            return Err(RepositoryError::invalid_input(format!(
                "duplicate provider: {}",
                name
            )));
        }
        state.providers.insert(id, provider.clone());
        Ok(provider)
    }

    async fn upsert_inventory(
        &self,
        provider_id: i64,
        class_id: i32,
        params: InventoryParams,
    ) -> RepositoryResult<Inventory> {
        let id = self.next_id();
        let mut state = self.state.write().await;
        if !state.providers.contains_key(&provider_id) {
            return Err(RepositoryError::not_found("ResourceProvider"));
        }

        let inventory = Inventory {
            id,
            resource_provider_id: provider_id,
            resource_class_id: class_id,
            total: params.total,
            reserved: params.reserved,
            min_unit: params.min_unit,
            max_unit: params.max_unit,
            step_size: params.step_size,
            allocation_ratio: params.allocation_ratio,
        };
        state
            .inventories
            .insert((provider_id, class_id), inventory.clone());

        if let Some(provider) = state.providers.get_mut(&provider_id) {
            provider.generation += 1;
            provider.updated_at = Utc::now().naive_utc();
        }
        Ok(inventory)
    }

    async fn create_allocation(
        &self,
        provider_id: i64,
        consumer_id: Uuid,
        class_id: i32,
        used: i64,
    ) -> RepositoryResult<()> {
        let id = self.next_id();
        let mut state = self.state.write().await;
        if !state.providers.contains_key(&provider_id) {
            return Err(RepositoryError::not_found("ResourceProvider"));
        }
        state.allocations.push(Allocation {
            id,
            resource_provider_id: provider_id,
            consumer_id,
            resource_class_id: class_id,
            used,
        });
        Ok(())
    }

    async fn set_traits(&self, provider_id: i64, names: &[&str]) -> RepositoryResult<()> {
        let mut state = self.state.write().await;
        if !state.providers.contains_key(&provider_id) {
            return Err(RepositoryError::not_found("ResourceProvider"));
        }
        let mut trait_ids = BTreeSet::new();
        for name in names {
            trait_ids.insert(ensure_trait_id(&mut state, name)?);
        }
        state.provider_traits.insert(provider_id, trait_ids);
        Ok(())
    }

    async fn set_aggregates(&self, provider_id: i64, aggregates: &[Uuid]) -> RepositoryResult<()> {
        let mut state = self.state.write().await;
        if !state.providers.contains_key(&provider_id) {
            return Err(RepositoryError::not_found("ResourceProvider"));
        }
        state
            .provider_aggregates
            .insert(provider_id, aggregates.iter().copied().collect());
        Ok(())
    }

    async fn create_resource_class(&self, name: &str) -> RepositoryResult<i32> {
        if !catalog::is_custom_name(name) {
            return Err(RepositoryError::invalid_input(format!(
                "custom resource class must be prefixed with {}: {}",
                catalog::CUSTOM_PREFIX,
                name
            )));
        }
        let mut state = self.state.write().await;
        if let Some(id) = state.custom_classes.get(name) {
            return Ok(*id);
        }
        state.next_class_row += 1;
        let id = catalog::CUSTOM_RESOURCE_CLASS_ID_OFFSET + state.next_class_row;
        state.custom_classes.insert(name.to_string(), id);
        Ok(id)
    }

    async fn ensure_trait(&self, name: &str) -> RepositoryResult<i32> {
        let mut state = self.state.write().await;
        ensure_trait_id(&mut state, name)
    }
}
