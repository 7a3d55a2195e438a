//! Store abstraction consumed by the candidate engine.
//!
//! ## Key Components
//! - [`PlacementOps`] - read-only operations the engine needs
//! - [`PlacementOpsMut`] - write operations for tests and fixtures
//! - [`Repository`] - PostgreSQL implementation
//! - `MockRepository` - in-memory implementation (tests / `mocks` feature)
//!
//! Production code only ever sees [`PlacementOps`] through the
//! [`StoreOperations`] alias; test builds transparently gain the write
//! operations without a dedicated test client.

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use uuid::Uuid;

use placement_db::models::{Inventory, ResourceProvider};

pub mod error;
#[cfg(any(test, feature = "mocks"))]
pub mod mock;
pub mod pool;
pub mod postgres;

pub use error::{RepositoryError, RepositoryResult};
#[cfg(any(test, feature = "mocks"))]
pub use mock::MockRepository;
pub use pool::SmartPool;
pub use postgres::Repository;

/// Inventory tile parameters with the documented defaults:
/// `reserved = 0`, `min_unit = 1`, `max_unit = total`, `step_size = 1`,
/// `allocation_ratio = 1.0`.
#[derive(Debug, Clone, Copy)]
pub struct InventoryParams {
    pub total: i64,
    pub reserved: i64,
    pub min_unit: i64,
    pub max_unit: i64,
    pub step_size: i64,
    pub allocation_ratio: f64,
}

impl InventoryParams {
    pub fn new(total: i64) -> Self {
        Self {
            total,
            reserved: 0,
            min_unit: 1,
            max_unit: total,
            step_size: 1,
            allocation_ratio: 1.0,
        }
    }

    pub fn reserved(mut self, reserved: i64) -> Self {
        self.reserved = reserved;
        self
    }

    pub fn min_unit(mut self, min_unit: i64) -> Self {
        self.min_unit = min_unit;
        self
    }

    pub fn max_unit(mut self, max_unit: i64) -> Self {
        self.max_unit = max_unit;
        self
    }

    pub fn step_size(mut self, step_size: i64) -> Self {
        self.step_size = step_size;
        self
    }

    pub fn allocation_ratio(mut self, allocation_ratio: f64) -> Self {
        self.allocation_ratio = allocation_ratio;
        self
    }
}

/// Read-only operations the candidate engine issues against the store.
///
/// All methods observe a serializable point-in-time view as far as the
/// store's own isolation provides one; the engine never writes.
#[async_trait]
pub trait PlacementOps: Send + Sync {
    /// Provider records for the given internal ids. Unknown ids are
    /// silently absent from the result.
    async fn get_providers(&self, provider_ids: &[i64]) -> RepositoryResult<Vec<ResourceProvider>>;

    /// Every inventory tile whose class is in `class_ids`, across all
    /// providers.
    async fn list_inventories(&self, class_ids: &[i32]) -> RepositoryResult<Vec<Inventory>>;

    /// Summed live allocations per `(provider, class)`. Pairs with no
    /// allocations are absent.
    async fn list_usages(
        &self,
        provider_ids: &[i64],
        class_ids: &[i32],
    ) -> RepositoryResult<HashMap<(i64, i32), i64>>;

    /// Trait-id sets per provider. Providers holding no traits are absent.
    async fn list_traits_of(
        &self,
        provider_ids: &[i64],
    ) -> RepositoryResult<HashMap<i64, BTreeSet<i32>>>;

    /// Names for the given trait ids. Unknown ids are absent.
    async fn trait_names(&self, trait_ids: &[i32]) -> RepositoryResult<HashMap<i32, String>>;

    /// Aggregate-UUID sets per provider. Providers in no aggregate are
    /// absent.
    async fn list_aggregates_of(
        &self,
        provider_ids: &[i64],
    ) -> RepositoryResult<HashMap<i64, BTreeSet<Uuid>>>;

    /// Ids of every provider holding the given trait.
    async fn providers_with_trait(&self, trait_id: i32) -> RepositoryResult<BTreeSet<i64>>;

    /// Resolve trait names to ids. Partial on unknown names: absent keys
    /// mean the name is not in the catalog.
    async fn resolve_trait_names(&self, names: &[String])
        -> RepositoryResult<HashMap<String, i32>>;

    /// Resolve resource class names to ids. Standard classes resolve from
    /// the compile-time catalog, `CUSTOM_` classes from the store. Partial
    /// on unknown names.
    async fn resolve_class_names(&self, names: &[String])
        -> RepositoryResult<HashMap<String, i32>>;
}

/// Write operations for fixtures and the test suite. The external
/// allocation writer owns these concerns in production; the engine itself
/// never calls them.
#[async_trait]
pub trait PlacementOpsMut: PlacementOps {
    async fn create_provider(
        &self,
        name: &str,
        uuid: Uuid,
    ) -> RepositoryResult<ResourceProvider>;

    /// Insert or replace the `(provider, class)` tile and bump the
    /// provider's generation.
    async fn upsert_inventory(
        &self,
        provider_id: i64,
        class_id: i32,
        params: InventoryParams,
    ) -> RepositoryResult<Inventory>;

    async fn create_allocation(
        &self,
        provider_id: i64,
        consumer_id: Uuid,
        class_id: i32,
        used: i64,
    ) -> RepositoryResult<()>;

    /// Replace the provider's trait set. Names are registered on the fly;
    /// unknown non-standard names must carry the `CUSTOM_` prefix.
    async fn set_traits(&self, provider_id: i64, names: &[&str]) -> RepositoryResult<()>;

    /// Replace the provider's aggregate memberships.
    async fn set_aggregates(&self, provider_id: i64, aggregates: &[Uuid]) -> RepositoryResult<()>;

    /// Register a custom resource class and return its id in the shared
    /// class-id space.
    async fn create_resource_class(&self, name: &str) -> RepositoryResult<i32>;

    /// Stable-name trait registration: create if absent, return the id
    /// either way.
    async fn ensure_trait(&self, name: &str) -> RepositoryResult<i32>;
}

// When compiling unit tests we get access to write operations
// transparently, without changing or using a dedicated client for tests.
//
// For non-test builds we explicitly only expose `PlacementOps`, as only
// read operations must be reachable from production code.

#[cfg(not(test))]
pub trait StoreOperations: PlacementOps {}

#[cfg(not(test))]
impl<T: PlacementOps> StoreOperations for T {}

#[cfg(test)]
pub trait StoreOperations: PlacementOps + PlacementOpsMut {}

#[cfg(test)]
impl<T: PlacementOps + PlacementOpsMut> StoreOperations for T {}
