//! Point-in-time provider index.
//!
//! A [`Snapshot`] is the flat, read-only picture of every provider holding
//! an inventory tile in one of the requested resource classes: tiles,
//! usage totals, trait sets, aggregate memberships and the sharing-marker
//! set. It is built from a handful of store reads at the start of one
//! candidate computation and dropped with the response.
//!
//! Inside the engine, integer ids are the canonical identity; provider
//! records are only consulted again when the response is rendered.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use tracing::debug;
use uuid::Uuid;

use placement_db::models::{Inventory, ResourceProvider};

use crate::catalog;
use crate::data::store::StoreOperations;
use crate::error::{Error, Result};

pub struct Snapshot {
    providers: HashMap<i64, ResourceProvider>,
    tiles: HashMap<(i64, i32), Inventory>,
    usages: HashMap<(i64, i32), i64>,
    traits: HashMap<i64, BTreeSet<i32>>,
    aggregates: HashMap<i64, BTreeSet<Uuid>>,
    /// Providers bearing the sharing marker trait.
    sharing: BTreeSet<i64>,
}

impl Snapshot {
    /// Load the index for the given resource classes.
    pub async fn load(store: &dyn StoreOperations, class_ids: &[i32]) -> Result<Self> {
        let inventories = store.list_inventories(class_ids).await?;

        let provider_ids: Vec<i64> = inventories
            .iter()
            .map(|inv| inv.resource_provider_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let providers = store
            .get_providers(&provider_ids)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();
        let usages = store.list_usages(&provider_ids, class_ids).await?;
        let traits = store.list_traits_of(&provider_ids).await?;
        let aggregates = store.list_aggregates_of(&provider_ids).await?;

        let marker = store
            .resolve_trait_names(&[catalog::SHARES_VIA_AGGREGATE.to_string()])
            .await?
            .get(catalog::SHARES_VIA_AGGREGATE)
            .copied();
        let sharing = match marker {
            Some(marker_id) => store
                .providers_with_trait(marker_id)
                .await?
                .into_iter()
                .filter(|id| provider_ids.binary_search(id).is_ok())
                .collect(),
            None => BTreeSet::new(),
        };

        let tiles: HashMap<(i64, i32), Inventory> = inventories
            .into_iter()
            .map(|inv| ((inv.resource_provider_id, inv.resource_class_id), inv))
            .collect();

        debug!(
            providers = provider_ids.len(),
            tiles = tiles.len(),
            sharing = sharing.len(),
            "loaded provider index"
        );

        Ok(Self {
            providers,
            tiles,
            usages,
            traits,
            aggregates,
            sharing,
        })
    }

    pub fn provider(&self, provider_id: i64) -> Option<&ResourceProvider> {
        self.providers.get(&provider_id)
    }

    /// All provider ids in the index, ascending.
    pub fn provider_ids(&self) -> Vec<i64> {
        let mut ids: Vec<i64> = self.providers.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn tile(&self, provider_id: i64, class_id: i32) -> Option<&Inventory> {
        self.tiles.get(&(provider_id, class_id))
    }

    pub fn used(&self, provider_id: i64, class_id: i32) -> i64 {
        self.usages
            .get(&(provider_id, class_id))
            .copied()
            .unwrap_or(0)
    }

    /// Whether the provider holds a tile for `class_id` that can take
    /// `amount` on top of its current usage.
    pub fn satisfies(&self, provider_id: i64, class_id: i32, amount: i64) -> bool {
        self.tile(provider_id, class_id)
            .is_some_and(|tile| tile.satisfies(amount, self.used(provider_id, class_id)))
    }

    pub fn trait_ids_of(&self, provider_id: i64) -> BTreeSet<i32> {
        self.traits.get(&provider_id).cloned().unwrap_or_default()
    }

    /// Whether the provider's trait set is a superset of `trait_ids`.
    /// An empty requirement always holds.
    pub fn has_all_traits(&self, provider_id: i64, trait_ids: &BTreeSet<i32>) -> bool {
        if trait_ids.is_empty() {
            return true;
        }
        match self.traits.get(&provider_id) {
            Some(held) => held.is_superset(trait_ids),
            None => false,
        }
    }

    pub fn is_sharing(&self, provider_id: i64) -> bool {
        self.sharing.contains(&provider_id)
    }

    /// Sharing providers with a satisfiable tile for `class_id`, ascending.
    pub fn sharing_providers_for(&self, class_id: i32, amount: i64) -> Vec<i64> {
        self.sharing
            .iter()
            .copied()
            .filter(|&provider_id| self.satisfies(provider_id, class_id, amount))
            .collect()
    }

    pub fn aggregates_of(&self, provider_id: i64) -> BTreeSet<Uuid> {
        self.aggregates
            .get(&provider_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Aggregate linkage: the two providers' aggregate sets intersect.
    pub fn linked(&self, left: i64, right: i64) -> bool {
        match (self.aggregates.get(&left), self.aggregates.get(&right)) {
            (Some(a), Some(b)) => !a.is_disjoint(b),
            _ => false,
        }
    }

    /// Providers that alone satisfy every requested class and hold every
    /// required trait. Fails when called with no resources: an empty
    /// constraint would match the entire universe and is always a caller
    /// bug here.
    pub fn providers_matching_all(
        &self,
        resources: &BTreeMap<i32, i64>,
        trait_ids: &BTreeSet<i32>,
    ) -> Result<BTreeSet<i64>> {
        if resources.is_empty() {
            return Err(Error::invalid_argument("resources must not be empty"));
        }

        Ok(self
            .provider_ids()
            .into_iter()
            .filter(|&provider_id| {
                resources
                    .iter()
                    .all(|(&class_id, &amount)| self.satisfies(provider_id, class_id, amount))
                    && self.has_all_traits(provider_id, trait_ids)
            })
            .collect())
    }
}
