//! Allocation-candidate computation.
//!
//! [`CandidateService::get_candidates`] takes one or more request groups
//! and answers with every valid way of placing the requested resources on
//! the provider graph: purely local placements, placements that draw some
//! classes from aggregate-linked sharing providers, and placements served
//! entirely by sharing providers. For every provider involved in at least
//! one candidate it also reports a capacity/usage/trait summary.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use placement_db::models::Inventory;

use crate::data::store::StoreOperations;
use crate::error::{Error, Result};
use crate::models::{
    AllocationCandidates, AllocationRequest, AllocationRequestResource, ProviderRef,
    ProviderSummary, ProviderSummaryResource, RequestGroup, TraitRef,
};
use crate::services::snapshot::Snapshot;

/// Internal candidate form: `(provider, class, amount)` tuples keyed by
/// store-internal ids. Rendered to UUIDs and class names only at the end.
type Candidate = Vec<(i64, i32, i64)>;

/// One request group with its names resolved and its provider index loaded.
struct GroupContext {
    resources: BTreeMap<i32, i64>,
    snapshot: Snapshot,
}

/// Service computing allocation candidates over a placement store.
pub struct CandidateService {
    store: Arc<dyn StoreOperations>,
}

impl CandidateService {
    pub fn new(store: Arc<dyn StoreOperations>) -> Self {
        Self { store }
    }

    /// Enumerate the candidate placements for the given request groups.
    ///
    /// The first group spreads its resources over multiple providers and
    /// must be present with a non-empty resources map; every later group
    /// pins its resources to one provider (`use_same_provider`). The
    /// result is a set: callers must not rely on candidate order.
    pub async fn get_candidates(&self, groups: &[RequestGroup]) -> Result<AllocationCandidates> {
        let Some(first) = groups.first() else {
            return Err(Error::invalid_argument(
                "at least one request group is required",
            ));
        };
        if first.use_same_provider {
            return Err(Error::invalid_argument(
                "the first request group must spread over providers",
            ));
        }

        // Resolve every name up front; nothing below this point sees an
        // unresolved class or trait.
        let mut class_names: BTreeSet<String> = BTreeSet::new();
        let mut trait_names: BTreeSet<String> = BTreeSet::new();
        for (index, group) in groups.iter().enumerate() {
            if index > 0 && !group.use_same_provider {
                return Err(Error::invalid_argument(
                    "secondary request groups must pin to a single provider",
                ));
            }
            if group.resources.is_empty() {
                return Err(Error::invalid_argument("resources must not be empty"));
            }
            for (name, &amount) in &group.resources {
                if amount < 1 {
                    return Err(Error::invalid_argument(format!(
                        "requested amount for {} must be at least 1",
                        name
                    )));
                }
                class_names.insert(name.clone());
            }
            trait_names.extend(group.required_traits.iter().cloned());
        }

        let class_ids = self
            .store
            .resolve_class_names(&class_names.iter().cloned().collect::<Vec<_>>())
            .await?;
        for name in &class_names {
            if !class_ids.contains_key(name) {
                return Err(Error::invalid_argument(format!(
                    "unknown resource class: {}",
                    name
                )));
            }
        }
        let trait_ids = self
            .store
            .resolve_trait_names(&trait_names.iter().cloned().collect::<Vec<_>>())
            .await?;
        for name in &trait_names {
            if !trait_ids.contains_key(name) {
                return Err(Error::UnknownTrait(name.clone()));
            }
        }
        let names_by_class: HashMap<i32, String> = class_ids
            .iter()
            .map(|(name, &id)| (id, name.clone()))
            .collect();

        // Load one provider index per group and enumerate group-local
        // candidates.
        let mut contexts: Vec<GroupContext> = Vec::with_capacity(groups.len());
        let mut per_group: Vec<Vec<Candidate>> = Vec::with_capacity(groups.len());
        for (index, group) in groups.iter().enumerate() {
            let mut resources: BTreeMap<i32, i64> = BTreeMap::new();
            for (name, &amount) in &group.resources {
                let class_id = class_ids
                    .get(name)
                    .copied()
                    .ok_or_else(|| Error::invalid_argument("unresolved resource class"))?;
                resources.insert(class_id, amount);
            }
            let mut required: BTreeSet<i32> = BTreeSet::new();
            for name in &group.required_traits {
                let trait_id = trait_ids
                    .get(name)
                    .copied()
                    .ok_or_else(|| Error::UnknownTrait(name.clone()))?;
                required.insert(trait_id);
            }

            let requested_classes: Vec<i32> = resources.keys().copied().collect();
            let snapshot = Snapshot::load(self.store.as_ref(), &requested_classes).await?;

            let candidates = if index == 0 {
                enumerate_spread(&snapshot, &resources, &required)?
            } else {
                enumerate_same_provider(&snapshot, &resources, &required)?
            };
            debug!(
                group = index,
                candidates = candidates.len(),
                "group enumeration complete"
            );

            per_group.push(candidates);
            contexts.push(GroupContext {
                resources,
                snapshot,
            });
        }

        let candidates = dedup(join_groups(&contexts, per_group));
        debug!(candidates = candidates.len(), "enumeration complete");

        self.render(&contexts, &names_by_class, candidates).await
    }

    /// Providers whose trait set is a superset of `trait_ids`, across the
    /// whole provider universe. Fails on an empty id set: an empty
    /// constraint would return every provider and is always a caller bug.
    pub async fn providers_having_all_traits(
        &self,
        trait_ids: &BTreeSet<i32>,
    ) -> Result<BTreeSet<i64>> {
        let mut ids = trait_ids.iter();
        let Some(&head) = ids.next() else {
            return Err(Error::invalid_argument(
                "required trait set must not be empty",
            ));
        };

        let mut matching = self.store.providers_with_trait(head).await?;
        for &trait_id in ids {
            if matching.is_empty() {
                break;
            }
            let holders = self.store.providers_with_trait(trait_id).await?;
            matching = matching.intersection(&holders).copied().collect();
        }
        Ok(matching)
    }

    async fn render(
        &self,
        contexts: &[GroupContext],
        names_by_class: &HashMap<i32, String>,
        candidates: Vec<Candidate>,
    ) -> Result<AllocationCandidates> {
        let involved: BTreeSet<i64> = candidates
            .iter()
            .flat_map(|candidate| candidate.iter().map(|&(provider_id, _, _)| provider_id))
            .collect();

        // One store round trip for every trait name we are going to print.
        let all_trait_ids: BTreeSet<i32> = involved
            .iter()
            .flat_map(|&provider_id| {
                contexts
                    .iter()
                    .flat_map(move |ctx| ctx.snapshot.trait_ids_of(provider_id))
            })
            .collect();
        let trait_names = self
            .store
            .trait_names(&all_trait_ids.iter().copied().collect::<Vec<_>>())
            .await?;

        let mut allocation_requests = Vec::with_capacity(candidates.len());
        for candidate in &candidates {
            let mut tuples = candidate.clone();
            tuples.sort_unstable();

            let mut resource_requests = Vec::with_capacity(tuples.len());
            for (provider_id, class_id, amount) in tuples {
                resource_requests.push(AllocationRequestResource {
                    resource_provider: ProviderRef {
                        uuid: provider_uuid(contexts, provider_id)?,
                    },
                    resource_class: class_name(names_by_class, class_id)?,
                    amount,
                });
            }
            allocation_requests.push(AllocationRequest { resource_requests });
        }

        let requested_classes: BTreeSet<i32> = contexts
            .iter()
            .flat_map(|ctx| ctx.resources.keys().copied())
            .collect();

        let mut provider_summaries = Vec::with_capacity(involved.len());
        for &provider_id in &involved {
            let mut resources = Vec::new();
            for &class_id in &requested_classes {
                if let Some((tile, used)) = find_tile(contexts, provider_id, class_id) {
                    resources.push(ProviderSummaryResource {
                        resource_class: class_name(names_by_class, class_id)?,
                        capacity: tile.capacity(),
                        used,
                    });
                }
            }

            let held: BTreeSet<i32> = contexts
                .iter()
                .flat_map(|ctx| ctx.snapshot.trait_ids_of(provider_id))
                .collect();
            let mut traits: Vec<TraitRef> = held
                .iter()
                .filter_map(|trait_id| trait_names.get(trait_id))
                .map(|name| TraitRef { name: name.clone() })
                .collect();
            traits.sort_by(|a, b| a.name.cmp(&b.name));

            provider_summaries.push(ProviderSummary {
                resource_provider: ProviderRef {
                    uuid: provider_uuid(contexts, provider_id)?,
                },
                resources,
                traits,
            });
        }

        Ok(AllocationCandidates {
            allocation_requests,
            provider_summaries,
        })
    }
}

/// Candidates for a group that may spread over providers.
///
/// Three sources, in the shape the provider graph dictates:
/// - with no sharing provider in play, exactly the providers that satisfy
///   everything locally;
/// - one candidate set per non-sharing anchor that supplies at least one
///   class itself and covers the rest through aggregate-linked sharing
///   providers — a class the anchor can satisfy locally is pinned to the
///   anchor, and a sharing provider not linked to the anchor is never
///   chosen;
/// - the combinations served entirely by sharing providers, with no
///   linkage constraint among them.
///
/// Required traits filter anchors and the local-only matches; sharing
/// providers are not trait-filtered.
fn enumerate_spread(
    snapshot: &Snapshot,
    resources: &BTreeMap<i32, i64>,
    required_traits: &BTreeSet<i32>,
) -> Result<Vec<Candidate>> {
    let sharing_per_class: BTreeMap<i32, Vec<i64>> = resources
        .iter()
        .map(|(&class_id, &amount)| (class_id, snapshot.sharing_providers_for(class_id, amount)))
        .collect();

    if sharing_per_class.values().all(|sources| sources.is_empty()) {
        // Purely local topology for these classes.
        let locals = snapshot.providers_matching_all(resources, required_traits)?;
        return Ok(locals
            .into_iter()
            .map(|provider_id| {
                resources
                    .iter()
                    .map(|(&class_id, &amount)| (provider_id, class_id, amount))
                    .collect()
            })
            .collect());
    }

    let mut candidates: Vec<Candidate> = Vec::new();

    for provider_id in snapshot.provider_ids() {
        if snapshot.is_sharing(provider_id) {
            continue;
        }
        if !snapshot.has_all_traits(provider_id, required_traits) {
            continue;
        }

        let mut per_class: Vec<(i32, i64, Vec<i64>)> = Vec::with_capacity(resources.len());
        let mut own_classes = 0usize;
        let mut covered = true;
        for (&class_id, &amount) in resources {
            if snapshot.satisfies(provider_id, class_id, amount) {
                own_classes += 1;
                per_class.push((class_id, amount, vec![provider_id]));
            } else {
                let sources: Vec<i64> = sharing_per_class[&class_id]
                    .iter()
                    .copied()
                    .filter(|&sharing_id| snapshot.linked(provider_id, sharing_id))
                    .collect();
                if sources.is_empty() {
                    covered = false;
                    break;
                }
                per_class.push((class_id, amount, sources));
            }
        }
        if !covered || own_classes == 0 {
            continue;
        }

        cross_product(&per_class, &mut candidates);
    }

    if resources
        .keys()
        .all(|class_id| !sharing_per_class[class_id].is_empty())
    {
        let per_class: Vec<(i32, i64, Vec<i64>)> = resources
            .iter()
            .map(|(&class_id, &amount)| (class_id, amount, sharing_per_class[&class_id].clone()))
            .collect();
        cross_product(&per_class, &mut candidates);
    }

    Ok(candidates)
}

/// Candidates for a `use_same_provider` group: one per provider that alone
/// satisfies every class and holds every required trait.
fn enumerate_same_provider(
    snapshot: &Snapshot,
    resources: &BTreeMap<i32, i64>,
    required_traits: &BTreeSet<i32>,
) -> Result<Vec<Candidate>> {
    let providers = snapshot.providers_matching_all(resources, required_traits)?;
    Ok(providers
        .into_iter()
        .map(|provider_id| {
            resources
                .iter()
                .map(|(&class_id, &amount)| (provider_id, class_id, amount))
                .collect()
        })
        .collect())
}

/// Expand per-class source choices into full assignments.
fn cross_product(per_class: &[(i32, i64, Vec<i64>)], out: &mut Vec<Candidate>) {
    let mut combos: Vec<Candidate> = vec![Vec::with_capacity(per_class.len())];
    for (class_id, amount, sources) in per_class {
        let mut next = Vec::with_capacity(combos.len() * sources.len());
        for combo in &combos {
            for &source in sources {
                let mut extended = combo.clone();
                extended.push((source, *class_id, *amount));
                next.push(extended);
            }
        }
        combos = next;
    }
    out.extend(combos);
}

/// Cartesian product across groups, dropping combinations whose summed
/// amounts per `(provider, class)` no longer fit the tile.
fn join_groups(contexts: &[GroupContext], per_group: Vec<Vec<Candidate>>) -> Vec<Candidate> {
    let mut joined: Vec<Candidate> = vec![Vec::new()];
    for group_candidates in per_group {
        let mut next = Vec::with_capacity(joined.len() * group_candidates.len().max(1));
        for base in &joined {
            for candidate in &group_candidates {
                let mut combined = base.clone();
                combined.extend(candidate.iter().copied());
                next.push(combined);
            }
        }
        joined = next;
    }

    joined
        .into_iter()
        .filter(|candidate| combined_amounts_fit(contexts, candidate))
        .collect()
}

fn combined_amounts_fit(contexts: &[GroupContext], candidate: &Candidate) -> bool {
    let mut totals: BTreeMap<(i64, i32), i64> = BTreeMap::new();
    for &(provider_id, class_id, amount) in candidate {
        *totals.entry((provider_id, class_id)).or_default() += amount;
    }

    totals.iter().all(|(&(provider_id, class_id), &total)| {
        find_tile(contexts, provider_id, class_id)
            .is_some_and(|(tile, used)| total <= tile.remaining(used))
    })
}

/// Two candidates are the same placement iff their tuple multisets are
/// equal; keep the first of each.
fn dedup(candidates: Vec<Candidate>) -> Vec<Candidate> {
    let mut seen: BTreeSet<Candidate> = BTreeSet::new();
    let mut unique = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        let mut key = candidate.clone();
        key.sort_unstable();
        if seen.insert(key) {
            unique.push(candidate);
        }
    }
    unique
}

fn find_tile<'a>(
    contexts: &'a [GroupContext],
    provider_id: i64,
    class_id: i32,
) -> Option<(&'a Inventory, i64)> {
    contexts.iter().find_map(|ctx| {
        ctx.snapshot
            .tile(provider_id, class_id)
            .map(|tile| (tile, ctx.snapshot.used(provider_id, class_id)))
    })
}

fn provider_uuid(contexts: &[GroupContext], provider_id: i64) -> Result<Uuid> {
    contexts
        .iter()
        .find_map(|ctx| ctx.snapshot.provider(provider_id))
        .map(|provider| provider.uuid)
        .ok_or(Error::Internal)
}

fn class_name(names_by_class: &HashMap<i32, String>, class_id: i32) -> Result<String> {
    names_by_class
        .get(&class_id)
        .cloned()
        .ok_or(Error::Internal)
}
