use serde::Serialize;
use uuid::Uuid;

/// Reference to a provider on the wire: external identity only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ProviderRef {
    pub uuid: Uuid,
}

/// One `(provider, class, amount)` tuple of an allocation request.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct AllocationRequestResource {
    pub resource_provider: ProviderRef,
    pub resource_class: String,
    pub amount: i64,
}

/// A complete assignment of every requested class to exactly one provider.
/// The tuple list is unordered; two requests are the same candidate iff
/// their tuple multisets are equal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AllocationRequest {
    pub resource_requests: Vec<AllocationRequestResource>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TraitRef {
    pub name: String,
}

/// Per-class capacity and usage of one provider, as observed at the store
/// snapshot the candidates were computed from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderSummaryResource {
    pub resource_class: String,
    pub capacity: i64,
    pub used: i64,
}

/// Post-selection view of a provider appearing in any candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderSummary {
    pub resource_provider: ProviderRef,
    pub resources: Vec<ProviderSummaryResource>,
    pub traits: Vec<TraitRef>,
}

/// The engine's answer: the alternative placements for the request plus
/// the state of every provider involved in at least one of them. Both
/// lists are sets; callers must not rely on their order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AllocationCandidates {
    pub allocation_requests: Vec<AllocationRequest>,
    pub provider_summaries: Vec<ProviderSummary>,
}
