use std::collections::{BTreeMap, BTreeSet};

use serde::Deserialize;

/// One group of a candidates request: the resource amounts wanted, the
/// trait names every satisfying provider must hold, and whether the whole
/// group must land on a single provider.
///
/// The first group of a request must have `use_same_provider = false`;
/// every later group must have it set.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RequestGroup {
    pub use_same_provider: bool,
    /// Requested amount per resource class name. Every amount must be >= 1.
    pub resources: BTreeMap<String, i64>,
    pub required_traits: BTreeSet<String>,
}

impl RequestGroup {
    pub fn new(resources: BTreeMap<String, i64>) -> Self {
        Self {
            use_same_provider: false,
            resources,
            required_traits: BTreeSet::new(),
        }
    }

    pub fn with_required_traits(mut self, traits: impl IntoIterator<Item = String>) -> Self {
        self.required_traits = traits.into_iter().collect();
        self
    }

    pub fn same_provider(mut self) -> Self {
        self.use_same_provider = true;
        self
    }
}
