/// Name allocation from capacity-tiered pools.
///
/// The allocator is a pure function of the rules, the capacity and the set
/// of ids already taken. It never falls back to a neighbouring tier: an
/// exhausted pool means the naming rules need more names, and that is for
/// the operator to fix.
use super::rules::{NamingRules, Tier};
use std::collections::HashSet;

pub struct NameAllocator<'a> {
    rules: &'a NamingRules,
}

impl<'a> NameAllocator<'a> {
    pub fn new(rules: &'a NamingRules) -> Self {
        Self { rules }
    }

    pub fn tier_for(&self, capacity_bytes: u64) -> Tier {
        self.rules.tier_for(capacity_bytes)
    }

    /// First name in the capacity tier's pool whose uppercase form is not in
    /// `used_names`, or `None` when that pool is exhausted.
    ///
    /// `used_names` must already be uppercased (see
    /// [`Registry::used_ids`](crate::model::Registry::used_ids)).
    pub fn propose(&self, capacity_bytes: u64, used_names: &HashSet<String>) -> Option<String> {
        let tier = self.tier_for(capacity_bytes);
        self.rules
            .pool(tier)
            .iter()
            .find(|name| !used_names.contains(&name.trim().to_uppercase()))
            .cloned()
    }
}
