/// Drive codenames: capacity-tiered pools and the allocator that picks the
/// next free name from them.
pub mod allocator;
pub mod rules;

pub use allocator::NameAllocator;
pub use rules::{NamingRules, Tier};
