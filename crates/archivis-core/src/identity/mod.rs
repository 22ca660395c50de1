/// Drive identity: matching a detected volume to its registered codename,
/// or naming and registering it on first sight.
pub mod confirm;
pub mod resolver;

pub use confirm::{AcceptProposed, ConfirmName, NameDecision, NameRequest, RejectReason, Rejection};
pub use resolver::{IdentityResolver, Resolution, ResolveError};
