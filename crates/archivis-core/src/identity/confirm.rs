/// The name-confirmation capability.
///
/// When a new drive is named, the proposed codename is offered to a
/// [`ConfirmName`] implementation, which may accept it, replace it with a
/// custom name, or abort. The resolver owns the collision loop; the
/// confirmer only ever sees one request at a time, with the previously
/// rejected name and the reason (if any) so it can explain why it is being
/// asked again.
///
/// Any `FnMut(&NameRequest) -> NameDecision` closure is a confirmer, which
/// keeps tests free of hand-written mocks.
use crate::model::registry::InvalidId;
use crate::model::VolumeDescriptor;
use crate::naming::Tier;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameDecision {
    /// Use the proposed name verbatim.
    Accept,
    /// Use this name instead. Blank input counts as [`NameDecision::Accept`].
    Custom(String),
    /// Give up on this volume; it is neither registered nor scanned.
    Abort,
}

#[derive(Debug, Clone, Copy)]
pub struct NameRequest<'a> {
    pub proposed: &'a str,
    pub tier: Tier,
    pub volume: &'a VolumeDescriptor,
    /// The custom name turned down on the previous round.
    pub rejected: Option<Rejection<'a>>,
}

/// A custom name the resolver would not accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rejection<'a> {
    pub name: &'a str,
    pub reason: RejectReason,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Another registry entry already uses the id.
    InUse,
    /// The name cannot serve as a drive id.
    Invalid(InvalidId),
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InUse => f.write_str("already in use"),
            Self::Invalid(why) => write!(f, "not a valid drive name: {why}"),
        }
    }
}

pub trait ConfirmName {
    fn confirm(&mut self, request: &NameRequest<'_>) -> NameDecision;
}

impl<F> ConfirmName for F
where
    F: FnMut(&NameRequest<'_>) -> NameDecision,
{
    fn confirm(&mut self, request: &NameRequest<'_>) -> NameDecision {
        self(request)
    }
}

/// Non-interactive confirmer: every proposal is accepted.
#[derive(Debug, Default, Clone, Copy)]
pub struct AcceptProposed;

impl ConfirmName for AcceptProposed {
    fn confirm(&mut self, request: &NameRequest<'_>) -> NameDecision {
        tracing::info!("Accepting proposed codename {}", request.proposed);
        NameDecision::Accept
    }
}
