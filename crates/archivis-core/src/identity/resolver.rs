/// Identity resolution for detected volumes.
///
/// Lookup order is volume UUID first, then device identifier; both must be
/// non-empty and match exactly. Only `external_drive` entries take part.
/// Every UUID is checked before any device identifier, so the result does
/// not depend on the order of registry entries.
///
/// On a miss, a codename is allocated from the capacity tier, confirmed,
/// and appended to the registry. Persisting that registry is the caller's
/// job and must happen before the drive is scanned.
use super::confirm::{ConfirmName, NameDecision, NameRequest, RejectReason, Rejection};
use crate::model::registry::{check_id, normalize_id, DuplicateId};
use crate::model::{Registry, RegistryEntry, VolumeDescriptor};
use crate::naming::{NameAllocator, NamingRules, Tier};
use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Outcome of a successful resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Volume matched an existing entry; the registry was not touched.
    Known(String),
    /// Volume was new; an entry with this id was appended to the registry.
    Registered(String),
}

impl Resolution {
    pub fn drive_id(&self) -> &str {
        match self {
            Self::Known(id) | Self::Registered(id) => id,
        }
    }

    pub fn is_new(&self) -> bool {
        matches!(self, Self::Registered(_))
    }
}

/// Why a volume could not be given an identity. Never fatal for a run.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("no available names left in the {tier} pool; add names to the naming rules")]
    NoAvailableIdentity { tier: Tier },

    #[error("naming was aborted")]
    Aborted,

    #[error(transparent)]
    IdInUse(#[from] DuplicateId),
}

pub struct IdentityResolver<'a> {
    allocator: NameAllocator<'a>,
}

impl<'a> IdentityResolver<'a> {
    pub fn new(rules: &'a NamingRules) -> Self {
        Self {
            allocator: NameAllocator::new(rules),
        }
    }

    /// Existing registry entry for `volume`, if any.
    pub fn lookup<'r>(volume: &VolumeDescriptor, registry: &'r Registry) -> Option<&'r RegistryEntry> {
        registry
            .find_by_uuid(&volume.volume_uuid)
            .or_else(|| registry.find_by_device(&volume.device_identifier))
    }

    /// Resolve `volume` to a drive id, registering it if it is new.
    ///
    /// The registry is mutated only when [`Resolution::Registered`] is
    /// returned. On any error it is left untouched.
    pub fn resolve(
        &self,
        volume: &VolumeDescriptor,
        registry: &mut Registry,
        confirm: &mut dyn ConfirmName,
        now: DateTime<Utc>,
    ) -> Result<Resolution, ResolveError> {
        if let Some(existing) = Self::lookup(volume, registry) {
            debug!(
                "Volume {} matched registry entry {}",
                volume.volume_name, existing.id
            );
            return Ok(Resolution::Known(existing.id.clone()));
        }

        let used = registry.used_ids();
        let tier = self.allocator.tier_for(volume.capacity_bytes);
        let proposed = match self.allocator.propose(volume.capacity_bytes, &used) {
            Some(name) => name,
            None => {
                warn!(
                    "No available names in the {tier} pool for {}",
                    volume.volume_name
                );
                return Err(ResolveError::NoAvailableIdentity { tier });
            }
        };

        let mut rejected: Option<(String, RejectReason)> = None;
        let name = loop {
            let request = NameRequest {
                proposed: &proposed,
                tier,
                volume,
                rejected: rejected.as_ref().map(|(name, reason)| Rejection {
                    name,
                    reason: *reason,
                }),
            };
            match confirm.confirm(&request) {
                NameDecision::Accept => break normalize_id(&proposed),
                NameDecision::Custom(custom) => {
                    let custom = normalize_id(&custom);
                    if custom.is_empty() {
                        break normalize_id(&proposed);
                    }
                    let reason = match check_id(&custom) {
                        Err(why) => RejectReason::Invalid(why),
                        Ok(()) if used.contains(&custom) => RejectReason::InUse,
                        Ok(()) => break custom,
                    };
                    debug!("Custom name {custom} rejected ({reason}); asking again");
                    rejected = Some((custom, reason));
                }
                NameDecision::Abort => return Err(ResolveError::Aborted),
            }
        };

        let entry = RegistryEntry::new_external(&name, volume, now);
        let id = entry.id.clone();
        registry.register(entry)?;
        info!("Registered new drive {id} ({})", volume.volume_name);
        Ok(Resolution::Registered(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::size::TIB;
    use crate::model::registry::InvalidId;
    use crate::model::DriveStatus;
    use chrono::TimeZone;
    use std::path::PathBuf;

    fn rules() -> NamingRules {
        NamingRules {
            large_drive_threshold_tb: 4.0,
            medium_drive_threshold_tb: 1.0,
            large_names: vec!["THOR".into()],
            medium_names: vec!["NOVA".into(), "VISION".into()],
            small_names: vec!["GROOT".into(), "ROCKET".into()],
        }
    }

    fn volume(uuid: &str, device: &str, capacity_bytes: u64) -> VolumeDescriptor {
        VolumeDescriptor {
            device_identifier: device.into(),
            volume_uuid: uuid.into(),
            volume_name: "Archive".into(),
            mount_point: PathBuf::from("/Volumes/Archive"),
            capacity_bytes,
            free_bytes: 0,
            file_system: "apfs".into(),
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn accept() -> impl FnMut(&NameRequest<'_>) -> NameDecision {
        |_: &NameRequest<'_>| NameDecision::Accept
    }

    fn registry_with(entries: &[(&str, &str, &str)]) -> Registry {
        let mut reg = Registry::new();
        for (id, uuid, device) in entries {
            reg.register(RegistryEntry::new_external(id, &volume(uuid, device, 1), now()))
                .unwrap();
        }
        reg
    }

    #[test]
    fn known_uuid_returns_existing_id_without_mutation() {
        let rules = rules();
        let resolver = IdentityResolver::new(&rules);
        let mut reg = registry_with(&[("NOVA", "ABC-123", "disk2s1")]);
        let before = reg.clone();

        let got = resolver
            .resolve(&volume("ABC-123", "disk9s9", 1), &mut reg, &mut accept(), now())
            .unwrap();
        assert_eq!(got, Resolution::Known("NOVA".into()));
        assert_eq!(reg, before);
    }

    #[test]
    fn falls_back_to_device_identifier() {
        let rules = rules();
        let resolver = IdentityResolver::new(&rules);
        let mut reg = registry_with(&[("GROOT", "", "disk3s1")]);
        let got = resolver
            .resolve(&volume("", "disk3s1", 1), &mut reg, &mut accept(), now())
            .unwrap();
        assert_eq!(got.drive_id(), "GROOT");
        assert!(!got.is_new());
    }

    #[test]
    fn uuid_match_wins_regardless_of_entry_order() {
        // One entry shares the device id, a later one shares the UUID.
        let a = registry_with(&[("GROOT", "OTHER", "disk3s1"), ("NOVA", "U-1", "disk7s1")]);
        let b = registry_with(&[("NOVA", "U-1", "disk7s1"), ("GROOT", "OTHER", "disk3s1")]);
        let plugged = volume("U-1", "disk3s1", 1);
        assert_eq!(IdentityResolver::lookup(&plugged, &a).unwrap().id, "NOVA");
        assert_eq!(IdentityResolver::lookup(&plugged, &b).unwrap().id, "NOVA");
    }

    #[test]
    fn new_volume_gets_first_free_name_in_its_tier() {
        let rules = rules();
        let resolver = IdentityResolver::new(&rules);
        let mut reg = Registry::new();
        let two_tb = (2.0 * TIB) as u64;

        let got = resolver
            .resolve(&volume("U-9", "disk4s2", two_tb), &mut reg, &mut accept(), now())
            .unwrap();
        assert_eq!(got, Resolution::Registered("NOVA".into()));

        let entry = reg.get("NOVA").unwrap();
        assert_eq!(entry.volume_uuid, "U-9");
        assert_eq!(entry.device_identifier, "disk4s2");
        assert_eq!(entry.capacity_bytes, two_tb);
        assert_eq!(entry.first_seen, now());
        assert_eq!(entry.last_scanned, now());
        assert_eq!(entry.status, DriveStatus::Active);
    }

    #[test]
    fn re_resolving_a_registered_volume_is_stable() {
        let rules = rules();
        let resolver = IdentityResolver::new(&rules);
        let mut reg = Registry::new();
        let vol = volume("U-5", "sdc1", 10);
        let first = resolver
            .resolve(&vol, &mut reg, &mut accept(), now())
            .unwrap();
        let second = resolver
            .resolve(&vol, &mut reg, &mut accept(), now())
            .unwrap();
        assert!(first.is_new());
        assert_eq!(second, Resolution::Known(first.drive_id().to_string()));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn exhausted_tier_fails_and_leaves_registry_alone() {
        let rules = rules();
        let resolver = IdentityResolver::new(&rules);
        let mut reg = registry_with(&[("GROOT", "A", "a"), ("ROCKET", "B", "b")]);
        let before = reg.clone();

        let mut asked = false;
        let mut confirm = |_: &NameRequest<'_>| {
            asked = true;
            NameDecision::Accept
        };
        let err = resolver
            .resolve(&volume("C", "c", 1024), &mut reg, &mut confirm, now())
            .unwrap_err();
        assert_eq!(err, ResolveError::NoAvailableIdentity { tier: Tier::Small });
        assert!(!asked, "confirmation must not run without a proposal");
        assert_eq!(reg, before);
    }

    #[test]
    fn colliding_custom_name_is_rejected_until_a_free_one_is_given() {
        let rules = rules();
        let resolver = IdentityResolver::new(&rules);
        let mut reg = registry_with(&[("GROOT", "A", "a")]);

        let mut answers = vec![
            NameDecision::Custom("groot".into()),
            NameDecision::Custom("Mantis".into()),
        ]
        .into_iter();
        let mut seen_rejections = Vec::new();
        let mut confirm = |req: &NameRequest<'_>| {
            seen_rejections.push(req.rejected.map(|r| (r.name.to_string(), r.reason)));
            assert_eq!(req.proposed, "ROCKET");
            answers.next().unwrap_or(NameDecision::Abort)
        };

        let got = resolver
            .resolve(&volume("Z", "z", 5), &mut reg, &mut confirm, now())
            .unwrap();
        assert_eq!(got, Resolution::Registered("MANTIS".into()));
        assert_eq!(
            seen_rejections,
            vec![None, Some(("GROOT".to_string(), RejectReason::InUse))]
        );
        assert!(reg.contains_id("mantis"));
    }

    #[test]
    fn path_like_custom_names_are_re_asked() {
        let rules = rules();
        let resolver = IdentityResolver::new(&rules);
        let mut reg = Registry::new();

        let mut answers = vec![
            NameDecision::Custom("../../escape".into()),
            NameDecision::Custom("..".into()),
            NameDecision::Custom("Vault".into()),
        ]
        .into_iter();
        let mut reasons = Vec::new();
        let mut confirm = |req: &NameRequest<'_>| {
            if let Some(r) = req.rejected {
                reasons.push(r.reason);
            }
            answers.next().unwrap_or(NameDecision::Abort)
        };

        let got = resolver
            .resolve(&volume("Q", "q", 5), &mut reg, &mut confirm, now())
            .unwrap();
        assert_eq!(got.drive_id(), "VAULT");
        assert_eq!(
            reasons,
            vec![
                RejectReason::Invalid(InvalidId::Separator),
                RejectReason::Invalid(InvalidId::DotName),
            ]
        );
        assert_eq!(reg.len(), 1);
        assert!(!reg.contains_id("../../ESCAPE"));
    }

    #[test]
    fn unknown_uuid_still_falls_back_to_device_identifier() {
        // The drive was registered before its UUID was readable (or the
        // filesystem was reformatted); the device id still identifies it.
        let rules = rules();
        let resolver = IdentityResolver::new(&rules);
        let mut reg = registry_with(&[("GROOT", "OLD-UUID", "disk3s1")]);
        let before = reg.clone();
        let got = resolver
            .resolve(&volume("NEW-UUID", "disk3s1", 1), &mut reg, &mut accept(), now())
            .unwrap();
        assert_eq!(got, Resolution::Known("GROOT".into()));
        assert_eq!(reg, before);
    }

    #[test]
    fn blank_custom_name_accepts_the_proposal() {
        let rules = rules();
        let resolver = IdentityResolver::new(&rules);
        let mut reg = Registry::new();
        let mut confirm = |_: &NameRequest<'_>| NameDecision::Custom("   ".into());
        let got = resolver
            .resolve(&volume("Q", "q", 5), &mut reg, &mut confirm, now())
            .unwrap();
        assert_eq!(got.drive_id(), "GROOT");
    }

    #[test]
    fn abort_skips_registration() {
        let rules = rules();
        let resolver = IdentityResolver::new(&rules);
        let mut reg = Registry::new();
        let mut confirm = |_: &NameRequest<'_>| NameDecision::Abort;
        let err = resolver
            .resolve(&volume("Q", "q", 5), &mut reg, &mut confirm, now())
            .unwrap_err();
        assert_eq!(err, ResolveError::Aborted);
        assert!(reg.is_empty());
    }
}
