//! Permission requirement normalization.
//!
//! Requirement maps arrive sparse: resources with empty action sets, profile
//! lists with empty or repeated entries. The evaluator only ever sees the
//! canonical form produced here.

use std::collections::HashMap;

use warden_types::{Action, PermissionError, PermissionMap, ResourceType};

/// Canonicalizes permission maps and "any-of" profile lists.
pub struct PermissionNormalizer;

impl PermissionNormalizer {
    /// Drops resources that carry no action.
    pub fn normalize(map: &PermissionMap) -> PermissionMap {
        let mut normalized = map.clone();
        normalized.retain_non_empty();
        normalized
    }

    /// Normalizes each profile, then drops empty and repeated profiles.
    ///
    /// Order of first occurrence is preserved.
    pub fn normalize_profiles(profiles: &[PermissionMap]) -> Vec<PermissionMap> {
        let mut out: Vec<PermissionMap> = Vec::with_capacity(profiles.len());
        for profile in profiles {
            let normalized = Self::normalize(profile);
            if normalized.is_empty() || out.contains(&normalized) {
                continue;
            }
            out.push(normalized);
        }
        out
    }

    /// Validates a free-form `{resource: [actions]}` map into the closed vocabulary.
    pub fn from_raw(raw: &HashMap<String, Vec<String>>) -> Result<PermissionMap, PermissionError> {
        let mut map = PermissionMap::new();
        for (resource, actions) in raw {
            let resource: ResourceType = resource.parse()?;
            for action in actions {
                map.grant(resource, action.parse::<Action>()?);
            }
        }
        Ok(map)
    }

    /// Parses `resource.action` strings, e.g. `employeeProfile.pii:read`.
    pub fn from_strings<S: AsRef<str>>(entries: &[S]) -> Result<PermissionMap, PermissionError> {
        let mut map = PermissionMap::new();
        for entry in entries {
            let entry = entry.as_ref();
            let (resource, action) = entry
                .split_once('.')
                .ok_or_else(|| PermissionError::Malformed(entry.to_string()))?;
            map.grant(resource.parse()?, action.parse()?);
        }
        Ok(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn test_normalize_drops_empty_action_sets() {
        let mut map = PermissionMap::new().with(ResourceType::Invoice, [Action::Read]);
        map.grant(ResourceType::Member, Action::Read);
        map.revoke(ResourceType::Member, Action::Read);

        let normalized = PermissionNormalizer::normalize(&map);
        let resources: Vec<ResourceType> = normalized.iter().map(|(r, _)| r).collect();
        assert_eq!(resources, vec![ResourceType::Invoice]);
    }

    #[test]
    fn test_normalize_profiles_dedupes_and_drops_empty() {
        let a = PermissionMap::new().with(ResourceType::Absence, [Action::Approve]);
        let b = PermissionMap::new().with(ResourceType::LeaveRequest, [Action::Approve]);
        let profiles = vec![a.clone(), PermissionMap::new(), b.clone(), a.clone()];

        assert_eq!(PermissionNormalizer::normalize_profiles(&profiles), vec![a, b]);
    }

    #[test]
    fn test_from_raw_validates_tokens() {
        let mut raw = HashMap::new();
        raw.insert(
            "employeeProfile".to_string(),
            vec!["read".to_string(), "pii:read".to_string()],
        );
        let map = PermissionNormalizer::from_raw(&raw).unwrap();
        assert_eq!(
            map.actions(ResourceType::EmployeeProfile).cloned(),
            Some(BTreeSet::from([Action::Read, Action::PiiRead]))
        );

        raw.insert("payroll".to_string(), vec!["read".to_string()]);
        assert_eq!(
            PermissionNormalizer::from_raw(&raw),
            Err(PermissionError::UnknownResource("payroll".to_string()))
        );
    }

    #[test]
    fn test_from_strings() {
        let map =
            PermissionNormalizer::from_strings(&["absence.approve", "employeeProfile.pii:read"])
                .unwrap();
        assert!(map.contains(ResourceType::Absence, Action::Approve));
        assert!(map.has_pii_scope());

        assert!(matches!(
            PermissionNormalizer::from_strings(&["absence"]),
            Err(PermissionError::Malformed(_))
        ));
    }
}
