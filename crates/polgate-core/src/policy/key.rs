//! Policy kinds and the canonical policy key.
//!
//! Key format (external identifier, must not change):
//! - `resource.<resource>.v<version>[/<scope>]`
//! - `principal.<principal>.v<version>[/<scope>]`
//! - `derivedRole.<name>`
//!
//! An empty version is keyed as `default`. Role policies and exported
//! variables/constants have no key (empty string).

use std::fmt;
use std::str::FromStr;

use crate::error::GatewayError;

use super::model::{Policy, PolicyType, DEFAULT_VERSION};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PolicyKind {
    Resource,
    Principal,
    DerivedRole,
}

impl PolicyKind {
    pub const ALL: [PolicyKind; 3] = [
        PolicyKind::Resource,
        PolicyKind::Principal,
        PolicyKind::DerivedRole,
    ];

    /// Textual tag, used both in requests (`policyKind`) and as key prefix.
    pub fn as_str(self) -> &'static str {
        match self {
            PolicyKind::Resource => "resource",
            PolicyKind::Principal => "principal",
            PolicyKind::DerivedRole => "derivedRole",
        }
    }

    /// `"resource, principal, derivedRole"`
    pub fn allowed_list() -> String {
        Self::ALL
            .iter()
            .map(|k| k.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PolicyKind {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| {
                GatewayError::BadRequest(format!(
                    "`policyKind` must be one of: {}",
                    Self::allowed_list()
                ))
            })
    }
}

/// Key from raw parts. `version` and `scope` are ignored for derived roles.
pub fn derive_key(kind: PolicyKind, name: &str, version: &str, scope: &str) -> String {
    match kind {
        PolicyKind::Resource | PolicyKind::Principal => {
            let version = if version.is_empty() {
                DEFAULT_VERSION
            } else {
                version
            };
            let mut key = format!("{}.{}.v{}", kind.as_str(), name, version);
            if !scope.is_empty() {
                key.push('/');
                key.push_str(scope);
            }
            key
        }
        PolicyKind::DerivedRole => format!("{}.{}", kind.as_str(), name),
    }
}

/// Canonical key of a policy; empty for unkeyed or unset variants.
pub fn policy_key(policy: &Policy) -> String {
    match &policy.policy_type {
        Some(PolicyType::ResourcePolicy(rp)) => {
            derive_key(PolicyKind::Resource, &rp.resource, &rp.version, &rp.scope)
        }
        Some(PolicyType::PrincipalPolicy(pp)) => {
            derive_key(PolicyKind::Principal, &pp.principal, &pp.version, &pp.scope)
        }
        Some(PolicyType::DerivedRoles(dr)) => derive_key(PolicyKind::DerivedRole, &dr.name, "", ""),
        Some(PolicyType::ExportVariables(_))
        | Some(PolicyType::RolePolicy(_))
        | Some(PolicyType::ExportConstants(_))
        | None => String::new(),
    }
}

impl Policy {
    pub fn kind(&self) -> Option<PolicyKind> {
        match &self.policy_type {
            Some(PolicyType::ResourcePolicy(_)) => Some(PolicyKind::Resource),
            Some(PolicyType::PrincipalPolicy(_)) => Some(PolicyKind::Principal),
            Some(PolicyType::DerivedRoles(_)) => Some(PolicyKind::DerivedRole),
            Some(PolicyType::ExportVariables(_))
            | Some(PolicyType::RolePolicy(_))
            | Some(PolicyType::ExportConstants(_))
            | None => None,
        }
    }

    pub fn key(&self) -> String {
        policy_key(self)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn kind_round_trips_through_tag() {
        for k in PolicyKind::ALL {
            assert_eq!(k.as_str().parse::<PolicyKind>().unwrap(), k);
        }
    }

    #[test]
    fn unknown_kind_lists_allowed_values() {
        let err = "role".parse::<PolicyKind>().unwrap_err();
        assert_eq!(
            err.to_string(),
            "`policyKind` must be one of: resource, principal, derivedRole"
        );
    }

    #[test]
    fn unset_variant_has_empty_key() {
        assert_eq!(policy_key(&Policy::default()), "");
    }
}
