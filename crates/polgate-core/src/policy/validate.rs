//! Structural validation of policy documents.
//!
//! Shape checks only: required fields, identifier syntax, rule completeness.
//! Whether a policy makes sense as an authorization rule is decided by the
//! admin service on upsert.

use std::collections::HashSet;

use super::model::{
    Condition, Constants, DerivedRoles, Effect, ExportConstants, ExportVariables, Match, MatchOp,
    Policy, PolicyType, PrincipalPolicy, ResourcePolicy, RolePolicy, API_VERSION,
};

/// Collect every structural problem of `policy`. Empty means valid.
pub fn validate_policy(policy: &Policy) -> Vec<String> {
    let mut v = Violations::default();

    if policy.api_version != API_VERSION {
        v.push(
            "apiVersion",
            format!("must be {API_VERSION:?}, got {:?}", policy.api_version),
        );
    }

    match &policy.policy_type {
        Some(PolicyType::ResourcePolicy(rp)) => resource_policy(rp, &mut v),
        Some(PolicyType::PrincipalPolicy(pp)) => principal_policy(pp, &mut v),
        Some(PolicyType::DerivedRoles(dr)) => derived_roles(dr, &mut v),
        Some(PolicyType::RolePolicy(rp)) => role_policy(rp, &mut v),
        Some(PolicyType::ExportVariables(ev)) => export_variables(ev, &mut v),
        Some(PolicyType::ExportConstants(ec)) => export_constants(ec, &mut v),
        None => v.push(
            "policy",
            "one of resourcePolicy, principalPolicy, derivedRoles, exportVariables, \
             rolePolicy, exportConstants is required"
                .into(),
        ),
    }

    v.0
}

#[derive(Default)]
struct Violations(Vec<String>);

impl Violations {
    fn push(&mut self, path: &str, msg: String) {
        self.0.push(format!("{path}: {msg}"));
    }
}

fn resource_policy(rp: &ResourcePolicy, v: &mut Violations) {
    if rp.resource.is_empty() {
        v.push("resourcePolicy.resource", "must not be empty".into());
    }
    version(&rp.version, "resourcePolicy.version", v);
    scope(&rp.scope, "resourcePolicy.scope", v);

    let mut names = HashSet::new();
    for (i, rule) in rp.rules.iter().enumerate() {
        let path = format!("resourcePolicy.rules[{i}]");
        if rule.actions.is_empty() {
            v.push(&path, "at least one action is required".into());
        }
        if rule.actions.iter().any(|a| a.is_empty()) {
            v.push(&path, "actions must not be empty strings".into());
        }
        if rule.roles.is_empty() && rule.derived_roles.is_empty() {
            v.push(&path, "one of roles or derivedRoles is required".into());
        }
        effect(rule.effect, &path, v);
        if !rule.name.is_empty() && !names.insert(rule.name.as_str()) {
            v.push(&path, format!("duplicate rule name {:?}", rule.name));
        }
        condition(rule.condition.as_ref(), &path, v);
    }
    constants(rp.constants.as_ref(), "resourcePolicy.constants", v);
}

fn principal_policy(pp: &PrincipalPolicy, v: &mut Violations) {
    if pp.principal.is_empty() {
        v.push("principalPolicy.principal", "must not be empty".into());
    }
    version(&pp.version, "principalPolicy.version", v);
    scope(&pp.scope, "principalPolicy.scope", v);

    for (i, rule) in pp.rules.iter().enumerate() {
        let path = format!("principalPolicy.rules[{i}]");
        if rule.resource.is_empty() {
            v.push(&path, "resource must not be empty".into());
        }
        if rule.actions.is_empty() {
            v.push(&path, "at least one action is required".into());
        }
        for (j, action) in rule.actions.iter().enumerate() {
            let path = format!("{path}.actions[{j}]");
            if action.action.is_empty() {
                v.push(&path, "action must not be empty".into());
            }
            effect(action.effect, &path, v);
            condition(action.condition.as_ref(), &path, v);
        }
    }
    constants(pp.constants.as_ref(), "principalPolicy.constants", v);
}

fn derived_roles(dr: &DerivedRoles, v: &mut Violations) {
    if dr.name.is_empty() {
        v.push("derivedRoles.name", "must not be empty".into());
    }
    if dr.definitions.is_empty() {
        v.push("derivedRoles.definitions", "at least one definition is required".into());
    }

    let mut names = HashSet::new();
    for (i, def) in dr.definitions.iter().enumerate() {
        let path = format!("derivedRoles.definitions[{i}]");
        if !is_role_name(&def.name) {
            v.push(&path, format!("invalid role name {:?}", def.name));
        } else if !names.insert(def.name.as_str()) {
            v.push(&path, format!("duplicate role name {:?}", def.name));
        }
        if def.parent_roles.is_empty() {
            v.push(&path, "at least one parent role is required".into());
        }
        condition(def.condition.as_ref(), &path, v);
    }
    constants(dr.constants.as_ref(), "derivedRoles.constants", v);
}

fn role_policy(rp: &RolePolicy, v: &mut Violations) {
    if !is_role_name(&rp.role) {
        v.push("rolePolicy.role", format!("invalid role name {:?}", rp.role));
    }
    scope(&rp.scope, "rolePolicy.scope", v);
    if rp.parent_roles.iter().any(|r| r.is_empty()) {
        v.push("rolePolicy.parentRoles", "must not contain empty strings".into());
    }

    for (i, rule) in rp.rules.iter().enumerate() {
        let path = format!("rolePolicy.rules[{i}]");
        if rule.resource.is_empty() {
            v.push(&path, "resource must not be empty".into());
        }
        if rule.allow_actions.is_empty() {
            v.push(&path, "at least one allowAction is required".into());
        }
        condition(rule.condition.as_ref(), &path, v);
    }
}

fn export_variables(ev: &ExportVariables, v: &mut Violations) {
    if ev.name.is_empty() {
        v.push("exportVariables.name", "must not be empty".into());
    }
}

fn export_constants(ec: &ExportConstants, v: &mut Violations) {
    if ec.name.is_empty() {
        v.push("exportConstants.name", "must not be empty".into());
    }
}

fn constants(c: Option<&Constants>, path: &str, v: &mut Violations) {
    let Some(c) = c else { return };
    if c.import.iter().any(|name| name.is_empty()) {
        v.push(&format!("{path}.import"), "must not contain empty names".into());
    }
}

fn version(version: &str, path: &str, v: &mut Violations) {
    if version.is_empty() {
        v.push(path, "must not be empty".into());
    } else if !version.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        v.push(path, format!("invalid version {version:?}"));
    }
}

fn scope(scope: &str, path: &str, v: &mut Violations) {
    if scope.is_empty() {
        return;
    }
    let ok = scope.split('.').all(|seg| {
        !seg.is_empty()
            && seg
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    });
    if !ok {
        v.push(path, format!("invalid scope {scope:?}"));
    }
}

fn effect(raw: i32, path: &str, v: &mut Violations) {
    match Effect::try_from(raw) {
        Ok(Effect::Allow) | Ok(Effect::Deny) => {}
        _ => v.push(path, "effect must be EFFECT_ALLOW or EFFECT_DENY".into()),
    }
}

fn is_role_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
}

fn condition(cond: Option<&Condition>, path: &str, v: &mut Violations) {
    let Some(cond) = cond else { return };
    match &cond.match_expr {
        Some(m) => match_expr(m, &format!("{path}.condition.match"), v),
        None if !cond.script.trim().is_empty() => {}
        None => v.push(&format!("{path}.condition"), "match is required".into()),
    }
}

fn match_expr(m: &Match, path: &str, v: &mut Violations) {
    match &m.op {
        Some(MatchOp::All(list)) | Some(MatchOp::Any(list)) | Some(MatchOp::NoneOf(list)) => {
            if list.of.is_empty() {
                v.push(path, "expression list must not be empty".into());
            }
            for (i, sub) in list.of.iter().enumerate() {
                match_expr(sub, &format!("{path}.of[{i}]"), v);
            }
        }
        Some(MatchOp::Expr(e)) => {
            if e.trim().is_empty() {
                v.push(path, "expr must not be empty".into());
            }
        }
        None => v.push(path, "one of all, any, none, expr is required".into()),
    }
}
