//! Human-readable document form of policies (YAML, JSON).
//!
//! The prost oneofs do not map cleanly onto serde, so `Policy` and `Match`
//! convert through the flat mirrors below. Parsing is strict: unknown keys
//! and documents naming more than one variant are rejected.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{GatewayError, Result};

use super::model::{
    is_false, DerivedRoles, ExportConstants, ExportVariables, ExprList, Match, MatchOp, Metadata,
    Policy, PolicyType, PrincipalPolicy, ResourcePolicy, RolePolicy,
};

const VARIANT_NAMES: &str =
    "resourcePolicy, principalPolicy, derivedRoles, exportVariables, rolePolicy, exportConstants";

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub(crate) struct PolicyDocument {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    api_version: String,
    #[serde(default, skip_serializing_if = "is_false")]
    disabled: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    metadata: Option<Metadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    resource_policy: Option<ResourcePolicy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    principal_policy: Option<PrincipalPolicy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    derived_roles: Option<DerivedRoles>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    export_variables: Option<ExportVariables>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role_policy: Option<RolePolicy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    export_constants: Option<ExportConstants>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    variables: BTreeMap<String, String>,
    #[serde(rename = "$schema", default, skip_serializing_if = "String::is_empty")]
    json_schema: String,
}

impl TryFrom<PolicyDocument> for Policy {
    type Error = GatewayError;

    fn try_from(doc: PolicyDocument) -> Result<Self> {
        let mut variants: Vec<PolicyType> = [
            doc.resource_policy.map(PolicyType::ResourcePolicy),
            doc.principal_policy.map(PolicyType::PrincipalPolicy),
            doc.derived_roles.map(PolicyType::DerivedRoles),
            doc.export_variables.map(PolicyType::ExportVariables),
            doc.role_policy.map(PolicyType::RolePolicy),
            doc.export_constants.map(PolicyType::ExportConstants),
        ]
        .into_iter()
        .flatten()
        .collect();
        if variants.len() > 1 {
            return Err(GatewayError::BadRequest(format!(
                "policy must define exactly one of {VARIANT_NAMES} (found {})",
                variants.len()
            )));
        }

        Ok(Policy {
            api_version: doc.api_version,
            disabled: doc.disabled,
            description: doc.description,
            metadata: doc.metadata,
            policy_type: variants.pop(),
            variables: doc.variables,
            json_schema: doc.json_schema,
        })
    }
}

impl From<Policy> for PolicyDocument {
    fn from(p: Policy) -> Self {
        let mut doc = PolicyDocument {
            api_version: p.api_version,
            disabled: p.disabled,
            description: p.description,
            metadata: p.metadata,
            resource_policy: None,
            principal_policy: None,
            derived_roles: None,
            export_variables: None,
            role_policy: None,
            export_constants: None,
            variables: p.variables,
            json_schema: p.json_schema,
        };
        match p.policy_type {
            Some(PolicyType::ResourcePolicy(rp)) => doc.resource_policy = Some(rp),
            Some(PolicyType::PrincipalPolicy(pp)) => doc.principal_policy = Some(pp),
            Some(PolicyType::DerivedRoles(dr)) => doc.derived_roles = Some(dr),
            Some(PolicyType::ExportVariables(ev)) => doc.export_variables = Some(ev),
            Some(PolicyType::RolePolicy(rp)) => doc.role_policy = Some(rp),
            Some(PolicyType::ExportConstants(ec)) => doc.export_constants = Some(ec),
            None => {}
        }
        doc
    }
}

#[derive(Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct MatchDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    all: Option<ExprList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    any: Option<ExprList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    none: Option<ExprList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    expr: Option<String>,
}

impl TryFrom<MatchDocument> for Match {
    type Error = GatewayError;

    fn try_from(doc: MatchDocument) -> Result<Self> {
        let ops: Vec<MatchOp> = [
            doc.all.map(MatchOp::All),
            doc.any.map(MatchOp::Any),
            doc.none.map(MatchOp::NoneOf),
            doc.expr.map(MatchOp::Expr),
        ]
        .into_iter()
        .flatten()
        .collect();

        match <[MatchOp; 1]>::try_from(ops) {
            Ok([op]) => Ok(Match { op: Some(op) }),
            Err(ops) => Err(GatewayError::BadRequest(format!(
                "match must set exactly one of all, any, none, expr (found {})",
                ops.len()
            ))),
        }
    }
}

impl From<Match> for MatchDocument {
    fn from(m: Match) -> Self {
        let mut doc = MatchDocument::default();
        match m.op {
            Some(MatchOp::All(l)) => doc.all = Some(l),
            Some(MatchOp::Any(l)) => doc.any = Some(l),
            Some(MatchOp::NoneOf(l)) => doc.none = Some(l),
            Some(MatchOp::Expr(e)) => doc.expr = Some(e),
            None => {}
        }
        doc
    }
}

/// Parse one or more policy documents separated by `---`.
///
/// JSON input is accepted as well since it is valid YAML. Empty documents
/// (blank text, a bare `---`, comments only) are skipped.
pub fn parse_documents(text: &str) -> Result<Vec<Policy>> {
    let mut out = Vec::new();
    for de in serde_yaml::Deserializer::from_str(text) {
        let policy = Option::<Policy>::deserialize(de)
            .map_err(|e| GatewayError::BadRequest(format!("failed to read policy: {e}")))?;
        out.extend(policy);
    }
    tracing::debug!(count = out.len(), "parsed policy documents");
    Ok(out)
}

/// Render a policy as a YAML document (the form returned by Get Policy).
pub fn to_yaml(policy: &Policy) -> Result<String> {
    serde_yaml::to_string(policy).map_err(|e| GatewayError::Internal(e.to_string()))
}
