//! Policy data model.
//!
//! One set of types serves both lanes: prost encodes them for the admin
//! service (field numbers follow `cerbos.policy.v1`), serde renders them as
//! human-readable documents (camelCase, empty values omitted).
//!
//! `Policy` and `Match` carry a oneof on the wire; their serde form goes
//! through the mirrors in `document.rs` so unknown keys and ambiguous
//! variants are rejected while parsing.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// `apiVersion` every policy document must declare.
pub const API_VERSION: &str = "api.cerbos.dev/v1";

/// Version used when a resource/principal policy does not name one.
pub const DEFAULT_VERSION: &str = "default";

pub(crate) fn is_false(v: &bool) -> bool {
    !*v
}

pub(crate) fn is_unspecified(v: &i32) -> bool {
    *v == Effect::Unspecified as i32
}

/// A policy document. Exactly one variant is set; only resource policies,
/// principal policies and derived roles have a key.
#[derive(Clone, PartialEq, prost::Message, Serialize, Deserialize)]
#[serde(
    try_from = "super::document::PolicyDocument",
    into = "super::document::PolicyDocument"
)]
pub struct Policy {
    #[prost(string, tag = "1")]
    pub api_version: String,
    #[prost(bool, tag = "2")]
    pub disabled: bool,
    #[prost(string, tag = "3")]
    pub description: String,
    #[prost(message, optional, tag = "4")]
    pub metadata: Option<Metadata>,
    /// `None` when the wire value carried a variant this gateway does not model.
    #[prost(oneof = "PolicyType", tags = "5, 6, 7, 10, 11, 12")]
    pub policy_type: Option<PolicyType>,
    #[prost(btree_map = "string, string", tag = "8")]
    pub variables: BTreeMap<String, String>,
    #[prost(string, tag = "9")]
    pub json_schema: String,
}

#[derive(Clone, PartialEq, prost::Oneof)]
pub enum PolicyType {
    #[prost(message, tag = "5")]
    ResourcePolicy(ResourcePolicy),
    #[prost(message, tag = "6")]
    PrincipalPolicy(PrincipalPolicy),
    #[prost(message, tag = "7")]
    DerivedRoles(DerivedRoles),
    #[prost(message, tag = "10")]
    ExportVariables(ExportVariables),
    #[prost(message, tag = "11")]
    RolePolicy(RolePolicy),
    #[prost(message, tag = "12")]
    ExportConstants(ExportConstants),
}

#[derive(Clone, PartialEq, prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct Metadata {
    #[prost(string, tag = "1")]
    #[serde(skip_serializing_if = "String::is_empty")]
    pub source_file: String,
    #[prost(btree_map = "string, string", tag = "2")]
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
    /// `google.protobuf.UInt64Value`, set by the admin service.
    #[prost(message, optional, tag = "3")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hash: Option<u64>,
    #[prost(string, tag = "5")]
    #[serde(skip_serializing_if = "String::is_empty")]
    pub store_identifier: String,
    #[prost(message, optional, tag = "6")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_attributes: Option<SourceAttributes>,
}

#[derive(Clone, PartialEq, prost::Message, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct SourceAttributes {
    #[prost(btree_map = "string, message", tag = "1")]
    #[serde(with = "const_values", skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, prost_types::Value>,
}

#[derive(Clone, PartialEq, prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct ResourcePolicy {
    #[prost(string, tag = "1")]
    #[serde(skip_serializing_if = "String::is_empty")]
    pub resource: String,
    #[prost(string, tag = "2")]
    #[serde(skip_serializing_if = "String::is_empty")]
    pub version: String,
    #[prost(string, repeated, tag = "3")]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub import_derived_roles: Vec<String>,
    #[prost(message, repeated, tag = "4")]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub rules: Vec<ResourceRule>,
    #[prost(string, tag = "5")]
    #[serde(skip_serializing_if = "String::is_empty")]
    pub scope: String,
    #[prost(message, optional, tag = "6")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schemas: Option<Schemas>,
    #[prost(message, optional, tag = "7")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variables: Option<Variables>,
    #[prost(message, optional, tag = "8")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub constants: Option<Constants>,
}

#[derive(Clone, PartialEq, prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct ResourceRule {
    #[prost(string, repeated, tag = "1")]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<String>,
    #[prost(string, repeated, tag = "2")]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub derived_roles: Vec<String>,
    #[prost(string, repeated, tag = "3")]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub roles: Vec<String>,
    #[prost(message, optional, tag = "4")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<Condition>,
    #[prost(enumeration = "Effect", tag = "5")]
    #[serde(with = "effect_name", skip_serializing_if = "is_unspecified")]
    pub effect: i32,
    #[prost(string, tag = "6")]
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[prost(message, optional, tag = "7")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<Output>,
}

#[derive(Clone, PartialEq, prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct PrincipalPolicy {
    #[prost(string, tag = "1")]
    #[serde(skip_serializing_if = "String::is_empty")]
    pub principal: String,
    #[prost(string, tag = "2")]
    #[serde(skip_serializing_if = "String::is_empty")]
    pub version: String,
    #[prost(message, repeated, tag = "3")]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub rules: Vec<PrincipalRule>,
    #[prost(string, tag = "4")]
    #[serde(skip_serializing_if = "String::is_empty")]
    pub scope: String,
    #[prost(message, optional, tag = "5")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variables: Option<Variables>,
    #[prost(message, optional, tag = "6")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub constants: Option<Constants>,
}

#[derive(Clone, PartialEq, prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct PrincipalRule {
    #[prost(string, tag = "1")]
    #[serde(skip_serializing_if = "String::is_empty")]
    pub resource: String,
    #[prost(message, repeated, tag = "2")]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<PrincipalRuleAction>,
}

#[derive(Clone, PartialEq, prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct PrincipalRuleAction {
    #[prost(string, tag = "1")]
    #[serde(skip_serializing_if = "String::is_empty")]
    pub action: String,
    #[prost(message, optional, tag = "2")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<Condition>,
    #[prost(enumeration = "Effect", tag = "3")]
    #[serde(with = "effect_name", skip_serializing_if = "is_unspecified")]
    pub effect: i32,
    #[prost(string, tag = "4")]
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[prost(message, optional, tag = "5")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<Output>,
}

#[derive(Clone, PartialEq, prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct DerivedRoles {
    #[prost(string, tag = "1")]
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[prost(message, repeated, tag = "2")]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub definitions: Vec<RoleDef>,
    #[prost(message, optional, tag = "3")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variables: Option<Variables>,
    #[prost(message, optional, tag = "4")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub constants: Option<Constants>,
}

#[derive(Clone, PartialEq, prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct RoleDef {
    #[prost(string, tag = "1")]
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[prost(string, repeated, tag = "2")]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub parent_roles: Vec<String>,
    #[prost(message, optional, tag = "3")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<Condition>,
}

#[derive(Clone, PartialEq, prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct Variables {
    #[prost(string, repeated, tag = "1")]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub import: Vec<String>,
    #[prost(btree_map = "string, string", tag = "2")]
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub local: BTreeMap<String, String>,
}

/// Named constants; values are arbitrary JSON (`google.protobuf.Value`).
#[derive(Clone, PartialEq, prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct Constants {
    #[prost(string, repeated, tag = "1")]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub import: Vec<String>,
    #[prost(btree_map = "string, message", tag = "2")]
    #[serde(with = "const_values", skip_serializing_if = "BTreeMap::is_empty")]
    pub local: BTreeMap<String, prost_types::Value>,
}

#[derive(Clone, PartialEq, prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct ExportVariables {
    #[prost(string, tag = "1")]
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[prost(btree_map = "string, string", tag = "2")]
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub definitions: BTreeMap<String, String>,
}

#[derive(Clone, PartialEq, prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct ExportConstants {
    #[prost(string, tag = "1")]
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[prost(btree_map = "string, message", tag = "2")]
    #[serde(with = "const_values", skip_serializing_if = "BTreeMap::is_empty")]
    pub definitions: BTreeMap<String, prost_types::Value>,
}

/// Permissions granted to a custom role, optionally scoped.
#[derive(Clone, PartialEq, prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct RolePolicy {
    #[prost(string, tag = "1")]
    #[serde(skip_serializing_if = "String::is_empty")]
    pub role: String,
    #[prost(string, tag = "2")]
    #[serde(skip_serializing_if = "String::is_empty")]
    pub scope: String,
    #[prost(message, repeated, tag = "3")]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub rules: Vec<RoleRule>,
    #[prost(string, repeated, tag = "5")]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub parent_roles: Vec<String>,
}

#[derive(Clone, PartialEq, prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct RoleRule {
    #[prost(string, tag = "1")]
    #[serde(skip_serializing_if = "String::is_empty")]
    pub resource: String,
    #[prost(string, repeated, tag = "2")]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub allow_actions: Vec<String>,
    #[prost(message, optional, tag = "3")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<Condition>,
}

#[derive(Clone, PartialEq, prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct Schemas {
    #[prost(message, optional, tag = "1")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub principal_schema: Option<Schema>,
    #[prost(message, optional, tag = "2")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_schema: Option<Schema>,
}

#[derive(Clone, PartialEq, prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct Schema {
    #[prost(string, tag = "1")]
    #[serde(rename = "ref", skip_serializing_if = "String::is_empty")]
    pub schema_ref: String,
    #[prost(message, optional, tag = "2")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ignore_when: Option<IgnoreWhen>,
}

#[derive(Clone, PartialEq, prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct IgnoreWhen {
    #[prost(string, repeated, tag = "1")]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<String>,
}

/// Rule condition. On the wire this is a oneof of `match` and the legacy
/// `script`; both arms encode like plain optional fields.
#[derive(Clone, PartialEq, prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct Condition {
    #[prost(message, optional, tag = "1")]
    #[serde(rename = "match", skip_serializing_if = "Option::is_none")]
    pub match_expr: Option<Match>,
    #[prost(string, tag = "2")]
    #[serde(skip_serializing_if = "String::is_empty")]
    pub script: String,
}

/// Boolean expression tree: `all`/`any`/`none` over sub-matches, or a leaf `expr`.
#[derive(Clone, PartialEq, prost::Message, Serialize, Deserialize)]
#[serde(
    try_from = "super::document::MatchDocument",
    into = "super::document::MatchDocument"
)]
pub struct Match {
    #[prost(oneof = "MatchOp", tags = "1, 2, 3, 4")]
    pub op: Option<MatchOp>,
}

#[derive(Clone, PartialEq, prost::Oneof)]
pub enum MatchOp {
    #[prost(message, tag = "1")]
    All(ExprList),
    #[prost(message, tag = "2")]
    Any(ExprList),
    #[prost(message, tag = "3")]
    NoneOf(ExprList),
    #[prost(string, tag = "4")]
    Expr(String),
}

#[derive(Clone, PartialEq, prost::Message, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct ExprList {
    #[prost(message, repeated, tag = "1")]
    pub of: Vec<Match>,
}

#[derive(Clone, PartialEq, prost::Message, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct Output {
    #[prost(string, tag = "1")]
    #[serde(skip_serializing_if = "String::is_empty")]
    pub expr: String,
    #[prost(message, optional, tag = "2")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub when: Option<OutputWhen>,
}

/// Output expressions keyed by how the rule evaluated.
#[derive(Clone, PartialEq, prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct OutputWhen {
    #[prost(string, tag = "1")]
    #[serde(skip_serializing_if = "String::is_empty")]
    pub rule_activated: String,
    #[prost(string, tag = "2")]
    #[serde(skip_serializing_if = "String::is_empty")]
    pub condition_not_met: String,
}

/// Rule effect (`cerbos.effect.v1.Effect`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum Effect {
    Unspecified = 0,
    Allow = 1,
    Deny = 2,
    NoMatch = 3,
}

impl Effect {
    pub fn as_str_name(&self) -> &'static str {
        match self {
            Effect::Unspecified => "EFFECT_UNSPECIFIED",
            Effect::Allow => "EFFECT_ALLOW",
            Effect::Deny => "EFFECT_DENY",
            Effect::NoMatch => "EFFECT_NO_MATCH",
        }
    }

    pub fn from_str_name(value: &str) -> Option<Self> {
        match value {
            "EFFECT_UNSPECIFIED" => Some(Effect::Unspecified),
            "EFFECT_ALLOW" => Some(Effect::Allow),
            "EFFECT_DENY" => Some(Effect::Deny),
            "EFFECT_NO_MATCH" => Some(Effect::NoMatch),
            _ => None,
        }
    }
}

/// Serde adapter: effects are stored as `i32` (prost) but written by name.
mod effect_name {
    use serde::{de::Error as _, Deserialize, Deserializer, Serializer};

    use super::Effect;

    pub fn serialize<S: Serializer>(v: &i32, s: S) -> Result<S::Ok, S::Error> {
        match Effect::try_from(*v) {
            Ok(e) => s.serialize_str(e.as_str_name()),
            Err(_) => s.serialize_i32(*v),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<i32, D::Error> {
        let name = String::deserialize(d)?;
        Effect::from_str_name(&name)
            .map(|e| e as i32)
            .ok_or_else(|| D::Error::custom(format!("unknown effect: {name}")))
    }
}

/// Serde adapter for `map<string, google.protobuf.Value>`: written as plain
/// JSON/YAML values.
mod const_values {
    use std::collections::BTreeMap;

    use prost_types::value::Kind;
    use serde::{Deserialize, Deserializer, Serializer};
    use serde_json::{Number, Value as Json};

    // Integral floats inside this range render without a fraction.
    const MAX_EXACT_INT: f64 = 9_007_199_254_740_992.0;

    pub fn serialize<S: Serializer>(
        m: &BTreeMap<String, prost_types::Value>,
        s: S,
    ) -> Result<S::Ok, S::Error> {
        s.collect_map(m.iter().map(|(k, v)| (k, to_json(v))))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        d: D,
    ) -> Result<BTreeMap<String, prost_types::Value>, D::Error> {
        let m = BTreeMap::<String, Json>::deserialize(d)?;
        Ok(m.into_iter().map(|(k, v)| (k, from_json(v))).collect())
    }

    fn to_json(v: &prost_types::Value) -> Json {
        match &v.kind {
            None | Some(Kind::NullValue(_)) => Json::Null,
            Some(Kind::BoolValue(b)) => Json::Bool(*b),
            Some(Kind::NumberValue(n)) if n.fract() == 0.0 && n.abs() < MAX_EXACT_INT => {
                Json::Number(Number::from(*n as i64))
            }
            Some(Kind::NumberValue(n)) => Number::from_f64(*n).map_or(Json::Null, Json::Number),
            Some(Kind::StringValue(s)) => Json::String(s.clone()),
            Some(Kind::ListValue(l)) => Json::Array(l.values.iter().map(to_json).collect()),
            Some(Kind::StructValue(st)) => Json::Object(
                st.fields
                    .iter()
                    .map(|(k, v)| (k.clone(), to_json(v)))
                    .collect(),
            ),
        }
    }

    fn from_json(v: Json) -> prost_types::Value {
        let kind = match v {
            Json::Null => Kind::NullValue(prost_types::NullValue::NullValue as i32),
            Json::Bool(b) => Kind::BoolValue(b),
            Json::Number(n) => Kind::NumberValue(n.as_f64().unwrap_or_default()),
            Json::String(s) => Kind::StringValue(s),
            Json::Array(items) => Kind::ListValue(prost_types::ListValue {
                values: items.into_iter().map(from_json).collect(),
            }),
            Json::Object(fields) => Kind::StructValue(prost_types::Struct {
                fields: fields.into_iter().map(|(k, v)| (k, from_json(v))).collect(),
            }),
        };
        prost_types::Value { kind: Some(kind) }
    }
}

impl Policy {
    fn with_type(policy_type: PolicyType) -> Self {
        Self {
            api_version: API_VERSION.to_string(),
            policy_type: Some(policy_type),
            ..Default::default()
        }
    }

    /// Empty resource policy; an empty `version` becomes `"default"`.
    pub fn resource(resource: impl Into<String>, version: impl Into<String>) -> Self {
        Self::with_type(PolicyType::ResourcePolicy(ResourcePolicy {
            resource: resource.into(),
            version: or_default_version(version.into()),
            ..Default::default()
        }))
    }

    /// Empty principal policy; an empty `version` becomes `"default"`.
    pub fn principal(principal: impl Into<String>, version: impl Into<String>) -> Self {
        Self::with_type(PolicyType::PrincipalPolicy(PrincipalPolicy {
            principal: principal.into(),
            version: or_default_version(version.into()),
            ..Default::default()
        }))
    }

    pub fn derived_roles(name: impl Into<String>) -> Self {
        Self::with_type(PolicyType::DerivedRoles(DerivedRoles {
            name: name.into(),
            ..Default::default()
        }))
    }

    /// Set the scope of a resource, principal or role policy. No-op otherwise.
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        let scope = scope.into();
        match &mut self.policy_type {
            Some(PolicyType::ResourcePolicy(rp)) => rp.scope = scope,
            Some(PolicyType::PrincipalPolicy(pp)) => pp.scope = scope,
            Some(PolicyType::RolePolicy(rp)) => rp.scope = scope,
            Some(PolicyType::DerivedRoles(_))
            | Some(PolicyType::ExportVariables(_))
            | Some(PolicyType::ExportConstants(_))
            | None => {}
        }
        self
    }
}

pub(crate) fn or_default_version(version: String) -> String {
    if version.is_empty() {
        DEFAULT_VERSION.to_string()
    } else {
        version
    }
}
