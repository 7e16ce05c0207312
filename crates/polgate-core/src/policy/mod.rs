//! Policy layer: data model, document form, keys and validation.
//!
//! Everything here is pure. Talking to the admin service is the gateway's
//! job; this module only decides what a policy looks like and what it is
//! called.

pub mod document;
pub mod key;
pub mod model;
pub mod set;
pub mod validate;

pub use document::{parse_documents, to_yaml};
pub use key::{derive_key, policy_key, PolicyKind};
pub use model::{
    Condition, Constants, DerivedRoles, Effect, ExportConstants, ExportVariables, ExprList, Match,
    MatchOp, Metadata, Output, OutputWhen, Policy, PolicyType, PrincipalPolicy, PrincipalRule,
    PrincipalRuleAction, ResourcePolicy, ResourceRule, RoleDef, RolePolicy, RoleRule,
    SourceAttributes, Variables, API_VERSION, DEFAULT_VERSION,
};
pub use set::{load_and_validate, PolicySet};
pub use validate::validate_policy;
