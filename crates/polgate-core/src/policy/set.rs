use crate::error::{GatewayError, Result};

use super::document::parse_documents;
use super::model::Policy;
use super::validate::validate_policy;

/// Ordered batch of policies sent to the admin service in one upsert.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PolicySet {
    policies: Vec<Policy>,
}

impl PolicySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(mut self, policy: Policy) -> Self {
        self.policies.push(policy);
        self
    }

    /// Parse policy text (YAML or JSON, `---` separated documents).
    pub fn from_documents(text: &str) -> Result<Self> {
        Ok(Self {
            policies: parse_documents(text)?,
        })
    }

    /// Structural validation of every policy; all violations are reported at once.
    pub fn validate(&self) -> Result<()> {
        if self.policies.is_empty() {
            return Err(GatewayError::BadRequest(
                "no policies found in document".into(),
            ));
        }

        let mut problems = Vec::new();
        for (i, p) in self.policies.iter().enumerate() {
            let errs = validate_policy(p);
            if errs.is_empty() {
                continue;
            }
            let label = match p.key() {
                k if k.is_empty() => format!("policy #{}", i + 1),
                k => k,
            };
            problems.extend(errs.into_iter().map(|e| format!("{label}: {e}")));
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(GatewayError::BadRequest(problems.join("; ")))
        }
    }

    pub fn policies(&self) -> &[Policy] {
        &self.policies
    }

    pub fn first(&self) -> Option<&Policy> {
        self.policies.first()
    }

    pub fn len(&self) -> usize {
        self.policies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }

    pub fn into_policies(self) -> Vec<Policy> {
        self.policies
    }
}

/// Parse then validate; the path shared by the validate and update operations.
pub fn load_and_validate(text: &str) -> Result<PolicySet> {
    let set = PolicySet::from_documents(text)?;
    set.validate()?;
    Ok(set)
}
