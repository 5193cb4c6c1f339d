use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Inbound traffic rule. A source matches when it carries every label in
/// `from_selector` with an equal value.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct IngressRule {
    #[serde(default)]
    pub from_selector: HashMap<String, String>,
}

impl IngressRule {
    pub fn matches(&self, source_labels: &HashMap<String, String>) -> bool {
        self.from_selector
            .iter()
            .all(|(k, v)| source_labels.get(k) == Some(v))
    }
}

/// Ingress firewall for the pods selected by `pod_selector`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NetworkPolicy {
    pub id: String,
    pub namespace: String,
    /// Label selector for pods this policy applies to
    #[serde(default)]
    pub pod_selector: HashMap<String, String>,
    /// Allowed inbound traffic rules
    #[serde(default)]
    pub ingress: Vec<IngressRule>,
    /// When false, all ingress is allowed regardless of rules.
    #[serde(default = "default_enforced")]
    enforced: bool,
}

fn default_enforced() -> bool {
    true
}

impl NetworkPolicy {
    pub fn new(id: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            namespace: namespace.into(),
            pod_selector: HashMap::new(),
            ingress: vec![],
            enforced: true,
        }
    }

    pub fn with_rule(mut self, rule: IngressRule) -> Self {
        self.ingress.push(rule);
        self
    }

    pub fn is_enforced(&self) -> bool {
        self.enforced
    }

    pub fn set_enforced(&mut self, enforced: bool) {
        self.enforced = enforced;
    }

    pub fn toggle_enforcement(&mut self) {
        self.enforced = !self.enforced;
    }

    pub fn is_ingress_allowed(&self, source_labels: &HashMap<String, String>) -> bool {
        if !self.enforced {
            return true;
        }
        self.ingress.iter().any(|rule| rule.matches(source_labels))
    }
}
