//! Name to factory tables, one per node family.
//!
//! ## Registry invariant
//! Registries are built once at the entrypoint with [`Registries::build`] and passed by
//! reference to everything that constructs nodes. Nothing keeps a hidden global copy.
//!
//! ```rust
//! use easyssh::runtime::registry::Registries;
//! let registries = Registries::build().expect("built-in registries are consistent");
//! assert!(registries.executors.supported_names().contains(&"ssh-exec".to_string()));
//! ```

use std::collections::BTreeMap;

use crate::diagnostics::Family;
use crate::macros::{RewriteRule, RuleSet};
use crate::nodes::{discoverers, executors, filters, Discoverer, Executor, Filter, Node};
use crate::EasysshError;

/// Creates an unconfigured node.
pub type Factory<N> = fn() -> N;

/// Primitive node names of one family plus the rules rewriting definitions into them.
pub struct NodeRegistry<N> {
    factories: BTreeMap<String, Factory<N>>,
    rules: RuleSet,
}

impl<N: Node> NodeRegistry<N> {
    pub fn new() -> Self {
        Self {
            factories: BTreeMap::new(),
            rules: RuleSet::new(),
        }
    }

    pub fn family(&self) -> Family {
        N::FAMILY
    }

    /// Registers a primitive; names are unique within a registry.
    pub fn register(&mut self, name: &str, factory: Factory<N>) -> Result<(), EasysshError> {
        if self.factories.contains_key(name) {
            return Err(EasysshError::internal(format!(
                "{} '{name}' is registered twice",
                N::FAMILY
            )));
        }
        self.factories.insert(name.to_string(), factory);
        Ok(())
    }

    pub fn add_rule(&mut self, rule: RewriteRule) -> &mut Self {
        self.rules.push(rule);
        self
    }

    pub fn get(&self, name: &str) -> Option<Factory<N>> {
        self.factories.get(name).copied()
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Sorted, de-duplicated primitive and alias names.
    pub fn supported_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .factories
            .keys()
            .cloned()
            .chain(self.rules.trigger_names())
            .collect();
        names.sort();
        names.dedup();
        names
    }
}

impl<N: Node> Default for NodeRegistry<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// The three registries one pipeline needs.
pub struct Registries {
    pub discoverers: NodeRegistry<Discoverer>,
    pub filters: NodeRegistry<Filter>,
    pub executors: NodeRegistry<Executor>,
}

impl Registries {
    /// Builds every built-in primitive and alias.
    pub fn build() -> Result<Self, EasysshError> {
        Ok(Self {
            discoverers: discoverers::registry()?,
            filters: filters::registry()?,
            executors: executors::registry()?,
        })
    }
}
