// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Probe Registry
 * Named probe factories grouped by category, kept in registration order
 * © 2026 Bountyy Oy
 */

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use crate::errors::RegistryError;
use crate::probes::{self, Probe, ProbeContext};
use crate::types::{ProbeCategory, Severity};

pub type ProbeFactory = Arc<dyn Fn(ProbeContext) -> Box<dyn Probe> + Send + Sync>;

/// Registered probe: metadata plus the constructor that binds it to a target
#[derive(Clone)]
pub struct ProbeDescriptor {
    pub name: String,
    pub display_name: String,
    pub category: ProbeCategory,
    pub description: String,
    pub default_severity: Severity,
    pub factory: ProbeFactory,
}

impl ProbeDescriptor {
    pub fn new<F>(
        name: &str,
        display_name: &str,
        category: ProbeCategory,
        description: &str,
        default_severity: Severity,
        factory: F,
    ) -> Self
    where
        F: Fn(ProbeContext) -> Box<dyn Probe> + Send + Sync + 'static,
    {
        Self {
            name: name.to_string(),
            display_name: display_name.to_string(),
            category,
            description: description.to_string(),
            default_severity,
            factory: Arc::new(factory),
        }
    }

    pub fn instantiate(&self, ctx: ProbeContext) -> Box<dyn Probe> {
        (self.factory)(ctx)
    }

    pub fn info(&self) -> ProbeInfo {
        ProbeInfo {
            name: self.name.clone(),
            display_name: self.display_name.clone(),
            category: self.category.clone(),
            description: self.description.clone(),
            default_severity: self.default_severity,
        }
    }
}

impl fmt::Debug for ProbeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProbeDescriptor")
            .field("name", &self.name)
            .field("category", &self.category)
            .field("default_severity", &self.default_severity)
            .finish_non_exhaustive()
    }
}

/// Serializable descriptor metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeInfo {
    pub name: String,
    pub display_name: String,
    pub category: ProbeCategory,
    pub description: String,
    pub default_severity: Severity,
}

/// Ordered name -> descriptor mapping. Owned, so callers may mutate freely.
#[derive(Debug, Clone, Default)]
pub struct ProbeSet {
    entries: Vec<ProbeDescriptor>,
    index: HashMap<String, usize>,
}

impl ProbeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert at the end; returns false if the name is already present
    pub fn insert(&mut self, descriptor: ProbeDescriptor) -> bool {
        if self.index.contains_key(&descriptor.name) {
            return false;
        }
        self.index
            .insert(descriptor.name.clone(), self.entries.len());
        self.entries.push(descriptor);
        true
    }

    pub fn get(&self, name: &str) -> Option<&ProbeDescriptor> {
        self.index.get(name).map(|&i| &self.entries[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProbeDescriptor> {
        self.entries.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|d| d.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn infos(&self) -> Vec<ProbeInfo> {
        self.entries.iter().map(|d| d.info()).collect()
    }
}

impl PartialEq for ProbeSet {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .entries
                .iter()
                .zip(other.entries.iter())
                .all(|(a, b)| a.info() == b.info() && Arc::ptr_eq(&a.factory, &b.factory))
    }
}

impl IntoIterator for ProbeSet {
    type Item = ProbeDescriptor;
    type IntoIter = std::vec::IntoIter<ProbeDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Probe Registry. Populated at startup, read-only afterwards.
#[derive(Debug, Default)]
pub struct ProbeRegistry {
    probes: ProbeSet,
}

impl ProbeRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every built-in probe
    pub fn with_builtin_probes() -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        for descriptor in probes::builtin_descriptors() {
            registry.register(descriptor)?;
        }
        debug!("Registered {} built-in probes", registry.len());
        Ok(registry)
    }

    pub fn register(&mut self, descriptor: ProbeDescriptor) -> Result<(), RegistryError> {
        let name = descriptor.name.clone();
        if !self.probes.insert(descriptor) {
            return Err(RegistryError::DuplicateName { name });
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&ProbeDescriptor> {
        self.probes.get(name)
    }

    pub fn get_by_category(&self, category: &ProbeCategory) -> ProbeSet {
        let mut set = ProbeSet::new();
        for descriptor in self.probes.iter().filter(|d| &d.category == category) {
            set.insert(descriptor.clone());
        }
        set
    }

    pub fn all(&self) -> ProbeSet {
        self.probes.clone()
    }

    /// Distinct categories in first-registration order
    pub fn categories(&self) -> Vec<ProbeCategory> {
        let mut categories: Vec<ProbeCategory> = Vec::new();
        for descriptor in self.probes.iter() {
            if !categories.contains(&descriptor.category) {
                categories.push(descriptor.category.clone());
            }
        }
        categories
    }

    pub fn len(&self) -> usize {
        self.probes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.probes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ProbeResult;
    use crate::types::Finding;

    struct NoopProbe {
        name: String,
    }

    #[async_trait::async_trait]
    impl Probe for NoopProbe {
        fn name(&self) -> &str {
            &self.name
        }

        async fn execute(&self) -> ProbeResult<Vec<Finding>> {
            Ok(Vec::new())
        }
    }

    fn noop(name: &str, category: ProbeCategory) -> ProbeDescriptor {
        let owned = name.to_string();
        ProbeDescriptor::new(name, name, category, "noop", Severity::Low, move |_ctx| {
            Box::new(NoopProbe {
                name: owned.clone(),
            })
        })
    }

    #[test]
    fn test_register_and_lookup() {
        let mut registry = ProbeRegistry::new();
        registry.register(noop("a", ProbeCategory::Owasp)).unwrap();
        registry.register(noop("b", ProbeCategory::LlmAi)).unwrap();

        assert_eq!(registry.len(), 2);
        assert!(registry.get("a").is_some());
        assert!(registry.get("missing").is_none());
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let mut registry = ProbeRegistry::new();
        registry.register(noop("a", ProbeCategory::Owasp)).unwrap();
        let err = registry.register(noop("a", ProbeCategory::LlmAi)).unwrap_err();
        assert_eq!(err, RegistryError::DuplicateName { name: "a".into() });
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_category_view_keeps_order() {
        let mut registry = ProbeRegistry::new();
        registry.register(noop("z", ProbeCategory::Owasp)).unwrap();
        registry.register(noop("m", ProbeCategory::Infrastructure)).unwrap();
        registry.register(noop("a", ProbeCategory::Owasp)).unwrap();

        let owasp = registry.get_by_category(&ProbeCategory::Owasp);
        assert_eq!(owasp.names(), vec!["z", "a"]);
        assert!(registry
            .get_by_category(&ProbeCategory::Custom("none".into()))
            .is_empty());
        assert_eq!(
            registry.categories(),
            vec![ProbeCategory::Owasp, ProbeCategory::Infrastructure]
        );
    }

    #[test]
    fn test_all_is_a_detached_copy() {
        let mut registry = ProbeRegistry::new();
        registry.register(noop("a", ProbeCategory::Owasp)).unwrap();

        let first = registry.all();
        let mut second = registry.all();
        assert_eq!(first, second);

        second.insert(noop("b", ProbeCategory::Owasp));
        assert_eq!(second.len(), 2);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.all(), first);
    }

    #[test]
    fn test_builtin_registry() {
        let registry = ProbeRegistry::with_builtin_probes().unwrap();
        assert_eq!(registry.len(), 19);
        assert_eq!(registry.get_by_category(&ProbeCategory::Owasp).len(), 10);
        assert_eq!(registry.get_by_category(&ProbeCategory::LlmAi).len(), 5);
        assert_eq!(registry.get_by_category(&ProbeCategory::Infrastructure).len(), 4);
        assert!(registry.get("owasp_sql_injection").is_some());
    }
}
