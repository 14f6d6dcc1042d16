use std::collections::BTreeMap;

use crate::resolvers::{AnnotationResolver, DependencyStructureResolver, PropertyListResolver};

use super::{BoundResolver, error::ResolverError};

pub type ResolverFactory = fn() -> BoundResolver;

/// Maps the `type` of a resolver binding to a constructor.
pub struct ResolverRegistry {
    factories: BTreeMap<String, ResolverFactory>,
}

impl ResolverRegistry {
    /// A registry without any resolver types.
    pub fn empty() -> Self {
        Self {
            factories: BTreeMap::new(),
        }
    }

    /// A registry with `annotation`, `property-list` and `dependency`.
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        registry.register(AnnotationResolver::TYPE, || {
            BoundResolver::Simple(Box::new(AnnotationResolver::new()))
        });
        registry.register(PropertyListResolver::TYPE, || {
            BoundResolver::Simple(Box::new(PropertyListResolver::new()))
        });
        registry.register(DependencyStructureResolver::TYPE, || {
            BoundResolver::Batch(Box::new(DependencyStructureResolver::new()))
        });
        registry
    }

    pub fn register(&mut self, kind: impl Into<String>, factory: ResolverFactory) {
        self.factories.insert(kind.into(), factory);
    }

    pub fn create(&self, kind: &str) -> Result<BoundResolver, ResolverError> {
        self.factories
            .get(kind)
            .map(|factory| factory())
            .ok_or_else(|| ResolverError::UnknownResolver(kind.to_string()))
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.factories.contains_key(kind)
    }
}

impl Default for ResolverRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_have_fixed_capabilities() {
        let registry = ResolverRegistry::default();
        assert!(!registry.create("annotation").unwrap().is_batch());
        assert!(!registry.create("property-list").unwrap().is_batch());
        assert!(registry.create("dependency").unwrap().is_batch());
    }

    #[test]
    fn unknown_type_is_a_configuration_error() {
        let err = ResolverRegistry::empty().create("annotation").err().unwrap();
        assert!(matches!(err, ResolverError::UnknownResolver(ref t) if t == "annotation"));
        assert_eq!(err.kind(), crate::resolver::ErrorKind::Configuration);
    }
}
