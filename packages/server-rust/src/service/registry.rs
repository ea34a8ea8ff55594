use std::collections::{BTreeMap, BTreeSet};

use steprpc_core::{ExecutionMode, OperationDefinition};

/// Description given to allow-listed names the catalog could not find.
pub const NOT_DISCOVERED_DESCRIPTION: &str = "Allowlisted operation not discovered on this controller";

/// Invocation policy over the discovered catalog.
///
/// An empty allow-list places no restriction.
#[derive(Debug, Clone, Default)]
pub struct OperationRegistry {
    allowlist: BTreeSet<String>,
}

impl OperationRegistry {
    #[must_use]
    pub fn new(allowlist: BTreeSet<String>) -> Self {
        Self { allowlist }
    }

    #[must_use]
    pub fn allowlist(&self) -> &BTreeSet<String> {
        &self.allowlist
    }

    #[must_use]
    pub fn is_allowed(&self, operation: &str) -> bool {
        self.allowlist.is_empty() || self.allowlist.contains(operation)
    }

    /// Applies the allow-list to a discovered catalog.
    ///
    /// With an allow-list, the result has exactly one entry per allowed name.
    /// A name missing from `discovered` is passed to `resolve` (which knows
    /// direct aliases) and otherwise gets a placeholder tagged
    /// `BridgeRequired`, since it cannot be verified locally.
    #[must_use]
    pub fn catalog<F>(&self, discovered: Vec<OperationDefinition>, resolve: F) -> Vec<OperationDefinition>
    where
        F: Fn(&str) -> Option<OperationDefinition>,
    {
        if self.allowlist.is_empty() {
            let mut sorted = discovered;
            sorted.sort_by(|a, b| a.name.cmp(&b.name));
            return sorted;
        }

        let mut by_name: BTreeMap<String, OperationDefinition> = BTreeMap::new();
        for def in discovered {
            by_name.entry(def.name.clone()).or_insert(def);
        }
        self.allowlist
            .iter()
            .map(|name| {
                by_name.remove(name).or_else(|| resolve(name)).unwrap_or_else(|| {
                    OperationDefinition::new(
                        name.clone(),
                        NOT_DISCOVERED_DESCRIPTION,
                        ExecutionMode::BridgeRequired,
                    )
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn allow(names: &[&str]) -> OperationRegistry {
        OperationRegistry::new(names.iter().map(|n| (*n).to_string()).collect())
    }

    fn unresolved(_: &str) -> Option<OperationDefinition> {
        None
    }

    fn discovered() -> Vec<OperationDefinition> {
        vec![
            OperationDefinition::new("junit", "JUnit", ExecutionMode::BridgeRequired),
            OperationDefinition::new("archiveArtifacts", "Archive", ExecutionMode::Direct),
        ]
    }

    #[test]
    fn empty_allowlist_allows_everything() {
        let registry = OperationRegistry::default();
        assert!(registry.is_allowed("anything"));
    }

    #[test]
    fn allowlist_is_strict_membership() {
        let registry = allow(&["archiveArtifacts"]);
        assert!(registry.is_allowed("archiveArtifacts"));
        assert!(!registry.is_allowed("junit"));
        assert!(!registry.is_allowed("archiveartifacts"));
    }

    #[test]
    fn empty_allowlist_catalog_is_sorted_discovery() {
        let names: Vec<_> = OperationRegistry::default()
            .catalog(discovered(), unresolved)
            .into_iter()
            .map(|d| d.name)
            .collect();
        assert_eq!(names, vec!["archiveArtifacts", "junit"]);
    }

    #[test]
    fn allowlist_filters_catalog() {
        let catalog = allow(&["archiveArtifacts"]).catalog(discovered(), unresolved);
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog[0].name, "archiveArtifacts");
        assert_eq!(catalog[0].execution_mode, ExecutionMode::Direct);
    }

    #[test]
    fn undiscovered_allowlisted_name_gets_placeholder() {
        let catalog = allow(&["missingOp"]).catalog(Vec::new(), unresolved);
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog[0].name, "missingOp");
        assert_eq!(catalog[0].execution_mode, ExecutionMode::BridgeRequired);
        assert!(catalog[0].description.contains("not discovered"));
    }

    #[test]
    fn resolvable_alias_is_not_a_placeholder() {
        let catalog = allow(&["ArtifactArchiver"]).catalog(discovered(), |name| {
            (name == "ArtifactArchiver").then(|| {
                OperationDefinition::new(name, "Archive (direct)", ExecutionMode::Direct)
            })
        });
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog[0].name, "ArtifactArchiver");
        assert_eq!(catalog[0].execution_mode, ExecutionMode::Direct);
        assert_eq!(catalog[0].description, "Archive (direct)");
    }

    #[test]
    fn allowlisted_catalog_is_name_sorted() {
        let catalog = allow(&["zeta", "junit", "alpha"]).catalog(discovered(), unresolved);
        let names: Vec<_> = catalog.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["alpha", "junit", "zeta"]);
        assert_eq!(catalog[1].execution_mode, ExecutionMode::BridgeRequired);
        assert_eq!(catalog[1].description, "JUnit");
    }
}
