//! Strategy table of directly executable operations.
//!
//! Each registration pairs an operation name (plus optional aliases) with a
//! typed factory that validates the invocation args and builds a
//! [`DirectOperation`]. The implementation collaborator populates the table
//! at startup; it may keep registering while the server runs.

use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::RwLock;
use steprpc_core::{Args, ExecutionMode, OperationDefinition};

use crate::traits::DirectOperation;

/// Builds a ready-to-run operation from invocation args.
pub type OperationFactory =
    Arc<dyn Fn(&Args) -> anyhow::Result<Box<dyn DirectOperation>> + Send + Sync>;

// ---------------------------------------------------------------------------
// DirectRegistration
// ---------------------------------------------------------------------------

/// One directly executable operation.
#[derive(Clone)]
pub struct DirectRegistration {
    pub name: String,
    pub display_name: String,
    /// Extra names that resolve to this registration but are not listed.
    pub aliases: Vec<String>,
    factory: OperationFactory,
}

impl DirectRegistration {
    pub fn new<F>(name: impl Into<String>, display_name: impl Into<String>, factory: F) -> Self
    where
        F: Fn(&Args) -> anyhow::Result<Box<dyn DirectOperation>> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            display_name: display_name.into(),
            aliases: Vec::new(),
            factory: Arc::new(factory),
        }
    }

    #[must_use]
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    /// Validates `args` and builds the operation.
    ///
    /// # Errors
    ///
    /// Whatever the factory rejects the args with.
    pub fn instantiate(&self, args: &Args) -> anyhow::Result<Box<dyn DirectOperation>> {
        (self.factory)(args)
    }

    fn names(&self) -> impl Iterator<Item = &String> {
        std::iter::once(&self.name).chain(self.aliases.iter())
    }
}

impl std::fmt::Debug for DirectRegistration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectRegistration")
            .field("name", &self.name)
            .field("display_name", &self.display_name)
            .field("aliases", &self.aliases)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// DirectOperationTable
// ---------------------------------------------------------------------------

/// Name-keyed lookup of direct registrations.
///
/// The first registration to claim a name keeps it; later claims on the
/// same name are ignored.
#[derive(Default)]
pub struct DirectOperationTable {
    /// Primary names and aliases -> registration.
    by_name: DashMap<String, Arc<DirectRegistration>>,
    /// Registration order, for deterministic catalog output.
    order: RwLock<Vec<Arc<DirectRegistration>>>,
}

impl DirectOperationTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, registration: DirectRegistration) {
        let registration = Arc::new(registration);
        for name in registration.names() {
            if name.trim().is_empty() {
                continue;
            }
            self.by_name
                .entry(name.clone())
                .or_insert_with(|| Arc::clone(&registration));
        }
        self.order.write().push(registration);
    }

    /// Looks up a registration by primary name or alias.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<Arc<DirectRegistration>> {
        self.by_name.get(name).map(|entry| Arc::clone(entry.value()))
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Catalog entry for `name` when it is a primary name or an alias.
    #[must_use]
    pub fn definition_for(&self, name: &str) -> Option<OperationDefinition> {
        self.lookup(name).map(|reg| {
            OperationDefinition::new(
                name,
                format!("{} (direct)", reg.display_name),
                ExecutionMode::Direct,
            )
        })
    }

    /// Catalog entries for every primary name this table owns.
    #[must_use]
    pub fn definitions(&self) -> Vec<OperationDefinition> {
        self.order
            .read()
            .iter()
            .filter(|reg| {
                self.lookup(&reg.name)
                    .is_some_and(|owner| Arc::ptr_eq(&owner, reg))
            })
            .map(|reg| {
                OperationDefinition::new(
                    reg.name.clone(),
                    format!("{} (direct)", reg.display_name),
                    ExecutionMode::Direct,
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::traits::ResolvedContext;

    struct Noop;

    #[async_trait]
    impl DirectOperation for Noop {
        async fn perform(&self, _ctx: &ResolvedContext) -> anyhow::Result<()> {
            Ok(())
        }
    }

    fn noop(name: &str, display: &str) -> DirectRegistration {
        DirectRegistration::new(name, display, |_args: &Args| {
            Ok(Box::new(Noop) as Box<dyn DirectOperation>)
        })
    }

    #[test]
    fn lookup_by_name_and_alias() {
        let table = DirectOperationTable::new();
        table.register(noop("archiveArtifacts", "Archive the artifacts").with_alias("ArtifactArchiver"));

        assert_eq!(table.lookup("archiveArtifacts").unwrap().name, "archiveArtifacts");
        assert_eq!(table.lookup("ArtifactArchiver").unwrap().name, "archiveArtifacts");
        assert!(table.lookup("junit").is_none());
    }

    #[test]
    fn aliases_are_not_listed() {
        let table = DirectOperationTable::new();
        table.register(noop("archiveArtifacts", "Archive the artifacts").with_alias("ArtifactArchiver"));

        let defs = table.definitions();
        assert_eq!(defs.len(), 1);
        assert_eq!(defs[0].name, "archiveArtifacts");
        assert_eq!(defs[0].description, "Archive the artifacts (direct)");
        assert_eq!(defs[0].execution_mode, ExecutionMode::Direct);
    }

    #[test]
    fn definition_for_alias_keeps_the_alias_name() {
        let table = DirectOperationTable::new();
        table.register(noop("archiveArtifacts", "Archive the artifacts").with_alias("ArtifactArchiver"));

        let def = table.definition_for("ArtifactArchiver").unwrap();
        assert_eq!(def.name, "ArtifactArchiver");
        assert_eq!(def.description, "Archive the artifacts (direct)");
        assert_eq!(def.execution_mode, ExecutionMode::Direct);
        assert!(table.definition_for("junit").is_none());
    }

    #[test]
    fn first_claim_on_a_name_wins() {
        let table = DirectOperationTable::new();
        table.register(noop("junit", "First"));
        table.register(noop("junit", "Second"));

        assert_eq!(table.lookup("junit").unwrap().display_name, "First");
        let defs = table.definitions();
        assert_eq!(defs.len(), 1);
        assert_eq!(defs[0].description, "First (direct)");
    }

    #[test]
    fn blank_names_are_skipped() {
        let table = DirectOperationTable::new();
        table.register(noop("junit", "JUnit").with_alias("  "));
        assert!(!table.contains("  "));
        assert!(table.contains("junit"));
    }

    #[test]
    fn factory_validates_args() {
        let reg = DirectRegistration::new("sh", "Shell", |args: &Args| {
            if args.contains_key("script") {
                Ok(Box::new(Noop) as Box<dyn DirectOperation>)
            } else {
                Err(anyhow::anyhow!("script is required"))
            }
        });
        let err = reg.instantiate(&Args::new()).err().unwrap();
        assert_eq!(err.to_string(), "script is required");
    }
}
