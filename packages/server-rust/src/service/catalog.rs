//! Operation discovery across the direct table and the interpreted-context engine.

use std::collections::BTreeMap;
use std::sync::Arc;

use steprpc_core::{ExecutionMode, OperationDefinition};
use tracing::warn;

use super::table::DirectOperationTable;
use crate::traits::InterpretedOperationSource;

/// Display name used when the interpreted engine reports none.
const DEFAULT_STEP_DISPLAY_NAME: &str = "Pipeline step";

/// Merged view of every operation the server can reach.
///
/// Nothing is cached: each call re-reads both sources.
pub struct OperationCatalog {
    direct: Arc<DirectOperationTable>,
    interpreted: Arc<dyn InterpretedOperationSource>,
}

impl OperationCatalog {
    #[must_use]
    pub fn new(
        direct: Arc<DirectOperationTable>,
        interpreted: Arc<dyn InterpretedOperationSource>,
    ) -> Self {
        Self {
            direct,
            interpreted,
        }
    }

    #[must_use]
    pub fn direct(&self) -> &DirectOperationTable {
        &self.direct
    }

    /// Lists every known operation, sorted by name.
    ///
    /// A name present in both sources is reported once as `Direct`.
    #[must_use]
    pub fn discover(&self) -> Vec<OperationDefinition> {
        let mut merged: BTreeMap<String, OperationDefinition> = self
            .direct
            .definitions()
            .into_iter()
            .map(|def| (def.name.clone(), def))
            .collect();

        for (name, display_name) in self.interpreted_steps() {
            if merged.contains_key(&name) {
                continue;
            }
            // An alias of a direct registration is still executed directly.
            let def = if self.direct.contains(&name) {
                OperationDefinition::new(
                    name.clone(),
                    format!("{display_name} (direct)"),
                    ExecutionMode::Direct,
                )
            } else {
                OperationDefinition::new(
                    name.clone(),
                    format!("{display_name} (interpreted context required)"),
                    ExecutionMode::BridgeRequired,
                )
            };
            merged.insert(name, def);
        }

        merged.into_values().collect()
    }

    /// Steps known to the interpreted engine, name -> display name.
    ///
    /// Enumeration failure degrades to an empty map.
    #[must_use]
    pub fn interpreted_steps(&self) -> BTreeMap<String, String> {
        let steps = match self.interpreted.list() {
            Ok(steps) => steps,
            Err(e) => {
                warn!(error = %e, "interpreted operation enumeration failed; treating as empty");
                return BTreeMap::new();
            }
        };

        let mut out = BTreeMap::new();
        for step in steps {
            if step.function_name.trim().is_empty() {
                continue;
            }
            out.entry(step.function_name).or_insert_with(|| {
                step.display_name
                    .filter(|d| !d.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_STEP_DISPLAY_NAME.to_string())
            });
        }
        out
    }
}
