//! Operation classification: decides which execution path a name takes.

use std::sync::Arc;

use super::catalog::OperationCatalog;
use super::table::DirectRegistration;

/// Execution path chosen for an operation name.
#[derive(Debug, Clone)]
pub enum Classification {
    /// Runs on the calling task through this registration.
    Direct(Arc<DirectRegistration>),
    /// Known only to the interpreted engine; must be bridged.
    BridgeRequired,
    /// Unknown to both sources.
    Unknown,
}

impl OperationCatalog {
    /// Classifies `operation`. The direct table always takes precedence.
    #[must_use]
    pub fn classify(&self, operation: &str) -> Classification {
        if let Some(registration) = self.direct().lookup(operation) {
            return Classification::Direct(registration);
        }
        if self.interpreted_steps().contains_key(operation) {
            return Classification::BridgeRequired;
        }
        Classification::Unknown
    }
}
