use std::collections::BTreeSet;

/// Invocation policy and run id generation settings.
#[derive(Debug, Clone)]
pub struct StepRpcConfig {
    /// Operation names that may be invoked. Empty means no restriction.
    pub allowlist: BTreeSet<String>,
    /// Prefix of every generated run id.
    pub run_id_prefix: String,
    /// Number of random hex characters after the prefix (capped at 32).
    pub run_id_suffix_len: usize,
}

impl Default for StepRpcConfig {
    fn default() -> Self {
        Self {
            allowlist: BTreeSet::new(),
            run_id_prefix: "rpc-".to_string(),
            run_id_suffix_len: 12,
        }
    }
}
