/// Guides how a call tree is reconstructed from a trace.
///
/// Use [`TraceTreeConfig::default`] for the common case (events recorded, internal calls left
/// unreconstructed).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TraceTreeConfig {
    /// Whether to reconstruct JUMP/JUMPI-based internal (intra-contract) call frames.
    ///
    /// This is always rejected with [`crate::Error::UnsupportedFeature`] today — internal call
    /// reconstruction is an open question upstream (see the crate-level design notes) and no
    /// attempt is made to guess at a semantics for it.
    pub show_internal: bool,
    /// Whether to collect LOG0–LOG4 records into each node's `events` as they are emitted.
    ///
    /// Disabling this skips event collection entirely; it has no effect on call nesting or gas
    /// accounting.
    pub record_events: bool,
}

impl Default for TraceTreeConfig {
    fn default() -> Self {
        Self { show_internal: false, record_events: true }
    }
}

impl TraceTreeConfig {
    /// Returns a config with every gatherable piece of data enabled.
    pub const fn all() -> Self {
        Self { show_internal: false, record_events: true }
    }

    /// Returns a config that reconstructs only the call skeleton, with no events.
    pub const fn calls_only() -> Self {
        Self { show_internal: false, record_events: false }
    }
}
