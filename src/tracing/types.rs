//! The result tree: [`CallTreeNode`], [`EventNode`] and the [`CallKind`] tag shared by both.

use alloy_primitives::{Address, Bytes, B256, U256};
use std::fmt;

/// The kind of a call tree node.
///
/// Equality and hashing are derived, and therefore by value; [`CallKind::to_str`] gives the
/// canonical string used in serialized output and in `Display`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum CallKind {
    /// A regular message call.
    #[default]
    Call,
    /// A `CALLCODE` — runs the callee's code in the caller's context.
    CallCode,
    /// A `DELEGATECALL` — runs the callee's code in the caller's context, preserving `msg.sender`
    /// and `msg.value`.
    DelegateCall,
    /// A `STATICCALL` — a call that may not modify state.
    StaticCall,
    /// A `CREATE`.
    Create,
    /// A `CREATE2`.
    Create2,
    /// A `SELFDESTRUCT`, surfaced as its own node by the Parity front-end.
    SelfDestruct,
    /// A reconstructed intra-contract (JUMP/JUMPI) call.
    ///
    /// Reserved: never produced by the struct-log builder today, see
    /// [`crate::tracing::config::TraceTreeConfig::show_internal`].
    Internal,
    /// An emitted event. Only ever appears on an [`EventNode`], never a [`CallTreeNode`].
    Event,
}

impl CallKind {
    /// Returns the canonical upper-case string for this call kind.
    pub const fn to_str(self) -> &'static str {
        match self {
            Self::Call => "CALL",
            Self::CallCode => "CALLCODE",
            Self::DelegateCall => "DELEGATECALL",
            Self::StaticCall => "STATICCALL",
            Self::Create => "CREATE",
            Self::Create2 => "CREATE2",
            Self::SelfDestruct => "SELFDESTRUCT",
            Self::Internal => "INTERNAL",
            Self::Event => "EVENT",
        }
    }

    /// Returns `true` if this is [`CallKind::Create`] or [`CallKind::Create2`].
    pub const fn is_any_create(&self) -> bool {
        matches!(self, Self::Create | Self::Create2)
    }

    /// Returns `true` if this call runs in the caller's context (`CALLCODE`/`DELEGATECALL`).
    pub const fn is_delegate(&self) -> bool {
        matches!(self, Self::DelegateCall | Self::CallCode)
    }
}

impl fmt::Display for CallKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_str())
    }
}

/// A single emitted `LOG0`..`LOG4` record, attached to the node open when it fired.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventNode {
    /// Always [`CallKind::Event`]; kept as a field (rather than implied by the type) so the node
    /// can be serialized alongside [`CallTreeNode`] under a single tagged `call_type` key.
    pub call_type: CallKind,
    /// The depth of the call that emitted this event.
    pub depth: u64,
    /// Indexed topics, 1 to 5 of them. `topics[0]` is the event selector.
    pub topics: Vec<B256>,
    /// The non-indexed event data.
    pub data: Bytes,
}

impl EventNode {
    /// The event selector, i.e. `topics[0]`.
    ///
    /// # Panics
    ///
    /// Panics if `topics` is empty. A `LOG0`..`LOG4` frame always carries at least one topic by
    /// construction; this only matters for values built by hand (e.g. in tests).
    pub fn selector(&self) -> B256 {
        self.topics[0]
    }
}

/// One call (or create, or selfdestruct) in a reconstructed call tree.
///
/// Built bottom-up by the call-tree builder and immutable once returned: every field is set by
/// the time the node's terminating frame is observed, with the sole exception of `calls` and
/// `events`, which are appended to while the node is still open.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallTreeNode {
    /// The kind of call this node represents.
    pub call_type: CallKind,
    /// The callee (or, for `CREATE`/`CREATE2`, the deployed contract). All-zero while a
    /// `CREATE`/`CREATE2` address is still pending resolution.
    pub address: Address,
    /// Value transferred with the call. Always zero for `DELEGATECALL`/`STATICCALL`, which carry
    /// no value of their own.
    pub value: U256,
    /// Call-stack depth; the outermost node is `0`.
    pub depth: u64,
    /// Gas forwarded to the call, if known.
    pub gas_limit: Option<u64>,
    /// Gas consumed by the call, if known.
    ///
    /// Never populated by the struct-log builder: a struct-log frame's `gas_cost` is the cost of
    /// a single opcode, not a call's total gas, so per-call gas is left unset from that front-end.
    pub gas_cost: Option<u64>,
    /// Input to the call, or the init code for `CREATE`/`CREATE2`.
    pub calldata: Bytes,
    /// Output of the call. Empty on `STOP`/`SELFDESTRUCT`.
    pub returndata: Bytes,
    /// Child calls, in execution order.
    pub calls: Vec<CallTreeNode>,
    /// Events emitted directly by this node, in emission order.
    pub events: Vec<EventNode>,
    /// Set on an explicit `SELFDESTRUCT`. Never implied by a `STOP` that merely follows one.
    pub selfdestruct: bool,
    /// `true` if the node terminated in `REVERT`, an invalid opcode, or a propagated
    /// out-of-gas halt.
    pub failed: bool,
}

impl CallTreeNode {
    /// Returns a node opened for the given call kind at the given depth, with every other field
    /// at its default (zero value, empty bytes, no children).
    pub fn new(call_type: CallKind, depth: u64) -> Self {
        Self {
            call_type,
            address: Address::ZERO,
            value: U256::ZERO,
            depth,
            gas_limit: None,
            gas_cost: None,
            calldata: Bytes::new(),
            returndata: Bytes::new(),
            calls: Vec::new(),
            events: Vec::new(),
            selfdestruct: false,
            failed: false,
        }
    }

    /// Returns `true` if this node, or any of its descendants, selfdestructed.
    pub fn any_selfdestruct(&self) -> bool {
        self.selfdestruct || self.calls.iter().any(Self::any_selfdestruct)
    }

    /// Returns the checksummed (EIP-55) hex rendering of `address`.
    pub fn address_checksum(&self) -> String {
        self.address.to_checksum(None)
    }
}
