//! The per-opcode struct-log frame, as emitted by `debug_traceTransaction`'s default tracer.

use crate::tracing::primitives::{parse_word, NumberOrHex};
use alloy_primitives::{Address, B256};
use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;

/// One step of a Geth struct-log trace.
///
/// Decoded from the `debug_traceTransaction` default-tracer response shape: `pc`, `gas`,
/// `gasCost` and `depth` each accept either a native JSON number or a hex string, and `stack`/
/// `memory` entries are hex words that may omit leading zeros.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TraceFrame {
    /// Program counter.
    pub pc: u64,
    /// Opcode mnemonic, e.g. `"CALL"`.
    pub op: String,
    /// Remaining gas before this opcode executes.
    pub gas: u64,
    /// Gas cost of this opcode.
    pub gas_cost: u64,
    /// Call-stack depth this frame executed at; the outermost transaction frame is `0`.
    pub depth: u64,
    /// Execution stack, top of stack last.
    pub stack: Vec<B256>,
    /// Linear execution memory, one 32-byte word per entry.
    pub memory: Vec<B256>,
    /// Contract storage slots touched by this step. Ignored by the call-tree builder.
    pub storage: BTreeMap<B256, B256>,
    /// The deployed contract address for a `CREATE`/`CREATE2` frame.
    ///
    /// Populated by [`crate::tracing::preprocess::resolve_create_addresses`] via look-ahead;
    /// unset (and left as the all-zero placeholder downstream) if the trace ends before the
    /// enclosing depth is re-entered.
    pub contract_address: Option<Address>,
}

impl TraceFrame {
    /// Returns the top-of-stack item as an address (its 20-byte suffix), if the stack is
    /// non-empty.
    pub fn top_as_address(&self) -> Option<Address> {
        self.stack.last().map(|word| crate::tracing::primitives::address_from_word(word))
    }

    /// Returns the `n`th stack item counting from the top, 1-indexed (`n = 1` is top-of-stack).
    ///
    /// Mirrors the `stack[-n]` indexing the opcode layouts in the dispatch table are written
    /// against. Returns `None` if the stack has fewer than `n` items.
    pub fn nth_from_top(&self, n: usize) -> Option<&B256> {
        let len = self.stack.len();
        if n == 0 || n > len {
            return None;
        }
        Some(&self.stack[len - n])
    }
}

#[derive(Deserialize)]
struct RawFrame {
    pc: NumberOrHex,
    op: String,
    gas: NumberOrHex,
    #[serde(rename = "gasCost")]
    gas_cost: NumberOrHex,
    depth: NumberOrHex,
    #[serde(default)]
    stack: Vec<String>,
    #[serde(default)]
    memory: Option<Vec<String>>,
    #[serde(default)]
    storage: Option<BTreeMap<String, String>>,
}

impl<'de> Deserialize<'de> for TraceFrame {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::Error as _;

        let raw = RawFrame::deserialize(deserializer)?;
        let stack = raw
            .stack
            .iter()
            .map(|w| parse_word("stack", w))
            .collect::<Result<Vec<_>, _>>()
            .map_err(D::Error::custom)?;
        let memory = raw
            .memory
            .unwrap_or_default()
            .iter()
            .map(|w| parse_word("memory", w))
            .collect::<Result<Vec<_>, _>>()
            .map_err(D::Error::custom)?;
        let mut storage = BTreeMap::new();
        for (k, v) in raw.storage.unwrap_or_default() {
            let key = parse_word("storage.key", &k).map_err(D::Error::custom)?;
            let value = parse_word("storage.value", &v).map_err(D::Error::custom)?;
            storage.insert(key, value);
        }

        Ok(Self {
            pc: raw.pc.into_u64("pc").map_err(D::Error::custom)?,
            op: raw.op,
            gas: raw.gas.into_u64("gas").map_err(D::Error::custom)?,
            gas_cost: raw.gas_cost.into_u64("gasCost").map_err(D::Error::custom)?,
            depth: raw.depth.into_u64("depth").map_err(D::Error::custom)?,
            stack,
            memory,
            storage,
            contract_address: None,
        })
    }
}
