//! Replays a Parity `trace_replayTransaction` `vmTrace` into a synthetic struct-log stream.
//!
//! `vmTrace` already carries almost everything a struct-log frame does, just shaped as a nested
//! tree of operations with push/pop deltas instead of full stack/memory snapshots. Rather than
//! teach the builder a second state machine, this module reconstructs the snapshots a struct-log
//! trace would have carried and feeds them through [`super::struct_log`], so there is still only
//! one place call-tree assembly actually happens.

use crate::{
    error::Result,
    tracing::{
        builder::struct_log::{calltree_from_struct_log, RootCall},
        config::TraceTreeConfig,
        frame::TraceFrame,
        primitives::word_from_bytes,
        types::CallTreeNode,
    },
};
use alloy_primitives::{Bytes, B256, U256};
use serde::Deserialize;
use std::collections::BTreeMap;

/// A Parity `vmTrace` call frame: the code executed and the linear sequence of operations run
/// against it, some of which open a nested `vmTrace` of their own.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct VmTrace {
    /// The code being executed in this call frame.
    pub code: Bytes,
    /// The operations executed, in order.
    pub ops: Vec<VmOperation>,
}

/// One executed instruction within a [`VmTrace`].
#[derive(Clone, Debug, Default, Deserialize)]
pub struct VmOperation {
    /// Program counter.
    pub pc: u64,
    /// Gas cost of this instruction.
    pub cost: u64,
    /// Execution effects, absent if the instruction was never reached (e.g. trace cut short).
    pub ex: Option<VmExecutedOperation>,
    /// The nested trace of the call/create this instruction opened, if any.
    pub sub: Option<Box<VmTrace>>,
    /// Opcode mnemonic.
    pub op: String,
}

/// The effects of executing a [`VmOperation`].
#[derive(Clone, Debug, Default, Deserialize)]
pub struct VmExecutedOperation {
    /// Remaining gas after this instruction.
    pub used: u64,
    /// Stack items pushed by this instruction, bottom first.
    #[serde(default)]
    pub push: Vec<Bytes>,
    /// The memory delta this instruction caused, if any.
    pub mem: Option<MemoryDiff>,
    /// The storage write this instruction caused, if any.
    pub store: Option<StorageDiff>,
}

/// A memory write: `data` replaces the bytes starting at `off`.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct MemoryDiff {
    /// Byte offset into memory the change begins at.
    pub off: usize,
    /// The bytes written.
    pub data: Bytes,
}

/// A storage write: `val` replaces whatever was at `key`.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct StorageDiff {
    /// The storage slot written.
    pub key: U256,
    /// The new value.
    pub val: U256,
}

/// Opcodes grouped by how many stack items they pop, per the yellow paper.
const POP_OPCODES: &[(u64, &[&str])] = &[
    (
        1,
        &[
            "EXTCODEHASH", "ISZERO", "NOT", "BALANCE", "CALLDATALOAD", "EXTCODESIZE", "BLOCKHASH",
            "POP", "MLOAD", "SLOAD", "JUMP", "SELFDESTRUCT",
        ],
    ),
    (
        2,
        &[
            "SHL", "SHR", "SAR", "REVERT", "ADD", "MUL", "SUB", "DIV", "SDIV", "MOD", "SMOD",
            "EXP", "SIGNEXTEND", "LT", "GT", "SLT", "SGT", "EQ", "AND", "XOR", "OR", "BYTE",
            "SHA3", "KECCAK256", "MSTORE", "MSTORE8", "SSTORE", "JUMPI", "RETURN",
        ],
    ),
    (3, &["RETURNDATACOPY", "ADDMOD", "MULMOD", "CALLDATACOPY", "CODECOPY", "CREATE"]),
    (4, &["CREATE2", "EXTCODECOPY"]),
    (6, &["STATICCALL", "DELEGATECALL"]),
    (7, &["CALL", "CALLCODE"]),
];

/// Number of stack items `op` pops, or `0` if it pops none (or is unrecognised).
fn pop_count(op: &str) -> usize {
    for (n, opcodes) in POP_OPCODES {
        if opcodes.contains(&op) {
            return *n as usize;
        }
    }
    if let Some(n) = op.strip_prefix("LOG").and_then(|s| s.parse::<usize>().ok()) {
        return n + 2;
    }
    if let Some(i) = op.strip_prefix("SWAP").and_then(|s| s.parse::<usize>().ok()) {
        return i + 1;
    }
    if let Some(i) = op.strip_prefix("DUP").and_then(|s| s.parse::<usize>().ok()) {
        return i;
    }
    0
}

/// Replays a `vmTrace` into the synthetic [`TraceFrame`] stream a struct-log tracer would have
/// produced for the same execution.
///
/// Each call/create's stack, memory and storage are independent of its caller's, mirroring real
/// EVM call-frame isolation: a nested `sub` trace starts from empty state, not from wherever its
/// parent left off.
pub fn replay(trace: &VmTrace) -> Vec<TraceFrame> {
    let mut out = Vec::new();
    replay_into(trace, 1, &mut out);
    out
}

fn replay_into(trace: &VmTrace, depth: u64, out: &mut Vec<TraceFrame>) {
    let mut stack: Vec<B256> = Vec::new();
    let mut memory: Vec<u8> = Vec::new();
    let mut storage: BTreeMap<B256, B256> = BTreeMap::new();

    for op in &trace.ops {
        if let Some(exec) = &op.ex {
            if let Some(mem) = &exec.mem {
                memory_extend(&mut memory, mem.off, mem.data.len());
            }
        }

        // Geth convention: the frame is emitted after memory expansion but before the
        // instruction's other effects (stack pops/pushes, storage write) are applied.
        out.push(TraceFrame {
            pc: op.pc,
            op: op.op.clone(),
            gas: op.ex.as_ref().map(|e| e.used).unwrap_or(0),
            gas_cost: op.cost,
            depth,
            stack: stack.clone(),
            memory: words_from_bytes(&memory),
            storage: storage.clone(),
            // Left unresolved here, same as a real struct-log frame prior to preprocessing;
            // CREATE/CREATE2 look-ahead resolution (inline in the struct-log builder, or via
            // `preprocess::resolve_create_addresses`) populates it.
            contract_address: None,
        });

        if let Some(exec) = &op.ex {
            if let Some(mem) = &exec.mem {
                memory_write(&mut memory, mem.off, &mem.data);
            }

            let pops = pop_count(&op.op);
            let new_len = stack.len().saturating_sub(pops);
            stack.truncate(new_len);

            for item in &exec.push {
                stack.push(word_from_bytes(item));
            }
            // erigon omits the implicit push for a zero-valued PUSH0: github.com/ledgerwatch/erigon/pull/7970
            if op.op == "PUSH0" && exec.push.is_empty() {
                stack.push(B256::ZERO);
            }

            if let Some(store) = &exec.store {
                storage.insert(B256::from(store.key.to_be_bytes::<32>()), B256::from(store.val.to_be_bytes::<32>()));
            }
        }

        if let Some(sub) = &op.sub {
            replay_into(sub, depth + 1, out);
        }
    }
}

fn memory_extend(memory: &mut Vec<u8>, off: usize, len: usize) {
    let needed = off + len;
    if memory.len() < needed {
        memory.resize(needed, 0);
    }
}

fn memory_write(memory: &mut Vec<u8>, off: usize, data: &[u8]) {
    memory_extend(memory, off, data.len());
    memory[off..off + data.len()].copy_from_slice(data);
}

fn words_from_bytes(memory: &[u8]) -> Vec<B256> {
    memory
        .chunks(32)
        .map(|chunk| {
            let mut word = [0u8; 32];
            word[..chunk.len()].copy_from_slice(chunk);
            B256::from(word)
        })
        .collect()
}

/// Builds a [`CallTreeNode`] by replaying a `vmTrace` and feeding the result through the
/// struct-log builder.
pub fn calltree_from_vm_trace(
    trace: &VmTrace,
    config: TraceTreeConfig,
    root: RootCall,
) -> Result<CallTreeNode> {
    let frames = replay(trace);
    calltree_from_struct_log(frames, config, root)
}
