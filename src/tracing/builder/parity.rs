//! Assembles a call tree from a flat Parity/OpenEthereum `trace_address`-addressed trace list.
//!
//! Deliberately a straightforward prefix-join, not a state machine: every record already carries
//! its exact position in the tree, so there is nothing to infer from opcode sequencing the way
//! the struct-log builder has to.

use crate::{
    error::{Error, Result},
    tracing::types::{CallKind, CallTreeNode},
};
use alloy_rpc_types_trace::parity::{Action, CallType, CreationMethod, TraceOutput, TransactionTrace};

/// Builds a [`CallTreeNode`] from a flat list of Parity trace records.
///
/// `traces` need not be pre-sorted; the single record with an empty `trace_address` is the root,
/// and every other record is attached to the parent whose `trace_address` is its own prefix of
/// length `len - 1`.
///
/// Returns [`Error::MissingField`] if no record has an empty `trace_address`.
pub fn calltree_from_parity_trace(traces: &[TransactionTrace]) -> Result<CallTreeNode> {
    let root = traces
        .iter()
        .find(|trace| trace.trace_address.is_empty())
        .ok_or(Error::MissingField("trace_address"))?;
    Ok(build_node(traces, root))
}

fn build_node(traces: &[TransactionTrace], trace: &TransactionTrace) -> CallTreeNode {
    let mut node = node_from_trace(trace);

    let mut children: Vec<&TransactionTrace> = traces
        .iter()
        .filter(|candidate| {
            candidate.trace_address.len() == trace.trace_address.len() + 1
                && candidate.trace_address.starts_with(&trace.trace_address)
        })
        .filter(|candidate| {
            if matches!(candidate.action, Action::Reward(_)) {
                tracing::warn!(
                    trace_address = ?candidate.trace_address,
                    "ignoring block/uncle reward action"
                );
                false
            } else {
                true
            }
        })
        .collect();
    // `trace_address`'s last entry is the child's position among its siblings.
    children.sort_by_key(|candidate| *candidate.trace_address.last().expect("checked len above"));

    node.calls = children.into_iter().map(|child| build_node(traces, child)).collect();
    node
}

fn node_from_trace(trace: &TransactionTrace) -> CallTreeNode {
    let depth = trace.trace_address.len() as u64;
    let failed = trace.error.is_some();

    let mut node = match &trace.action {
        Action::Call(call) => {
            let mut node = CallTreeNode::new(call_kind_from_parity(call.call_type), depth);
            node.address = call.to;
            node.value = call.value;
            node.gas_limit = Some(call.gas);
            node.calldata = call.input.clone();
            if let Some(TraceOutput::Call(output)) = &trace.result {
                node.gas_cost = Some(output.gas_used);
                node.returndata = output.output.clone();
            }
            node
        }
        Action::Create(create) => {
            let call_type = match create.creation_method {
                CreationMethod::Create2 => CallKind::Create2,
                _ => CallKind::Create,
            };
            let mut node = CallTreeNode::new(call_type, depth);
            node.value = create.value;
            node.gas_limit = Some(create.gas);
            node.calldata = create.init.clone();
            if let Some(TraceOutput::Create(output)) = &trace.result {
                node.gas_cost = Some(output.gas_used);
                node.address = output.address;
                node.returndata = output.code.clone();
            }
            node
        }
        Action::Selfdestruct(selfdestruct) => {
            let mut node = CallTreeNode::new(CallKind::SelfDestruct, depth);
            node.address = selfdestruct.address;
            node.value = selfdestruct.balance;
            node.selfdestruct = true;
            node
        }
        // Filtered out of `children` in `build_node` before recursing; reachable here only if a
        // reward action were somehow the root itself, which real traces never produce.
        Action::Reward(_) => CallTreeNode::new(CallKind::Internal, depth),
    };
    node.failed = failed;
    node
}

fn call_kind_from_parity(call_type: CallType) -> CallKind {
    match call_type {
        CallType::Call => CallKind::Call,
        CallType::CallCode => CallKind::CallCode,
        CallType::DelegateCall => CallKind::DelegateCall,
        CallType::StaticCall => CallKind::StaticCall,
        // `AuthCall` and `None` have no struct-log equivalent in this core's `CallKind`; treat
        // as a regular call rather than invent a variant nothing else produces.
        _ => CallKind::Call,
    }
}
