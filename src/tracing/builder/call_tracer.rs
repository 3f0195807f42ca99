//! Normalises an already-nested Geth call-tracer (`callTracer`) result into a call tree.
//!
//! Unlike the struct-log builder, this bypasses the state machine entirely: the input is already
//! a tree, just under different field names and without explicit depths, so construction is a
//! single recursive field-mapping pass.

use crate::tracing::types::{CallKind, CallTreeNode, EventNode};
use alloy_rpc_types_trace::geth::{CallFrame, CallLogFrame};

/// Builds a [`CallTreeNode`] from a `debug_traceTransaction` `callTracer` result.
///
/// Depths are not present on the input and are assigned by a top-down walk: the root is `0`,
/// and every `calls[]` entry is `parent.depth + 1`.
pub fn calltree_from_call_trace(frame: &CallFrame) -> CallTreeNode {
    build_node(frame, 0)
}

fn build_node(frame: &CallFrame, depth: u64) -> CallTreeNode {
    let call_type = call_kind_from_geth_type(&frame.typ);

    let mut node = CallTreeNode::new(call_type, depth);
    node.address = frame.to.unwrap_or_default();
    node.value = frame.value.unwrap_or_default();
    node.gas_limit = Some(frame.gas.to::<u64>());
    node.gas_cost = Some(frame.gas_used.to::<u64>());
    node.calldata = frame.input.clone();
    node.returndata = frame.output.clone().unwrap_or_default();
    node.failed = frame.error.is_some();
    node.selfdestruct = call_type == CallKind::SelfDestruct;
    node.calls = frame.calls.iter().map(|child| build_node(child, depth + 1)).collect();
    node.events = frame.logs.iter().map(|log| event_from_log(log, depth)).collect();
    node
}

fn event_from_log(log: &CallLogFrame, depth: u64) -> EventNode {
    EventNode {
        call_type: CallKind::Event,
        depth,
        topics: log.topics.clone().unwrap_or_default(),
        data: log.data.clone().unwrap_or_default(),
    }
}

fn call_kind_from_geth_type(typ: &str) -> CallKind {
    match typ {
        "CALL" => CallKind::Call,
        "CALLCODE" => CallKind::CallCode,
        "DELEGATECALL" => CallKind::DelegateCall,
        "STATICCALL" => CallKind::StaticCall,
        "CREATE" => CallKind::Create,
        "CREATE2" => CallKind::Create2,
        "SELFDESTRUCT" => CallKind::SelfDestruct,
        other => {
            tracing::warn!(call_type = other, "unrecognized call-tracer type, treating as CALL");
            CallKind::Call
        }
    }
}
