//! The hard core: a single-pass recursive state machine over a Geth struct-log frame stream.

use crate::{
    error::{Error, Result},
    tracing::{
        config::TraceTreeConfig,
        frame::TraceFrame,
        memory::extract,
        primitives::{address_from_word, word_to_u256, word_to_u64_saturating},
        types::{CallKind, CallTreeNode, EventNode},
    },
};
use alloy_primitives::{Address, Bytes, U256};

/// Description of the outermost call a struct-log trace is being built against.
///
/// The struct-log stream itself never carries this information — it starts mid-call, at the
/// first opcode already inside the transaction's top-level frame — so the caller supplies it
/// from whatever context produced the trace (e.g. the transaction's `to`, `input` and `value`).
#[derive(Clone, Debug, Default)]
pub struct RootCall {
    /// The kind of the outermost call.
    pub call_type: CallKind,
    /// The callee (or, for a top-level `CREATE`/`CREATE2`, the resulting contract address).
    pub address: Address,
    /// Value transferred with the call.
    pub value: U256,
    /// Input to the call, or init code for a top-level contract creation.
    pub calldata: Bytes,
    /// Gas forwarded to the call, if known.
    pub gas_limit: Option<u64>,
}

impl RootCall {
    /// Returns a root call description of the given kind, with every other field at its zero
    /// value.
    pub fn new(call_type: CallKind) -> Self {
        Self { call_type, ..Default::default() }
    }

    /// Sets the callee address.
    pub fn with_address(mut self, address: Address) -> Self {
        self.address = address;
        self
    }

    /// Sets the transferred value.
    pub fn with_value(mut self, value: U256) -> Self {
        self.value = value;
        self
    }

    /// Sets the calldata (or init code).
    pub fn with_calldata(mut self, calldata: impl Into<Bytes>) -> Self {
        self.calldata = calldata.into();
        self
    }

    /// Sets the forwarded gas limit.
    pub fn with_gas_limit(mut self, gas_limit: u64) -> Self {
        self.gas_limit = Some(gas_limit);
        self
    }
}

/// Builds a [`CallTreeNode`] from a Geth struct-log frame stream.
///
/// `frames` is consumed exactly once, in order; it need not be a lazy iterator — a materialised
/// `Vec<TraceFrame>` works identically and does not trigger unbounded recursion, since the tree
/// depth is bounded by the trace's own call depth, not by the number of frames.
///
/// Returns [`Error::UnsupportedFeature`] if `config.show_internal` is set: internal
/// (JUMP/JUMPI-based) call reconstruction is an open question upstream and is not attempted here.
pub fn calltree_from_struct_log<I>(
    frames: I,
    config: TraceTreeConfig,
    root: RootCall,
) -> Result<CallTreeNode>
where
    I: IntoIterator<Item = TraceFrame>,
{
    if config.show_internal {
        return Err(Error::UnsupportedFeature);
    }

    let mut node = CallTreeNode::new(root.call_type, 0);
    node.address = root.address;
    node.value = root.value;
    node.calldata = root.calldata;
    node.gas_limit = root.gas_limit;

    let mut iter = frames.into_iter();
    build_node(&mut iter, &mut node, config, Vec::new());
    Ok(node)
}

/// Consumes frames from `frames` into `node` until its terminator (or end of stream).
///
/// `pending_create_depths` is a stack of depths at which this node is still waiting to see a
/// `CREATE`/`CREATE2` child's deployed address resolved; it is local to this node's own
/// recursion level. A `CREATE` child's own body is consumed with a fresh, empty stack of its
/// own, so any further nesting inside that child's init code resolves independently before this
/// node's search for its own pending create continues.
fn build_node(
    frames: &mut impl Iterator<Item = TraceFrame>,
    node: &mut CallTreeNode,
    config: TraceTreeConfig,
    mut pending_create_depths: Vec<u64>,
) {
    while let Some(frame) = frames.next() {
        if pending_create_depths.last() == Some(&frame.depth) {
            pending_create_depths.pop();
            resolve_pending_create(node, &frame);
        }

        match frame.op.as_str() {
            "CALL" | "CALLCODE" | "DELEGATECALL" | "STATICCALL" => match build_call_child(&frame)
            {
                Some(mut child) => {
                    build_node(frames, &mut child, config, Vec::new());
                    node.calls.push(child);
                }
                None => tracing::warn!(
                    op = %frame.op,
                    depth = frame.depth,
                    "stack too short for call opcode, skipping frame"
                ),
            },
            "CREATE" | "CREATE2" => match build_create_child(&frame) {
                Some(mut child) => {
                    pending_create_depths.push(frame.depth);
                    build_node(frames, &mut child, config, Vec::new());
                    node.calls.push(child);
                }
                None => tracing::warn!(
                    op = %frame.op,
                    depth = frame.depth,
                    "stack too short for create opcode, skipping frame"
                ),
            },
            "SELFDESTRUCT" => {
                node.selfdestruct = true;
                return;
            }
            "STOP" => return,
            "RETURN" | "REVERT" => {
                match (frame.nth_from_top(1), frame.nth_from_top(2)) {
                    (Some(offset), Some(size)) => {
                        node.returndata = extract(offset, size, &frame.memory);
                    }
                    _ => tracing::warn!(
                        op = %frame.op,
                        depth = frame.depth,
                        "stack too short for return opcode, returndata left empty"
                    ),
                }
                node.failed = frame.op == "REVERT";
                return;
            }
            "LOG0" | "LOG1" | "LOG2" | "LOG3" | "LOG4" => {
                if config.record_events {
                    match build_event(&frame) {
                        Some(event) => node.events.push(event),
                        None => tracing::warn!(
                            op = %frame.op,
                            depth = frame.depth,
                            "stack too short for log opcode, skipping frame"
                        ),
                    }
                }
            }
            _ => {}
        }
    }

    tracing::warn!(depth = node.depth, "trace ended before this node's terminating opcode");
}

/// Applies a resolved `CREATE`/`CREATE2` address (and, where available, init-code calldata) from
/// `frame` to the most recently opened unresolved create child of `node`.
fn resolve_pending_create(node: &mut CallTreeNode, frame: &TraceFrame) {
    let Some(child) = node.calls.iter_mut().rev().find(|c| c.call_type.is_any_create()) else {
        return;
    };
    if let Some(address) = frame.top_as_address() {
        child.address = address;
    }
    if frame.stack.len() >= 5 {
        if let (Some(offset), Some(size)) = (frame.nth_from_top(4), frame.nth_from_top(5)) {
            child.calldata = extract(offset, size, &frame.memory);
        }
    }
}

fn build_call_child(frame: &TraceFrame) -> Option<CallTreeNode> {
    let call_type = match frame.op.as_str() {
        "CALL" => CallKind::Call,
        "CALLCODE" => CallKind::CallCode,
        "DELEGATECALL" => CallKind::DelegateCall,
        "STATICCALL" => CallKind::StaticCall,
        _ => unreachable!("dispatched only for call opcodes"),
    };

    let mut node = CallTreeNode::new(call_type, frame.depth);
    // DELEGATECALL/STATICCALL carry no value and a 6-element stack; CALL/CALLCODE carry value
    // and a 7-element stack.
    if matches!(call_type, CallKind::DelegateCall | CallKind::StaticCall) {
        if frame.stack.len() < 6 {
            return None;
        }
        node.gas_limit = Some(word_to_u64_saturating(frame.nth_from_top(1)?));
        node.address = address_from_word(frame.nth_from_top(2)?);
        node.calldata = extract(frame.nth_from_top(3)?, frame.nth_from_top(4)?, &frame.memory);
    } else {
        if frame.stack.len() < 7 {
            return None;
        }
        node.gas_limit = Some(word_to_u64_saturating(frame.nth_from_top(1)?));
        node.address = address_from_word(frame.nth_from_top(2)?);
        node.value = word_to_u256(frame.nth_from_top(3)?);
        node.calldata = extract(frame.nth_from_top(4)?, frame.nth_from_top(5)?, &frame.memory);
    }
    Some(node)
}

fn build_create_child(frame: &TraceFrame) -> Option<CallTreeNode> {
    let call_type = match frame.op.as_str() {
        "CREATE" => CallKind::Create,
        "CREATE2" => CallKind::Create2,
        _ => unreachable!("dispatched only for create opcodes"),
    };
    let required = if call_type == CallKind::Create2 { 4 } else { 3 };
    if frame.stack.len() < required {
        return None;
    }

    let mut node = CallTreeNode::new(call_type, frame.depth);
    node.value = word_to_u256(frame.nth_from_top(1)?);
    Some(node)
}

fn build_event(frame: &TraceFrame) -> Option<EventNode> {
    let topic_count: usize = frame.op.strip_prefix("LOG")?.parse().ok()?;
    if frame.stack.len() < 2 + topic_count {
        return None;
    }

    let mem_offset = frame.nth_from_top(1)?;
    let mem_size = frame.nth_from_top(2)?;
    let mut topics = Vec::with_capacity(topic_count);
    for i in 0..topic_count {
        topics.push(*frame.nth_from_top(3 + i)?);
    }

    Some(EventNode {
        call_type: CallKind::Event,
        depth: frame.depth,
        topics,
        data: extract(mem_offset, mem_size, &frame.memory),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{address, b256, B256};

    fn word_with_address(addr: Address) -> B256 {
        let mut bytes = [0u8; 32];
        bytes[12..].copy_from_slice(addr.as_slice());
        B256::from(bytes)
    }

    fn word_u64(value: u64) -> B256 {
        B256::from(U256::from(value).to_be_bytes::<32>())
    }

    fn frame(op: &str, depth: u64, stack: Vec<B256>, memory: Vec<B256>) -> TraceFrame {
        TraceFrame { op: op.to_string(), depth, stack, memory, ..Default::default() }
    }

    #[test]
    fn single_return_frame() {
        let memory_word =
            b256!("0000000000000000000000000004d4d2c55eae97a04acafb66011df29463b665");
        // stack is bottom-to-top; top-of-stack (last element) is `offset`, per the RETURN/REVERT
        // dispatch rule `extract(stack[-1], stack[-2], memory)`.
        let frames = vec![frame(
            "RETURN",
            0,
            vec![word_u64(0x20), word_u64(0x00)],
            vec![memory_word],
        )];
        let root = RootCall::new(CallKind::Call)
            .with_address(address!("5676fc66004e1fe6c9de2f11e1e3e5ee47f40031"))
            .with_value(U256::from(34u64));

        let tree =
            calltree_from_struct_log(frames, TraceTreeConfig::default(), root).unwrap();

        assert!(!tree.failed);
        assert!(tree.calls.is_empty());
        assert_eq!(tree.returndata.len(), 32);
    }

    #[test]
    fn three_deep_nested_call() {
        let callee_a = address!("1111111111111111111111111111111111111111");
        let callee_b = address!("2222222222222222222222222222222222222222");
        let callee_c = address!("3333333333333333333333333333333333333333");

        let call_stack = |to: Address| {
            vec![
                word_u64(0), // retSize
                word_u64(0), // retOff
                word_u64(0), // argsSize
                word_u64(0), // argsOff
                word_u64(0), // value
                word_with_address(to),
                word_u64(100_000), // gas
            ]
        };

        let frames = vec![
            frame("CALL", 0, call_stack(callee_a), vec![]),
            frame("CALL", 1, call_stack(callee_b), vec![]),
            frame("CALL", 2, call_stack(callee_c), vec![]),
            frame("RETURN", 2, vec![word_u64(0), word_u64(0)], vec![]),
            frame("RETURN", 1, vec![word_u64(0), word_u64(0)], vec![]),
            frame("RETURN", 0, vec![word_u64(0), word_u64(0)], vec![]),
        ];

        let root = RootCall::new(CallKind::Call);
        let tree =
            calltree_from_struct_log(frames, TraceTreeConfig::default(), root).unwrap();

        assert_eq!(tree.calls.len(), 1);
        assert_eq!(tree.calls[0].address, callee_a);
        assert_eq!(tree.calls[0].calls.len(), 1);
        assert_eq!(tree.calls[0].calls[0].address, callee_b);
        assert_eq!(tree.calls[0].calls[0].calls.len(), 1);
        assert_eq!(tree.calls[0].calls[0].calls[0].address, callee_c);
        assert!(!tree.failed && !tree.calls[0].failed && !tree.calls[0].calls[0].failed);
    }

    #[test]
    fn create2_address_resolved_by_lookahead() {
        let deployed = address!("7c23b43594428a657718713ff246c609eeddfaff");
        let frames = vec![
            frame(
                "CREATE2",
                0,
                vec![
                    word_u64(0),  // salt
                    word_u64(32), // size
                    word_u64(0),  // offset
                    word_u64(0),  // value
                ],
                vec![],
            ),
            frame("PUSH1", 1, vec![], vec![]),
            frame("STOP", 1, vec![], vec![]),
            frame(
                "POP",
                0,
                vec![
                    word_u64(0),
                    word_u64(0),
                    word_u64(0),
                    word_u64(0),
                    word_with_address(deployed),
                ],
                vec![],
            ),
            frame("STOP", 0, vec![], vec![]),
        ];

        let root = RootCall::new(CallKind::Call);
        let tree =
            calltree_from_struct_log(frames, TraceTreeConfig::default(), root).unwrap();

        assert_eq!(tree.calls.len(), 1);
        assert_eq!(tree.calls[0].call_type, CallKind::Create2);
        assert_eq!(tree.calls[0].address, deployed);
    }

    #[test]
    fn log3_emission() {
        let topic0 = b256!("1111111111111111111111111111111111111111111111111111111111111111");
        let data_word = b256!("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa");
        let frames = vec![
            frame(
                "CALL",
                0,
                vec![
                    word_u64(0),
                    word_u64(0),
                    word_u64(32),
                    word_u64(0),
                    word_u64(0),
                    word_with_address(address!("4444444444444444444444444444444444444444")),
                    word_u64(100_000),
                ],
                vec![],
            ),
            frame(
                "LOG3",
                1,
                vec![b256!("2222222222222222222222222222222222222222222222222222222222222222"), b256!("3333333333333333333333333333333333333333333333333333333333333333"), topic0, word_u64(32), word_u64(0)],
                vec![data_word],
            ),
            frame("RETURN", 1, vec![word_u64(0), word_u64(0)], vec![]),
            frame("RETURN", 0, vec![word_u64(0), word_u64(0)], vec![]),
        ];

        let tree = calltree_from_struct_log(
            frames,
            TraceTreeConfig::default(),
            RootCall::new(CallKind::Call),
        )
        .unwrap();

        let child = &tree.calls[0];
        assert_eq!(child.events.len(), 1);
        assert_eq!(child.events[0].topics.len(), 3);
        assert_eq!(child.events[0].selector(), child.events[0].topics[0]);
        assert_eq!(child.events[0].topics[0], topic0);
    }

    #[test]
    fn revert_bubble_sets_failed_and_returndata() {
        let memory_word =
            b256!("deadbeefdeadbeefdeadbeefdeadbeefdeadbeefdeadbeefdeadbeefdeadbeef");
        let frames = vec![frame(
            "REVERT",
            0,
            vec![word_u64(32), word_u64(0)],
            vec![memory_word],
        )];

        let tree = calltree_from_struct_log(
            frames,
            TraceTreeConfig::default(),
            RootCall::new(CallKind::Call),
        )
        .unwrap();

        assert!(tree.failed);
        assert_eq!(tree.returndata.as_ref(), memory_word.as_slice());
    }

    #[test]
    fn materialised_list_matches_iterator_input() {
        let frames = vec![frame("STOP", 0, vec![], vec![])];
        let from_vec = calltree_from_struct_log(
            frames.clone(),
            TraceTreeConfig::default(),
            RootCall::new(CallKind::Call),
        )
        .unwrap();
        let from_iter = calltree_from_struct_log(
            frames.into_iter(),
            TraceTreeConfig::default(),
            RootCall::new(CallKind::Call),
        )
        .unwrap();
        assert_eq!(from_vec, from_iter);
    }

    #[test]
    fn show_internal_is_a_hard_error() {
        let config = TraceTreeConfig { show_internal: true, record_events: true };
        let err = calltree_from_struct_log(Vec::new(), config, RootCall::new(CallKind::Call))
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedFeature));
    }
}
