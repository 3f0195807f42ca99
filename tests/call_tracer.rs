//! Exercises the Geth `callTracer` front-end against a small nested trace in the same shape as
//! real `debug_traceTransaction` output (topology lifted from a real three-level trace).

use alloy_primitives::{address, Bytes, U256};
use alloy_rpc_types_trace::geth::{CallFrame, CallLogFrame};
use evm_trace_tree::{calltree_from_call_trace, CallKind};

#[test]
fn three_level_trace_normalises_with_fixed_up_depths() {
    let router = address!("bcf7fffd8b256ec51a36782a52d0c34f6474d951");
    let token = address!("274b028b03a250ca03644e6c578d81f019ee1323");
    let user = address!("f2df0b975c0c9efa2f8ca0491c2d1685104d2488");

    let staticcall = CallFrame {
        typ: "STATICCALL".to_string(),
        from: router,
        to: Some(token),
        input: Bytes::from_static(&[0x70, 0x07, 0xcb, 0xe8]),
        gas: U256::from(0x44b63fu64),
        gas_used: U256::from(0x5d9u64),
        output: Some(Bytes::new()),
        ..Default::default()
    };
    let inner_call = CallFrame {
        typ: "CALL".to_string(),
        from: router,
        to: Some(token),
        value: Some(U256::ZERO),
        input: Bytes::new(),
        gas: U256::from(0x44a772u64),
        gas_used: U256::from(0xa1f2u64),
        output: Some(Bytes::new()),
        ..Default::default()
    };
    let middle = CallFrame {
        typ: "CALL".to_string(),
        from: user,
        to: Some(router),
        value: Some(U256::ZERO),
        input: Bytes::new(),
        gas: U256::from(0x45fb34u64),
        gas_used: U256::from(0xf3ebu64),
        output: Some(Bytes::new()),
        calls: vec![staticcall, inner_call],
        ..Default::default()
    };
    let root = CallFrame {
        typ: "CALL".to_string(),
        from: user,
        to: Some(router),
        value: Some(U256::from(0x7bu64)),
        input: Bytes::from_static(&[0x37, 0x2d, 0xca, 0x07]),
        gas: U256::from(0x47cb6eu64),
        gas_used: U256::from(0x445e6u64),
        output: Some(Bytes::new()),
        calls: vec![middle],
        ..Default::default()
    };

    let tree = calltree_from_call_trace(&root);

    assert_eq!(tree.depth, 0);
    assert_eq!(tree.address, router);
    assert_eq!(tree.gas_limit, Some(0x47cb6e));
    assert_eq!(tree.gas_cost, Some(0x445e6));
    assert_eq!(tree.calls.len(), 1);

    let level1 = &tree.calls[0];
    assert_eq!(level1.depth, 1);
    assert_eq!(level1.calls.len(), 2);

    let level2_static = &level1.calls[0];
    assert_eq!(level2_static.depth, 2);
    assert_eq!(level2_static.call_type, CallKind::StaticCall);
    assert_eq!(level2_static.address, token);

    let level2_call = &level1.calls[1];
    assert_eq!(level2_call.depth, 2);
    assert_eq!(level2_call.call_type, CallKind::Call);
}

#[test]
fn logs_carry_through_to_event_nodes() {
    let frame = CallFrame {
        typ: "CALL".to_string(),
        logs: vec![CallLogFrame {
            address: Some(address!("1111111111111111111111111111111111111111")),
            topics: Some(vec![alloy_primitives::b256!(
                "ddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef"
            )]),
            data: Some(Bytes::new()),
            position: None,
        }],
        ..Default::default()
    };

    let tree = calltree_from_call_trace(&frame);
    assert_eq!(tree.events.len(), 1);
    assert_eq!(tree.events[0].call_type, CallKind::Event);
}
