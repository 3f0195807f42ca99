//! Reconstructs a structured, hierarchical call tree from low-level EVM execution traces.
//!
//! Two archive-node trace formats are consumed:
//!
//! - Geth struct-log traces (`debug_traceTransaction` default tracer): a flat stream of
//!   per-opcode frames. [`tracing::builder::struct_log`] turns this into a
//!   [`tracing::types::CallTreeNode`] with a single-pass recursive state machine — the hard core
//!   of this crate.
//! - Geth call-tracer traces (`debug_traceTransaction` with `callTracer`): already nested JSON,
//!   normalised by [`tracing::builder::call_tracer`].
//!
//! Parity/OpenEthereum `trace_transaction` output is assembled from its flat
//! `trace_address`-addressed list by [`tracing::builder::parity`], and the faster `vmTrace`
//! replay format is re-expanded into the same struct-log frame stream by
//! [`tracing::builder::vmtrace`].
//!
//! This crate does not execute EVM bytecode, fetch traces from a node, compute per-call gas usage
//! from struct-logs, or reconstruct JUMP/JUMPI-based internal call frames.

#![deny(unused_must_use, rust_2018_idioms)]
#![warn(missing_debug_implementations, missing_docs, unreachable_pub)]

/// Error types shared across all trace front-ends.
pub mod error;

/// Call tree reconstruction from Geth and Parity traces.
pub mod tracing;

pub use error::Error;
pub use tracing::{
    builder::{
        call_tracer::calltree_from_call_trace,
        parity::calltree_from_parity_trace,
        struct_log::{calltree_from_struct_log, RootCall},
        vmtrace::calltree_from_vm_trace,
    },
    config::TraceTreeConfig,
    frame::TraceFrame,
    types::{CallKind, CallTreeNode, EventNode},
};
