//! Call tree reconstruction for Geth and Parity EVM traces.
//!
//! [`builder::struct_log`] holds the hard core: a single-pass recursive consumer of a Geth
//! struct-log frame stream that produces a [`types::CallTreeNode`]. The other modules are
//! front-ends that feed the same tree/node model from differently-shaped inputs.

pub mod config;
pub mod frame;
pub mod memory;
pub mod preprocess;
pub mod primitives;
pub mod types;

pub mod builder;
