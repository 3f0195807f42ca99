//! Front-ends that turn one of the three supported trace shapes into a [`super::types::CallTreeNode`].
//!
//! [`struct_log`] is the hard core described at the crate root; [`call_tracer`], [`parity`] and
//! [`vmtrace`] are collaborators that reshape an already-structured or more compact input into
//! the same node model, either directly or (for `vmtrace`) by feeding synthetic frames through
//! the struct-log builder.

pub mod call_tracer;
pub mod parity;
pub mod struct_log;
pub mod vmtrace;
