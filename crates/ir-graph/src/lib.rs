//! `ir-graph` - Operator graph core for the tensor graph IR.
//!
//! This crate provides:
//! - A `Graph` owning tensors and operators, with adjacency kept on both
//!   sides of every edge
//! - Topological ordering, shape/dtype inference and validity checks
//! - Rewrite passes (transpose-pair elimination, transpose-into-matmul
//!   fusion) driven to a fixpoint
//! - A two-phase `Allocator` that plans offsets before the single real
//!   allocation and binds tensors to it

pub mod config;
pub mod error;
pub mod graph;
pub mod memory;
pub mod operator;
pub mod ops;
pub mod optimizer;
pub mod tensor;

// Re-export primary types at the crate root for convenience.
pub use config::{GraphConfig, MemoryPlan};
pub use error::{GraphError, Result};
pub use graph::Graph;
pub use memory::{Allocator, Blob, MemoryHandle};
pub use operator::{OpId, OpKind, Operator};
pub use ops::{BinaryKind, CastType, UnaryKind};
pub use optimizer::{OptimizationPass, PassManager};
pub use tensor::{Tensor, TensorId};
