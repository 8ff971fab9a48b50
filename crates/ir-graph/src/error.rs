use thiserror::Error;

use crate::operator::OpId;
use crate::tensor::TensorId;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    #[error("tensor error: {0}")]
    TensorError(#[from] ir_tensor::TensorError),
    #[error("duplicate tensor fuid {0}")]
    DuplicateTensor(TensorId),
    #[error("tensor not found: {0}")]
    TensorNotFound(TensorId),
    #[error("operator not found: {0}")]
    OperatorNotFound(OpId),
    #[error("tensor {0} has neither a source nor any target")]
    OrphanTensor(TensorId),
    #[error("tensor {tensor} already produced by operator {source_op}")]
    MultipleProducers { tensor: TensorId, source_op: OpId },
    #[error("unsupported cast type: {0}")]
    UnsupportedCast(String),
    #[error("invalid {kind} operator: {reason}")]
    InvalidOperator { kind: String, reason: String },
    #[error("shape inference failed for {kind} operator {op}")]
    InferenceFailed { op: OpId, kind: String },
    #[error("adjacency of operator {op} is inconsistent: {reason}")]
    AdjacencyMismatch { op: OpId, reason: String },
    #[error("graph contains a cycle")]
    Cycle,
    #[error("tensor {0} is not a graph input")]
    NotGraphInput(TensorId),
    #[error("allocator already finalized")]
    AllocatorFinalized,
    #[error("free of {size} bytes at offset {offset} exceeds {used} bytes in use")]
    InvalidFree {
        offset: usize,
        size: usize,
        used: usize,
    },
    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, GraphError>;
