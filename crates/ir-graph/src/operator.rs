use std::fmt;

use ir_tensor::{DType, Shape};

use crate::error::{GraphError, Result};
use crate::ops::{self, BinaryKind, CastType, UnaryKind};
use crate::tensor::{Tensor, TensorId};

/// Operator identifier, unique within a graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OpId(pub usize);

impl fmt::Display for OpId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "op{}", self.0)
    }
}

/// Operator kind together with its attributes.
#[derive(Debug, Clone, PartialEq)]
pub enum OpKind {
    Unary(UnaryKind),
    /// Elementwise clamp to `[min, max]`; a missing bound is unbounded.
    Clip { min: Option<f32>, max: Option<f32> },
    Cast(CastType),
    MatMul { trans_a: bool, trans_b: bool },
    /// Concatenation along an already normalized axis.
    Concat { axis: usize },
    Transpose { permute: Vec<usize> },
    ElementWise(BinaryKind),
}

impl OpKind {
    pub fn name(&self) -> &'static str {
        match self {
            OpKind::Unary(kind) => kind.name(),
            OpKind::Clip { .. } => "Clip",
            OpKind::Cast(_) => "Cast",
            OpKind::MatMul { .. } => "MatMul",
            OpKind::Concat { .. } => "Concat",
            OpKind::Transpose { .. } => "Transpose",
            OpKind::ElementWise(kind) => kind.name(),
        }
    }

    pub fn is_transpose(&self) -> bool {
        matches!(self, OpKind::Transpose { .. })
    }

    pub fn is_matmul(&self) -> bool {
        matches!(self, OpKind::MatMul { .. })
    }

    /// Output shapes for the given input shapes, or `None` when this kind
    /// rejects them.
    pub fn infer_shapes(&self, inputs: &[&Shape]) -> Option<Vec<Shape>> {
        let shape = match self {
            OpKind::Unary(_) | OpKind::Clip { .. } | OpKind::Cast(_) => {
                ops::unary::infer_shape(inputs.first()?)
            }
            OpKind::MatMul { trans_a, trans_b } => match inputs {
                [a, b] => ops::matmul::infer_shape(a, b, *trans_a, *trans_b),
                _ => None,
            },
            OpKind::Concat { axis } => ops::concat::infer_shape(inputs, *axis),
            OpKind::Transpose { permute } => ops::transpose::infer_shape(inputs.first()?, permute),
            OpKind::ElementWise(_) => match inputs {
                [a, b] => ops::elementwise::infer_shape(a, b).ok(),
                _ => None,
            },
        }?;
        Some(vec![shape])
    }

    /// Output dtypes for the given input dtypes. Every kind except `Cast`
    /// inherits the first input's type.
    pub fn infer_dtypes(&self, inputs: &[DType]) -> Vec<DType> {
        match self {
            OpKind::Cast(cast) => vec![cast.output_dtype()],
            _ => inputs.first().copied().into_iter().collect(),
        }
    }

    /// Check arity and attributes against concrete inputs.
    pub fn validate(&self, inputs: &[&Tensor]) -> Result<()> {
        let expected = match self {
            OpKind::Unary(_) | OpKind::Clip { .. } | OpKind::Cast(_) => Some(1),
            OpKind::Transpose { .. } => Some(1),
            OpKind::MatMul { .. } | OpKind::ElementWise(_) => Some(2),
            OpKind::Concat { .. } => None,
        };
        if let Some(n) = expected {
            if inputs.len() != n {
                return Err(self.invalid(format!("expected {} inputs, got {}", n, inputs.len())));
            }
        } else if inputs.is_empty() {
            return Err(self.invalid("expected at least one input".to_string()));
        }

        match self {
            OpKind::Clip {
                min: Some(lo),
                max: Some(hi),
            } if lo > hi => Err(self.invalid(format!("min {} exceeds max {}", lo, hi))),
            OpKind::Cast(cast) => {
                let got = inputs[0].dtype();
                if !got.same_class(cast.input_dtype()) {
                    return Err(self.invalid(format!(
                        "{} cannot read {} tensor {}",
                        cast,
                        got,
                        inputs[0].fuid()
                    )));
                }
                if got != cast.input_dtype() {
                    log::warn!(
                        "{} applied to {} tensor {}",
                        cast,
                        got,
                        inputs[0].fuid()
                    );
                }
                Ok(())
            }
            OpKind::Concat { axis } => {
                let rank = inputs[0].rank();
                if *axis >= rank {
                    return Err(self.invalid(format!("axis {} out of range for rank {}", axis, rank)));
                }
                Ok(())
            }
            OpKind::Transpose { permute } => {
                if permute.len() != inputs[0].rank() || !ops::transpose::is_permutation(permute) {
                    return Err(self.invalid(format!(
                        "{:?} is not a permutation of rank {}",
                        permute,
                        inputs[0].rank()
                    )));
                }
                Ok(())
            }
            OpKind::ElementWise(_) => {
                if inputs[0].dtype() != inputs[1].dtype() {
                    return Err(self.invalid(format!(
                        "operand dtypes differ: {} vs {}",
                        inputs[0].dtype(),
                        inputs[1].dtype()
                    )));
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn invalid(&self, reason: String) -> GraphError {
        GraphError::InvalidOperator {
            kind: self.name().to_string(),
            reason,
        }
    }
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OpKind::Clip { min, max } => {
                write!(f, "Clip(min={:?}, max={:?})", min, max)
            }
            OpKind::Cast(cast) => write!(f, "Cast({})", cast),
            OpKind::MatMul { trans_a, trans_b } => write!(
                f,
                "MatMul({}, {})",
                if *trans_a { "A^T" } else { "A" },
                if *trans_b { "B^T" } else { "B" }
            ),
            OpKind::Concat { axis } => write!(f, "Concat(axis={})", axis),
            OpKind::Transpose { permute } => write!(f, "Transpose(permute={:?})", permute),
            OpKind::Unary(_) | OpKind::ElementWise(_) => f.write_str(self.name()),
        }
    }
}

/// A graph node. Inputs and outputs are ordered; predecessor and successor
/// sets are derived from the tensors and kept by the owning graph.
#[derive(Debug, Clone)]
pub struct Operator {
    id: OpId,
    kind: OpKind,
    inputs: Vec<TensorId>,
    outputs: Vec<TensorId>,
    pub(crate) predecessors: Vec<OpId>,
    pub(crate) successors: Vec<OpId>,
}

impl Operator {
    pub fn new(id: OpId, kind: OpKind, inputs: Vec<TensorId>, outputs: Vec<TensorId>) -> Self {
        Operator {
            id,
            kind,
            inputs,
            outputs,
            predecessors: Vec::new(),
            successors: Vec::new(),
        }
    }

    pub fn id(&self) -> OpId {
        self.id
    }

    pub fn kind(&self) -> &OpKind {
        &self.kind
    }

    pub fn inputs(&self) -> &[TensorId] {
        &self.inputs
    }

    pub fn input(&self, i: usize) -> Option<TensorId> {
        self.inputs.get(i).copied()
    }

    pub fn outputs(&self) -> &[TensorId] {
        &self.outputs
    }

    pub fn output(&self) -> Option<TensorId> {
        self.outputs.first().copied()
    }

    pub fn predecessors(&self) -> &[OpId] {
        &self.predecessors
    }

    pub fn successors(&self) -> &[OpId] {
        &self.successors
    }

    pub(crate) fn kind_mut(&mut self) -> &mut OpKind {
        &mut self.kind
    }

    /// Rebind every input slot holding `old` to `new`.
    pub(crate) fn replace_input(&mut self, old: TensorId, new: TensorId) {
        for input in self.inputs.iter_mut().filter(|t| **t == old) {
            *input = new;
        }
    }

    pub(crate) fn add_predecessor(&mut self, op: OpId) {
        if !self.predecessors.contains(&op) {
            self.predecessors.push(op);
        }
    }

    pub(crate) fn remove_predecessor(&mut self, op: OpId) {
        self.predecessors.retain(|&p| p != op);
    }

    pub(crate) fn add_successor(&mut self, op: OpId) {
        if !self.successors.contains(&op) {
            self.successors.push(op);
        }
    }

    pub(crate) fn remove_successor(&mut self, op: OpId) {
        self.successors.retain(|&s| s != op);
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ids = |ts: &[TensorId]| {
            ts.iter()
                .map(|t| t.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        };
        write!(
            f,
            "{}[{}](input=[{}], output=[{}])",
            self.kind,
            self.id,
            ids(&self.inputs),
            ids(&self.outputs)
        )
    }
}
