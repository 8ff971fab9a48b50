//! The operator graph: sole owner of every tensor and operator.
//!
//! Tensors and operators live in id-keyed arenas; producer/consumer and
//! predecessor/successor relations are stored as id lists on both sides of
//! each edge. Scan order is insertion order for tensors and the current
//! schedule for operators.

mod edit;
mod infer;
mod malloc;
mod topo;
mod validate;

use std::collections::HashMap;
use std::fmt;

use ir_tensor::{DType, Shape};

use crate::config::GraphConfig;
use crate::error::{GraphError, Result};
use crate::memory::Allocator;
use crate::operator::{OpId, OpKind, Operator};
use crate::ops::{BinaryKind, CastType, UnaryKind};
use crate::tensor::{Tensor, TensorId};

#[derive(Debug)]
pub struct Graph {
    config: GraphConfig,
    tensors: HashMap<TensorId, Tensor>,
    tensor_order: Vec<TensorId>,
    ops: HashMap<OpId, Operator>,
    op_order: Vec<OpId>,
    /// Cached result of the last successful sort. Every structural edit
    /// clears it.
    sorted: bool,
    next_fuid: usize,
    next_op: usize,
    allocator: Allocator,
}

impl Graph {
    pub fn new() -> Self {
        Graph::from_parts(GraphConfig::default(), Allocator::default())
    }

    pub fn with_config(config: GraphConfig) -> Result<Self> {
        let allocator = Allocator::new(config.alignment)?;
        Ok(Graph::from_parts(config, allocator))
    }

    fn from_parts(config: GraphConfig, allocator: Allocator) -> Self {
        Graph {
            config,
            tensors: HashMap::new(),
            tensor_order: Vec::new(),
            ops: HashMap::new(),
            op_order: Vec::new(),
            sorted: false,
            next_fuid: 0,
            next_op: 0,
            allocator,
        }
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    pub fn allocator(&self) -> &Allocator {
        &self.allocator
    }

    pub fn tensor(&self, id: TensorId) -> Option<&Tensor> {
        self.tensors.get(&id)
    }

    pub fn operator(&self, id: OpId) -> Option<&Operator> {
        self.ops.get(&id)
    }

    /// Tensor ids in insertion order.
    pub fn tensor_ids(&self) -> &[TensorId] {
        &self.tensor_order
    }

    /// Operator ids in the current order (topological once sorted).
    pub fn op_ids(&self) -> &[OpId] {
        &self.op_order
    }

    pub fn tensors(&self) -> impl Iterator<Item = &Tensor> + '_ {
        self.tensor_order.iter().filter_map(|id| self.tensors.get(id))
    }

    pub fn operators(&self) -> impl Iterator<Item = &Operator> + '_ {
        self.op_order.iter().filter_map(|id| self.ops.get(id))
    }

    pub fn num_tensors(&self) -> usize {
        self.tensor_order.len()
    }

    pub fn num_operators(&self) -> usize {
        self.op_order.len()
    }

    pub fn is_sorted(&self) -> bool {
        self.sorted
    }

    /// Tensors with no producer.
    pub fn inputs(&self) -> Vec<TensorId> {
        self.tensors()
            .filter(|t| t.source().is_none())
            .map(|t| t.fuid())
            .collect()
    }

    /// Tensors with no consumer.
    pub fn outputs(&self) -> Vec<TensorId> {
        self.tensors()
            .filter(|t| t.targets().is_empty())
            .map(|t| t.fuid())
            .collect()
    }

    /// Create a fresh, unbound tensor.
    pub fn add_tensor(&mut self, shape: impl Into<Shape>, dtype: DType) -> TensorId {
        let fuid = TensorId(self.next_fuid);
        self.next_fuid += 1;
        self.tensors.insert(fuid, Tensor::new(fuid, shape.into(), dtype));
        self.tensor_order.push(fuid);
        fuid
    }

    /// Register an externally built tensor under its own fuid. Any links it
    /// carries are dropped.
    pub fn insert_tensor(&mut self, mut tensor: Tensor) -> Result<TensorId> {
        let fuid = tensor.fuid();
        if self.tensors.contains_key(&fuid) {
            return Err(GraphError::DuplicateTensor(fuid));
        }
        tensor.source = None;
        tensor.targets.clear();
        tensor.memory = None;
        self.next_fuid = self.next_fuid.max(fuid.0 + 1);
        self.tensors.insert(fuid, tensor);
        self.tensor_order.push(fuid);
        Ok(fuid)
    }

    /// Construct an operator over `inputs` and connect it.
    ///
    /// Attributes and arity are validated and the kind's inference rules
    /// run against the inputs. When `outputs` is `None` fresh output
    /// tensors are created with the inferred shapes and dtypes; otherwise
    /// the given tensors are bound as outputs and reconciled later by
    /// `shape_infer`.
    pub fn add_op(
        &mut self,
        kind: OpKind,
        inputs: Vec<TensorId>,
        outputs: Option<Vec<TensorId>>,
    ) -> Result<OpId> {
        let id = OpId(self.next_op);
        let (shapes, dtypes) = {
            let tensors = inputs
                .iter()
                .map(|&t| self.get_tensor(t))
                .collect::<Result<Vec<_>>>()?;
            kind.validate(&tensors)?;
            let shapes: Vec<&Shape> = tensors.iter().map(|t| t.shape()).collect();
            let dtypes: Vec<DType> = tensors.iter().map(|t| t.dtype()).collect();
            let inferred = kind
                .infer_shapes(&shapes)
                .ok_or_else(|| GraphError::InferenceFailed {
                    op: id,
                    kind: kind.name().to_string(),
                })?;
            (inferred, kind.infer_dtypes(&dtypes))
        };

        let outputs = match outputs {
            Some(outputs) => {
                if outputs.len() != shapes.len() {
                    return Err(GraphError::InvalidOperator {
                        kind: kind.name().to_string(),
                        reason: format!("expected {} outputs, got {}", shapes.len(), outputs.len()),
                    });
                }
                for &t in &outputs {
                    if let Some(source_op) = self.get_tensor(t)?.source() {
                        return Err(GraphError::MultipleProducers { tensor: t, source_op });
                    }
                }
                outputs
            }
            None => shapes
                .into_iter()
                .zip(dtypes)
                .map(|(shape, dtype)| self.add_tensor(shape, dtype))
                .collect(),
        };

        self.next_op += 1;
        self.ops.insert(id, Operator::new(id, kind, inputs, outputs));
        self.op_order.push(id);
        self.connect(id)?;
        Ok(id)
    }

    /// Wire a freshly inserted operator into the adjacency of its tensors
    /// and neighbouring operators. Called exactly once per operator.
    fn connect(&mut self, id: OpId) -> Result<()> {
        self.sorted = false;
        let (inputs, outputs) = {
            let op = self.get_op(id)?;
            (op.inputs().to_vec(), op.outputs().to_vec())
        };

        for input in inputs {
            let tensor = self.get_tensor_mut(input)?;
            tensor.add_target(id);
            if let Some(pred) = tensor.source() {
                self.link(pred, id)?;
            }
        }

        for output in outputs {
            let tensor = self.get_tensor_mut(output)?;
            tensor.source = Some(id);
            let consumers = tensor.targets().to_vec();
            for succ in consumers {
                self.link(id, succ)?;
            }
        }
        log::trace!("connected {}", self.get_op(id)?);
        Ok(())
    }

    /// Output tensor of a single-output operator.
    pub fn output_of(&self, op: OpId) -> Result<TensorId> {
        let op = self.get_op(op)?;
        op.output().ok_or_else(|| GraphError::InvalidOperator {
            kind: op.kind().name().to_string(),
            reason: "operator has no output".to_string(),
        })
    }

    fn add_single(&mut self, kind: OpKind, inputs: Vec<TensorId>) -> Result<TensorId> {
        let op = self.add_op(kind, inputs, None)?;
        self.output_of(op)
    }

    pub fn unary(&mut self, kind: UnaryKind, input: TensorId) -> Result<TensorId> {
        self.add_single(OpKind::Unary(kind), vec![input])
    }

    pub fn clip(&mut self, input: TensorId, min: Option<f32>, max: Option<f32>) -> Result<TensorId> {
        self.add_single(OpKind::Clip { min, max }, vec![input])
    }

    pub fn cast(&mut self, input: TensorId, cast: CastType) -> Result<TensorId> {
        self.add_single(OpKind::Cast(cast), vec![input])
    }

    pub fn matmul(
        &mut self,
        a: TensorId,
        b: TensorId,
        trans_a: bool,
        trans_b: bool,
    ) -> Result<TensorId> {
        self.add_single(OpKind::MatMul { trans_a, trans_b }, vec![a, b])
    }

    /// Concatenate along `axis`, which may be negative.
    pub fn concat(&mut self, inputs: &[TensorId], axis: isize) -> Result<TensorId> {
        let first = inputs.first().ok_or_else(|| GraphError::InvalidOperator {
            kind: "Concat".to_string(),
            reason: "expected at least one input".to_string(),
        })?;
        let axis = self.get_tensor(*first)?.shape().normalize_axis(axis)?;
        self.add_single(OpKind::Concat { axis }, inputs.to_vec())
    }

    pub fn transpose(&mut self, input: TensorId, permute: Vec<usize>) -> Result<TensorId> {
        self.add_single(OpKind::Transpose { permute }, vec![input])
    }

    pub fn elementwise(&mut self, kind: BinaryKind, a: TensorId, b: TensorId) -> Result<TensorId> {
        self.add_single(OpKind::ElementWise(kind), vec![a, b])
    }

    /// Run the whole pipeline: sort, infer, optimize, validate, allocate.
    pub fn compile(&mut self) -> Result<()> {
        if !self.topo_sort() {
            return Err(GraphError::Cycle);
        }
        self.shape_infer()?;
        self.optimize()?;
        self.check_valid()?;
        self.data_malloc()
    }

    pub(crate) fn get_tensor(&self, id: TensorId) -> Result<&Tensor> {
        self.tensors.get(&id).ok_or(GraphError::TensorNotFound(id))
    }

    pub(crate) fn get_tensor_mut(&mut self, id: TensorId) -> Result<&mut Tensor> {
        self.tensors.get_mut(&id).ok_or(GraphError::TensorNotFound(id))
    }

    pub(crate) fn get_op(&self, id: OpId) -> Result<&Operator> {
        self.ops.get(&id).ok_or(GraphError::OperatorNotFound(id))
    }

    pub(crate) fn get_op_mut(&mut self, id: OpId) -> Result<&mut Operator> {
        self.ops.get_mut(&id).ok_or(GraphError::OperatorNotFound(id))
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ids = |ops: &[OpId]| {
            ops.iter()
                .map(|o| o.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        };
        writeln!(f, "Graph Tensors:")?;
        for tensor in self.tensors() {
            writeln!(f, "{}", tensor)?;
        }
        writeln!(f, "Graph operators:")?;
        for op in self.operators() {
            writeln!(
                f,
                "OP {}, pred [{}], succ [{}], {}",
                op.id(),
                ids(op.predecessors()),
                ids(op.successors()),
                op
            )?;
        }
        Ok(())
    }
}
