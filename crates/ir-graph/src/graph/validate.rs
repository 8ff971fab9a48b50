use std::collections::{BTreeSet, HashSet};

use crate::error::{GraphError, Result};
use crate::graph::Graph;
use crate::operator::OpId;

impl Graph {
    /// Check every structural invariant of the graph.
    ///
    /// - fuids are unique and every listed tensor/operator exists
    /// - no tensor is an orphan (no source and no targets)
    /// - tensor sources/targets and operator inputs/outputs agree
    /// - predecessor/successor sets match the producer/consumer relation
    pub fn check_valid(&self) -> Result<()> {
        let mut seen = HashSet::with_capacity(self.tensor_order.len());
        for &fuid in &self.tensor_order {
            if !seen.insert(fuid) {
                return Err(GraphError::DuplicateTensor(fuid));
            }
            let tensor = self.get_tensor(fuid)?;
            if tensor.source().is_none() && tensor.targets().is_empty() {
                return Err(GraphError::OrphanTensor(fuid));
            }
            if let Some(src) = tensor.source() {
                if !self.get_op(src)?.outputs().contains(&fuid) {
                    return Err(self.mismatch(src, format!("does not list {} as output", fuid)));
                }
            }
            for &target in tensor.targets() {
                if !self.get_op(target)?.inputs().contains(&fuid) {
                    return Err(self.mismatch(target, format!("does not list {} as input", fuid)));
                }
            }
        }

        for op in self.operators() {
            for &input in op.inputs() {
                if !self.get_tensor(input)?.targets().contains(&op.id()) {
                    return Err(self.mismatch(op.id(), format!("missing from targets of {}", input)));
                }
            }
            for &output in op.outputs() {
                if self.get_tensor(output)?.source() != Some(op.id()) {
                    return Err(self.mismatch(op.id(), format!("is not the source of {}", output)));
                }
            }
        }

        self.check_adjacency()
    }

    /// Check that every operator's predecessor and successor sets equal the
    /// ones derived from its tensors, and that all of them exist.
    pub fn check_adjacency(&self) -> Result<()> {
        for op in self.operators() {
            let mut preds = BTreeSet::new();
            for &input in op.inputs() {
                if let Some(src) = self.get_tensor(input)?.source() {
                    preds.insert(src);
                }
            }
            let mut succs = BTreeSet::new();
            for &output in op.outputs() {
                succs.extend(self.get_tensor(output)?.targets().iter().copied());
            }

            let stored_preds: BTreeSet<OpId> = op.predecessors().iter().copied().collect();
            let stored_succs: BTreeSet<OpId> = op.successors().iter().copied().collect();
            for &other in stored_preds.iter().chain(stored_succs.iter()) {
                self.get_op(other)?;
            }
            if stored_preds != preds {
                return Err(self.mismatch(
                    op.id(),
                    format!("predecessors {:?}, expected {:?}", stored_preds, preds),
                ));
            }
            if stored_succs != succs {
                return Err(self.mismatch(
                    op.id(),
                    format!("successors {:?}, expected {:?}", stored_succs, succs),
                ));
            }
        }
        Ok(())
    }

    fn mismatch(&self, op: OpId, reason: String) -> GraphError {
        GraphError::AdjacencyMismatch { op, reason }
    }
}

#[cfg(test)]
mod tests {
    use ir_tensor::DType;

    use crate::error::GraphError;
    use crate::graph::Graph;
    use crate::ops::{BinaryKind, UnaryKind};

    #[test]
    fn test_valid_graph() {
        let mut g = Graph::new();
        let a = g.add_tensor([2, 3], DType::Float32);
        let b = g.add_tensor([3], DType::Float32);
        let c = g.elementwise(BinaryKind::Add, a, b).unwrap();
        g.unary(UnaryKind::Relu, c).unwrap();
        g.check_valid().unwrap();
    }

    #[test]
    fn test_orphan_tensor() {
        let mut g = Graph::new();
        let a = g.add_tensor([2], DType::Float32);
        g.unary(UnaryKind::Relu, a).unwrap();
        let orphan = g.add_tensor([2], DType::Float32);
        assert_eq!(g.check_valid(), Err(GraphError::OrphanTensor(orphan)));
    }

    #[test]
    fn test_broken_adjacency() {
        let mut g = Graph::new();
        let a = g.add_tensor([2], DType::Float32);
        let b = g.unary(UnaryKind::Relu, a).unwrap();
        g.unary(UnaryKind::Abs, b).unwrap();
        let p = g.tensor(b).unwrap().source().unwrap();
        let q = g.tensor(b).unwrap().targets()[0];

        g.get_op_mut(q).unwrap().remove_predecessor(p);
        assert!(matches!(
            g.check_adjacency(),
            Err(GraphError::AdjacencyMismatch { .. })
        ));
    }

    #[test]
    fn test_dangling_target() {
        let mut g = Graph::new();
        let a = g.add_tensor([2], DType::Float32);
        let b = g.unary(UnaryKind::Relu, a).unwrap();
        let p = g.tensor(b).unwrap().source().unwrap();
        g.get_tensor_mut(a).unwrap().add_target(crate::operator::OpId(99));
        assert!(g.check_valid().is_err());
        g.get_tensor_mut(a).unwrap().remove_target(crate::operator::OpId(99));
        g.get_tensor_mut(a).unwrap().remove_target(p);
        assert!(g.check_valid().is_err());
    }
}
