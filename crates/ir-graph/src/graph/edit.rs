//! Edge-level edit primitives used by the rewrite passes. Each keeps both
//! sides of the edge it touches in step; callers compose them into a full
//! rewrite and check adjacency once at the end.

use crate::error::{GraphError, Result};
use crate::graph::Graph;
use crate::operator::{OpId, OpKind};
use crate::tensor::TensorId;

impl Graph {
    /// Record `pred -> succ` on both operators.
    pub(crate) fn link(&mut self, pred: OpId, succ: OpId) -> Result<()> {
        self.get_op(succ)?;
        self.get_op_mut(pred)?.add_successor(succ);
        self.get_op_mut(succ)?.add_predecessor(pred);
        self.sorted = false;
        log::trace!("link {} -> {}", pred, succ);
        Ok(())
    }

    /// Drop `pred -> succ` from both operators.
    pub(crate) fn unlink(&mut self, pred: OpId, succ: OpId) -> Result<()> {
        self.get_op(succ)?;
        self.get_op_mut(pred)?.remove_successor(succ);
        self.get_op_mut(succ)?.remove_predecessor(pred);
        self.sorted = false;
        log::trace!("unlink {} -> {}", pred, succ);
        Ok(())
    }

    /// Make `op` read `new` wherever it read `old`, moving the consumer
    /// entry from `old` to `new`. Operator-level edges are left to the
    /// caller.
    pub(crate) fn rebind_input(&mut self, op: OpId, old: TensorId, new: TensorId) -> Result<()> {
        self.get_tensor(new)?;
        self.get_op_mut(op)?.replace_input(old, new);
        self.get_tensor_mut(old)?.remove_target(op);
        self.get_tensor_mut(new)?.add_target(op);
        self.sorted = false;
        Ok(())
    }

    /// Drop `op` as a consumer of `tensor`.
    pub(crate) fn detach_target(&mut self, tensor: TensorId, op: OpId) -> Result<()> {
        self.get_tensor_mut(tensor)?.remove_target(op);
        self.sorted = false;
        Ok(())
    }

    pub(crate) fn kind_mut(&mut self, op: OpId) -> Result<&mut OpKind> {
        Ok(self.get_op_mut(op)?.kind_mut())
    }

    /// Delete an operator whose edges have already been severed.
    pub(crate) fn remove_operator(&mut self, op: OpId) -> Result<()> {
        self.ops.remove(&op).ok_or(GraphError::OperatorNotFound(op))?;
        self.op_order.retain(|&o| o != op);
        self.sorted = false;
        log::trace!("removed {}", op);
        Ok(())
    }

    /// Delete a tensor whose edges have already been severed.
    pub(crate) fn remove_tensor(&mut self, tensor: TensorId) -> Result<()> {
        self.tensors
            .remove(&tensor)
            .ok_or(GraphError::TensorNotFound(tensor))?;
        self.tensor_order.retain(|&t| t != tensor);
        self.sorted = false;
        log::trace!("removed {}", tensor);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use ir_tensor::DType;

    use crate::graph::Graph;
    use crate::ops::UnaryKind;

    #[test]
    fn test_rebind_input_moves_target() {
        let mut g = Graph::new();
        let a = g.add_tensor([2], DType::Float32);
        let b = g.add_tensor([2], DType::Float32);
        let y = g.unary(UnaryKind::Relu, a).unwrap();
        let op = g.tensor(y).unwrap().source().unwrap();

        g.rebind_input(op, a, b).unwrap();
        assert_eq!(g.operator(op).unwrap().inputs(), &[b]);
        assert!(g.tensor(a).unwrap().targets().is_empty());
        assert_eq!(g.tensor(b).unwrap().targets(), &[op]);
        assert!(!g.is_sorted());
    }

    #[test]
    fn test_link_unlink_symmetric() {
        let mut g = Graph::new();
        let a = g.add_tensor([2], DType::Float32);
        let y = g.unary(UnaryKind::Relu, a).unwrap();
        let z = g.unary(UnaryKind::Relu, a).unwrap();
        let p = g.tensor(y).unwrap().source().unwrap();
        let q = g.tensor(z).unwrap().source().unwrap();

        g.link(p, q).unwrap();
        assert_eq!(g.operator(p).unwrap().successors(), &[q]);
        assert_eq!(g.operator(q).unwrap().predecessors(), &[p]);
        g.unlink(p, q).unwrap();
        assert!(g.operator(p).unwrap().successors().is_empty());
        assert!(g.operator(q).unwrap().predecessors().is_empty());
    }

    #[test]
    fn test_remove_missing() {
        let mut g = Graph::new();
        assert!(g.remove_operator(crate::operator::OpId(0)).is_err());
        assert!(g.remove_tensor(crate::tensor::TensorId(0)).is_err());
    }
}
