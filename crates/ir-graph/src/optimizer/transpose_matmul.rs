// Transpose-into-MatMul fusion
//
// A transpose that only swaps the last two axes and feeds nothing but a
// matmul operand is folded into that operand's transpose flag.

use crate::error::{GraphError, Result};
use crate::graph::Graph;
use crate::operator::{OpId, OpKind};
use crate::ops::transpose;
use crate::optimizer::pass::OptimizationPass;

/// Which matmul operand a fusion site refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operand {
    A,
    B,
}

impl Operand {
    fn index(self) -> usize {
        match self {
            Operand::A => 0,
            Operand::B => 1,
        }
    }
}

#[derive(Debug, Default)]
pub struct TransposeMatMulPass;

impl TransposeMatMulPass {
    pub fn new() -> Self {
        Self
    }

    /// First matmul operand, in operator order, produced by a fusable
    /// transpose.
    fn find_site(&self, graph: &Graph) -> Option<(OpId, Operand, OpId)> {
        for op in graph.operators().filter(|op| op.kind().is_matmul()) {
            for side in [Operand::A, Operand::B] {
                let Some(input) = op.input(side.index()) else {
                    continue;
                };
                // Both operands reading the same tensor cannot be rebound
                // independently.
                if op.inputs().iter().filter(|&&t| t == input).count() != 1 {
                    continue;
                }
                let Some(tensor) = graph.tensor(input) else {
                    continue;
                };
                if tensor.targets() != [op.id()] {
                    continue;
                }
                let Some(producer) = tensor.source().and_then(|src| graph.operator(src)) else {
                    continue;
                };
                if let OpKind::Transpose { permute } = producer.kind() {
                    if transpose::is_last_two_swap(permute) {
                        return Some((op.id(), side, producer.id()));
                    }
                }
            }
        }
        None
    }

    fn fuse(&self, graph: &mut Graph, matmul: OpId, side: Operand, trans: OpId) -> Result<()> {
        let transposed = graph.output_of(trans)?;
        let input = graph
            .operator(trans)
            .and_then(|op| op.input(0))
            .ok_or(GraphError::OperatorNotFound(trans))?;

        match graph.kind_mut(matmul)? {
            OpKind::MatMul { trans_a, trans_b } => {
                let flag = match side {
                    Operand::A => trans_a,
                    Operand::B => trans_b,
                };
                *flag = !*flag;
            }
            other => {
                return Err(GraphError::InvalidOperator {
                    kind: other.name().to_string(),
                    reason: format!("{} is not a matmul", matmul),
                })
            }
        }

        graph.rebind_input(matmul, transposed, input)?;
        graph.unlink(trans, matmul)?;
        if let Some(src) = graph.get_tensor(input)?.source() {
            graph.unlink(src, trans)?;
            graph.link(src, matmul)?;
        }
        graph.detach_target(input, trans)?;

        graph.remove_operator(trans)?;
        graph.remove_tensor(transposed)?;
        log::debug!("fused {} into {} operand {:?}", trans, matmul, side);
        graph.check_adjacency()
    }
}

impl OptimizationPass for TransposeMatMulPass {
    fn run(&mut self, graph: &mut Graph) -> Result<bool> {
        let mut changed = false;
        while let Some((matmul, side, trans)) = self.find_site(graph) {
            self.fuse(graph, matmul, side, trans)?;
            changed = true;
        }
        Ok(changed)
    }

    fn name(&self) -> &str {
        "transpose-matmul"
    }
}

#[cfg(test)]
mod tests {
    use ir_tensor::DType;

    use super::*;
    use crate::ops::UnaryKind;

    fn matmul_kind(g: &Graph, out: crate::tensor::TensorId) -> OpKind {
        let op = g.tensor(out).unwrap().source().unwrap();
        g.operator(op).unwrap().kind().clone()
    }

    #[test]
    fn test_fuse_b_side() {
        let mut g = Graph::new();
        let a = g.add_tensor([2, 3, 4], DType::Float32);
        let b = g.add_tensor([2, 5, 4], DType::Float32);
        let bt = g.transpose(b, vec![0, 2, 1]).unwrap();
        let c = g.matmul(a, bt, false, false).unwrap();
        let mm = g.tensor(c).unwrap().source().unwrap();

        assert!(TransposeMatMulPass::new().run(&mut g).unwrap());
        assert_eq!(
            matmul_kind(&g, c),
            OpKind::MatMul {
                trans_a: false,
                trans_b: true
            }
        );
        assert_eq!(g.operator(mm).unwrap().inputs(), &[a, b]);
        assert!(g.tensor(bt).is_none());
        assert_eq!(g.num_operators(), 1);
        assert_eq!(g.tensor(b).unwrap().targets(), &[mm]);

        g.shape_infer().unwrap();
        assert_eq!(g.tensor(c).unwrap().shape().dims(), &[2, 3, 5]);
        g.check_valid().unwrap();
    }

    #[test]
    fn test_fuse_both_sides_and_rewire() {
        let mut g = Graph::new();
        let x = g.add_tensor([3, 4], DType::Float32);
        let y = g.add_tensor([5, 4], DType::Float32);
        let a = g.unary(UnaryKind::Relu, x).unwrap();
        let at = g.transpose(a, vec![1, 0]).unwrap();
        let yt = g.transpose(y, vec![1, 0]).unwrap();
        let c = g.matmul(at, yt, true, false).unwrap();
        let relu = g.tensor(a).unwrap().source().unwrap();
        let mm = g.tensor(c).unwrap().source().unwrap();

        assert!(TransposeMatMulPass::new().run(&mut g).unwrap());
        assert_eq!(
            matmul_kind(&g, c),
            OpKind::MatMul {
                trans_a: false,
                trans_b: true
            }
        );
        assert_eq!(g.operator(mm).unwrap().predecessors(), &[relu]);
        assert_eq!(g.operator(relu).unwrap().successors(), &[mm]);
        assert_eq!(g.num_operators(), 2);
        g.shape_infer().unwrap();
        assert_eq!(g.tensor(c).unwrap().shape().dims(), &[3, 5]);
        g.check_valid().unwrap();
    }

    #[test]
    fn test_shared_transpose_kept() {
        let mut g = Graph::new();
        let a = g.add_tensor([3, 4], DType::Float32);
        let b = g.add_tensor([5, 4], DType::Float32);
        let bt = g.transpose(b, vec![1, 0]).unwrap();
        g.matmul(a, bt, false, false).unwrap();
        g.unary(UnaryKind::Relu, bt).unwrap();
        assert!(!TransposeMatMulPass::new().run(&mut g).unwrap());
    }

    #[test]
    fn test_batch_permute_kept() {
        let mut g = Graph::new();
        let a = g.add_tensor([2, 3, 4], DType::Float32);
        let b = g.add_tensor([4, 2, 5], DType::Float32);
        let bt = g.transpose(b, vec![1, 0, 2]).unwrap();
        g.matmul(a, bt, false, false).unwrap();
        assert!(!TransposeMatMulPass::new().run(&mut g).unwrap());
    }

    #[test]
    fn test_same_tensor_both_operands() {
        let mut g = Graph::new();
        let x = g.add_tensor([3, 3], DType::Float32);
        let xt = g.transpose(x, vec![1, 0]).unwrap();
        g.matmul(xt, xt, false, false).unwrap();
        assert!(!TransposeMatMulPass::new().run(&mut g).unwrap());
    }
}
