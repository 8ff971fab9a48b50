// Transpose-pair elimination
//
// Two back-to-back transposes whose permutations cancel are an identity.
// Consumers of the second one read the first one's input directly.

use crate::error::{GraphError, Result};
use crate::graph::Graph;
use crate::operator::{OpId, OpKind};
use crate::ops::transpose;
use crate::optimizer::pass::OptimizationPass;

#[derive(Debug, Default)]
pub struct TransposePairPass;

impl TransposePairPass {
    pub fn new() -> Self {
        Self
    }

    /// First `(first, second)` pair in operator order where `first` feeds
    /// only `second` and the two permutations are inverse.
    fn find_pair(&self, graph: &Graph) -> Option<(OpId, OpId)> {
        for first in graph.operators() {
            let OpKind::Transpose { permute: p1 } = first.kind() else {
                continue;
            };
            let Some(mid) = first.output().and_then(|t| graph.tensor(t)) else {
                continue;
            };
            // A multi-use intermediate must stay.
            let &[second] = mid.targets() else {
                continue;
            };
            let Some(second_op) = graph.operator(second) else {
                continue;
            };
            let OpKind::Transpose { permute: p2 } = second_op.kind() else {
                continue;
            };
            if !transpose::is_inverse(p1, p2) {
                continue;
            }
            // Eliding a graph output would lose it.
            let consumed = second_op
                .output()
                .and_then(|t| graph.tensor(t))
                .is_some_and(|t| !t.targets().is_empty());
            if consumed {
                return Some((first.id(), second));
            }
        }
        None
    }

    fn eliminate(&self, graph: &mut Graph, first: OpId, second: OpId) -> Result<()> {
        let input = graph
            .operator(first)
            .and_then(|op| op.input(0))
            .ok_or(GraphError::OperatorNotFound(first))?;
        let mid = graph.output_of(first)?;
        let out = graph.output_of(second)?;
        let source = graph.get_tensor(input)?.source();
        let consumers = graph.get_tensor(out)?.targets().to_vec();

        for succ in consumers {
            graph.rebind_input(succ, out, input)?;
            graph.unlink(second, succ)?;
            if let Some(src) = source {
                graph.link(src, succ)?;
            }
        }
        if let Some(src) = source {
            graph.unlink(src, first)?;
        }
        graph.unlink(first, second)?;
        graph.detach_target(input, first)?;

        graph.remove_operator(first)?;
        graph.remove_operator(second)?;
        graph.remove_tensor(mid)?;
        graph.remove_tensor(out)?;
        log::debug!(
            "eliminated transpose pair {} -> {}, consumers now read {}",
            first,
            second,
            input
        );
        graph.check_adjacency()
    }
}

impl OptimizationPass for TransposePairPass {
    fn run(&mut self, graph: &mut Graph) -> Result<bool> {
        let mut changed = false;
        while let Some((first, second)) = self.find_pair(graph) {
            self.eliminate(graph, first, second)?;
            changed = true;
        }
        Ok(changed)
    }

    fn name(&self) -> &str {
        "transpose-pair"
    }
}
