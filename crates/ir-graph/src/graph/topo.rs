use std::collections::HashSet;

use crate::graph::Graph;
use crate::operator::OpId;

impl Graph {
    /// Reorder operators so each follows the producers of its inputs.
    ///
    /// Repeatedly scans the unscheduled operators, scheduling any whose
    /// inputs are graph inputs or come from already scheduled operators.
    /// A scan that schedules nothing means a cycle: returns `false` and
    /// leaves the order untouched. Returns `true` at once if the cached
    /// order is still valid.
    pub fn topo_sort(&mut self) -> bool {
        if self.sorted {
            return true;
        }

        let mut schedule: Vec<OpId> = Vec::with_capacity(self.op_order.len());
        let mut scheduled: HashSet<OpId> = HashSet::with_capacity(self.op_order.len());

        while schedule.len() < self.op_order.len() {
            let mut progressed = false;
            for &id in &self.op_order {
                if scheduled.contains(&id) {
                    continue;
                }
                let Some(op) = self.ops.get(&id) else {
                    continue;
                };
                let ready = op.inputs().iter().all(|t| {
                    self.tensors
                        .get(t)
                        .and_then(|t| t.source())
                        .map_or(true, |src| scheduled.contains(&src))
                });
                if ready {
                    schedule.push(id);
                    scheduled.insert(id);
                    progressed = true;
                }
            }
            if !progressed {
                log::debug!(
                    "topological sort stalled with {} of {} operators scheduled",
                    schedule.len(),
                    self.op_order.len()
                );
                return false;
            }
        }

        self.op_order = schedule;
        self.sorted = true;
        true
    }
}

#[cfg(test)]
mod tests {
    use ir_tensor::DType;

    use crate::graph::Graph;
    use crate::operator::OpKind;
    use crate::ops::{BinaryKind, UnaryKind};

    #[test]
    fn test_sort_reverses_insertion() {
        let mut g = Graph::new();
        let x = g.add_tensor([2], DType::Float32);
        let mid = g.add_tensor([2], DType::Float32);
        let out = g.add_tensor([2], DType::Float32);
        let second = g.add_op(OpKind::Unary(UnaryKind::Exp), vec![mid], Some(vec![out])).unwrap();
        let first = g.add_op(OpKind::Unary(UnaryKind::Neg), vec![x], Some(vec![mid])).unwrap();
        assert_eq!(g.op_ids(), &[second, first]);

        assert!(g.topo_sort());
        assert!(g.is_sorted());
        assert_eq!(g.op_ids(), &[first, second]);
    }

    #[test]
    fn test_sort_is_idempotent() {
        let mut g = Graph::new();
        let x = g.add_tensor([2], DType::Float32);
        let y = g.unary(UnaryKind::Relu, x).unwrap();
        g.elementwise(BinaryKind::Add, x, y).unwrap();
        assert!(g.topo_sort());
        let order = g.op_ids().to_vec();
        assert!(g.topo_sort());
        assert_eq!(g.op_ids(), order.as_slice());
    }

    #[test]
    fn test_cycle_detected() {
        let mut g = Graph::new();
        let a = g.add_tensor([2], DType::Float32);
        let b = g.add_tensor([2], DType::Float32);
        let p = g.add_op(OpKind::Unary(UnaryKind::Relu), vec![a], Some(vec![b])).unwrap();
        let q = g.add_op(OpKind::Unary(UnaryKind::Abs), vec![b], Some(vec![a])).unwrap();

        assert!(!g.topo_sort());
        assert!(!g.is_sorted());
        assert_eq!(g.op_ids(), &[p, q]);
    }

    #[test]
    fn test_empty_graph_sorts() {
        let mut g = Graph::new();
        assert!(g.topo_sort());
    }
}
