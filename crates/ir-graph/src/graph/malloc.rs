use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::config::MemoryPlan;
use crate::error::{GraphError, Result};
use crate::graph::Graph;
use crate::memory::MemoryHandle;
use crate::tensor::TensorId;

impl Graph {
    /// Plan an offset for every tensor, perform the single real allocation
    /// and bind each tensor to its slice of the buffer.
    ///
    /// Offsets come from the configured [`MemoryPlan`]. The allocator is
    /// frozen afterwards, so a second call fails with `AllocatorFinalized`.
    pub fn data_malloc(&mut self) -> Result<()> {
        if !self.topo_sort() {
            return Err(GraphError::Cycle);
        }

        let plan = match self.config.memory_plan {
            MemoryPlan::Linear => self.plan_linear()?,
            MemoryPlan::Reuse => self.plan_reuse()?,
        };

        let blob = self.allocator.finalize();
        for (fuid, offset, bytes) in plan {
            let handle = MemoryHandle::new(Arc::clone(&blob), offset, bytes);
            log::debug!("bind {} -> {}", fuid, handle);
            self.get_tensor_mut(fuid)?.memory = Some(handle);
        }
        self.allocator.info();
        Ok(())
    }

    fn tensor_sizes(&self) -> Vec<(TensorId, usize)> {
        self.tensors().map(|t| (t.fuid(), t.bytes())).collect()
    }

    /// One block per tensor in tensor-list order.
    fn plan_linear(&mut self) -> Result<Vec<(TensorId, usize, usize)>> {
        let mut plan = Vec::with_capacity(self.tensor_order.len());
        for (fuid, bytes) in self.tensor_sizes() {
            let offset = self.allocator.alloc(bytes)?;
            plan.push((fuid, offset, bytes));
        }
        Ok(plan)
    }

    /// Graph inputs are placed first and live throughout. Operator outputs
    /// are placed when produced; an intermediate is released right after
    /// its last consumer has its own outputs placed. Graph outputs are never
    /// released.
    fn plan_reuse(&mut self) -> Result<Vec<(TensorId, usize, usize)>> {
        let sizes = self.tensor_sizes();
        let bytes: HashMap<TensorId, usize> = sizes.iter().copied().collect();
        let size_of = |t: TensorId| bytes.get(&t).copied().ok_or(GraphError::TensorNotFound(t));

        let mut last_use: HashMap<TensorId, usize> = HashMap::new();
        for (pos, op) in self.operators().enumerate() {
            for &input in op.inputs() {
                last_use.insert(input, pos);
            }
        }

        let mut offsets: HashMap<TensorId, usize> = HashMap::with_capacity(sizes.len());
        for fuid in self.inputs() {
            offsets.insert(fuid, self.allocator.alloc(size_of(fuid)?)?);
        }

        for (pos, id) in self.op_order.clone().into_iter().enumerate() {
            let (inputs, outputs) = {
                let op = self.get_op(id)?;
                (op.inputs().to_vec(), op.outputs().to_vec())
            };
            for output in outputs {
                if !offsets.contains_key(&output) {
                    offsets.insert(output, self.allocator.alloc(size_of(output)?)?);
                }
            }

            let mut released = HashSet::new();
            for input in inputs {
                let produced = self.get_tensor(input)?.source().is_some();
                if produced && last_use.get(&input) == Some(&pos) && released.insert(input) {
                    let offset = offsets
                        .get(&input)
                        .copied()
                        .ok_or(GraphError::TensorNotFound(input))?;
                    self.allocator.free(offset, size_of(input)?)?;
                    log::trace!("release {} after {}", input, id);
                }
            }
        }

        sizes
            .into_iter()
            .map(|(fuid, size)| {
                offsets
                    .get(&fuid)
                    .map(|&offset| (fuid, offset, size))
                    .ok_or(GraphError::TensorNotFound(fuid))
            })
            .collect()
    }
}
