/// How `Graph::data_malloc` assigns offsets to tensors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MemoryPlan {
    /// One allocation per tensor, in tensor-list order, never freed.
    #[default]
    Linear,
    /// Walk the operator order, allocate outputs as they are produced and
    /// free intermediates after their last consumer.
    Reuse,
}

/// Tunables for graph compilation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphConfig {
    /// Byte alignment of every planned block. Must be a power of two.
    pub alignment: usize,
    /// Upper bound on optimizer sweeps before giving up on a fixpoint.
    pub max_optimize_iterations: usize,
    /// Offset assignment strategy.
    pub memory_plan: MemoryPlan,
}

impl GraphConfig {
    pub fn with_alignment(mut self, alignment: usize) -> Self {
        self.alignment = alignment;
        self
    }

    pub fn with_max_optimize_iterations(mut self, iterations: usize) -> Self {
        self.max_optimize_iterations = iterations;
        self
    }

    pub fn with_memory_plan(mut self, plan: MemoryPlan) -> Self {
        self.memory_plan = plan;
        self
    }
}

impl Default for GraphConfig {
    fn default() -> Self {
        GraphConfig {
            alignment: std::mem::size_of::<u64>(),
            max_optimize_iterations: 10,
            memory_plan: MemoryPlan::Linear,
        }
    }
}
