// Optimizer Module: structural rewrites run between inference and allocation

pub mod pass;
pub mod transpose_matmul;
pub mod transpose_pair;

pub use pass::{OptimizationPass, PassManager};
pub use transpose_matmul::TransposeMatMulPass;
pub use transpose_pair::TransposePairPass;

use crate::error::{GraphError, Result};
use crate::graph::Graph;

impl Graph {
    /// Apply transpose-pair elimination and transpose-into-matmul fusion,
    /// alternating, until neither changes the graph or the configured sweep
    /// limit is reached. Returns true if the graph was modified.
    pub fn optimize(&mut self) -> Result<bool> {
        if !self.topo_sort() {
            return Err(GraphError::Cycle);
        }
        let before = self.num_operators();

        let mut manager = PassManager::new(self.config().max_optimize_iterations);
        manager.add_pass(Box::new(TransposePairPass::new()));
        manager.add_pass(Box::new(TransposeMatMulPass::new()));
        let modified = manager.run_to_fixpoint(self)?;

        if modified {
            log::info!(
                "optimizer removed {} operators ({} -> {})",
                before - self.num_operators(),
                before,
                self.num_operators()
            );
            if !self.topo_sort() {
                return Err(GraphError::Cycle);
            }
        }
        Ok(modified)
    }
}
