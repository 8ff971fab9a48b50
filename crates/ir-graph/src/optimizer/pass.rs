use crate::error::Result;
use crate::graph::Graph;

/// A structural rewrite over a graph.
pub trait OptimizationPass {
    /// Run the pass once. Returns true if the graph was modified.
    fn run(&mut self, graph: &mut Graph) -> Result<bool>;

    fn name(&self) -> &str;
}

/// Runs its passes in order, sweep after sweep, until a sweep changes
/// nothing or the sweep limit is hit.
pub struct PassManager {
    passes: Vec<Box<dyn OptimizationPass>>,
    max_iterations: usize,
}

impl PassManager {
    pub fn new(max_iterations: usize) -> Self {
        Self {
            passes: Vec::new(),
            max_iterations,
        }
    }

    pub fn add_pass(&mut self, pass: Box<dyn OptimizationPass>) {
        self.passes.push(pass);
    }

    pub fn num_passes(&self) -> usize {
        self.passes.len()
    }

    /// Returns true if any sweep modified the graph.
    pub fn run_to_fixpoint(&mut self, graph: &mut Graph) -> Result<bool> {
        let mut modified = false;
        for iteration in 0..self.max_iterations {
            let mut changed = false;
            for pass in &mut self.passes {
                log::debug!("Running optimization pass: {}", pass.name());
                if pass.run(graph)? {
                    log::debug!("Pass '{}' modified the graph", pass.name());
                    changed = true;
                } else {
                    log::trace!("Pass '{}' made no changes", pass.name());
                }
            }
            if !changed {
                log::debug!("optimizer reached a fixpoint after {} sweeps", iteration + 1);
                return Ok(modified);
            }
            modified = true;
        }
        log::warn!(
            "optimizer stopped after {} sweeps without reaching a fixpoint",
            self.max_iterations
        );
        Ok(modified)
    }
}
