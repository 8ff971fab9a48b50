use ir_tensor::{DType, Shape};

use crate::error::{GraphError, Result};
use crate::graph::Graph;
use crate::tensor::TensorId;

impl Graph {
    /// Propagate shapes and dtypes through the graph in topological order.
    ///
    /// Each operator's rules run once against its current inputs. Outputs
    /// whose inferred shape or dtype differs from the stored one are updated
    /// in place by fuid. Any rule that yields no shape aborts the pass with
    /// `InferenceFailed`; operators visited before the failure keep their
    /// updated outputs.
    pub fn shape_infer(&mut self) -> Result<()> {
        if !self.topo_sort() {
            return Err(GraphError::Cycle);
        }

        for id in self.op_order.clone() {
            let (shapes, dtypes, outputs) = {
                let op = self.get_op(id)?;
                let inputs = op
                    .inputs()
                    .iter()
                    .map(|&t| self.get_tensor(t))
                    .collect::<Result<Vec<_>>>()?;
                let in_shapes: Vec<&Shape> = inputs.iter().map(|t| t.shape()).collect();
                let in_dtypes: Vec<DType> = inputs.iter().map(|t| t.dtype()).collect();

                let failed = || GraphError::InferenceFailed {
                    op: id,
                    kind: op.kind().name().to_string(),
                };
                let shapes = op.kind().infer_shapes(&in_shapes).ok_or_else(failed)?;
                let dtypes = op.kind().infer_dtypes(&in_dtypes);
                if shapes.len() != op.outputs().len() || dtypes.len() != op.outputs().len() {
                    return Err(failed());
                }
                (shapes, dtypes, op.outputs().to_vec())
            };

            for ((fuid, shape), dtype) in outputs.into_iter().zip(shapes).zip(dtypes) {
                self.update_output(fuid, shape, dtype)?;
            }
        }
        Ok(())
    }

    fn update_output(&mut self, fuid: TensorId, shape: Shape, dtype: DType) -> Result<()> {
        let tensor = self.get_tensor_mut(fuid)?;
        if tensor.shape() != &shape {
            log::debug!("{} shape {} -> {}", fuid, tensor.shape(), shape);
            tensor.set_shape(shape);
        }
        if tensor.dtype() != dtype {
            log::debug!("{} dtype {} -> {}", fuid, tensor.dtype(), dtype);
            tensor.set_dtype(dtype);
        }
        Ok(())
    }

    /// Change the dims of a graph input. Run `shape_infer` afterwards to
    /// propagate the change.
    pub fn set_input_shape(&mut self, input: TensorId, shape: impl Into<Shape>) -> Result<()> {
        let tensor = self.get_tensor_mut(input)?;
        if tensor.source().is_some() {
            return Err(GraphError::NotGraphInput(input));
        }
        tensor.set_shape(shape.into());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use ir_tensor::DType;

    use crate::error::GraphError;
    use crate::graph::Graph;
    use crate::operator::OpKind;
    use crate::ops::{CastType, UnaryKind};

    #[test]
    fn test_propagates_input_change() {
        let mut g = Graph::new();
        let x = g.add_tensor([2, 3], DType::Float32);
        let y = g.unary(UnaryKind::Sigmoid, x).unwrap();
        let z = g.clip(y, Some(0.0), Some(1.0)).unwrap();

        g.set_input_shape(x, [5, 7]).unwrap();
        g.shape_infer().unwrap();
        assert_eq!(g.tensor(y).unwrap().shape().dims(), &[5, 7]);
        assert_eq!(g.tensor(z).unwrap().shape().dims(), &[5, 7]);
    }

    #[test]
    fn test_fixes_provided_outputs() {
        let mut g = Graph::new();
        let x = g.add_tensor([4], DType::Float32);
        let out = g.add_tensor([1], DType::Float32);
        g.add_op(OpKind::Cast(CastType::Float2Int64), vec![x], Some(vec![out]))
            .unwrap();

        g.shape_infer().unwrap();
        let out = g.tensor(out).unwrap();
        assert_eq!(out.shape().dims(), &[4]);
        assert_eq!(out.dtype(), DType::Int64);
    }

    #[test]
    fn test_failure_is_reported() {
        let mut g = Graph::new();
        let a = g.add_tensor([2, 3], DType::Float32);
        let b = g.add_tensor([3, 4], DType::Float32);
        g.matmul(a, b, false, false).unwrap();

        g.set_input_shape(b, [5, 4]).unwrap();
        assert!(matches!(
            g.shape_infer(),
            Err(GraphError::InferenceFailed { .. })
        ));
    }

    #[test]
    fn test_set_shape_on_produced_tensor() {
        let mut g = Graph::new();
        let x = g.add_tensor([2], DType::Float32);
        let y = g.unary(UnaryKind::Relu, x).unwrap();
        assert_eq!(g.set_input_shape(y, [3]), Err(GraphError::NotGraphInput(y)));
    }

    #[test]
    fn test_cycle_aborts() {
        let mut g = Graph::new();
        let a = g.add_tensor([2], DType::Float32);
        let b = g.add_tensor([2], DType::Float32);
        g.add_op(OpKind::Unary(UnaryKind::Relu), vec![a], Some(vec![b])).unwrap();
        g.add_op(OpKind::Unary(UnaryKind::Abs), vec![b], Some(vec![a])).unwrap();
        assert_eq!(g.shape_infer(), Err(GraphError::Cycle));
    }
}
