use std::fmt;

use ir_tensor::{DType, Shape};

use crate::memory::MemoryHandle;
use crate::operator::OpId;

/// Stable tensor identifier (fuid). Survives graph rewrites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TensorId(pub usize);

impl fmt::Display for TensorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t{}", self.0)
    }
}

/// A graph tensor: shape, dtype, producer/consumer links and, once the
/// graph is allocated, a memory handle.
///
/// `source` and `targets` are maintained by the owning graph; a tensor
/// built outside a graph starts unbound.
#[derive(Debug, Clone)]
pub struct Tensor {
    fuid: TensorId,
    shape: Shape,
    dtype: DType,
    pub(crate) source: Option<OpId>,
    pub(crate) targets: Vec<OpId>,
    pub(crate) memory: Option<MemoryHandle>,
}

impl Tensor {
    /// Create an unbound tensor.
    pub fn new(fuid: TensorId, shape: Shape, dtype: DType) -> Self {
        Tensor {
            fuid,
            shape,
            dtype,
            source: None,
            targets: Vec::new(),
            memory: None,
        }
    }

    pub fn fuid(&self) -> TensorId {
        self.fuid
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn rank(&self) -> usize {
        self.shape.ndim()
    }

    pub fn dtype(&self) -> DType {
        self.dtype
    }

    /// Producing operator, if any. `None` marks a graph input.
    pub fn source(&self) -> Option<OpId> {
        self.source
    }

    /// Distinct consuming operators. Empty marks a graph output.
    pub fn targets(&self) -> &[OpId] {
        &self.targets
    }

    pub fn memory(&self) -> Option<&MemoryHandle> {
        self.memory.as_ref()
    }

    /// Number of elements.
    pub fn numel(&self) -> usize {
        self.shape.numel()
    }

    /// Size in bytes of the tensor's data.
    pub fn bytes(&self) -> usize {
        self.numel() * self.dtype.size_in_bytes()
    }

    pub(crate) fn set_shape(&mut self, shape: Shape) {
        self.shape = shape;
    }

    pub(crate) fn set_dtype(&mut self, dtype: DType) {
        self.dtype = dtype;
    }

    pub(crate) fn add_target(&mut self, op: OpId) {
        if !self.targets.contains(&op) {
            self.targets.push(op);
        }
    }

    pub(crate) fn remove_target(&mut self, op: OpId) {
        self.targets.retain(|&t| t != op);
    }
}

impl fmt::Display for Tensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tensor {}, shape {}, dtype {}", self.fuid, self.shape, self.dtype)?;
        match self.source {
            Some(op) => write!(f, ", source {}", op)?,
            None => write!(f, ", source None")?,
        }
        write!(f, ", targets [")?;
        for (i, t) in self.targets.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", t)?;
        }
        write!(f, "]")?;
        if let Some(mem) = &self.memory {
            write!(f, ", memory {}", mem)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_tensor_is_unbound() {
        let t = Tensor::new(TensorId(3), Shape::from([2, 3]), DType::Float32);
        assert_eq!(t.fuid(), TensorId(3));
        assert_eq!(t.rank(), 2);
        assert!(t.source().is_none());
        assert!(t.targets().is_empty());
        assert!(t.memory().is_none());
    }

    #[test]
    fn test_bytes() {
        let t = Tensor::new(TensorId(0), Shape::from([2, 3, 4]), DType::Float16);
        assert_eq!(t.numel(), 24);
        assert_eq!(t.bytes(), 48);
    }

    #[test]
    fn test_targets_are_distinct() {
        let mut t = Tensor::new(TensorId(0), Shape::from([1]), DType::Int8);
        t.add_target(OpId(1));
        t.add_target(OpId(1));
        t.add_target(OpId(2));
        assert_eq!(t.targets(), &[OpId(1), OpId(2)]);
        t.remove_target(OpId(1));
        assert_eq!(t.targets(), &[OpId(2)]);
    }

    #[test]
    fn test_display() {
        let t = Tensor::new(TensorId(7), Shape::from([4]), DType::Int32);
        assert_eq!(t.to_string(), "Tensor t7, shape [4], dtype i32, source None, targets []");
    }
}
