use std::fmt;

use ir_tensor::{Result, Shape};

/// Two-input arithmetic with broadcasting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryKind {
    Add,
    Sub,
    Mul,
    Div,
}

impl BinaryKind {
    pub fn name(&self) -> &'static str {
        match self {
            BinaryKind::Add => "Add",
            BinaryKind::Sub => "Sub",
            BinaryKind::Mul => "Mul",
            BinaryKind::Div => "Div",
        }
    }
}

impl fmt::Display for BinaryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub fn infer_shape(a: &Shape, b: &Shape) -> Result<Shape> {
    Shape::broadcast_shape(a, b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_broadcast() {
        let out = infer_shape(&Shape::from([1, 3, 1, 5]), &Shape::from([3, 4, 5])).unwrap();
        assert_eq!(out.dims(), &[1, 3, 4, 5]);
        let out = infer_shape(&Shape::from([1, 3, 1, 5]), &Shape::from([3, 1, 5])).unwrap();
        assert_eq!(out.dims(), &[1, 3, 1, 5]);
    }

    #[test]
    fn test_incompatible() {
        assert!(infer_shape(&Shape::from([2, 3]), &Shape::from([4, 3])).is_err());
    }
}
